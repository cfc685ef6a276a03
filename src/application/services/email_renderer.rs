use std::fmt::Write as _;

use urlencoding::encode;

use crate::domain::models::{CampaignMessage, CampaignSnapshot, StoryBlock};

const DEFAULT_HIGHLIGHT: &str = "#4F46E5";
const QR_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/?size=180x180&data=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Friendly,
    Premium,
    Bold,
    Professional,
}

impl Tone {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("friendly" | "warm" | "playful" | "casual") => Tone::Friendly,
            Some("luxury" | "premium" | "elegant") => Tone::Premium,
            Some("bold" | "energetic") => Tone::Bold,
            _ => Tone::Professional,
        }
    }

    fn headline(self, name: &str, snapshot: &CampaignSnapshot) -> String {
        match self {
            Tone::Friendly => format!("Share the love, {name}!"),
            Tone::Premium => format!("{name}, an invitation to share {}", snapshot.business_name),
            Tone::Bold => format!(
                "{name}, give {} and get {}",
                snapshot.new_user_reward_text, snapshot.client_reward_text
            ),
            Tone::Professional => format!("{name}, you have rewards waiting"),
        }
    }
}

/// Renders the email for one campaign message from the campaign snapshot and
/// the message's stored body and metadata.
pub fn render_campaign_email(snapshot: &CampaignSnapshot, message: &CampaignMessage) -> RenderedEmail {
    let meta = &message.metadata;
    let name = meta
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("there");
    let subject = meta
        .email_subject
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("A reward from {} for you and your friends", snapshot.business_name));
    let color = highlight_color(snapshot.brand_highlight_color.as_deref());
    let headline = Tone::parse(snapshot.brand_tone.as_deref()).headline(name, snapshot);

    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    let _ = write!(html, "<title>{}</title></head>", escape(&subject));
    html.push_str("<body style=\"margin:0;padding:0;background:#f5f5f7;font-family:Helvetica,Arial,sans-serif;color:#1f2937;\">");

    if let Some(preheader) = meta.email_preheader.as_deref().filter(|p| !p.trim().is_empty()) {
        let _ = write!(
            html,
            "<div style=\"display:none;max-height:0;overflow:hidden;\">{}</div>",
            escape(preheader)
        );
    }

    html.push_str("<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\"><tr><td align=\"center\">");
    html.push_str("<table role=\"presentation\" width=\"600\" cellpadding=\"24\" cellspacing=\"0\" style=\"background:#ffffff;border-radius:12px;\">");

    html.push_str("<tr><td align=\"center\">");
    if let Some(logo) = snapshot.logo_url.as_deref().filter(|l| l.starts_with("https://")) {
        let _ = write!(
            html,
            "<img src=\"{}\" alt=\"{}\" style=\"max-height:64px;\">",
            escape(logo),
            escape(&snapshot.business_name)
        );
    } else {
        let _ = write!(html, "<strong style=\"font-size:20px;\">{}</strong>", escape(&snapshot.business_name));
    }
    html.push_str("</td></tr>");

    let _ = write!(
        html,
        "<tr><td><h1 style=\"font-size:24px;margin:0;color:{color};\">{}</h1></td></tr>",
        escape(&headline)
    );

    html.push_str("<tr><td style=\"font-size:16px;line-height:1.5;\">");
    html.push_str(&text_to_html(&message.body));
    html.push_str("</td></tr>");

    let _ = write!(
        html,
        "<tr><td><table role=\"presentation\" width=\"100%\" cellpadding=\"12\" cellspacing=\"0\"><tr>\
         <td width=\"50%\" style=\"border:2px solid {color};border-radius:8px;\"><div style=\"font-size:12px;text-transform:uppercase;\">Your friends get</div><div style=\"font-size:18px;font-weight:bold;\">{}</div></td>\
         <td width=\"50%\" style=\"border:2px solid {color};border-radius:8px;\"><div style=\"font-size:12px;text-transform:uppercase;\">You earn</div><div style=\"font-size:18px;font-weight:bold;\">{}</div></td>\
         </tr></table></td></tr>",
        escape(&snapshot.new_user_reward_text),
        escape(&snapshot.client_reward_text)
    );

    let _ = write!(
        html,
        "<tr><td align=\"center\"><a href=\"{}\" style=\"display:inline-block;padding:14px 28px;background:{color};color:#ffffff;text-decoration:none;border-radius:999px;font-weight:bold;\">Share your link</a></td></tr>",
        escape(&message.referral_link)
    );

    for block in &snapshot.story_blocks {
        html.push_str("<tr><td>");
        render_story_block(&mut html, block, color);
        html.push_str("</td></tr>");
    }

    if snapshot.include_qr {
        let _ = write!(
            html,
            "<tr><td align=\"center\"><img src=\"{QR_ENDPOINT}{}\" width=\"180\" height=\"180\" alt=\"QR code for your referral link\"><div style=\"font-size:12px;\">Scan to share in person</div></td></tr>",
            encode(&message.referral_link)
        );
    }

    let _ = write!(
        html,
        "<tr><td style=\"font-size:12px;color:#6b7280;\"><a href=\"{}\" style=\"color:{color};\">View your rewards</a>",
        escape(&meta.ambassador_portal_url)
    );
    if let Some(terms) = snapshot.reward_terms.as_deref().filter(|t| !t.trim().is_empty()) {
        let _ = write!(html, "<p>{}</p>", escape(terms));
    }
    html.push_str("</td></tr></table></td></tr></table></body></html>");

    RenderedEmail {
        subject,
        html,
        text: message.body.clone(),
    }
}

fn render_story_block(html: &mut String, block: &StoryBlock, color: &str) {
    match block {
        StoryBlock::Testimonial { quote, attribution } => {
            let _ = write!(
                html,
                "<blockquote style=\"margin:0;padding-left:16px;border-left:4px solid {color};font-style:italic;\">&ldquo;{}&rdquo;<br><span style=\"font-style:normal;font-size:13px;\">{}</span></blockquote>",
                escape(quote),
                escape(attribution)
            );
        }
        StoryBlock::Calculator { title, tiers } => {
            let _ = write!(html, "<h2 style=\"font-size:18px;\">{}</h2>", escape(title));
            html.push_str("<table role=\"presentation\" width=\"100%\" cellpadding=\"8\" cellspacing=\"0\">");
            for tier in tiers {
                let _ = write!(
                    html,
                    "<tr><td style=\"border-bottom:1px solid #e5e7eb;\">{}</td><td align=\"right\" style=\"border-bottom:1px solid #e5e7eb;font-weight:bold;\">{}</td></tr>",
                    escape(&tier.referrals),
                    escape(&tier.reward)
                );
            }
            html.push_str("</table>");
        }
        StoryBlock::Faq { items } => {
            html.push_str("<h2 style=\"font-size:18px;\">Questions</h2>");
            for item in items {
                let _ = write!(
                    html,
                    "<p><strong>{}</strong><br>{}</p>",
                    escape(&item.question),
                    escape(&item.answer)
                );
            }
        }
    }
}

fn highlight_color(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(color)
            if color.starts_with('#')
                && matches!(color.len(), 4 | 7)
                && color[1..].chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            color
        }
        _ => DEFAULT_HIGHLIGHT,
    }
}

fn text_to_html(text: &str) -> String {
    text.split("\n\n")
        .map(|paragraph| {
            let lines: Vec<String> = paragraph.lines().map(linkify).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        })
        .collect()
}

fn linkify(line: &str) -> String {
    let trimmed = line.trim();
    if (trimmed.starts_with("https://") || trimmed.starts_with("http://")) && !trimmed.contains(' ') {
        let href = escape(trimmed);
        format!("<a href=\"{href}\">{href}</a>")
    } else {
        escape(line)
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::models::{
        CalculatorTier, Channel, MessageMetadata, MessageStatus, RewardType,
    };

    fn snapshot() -> CampaignSnapshot {
        CampaignSnapshot {
            business_name: "Glow & Co".to_string(),
            offer_text: "20% off".to_string(),
            new_user_reward_text: "20% off".to_string(),
            client_reward_text: "$25 credit".to_string(),
            reward_type: RewardType::Credit,
            reward_amount: Some(25.0),
            upgrade_name: None,
            reward_terms: Some("New clients only".to_string()),
            logo_url: None,
            brand_highlight_color: Some("#ff6600".to_string()),
            brand_tone: Some("friendly".to_string()),
            story_blocks: vec![StoryBlock::Calculator {
                title: "Tiers".to_string(),
                tiers: vec![CalculatorTier {
                    referrals: "1 referral".to_string(),
                    reward: "$25 credit".to_string(),
                }],
            }],
            include_qr: true,
        }
    }

    fn message() -> CampaignMessage {
        CampaignMessage {
            id: Uuid::nil(),
            campaign_id: Uuid::nil(),
            business_id: Uuid::nil(),
            customer_id: Uuid::nil(),
            channel: Channel::Email,
            to_address: "mia@example.com".to_string(),
            body: "Hi Mia <3\n\nhttps://x.io/r/MIA\nhttps://x.io/referral?code=MIA".to_string(),
            referral_link: "https://x.io/r/MIA".to_string(),
            metadata: MessageMetadata {
                customer_name: Some("Mia".to_string()),
                referral_code: "MIA".to_string(),
                personal_referral_url: "https://x.io/r/MIA".to_string(),
                referral_landing_url: "https://x.io/referral?code=MIA".to_string(),
                ambassador_portal_url: "https://x.io/r/referral?code=MIA".to_string(),
                campaign_name: "Spring".to_string(),
                email_preheader: Some("Rewards inside".to_string()),
                ..Default::default()
            },
            scheduled_at: Utc::now(),
            status: MessageStatus::Sending,
            provider_message_id: None,
            error: None,
            sent_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn renders_snapshot_content_and_escapes_text() {
        let email = render_campaign_email(&snapshot(), &message());
        assert_eq!(email.subject, "A reward from Glow & Co for you and your friends");
        assert_eq!(email.text, message().body);
        assert!(email.html.contains("Share the love, Mia!"));
        assert!(email.html.contains("Glow &amp; Co"));
        assert!(email.html.contains("Hi Mia &lt;3"));
        assert!(email.html.contains("#ff6600"));
        assert!(email.html.contains("Rewards inside"));
        assert!(email.html.contains("New clients only"));
        assert!(email.html.contains("$25 credit"));
        assert!(email.html.contains("<a href=\"https://x.io/r/MIA\">"));
    }

    #[test]
    fn qr_module_follows_snapshot_flag() {
        let with_qr = render_campaign_email(&snapshot(), &message());
        assert!(with_qr.html.contains(QR_ENDPOINT));
        assert!(with_qr.html.contains("https%3A%2F%2Fx.io%2Fr%2FMIA"));

        let mut no_qr = snapshot();
        no_qr.include_qr = false;
        assert!(!render_campaign_email(&no_qr, &message()).html.contains(QR_ENDPOINT));
    }

    #[test]
    fn subject_override_and_invalid_color() {
        let mut snap = snapshot();
        snap.brand_highlight_color = Some("red; background:url(x)".to_string());
        let mut msg = message();
        msg.metadata.email_subject = Some("Your spring link".to_string());

        let email = render_campaign_email(&snap, &msg);
        assert_eq!(email.subject, "Your spring link");
        assert!(email.html.contains(DEFAULT_HIGHLIGHT));
        assert!(!email.html.contains("url(x)"));
    }
}
