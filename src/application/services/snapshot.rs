use crate::domain::models::{
    Business, CalculatorTier, CampaignSnapshot, FaqItem, RewardType, StoryBlock,
};

const DEFAULT_OFFER_TEXT: &str = "an exclusive welcome offer";
const DEFAULT_UPGRADE_LABEL: &str = "a complimentary upgrade";
const DEFAULT_CREDIT_LABEL: &str = "account credit";
const DEFAULT_DISCOUNT_LABEL: &str = "an exclusive discount";
const DEFAULT_POINTS: f64 = 100.0;

/// Freezes the business's current reward configuration for a new campaign.
pub fn build_snapshot(business: &Business, include_qr: bool) -> CampaignSnapshot {
    let reward_type = business.reward_type.unwrap_or(RewardType::Credit);
    let offer_text = non_blank(&business.offer_text).unwrap_or(DEFAULT_OFFER_TEXT).to_string();
    let new_user_reward_text = non_blank(&business.new_user_reward_text)
        .map(str::to_string)
        .unwrap_or_else(|| offer_text.clone());
    let client_reward_text = non_blank(&business.client_reward_text)
        .map(str::to_string)
        .unwrap_or_else(|| default_client_reward_text(business, reward_type));

    let story_blocks = build_story_blocks(
        &business.name,
        reward_type,
        business.reward_amount,
        &new_user_reward_text,
        &client_reward_text,
        non_blank(&business.reward_terms),
    );

    CampaignSnapshot {
        business_name: business.name.clone(),
        offer_text,
        new_user_reward_text,
        client_reward_text,
        reward_type,
        reward_amount: business.reward_amount,
        upgrade_name: business.upgrade_name.clone(),
        reward_terms: business.reward_terms.clone(),
        logo_url: business.logo_url.clone(),
        brand_highlight_color: business.brand_highlight_color.clone(),
        brand_tone: business.brand_tone.clone(),
        story_blocks,
        include_qr,
    }
}

fn default_client_reward_text(business: &Business, reward_type: RewardType) -> String {
    match reward_type {
        RewardType::Credit => match business.reward_amount {
            Some(amount) => format!("${} credit", format_amount(amount)),
            None => DEFAULT_CREDIT_LABEL.to_string(),
        },
        RewardType::Upgrade => non_blank(&business.upgrade_name)
            .unwrap_or(DEFAULT_UPGRADE_LABEL)
            .to_string(),
        RewardType::Discount => match business.reward_amount {
            Some(amount) => format!("{}% discount", format_amount(amount)),
            None => DEFAULT_DISCOUNT_LABEL.to_string(),
        },
        RewardType::Points => format!(
            "{} points",
            format_amount(business.reward_amount.unwrap_or(DEFAULT_POINTS))
        ),
    }
}

fn build_story_blocks(
    business_name: &str,
    reward_type: RewardType,
    reward_amount: Option<f64>,
    new_user_reward: &str,
    client_reward: &str,
    terms: Option<&str>,
) -> Vec<StoryBlock> {
    let testimonial = StoryBlock::Testimonial {
        quote: format!(
            "I sent my link to a couple of friends. They got {new_user_reward} and I got {client_reward}. Easiest reward I've ever earned."
        ),
        attribution: format!("A {business_name} ambassador"),
    };

    let calculator = StoryBlock::Calculator {
        title: "What your referrals are worth".to_string(),
        tiers: calculator_tiers(reward_type, reward_amount, client_reward),
    };

    let mut items = vec![
        FaqItem {
            question: "How does it work?".to_string(),
            answer: format!(
                "Share your personal link. Friends who use it receive {new_user_reward}, and you earn {client_reward} for each one who becomes a customer."
            ),
        },
        FaqItem {
            question: "What do my friends get?".to_string(),
            answer: capitalize(new_user_reward),
        },
        FaqItem {
            question: "When do I receive my reward?".to_string(),
            answer: format!(
                "Your {client_reward} is added to your account after your friend's first visit."
            ),
        },
    ];
    if let Some(terms) = terms {
        items.push(FaqItem {
            question: "Are there any conditions?".to_string(),
            answer: terms.to_string(),
        });
    }

    vec![testimonial, calculator, StoryBlock::Faq { items }]
}

fn calculator_tiers(
    reward_type: RewardType,
    reward_amount: Option<f64>,
    client_reward: &str,
) -> Vec<CalculatorTier> {
    let labels = ["1 referral", "3 referrals", "10+ referrals"];
    let rewards: [String; 3] = match (reward_type, reward_amount) {
        (RewardType::Credit, Some(amount)) => [
            format!("${} credit", format_amount(amount)),
            format!("${} credit", format_amount(amount * 3.0)),
            format!("${}+ credit", format_amount(amount * 10.0)),
        ],
        (RewardType::Points, amount) => {
            let points = amount.unwrap_or(DEFAULT_POINTS);
            [
                format!("{} points", format_amount(points)),
                format!("{} points", format_amount(points * 3.0)),
                format!("{}+ points", format_amount(points * 10.0)),
            ]
        }
        _ => [
            client_reward.to_string(),
            format!("3 x {client_reward}"),
            format!("10+ x {client_reward}"),
        ],
    };

    labels
        .into_iter()
        .zip(rewards)
        .map(|(referrals, reward)| CalculatorTier {
            referrals: referrals.to_string(),
            reward,
        })
        .collect()
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{amount:.2}")
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
