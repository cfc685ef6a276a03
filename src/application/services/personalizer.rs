pub const NAME_PLACEHOLDER: &str = "{{name}}";
pub const REFERRAL_LINK_PLACEHOLDER: &str = "{{referral_link}}";
const FALLBACK_NAME: &str = "there";

/// Fills `{{name}}` and `{{referral_link}}`. Templates without a link
/// placeholder get the referral link and landing URL appended as the last two
/// lines so every message stays trackable.
pub fn personalize(
    template: &str,
    referral_link: &str,
    landing_url: &str,
    name: Option<&str>,
) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(FALLBACK_NAME);
    let has_link = template.contains(REFERRAL_LINK_PLACEHOLDER);

    let body = fill(template, name, referral_link);

    if has_link {
        body
    } else {
        format!("{}\n\n{referral_link}\n{landing_url}", body.trim_end())
    }
}

/// Single pass over the template so substituted values are never rescanned.
fn fill(template: &str, name: &str, referral_link: &str) -> String {
    let mut out = String::with_capacity(template.len() + referral_link.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix(NAME_PLACEHOLDER) {
            out.push_str(name);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(REFERRAL_LINK_PLACEHOLDER) {
            out.push_str(referral_link);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_links_when_placeholder_missing() {
        let body = personalize(
            "Hi {{name}}, check this out",
            "https://x/r/abc",
            "https://x/referral?code=abc",
            Some("Sam"),
        );
        assert_eq!(
            body,
            "Hi Sam, check this out\n\nhttps://x/r/abc\nhttps://x/referral?code=abc"
        );
        assert!(body.ends_with("https://x/r/abc\nhttps://x/referral?code=abc"));
    }

    #[test]
    fn substitutes_every_placeholder_occurrence() {
        let body = personalize(
            "{{name}}! {{referral_link}} ({{name}})",
            "https://x/r/abc",
            "https://x/referral?code=abc",
            Some("  Ana "),
        );
        assert_eq!(body, "Ana! https://x/r/abc (Ana)");
    }

    #[test]
    fn placeholders_inside_a_name_stay_literal() {
        let body = personalize(
            "Hi {{name}}: {{referral_link}}",
            "https://x/r/abc",
            "https://x/referral?code=abc",
            Some("{{referral_link}}"),
        );
        assert_eq!(body, "Hi {{referral_link}}: https://x/r/abc");
    }

    #[test]
    fn stray_braces_are_kept() {
        let body = personalize("{{{name}} {x} {{referral_link}}", "L", "", Some("Ana"));
        assert_eq!(body, "{Ana {x} L");
    }

    #[test]
    fn missing_or_blank_name_falls_back() {
        let link = "https://x/r/abc";
        assert_eq!(personalize("Hey {{name}} {{referral_link}}", link, "", None), "Hey there https://x/r/abc");
        assert_eq!(personalize("Hey {{name}} {{referral_link}}", link, "", Some("")), "Hey there https://x/r/abc");
    }

    #[test]
    fn output_is_deterministic() {
        let args = ("Hi {{name}}", "https://x/r/1", "https://x/referral?code=1", Some("Lee"));
        assert_eq!(
            personalize(args.0, args.1, args.2, args.3),
            personalize(args.0, args.1, args.2, args.3)
        );
    }
}
