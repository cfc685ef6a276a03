use serde::{Deserialize, Serialize};
use urlencoding::encode;

/// UTM tags attached to outbound referral links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmParams {
    pub campaign: String,
    pub medium: String,
    pub source: Option<String>,
    pub content: Option<String>,
}

impl UtmParams {
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::with_capacity(4);
        if !self.campaign.is_empty() {
            pairs.push(("utm_campaign", self.campaign.as_str()));
        }
        if !self.medium.is_empty() {
            pairs.push(("utm_medium", self.medium.as_str()));
        }
        if let Some(source) = self.source.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("utm_source", source));
        }
        if let Some(content) = self.content.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("utm_content", content));
        }

        pairs
            .into_iter()
            .map(|(key, value)| format!("{key}={}", encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingUrls {
    pub personal_referral_url: String,
    pub referral_landing_url: String,
    pub ambassador_portal_url: String,
}

/// Builds the three outbound URLs for an ambassador. `utm` is a pre-encoded
/// query string and is never attached to the portal URL.
pub fn build_tracking_urls(
    base_url: &str,
    referral_code: &str,
    utm: &str,
    project_slug: Option<&str>,
) -> TrackingUrls {
    let base = base_url.trim_end_matches('/');
    let code = encode(referral_code);
    let utm = utm.trim_start_matches(['?', '&']);

    let mut personal_referral_url = format!("{base}/r/{code}");
    if !utm.is_empty() {
        personal_referral_url.push('?');
        personal_referral_url.push_str(utm);
    }

    let mut referral_landing_url = format!("{base}/referral?code={code}");
    if let Some(slug) = project_slug.map(str::trim).filter(|s| !s.is_empty()) {
        referral_landing_url.push_str("&project=");
        referral_landing_url.push_str(&encode(slug));
    }
    if !utm.is_empty() {
        referral_landing_url.push('&');
        referral_landing_url.push_str(utm);
    }

    TrackingUrls {
        personal_referral_url,
        referral_landing_url,
        ambassador_portal_url: format!("{base}/r/referral?code={code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utm() -> UtmParams {
        UtmParams {
            campaign: "c-1".to_string(),
            medium: "sms".to_string(),
            source: None,
            content: None,
        }
    }

    #[test]
    fn utm_query_has_mandatory_keys_first() {
        assert_eq!(utm().to_query_string(), "utm_campaign=c-1&utm_medium=sms");

        let full = UtmParams {
            source: Some("spring promo".to_string()),
            content: Some("v2".to_string()),
            ..utm()
        };
        assert_eq!(
            full.to_query_string(),
            "utm_campaign=c-1&utm_medium=sms&utm_source=spring%20promo&utm_content=v2"
        );
    }

    #[test]
    fn urls_with_utm_and_project() {
        let urls = build_tracking_urls(
            "https://refer.example.com/",
            "ABC123",
            &utm().to_query_string(),
            Some("spring"),
        );
        assert_eq!(
            urls.personal_referral_url,
            "https://refer.example.com/r/ABC123?utm_campaign=c-1&utm_medium=sms"
        );
        assert_eq!(
            urls.referral_landing_url,
            "https://refer.example.com/referral?code=ABC123&project=spring&utm_campaign=c-1&utm_medium=sms"
        );
        assert_eq!(
            urls.ambassador_portal_url,
            "https://refer.example.com/r/referral?code=ABC123"
        );
    }

    #[test]
    fn empty_utm_and_slug_leave_bare_urls() {
        let urls = build_tracking_urls("https://x.io", "abc", "", None);
        assert_eq!(urls.personal_referral_url, "https://x.io/r/abc");
        assert_eq!(urls.referral_landing_url, "https://x.io/referral?code=abc");
        assert_eq!(urls.ambassador_portal_url, "https://x.io/r/referral?code=abc");

        let blank_slug = build_tracking_urls("https://x.io", "abc", "", Some("  "));
        assert_eq!(blank_slug.referral_landing_url, "https://x.io/referral?code=abc");
    }

    #[test]
    fn repeated_calls_are_identical() {
        let query = utm().to_query_string();
        let first = build_tracking_urls("https://x.io//", "abc", &query, Some("p"));
        let second = build_tracking_urls("https://x.io//", "abc", &query, Some("p"));
        assert_eq!(first, second);
        assert!(first.personal_referral_url.starts_with("https://x.io/r/"));
    }
}
