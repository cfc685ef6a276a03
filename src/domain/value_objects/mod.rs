use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PhoneRegion {
    Us,
    Au,
}

/// A phone number normalized to E.164 for the region it was classified into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhoneNumber {
    region: PhoneRegion,
    e164: String,
}

impl PhoneNumber {
    /// Classifies `raw` as US or AU and normalizes it. Numbers with no clear
    /// US shape are treated as Australian.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let international = trimmed.starts_with('+') || trimmed.starts_with("00");
        let mut digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
        if trimmed.starts_with("00") {
            digits.replace_range(..2, "");
        }
        if digits.is_empty() {
            return None;
        }

        let region = Self::classify(&digits, international);
        let national = match region {
            PhoneRegion::Au => Self::au_national(&digits)?,
            PhoneRegion::Us => Self::us_national(&digits)?,
        };

        let prefix = match region {
            PhoneRegion::Au => "+61",
            PhoneRegion::Us => "+1",
        };

        Some(Self {
            region,
            e164: format!("{prefix}{national}"),
        })
    }

    fn classify(digits: &str, international: bool) -> PhoneRegion {
        if digits.starts_with("61") && (international || digits.len() == 11) {
            return PhoneRegion::Au;
        }
        if digits.starts_with('1') && digits.len() == 11 {
            return PhoneRegion::Us;
        }
        if !international && digits.len() == 10 && !digits.starts_with('0') {
            return PhoneRegion::Us;
        }
        PhoneRegion::Au
    }

    fn au_national(digits: &str) -> Option<String> {
        let national = if let Some(rest) = digits.strip_prefix("61") {
            rest.trim_start_matches('0')
        } else {
            digits.strip_prefix('0').unwrap_or(digits)
        };
        if national.len() != 9 || national.starts_with('0') {
            return None;
        }
        Some(national.to_string())
    }

    fn us_national(digits: &str) -> Option<String> {
        let national = if digits.len() == 11 {
            digits.strip_prefix('1')?
        } else {
            digits
        };
        let area_ok = national
            .chars()
            .next()
            .is_some_and(|first| ('2'..='9').contains(&first));
        if national.len() != 10 || !area_ok {
            return None;
        }
        Some(national.to_string())
    }

    pub fn region(&self) -> PhoneRegion {
        self.region
    }

    pub fn as_str(&self) -> &str {
        &self.e164
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.e164)
    }
}
