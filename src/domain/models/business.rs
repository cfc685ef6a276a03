use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    Credit,
    Upgrade,
    Discount,
    Points,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::Credit => "credit",
            RewardType::Upgrade => "upgrade",
            RewardType::Discount => "discount",
            RewardType::Points => "points",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "credit" => Some(RewardType::Credit),
            "upgrade" => Some(RewardType::Upgrade),
            "discount" => Some(RewardType::Discount),
            "points" => Some(RewardType::Points),
            _ => None,
        }
    }
}

/// A tenant. The campaign pipeline only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub offer_text: Option<String>,
    pub reward_type: Option<RewardType>,
    pub reward_amount: Option<f64>,
    pub upgrade_name: Option<String>,
    pub reward_terms: Option<String>,
    pub new_user_reward_text: Option<String>,
    pub client_reward_text: Option<String>,
    pub logo_url: Option<String>,
    pub brand_highlight_color: Option<String>,
    pub brand_tone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
