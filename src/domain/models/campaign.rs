use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{business::RewardType, channel::Channel};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Sending,
    Completed,
    Partial,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Sending => "sending",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Partial => "partial",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(CampaignStatus::Draft),
            "sending" => Some(CampaignStatus::Sending),
            "completed" => Some(CampaignStatus::Completed),
            "partial" => Some(CampaignStatus::Partial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculatorTier {
    pub referrals: String,
    pub reward: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

/// Marketing copy frozen onto a campaign next to the reward configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoryBlock {
    Testimonial { quote: String, attribution: String },
    Calculator { title: String, tiers: Vec<CalculatorTier> },
    Faq { items: Vec<FaqItem> },
}

/// The business's offer and reward configuration as it was when the campaign
/// was launched. Never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignSnapshot {
    pub business_name: String,
    pub offer_text: String,
    pub new_user_reward_text: String,
    pub client_reward_text: String,
    pub reward_type: RewardType,
    pub reward_amount: Option<f64>,
    pub upgrade_name: Option<String>,
    pub reward_terms: Option<String>,
    pub logo_url: Option<String>,
    pub brand_highlight_color: Option<String>,
    pub brand_tone: Option<String>,
    pub story_blocks: Vec<StoryBlock>,
    pub include_qr: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub channel: Channel,
    pub status: CampaignStatus,
    pub total_recipients: u32,
    pub sent_count: u32,
    pub failed_count: u32,
    pub snapshot: CampaignSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
