use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReferralEventType {
    CampaignMessageQueued,
    CampaignMessageSent,
    CampaignMessageDelivered,
    CampaignMessageFailed,
}

impl ReferralEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralEventType::CampaignMessageQueued => "campaign_message_queued",
            ReferralEventType::CampaignMessageSent => "campaign_message_sent",
            ReferralEventType::CampaignMessageDelivered => "campaign_message_delivered",
            ReferralEventType::CampaignMessageFailed => "campaign_message_failed",
        }
    }
}

/// Append-only audit record of a campaign message lifecycle step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralEvent {
    pub id: Uuid,
    pub business_id: Uuid,
    pub ambassador_id: Option<Uuid>,
    pub campaign_message_id: Option<Uuid>,
    pub event_type: ReferralEventType,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ReferralEvent {
    pub fn for_message(
        business_id: Uuid,
        ambassador_id: Uuid,
        campaign_message_id: Uuid,
        event_type: ReferralEventType,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_id,
            ambassador_id: Some(ambassador_id),
            campaign_message_id: Some(campaign_message_id),
            event_type,
            payload,
            created_at: Utc::now(),
        }
    }
}
