use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::Channel;
use crate::domain::errors::DomainError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Queued,
    Sending,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Queued => "queued",
            MessageStatus::Sending => "sending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(MessageStatus::Queued),
            "sending" => Some(MessageStatus::Sending),
            "sent" => Some(MessageStatus::Sent),
            "failed" => Some(MessageStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Sent | MessageStatus::Failed)
    }
}

/// Context stored next to each message so that rendering and dispatch never
/// have to re-derive tracking URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageMetadata {
    pub customer_name: Option<String>,
    pub referral_code: String,
    pub personal_referral_url: String,
    pub referral_landing_url: String,
    pub ambassador_portal_url: String,
    pub campaign_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_preheader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_reply_to: Option<String>,
}

impl MessageMetadata {
    pub fn validate(&self, channel: Channel) -> Result<(), DomainError> {
        let required = [
            ("referral_code", &self.referral_code),
            ("personal_referral_url", &self.personal_referral_url),
            ("referral_landing_url", &self.referral_landing_url),
            ("ambassador_portal_url", &self.ambassador_portal_url),
            ("campaign_name", &self.campaign_name),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "message metadata is missing {key}"
                )));
            }
        }

        if channel == Channel::Sms {
            let email_keys = [
                &self.email_subject,
                &self.email_preheader,
                &self.email_from_name,
                &self.email_reply_to,
            ];
            if email_keys.iter().any(|value| value.is_some()) {
                return Err(DomainError::Validation(
                    "email overrides are not allowed on sms messages".to_string(),
                ));
            }
        }

        if let Some(reply_to) = &self.email_reply_to {
            if !reply_to.contains('@') {
                return Err(DomainError::Validation(format!(
                    "invalid reply-to address: {reply_to}"
                )));
            }
        }

        Ok(())
    }
}

/// A message produced by the batch builder, before it is given an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCampaignMessage {
    pub campaign_id: Uuid,
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub channel: Channel,
    pub to_address: String,
    pub body: String,
    pub referral_link: String,
    pub metadata: MessageMetadata,
    pub scheduled_at: DateTime<Utc>,
}

impl NewCampaignMessage {
    pub fn into_queued(self, id: Uuid, now: DateTime<Utc>) -> CampaignMessage {
        CampaignMessage {
            id,
            campaign_id: self.campaign_id,
            business_id: self.business_id,
            customer_id: self.customer_id,
            channel: self.channel,
            to_address: self.to_address,
            body: self.body,
            referral_link: self.referral_link,
            metadata: self.metadata,
            scheduled_at: self.scheduled_at,
            status: MessageStatus::Queued,
            provider_message_id: None,
            error: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignMessage {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub channel: Channel,
    pub to_address: String,
    pub body: String,
    pub referral_link: String,
    pub metadata: MessageMetadata,
    pub scheduled_at: DateTime<Utc>,
    pub status: MessageStatus,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
