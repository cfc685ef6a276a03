use chrono::{DateTime, Utc};
use poem_openapi::Object;
use serde::Deserialize;
use uuid::Uuid;

use crate::presentation::models::ChannelKind;

fn default_include_qr() -> bool {
    true
}

#[derive(Object, Debug)]
pub struct LaunchCampaignRequestDto {
    #[oai(validator(min_length = 1, max_length = 200))]
    pub name: String,
    pub channel: ChannelKind,
    #[oai(validator(min_length = 1, max_length = 10000))]
    pub message: String,
    pub customer_ids: Option<Vec<Uuid>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[oai(default = "default_include_qr")]
    pub include_qr: bool,
    pub project_slug: Option<String>,
    pub utm_source: Option<String>,
    pub utm_content: Option<String>,
    #[oai(validator(max_length = 200))]
    pub email_subject: Option<String>,
    #[oai(validator(max_length = 200))]
    pub email_preheader: Option<String>,
    #[oai(validator(max_length = 100))]
    pub email_from_name: Option<String>,
    pub email_reply_to: Option<String>,
    /// Send immediately after queueing instead of waiting for a dispatch call.
    #[oai(default)]
    pub dispatch_now: bool,
}

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub token: Option<String>,
}

/// Twilio message status callback (form encoded).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TwilioStatusCallback {
    pub message_sid: String,
    pub message_status: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendWebhook {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: ResendWebhookData,
}

#[derive(Debug, Deserialize)]
pub struct ResendWebhookData {
    pub email_id: String,
}
