use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::{CampaignStatusDto, ChannelKind, MessageStatusDto};

#[derive(Object)]
pub struct DispatchSummaryDto {
    pub sent: u32,
    pub failed: u32,
    pub first_error: Option<String>,
    pub final_status: Option<CampaignStatusDto>,
}

#[derive(Object)]
pub struct LaunchCampaignResponseDto {
    pub campaign_id: Uuid,
    pub queued: u32,
    pub skipped: u32,
    pub dispatch: Option<DispatchSummaryDto>,
}

#[derive(Object)]
pub struct CampaignSnapshotDto {
    pub business_name: String,
    pub offer_text: String,
    pub new_user_reward_text: String,
    pub client_reward_text: String,
    pub reward_type: String,
    pub reward_amount: Option<f64>,
    pub upgrade_name: Option<String>,
    pub reward_terms: Option<String>,
    pub logo_url: Option<String>,
    pub include_qr: bool,
    pub story_blocks: serde_json::Value,
}

#[derive(Object)]
pub struct CampaignDto {
    pub id: Uuid,
    pub name: String,
    pub channel: ChannelKind,
    pub status: CampaignStatusDto,
    pub total_recipients: u32,
    pub sent_count: u32,
    pub failed_count: u32,
    pub snapshot: CampaignSnapshotDto,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Object)]
pub struct CampaignMessageDto {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub channel: ChannelKind,
    pub to_address: String,
    pub status: MessageStatusDto,
    pub referral_link: String,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub scheduled_at: String,
    pub sent_at: Option<String>,
}
