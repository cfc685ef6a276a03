use crate::{
    application::handlers::campaign_dispatcher::DispatchSummary,
    domain::models::{Campaign, CampaignMessage},
    presentation::http::responses::{
        CampaignDto, CampaignMessageDto, CampaignSnapshotDto, DispatchSummaryDto,
    },
};

pub fn map_campaign(campaign: &Campaign) -> CampaignDto {
    let snapshot = &campaign.snapshot;
    CampaignDto {
        id: campaign.id,
        name: campaign.name.clone(),
        channel: campaign.channel.into(),
        status: campaign.status.into(),
        total_recipients: campaign.total_recipients,
        sent_count: campaign.sent_count,
        failed_count: campaign.failed_count,
        snapshot: CampaignSnapshotDto {
            business_name: snapshot.business_name.clone(),
            offer_text: snapshot.offer_text.clone(),
            new_user_reward_text: snapshot.new_user_reward_text.clone(),
            client_reward_text: snapshot.client_reward_text.clone(),
            reward_type: snapshot.reward_type.as_str().to_string(),
            reward_amount: snapshot.reward_amount,
            upgrade_name: snapshot.upgrade_name.clone(),
            reward_terms: snapshot.reward_terms.clone(),
            logo_url: snapshot.logo_url.clone(),
            include_qr: snapshot.include_qr,
            story_blocks: serde_json::to_value(&snapshot.story_blocks)
                .unwrap_or(serde_json::Value::Null),
        },
        created_at: campaign.created_at.to_rfc3339(),
        updated_at: campaign.updated_at.to_rfc3339(),
    }
}

pub fn map_message(message: &CampaignMessage) -> CampaignMessageDto {
    CampaignMessageDto {
        id: message.id,
        customer_id: message.customer_id,
        channel: message.channel.into(),
        to_address: message.to_address.clone(),
        status: message.status.into(),
        referral_link: message.referral_link.clone(),
        provider_message_id: message.provider_message_id.clone(),
        error: message.error.clone(),
        scheduled_at: message.scheduled_at.to_rfc3339(),
        sent_at: message.sent_at.map(|at| at.to_rfc3339()),
    }
}

pub fn map_summary(summary: &DispatchSummary) -> DispatchSummaryDto {
    DispatchSummaryDto {
        sent: summary.sent,
        failed: summary.failed,
        first_error: summary.first_error.clone(),
        final_status: summary.final_status.map(Into::into),
    }
}
