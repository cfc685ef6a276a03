use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    application::services::{
        batch_builder::{
            BatchRequest, CampaignRef, EmailOverrides, Recipient, build_campaign_messages,
        },
        snapshot::build_snapshot,
    },
    domain::{
        errors::DomainError,
        events::{ReferralEvent, ReferralEventType},
        models::{Campaign, CampaignStatus, Channel},
        repositories::{BusinessRepository, CampaignRepository, CustomerRepository},
    },
};

pub struct LaunchCampaignConfig {
    pub site_url: String,
}

pub struct LaunchCampaignUseCase {
    business_repo: Arc<dyn BusinessRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    campaign_repo: Arc<dyn CampaignRepository>,
    config: LaunchCampaignConfig,
}

pub struct LaunchCampaignRequest {
    pub business_id: Uuid,
    pub name: String,
    pub channel: Channel,
    pub template: String,
    /// Explicit audience. `None` targets every active customer.
    pub customer_ids: Option<Vec<Uuid>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub include_qr: bool,
    pub project_slug: Option<String>,
    pub utm_source: Option<String>,
    pub utm_content: Option<String>,
    pub email: EmailOverrides,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCampaignResponse {
    pub campaign_id: Uuid,
    pub queued: u32,
    pub skipped: u32,
}

impl LaunchCampaignUseCase {
    pub fn new(
        business_repo: Arc<dyn BusinessRepository>,
        customer_repo: Arc<dyn CustomerRepository>,
        campaign_repo: Arc<dyn CampaignRepository>,
        config: LaunchCampaignConfig,
    ) -> Self {
        Self {
            business_repo,
            customer_repo,
            campaign_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        request: LaunchCampaignRequest,
    ) -> Result<LaunchCampaignResponse, DomainError> {
        Self::validate(&request)?;

        let business = self
            .business_repo
            .get(&request.business_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("business {}", request.business_id)))?;

        let customers = self
            .customer_repo
            .list_for_campaign(&business.id, request.customer_ids.as_deref())
            .await?;
        let recipients: Vec<Recipient> = customers.iter().map(Recipient::from).collect();

        let campaign_ref = CampaignRef {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            channel: request.channel,
        };
        let now = Utc::now();
        let batch = build_campaign_messages(&BatchRequest {
            campaign: &campaign_ref,
            business_id: business.id,
            site_url: &self.config.site_url,
            template: &request.template,
            recipients: &recipients,
            scheduled_at: request.scheduled_at.unwrap_or(now),
            utm_source: request.utm_source.clone(),
            utm_content: request.utm_content.clone(),
            project_slug: request.project_slug.clone(),
            email: request.email.clone(),
        });

        if batch.messages.is_empty() {
            return Err(DomainError::Validation(format!(
                "no eligible recipients for a {} campaign ({} skipped)",
                request.channel, batch.skipped
            )));
        }
        for message in &batch.messages {
            message.metadata.validate(message.channel)?;
        }

        let campaign = Campaign {
            id: campaign_ref.id,
            business_id: business.id,
            name: campaign_ref.name.clone(),
            channel: campaign_ref.channel,
            status: CampaignStatus::Sending,
            total_recipients: batch.messages.len() as u32,
            sent_count: 0,
            failed_count: 0,
            snapshot: build_snapshot(&business, request.include_qr),
            created_at: now,
            updated_at: now,
        };
        let skipped = batch.skipped as u32;
        let messages: Vec<_> = batch
            .messages
            .into_iter()
            .map(|message| message.into_queued(Uuid::new_v4(), now))
            .collect();
        let events: Vec<_> = messages
            .iter()
            .map(|message| {
                ReferralEvent::for_message(
                    message.business_id,
                    message.customer_id,
                    message.id,
                    ReferralEventType::CampaignMessageQueued,
                    json!({
                        "campaign_id": message.campaign_id,
                        "channel": message.channel,
                        "scheduled_at": message.scheduled_at,
                    }),
                )
            })
            .collect();
        self.campaign_repo
            .insert_with_messages(&campaign, &messages, &events)
            .await?;

        info!(
            campaign_id = %campaign.id,
            business_id = %business.id,
            channel = %campaign.channel,
            queued = messages.len(),
            skipped,
            "Campaign launched"
        );

        Ok(LaunchCampaignResponse {
            campaign_id: campaign.id,
            queued: messages.len() as u32,
            skipped,
        })
    }

    fn validate(request: &LaunchCampaignRequest) -> Result<(), DomainError> {
        if request.name.trim().is_empty() {
            return Err(DomainError::Validation("campaign name is required".to_string()));
        }
        if request.template.trim().is_empty() {
            return Err(DomainError::Validation("message template is required".to_string()));
        }
        if matches!(&request.customer_ids, Some(ids) if ids.is_empty()) {
            return Err(DomainError::Validation(
                "customer_ids must not be empty when provided".to_string(),
            ));
        }
        Ok(())
    }
}
