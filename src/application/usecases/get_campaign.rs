use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{Campaign, CampaignMessage},
    repositories::{CampaignMessageRepository, CampaignRepository},
};

pub struct GetCampaignUseCase {
    campaign_repo: Arc<dyn CampaignRepository>,
    message_repo: Arc<dyn CampaignMessageRepository>,
}

impl GetCampaignUseCase {
    pub fn new(
        campaign_repo: Arc<dyn CampaignRepository>,
        message_repo: Arc<dyn CampaignMessageRepository>,
    ) -> Self {
        Self {
            campaign_repo,
            message_repo,
        }
    }

    pub async fn execute(&self, campaign_id: Uuid, business_id: Uuid) -> Result<Campaign, DomainError> {
        let campaign = self
            .campaign_repo
            .get(&campaign_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("campaign {campaign_id}")))?;

        if campaign.business_id != business_id {
            return Err(DomainError::Forbidden(
                "campaign belongs to another business".to_string(),
            ));
        }

        Ok(campaign)
    }

    pub async fn messages(
        &self,
        campaign_id: Uuid,
        business_id: Uuid,
    ) -> Result<Vec<CampaignMessage>, DomainError> {
        self.execute(campaign_id, business_id).await?;
        Ok(self.message_repo.list_by_campaign(&campaign_id).await?)
    }
}
