use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{
    errors::DomainError,
    events::{ReferralEvent, ReferralEventType},
    repositories::{CampaignMessageRepository, ReferralEventRepository},
};

/// Records provider delivery receipts as `campaign_message_delivered` events.
/// The message row itself stays `sent`.
pub struct RecordDeliveryUseCase {
    message_repo: Arc<dyn CampaignMessageRepository>,
    event_repo: Arc<dyn ReferralEventRepository>,
}

impl RecordDeliveryUseCase {
    pub fn new(
        message_repo: Arc<dyn CampaignMessageRepository>,
        event_repo: Arc<dyn ReferralEventRepository>,
    ) -> Self {
        Self {
            message_repo,
            event_repo,
        }
    }

    /// Returns `false` when no message carries `provider_message_id`.
    pub async fn execute(
        &self,
        provider_message_id: &str,
        provider_status: &str,
    ) -> Result<bool, DomainError> {
        let Some(message) = self
            .message_repo
            .find_by_provider_id(provider_message_id)
            .await?
        else {
            warn!(provider_message_id, "Delivery receipt for unknown message");
            return Ok(false);
        };

        self.event_repo
            .append(ReferralEvent::for_message(
                message.business_id,
                message.customer_id,
                message.id,
                ReferralEventType::CampaignMessageDelivered,
                json!({
                    "campaign_id": message.campaign_id,
                    "channel": message.channel,
                    "provider_message_id": provider_message_id,
                    "provider_status": provider_status,
                }),
            ))
            .await?;

        debug!(message_id = %message.id, provider_status, "Delivery recorded");
        Ok(true)
    }
}
