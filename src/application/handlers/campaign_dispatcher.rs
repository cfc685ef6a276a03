use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::services::{
        email_renderer::render_campaign_email,
        providers::{OutboundEmail, OutboundSms, ProviderConfig},
    },
    domain::{
        errors::DomainError,
        events::{ReferralEvent, ReferralEventType},
        models::{Campaign, CampaignMessage, CampaignStatus, Channel},
        repositories::{CampaignMessageRepository, CampaignRepository, ReferralEventRepository},
    },
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: u32,
    pub failed: u32,
    pub first_error: Option<String>,
    /// Set when this pass left no unfinished messages behind.
    pub final_status: Option<CampaignStatus>,
}

enum Outcome {
    Sent(String),
    Failed(String),
}

/// How long a message may sit in `sending` before another pass may take it over.
pub const DEFAULT_CLAIM_LEASE_MINUTES: i64 = 10;

/// Sends every due queued message of a campaign, one at a time.
pub struct CampaignDispatcher {
    campaign_repo: Arc<dyn CampaignRepository>,
    message_repo: Arc<dyn CampaignMessageRepository>,
    event_repo: Arc<dyn ReferralEventRepository>,
    providers: ProviderConfig,
    claim_lease: Duration,
}

impl CampaignDispatcher {
    pub fn new(
        campaign_repo: Arc<dyn CampaignRepository>,
        message_repo: Arc<dyn CampaignMessageRepository>,
        event_repo: Arc<dyn ReferralEventRepository>,
        providers: ProviderConfig,
    ) -> Self {
        Self {
            campaign_repo,
            message_repo,
            event_repo,
            providers,
            claim_lease: Duration::minutes(DEFAULT_CLAIM_LEASE_MINUTES),
        }
    }

    pub fn with_claim_lease(mut self, claim_lease: Duration) -> Self {
        self.claim_lease = claim_lease;
        self
    }

    pub async fn dispatch(&self, campaign_id: Uuid) -> Result<DispatchSummary, DomainError> {
        let campaign = self
            .campaign_repo
            .get(&campaign_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("campaign {campaign_id}")))?;

        if campaign.status == CampaignStatus::Draft {
            self.campaign_repo
                .update_status(&campaign_id, CampaignStatus::Sending)
                .await?;
        }

        let started = Utc::now();
        let stale_before = started - self.claim_lease;
        info!(
            campaign_id = %campaign_id,
            channel = %campaign.channel,
            "Dispatching campaign messages"
        );
        if !self.providers.is_configured(campaign.channel) {
            warn!(
                campaign_id = %campaign_id,
                channel = %campaign.channel,
                "No provider configured, due messages will be marked failed"
            );
        }

        // One row in flight at a time: an interrupted pass strands at most
        // one `sending` row, which a later pass reclaims once its lease ends.
        let mut summary = DispatchSummary::default();
        while let Some(message) = self
            .message_repo
            .claim_next(&campaign_id, started, stale_before)
            .await?
        {
            match self.deliver(&campaign, &message).await {
                Outcome::Sent(provider_id) => {
                    self.record_sent(&message, &provider_id).await?;
                    summary.sent += 1;
                }
                Outcome::Failed(error) => {
                    self.record_failed(&message, &error).await?;
                    summary.failed += 1;
                    if summary.first_error.is_none() {
                        summary.first_error = Some(error);
                    }
                }
            }
        }

        summary.final_status = self.finalize(&campaign_id).await?;

        info!(
            campaign_id = %campaign_id,
            sent = summary.sent,
            failed = summary.failed,
            final_status = summary.final_status.map(|s| s.as_str()).unwrap_or("sending"),
            "Campaign dispatch pass finished"
        );

        Ok(summary)
    }

    /// Marks the campaign `completed` or `partial` once nothing is left queued
    /// or in flight. Safe to call repeatedly.
    pub async fn finalize(&self, campaign_id: &Uuid) -> Result<Option<CampaignStatus>, DomainError> {
        let unfinished = self.message_repo.count_unfinished(campaign_id).await?;
        if unfinished > 0 {
            debug!(campaign_id = %campaign_id, unfinished, "Campaign still has unfinished messages");
            return Ok(None);
        }

        let campaign = self
            .campaign_repo
            .get(campaign_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("campaign {campaign_id}")))?;
        let status = if campaign.failed_count == 0 {
            CampaignStatus::Completed
        } else {
            CampaignStatus::Partial
        };
        if campaign.status != status {
            self.campaign_repo.update_status(campaign_id, status).await?;
        }
        Ok(Some(status))
    }

    async fn deliver(&self, campaign: &Campaign, message: &CampaignMessage) -> Outcome {
        match message.channel {
            Channel::Email => {
                let Some(channel) = &self.providers.email else {
                    return Outcome::Failed(
                        "Email provider is not configured (missing API key or sender address)"
                            .to_string(),
                    );
                };
                let rendered = render_campaign_email(&campaign.snapshot, message);
                let email = OutboundEmail {
                    from: channel.from_header(message.metadata.email_from_name.as_deref()),
                    to: message.to_address.clone(),
                    subject: rendered.subject,
                    html: rendered.html,
                    text: rendered.text,
                    reply_to: message.metadata.email_reply_to.clone(),
                };
                match channel.client.send_email(&email).await {
                    Ok(id) => Outcome::Sent(id),
                    Err(err) => Outcome::Failed(err.to_string()),
                }
            }
            Channel::Sms => {
                let Some(channel) = &self.providers.sms else {
                    return Outcome::Failed(
                        "SMS provider is not configured (missing account SID, auth token or from number)"
                            .to_string(),
                    );
                };
                let sms = OutboundSms {
                    body: message.body.clone(),
                    from: channel.from_number.clone(),
                    to: message.to_address.clone(),
                };
                match channel.client.send_sms(&sms).await {
                    Ok(sid) => Outcome::Sent(sid),
                    Err(err) => Outcome::Failed(err.to_string()),
                }
            }
        }
    }

    async fn record_sent(&self, message: &CampaignMessage, provider_id: &str) -> anyhow::Result<()> {
        self.message_repo
            .mark_sent(&message.id, provider_id, Utc::now())
            .await?;
        self.campaign_repo
            .increment_counts(&message.campaign_id, 1, 0)
            .await?;
        self.event_repo
            .append(ReferralEvent::for_message(
                message.business_id,
                message.customer_id,
                message.id,
                ReferralEventType::CampaignMessageSent,
                json!({
                    "campaign_id": message.campaign_id,
                    "channel": message.channel,
                    "provider_message_id": provider_id,
                }),
            ))
            .await?;
        debug!(
            message_id = %message.id,
            provider_message_id = %provider_id,
            "Campaign message sent"
        );
        Ok(())
    }

    async fn record_failed(&self, message: &CampaignMessage, error: &str) -> anyhow::Result<()> {
        self.message_repo.mark_failed(&message.id, error).await?;
        self.campaign_repo
            .increment_counts(&message.campaign_id, 0, 1)
            .await?;
        self.event_repo
            .append(ReferralEvent::for_message(
                message.business_id,
                message.customer_id,
                message.id,
                ReferralEventType::CampaignMessageFailed,
                json!({
                    "campaign_id": message.campaign_id,
                    "channel": message.channel,
                    "error": error,
                }),
            ))
            .await?;
        warn!(
            message_id = %message.id,
            channel = %message.channel,
            error = %error,
            "Campaign message failed"
        );
        Ok(())
    }
}
