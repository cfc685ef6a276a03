use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    events::ReferralEvent,
    models::{Business, Campaign, CampaignMessage, CampaignStatus, Customer},
};

#[async_trait]
pub trait BusinessRepository: Send + Sync {
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Business>>;
    async fn find_by_owner(&self, owner_id: &Uuid) -> anyhow::Result<Option<Business>>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Customers of `business_id`. With `ids` the listed customers are returned
    /// regardless of status, otherwise only active ones.
    async fn list_for_campaign(
        &self,
        business_id: &Uuid,
        ids: Option<&[Uuid]>,
    ) -> anyhow::Result<Vec<Customer>>;
}

#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Stores a launched campaign with its queued messages and their
    /// `campaign_message_queued` events. Either everything is written or
    /// nothing is.
    async fn insert_with_messages(
        &self,
        campaign: &Campaign,
        messages: &[CampaignMessage],
        events: &[ReferralEvent],
    ) -> anyhow::Result<()>;
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Campaign>>;
    async fn update_status(&self, id: &Uuid, status: CampaignStatus) -> anyhow::Result<()>;
    /// Atomic `sent_count += sent_delta, failed_count += failed_delta`.
    async fn increment_counts(
        &self,
        id: &Uuid,
        sent_delta: u32,
        failed_delta: u32,
    ) -> anyhow::Result<()>;
}

#[async_trait]
pub trait CampaignMessageRepository: Send + Sync {
    /// Atomically moves one message of the campaign to `sending` and returns
    /// it. Candidates are `queued` rows due by `due_before` and `sending` rows
    /// last touched before `stale_before`. Oldest first.
    async fn claim_next(
        &self,
        campaign_id: &Uuid,
        due_before: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> anyhow::Result<Option<CampaignMessage>>;

    async fn mark_sent(
        &self,
        id: &Uuid,
        provider_message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn mark_failed(&self, id: &Uuid, error: &str) -> anyhow::Result<()>;

    /// Number of messages still `queued` or `sending`.
    async fn count_unfinished(&self, campaign_id: &Uuid) -> anyhow::Result<u64>;

    async fn list_by_campaign(&self, campaign_id: &Uuid) -> anyhow::Result<Vec<CampaignMessage>>;

    async fn find_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> anyhow::Result<Option<CampaignMessage>>;
}

#[async_trait]
pub trait ReferralEventRepository: Send + Sync {
    async fn append(&self, event: ReferralEvent) -> anyhow::Result<()>;
}
