use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    events::ReferralEvent,
    models::{
        Business, Campaign, CampaignMessage, CampaignStatus, Customer, CustomerStatus,
        MessageStatus,
    },
    repositories::{
        BusinessRepository, CampaignMessageRepository, CampaignRepository, CustomerRepository,
        ReferralEventRepository,
    },
};

#[derive(Default)]
pub struct InMemoryBusinessRepository {
    businesses: Arc<RwLock<HashMap<Uuid, Business>>>,
}

impl InMemoryBusinessRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, business: Business) {
        self.businesses.write().await.insert(business.id, business);
    }
}

#[async_trait]
impl BusinessRepository for InMemoryBusinessRepository {
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Business>> {
        Ok(self.businesses.read().await.get(id).cloned())
    }

    async fn find_by_owner(&self, owner_id: &Uuid) -> anyhow::Result<Option<Business>> {
        let businesses = self.businesses.read().await;
        Ok(businesses.values().find(|b| &b.owner_id == owner_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: Arc<RwLock<Vec<Customer>>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, customer: Customer) {
        self.customers.write().await.push(customer);
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn list_for_campaign(
        &self,
        business_id: &Uuid,
        ids: Option<&[Uuid]>,
    ) -> anyhow::Result<Vec<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers
            .iter()
            .filter(|c| &c.business_id == business_id)
            .filter(|c| match ids {
                Some(ids) => ids.contains(&c.id),
                None => c.status == CustomerStatus::Active,
            })
            .cloned()
            .collect())
    }
}

/// Shares message and event storage with the sibling repositories so a launch
/// is written under all three locks at once.
pub struct InMemoryCampaignRepository {
    campaigns: Arc<RwLock<HashMap<Uuid, Campaign>>>,
    messages: Arc<RwLock<Vec<CampaignMessage>>>,
    events: Arc<RwLock<Vec<ReferralEvent>>>,
}

impl InMemoryCampaignRepository {
    pub fn new(
        messages: &InMemoryCampaignMessageRepository,
        events: &InMemoryReferralEventRepository,
    ) -> Self {
        Self {
            campaigns: Arc::default(),
            messages: messages.messages.clone(),
            events: events.events.clone(),
        }
    }

    pub async fn all(&self) -> Vec<Campaign> {
        self.campaigns.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn insert_with_messages(
        &self,
        campaign: &Campaign,
        messages: &[CampaignMessage],
        events: &[ReferralEvent],
    ) -> anyhow::Result<()> {
        let mut campaigns = self.campaigns.write().await;
        let mut stored_messages = self.messages.write().await;
        let mut stored_events = self.events.write().await;

        if campaigns.contains_key(&campaign.id) {
            anyhow::bail!("campaign {} already exists", campaign.id);
        }
        let mut recipients = HashSet::new();
        for message in messages {
            let taken = stored_messages
                .iter()
                .any(|m| m.campaign_id == message.campaign_id && m.customer_id == message.customer_id);
            if taken || !recipients.insert((message.campaign_id, message.customer_id)) {
                anyhow::bail!(
                    "customer {} already has a message in campaign {}",
                    message.customer_id,
                    message.campaign_id
                );
            }
        }

        campaigns.insert(campaign.id, campaign.clone());
        stored_messages.extend(messages.iter().cloned());
        stored_events.extend(events.iter().cloned());
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Campaign>> {
        Ok(self.campaigns.read().await.get(id).cloned())
    }

    async fn update_status(&self, id: &Uuid, status: CampaignStatus) -> anyhow::Result<()> {
        let mut campaigns = self.campaigns.write().await;
        if let Some(campaign) = campaigns.get_mut(id) {
            campaign.status = status;
            campaign.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn increment_counts(
        &self,
        id: &Uuid,
        sent_delta: u32,
        failed_delta: u32,
    ) -> anyhow::Result<()> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("campaign {id} not found"))?;
        campaign.sent_count += sent_delta;
        campaign.failed_count += failed_delta;
        campaign.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCampaignMessageRepository {
    messages: Arc<RwLock<Vec<CampaignMessage>>>,
}

impl InMemoryCampaignMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignMessageRepository for InMemoryCampaignMessageRepository {
    async fn claim_next(
        &self,
        campaign_id: &Uuid,
        due_before: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> anyhow::Result<Option<CampaignMessage>> {
        let mut messages = self.messages.write().await;
        let claimable = messages.iter_mut().find(|m| {
            &m.campaign_id == campaign_id
                && match m.status {
                    MessageStatus::Queued => m.scheduled_at <= due_before,
                    MessageStatus::Sending => m.updated_at < stale_before,
                    MessageStatus::Sent | MessageStatus::Failed => false,
                }
        });

        Ok(claimable.map(|m| {
            m.status = MessageStatus::Sending;
            m.updated_at = Utc::now();
            m.clone()
        }))
    }

    async fn mark_sent(
        &self,
        id: &Uuid,
        provider_message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        if let Some(message) = messages
            .iter_mut()
            .find(|m| &m.id == id && !m.status.is_terminal())
        {
            message.status = MessageStatus::Sent;
            message.provider_message_id = Some(provider_message_id.to_string());
            message.sent_at = Some(sent_at);
            message.error = None;
            message.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_failed(&self, id: &Uuid, error: &str) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        if let Some(message) = messages
            .iter_mut()
            .find(|m| &m.id == id && !m.status.is_terminal())
        {
            message.status = MessageStatus::Failed;
            message.error = Some(error.to_string());
            message.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn count_unfinished(&self, campaign_id: &Uuid) -> anyhow::Result<u64> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| &m.campaign_id == campaign_id && !m.status.is_terminal())
            .count() as u64)
    }

    async fn list_by_campaign(&self, campaign_id: &Uuid) -> anyhow::Result<Vec<CampaignMessage>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| &m.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn find_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> anyhow::Result<Option<CampaignMessage>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .find(|m| m.provider_message_id.as_deref() == Some(provider_message_id))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryReferralEventRepository {
    events: Arc<RwLock<Vec<ReferralEvent>>>,
}

impl InMemoryReferralEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<ReferralEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl ReferralEventRepository for InMemoryReferralEventRepository {
    async fn append(&self, event: ReferralEvent) -> anyhow::Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
