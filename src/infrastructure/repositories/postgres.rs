use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres, postgres::PgArguments, query::Query, types::Json};
use uuid::Uuid;

use crate::domain::{
    events::ReferralEvent,
    models::{
        Business, Campaign, CampaignMessage, CampaignSnapshot, CampaignStatus, Channel, Customer,
        CustomerStatus, MessageMetadata, MessageStatus, RewardType, StoryBlock,
    },
    repositories::{
        BusinessRepository, CampaignMessageRepository, CampaignRepository, CustomerRepository,
        ReferralEventRepository,
    },
};

pub type PgPool = Pool<Postgres>;

const BUSINESS_COLUMNS: &str = "id, owner_id, name, offer_text, reward_type, reward_amount, \
    upgrade_name, reward_terms, new_user_reward_text, client_reward_text, logo_url, \
    brand_highlight_color, brand_tone, created_at, updated_at";

const CAMPAIGN_COLUMNS: &str = "id, business_id, name, channel, status, total_recipients, \
    sent_count, failed_count, snapshot_business_name, snapshot_offer_text, \
    snapshot_new_user_reward_text, snapshot_client_reward_text, snapshot_reward_type, \
    snapshot_reward_amount, snapshot_upgrade_name, snapshot_reward_terms, snapshot_logo_url, \
    snapshot_brand_highlight_color, snapshot_brand_tone, snapshot_story_blocks, \
    snapshot_include_qr, created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, campaign_id, business_id, customer_id, channel, to_address, \
    body, referral_link, metadata, scheduled_at, status, provider_message_id, error, sent_at, \
    created_at, updated_at";

#[derive(Clone)]
pub struct PostgresBusinessRepository {
    pool: PgPool,
}

impl PostgresBusinessRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl BusinessRepository for PostgresBusinessRepository {
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Business>> {
        let record = sqlx::query_as::<_, BusinessRecord>(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(Business::try_from).transpose()
    }

    async fn find_by_owner(&self, owner_id: &Uuid) -> anyhow::Result<Option<Business>> {
        let record = sqlx::query_as::<_, BusinessRecord>(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(Business::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn list_for_campaign(
        &self,
        business_id: &Uuid,
        ids: Option<&[Uuid]>,
    ) -> anyhow::Result<Vec<Customer>> {
        let query = match ids {
            Some(ids) => sqlx::query_as::<_, CustomerRecord>(
                r#"
                SELECT id, business_id, name, phone, email, referral_code, discount_code,
                       credits, status, created_at
                FROM customers
                WHERE business_id = $1 AND id = ANY($2)
                ORDER BY created_at
                "#,
            )
            .bind(business_id)
            .bind(ids.to_vec()),
            None => sqlx::query_as::<_, CustomerRecord>(
                r#"
                SELECT id, business_id, name, phone, email, referral_code, discount_code,
                       credits, status, created_at
                FROM customers
                WHERE business_id = $1 AND status = 'active'
                ORDER BY created_at
                "#,
            )
            .bind(business_id),
        };

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Customer::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PostgresCampaignRepository {
    pool: PgPool,
}

impl PostgresCampaignRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl CampaignRepository for PostgresCampaignRepository {
    async fn insert_with_messages(
        &self,
        campaign: &Campaign,
        messages: &[CampaignMessage],
        events: &[ReferralEvent],
    ) -> anyhow::Result<()> {
        let snapshot = &campaign.snapshot;
        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!(
            "INSERT INTO campaigns ({CAMPAIGN_COLUMNS}) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22,$23)"
        ))
        .bind(campaign.id)
        .bind(campaign.business_id)
        .bind(&campaign.name)
        .bind(campaign.channel.as_str())
        .bind(campaign.status.as_str())
        .bind(campaign.total_recipients as i32)
        .bind(campaign.sent_count as i32)
        .bind(campaign.failed_count as i32)
        .bind(&snapshot.business_name)
        .bind(&snapshot.offer_text)
        .bind(&snapshot.new_user_reward_text)
        .bind(&snapshot.client_reward_text)
        .bind(snapshot.reward_type.as_str())
        .bind(snapshot.reward_amount)
        .bind(&snapshot.upgrade_name)
        .bind(&snapshot.reward_terms)
        .bind(&snapshot.logo_url)
        .bind(&snapshot.brand_highlight_color)
        .bind(&snapshot.brand_tone)
        .bind(Json(&snapshot.story_blocks))
        .bind(snapshot.include_qr)
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&mut *tx)
        .await?;

        let message_sql = format!(
            "INSERT INTO campaign_messages ({MESSAGE_COLUMNS}) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)"
        );
        for message in messages {
            sqlx::query(&message_sql)
                .bind(message.id)
                .bind(message.campaign_id)
                .bind(message.business_id)
                .bind(message.customer_id)
                .bind(message.channel.as_str())
                .bind(&message.to_address)
                .bind(&message.body)
                .bind(&message.referral_link)
                .bind(Json(&message.metadata))
                .bind(message.scheduled_at)
                .bind(message.status.as_str())
                .bind(&message.provider_message_id)
                .bind(&message.error)
                .bind(message.sent_at)
                .bind(message.created_at)
                .bind(message.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        for event in events {
            insert_event(event).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Campaign>> {
        let record = sqlx::query_as::<_, CampaignRecord>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(Campaign::try_from).transpose()
    }

    async fn update_status(&self, id: &Uuid, status: CampaignStatus) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE campaigns
            SET status = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_counts(
        &self,
        id: &Uuid,
        sent_delta: u32,
        failed_delta: u32,
    ) -> anyhow::Result<()> {
        sqlx::query("SELECT increment_campaign_counts($1, $2, $3)")
            .bind(id)
            .bind(sent_delta as i32)
            .bind(failed_delta as i32)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PostgresCampaignMessageRepository {
    pool: PgPool,
}

impl PostgresCampaignMessageRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl CampaignMessageRepository for PostgresCampaignMessageRepository {
    async fn claim_next(
        &self,
        campaign_id: &Uuid,
        due_before: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> anyhow::Result<Option<CampaignMessage>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "UPDATE campaign_messages \
             SET status = 'sending', updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM campaign_messages \
                 WHERE campaign_id = $1 \
                   AND ((status = 'queued' AND scheduled_at <= $2) \
                     OR (status = 'sending' AND updated_at < $3)) \
                 ORDER BY created_at, id \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(campaign_id)
        .bind(due_before)
        .bind(stale_before)
        .fetch_optional(&self.pool)
        .await?;
        record.map(CampaignMessage::try_from).transpose()
    }

    async fn mark_sent(
        &self,
        id: &Uuid,
        provider_message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE campaign_messages
            SET status = 'sent',
                provider_message_id = $2,
                sent_at = $3,
                error = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('queued', 'sending')
            "#,
        )
        .bind(id)
        .bind(provider_message_id)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: &Uuid, error: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE campaign_messages
            SET status = 'failed',
                error = $2,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('queued', 'sending')
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_unfinished(&self, campaign_id: &Uuid) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM campaign_messages
            WHERE campaign_id = $1 AND status IN ('queued', 'sending')
            "#,
        )
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn list_by_campaign(&self, campaign_id: &Uuid) -> anyhow::Result<Vec<CampaignMessage>> {
        let rows = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM campaign_messages \
             WHERE campaign_id = $1 ORDER BY created_at"
        ))
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CampaignMessage::try_from).collect()
    }

    async fn find_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> anyhow::Result<Option<CampaignMessage>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM campaign_messages WHERE provider_message_id = $1"
        ))
        .bind(provider_message_id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(CampaignMessage::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PostgresReferralEventRepository {
    pool: PgPool,
}

impl PostgresReferralEventRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

fn insert_event(event: &ReferralEvent) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO referral_events (
            id, business_id, ambassador_id, campaign_message_id, event_type, payload, created_at
        )
        VALUES ($1,$2,$3,$4,$5,$6,$7)
        "#,
    )
    .bind(event.id)
    .bind(event.business_id)
    .bind(event.ambassador_id)
    .bind(event.campaign_message_id)
    .bind(event.event_type.as_str())
    .bind(Json(&event.payload))
    .bind(event.created_at)
}

#[async_trait]
impl ReferralEventRepository for PostgresReferralEventRepository {
    async fn append(&self, event: ReferralEvent) -> anyhow::Result<()> {
        insert_event(&event).execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(FromRow)]
struct BusinessRecord {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    offer_text: Option<String>,
    reward_type: Option<String>,
    reward_amount: Option<f64>,
    upgrade_name: Option<String>,
    reward_terms: Option<String>,
    new_user_reward_text: Option<String>,
    client_reward_text: Option<String>,
    logo_url: Option<String>,
    brand_highlight_color: Option<String>,
    brand_tone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BusinessRecord> for Business {
    type Error = anyhow::Error;

    fn try_from(value: BusinessRecord) -> Result<Self, Self::Error> {
        let reward_type = value
            .reward_type
            .map(|raw| {
                RewardType::from_str(&raw)
                    .ok_or_else(|| anyhow::anyhow!("unknown reward type {raw}"))
            })
            .transpose()?;
        Ok(Self {
            id: value.id,
            owner_id: value.owner_id,
            name: value.name,
            offer_text: value.offer_text,
            reward_type,
            reward_amount: value.reward_amount,
            upgrade_name: value.upgrade_name,
            reward_terms: value.reward_terms,
            new_user_reward_text: value.new_user_reward_text,
            client_reward_text: value.client_reward_text,
            logo_url: value.logo_url,
            brand_highlight_color: value.brand_highlight_color,
            brand_tone: value.brand_tone,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CustomerRecord {
    id: Uuid,
    business_id: Uuid,
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    referral_code: Option<String>,
    discount_code: Option<String>,
    credits: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRecord> for Customer {
    type Error = anyhow::Error;

    fn try_from(value: CustomerRecord) -> Result<Self, Self::Error> {
        let status = CustomerStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown customer status {}", value.status))?;
        Ok(Self {
            id: value.id,
            business_id: value.business_id,
            name: value.name,
            phone: value.phone,
            email: value.email,
            referral_code: value.referral_code,
            discount_code: value.discount_code,
            credits: value.credits,
            status,
            created_at: value.created_at,
        })
    }
}

#[derive(FromRow)]
struct CampaignRecord {
    id: Uuid,
    business_id: Uuid,
    name: String,
    channel: String,
    status: String,
    total_recipients: i32,
    sent_count: i32,
    failed_count: i32,
    snapshot_business_name: String,
    snapshot_offer_text: String,
    snapshot_new_user_reward_text: String,
    snapshot_client_reward_text: String,
    snapshot_reward_type: String,
    snapshot_reward_amount: Option<f64>,
    snapshot_upgrade_name: Option<String>,
    snapshot_reward_terms: Option<String>,
    snapshot_logo_url: Option<String>,
    snapshot_brand_highlight_color: Option<String>,
    snapshot_brand_tone: Option<String>,
    snapshot_story_blocks: Json<Vec<StoryBlock>>,
    snapshot_include_qr: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CampaignRecord> for Campaign {
    type Error = anyhow::Error;

    fn try_from(value: CampaignRecord) -> Result<Self, Self::Error> {
        let channel = Channel::from_str(&value.channel)
            .ok_or_else(|| anyhow::anyhow!("unknown channel {}", value.channel))?;
        let status = CampaignStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown campaign status {}", value.status))?;
        let reward_type = RewardType::from_str(&value.snapshot_reward_type).ok_or_else(|| {
            anyhow::anyhow!("unknown reward type {}", value.snapshot_reward_type)
        })?;
        Ok(Self {
            id: value.id,
            business_id: value.business_id,
            name: value.name,
            channel,
            status,
            total_recipients: value.total_recipients as u32,
            sent_count: value.sent_count as u32,
            failed_count: value.failed_count as u32,
            snapshot: CampaignSnapshot {
                business_name: value.snapshot_business_name,
                offer_text: value.snapshot_offer_text,
                new_user_reward_text: value.snapshot_new_user_reward_text,
                client_reward_text: value.snapshot_client_reward_text,
                reward_type,
                reward_amount: value.snapshot_reward_amount,
                upgrade_name: value.snapshot_upgrade_name,
                reward_terms: value.snapshot_reward_terms,
                logo_url: value.snapshot_logo_url,
                brand_highlight_color: value.snapshot_brand_highlight_color,
                brand_tone: value.snapshot_brand_tone,
                story_blocks: value.snapshot_story_blocks.0,
                include_qr: value.snapshot_include_qr,
            },
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    campaign_id: Uuid,
    business_id: Uuid,
    customer_id: Uuid,
    channel: String,
    to_address: String,
    body: String,
    referral_link: String,
    metadata: Json<MessageMetadata>,
    scheduled_at: DateTime<Utc>,
    status: String,
    provider_message_id: Option<String>,
    error: Option<String>,
    sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for CampaignMessage {
    type Error = anyhow::Error;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let channel = Channel::from_str(&value.channel)
            .ok_or_else(|| anyhow::anyhow!("unknown channel {}", value.channel))?;
        let status = MessageStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown message status {}", value.status))?;
        Ok(Self {
            id: value.id,
            campaign_id: value.campaign_id,
            business_id: value.business_id,
            customer_id: value.customer_id,
            channel,
            to_address: value.to_address,
            body: value.body,
            referral_link: value.referral_link,
            metadata: value.metadata.0,
            scheduled_at: value.scheduled_at,
            status,
            provider_message_id: value.provider_message_id,
            error: value.error,
            sent_at: value.sent_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}
