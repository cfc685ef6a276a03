use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use referral_campaigns::{
    application::{
        handlers::campaign_dispatcher::CampaignDispatcher,
        services::{
            batch_builder::EmailOverrides,
            providers::{
                EmailChannel, EmailProvider, OutboundEmail, OutboundSms, ProviderConfig,
                SmsChannel, SmsProvider,
            },
        },
        usecases::{
            get_campaign::GetCampaignUseCase,
            launch_campaign::{LaunchCampaignConfig, LaunchCampaignRequest, LaunchCampaignUseCase},
            record_delivery::RecordDeliveryUseCase,
        },
    },
    domain::{
        errors::DomainError,
        events::ReferralEventType,
        models::{
            Business, CampaignMessage, CampaignStatus, Channel, Customer, CustomerStatus,
            MessageStatus, RewardType,
        },
        repositories::CampaignRepository,
    },
    infrastructure::repositories::in_memory::{
        InMemoryBusinessRepository, InMemoryCampaignMessageRepository, InMemoryCampaignRepository,
        InMemoryCustomerRepository, InMemoryReferralEventRepository,
    },
};

#[derive(Default)]
struct FakeEmail {
    sent: Mutex<Vec<OutboundEmail>>,
    latency: Option<StdDuration>,
}

impl FakeEmail {
    fn slow(latency: StdDuration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }
}

#[async_trait]
impl EmailProvider for FakeEmail {
    async fn send_email(&self, email: &OutboundEmail) -> anyhow::Result<String> {
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
        if email.to.starts_with("bounce@") {
            anyhow::bail!("Resend rejected email (422): invalid recipient");
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(format!("re_{}", sent.len()))
    }
}

#[derive(Default)]
struct FakeSms {
    sent: Mutex<Vec<OutboundSms>>,
}

#[async_trait]
impl SmsProvider for FakeSms {
    async fn send_sms(&self, sms: &OutboundSms) -> anyhow::Result<String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(sms.clone());
        Ok(format!("SM{}", sent.len()))
    }
}

struct Harness {
    business_id: Uuid,
    customers: Arc<InMemoryCustomerRepository>,
    campaigns: Arc<InMemoryCampaignRepository>,
    messages: Arc<InMemoryCampaignMessageRepository>,
    events: Arc<InMemoryReferralEventRepository>,
    launch: LaunchCampaignUseCase,
    queries: GetCampaignUseCase,
    dispatcher: CampaignDispatcher,
    delivery: RecordDeliveryUseCase,
}

fn business() -> Business {
    let now = Utc::now();
    Business {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        name: "Glow Studio".to_string(),
        offer_text: Some("Give a friend 20% off".to_string()),
        reward_type: Some(RewardType::Credit),
        reward_amount: Some(25.0),
        upgrade_name: None,
        reward_terms: None,
        new_user_reward_text: None,
        client_reward_text: None,
        logo_url: None,
        brand_highlight_color: None,
        brand_tone: None,
        created_at: now,
        updated_at: now,
    }
}

fn customer(business_id: Uuid, name: &str, phone: Option<&str>, email: Option<&str>) -> Customer {
    Customer {
        id: Uuid::new_v4(),
        business_id,
        name: Some(name.to_string()),
        phone: phone.map(str::to_string),
        email: email.map(str::to_string),
        referral_code: Some(format!("{}1", name.to_uppercase())),
        discount_code: None,
        credits: 0.0,
        status: CustomerStatus::Active,
        created_at: Utc::now(),
    }
}

async fn harness(customers: &[(&str, Option<&str>, Option<&str>)], providers: ProviderConfig) -> Harness {
    let businesses = Arc::new(InMemoryBusinessRepository::new());
    let customer_repo = Arc::new(InMemoryCustomerRepository::new());
    let messages = Arc::new(InMemoryCampaignMessageRepository::new());
    let events = Arc::new(InMemoryReferralEventRepository::new());
    let campaigns = Arc::new(InMemoryCampaignRepository::new(&messages, &events));

    let business = business();
    let business_id = business.id;
    businesses.upsert(business).await;
    for (name, phone, email) in customers {
        customer_repo
            .insert(customer(business_id, name, *phone, *email))
            .await;
    }

    Harness {
        business_id,
        launch: LaunchCampaignUseCase::new(
            businesses.clone(),
            customer_repo.clone(),
            campaigns.clone(),
            LaunchCampaignConfig {
                site_url: "https://app.example.com".to_string(),
            },
        ),
        queries: GetCampaignUseCase::new(campaigns.clone(), messages.clone()),
        dispatcher: CampaignDispatcher::new(
            campaigns.clone(),
            messages.clone(),
            events.clone(),
            providers,
        ),
        delivery: RecordDeliveryUseCase::new(messages.clone(), events.clone()),
        customers: customer_repo,
        campaigns,
        messages,
        events,
    }
}

fn request(business_id: Uuid, channel: Channel) -> LaunchCampaignRequest {
    LaunchCampaignRequest {
        business_id,
        name: "Spring referrals".to_string(),
        channel,
        template: "Hi {{name}}, share your link: {{referral_link}}".to_string(),
        customer_ids: None,
        scheduled_at: None,
        include_qr: true,
        project_slug: None,
        utm_source: None,
        utm_content: None,
        email: EmailOverrides::default(),
    }
}

fn email_providers(fake: Arc<FakeEmail>) -> ProviderConfig {
    ProviderConfig {
        email: Some(EmailChannel {
            client: fake,
            from_email: "hello@glow.example".to_string(),
            from_name: Some("Glow Studio".to_string()),
        }),
        sms: None,
    }
}

async fn event_count(harness: &Harness, event_type: ReferralEventType) -> usize {
    harness
        .events
        .all()
        .await
        .iter()
        .filter(|e| e.event_type == event_type)
        .count()
}

#[tokio::test]
async fn launch_queues_messages_and_skips_unreachable_customers() {
    let h = harness(
        &[
            ("mia", Some("0412 345 678"), None),
            ("sam", None, Some("sam@example.com")),
        ],
        ProviderConfig::default(),
    )
    .await;

    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Sms))
        .await
        .unwrap();

    assert_eq!(launched.queued, 1);
    assert_eq!(launched.skipped, 1);

    let campaign = h.campaigns.get(&launched.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.status, CampaignStatus::Sending);
    assert_eq!(campaign.total_recipients, 1);
    assert_eq!(campaign.snapshot.business_name, "Glow Studio");

    let messages = h
        .queries
        .messages(launched.campaign_id, h.business_id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to_address, "+61412345678");
    assert_eq!(messages[0].status, MessageStatus::Queued);
    assert!(messages[0].body.starts_with("Hi mia, share your link: https://app.example.com/"));
    assert_eq!(event_count(&h, ReferralEventType::CampaignMessageQueued).await, 1);
}

#[tokio::test]
async fn launch_without_eligible_recipients_is_rejected() {
    let h = harness(&[("sam", None, None)], ProviderConfig::default()).await;

    let err = h
        .launch
        .execute(request(h.business_id, Channel::Email))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Validation(_)));
    assert!(h.events.all().await.is_empty());
}

#[tokio::test]
async fn unconfigured_email_provider_fails_every_message() {
    let h = harness(
        &[
            ("ana", None, Some("ana@example.com")),
            ("ben", None, Some("ben@example.com")),
            ("cat", None, Some("cat@example.com")),
        ],
        ProviderConfig::default(),
    )
    .await;
    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Email))
        .await
        .unwrap();

    let summary = h.dispatcher.dispatch(launched.campaign_id).await.unwrap();

    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 3);
    assert!(summary.first_error.unwrap().contains("not configured"));
    assert_eq!(summary.final_status, Some(CampaignStatus::Partial));

    let campaign = h.campaigns.get(&launched.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.failed_count, 3);
    assert_eq!(campaign.sent_count, 0);
    assert_eq!(campaign.status, CampaignStatus::Partial);
    assert_eq!(event_count(&h, ReferralEventType::CampaignMessageFailed).await, 3);
}

#[tokio::test]
async fn successful_sends_complete_the_campaign() {
    let fake = Arc::new(FakeEmail::default());
    let h = harness(
        &[
            ("ana", None, Some("ana@example.com")),
            ("ben", None, Some("ben@example.com")),
        ],
        email_providers(fake.clone()),
    )
    .await;
    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Email))
        .await
        .unwrap();

    let summary = h.dispatcher.dispatch(launched.campaign_id).await.unwrap();

    assert_eq!(summary.sent, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.final_status, Some(CampaignStatus::Completed));

    let campaign = h.campaigns.get(&launched.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.sent_count, 2);
    assert_eq!(campaign.status, CampaignStatus::Completed);

    let sent = fake.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].from, "Glow Studio <hello@glow.example>");
    assert!(sent.iter().all(|e| e.html.contains("Glow Studio")));

    let messages = h.messages_for(launched.campaign_id).await;
    assert!(messages.iter().all(|m| m.status == MessageStatus::Sent));
    assert!(messages.iter().all(|m| m.provider_message_id.is_some()));
    assert!(messages.iter().all(|m| m.sent_at.is_some()));
}

#[tokio::test]
async fn provider_error_only_fails_its_own_message() {
    let fake = Arc::new(FakeEmail::default());
    let h = harness(
        &[
            ("ana", None, Some("ana@example.com")),
            ("bounce", None, Some("bounce@example.com")),
        ],
        email_providers(fake.clone()),
    )
    .await;
    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Email))
        .await
        .unwrap();

    let summary = h.dispatcher.dispatch(launched.campaign_id).await.unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.first_error.unwrap().contains("invalid recipient"));
    assert_eq!(summary.final_status, Some(CampaignStatus::Partial));

    let messages = h.messages_for(launched.campaign_id).await;
    let failed: Vec<_> = messages
        .iter()
        .filter(|m| m.status == MessageStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].to_address, "bounce@example.com");
    assert!(failed[0].error.is_some());

    let campaign = h.campaigns.get(&launched.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.sent_count, 1);
    assert_eq!(campaign.failed_count, 1);
    assert_eq!(campaign.status, CampaignStatus::Partial);
}

#[tokio::test]
async fn second_dispatch_sends_nothing_and_keeps_counts() {
    let fake = Arc::new(FakeSms::default());
    let h = harness(
        &[("mia", Some("+1 415 555 0100"), None)],
        ProviderConfig {
            email: None,
            sms: Some(SmsChannel {
                client: fake.clone(),
                from_number: "+15550001111".to_string(),
            }),
        },
    )
    .await;
    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Sms))
        .await
        .unwrap();

    let first = h.dispatcher.dispatch(launched.campaign_id).await.unwrap();
    let second = h.dispatcher.dispatch(launched.campaign_id).await.unwrap();

    assert_eq!(first.sent, 1);
    assert_eq!(second.sent + second.failed, 0);
    assert_eq!(second.final_status, Some(CampaignStatus::Completed));
    assert_eq!(fake.sent.lock().unwrap().len(), 1);
    assert_eq!(fake.sent.lock().unwrap()[0].to, "+14155550100");

    let campaign = h.campaigns.get(&launched.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.sent_count + campaign.failed_count, campaign.total_recipients);
    assert_eq!(event_count(&h, ReferralEventType::CampaignMessageSent).await, 1);
}

#[tokio::test]
async fn future_messages_wait_for_their_schedule() {
    let fake = Arc::new(FakeEmail::default());
    let h = harness(
        &[("ana", None, Some("ana@example.com"))],
        email_providers(fake.clone()),
    )
    .await;
    let mut req = request(h.business_id, Channel::Email);
    req.scheduled_at = Some(Utc::now() + Duration::hours(2));
    let launched = h.launch.execute(req).await.unwrap();

    let summary = h.dispatcher.dispatch(launched.campaign_id).await.unwrap();

    assert_eq!(summary.sent, 0);
    assert_eq!(summary.final_status, None);
    assert!(fake.sent.lock().unwrap().is_empty());

    let campaign = h.campaigns.get(&launched.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.status, CampaignStatus::Sending);
}

#[tokio::test]
async fn delivery_receipt_is_recorded_as_event() {
    let fake = Arc::new(FakeEmail::default());
    let h = harness(
        &[("ana", None, Some("ana@example.com"))],
        email_providers(fake),
    )
    .await;
    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Email))
        .await
        .unwrap();
    h.dispatcher.dispatch(launched.campaign_id).await.unwrap();

    let provider_id = h.messages_for(launched.campaign_id).await[0]
        .provider_message_id
        .clone()
        .unwrap();

    assert!(h.delivery.execute(&provider_id, "email.delivered").await.unwrap());
    assert!(!h.delivery.execute("re_unknown", "email.delivered").await.unwrap());
    assert_eq!(event_count(&h, ReferralEventType::CampaignMessageDelivered).await, 1);

    let messages = h.messages_for(launched.campaign_id).await;
    assert_eq!(messages[0].status, MessageStatus::Sent);
}

#[tokio::test]
async fn campaigns_are_scoped_to_their_business() {
    let h = harness(&[("ana", None, Some("ana@example.com"))], ProviderConfig::default()).await;
    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Email))
        .await
        .unwrap();

    let err = h
        .queries
        .execute(launched.campaign_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let missing = h
        .queries
        .execute(Uuid::new_v4(), h.business_id)
        .await
        .unwrap_err();
    assert!(matches!(missing, DomainError::NotFound(_)));
}

impl Harness {
    fn dispatcher(&self, providers: ProviderConfig) -> CampaignDispatcher {
        CampaignDispatcher::new(
            self.campaigns.clone(),
            self.messages.clone(),
            self.events.clone(),
            providers,
        )
    }

    async fn messages_for(&self, campaign_id: Uuid) -> Vec<CampaignMessage> {
        use referral_campaigns::domain::repositories::CampaignMessageRepository;
        self.messages.list_by_campaign(&campaign_id).await.unwrap()
    }
}

#[tokio::test]
async fn unconfigured_sms_provider_fails_every_message() {
    let h = harness(
        &[
            ("mia", Some("0412 345 678"), None),
            ("lee", Some("+1 415 555 0100"), None),
        ],
        ProviderConfig::default(),
    )
    .await;
    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Sms))
        .await
        .unwrap();

    let summary = h.dispatcher.dispatch(launched.campaign_id).await.unwrap();

    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 2);
    assert!(summary.first_error.unwrap().contains("SMS provider is not configured"));
    assert_eq!(summary.final_status, Some(CampaignStatus::Partial));

    let campaign = h.campaigns.get(&launched.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.failed_count, 2);
    let messages = h.messages_for(launched.campaign_id).await;
    assert!(messages.iter().all(|m| m.status == MessageStatus::Failed));
}

fn in_flight(messages: &[CampaignMessage]) -> usize {
    messages
        .iter()
        .filter(|m| m.status == MessageStatus::Sending)
        .count()
}

#[tokio::test]
async fn interrupted_pass_is_finished_by_a_later_one() {
    let names = ["ana", "ben", "cat", "dan", "eve"];
    let addresses: Vec<String> = names.iter().map(|n| format!("{n}@example.com")).collect();
    let customers: Vec<_> = names
        .iter()
        .zip(&addresses)
        .map(|(n, a)| (*n, None, Some(a.as_str())))
        .collect();
    let h = harness(&customers, ProviderConfig::default()).await;
    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Email))
        .await
        .unwrap();

    let slow = h.dispatcher(email_providers(Arc::new(FakeEmail::slow(
        StdDuration::from_millis(200),
    ))));
    let cut_short = tokio::time::timeout(
        StdDuration::from_millis(300),
        slow.dispatch(launched.campaign_id),
    )
    .await;
    assert!(cut_short.is_err());

    assert_eq!(in_flight(&h.messages_for(launched.campaign_id).await), 1);

    // Within the lease the in-flight row is left alone.
    let healthy = Arc::new(FakeEmail::default());
    let guarded = h
        .dispatcher(email_providers(healthy.clone()))
        .dispatch(launched.campaign_id)
        .await
        .unwrap();
    assert_eq!(guarded.sent, 3);
    assert_eq!(guarded.final_status, None);

    let recovered = h
        .dispatcher(email_providers(healthy.clone()))
        .with_claim_lease(Duration::zero())
        .dispatch(launched.campaign_id)
        .await
        .unwrap();
    assert_eq!(recovered.sent, 1);
    assert_eq!(recovered.final_status, Some(CampaignStatus::Completed));

    let messages = h.messages_for(launched.campaign_id).await;
    assert_eq!(in_flight(&messages), 0);
    assert!(messages.iter().all(|m| m.status == MessageStatus::Sent));

    let campaign = h.campaigns.get(&launched.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.sent_count, 5);
    assert_eq!(campaign.status, CampaignStatus::Completed);
}

#[tokio::test]
async fn concurrent_passes_send_each_message_once() {
    let names = ["ana", "ben", "cat", "dan", "eve", "fay"];
    let addresses: Vec<String> = names.iter().map(|n| format!("{n}@example.com")).collect();
    let customers: Vec<_> = names
        .iter()
        .zip(&addresses)
        .map(|(n, a)| (*n, None, Some(a.as_str())))
        .collect();
    let fake = Arc::new(FakeEmail::default());
    let h = harness(&customers, email_providers(fake.clone())).await;
    let launched = h
        .launch
        .execute(request(h.business_id, Channel::Email))
        .await
        .unwrap();
    let other = h.dispatcher(email_providers(fake.clone()));

    let (first, second) = tokio::join!(
        h.dispatcher.dispatch(launched.campaign_id),
        other.dispatch(launched.campaign_id),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.sent + second.sent, 6);
    assert_eq!(first.failed + second.failed, 0);

    let sent = fake.sent.lock().unwrap().clone();
    let recipients: HashSet<_> = sent.iter().map(|e| e.to.clone()).collect();
    assert_eq!(sent.len(), 6);
    assert_eq!(recipients.len(), 6);

    let messages = h.messages_for(launched.campaign_id).await;
    let delivered = messages
        .iter()
        .filter(|m| m.status == MessageStatus::Sent)
        .count() as u32;
    let campaign = h.campaigns.get(&launched.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.sent_count, delivered);
    assert_eq!(campaign.sent_count, 6);
    assert_eq!(campaign.status, CampaignStatus::Completed);
    assert_eq!(event_count(&h, ReferralEventType::CampaignMessageSent).await, 6);
}

#[tokio::test]
async fn failed_launch_writes_nothing() {
    let h = harness(&[], ProviderConfig::default()).await;
    let twice = customer(h.business_id, "ana", None, Some("ana@example.com"));
    h.customers.insert(twice.clone()).await;
    h.customers.insert(twice).await;

    let err = h
        .launch
        .execute(request(h.business_id, Channel::Email))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Other(_)));
    assert!(h.campaigns.all().await.is_empty());
    assert!(h.events.all().await.is_empty());
}
