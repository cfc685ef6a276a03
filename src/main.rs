use std::io::Error;
use std::sync::Arc;

use poem::{EndpointExt, Route, Server, listener::TcpListener, post};
use poem_openapi::OpenApiService;
use sqlx::postgres::PgPoolOptions;
use tokio::main;
use tracing::{info, warn};

use referral_campaigns::{
    application::{
        handlers::campaign_dispatcher::CampaignDispatcher,
        services::jwt::JwtServiceConfig,
        usecases::{
            get_campaign::GetCampaignUseCase,
            launch_campaign::{LaunchCampaignConfig, LaunchCampaignUseCase},
            record_delivery::RecordDeliveryUseCase,
        },
    },
    config::Config,
    domain::repositories::{
        BusinessRepository, CampaignMessageRepository, CampaignRepository, CustomerRepository,
        ReferralEventRepository,
    },
    infrastructure::{
        providers::build_provider_config,
        repositories::{
            in_memory::{
                InMemoryBusinessRepository, InMemoryCampaignMessageRepository,
                InMemoryCampaignRepository, InMemoryCustomerRepository,
                InMemoryReferralEventRepository,
            },
            postgres::{
                PostgresBusinessRepository, PostgresCampaignMessageRepository,
                PostgresCampaignRepository, PostgresCustomerRepository,
                PostgresReferralEventRepository,
            },
        },
    },
    presentation::http::endpoints::{
        campaigns::CampaignsEndpoints,
        health::HealthEndpoints,
        root::ApiState,
        webhooks::{resend_event, twilio_status},
    },
};

struct Repositories {
    businesses: Arc<dyn BusinessRepository>,
    customers: Arc<dyn CustomerRepository>,
    campaigns: Arc<dyn CampaignRepository>,
    messages: Arc<dyn CampaignMessageRepository>,
    events: Arc<dyn ReferralEventRepository>,
}

async fn build_repositories(config: &Config) -> Result<Repositories, Error> {
    let Some(database_url) = &config.database_url else {
        warn!("DATABASE_URL not set, using in-memory storage");
        let messages = Arc::new(InMemoryCampaignMessageRepository::new());
        let events = Arc::new(InMemoryReferralEventRepository::new());
        return Ok(Repositories {
            businesses: Arc::new(InMemoryBusinessRepository::new()),
            customers: Arc::new(InMemoryCustomerRepository::new()),
            campaigns: Arc::new(InMemoryCampaignRepository::new(&messages, &events)),
            messages,
            events,
        });
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(Error::other)?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(Error::other)?;
    info!("Connected to Postgres and applied migrations");

    Ok(Repositories {
        businesses: PostgresBusinessRepository::new(pool.clone()),
        customers: PostgresCustomerRepository::new(pool.clone()),
        campaigns: PostgresCampaignRepository::new(pool.clone()),
        messages: PostgresCampaignMessageRepository::new(pool.clone()),
        events: PostgresReferralEventRepository::new(pool),
    })
}

#[main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "referral_campaigns=info,poem=info".into()),
        )
        .init();

    let config = Config::try_parse().map_err(Error::other)?;
    let repos = build_repositories(&config).await?;
    let providers = build_provider_config(&config).map_err(Error::other)?;

    let dispatcher = Arc::new(CampaignDispatcher::new(
        repos.campaigns.clone(),
        repos.messages.clone(),
        repos.events.clone(),
        providers,
    ));
    let state = Arc::new(ApiState {
        launch_campaign_usecase: Arc::new(LaunchCampaignUseCase::new(
            repos.businesses.clone(),
            repos.customers.clone(),
            repos.campaigns.clone(),
            LaunchCampaignConfig {
                site_url: config.site_url.clone(),
            },
        )),
        get_campaign_usecase: Arc::new(GetCampaignUseCase::new(
            repos.campaigns.clone(),
            repos.messages.clone(),
        )),
        record_delivery_usecase: Arc::new(RecordDeliveryUseCase::new(
            repos.messages.clone(),
            repos.events.clone(),
        )),
        dispatcher,
        business_repo: repos.businesses.clone(),
        jwt_config: JwtServiceConfig {
            secret: config.jwt_secret.clone(),
            audience: config.jwt_audience.clone(),
        },
        webhook_token: config.webhook_token.clone(),
    });
    if state.webhook_token.is_none() {
        warn!("WEBHOOK_TOKEN not set, delivery webhooks will be rejected");
    }

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);
    info!(%server_url, "Starting server");

    let api_service = OpenApiService::new(
        (HealthEndpoints, CampaignsEndpoints::new(state.clone())),
        "Referral Campaigns API",
        "0.1.0",
    )
    .server(format!("{}/api", server_url));
    let ui = api_service.swagger_ui();
    let app = Route::new()
        .nest("/api", api_service)
        .at("/webhooks/twilio/status", post(twilio_status))
        .at("/webhooks/resend", post(resend_event))
        .nest("/", ui)
        .data(state);

    Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run(app)
        .await
}
