use std::sync::Arc;

use poem::http::StatusCode;
use poem_openapi::{OpenApi, param::Path, payload::Json};
use tracing::info;
use uuid::Uuid;

use crate::application::handlers::campaign_dispatcher::DispatchSummary;
use crate::application::services::batch_builder::EmailOverrides;
use crate::application::usecases::launch_campaign::LaunchCampaignRequest;
use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags, domain_error},
    mappers::{map_campaign, map_message, map_summary},
    requests::LaunchCampaignRequestDto,
    responses::{CampaignDto, CampaignMessageDto, DispatchSummaryDto, LaunchCampaignResponseDto},
    security::JwtAuth,
};

#[derive(Clone)]
pub struct CampaignsEndpoints {
    state: Arc<ApiState>,
}

impl CampaignsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }

    /// Runs the pass on its own task so a dropped request cannot cut it short.
    async fn run_dispatch(&self, campaign_id: Uuid) -> poem::Result<DispatchSummary> {
        let dispatcher = self.state.dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch(campaign_id).await })
            .await
            .map_err(|err| {
                poem::Error::from_string(err.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
            })?
            .map_err(domain_error)
    }
}

#[OpenApi]
impl CampaignsEndpoints {
    /// Snapshot the offer, queue one message per eligible customer and
    /// optionally send right away.
    #[oai(path = "/campaigns", method = "post", tag = EndpointsTags::Campaigns)]
    pub async fn launch_campaign(
        &self,
        auth: JwtAuth,
        body: Json<LaunchCampaignRequestDto>,
    ) -> poem::Result<Json<LaunchCampaignResponseDto>> {
        let business_id = self.state.business_for(auth).await?;
        let dto = body.0;
        let dispatch_now = dto.dispatch_now;

        let launched = self
            .state
            .launch_campaign_usecase
            .execute(LaunchCampaignRequest {
                business_id,
                name: dto.name,
                channel: dto.channel.into(),
                template: dto.message,
                customer_ids: dto.customer_ids,
                scheduled_at: dto.scheduled_at,
                include_qr: dto.include_qr,
                project_slug: dto.project_slug,
                utm_source: dto.utm_source,
                utm_content: dto.utm_content,
                email: EmailOverrides {
                    subject: dto.email_subject,
                    preheader: dto.email_preheader,
                    from_name: dto.email_from_name,
                    reply_to: dto.email_reply_to,
                },
            })
            .await
            .map_err(domain_error)?;

        let dispatch = if dispatch_now {
            let summary = self.run_dispatch(launched.campaign_id).await?;
            Some(map_summary(&summary))
        } else {
            None
        };

        info!(
            campaign_id = %launched.campaign_id,
            queued = launched.queued,
            skipped = launched.skipped,
            "Campaign launched"
        );

        Ok(Json(LaunchCampaignResponseDto {
            campaign_id: launched.campaign_id,
            queued: launched.queued,
            skipped: launched.skipped,
            dispatch,
        }))
    }

    /// Send every queued message that is due.
    #[oai(
        path = "/campaigns/:campaign_id/dispatch",
        method = "post",
        tag = EndpointsTags::Campaigns,
    )]
    pub async fn dispatch_campaign(
        &self,
        auth: JwtAuth,
        campaign_id: Path<Uuid>,
    ) -> poem::Result<Json<DispatchSummaryDto>> {
        let business_id = self.state.business_for(auth).await?;
        self.state
            .get_campaign_usecase
            .execute(campaign_id.0, business_id)
            .await
            .map_err(domain_error)?;

        let summary = self.run_dispatch(campaign_id.0).await?;

        Ok(Json(map_summary(&summary)))
    }

    #[oai(
        path = "/campaigns/:campaign_id",
        method = "get",
        tag = EndpointsTags::Campaigns,
    )]
    pub async fn get_campaign(
        &self,
        auth: JwtAuth,
        campaign_id: Path<Uuid>,
    ) -> poem::Result<Json<CampaignDto>> {
        let business_id = self.state.business_for(auth).await?;
        let campaign = self
            .state
            .get_campaign_usecase
            .execute(campaign_id.0, business_id)
            .await
            .map_err(domain_error)?;

        Ok(Json(map_campaign(&campaign)))
    }

    #[oai(
        path = "/campaigns/:campaign_id/messages",
        method = "get",
        tag = EndpointsTags::Campaigns,
    )]
    pub async fn list_campaign_messages(
        &self,
        auth: JwtAuth,
        campaign_id: Path<Uuid>,
    ) -> poem::Result<Json<Vec<CampaignMessageDto>>> {
        let business_id = self.state.business_for(auth).await?;
        let messages = self
            .state
            .get_campaign_usecase
            .messages(campaign_id.0, business_id)
            .await
            .map_err(domain_error)?;

        Ok(Json(messages.iter().map(map_message).collect()))
    }
}
