use std::sync::Arc;

use poem::http::StatusCode;
use poem_openapi::Tags;
use tracing::error;
use uuid::Uuid;

use crate::application::handlers::campaign_dispatcher::CampaignDispatcher;
use crate::application::services::jwt::JwtServiceConfig;
use crate::application::usecases::{
    get_campaign::GetCampaignUseCase, launch_campaign::LaunchCampaignUseCase,
    record_delivery::RecordDeliveryUseCase,
};
use crate::domain::{errors::DomainError, repositories::BusinessRepository};
use crate::presentation::http::security::JwtAuth;

#[derive(Clone)]
pub struct ApiState {
    pub launch_campaign_usecase: Arc<LaunchCampaignUseCase>,
    pub get_campaign_usecase: Arc<GetCampaignUseCase>,
    pub record_delivery_usecase: Arc<RecordDeliveryUseCase>,
    pub dispatcher: Arc<CampaignDispatcher>,
    pub business_repo: Arc<dyn BusinessRepository>,
    pub jwt_config: JwtServiceConfig,
    pub webhook_token: Option<String>,
}

impl ApiState {
    /// Resolves the caller's business from the token subject.
    pub async fn business_for(&self, auth: JwtAuth) -> poem::Result<Uuid> {
        let user = auth.into_user(&self.jwt_config)?;
        let business = self
            .business_repo
            .find_by_owner(&user.user_id)
            .await
            .map_err(|err| domain_error(DomainError::Other(err)))?;

        business.map(|b| b.id).ok_or_else(|| {
            poem::Error::from_string("no business for this account", StatusCode::FORBIDDEN)
        })
    }
}

pub fn domain_error(err: DomainError) -> poem::Error {
    let status = match &err {
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Other(inner) => {
            error!(error = %inner, "Request failed");
            return poem::Error::from_string(
                "internal server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };
    poem::Error::from_string(err.to_string(), status)
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Campaigns,
}
