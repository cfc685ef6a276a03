use std::sync::Arc;

use poem::{
    handler,
    http::StatusCode,
    web::{Data, Form, Json, Query},
};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::presentation::http::{
    endpoints::root::{ApiState, domain_error},
    requests::{ResendWebhook, TwilioStatusCallback, WebhookQuery},
};

const TWILIO_DELIVERED: &str = "delivered";
const RESEND_DELIVERED: &str = "email.delivered";

fn token_matches(expected: Option<&str>, given: Option<&str>) -> bool {
    match (expected, given) {
        (Some(expected), Some(given)) => expected.as_bytes().ct_eq(given.as_bytes()).into(),
        _ => false,
    }
}

fn check_token(state: &ApiState, query: &WebhookQuery) -> poem::Result<()> {
    if token_matches(state.webhook_token.as_deref(), query.token.as_deref()) {
        Ok(())
    } else {
        Err(poem::Error::from_status(StatusCode::UNAUTHORIZED))
    }
}

/// Twilio posts every status transition; only final delivery is recorded.
#[handler]
pub async fn twilio_status(
    state: Data<&Arc<ApiState>>,
    Query(query): Query<WebhookQuery>,
    Form(callback): Form<TwilioStatusCallback>,
) -> poem::Result<StatusCode> {
    check_token(&state, &query)?;

    if callback.message_status != TWILIO_DELIVERED {
        debug!(
            sid = %callback.message_sid,
            status = %callback.message_status,
            "Ignoring Twilio status"
        );
        return Ok(StatusCode::NO_CONTENT);
    }

    state
        .record_delivery_usecase
        .execute(&callback.message_sid, &callback.message_status)
        .await
        .map_err(domain_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[handler]
pub async fn resend_event(
    state: Data<&Arc<ApiState>>,
    Query(query): Query<WebhookQuery>,
    Json(event): Json<ResendWebhook>,
) -> poem::Result<StatusCode> {
    check_token(&state, &query)?;

    if event.event_type != RESEND_DELIVERED {
        debug!(event_type = %event.event_type, "Ignoring Resend event");
        return Ok(StatusCode::NO_CONTENT);
    }

    state
        .record_delivery_usecase
        .execute(&event.data.email_id, &event.event_type)
        .await
        .map_err(domain_error)?;

    Ok(StatusCode::NO_CONTENT)
}
