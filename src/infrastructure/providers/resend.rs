use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::services::providers::{EmailProvider, OutboundEmail};

const RESEND_API_URL: &str = "https://api.resend.com";

pub struct ResendClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ResendClient {
    pub fn new(api_key: String) -> anyhow::Result<Arc<dyn EmailProvider>> {
        Self::with_base_url(api_key, RESEND_API_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> anyhow::Result<Arc<dyn EmailProvider>> {
        let http = Client::builder()
            .user_agent("referral-campaigns/resend")
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build resend client")?;
        Ok(Arc::new(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }) as Arc<dyn EmailProvider>)
    }
}

#[async_trait]
impl EmailProvider for ResendClient {
    async fn send_email(&self, email: &OutboundEmail) -> anyhow::Result<String> {
        let payload = ResendEmailRequest {
            from: &email.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("resend request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ResendError>(&body)
                .map(|err| err.message)
                .unwrap_or(body);
            anyhow::bail!("resend api returned {}: {}", status.as_u16(), message);
        }

        let sent: ResendEmailResponse = response
            .json()
            .await
            .context("failed to decode resend response")?;
        Ok(sent.id)
    }
}

#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ResendEmailResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ResendError {
    message: String,
}
