use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::application::services::providers::{OutboundSms, SmsProvider};

const TWILIO_API_URL: &str = "https://api.twilio.com";

pub struct TwilioClient {
    http: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
}

impl TwilioClient {
    pub fn new(account_sid: String, auth_token: String) -> anyhow::Result<Arc<dyn SmsProvider>> {
        Self::with_base_url(account_sid, auth_token, TWILIO_API_URL.to_string())
    }

    pub fn with_base_url(
        account_sid: String,
        auth_token: String,
        base_url: String,
    ) -> anyhow::Result<Arc<dyn SmsProvider>> {
        let http = Client::builder()
            .user_agent("referral-campaigns/twilio")
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build twilio client")?;

        Ok(Arc::new(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid,
            auth_token,
        }) as Arc<dyn SmsProvider>)
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

#[async_trait]
impl SmsProvider for TwilioClient {
    async fn send_sms(&self, sms: &OutboundSms) -> anyhow::Result<String> {
        let form = [
            ("To", sms.to.as_str()),
            ("From", sms.from.as_str()),
            ("Body", sms.body.as_str()),
        ];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .context("twilio request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioError>(&body)
                .map(|err| format!("{} (code {})", err.message, err.code.unwrap_or_default()))
                .unwrap_or(body);
            anyhow::bail!("twilio api returned {}: {}", status.as_u16(), message);
        }

        let sent: TwilioMessageResponse = response
            .json()
            .await
            .context("failed to decode twilio response")?;
        Ok(sent.sid)
    }
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioError {
    message: String,
    code: Option<i64>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use poem::{
        EndpointExt, IntoResponse, Request, Response, Route, handler,
        http::StatusCode,
        post,
        web::{Data, Form, Json},
    };
    use serde_json::json;

    use super::*;
    use crate::infrastructure::providers::serve_locally;

    type Seen = Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>;

    #[handler]
    fn messages(
        req: &Request,
        Form(form): Form<HashMap<String, String>>,
        seen: Data<&Seen>,
    ) -> Response {
        let auth = req.header("authorization").map(str::to_string);
        let invalid = form.get("To").map(String::as_str) == Some("+1555");
        seen.lock().unwrap().push((auth, form));

        if invalid {
            Json(json!({
                "code": 21211,
                "message": "The 'To' number +1555 is not a valid phone number.",
                "status": 400,
            }))
            .with_status(StatusCode::BAD_REQUEST)
            .into_response()
        } else {
            Json(json!({ "sid": "SM9c1e", "status": "queued" })).into_response()
        }
    }

    async fn client() -> (Arc<dyn SmsProvider>, Seen) {
        let seen = Seen::default();
        let app = Route::new()
            .at("/2010-04-01/Accounts/AC123/Messages.json", post(messages))
            .data(seen.clone());
        let base = serve_locally(app).await;
        let client =
            TwilioClient::with_base_url("AC123".to_string(), "secret".to_string(), base).unwrap();
        (client, seen)
    }

    fn sms(to: &str) -> OutboundSms {
        OutboundSms {
            body: "Hi Mia, share your link".to_string(),
            from: "+15550001111".to_string(),
            to: to.to_string(),
        }
    }

    #[tokio::test]
    async fn posts_form_and_returns_sid() {
        let (client, seen) = client().await;

        let sid = client.send_sms(&sms("+14155550100")).await.unwrap();

        assert_eq!(sid, "SM9c1e");
        let seen = seen.lock().unwrap();
        let (auth, form) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Basic QUMxMjM6c2VjcmV0"));
        assert_eq!(form["To"], "+14155550100");
        assert_eq!(form["From"], "+15550001111");
        assert_eq!(form["Body"], "Hi Mia, share your link");
    }

    #[tokio::test]
    async fn rejected_sms_carries_status_message_and_code() {
        let (client, _) = client().await;

        let err = client.send_sms(&sms("+1555")).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "twilio api returned 400: The 'To' number +1555 is not a valid phone number. (code 21211)"
        );
    }
}
