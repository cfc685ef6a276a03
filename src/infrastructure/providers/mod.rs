pub mod resend;
pub mod twilio;

use tracing::{info, warn};

use crate::{
    application::services::providers::{EmailChannel, ProviderConfig, SmsChannel},
    config::Config,
};

use self::{resend::ResendClient, twilio::TwilioClient};

/// Resolves provider credentials into client handles. Channels without a
/// complete credential set stay unconfigured.
pub fn build_provider_config(config: &Config) -> anyhow::Result<ProviderConfig> {
    let email = match &config.resend {
        Some(settings) => {
            info!(from = %settings.from_email, "Resend email provider configured");
            Some(EmailChannel {
                client: ResendClient::new(settings.api_key.clone())?,
                from_email: settings.from_email.clone(),
                from_name: settings.from_name.clone(),
            })
        }
        None => {
            warn!("Resend credentials missing, email campaigns will fail to send");
            None
        }
    };

    let sms = match &config.twilio {
        Some(settings) => {
            info!(from = %settings.from_number, "Twilio SMS provider configured");
            Some(SmsChannel {
                client: TwilioClient::new(
                    settings.account_sid.clone(),
                    settings.auth_token.clone(),
                )?,
                from_number: settings.from_number.clone(),
            })
        }
        None => {
            warn!("Twilio credentials missing, SMS campaigns will fail to send");
            None
        }
    };

    Ok(ProviderConfig { email, sms })
}

/// Serves `app` on an ephemeral local port and returns its base URL.
#[cfg(test)]
pub(crate) async fn serve_locally<E>(app: E) -> String
where
    E: poem::IntoEndpoint + Send + 'static,
    E::Endpoint: 'static,
{
    use poem::listener::{Acceptor, Listener, TcpListener};

    let acceptor = TcpListener::bind("127.0.0.1:0")
        .into_acceptor()
        .await
        .unwrap();
    let port = acceptor.local_addr()[0].0.as_socket_addr().unwrap().port();
    tokio::spawn(poem::Server::new_with_acceptor(acceptor).run(app));
    format!("http://127.0.0.1:{port}")
}
