use std::env::var;

use dotenvy::dotenv;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("An error occured while getting {0} env param")]
    Missing(&'static str),
    #[error("An error occured while parsing {0} env param")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct ResendSettings {
    pub api_key: String,
    pub from_email: String,
    pub from_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub site_url: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub webhook_token: Option<String>,
    pub resend: Option<ResendSettings>,
    pub twilio: Option<TwilioSettings>,
}

impl Config {
    pub fn try_parse() -> Result<Config, ConfigError> {
        let _ = dotenv();

        Ok(Config {
            port: required("PORT")?
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            scheme: required("SCHEME")?,
            host: required("HOST")?,
            site_url: required("SITE_URL")?,
            database_url: optional("DATABASE_URL"),
            jwt_secret: required("JWT_SECRET")?,
            jwt_audience: optional("JWT_AUDIENCE").unwrap_or_else(|| "authenticated".to_string()),
            webhook_token: optional("WEBHOOK_TOKEN"),
            resend: match (optional("RESEND_API_KEY"), optional("RESEND_FROM_EMAIL")) {
                (Some(api_key), Some(from_email)) => Some(ResendSettings {
                    api_key,
                    from_email,
                    from_name: optional("RESEND_FROM_NAME"),
                }),
                _ => None,
            },
            twilio: match (
                optional("TWILIO_ACCOUNT_SID"),
                optional("TWILIO_AUTH_TOKEN"),
                optional("TWILIO_FROM_NUMBER"),
            ) {
                (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioSettings {
                    account_sid,
                    auth_token,
                    from_number,
                }),
                _ => None,
            },
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
