use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::models::Channel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSms {
    pub body: String,
    pub from: String,
    pub to: String,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Returns the provider-assigned message id.
    async fn send_email(&self, email: &OutboundEmail) -> anyhow::Result<String>;
}

#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Returns the provider-assigned message sid.
    async fn send_sms(&self, sms: &OutboundSms) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct EmailChannel {
    pub client: Arc<dyn EmailProvider>,
    pub from_email: String,
    pub from_name: Option<String>,
}

impl EmailChannel {
    /// `"Name <address>"`, preferring a per-message sender name.
    pub fn from_header(&self, sender_name: Option<&str>) -> String {
        let name = sender_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or(self.from_name.as_deref());
        match name {
            Some(name) => format!("{} <{}>", name.replace(['<', '>', '"'], ""), self.from_email),
            None => self.from_email.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SmsChannel {
    pub client: Arc<dyn SmsProvider>,
    pub from_number: String,
}

/// Provider handles resolved once at start-up. A missing handle means the
/// channel's credentials were not configured.
#[derive(Clone, Default)]
pub struct ProviderConfig {
    pub email: Option<EmailChannel>,
    pub sms: Option<SmsChannel>,
}

impl ProviderConfig {
    pub fn is_configured(&self, channel: Channel) -> bool {
        match channel {
            Channel::Email => self.email.is_some(),
            Channel::Sms => self.sms.is_some(),
        }
    }
}
