use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    application::services::{
        personalizer::personalize,
        tracking::{UtmParams, build_tracking_urls},
    },
    domain::{
        models::{Channel, Customer, MessageMetadata, NewCampaignMessage},
        value_objects::PhoneNumber,
    },
};

#[derive(Debug, Clone)]
pub struct CampaignRef {
    pub id: Uuid,
    pub name: String,
    pub channel: Channel,
}

#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub referral_code: Option<String>,
}

impl From<&Customer> for Recipient {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
            referral_code: customer.referral_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmailOverrides {
    pub subject: Option<String>,
    pub preheader: Option<String>,
    pub from_name: Option<String>,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchRequest<'a> {
    pub campaign: &'a CampaignRef,
    pub business_id: Uuid,
    pub site_url: &'a str,
    pub template: &'a str,
    pub recipients: &'a [Recipient],
    pub scheduled_at: DateTime<Utc>,
    pub utm_source: Option<String>,
    pub utm_content: Option<String>,
    pub project_slug: Option<String>,
    pub email: EmailOverrides,
}

#[derive(Debug, Clone, Default)]
pub struct CampaignMessageBatch {
    pub messages: Vec<NewCampaignMessage>,
    pub skipped: usize,
}

/// Builds one message per reachable recipient. Output depends only on the
/// request, so rebuilding the same batch yields identical bodies and URLs.
pub fn build_campaign_messages(request: &BatchRequest<'_>) -> CampaignMessageBatch {
    let campaign = request.campaign;
    let utm = UtmParams {
        campaign: campaign.id.to_string(),
        medium: campaign.channel.as_str().to_string(),
        source: request.utm_source.clone(),
        content: request.utm_content.clone(),
    }
    .to_query_string();

    let mut batch = CampaignMessageBatch::default();

    for recipient in request.recipients {
        let Some(referral_code) = non_blank(recipient.referral_code.as_deref()) else {
            batch.skipped += 1;
            continue;
        };

        let to_address = match campaign.channel {
            Channel::Sms => recipient
                .phone
                .as_deref()
                .and_then(PhoneNumber::parse)
                .map(|phone| phone.to_string()),
            Channel::Email => non_blank(recipient.email.as_deref()).map(str::to_string),
        };
        let Some(to_address) = to_address else {
            batch.skipped += 1;
            continue;
        };

        let urls = build_tracking_urls(
            request.site_url,
            referral_code,
            &utm,
            request.project_slug.as_deref(),
        );
        let name = non_blank(recipient.name.as_deref());
        let body = personalize(
            request.template,
            &urls.personal_referral_url,
            &urls.referral_landing_url,
            name,
        );

        let email = match campaign.channel {
            Channel::Email => request.email.clone(),
            Channel::Sms => EmailOverrides::default(),
        };

        let metadata = MessageMetadata {
            customer_name: name.map(str::to_string),
            referral_code: referral_code.to_string(),
            personal_referral_url: urls.personal_referral_url.clone(),
            referral_landing_url: urls.referral_landing_url,
            ambassador_portal_url: urls.ambassador_portal_url,
            campaign_name: campaign.name.clone(),
            email_subject: email.subject,
            email_preheader: email.preheader,
            email_from_name: email.from_name,
            email_reply_to: email.reply_to,
        };

        batch.messages.push(NewCampaignMessage {
            campaign_id: campaign.id,
            business_id: request.business_id,
            customer_id: recipient.id,
            channel: campaign.channel,
            to_address,
            body,
            referral_link: urls.personal_referral_url,
            metadata,
            scheduled_at: request.scheduled_at,
        });
    }

    batch
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
