use poem_openapi::Enum;

use crate::domain::models::{CampaignStatus, Channel, MessageStatus};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChannelKind {
    #[oai(rename = "sms")]
    Sms,
    #[oai(rename = "email")]
    Email,
}

impl From<ChannelKind> for Channel {
    fn from(value: ChannelKind) -> Self {
        match value {
            ChannelKind::Sms => Channel::Sms,
            ChannelKind::Email => Channel::Email,
        }
    }
}

impl From<Channel> for ChannelKind {
    fn from(value: Channel) -> Self {
        match value {
            Channel::Sms => ChannelKind::Sms,
            Channel::Email => ChannelKind::Email,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum CampaignStatusDto {
    #[oai(rename = "draft")]
    Draft,
    #[oai(rename = "sending")]
    Sending,
    #[oai(rename = "completed")]
    Completed,
    #[oai(rename = "partial")]
    Partial,
}

impl From<CampaignStatus> for CampaignStatusDto {
    fn from(value: CampaignStatus) -> Self {
        match value {
            CampaignStatus::Draft => CampaignStatusDto::Draft,
            CampaignStatus::Sending => CampaignStatusDto::Sending,
            CampaignStatus::Completed => CampaignStatusDto::Completed,
            CampaignStatus::Partial => CampaignStatusDto::Partial,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum MessageStatusDto {
    #[oai(rename = "queued")]
    Queued,
    #[oai(rename = "sending")]
    Sending,
    #[oai(rename = "sent")]
    Sent,
    #[oai(rename = "failed")]
    Failed,
}

impl From<MessageStatus> for MessageStatusDto {
    fn from(value: MessageStatus) -> Self {
        match value {
            MessageStatus::Queued => MessageStatusDto::Queued,
            MessageStatus::Sending => MessageStatusDto::Sending,
            MessageStatus::Sent => MessageStatusDto::Sent,
            MessageStatus::Failed => MessageStatusDto::Failed,
        }
    }
}
