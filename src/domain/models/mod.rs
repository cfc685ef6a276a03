pub mod business;
pub mod campaign;
pub mod channel;
pub mod customer;
pub mod message;

pub use business::{Business, RewardType};
pub use campaign::{
    CalculatorTier, Campaign, CampaignSnapshot, CampaignStatus, FaqItem, StoryBlock,
};
pub use channel::Channel;
pub use customer::{Customer, CustomerStatus};
pub use message::{CampaignMessage, MessageMetadata, MessageStatus, NewCampaignMessage};
