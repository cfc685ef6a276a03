pub mod campaigns;
pub mod health;
pub mod root;
pub mod webhooks;
