pub mod campaign_dispatcher;
