pub mod get_campaign;
pub mod launch_campaign;
pub mod record_delivery;
