pub mod batch_builder;
pub mod email_renderer;
pub mod jwt;
pub mod personalizer;
pub mod providers;
pub mod snapshot;
pub mod tracking;
