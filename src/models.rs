pub mod auth;
pub mod attachment;
pub mod client;
pub mod visit;
pub mod metrics;
