pub mod health;
pub mod auth;
pub mod users;
pub mod clients;
pub mod visits;
pub mod metrics;
