pub mod auth;
pub use auth::AuthService;
pub mod client_service;
pub use client_service::ClientService;
pub mod visit_service;
pub use visit_service::VisitService;
pub mod metrics_service;
pub use metrics_service::MetricsService;
