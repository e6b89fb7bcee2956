//! HTTP middleware components.

pub mod editor_auth;
pub mod request_metrics;

pub use editor_auth::identify_caller;
pub use request_metrics::track_requests;
