mod anomalies;
mod audit;
mod health;
mod metrics;
mod workspaces;

pub use anomalies::{dashboard_anomalies_handler, detect_anomalies_handler};
pub use audit::audit_log_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use workspaces::{set_app_handler, set_tier_handler};
