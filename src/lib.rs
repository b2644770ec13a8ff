pub mod api;
pub mod auth;
pub mod config;
pub mod core_state;
pub mod db;
pub mod error;
pub mod follow_up;
pub mod intake;
pub mod models;
pub mod patients;
pub mod reporting;
pub mod risk;
pub mod simulation;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
