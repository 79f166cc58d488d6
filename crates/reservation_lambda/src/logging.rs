use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Installs the JSON subscriber once per process; `RUST_LOG` overrides `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .try_init();
}

pub fn log_info(component: &str, event: &str, details: Value) {
    tracing::info!(component, event, details = %details);
}

pub fn log_warn(component: &str, event: &str, details: Value) {
    tracing::warn!(component, event, details = %details);
}

pub fn log_error(component: &str, event: &str, details: Value) {
    tracing::error!(component, event, details = %details);
}
