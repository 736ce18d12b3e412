pub mod config;
pub mod controller;
pub mod crd;
pub mod manifests;
pub mod runtime;
pub mod settings;
pub mod web;

use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber; `RUST_LOG` adds to `default_directive`.
pub fn init_tracing(default_directive: &str) {
    let default = default_directive
        .parse()
        .unwrap_or_else(|_| LevelFilter::INFO.into());
    let filter = EnvFilter::builder()
        .with_env_var("RUST_LOG")
        .from_env_lossy()
        .add_directive(default);

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();
}
