use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global log subscriber. The filter comes from `RUST_LOG` and
/// defaults to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
