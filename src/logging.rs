use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr diagnostics subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this more than
/// once is harmless; later calls keep the first subscriber.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
