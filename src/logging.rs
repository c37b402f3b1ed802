use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr, filtered by `RUST_LOG` (warnings and errors only by default), so that stdout
/// carries nothing but query results.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}
