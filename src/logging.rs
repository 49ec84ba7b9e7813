use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs a `tracing` subscriber filtered by `RUST_LOG`. Without
/// `RUST_LOG` nothing is installed and library events cost nothing.
///
/// ```text
/// RUST_LOG=kotoba=debug kotoba script.ktb
/// RUST_LOG=kotoba::interpreter=trace kotoba script.ktb
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}
