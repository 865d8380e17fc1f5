pub mod error;
pub mod mapper;
pub mod profile;
pub mod settings;

pub use error::SliceMapError;

/// Install the global `tracing` subscriber: `info` unless `RUST_LOG` says
/// otherwise, written to stderr so rendered output stays clean.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
