use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Logs to stderr. The level comes from RUST_LOG and defaults to info, e.g.
/// `RUST_LOG=teams_config_extension=debug` to see every store request along with its duration.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .try_init();

    if let Err(err) = result {
        eprintln!("[logging] could not initialize logging: {}", err);
    }
}
