use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "STRUCTVIZ_LOG";

const DEFAULT_FILTER: &str = "structviz=warn";

/// Installs the global subscriber. Logs go to stderr so stdout stays
/// reserved for JSON output.
///
/// `verbose` raises the crate's level to debug and overrides `STRUCTVIZ_LOG`.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("structviz=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
