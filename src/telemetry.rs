use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with an env-based filter and bridge `log` records.
///
/// - Reads `RUST_LOG` for level directives (e.g., "debug", "imgforensics_cli=trace").
///   Defaults to `warn` so normal runs only print results.
/// - Forwards `log` records (reqwest, hyper) to `tracing` via `LogTracer`.
/// - Writes to stderr; stdout carries the JSON output.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    let _ = LogTracer::init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
