// Tracing setup for the CLI. Log lines go to stderr so command output stays pipeable.
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default filter directive: `warn` everywhere, with our own crates raised to `debug`
/// when `verbose` is set.
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("warn,prodflow_client={level},prodflow={level}")
}

pub fn init_tracing(verbose: bool) {
    // Prefer RUST_LOG from env, otherwise use the verbosity-derived directive.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
