use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so stdout stays parseable in `--json` and `--plain` modes.
pub fn init(verbose: bool, directive: Option<&str>) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = directive
        .filter(|directive| !directive.trim().is_empty())
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("warn,beeper={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
