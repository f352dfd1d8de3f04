use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "skillquest_progress=info";

/// Installs a stderr subscriber so that reports written to stdout stay clean.
/// `RUST_LOG` takes precedence over the default level.
pub fn init_logging(verbose: bool) {
    let directive = if verbose {
        "skillquest_progress=debug"
    } else {
        DEFAULT_DIRECTIVE
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
