use tracing_subscriber::EnvFilter;

/// Default filter directives for the given verbosity.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "debug,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"
    } else {
        "info,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"
    }
}

/// Install the global fmt subscriber on stderr. `RUST_LOG` wins when set.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
