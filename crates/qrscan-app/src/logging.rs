use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr so stdout carries results.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(atty::is(atty::Stream::Stderr))
            .with_writer(std::io::stderr)
            .init();
    }
}
