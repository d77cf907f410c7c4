use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` picks the filter (default
/// `info`), `LOG_FORMAT=json` switches to one JSON object per line.
///
/// The stdio tool server passes `to_stderr` so stdout carries only protocol.
pub fn init_tracing(to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match (json, to_stderr) {
        (true, true) => builder.json().with_writer(std::io::stderr).init(),
        (true, false) => builder.json().init(),
        (false, true) => builder.with_writer(std::io::stderr).init(),
        (false, false) => builder.init(),
    }
}
