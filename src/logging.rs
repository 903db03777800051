use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global tracing subscriber.
///
/// - **Level**: `RUST_LOG` when set, otherwise `LOG_LEVEL` (default `info`)
///   for this crate with noisy dependencies held at `warn`
/// - **Format**: `LOG_FORMAT=json` for one JSON object per line including the
///   current request span, anything else for compact console output
pub fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{name}={level},sales_web={level},sales_auth={level},hyper=warn,sqlx=warn",
                name = env!("CARGO_CRATE_NAME"),
                level = log_level,
            ))
        })
    };

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_filter(filter())
    });

    let console_layer = (!json).then(|| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(filter())
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(console_layer)
        .init();
}
