use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Crates whose events make up the dispatcher's own log
const DISPATCH_TARGETS: &[&str] = &["deid_dispatch", "deid_dispatch_core", "deid_dispatch_gcp"];

pub const DEFAULT_LOG_FILTER: &str =
    "deid_dispatch=info,deid_dispatch_core=info,deid_dispatch_gcp=info,reqwest=warn";

/// Builds a filter with `level` for the dispatcher crates and `http_level`
/// for the HTTP client stack used by the storage and pipelines adapters.
pub fn dispatch_filter(level: &str, http_level: &str) -> String {
    let mut directives: Vec<String> = DISPATCH_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    directives.push(format!("reqwest={http_level}"));
    directives.push(format!("hyper_util={http_level}"));
    directives.join(",")
}

pub fn init() {
    init_with_default(DEFAULT_LOG_FILTER);
}

/// `RUST_LOG` wins over `default_filter` when set
pub fn init_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .init();
}

/// Debug output for the dispatcher plus request-level logs from the HTTP client
pub fn init_verbose() {
    init_with_default(&dispatch_filter("debug", "debug"));
}
