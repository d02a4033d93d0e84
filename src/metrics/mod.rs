use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::warn;


lazy_static! {
    pub static ref CONFIG_EVENTS_FIRED: IntCounterVec = IntCounterVec::new(
        Opts::new("config_events_fired", "Change events fired by tree mutations"),
        &["kind"]
    )
    .expect("Should succeed to create metric");

    pub static ref WATCH_EVENTS_DROPPED: IntCounter = IntCounter::new(
        "watch_events_dropped",
        "Change events dropped because a watch stream queue was full"
    )
    .expect("Should succeed to create metric");

    pub static ref INCREMENTAL_PARSE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "incremental_parse_failures",
            "Field parse failures swallowed while re-parsing a live entity"
        ),
        &["entity"]
    )
    .expect("Should succeed to create metric");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_custom_metrics(&registry);
        registry
    };
}

pub fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(CONFIG_EVENTS_FIRED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_EVENTS_DROPPED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(INCREMENTAL_PARSE_FAILURES.clone()))
        .expect("collector can be registered");
}

/// Renders the crate registry in the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        warn!("could not encode custom metrics: {}", e);
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            warn!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
