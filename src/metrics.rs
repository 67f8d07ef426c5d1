//! Prometheus metrics & middleware helper.

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Global request-metrics middleware, exposed at `/metrics`.
pub static METRICS: Lazy<PrometheusMetrics> = Lazy::new(|| {
    PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics") // exposed URL
        .build()
        .expect("metrics builder")
});

/// Domain counters live in their own registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static MEMBERSHIP_INTENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("membership_intents_total", "Membership intents by outcome"),
        &["action", "result"],
    )
    .expect("membership counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("register membership counter");
    counter
});

/// Count one intent. `result` is `ok`, an error tag, or `failed`.
pub fn record_intent(action: &str, result: &str) {
    MEMBERSHIP_INTENTS
        .with_label_values(&[action, result])
        .inc();
}

/// Text exposition of [`REGISTRY`].
pub fn render() -> anyhow::Result<String> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
