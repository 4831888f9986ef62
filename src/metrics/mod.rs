use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref STORE_OPERATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("store_operations", "Committed store mutations and reads by operation"),
        &["op"]
    )
    .expect("metric can not be created");

    pub static ref UPDATES_PUBLISHED: IntCounter =
        IntCounter::new("updates_published", "Updates handed to the change bus")
            .expect("metric can not be created");

    pub static ref UPDATES_DELIVERED: IntCounter =
        IntCounter::new("updates_delivered", "Updates appended to subscription mailboxes")
            .expect("metric can not be created");

    pub static ref UPDATES_DROPPED: IntCounter = IntCounter::new(
        "updates_dropped",
        "Updates discarded by bounded mailboxes"
    )
    .expect("metric can not be created");

    pub static ref ACTIVE_SUBSCRIPTIONS: IntGauge =
        IntGauge::new("active_subscriptions", "Subscriptions in the Active state")
            .expect("metric can not be created");

    pub static ref PUBLISH_FANOUT: Histogram = Histogram::with_opts(
        HistogramOpts::new("publish_fanout", "Number of mailboxes selected per publish")
            .buckets(exponential_buckets(1.0, 2.0, 12).expect("valid buckets"))
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(STORE_OPERATIONS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(UPDATES_PUBLISHED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(UPDATES_DELIVERED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(UPDATES_DROPPED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(ACTIVE_SUBSCRIPTIONS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(PUBLISH_FANOUT.clone()))
        .expect("collector can be registered");
}

/// Serves `/metrics` until the shutdown signal fires.
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    register_custom_metrics(&REGISTRY);

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    let (addr, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    info!(%addr, "Prometheus exporter listening");
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(encode_metrics(&REGISTRY))
}

/// Renders a registry in the Prometheus text exposition format.
pub fn encode_metrics(registry: &Registry) -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!("could not encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
