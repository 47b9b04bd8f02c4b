//! Echo side: callback delivery and one-way latency alerting.

use std::sync::Arc;

use pubsub_latency_monitor::alert::Notifier;
use pubsub_latency_monitor::config::RelayConfig;
use pubsub_latency_monitor::probe::ProbeMessage;
use pubsub_latency_monitor::transport::Relay;

mod common;

use common::{probe_config, start_recording_backend, RecordingSink};

const PUBLISHED: i64 = 1_700_000_000_000;

fn relay(callback_url: Option<String>, alert_on_latency: bool, sink: &Arc<RecordingSink>) -> Relay {
    Relay::new(
        common::http_client(),
        &RelayConfig {
            callback_url,
            alert_on_latency,
        },
        &probe_config(10.0, 20),
        Notifier::new(sink.clone()),
    )
}

#[tokio::test]
async fn test_slow_delivery_alerts_and_still_calls_back() {
    let (addr, recorded) = start_recording_backend(200).await;
    let sink = Arc::new(RecordingSink::default());
    let relay = relay(Some(format!("http://{}/callback", addr)), true, &sink);

    let callback = relay
        .echo_at(&ProbeMessage { timestamp: PUBLISHED, seq: Some(9) }, PUBLISHED + 15_000)
        .await;
    assert_eq!(callback.latency_seconds, 15.0);

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].subject, "High delivery latency detected");
    assert!(alerts[0].body.contains("15.00 seconds"));
    assert!(alerts[0].body.contains(&PUBLISHED.to_string()));

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line().starts_with("POST /callback"));
    let body = requests[0].json();
    assert_eq!(body["timestamp"], PUBLISHED);
    assert_eq!(body["seq"], 9);
    assert_eq!(body["received"], PUBLISHED + 15_000);
    assert_eq!(body["latency_seconds"], 15.0);
}

#[tokio::test]
async fn test_delivery_at_threshold_does_not_alert() {
    let (addr, recorded) = start_recording_backend(200).await;
    let sink = Arc::new(RecordingSink::default());
    let relay = relay(Some(format!("http://{}/callback", addr)), true, &sink);

    relay
        .echo_at(&ProbeMessage { timestamp: PUBLISHED, seq: Some(1) }, PUBLISHED + 10_000)
        .await;

    assert_eq!(sink.count(), 0);
    assert_eq!(recorded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_latency_alert_can_be_disabled() {
    let (addr, recorded) = start_recording_backend(200).await;
    let sink = Arc::new(RecordingSink::default());
    let relay = relay(Some(format!("http://{}/callback", addr)), false, &sink);

    relay
        .echo_at(&ProbeMessage { timestamp: PUBLISHED, seq: Some(1) }, PUBLISHED + 60_000)
        .await;

    assert_eq!(sink.count(), 0);
    assert_eq!(recorded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_callback_url_still_judges_latency() {
    let sink = Arc::new(RecordingSink::default());
    let relay = relay(None, true, &sink);

    let callback = relay
        .echo_at(&ProbeMessage { timestamp: PUBLISHED, seq: None }, PUBLISHED + 11_000)
        .await;

    assert_eq!(callback.seq, None);
    assert_eq!(sink.count_subject("High delivery latency detected"), 1);
}

#[tokio::test]
async fn test_rejected_callback_is_not_fatal() {
    let (addr, recorded) = start_recording_backend(503).await;
    let sink = Arc::new(RecordingSink::default());
    let relay = relay(Some(format!("http://{}/callback", addr)), true, &sink);

    let callback = relay
        .echo_at(&ProbeMessage { timestamp: PUBLISHED, seq: Some(2) }, PUBLISHED + 1_000)
        .await;

    assert_eq!(callback.latency_seconds, 1.0);
    assert_eq!(recorded.lock().unwrap().len(), 1);
    assert_eq!(sink.count(), 0);
}
