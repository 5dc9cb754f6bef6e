//! End-to-end pipeline tests against a mock backend.
//!
//! Each test wires a push-fed source, an in-memory config store, and a
//! wiremock server through the real scheduler, then drives cycles by
//! hand. Mock expectations double as delivery-count assertions: a
//! deduplicated event showing up twice fails the test at teardown.

use std::{
    sync::Arc,
    time::{Duration, UNIX_EPOCH},
};

use relay_core::{Clock, ConfigSnapshot, ConfigStore, Event, MemoryConfigStore, TestClock};
use relay_forward::{
    ChannelEventSource, ForwardClient, Forwarder, HealthMonitor, NoOpAlertSink, PayloadMode,
    RingSignal, Scheduler, SchedulerConfig,
};
use tokio::sync::mpsc;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

/// A fixed "now" well past the epoch, so staleness math has headroom.
const NOW_MILLIS: u64 = 1_700_000_000_000;

struct Pipeline {
    scheduler: Arc<Scheduler>,
    source: Arc<ChannelEventSource>,
    store: Arc<MemoryConfigStore>,
    clock: TestClock,
}

async fn pipeline(server: &MockServer) -> Pipeline {
    let clock = TestClock::with_start_time(UNIX_EPOCH + Duration::from_millis(NOW_MILLIS));
    let source = Arc::new(ChannelEventSource::new(Arc::new(clock.clone())));
    let store = Arc::new(MemoryConfigStore::new(ConfigSnapshot {
        backend_url: format!("{}/receive_data", server.uri()),
        secret: "s3cret".into(),
        notify_enabled: true,
        recipient_ids: "3".into(),
    }));

    let config_store: Arc<dyn ConfigStore> = Arc::clone(&store) as Arc<dyn ConfigStore>;
    let client = ForwardClient::with_defaults().expect("client");
    let forwarder = Forwarder::new(client.clone(), Arc::clone(&config_store), PayloadMode::Json);
    let health = HealthMonitor::new(client, config_store, Arc::new(NoOpAlertSink));

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&source) as Arc<dyn relay_forward::EventSource>,
        forwarder,
        health,
        Arc::new(clock.clone()),
        SchedulerConfig::default(),
    ));

    Pipeline { scheduler, source, store, clock }
}

fn now(clock: &TestClock) -> i64 {
    clock.now_millis()
}

#[tokio::test]
async fn delivered_event_is_not_resent_on_later_cycles() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/receive_data"))
        .and(matchers::body_string_contains("one-time code 42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let p = pipeline(&server).await;
    p.source.push(Event::message("101", now(&p.clock), "+15550100", "one-time code 42")).await;

    p.scheduler.run_poll_cycle().await;
    // The source still holds the event; dedup must suppress it now.
    p.scheduler.run_poll_cycle().await;
    p.scheduler.run_poll_cycle().await;
}

#[tokio::test]
async fn disabled_forwarding_sends_nothing_and_keeps_events_eligible() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let p = pipeline(&server).await;
    p.store
        .set(ConfigSnapshot { notify_enabled: false, ..p.store.snapshot().await })
        .await;
    p.source.push(Event::message("102", now(&p.clock), "+15550100", "hello")).await;

    // Disabled: no request, and the dedup key is released again.
    p.scheduler.run_poll_cycle().await;

    p.store
        .set(ConfigSnapshot { notify_enabled: true, ..p.store.snapshot().await })
        .await;
    p.scheduler.run_poll_cycle().await;
}

#[tokio::test]
async fn failed_batch_is_retried_on_the_next_cycle() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let p = pipeline(&server).await;
    p.source.push(Event::message("103", now(&p.clock), "+15550100", "retry me")).await;

    p.scheduler.run_poll_cycle().await;
    p.scheduler.run_poll_cycle().await;
    // Delivered on the second cycle; a third must not resend.
    p.scheduler.run_poll_cycle().await;
}

#[tokio::test]
async fn ring_trigger_and_poll_report_a_call_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::body_string_contains("+15550199"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let p = pipeline(&server).await;
    p.source.push(Event::call("201", now(&p.clock), "+15550199")).await;

    // Reactive path wins the race, then the periodic scan sees the same
    // call and must stay quiet.
    p.scheduler.handle_ring_signal().await;
    p.scheduler.run_poll_cycle().await;
}

#[tokio::test]
async fn malformed_records_do_not_block_the_rest_of_the_batch() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::body_string_contains("still delivered"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let p = pipeline(&server).await;
    p.source.push_malformed("cursor row with null body").await;
    p.source.push(Event::message("104", now(&p.clock), "+15550100", "still delivered")).await;

    p.scheduler.run_poll_cycle().await;
}

#[tokio::test]
async fn stale_events_are_never_forwarded() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let p = pipeline(&server).await;
    // Two hours old: outside the retention window, e.g. backlog replay
    // after a restart.
    let stale_ts = now(&p.clock) - 2 * 60 * 60 * 1_000;
    p.source.push(Event::message("105", stale_ts, "+15550100", "old backlog")).await;

    p.scheduler.run_poll_cycle().await;
}

#[tokio::test]
async fn partial_success_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(207))
        .expect(1)
        .mount(&server)
        .await;

    let p = pipeline(&server).await;
    p.source.push(Event::message("106", now(&p.clock), "+15550100", "partial")).await;

    p.scheduler.run_poll_cycle().await;
    p.scheduler.run_poll_cycle().await;
}

#[tokio::test]
async fn spawned_loops_deliver_and_shut_down_cleanly() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1..)
        .mount(&server)
        .await;
    Mock::given(matchers::method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let clock = TestClock::with_start_time(UNIX_EPOCH + Duration::from_millis(NOW_MILLIS));
    let source = Arc::new(ChannelEventSource::new(Arc::new(clock.clone())));
    let store = Arc::new(MemoryConfigStore::new(ConfigSnapshot {
        backend_url: format!("{}/receive_data", server.uri()),
        secret: "s3cret".into(),
        notify_enabled: true,
        recipient_ids: "3".into(),
    }));

    let config_store: Arc<dyn ConfigStore> = Arc::clone(&store) as Arc<dyn ConfigStore>;
    let client = ForwardClient::with_defaults().expect("client");
    let forwarder = Forwarder::new(client.clone(), Arc::clone(&config_store), PayloadMode::Json);
    let health = HealthMonitor::new(client, config_store, Arc::new(NoOpAlertSink));

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&source) as Arc<dyn relay_forward::EventSource>,
        forwarder,
        health,
        Arc::new(clock.clone()),
        SchedulerConfig {
            poll_interval: Duration::from_millis(20),
            health_interval: Duration::from_millis(50),
            ring_delay: Duration::from_millis(1),
        },
    ));

    source.push(Event::call("301", clock.now_millis(), "+15550100")).await;

    let (ring_tx, ring_rx) = mpsc::channel(4);
    let handle = scheduler.spawn(ring_rx);

    ring_tx.send(RingSignal).await.expect("scheduler is listening");
    tokio::time::sleep(Duration::from_millis(100)).await;

    handle.shutdown().await;
}
