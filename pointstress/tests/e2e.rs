use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use pointstress::client::ServiceClient;
use pointstress::config::Config;
use pointstress::driver::Driver;
use pointstress::report::Report;
use pointstress::wave::{self, WaveSpec};
use pointstress_test::server::{RESET_TOKEN, StubServer};

fn test_config(remote: String, report: PathBuf) -> Config {
    Config {
        remote,
        report,
        participants: ["user1".to_owned(), "user2".to_owned()],
        reset_token: RESET_TOKEN.to_owned(),
        unit: 3,
        waves_per_cycle: 2,
        cycles: 2,
        max_attempts: 10,
        max_point: 1_000_000,
    }
}

fn report_in(dir: &tempfile::TempDir) -> (PathBuf, Report) {
    let path = dir.path().join("report.log");
    let report = Report::open(&path).unwrap();
    (path, report)
}

fn measurement_lines(path: &Path) -> Vec<String> {
    let contents = std::fs::read_to_string(path).unwrap();
    contents
        .lines()
        .filter(|line| line.contains("measure: count:"))
        .map(str::to_owned)
        .collect()
}

async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let start = Instant::now();
    while !condition() {
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn full_run_counts_and_measures() {
    pointstress_test::tracing::init();
    let server = StubServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (path, report) = report_in(&dir);

    let config = test_config(server.url(), path.clone());
    let client = ServiceClient::new(&config.remote);
    Driver::new(config, client, report).run().await.unwrap();

    // 2 cycles of 2 waves of 3 transfers each, no failures.
    assert_eq!(server.state.send_calls.load(Ordering::SeqCst), 12);
    assert_eq!(server.state.participant_count(), 2);

    let measurements = measurement_lines(&path);
    assert_eq!(measurements.len(), 2);
    assert!(measurements[0].contains("count: 6,"));
    assert!(measurements[1].contains("count: 12,"));

    // Transfers only move points between the two participants.
    let total = server.state.balance("user1").unwrap() + server.state.balance("user2").unwrap();
    assert_eq!(total, 2_000_000);
}

#[tokio::test]
async fn retries_are_invisible_in_the_completion_count() {
    pointstress_test::tracing::init();
    let server = StubServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (_path, report) = report_in(&dir);
    let report = Arc::new(report);

    let client = ServiceClient::new(&server.url());
    client.create_participant("user1").await.unwrap();
    client.create_participant("user2").await.unwrap();

    // Each of the first 3 send calls answers 500; retries absorb them.
    server.state.fail_first_sends(3);

    let spec = WaveSpec {
        participants: ["user1".to_owned(), "user2".to_owned()],
        max_point: 1_000_000,
        max_attempts: 10,
    };
    let transport = Arc::new(client);
    let completed = wave::run_wave(&transport, &report, &spec, 3).await.unwrap();

    assert_eq!(completed, 3);
    // 3 failed attempts plus 3 eventual successes.
    assert_eq!(server.state.send_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn retry_exhaustion_ends_the_run() {
    pointstress_test::tracing::init();
    let server = StubServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (path, report) = report_in(&dir);

    // The service never recovers, so every worker burns its ceiling.
    server.state.fail_first_sends(u64::MAX);

    let mut config = test_config(server.url(), path.clone());
    config.max_attempts = 3;

    let client = ServiceClient::new(&config.remote);
    let outcome = Driver::new(config, client, report).run().await;

    assert!(outcome.is_err());
    // The first wave's 3 workers each make their full 3 attempts; no
    // further wave starts.
    assert_eq!(server.state.send_calls.load(Ordering::SeqCst), 9);
    assert!(measurement_lines(&path).is_empty());

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(
        contents
            .lines()
            .any(|line| line.contains("fatal: transfer failed after 3 attempts")),
        "missing fatal line in: {contents}"
    );
}

#[tokio::test]
async fn invalid_config_is_rejected_before_setup() {
    pointstress_test::tracing::init();
    let server = StubServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (path, report) = report_in(&dir);

    let mut config = test_config(server.url(), path);
    config.max_point = 0;

    let client = ServiceClient::new(&config.remote);
    let outcome = Driver::new(config, client, report).run().await;

    assert!(outcome.is_err());
    // The run ends before reset or provisioning ever reach the
    // service.
    assert_eq!(server.state.send_calls.load(Ordering::SeqCst), 0);
    assert_eq!(server.state.participant_count(), 0);
}

#[tokio::test]
async fn provisioning_failure_aborts_before_any_load() {
    pointstress_test::tracing::init();
    let server = StubServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (path, report) = report_in(&dir);

    server.state.reject_provisioning();

    let config = test_config(server.url(), path.clone());
    let client = ServiceClient::new(&config.remote);
    let outcome = Driver::new(config, client, report).run().await;

    assert!(outcome.is_err());
    assert_eq!(server.state.send_calls.load(Ordering::SeqCst), 0);

    let contents = std::fs::read_to_string(&path).unwrap();
    let fatal_lines = contents
        .lines()
        .filter(|line| line.contains("failed to prepare user"))
        .count();
    assert_eq!(fatal_lines, 1);
    assert!(measurement_lines(&path).is_empty());
}

#[tokio::test]
async fn probe_transport_errors_do_not_stop_the_run() {
    pointstress_test::tracing::init();
    let server = StubServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (path, report) = report_in(&dir);

    server.state.sever_state_probes();

    let config = test_config(server.url(), path.clone());
    let client = ServiceClient::new(&config.remote);
    Driver::new(config, client, report).run().await.unwrap();

    // Every wave of every cycle still ran to completion.
    assert_eq!(server.state.send_calls.load(Ordering::SeqCst), 12);
    assert!(measurement_lines(&path).is_empty());

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents
            .lines()
            .filter(|line| line.contains("failed to measure"))
            .count(),
        2
    );
}

#[tokio::test]
async fn degraded_probe_status_is_recorded_as_is() {
    pointstress_test::tracing::init();
    let server = StubServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (path, report) = report_in(&dir);

    server.state.fail_state_probes();

    let config = test_config(server.url(), path.clone());
    let client = ServiceClient::new(&config.remote);
    Driver::new(config, client, report).run().await.unwrap();

    // A probe that answers with an error status is still a sample.
    let measurements = measurement_lines(&path);
    assert_eq!(measurements.len(), 2);
    assert!(measurements[0].contains("status: 500"));
}

#[tokio::test]
async fn sampling_waits_for_the_slowest_worker() {
    pointstress_test::tracing::init();
    let server = StubServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (path, report) = report_in(&dir);

    server.state.hold_next_sends(1);

    let mut config = test_config(server.url(), path.clone());
    config.unit = 2;
    config.waves_per_cycle = 1;
    config.cycles = 1;

    let client = ServiceClient::new(&config.remote);
    let state = Arc::clone(&server.state);
    let run = tokio::spawn(Driver::new(config, client, report).run());

    // Both workers have reached the service, one of them is parked.
    wait_until("both sends to arrive", || {
        state.send_calls.load(Ordering::SeqCst) == 2
    })
    .await;
    assert_eq!(state.parked_sends(), 1);

    // The wave cannot complete, so the sampler must not have run.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.history_calls.load(Ordering::SeqCst), 0);
    assert_eq!(state.state_calls.load(Ordering::SeqCst), 0);

    server.state.release_sends(1);
    run.await.unwrap().unwrap();

    assert_eq!(state.history_calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.state_calls.load(Ordering::SeqCst), 1);
    assert_eq!(measurement_lines(&path).len(), 1);
}
