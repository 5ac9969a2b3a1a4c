mod common;

use child_process::{Command, LineSink, LocalLauncher, MemorySink, RelaySinks};
use common::eventually;
use futures_lite::future;
use std::sync::Arc;
use std::time::Duration;
use supervisor::{Control, LogRotation, RotatingFileSink, Supervisor};

fn sinks(log: &RotatingFileSink) -> (MemorySink, MemorySink, RelaySinks) {
    let stdout = MemorySink::new();
    let stderr = MemorySink::new();
    let sinks = RelaySinks {
        stdout: Arc::new(stdout.clone()),
        stderr: Arc::new(stderr.clone()),
        log: Arc::new(log.clone()) as Arc<dyn LineSink>,
    };
    (stdout, stderr, sinks)
}

#[smol_potat::test]
async fn test_exiting_child_is_relaunched_and_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("debug.log");
    let log = RotatingFileSink::open(&path, LogRotation::default()).unwrap();
    let (stdout, _stderr, relay) = sinks(&log);

    let supervisor = Supervisor::new(
        Command::shell("echo hello; sleep 0.1; exit 3"),
        LocalLauncher::new(relay),
        Duration::from_millis(100),
    );
    let (tx, rx) = async_channel::unbounded();

    let driver = async move {
        let relaunched = eventually(Duration::from_secs(10), || stdout.count("hello") >= 2).await;
        tx.send(Control::Terminate).await.unwrap();
        relaunched
    };

    let (result, relaunched) = future::zip(supervisor.run(rx), driver).await;
    let stats = result.unwrap();

    assert!(relaunched, "child was not relaunched after exiting");
    assert!(stats.launches >= 2);
    assert!(stats.exits >= 1);

    let logged = eventually(Duration::from_secs(2), || {
        std::fs::read_to_string(&path)
            .map(|contents| contents.lines().filter(|l| *l == "hello").count() >= 2)
            .unwrap_or(false)
    })
    .await;
    assert!(logged, "child output missing from the log file");
}

#[smol_potat::test]
async fn test_reload_replaces_long_running_child() {
    let dir = tempfile::tempdir().unwrap();
    let log = RotatingFileSink::open(dir.path().join("debug.log"), LogRotation::default()).unwrap();
    let (stdout, stderr, relay) = sinks(&log);

    let supervisor = Supervisor::new(
        Command::shell("echo started; echo oops >&2; exec sleep 30"),
        LocalLauncher::new(relay),
        Duration::from_millis(50),
    );
    let (tx, rx) = async_channel::unbounded();

    let driver = async move {
        assert!(eventually(Duration::from_secs(10), || stdout.count("started") == 1).await);
        tx.send(Control::Reload).await.unwrap();
        assert!(eventually(Duration::from_secs(10), || stdout.count("started") == 2).await);
        assert!(eventually(Duration::from_secs(10), || stderr.count("oops") >= 1).await);
        tx.send(Control::Terminate).await.unwrap();
    };

    let started = std::time::Instant::now();
    let (result, ()) = future::zip(supervisor.run(rx), driver).await;
    let stats = result.unwrap();

    assert_eq!(stats.launches, 2);
    assert_eq!(stats.kills, 2);
    assert_eq!(stats.exits, 0);
    assert!(started.elapsed() < Duration::from_secs(20), "kill did not stop sleep");
}

#[smol_potat::test]
async fn test_missing_binary_stops_supervision() {
    let dir = tempfile::tempdir().unwrap();
    let log = RotatingFileSink::open(dir.path().join("debug.log"), LogRotation::default()).unwrap();
    let (_stdout, _stderr, relay) = sinks(&log);

    let supervisor = Supervisor::new(
        Command::new("/nonexistent/definitely-not-a-binary"),
        LocalLauncher::new(relay),
        Duration::from_millis(50),
    );
    let (_tx, rx) = async_channel::unbounded::<Control>();

    let err = supervisor.run(rx).await.unwrap_err();
    assert!(matches!(err, supervisor::SupervisorError::Launch(_)));
}
