//! Reader-mode verification cycles against mock hardware.

mod common;

use common::{CARD, FakeRemote, Reply, Rig, reader_config};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use tapgate_controller::{ControllerError, ControllerState};
use tapgate_core::IndicatorOutcome;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_allowed_card_plays_one_success_cue() {
    let rig = Rig::new(reader_config(), FakeRemote::new().access(Reply::Yes))
        .booted()
        .await;
    rig.nfc.present_card(CARD);

    let event = rig.controller.verify_once().await.unwrap().unwrap();

    assert_eq!(event.card.to_hex(), "04a3b2c1");
    assert_eq!(event.outcome, IndicatorOutcome::Success);
    assert_eq!(rig.pins.high_count("ok"), 1);
    assert_eq!(rig.pins.high_count("fail"), 0);
    assert_eq!(rig.remote.calls(), vec!["entry:04a3b2c1"]);
    assert_eq!(rig.remote.calls_of("enroll"), 0);
    assert_eq!(rig.controller.state(), ControllerState::Idle);
}

#[rstest]
#[case::denied(Reply::No)]
#[case::unreachable(Reply::Unreachable)]
#[case::timeout(Reply::Slow(Duration::from_secs(5)))]
#[tokio::test(start_paused = true)]
async fn test_unconfirmed_access_plays_one_failure_cue(#[case] reply: Reply) {
    let rig = Rig::new(reader_config(), FakeRemote::new().access(reply))
        .booted()
        .await;
    rig.nfc.present_card(CARD);

    let event = rig.controller.verify_once().await.unwrap().unwrap();

    assert_eq!(event.outcome, IndicatorOutcome::Failure);
    assert_eq!(rig.pins.high_count("ok"), 0);
    // One failure cue flashes the fail LED twice.
    assert_eq!(rig.pins.high_count("fail"), 2);
    assert_eq!(rig.controller.state(), ControllerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_cue_waits_for_remote_answer() {
    let delay = Duration::from_secs(3);
    let rig = Rig::new(reader_config(), FakeRemote::new().access(Reply::Slow(delay)))
        .booted()
        .await;
    rig.nfc.present_card(CARD);

    let start = Instant::now();
    rig.controller.verify_once().await.unwrap();

    let first = rig.pins.events().into_iter().next().unwrap();
    assert!(first.at - start >= delay);
}

#[tokio::test(start_paused = true)]
async fn test_empty_window_returns_to_idle() {
    let rig = Rig::new(reader_config(), FakeRemote::new()).booted().await;

    let start = Instant::now();
    let event = rig.controller.verify_once().await.unwrap();

    assert!(event.is_none());
    assert_eq!(start.elapsed(), Duration::from_secs(1));
    assert!(rig.remote.calls().is_empty());
    assert!(rig.pins.events().is_empty());
    assert_eq!(rig.controller.state(), ControllerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_transient_read_error_keeps_window_open() {
    let rig = Rig::new(reader_config(), FakeRemote::new()).booted().await;
    rig.nfc.inject_error("bad frame checksum");
    rig.nfc.present_card(CARD);

    let event = rig.controller.verify_once().await.unwrap().unwrap();

    assert_eq!(event.card.to_hex(), "04a3b2c1");
    assert_eq!(rig.controller.reader_health().await.total_read_errors, 1);
}

#[tokio::test(start_paused = true)]
async fn test_verification_cycle_transitions() {
    let rig = Rig::new(reader_config(), FakeRemote::new()).booted().await;
    rig.nfc.present_card(CARD);
    rig.controller.verify_once().await.unwrap();

    let path: Vec<_> = rig
        .controller
        .history()
        .iter()
        .map(|t| (t.from, t.to))
        .collect();
    assert_eq!(
        path,
        vec![
            (ControllerState::Booting, ControllerState::Idle),
            (ControllerState::Idle, ControllerState::Verifying),
            (ControllerState::Verifying, ControllerState::Signaling),
            (ControllerState::Signaling, ControllerState::Idle),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_boot_retries_then_succeeds() {
    let rig = Rig::with_connector(reader_config(), FakeRemote::new(), |c| c.failing_opens(2));

    rig.controller.boot().await.unwrap();

    assert_eq!(rig.connector.open_count(), 3);
    assert_eq!(rig.controller.state(), ControllerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_boot_failure_faults_and_releases_outputs() {
    let rig = Rig::with_connector(reader_config(), FakeRemote::new(), |c| c.failing_opens(3));

    let err = rig.controller.boot().await.unwrap_err();

    assert!(matches!(err, ControllerError::PeripheralInit(_)));
    assert!(err.is_peripheral());
    assert_eq!(rig.connector.open_count(), 3);
    assert_eq!(rig.controller.state(), ControllerState::Faulted);
    assert!(rig.pins.all_low());

    // A faulted controller never starts another cycle.
    assert!(rig.controller.verify_once().await.is_err());
    assert!(rig.remote.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_loop_handles_consecutive_cards_and_stops() {
    let rig = Rig::new(reader_config(), FakeRemote::new()).booted().await;
    let shutdown = rig.controller.shutdown_token();
    let task = tokio::spawn(Arc::clone(&rig.controller).run());

    rig.nfc.present_card(CARD);
    tokio::time::sleep(Duration::from_secs(5)).await;
    rig.nfc.present_card([0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    tokio::time::sleep(Duration::from_secs(5)).await;

    shutdown.cancel();
    task.await.unwrap().unwrap();

    assert_eq!(
        rig.remote.calls(),
        vec!["entry:04a3b2c1", "entry:04112233445566"]
    );
    assert_eq!(rig.pins.high_count("ok"), 2);
    assert!(rig.pins.all_low());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_read_window() {
    let rig = Rig::new(reader_config(), FakeRemote::new()).booted().await;
    let task = tokio::spawn(Arc::clone(&rig.controller).run());
    tokio::time::sleep(Duration::from_millis(300)).await;

    let start = Instant::now();
    rig.controller.shutdown();
    task.await.unwrap().unwrap();

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(rig.remote.calls().is_empty());
}
