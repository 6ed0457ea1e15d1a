//! Enroller-mode behaviour: server-triggered enrollment, auto-capture and
//! the maintenance commands.

mod common;

use common::{CARD, FakeRemote, Reply, Rig, enroller_config};
use rstest::rstest;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tapgate_controller::ControllerState;
use tapgate_core::{EnrollmentTrigger, IndicatorOutcome};
use tapgate_hardware::mock::MockAudio;
use tapgate_network::CommandError;
use tokio::time::Instant;

fn server_rig(remote: FakeRemote) -> Rig {
    Rig::new(enroller_config(EnrollmentTrigger::Server), remote)
}

#[tokio::test(start_paused = true)]
async fn test_enrollment_success() {
    let rig = server_rig(FakeRemote::new()).booted().await;
    rig.nfc.present_card(CARD);

    let enrolled = rig.controller.enroll_once().await.unwrap();

    assert_eq!(enrolled.card_id.to_hex(), "04a3b2c1");
    assert_eq!(rig.remote.calls(), vec!["enroll:04a3b2c1"]);
    // Listening flash, then the success cue.
    assert_eq!(
        rig.pins.held_for("ok"),
        vec![Duration::from_millis(500), Duration::from_secs(2)]
    );
    assert_eq!(rig.pins.high_count("fail"), 0);
    assert_eq!(rig.controller.state(), ControllerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_enrollment_read_timeout() {
    let rig = server_rig(FakeRemote::new()).booted().await;

    let start = Instant::now();
    let err = rig.controller.enroll_once().await.unwrap_err();

    assert!(matches!(err, CommandError::ReadTimeout(10_000)));
    assert!(start.elapsed() >= Duration::from_secs(10));
    assert_eq!(rig.remote.calls_of("enroll"), 0);
    assert_eq!(rig.pins.high_count("fail"), 2);
    assert_eq!(rig.controller.state(), ControllerState::Idle);
}

#[rstest]
#[case::refused(Reply::No)]
#[case::unreachable(Reply::Unreachable)]
#[tokio::test(start_paused = true)]
async fn test_enrollment_remote_failure(#[case] reply: Reply) {
    let rig = server_rig(FakeRemote::new().enroll(reply)).booted().await;
    rig.nfc.present_card(CARD);

    let err = rig.controller.enroll_once().await.unwrap_err();

    assert!(matches!(err, CommandError::RemoteEnrollFailed(_)));
    assert_eq!(rig.remote.calls_of("enroll"), 1);
    assert_eq!(rig.pins.high_count("fail"), 2);
    // Only the listening flash lit the ok LED.
    assert_eq!(rig.pins.high_count("ok"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_trigger_is_busy() {
    let rig = server_rig(FakeRemote::new()).booted().await;
    let first = tokio::spawn({
        let controller = Arc::clone(&rig.controller);
        async move { controller.enroll_once().await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;

    let second = rig.controller.enroll_once().await;
    assert!(matches!(second, Err(CommandError::Busy)));

    rig.nfc.present_card(CARD);
    let enrolled = first.await.unwrap().unwrap();
    assert_eq!(enrolled.card_id.to_hex(), "04a3b2c1");
    assert_eq!(rig.remote.calls_of("enroll"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_trigger_disabled_in_auto_capture() {
    let rig = Rig::new(
        enroller_config(EnrollmentTrigger::AutoCapture),
        FakeRemote::new(),
    )
    .booted()
    .await;

    let err = rig.controller.enroll_once().await.unwrap_err();
    assert!(matches!(err, CommandError::Disabled(_)));
    assert!(rig.pins.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_trigger_before_boot_is_hardware_error() {
    let rig = server_rig(FakeRemote::new());

    let err = rig.controller.enroll_once().await.unwrap_err();
    assert!(matches!(err, CommandError::Hardware(_)));
    assert_eq!(rig.controller.state(), ControllerState::Booting);
}

#[tokio::test(start_paused = true)]
async fn test_beep_during_enrollment_read() {
    let rig = server_rig(FakeRemote::new()).booted().await;
    let enrollment = tokio::spawn({
        let controller = Arc::clone(&rig.controller);
        async move { controller.enroll_once().await }
    });
    // Past the listening flash, read window open.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(rig.controller.state(), ControllerState::EnrollingWait);

    let start = Instant::now();
    rig.controller.test_tone().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(2));

    rig.nfc.present_card(CARD);
    let enrolled = enrollment.await.unwrap().unwrap();
    assert_eq!(enrolled.card_id.to_hex(), "04a3b2c1");
    assert_eq!(rig.remote.calls(), vec!["enroll:04a3b2c1"]);
}

#[tokio::test(start_paused = true)]
async fn test_test_tone_holds_buzzer() {
    let rig = server_rig(FakeRemote::new()).booted().await;

    rig.controller.test_tone().await.unwrap();

    assert_eq!(rig.pins.held_for("buzzer"), vec![Duration::from_secs(2)]);
    assert!(rig.pins.all_low());
}

#[tokio::test(start_paused = true)]
async fn test_test_tone_after_release_fails() {
    let rig = server_rig(FakeRemote::new()).booted().await;
    rig.controller.shutdown();

    let err = rig.controller.test_tone().await.unwrap_err();
    assert!(matches!(err, CommandError::Hardware(_)));
}

#[tokio::test(start_paused = true)]
async fn test_alarm_plays_configured_clip() {
    let rig = server_rig(FakeRemote::new()).booted().await;

    rig.controller.play_alarm().await.unwrap();

    assert_eq!(rig.audio.played(), vec![PathBuf::from("example.wav")]);
}

#[tokio::test(start_paused = true)]
async fn test_alarm_during_enrollment_read() {
    let rig = Rig::with_audio(
        enroller_config(EnrollmentTrigger::Server),
        FakeRemote::new(),
        MockAudio::new().with_duration(Duration::from_secs(3)),
    )
    .booted()
    .await;
    let enrollment = tokio::spawn({
        let controller = Arc::clone(&rig.controller);
        async move { controller.enroll_once().await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(rig.controller.state(), ControllerState::EnrollingWait);

    // The clip plays out in full while the read window stays open.
    let start = Instant::now();
    rig.controller.play_alarm().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert_eq!(rig.audio.play_count(), 1);
    assert_eq!(rig.controller.state(), ControllerState::EnrollingWait);

    rig.nfc.present_card(CARD);
    let enrolled = enrollment.await.unwrap().unwrap();
    assert_eq!(enrolled.card_id.to_hex(), "04a3b2c1");
    assert_eq!(rig.remote.calls(), vec!["enroll:04a3b2c1"]);
}

#[tokio::test(start_paused = true)]
async fn test_alarm_failure_is_hardware_error() {
    let rig = Rig::with_audio(
        enroller_config(EnrollmentTrigger::Server),
        FakeRemote::new(),
        MockAudio::new().failing(),
    );

    let err = rig.controller.play_alarm().await.unwrap_err();
    assert!(matches!(err, CommandError::Hardware(_)));
    assert_eq!(rig.audio.play_count(), 0);
}

#[rstest]
#[case::accepted(Reply::Yes, IndicatorOutcome::Success)]
#[case::refused(Reply::No, IndicatorOutcome::Failure)]
#[case::unreachable(Reply::Unreachable, IndicatorOutcome::Failure)]
#[tokio::test(start_paused = true)]
async fn test_auto_capture_reports_remote_outcome(
    #[case] reply: Reply,
    #[case] expected: IndicatorOutcome,
) {
    let rig = Rig::new(
        enroller_config(EnrollmentTrigger::AutoCapture),
        FakeRemote::new().temporary(reply),
    )
    .booted()
    .await;
    rig.nfc.present_card(CARD);

    let event = rig.controller.capture_once().await.unwrap().unwrap();

    assert_eq!(event.outcome, expected);
    assert_eq!(rig.remote.calls(), vec!["temporary:04a3b2c1"]);
    let (ok, fail) = if expected.is_success() { (1, 0) } else { (0, 2) };
    assert_eq!(rig.pins.high_count("ok"), ok);
    assert_eq!(rig.pins.high_count("fail"), fail);
}

#[tokio::test(start_paused = true)]
async fn test_auto_capture_cooldown_after_card() {
    let rig = Rig::new(
        enroller_config(EnrollmentTrigger::AutoCapture),
        FakeRemote::new(),
    )
    .booted()
    .await;
    rig.nfc.present_card(CARD);

    let start = Instant::now();
    rig.controller.capture_once().await.unwrap();

    // Success cue (100 ms beep, 2 s LED) followed by the 3 s cooldown.
    assert_eq!(start.elapsed(), Duration::from_millis(5100));
    assert_eq!(rig.controller.state(), ControllerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_auto_capture_idle_window() {
    let rig = Rig::new(
        enroller_config(EnrollmentTrigger::AutoCapture),
        FakeRemote::new(),
    )
    .booted()
    .await;

    let start = Instant::now();
    let event = rig.controller.capture_once().await.unwrap();

    assert!(event.is_none());
    assert_eq!(start.elapsed(), Duration::from_millis(10_500));
    assert!(rig.remote.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_auto_capture_run_until_shutdown() {
    let mut config = enroller_config(EnrollmentTrigger::AutoCapture);
    config.command_port = 0;
    let rig = Rig::new(config, FakeRemote::new()).booted().await;
    let shutdown = rig.controller.shutdown_token();
    let task = tokio::spawn(Arc::clone(&rig.controller).run());

    rig.nfc.present_card(CARD);
    tokio::time::sleep(Duration::from_secs(6)).await;
    shutdown.cancel();
    task.await.unwrap().unwrap();

    assert_eq!(rig.remote.calls(), vec!["temporary:04a3b2c1"]);
    assert!(rig.pins.all_low());
}
