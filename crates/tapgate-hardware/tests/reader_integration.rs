//! Integration tests for CardReaderPeripheral
//!
//! These drive bring-up and windowed reads against the mock connector with
//! Tokio's clock paused, so every timing bound is exact.

use std::time::Duration;
use tapgate_hardware::mock::MockConnector;
use tapgate_hardware::{CardReaderPeripheral, HardwareError, PeripheralState, ReaderTimings};
use tokio::time::Instant;

fn timings() -> ReaderTimings {
    ReaderTimings {
        bus_settle: Duration::from_millis(1000),
        init_backoff: Duration::from_millis(2000),
        poll_window: Duration::from_millis(500),
        error_pause: Duration::from_millis(100),
    }
}

#[tokio::test(start_paused = true)]
async fn test_initialize_first_attempt() {
    let (connector, _handle) = MockConnector::new();
    let mut reader = CardReaderPeripheral::new(connector.clone(), timings());

    let start = Instant::now();
    reader.initialize(3).await.unwrap();

    assert_eq!(connector.open_count(), 1);
    assert_eq!(reader.state(), PeripheralState::Ready);
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_initialize_succeeds_on_third_attempt() {
    let (connector, _handle) = MockConnector::new();
    let connector = connector.failing_opens(2);
    let mut reader = CardReaderPeripheral::new(connector.clone(), timings());

    let start = Instant::now();
    reader.initialize(3).await.unwrap();

    assert_eq!(connector.open_count(), 3);
    assert!(reader.is_ready());
    // two backoffs, one settle
    assert_eq!(start.elapsed(), Duration::from_millis(2 * 2000 + 1000));
}

#[tokio::test(start_paused = true)]
async fn test_initialize_exhausts_attempts() {
    let (connector, _handle) = MockConnector::new();
    let connector = connector.failing_opens(u32::MAX);
    let mut reader = CardReaderPeripheral::new(connector.clone(), timings());

    let start = Instant::now();
    let err = reader.initialize(3).await.unwrap_err();

    assert!(matches!(err, HardwareError::InitializationExhausted { attempts: 3, .. }));
    assert!(err.is_fatal());
    assert_eq!(connector.open_count(), 3);
    assert_eq!(reader.state(), PeripheralState::Faulted);
    // no backoff after the final attempt
    assert_eq!(start.elapsed(), Duration::from_millis(2 * 2000));

    let err = reader.read_card(Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, HardwareError::NotReady { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_configure_failure_consumes_an_attempt() {
    let (connector, _handle) = MockConnector::new();
    let connector = connector.failing_configures(1);
    let mut reader = CardReaderPeripheral::new(connector.clone(), timings());

    reader.initialize(2).await.unwrap();
    assert_eq!(connector.open_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_read_without_card_times_out_within_bounds() {
    let (connector, _handle) = MockConnector::new();
    let mut reader = CardReaderPeripheral::new(connector, timings());
    reader.initialize(1).await.unwrap();

    let start = Instant::now();
    let card = reader.read_card(Duration::from_millis(1000)).await.unwrap();

    assert!(card.is_none());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed <= Duration::from_millis(1100));
}

#[tokio::test(start_paused = true)]
async fn test_last_window_is_clipped_to_deadline() {
    let (connector, _handle) = MockConnector::new();
    let mut reader = CardReaderPeripheral::new(connector, timings());
    reader.initialize(1).await.unwrap();

    let start = Instant::now();
    let card = reader.read_card(Duration::from_millis(1200)).await.unwrap();

    assert!(card.is_none());
    assert_eq!(start.elapsed(), Duration::from_millis(1200));
}

#[tokio::test(start_paused = true)]
async fn test_card_presented_mid_read() {
    let (connector, handle) = MockConnector::new();
    let mut reader = CardReaderPeripheral::new(connector, timings());
    reader.initialize(1).await.unwrap();

    let presenter = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(700)).await;
        handle.present_card(vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        handle
    });

    let start = Instant::now();
    let card = reader.read_card(Duration::from_secs(10)).await.unwrap();

    assert_eq!(card.unwrap().to_hex(), "04112233445566");
    assert_eq!(start.elapsed(), Duration::from_millis(700));
    drop(presenter.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_transient_error_then_card() {
    let (connector, handle) = MockConnector::new();
    let mut reader = CardReaderPeripheral::new(connector, timings());
    reader.initialize(1).await.unwrap();

    handle.inject_error("I2C NACK");
    handle.present_card(vec![0xDE, 0xAD, 0xBE, 0xEF]);

    let start = Instant::now();
    let card = reader.read_card(Duration::from_secs(1)).await.unwrap();

    assert_eq!(card.unwrap().to_hex(), "deadbeef");
    assert_eq!(start.elapsed(), Duration::from_millis(100));
    assert_eq!(reader.health().total_read_errors, 1);
}

#[tokio::test(start_paused = true)]
async fn test_errors_never_end_read_early() {
    let (connector, handle) = MockConnector::new();
    let mut reader = CardReaderPeripheral::new(connector, timings());
    reader.initialize(1).await.unwrap();

    for _ in 0..3 {
        handle.inject_error("checksum mismatch");
    }

    let start = Instant::now();
    let card = reader.read_card(Duration::from_millis(1000)).await.unwrap();

    assert!(card.is_none());
    assert!(start.elapsed() >= Duration::from_millis(1000));
    assert_eq!(reader.health().consecutive_read_errors, 0);
    assert_eq!(reader.health().total_read_errors, 3);
}
