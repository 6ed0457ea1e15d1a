//! Peripheral selection: simulated or Raspberry Pi.

use tapgate_core::{CardId, DeviceConfig};
use tapgate_hardware::IndicatorOutputs;
use tapgate_hardware::devices::{AnyAudioOutput, AnyNfcConnector, AnyOutputPin};
use tapgate_hardware::mock::{MockAudio, MockConnector, MockNfcHandle, MockPin, PinLog};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The peripherals handed to the controller.
pub struct Devices {
    pub connector: AnyNfcConnector,
    pub outputs: IndicatorOutputs<AnyOutputPin>,
    pub audio: AnyAudioOutput,

    /// Feed of the simulated reader, if any.
    pub feed: Option<MockNfcHandle>,
}

/// Mock reader, pins and audio. Pin changes show up in the debug log.
pub fn simulated() -> Devices {
    let (connector, feed) = MockConnector::new();
    let log = PinLog::new();
    Devices {
        connector: AnyNfcConnector::Mock(connector),
        outputs: IndicatorOutputs {
            ok_led: AnyOutputPin::Mock(MockPin::new("ok", &log)),
            fail_led: AnyOutputPin::Mock(MockPin::new("fail", &log)),
            buzzer: AnyOutputPin::Mock(MockPin::new("buzzer", &log)),
        },
        audio: AnyAudioOutput::Mock(MockAudio::new()),
        feed: Some(feed),
    }
}

#[cfg(feature = "hardware-rpi")]
pub fn hardware(config: &DeviceConfig) -> anyhow::Result<Devices> {
    use anyhow::Context;
    use tapgate_hardware::audio::AplayAudio;
    use tapgate_hardware::rpi::{RppalConnector, gpio_outputs};

    let pins = gpio_outputs(&config.pins).context("claiming indicator pins")?;
    Ok(Devices {
        connector: AnyNfcConnector::Rpi(RppalConnector::new(config.i2c_bus, config.i2c_address)),
        outputs: IndicatorOutputs {
            ok_led: AnyOutputPin::Gpio(pins.ok_led),
            fail_led: AnyOutputPin::Gpio(pins.fail_led),
            buzzer: AnyOutputPin::Gpio(pins.buzzer),
        },
        audio: AnyAudioOutput::Aplay(AplayAudio::new()),
        feed: None,
    })
}

#[cfg(not(feature = "hardware-rpi"))]
pub fn hardware(_config: &DeviceConfig) -> anyhow::Result<Devices> {
    anyhow::bail!(
        "built without Raspberry Pi support; rebuild with --features hardware-rpi or pass --simulate"
    )
}

/// Present every hex UID typed on stdin to the simulated reader.
pub async fn feed_stdin(feed: MockNfcHandle, shutdown: CancellationToken) {
    info!("Simulation: type a card UID in hex and press enter");
    feed_lines(BufReader::new(tokio::io::stdin()), feed, shutdown).await;
}

/// Present every hex UID line of `input` to the simulated reader.
///
/// The handle stays alive until `shutdown` even after `input` ends, so a
/// closed stdin leaves an empty field rather than a disconnected reader.
async fn feed_lines<R>(input: R, feed: MockNfcHandle, shutdown: CancellationToken)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match CardId::from_hex(line) {
                    Ok(card) => {
                        info!(card_id = %card, "Simulation: card presented");
                        feed.present_card(card.as_bytes());
                    }
                    Err(e) => warn!(input = line, error = %e, "Simulation: not a card UID"),
                }
            }
            Ok(None) => {
                info!("Simulation: input closed, no more cards");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Simulation: input read failed");
                break;
            }
        }
    }
    shutdown.cancelled().await;
    drop(feed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tapgate_hardware::mock::MockConnector;
    use tapgate_hardware::{NfcConnector, NfcTransceiver};

    #[tokio::test]
    async fn test_closed_input_leaves_empty_field() {
        let (connector, feed) = MockConnector::new();
        let mut nfc = connector.open().unwrap();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(feed_lines(
            &b"04a3b2c1\nnot-a-card\n\n"[..],
            feed,
            shutdown.clone(),
        ));

        let window = Duration::from_millis(200);
        assert_eq!(
            nfc.read_passive_target(window).await.unwrap(),
            Some(vec![0x04, 0xA3, 0xB2, 0xC1])
        );
        // Input is exhausted; polls keep timing out instead of failing.
        assert_eq!(nfc.read_passive_target(window).await.unwrap(), None);
        assert_eq!(nfc.read_passive_target(window).await.unwrap(), None);
        assert!(!task.is_finished());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(nfc.read_passive_target(window).await.is_err());
    }
}
