//! Tapgate NFC access-control controller
//!
//! Runs one unit in reader or enroller mode until Ctrl+C or SIGTERM.
//!
//! Usage:
//!   tapgate --mode reader --api-url http://10.0.0.2:8080/api
//!   tapgate --mode enroller --port 5000
//!   tapgate --simulate --mode reader
//!
//! Exit status is 0 after an operator stop and non-zero when the reader
//! cannot be brought up or the configuration is invalid.

mod args;
mod devices;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tapgate_controller::DeviceController;
use tapgate_network::{HttpAccessClient, HttpClientConfig};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("tapgate stopped: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise info, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = Arc::new(args.to_config().context("invalid configuration")?);
    info!(
        version = tapgate_core::VERSION,
        mode = %config.mode,
        trigger = %config.enrollment_trigger,
        api = config.api_base(),
        simulate = args.simulate,
        "tapgate starting"
    );

    let remote = HttpAccessClient::new(HttpClientConfig::from(config.as_ref()))
        .context("building remote client")?;
    let devices = if args.simulate {
        devices::simulated()
    } else {
        devices::hardware(&config)?
    };

    let controller = Arc::new(DeviceController::new(
        Arc::clone(&config),
        devices.connector,
        devices.outputs,
        devices.audio,
        remote,
    ));
    let shutdown = controller.shutdown_token();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Stop requested");
            shutdown.cancel();
        }
    });
    if let Some(feed) = devices.feed {
        tokio::spawn(devices::feed_stdin(feed, shutdown.clone()));
    }

    controller.boot().await.context("card reader bring-up failed")?;
    if shutdown.is_cancelled() {
        controller.shutdown();
        return Ok(());
    }

    let result = Arc::clone(&controller).run().await;
    controller.shutdown();
    result.context("controller failed")
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
