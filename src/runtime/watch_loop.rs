//! # Watch Loop
//!
//! Controller watch loop that monitors Broker resources and triggers
//! reconciliation when changes are detected.

use crate::constants::{DEFAULT_WATCH_BACKOFF_MAX_MS, DEFAULT_WATCH_BACKOFF_START_MS};
use crate::controller::reconciler::{
    reconcile, ReconcileOutcome, ReconcileRequest, Reconciler, ReconcilerError,
};
use crate::controller::server::ServerState;
use crate::crd::Broker;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{controller, controller::Action, watcher, Controller};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

/// Run the controller watch loop
///
/// Watches Broker objects only. The watch restarts after stream errors and
/// after the stream ends, until a shutdown signal is received.
pub async fn run_watch_loop(
    brokers: Api<Broker>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let config = reconciler.config.clone();
    let backoff_duration_ms = Arc::new(AtomicU64::new(DEFAULT_WATCH_BACKOFF_START_MS));

    // Mark the server not ready on SIGTERM/SIGINT so the loop exits instead of restarting
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let shutdown_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Initiating graceful shutdown...");
        shutdown_state.set_ready(false);
        let _ = shutdown_tx.send(true);
    });

    loop {
        if *shutdown_rx.borrow() || !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );

        watch_span.in_scope(|| {
            info!(
                concurrency = config.max_concurrent_reconciliations,
                "Starting controller watch loop..."
            );
        });

        let backoff = Arc::clone(&backoff_duration_ms);
        let watch_restart_delay_secs = config.watch_restart_delay_secs;

        Controller::new(brokers.clone(), watcher::Config::default().any_semantic())
            .with_config(
                controller::Config::default().concurrency(config.max_concurrent_reconciliations),
            )
            .shutdown_on_signal()
            .run(reconcile_broker, handle_reconciliation_error, Arc::clone(&reconciler))
            .filter_map(move |event| {
                let backoff = Arc::clone(&backoff);
                async move {
                    match &event {
                        Ok((object, _)) => {
                            backoff.store(
                                DEFAULT_WATCH_BACKOFF_START_MS,
                                std::sync::atomic::Ordering::Relaxed,
                            );
                            debug!(resource.name = object.name.as_str(), "watch.event.success");
                            Some(event)
                        }
                        Err(e) => {
                            let error_string = format!("{e:?}");
                            handle_watch_stream_error(
                                &error_string,
                                &backoff,
                                DEFAULT_WATCH_BACKOFF_MAX_MS,
                                watch_restart_delay_secs,
                            )
                            .await
                            .map(|()| event)
                        }
                    }
                }
            })
            .for_each(|_| futures::future::ready(()))
            .instrument(watch_span)
            .await;

        let delay = config.watch_restart_delay_after_end_duration();
        if wait_before_restart(delay, &mut shutdown_rx).await {
            info!("Shutdown requested, exiting watch loop");
            break;
        }
    }

    info!("Controller stopped gracefully");
    Ok(())
}

async fn reconcile_broker(
    obj: Arc<Broker>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    reconcile(ReconcileRequest::for_broker(&obj), ctx)
        .await
        .map(ReconcileOutcome::into_action)
}

/// Sleep before restarting an ended watch stream
///
/// Returns `true` when shutdown was requested, either already or during the
/// delay. The stream also ends on the shutdown signal itself, which may be
/// observed here slightly before the flag is set.
async fn wait_before_restart(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow_and_update() {
        return true;
    }

    warn!(
        "Controller watch stream ended, restarting in {} seconds...",
        delay.as_secs()
    );
    tokio::select! {
        () = tokio::time::sleep(delay) => *shutdown.borrow(),
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

/// Resolve on SIGINT or SIGTERM
///
/// `shutdown_on_signal` stops the running Controller on the same signals;
/// this lets the loop tell a shutdown apart from a stream that simply ended.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
