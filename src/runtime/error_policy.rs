//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::controller::reconciler::{ReconcileRequest, Reconciler, ReconcilerError};
use crate::crd::Broker;
use crate::observability;
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

/// Handle reconciliation errors with Fibonacci backoff
///
/// Backoff state is tracked per Broker so one failing Broker never delays
/// another.
pub fn handle_reconciliation_error(
    obj: Arc<Broker>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let request = ReconcileRequest::for_broker(&obj);
    Action::requeue(backoff_for(&request, error, &ctx))
}

/// Record the failure and compute the delay before the next attempt
pub fn backoff_for(request: &ReconcileRequest, error: &ReconcilerError, ctx: &Reconciler) -> Duration {
    let step = error.metric_label();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = request.name.as_str(),
        resource.namespace = request.namespace.as_str(),
        step = step,
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}: {:?}", request, error);
    observability::metrics::increment_reconciliation_errors(step);

    let (delay, error_count) = ctx.next_backoff(&request.key()).unwrap_or_else(|| {
        warn!("Failed to lock backoff_states, using minimum backoff");
        (Duration::from_secs(ctx.config.backoff_min_secs), 0)
    });

    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
    info!(
        "Retrying {} in {}s (error count: {}, next attempt at {})",
        request,
        delay.as_secs(),
        error_count,
        next_trigger_time.to_rfc3339()
    );

    observability::metrics::increment_requeues_total("error-backoff");
    delay
}

/// Classification of errors surfaced by the watch stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// 401, RBAC revoked or token expired
    Unauthorized,
    /// 410, resource version too old
    Expired,
    /// 429, API server throttling or storage reinitializing
    Throttled,
    /// 404, usually the Broker CRD is not installed
    NotFound,
    Other,
}

impl WatchErrorKind {
    /// Classify a watch error from its debug representation
    ///
    /// 404 is checked before 401 since a plain-text 404 body surfaces as a
    /// deserialization error that also mentions the failed watch.
    #[must_use]
    pub fn classify(error: &str) -> Self {
        let is_not_found =
            error.contains("ObjectNotFound") || error.contains("404") || error.contains("not found");

        if (error.contains("401") || error.contains("Unauthorized")) && !is_not_found {
            WatchErrorKind::Unauthorized
        } else if error.contains("410")
            || error.contains("too old resource version")
            || error.contains("Expired")
            || error.contains("Gone")
        {
            WatchErrorKind::Expired
        } else if error.contains("429")
            || error.contains("storage is (re)initializing")
            || error.contains("TooManyRequests")
        {
            WatchErrorKind::Throttled
        } else if is_not_found {
            WatchErrorKind::NotFound
        } else {
            WatchErrorKind::Other
        }
    }
}

/// Handle a watch stream error
///
/// Returns `None` to filter the error out and let the stream restart, or
/// `Some(())` to keep it.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff_ms: &Arc<AtomicU64>,
    max_backoff_ms: u64,
    watch_restart_delay_secs: u64,
) -> Option<()> {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );

    async move {
        match WatchErrorKind::classify(error_string) {
            WatchErrorKind::Unauthorized => {
                error!("Watch authentication failed (401 Unauthorized) - RBAC may have been revoked or token expired");
                error!("Verify the controller's ServiceAccount can still list and watch brokers.submariner.io");
                warn!(
                    "Waiting {}s before retrying watch (RBAC may need time to propagate)...",
                    watch_restart_delay_secs
                );
                tokio::time::sleep(Duration::from_secs(watch_restart_delay_secs)).await;
                None
            }
            WatchErrorKind::Expired => {
                warn!(error_type = "410", "watch.error.resource_version_expired");
                None
            }
            WatchErrorKind::Throttled => {
                let current = backoff_ms.load(Ordering::Relaxed);
                warn!(
                    "API server throttling (429), backing off for {}ms before restart...",
                    current
                );
                tokio::time::sleep(Duration::from_millis(current)).await;
                backoff_ms.store(current.saturating_mul(2).min(max_backoff_ms), Ordering::Relaxed);
                None
            }
            WatchErrorKind::NotFound => {
                warn!(
                    "Resource not found (404) - the Broker CRD may not be installed. Error: {}",
                    error_string
                );
                Some(())
            }
            WatchErrorKind::Other => {
                error!("Controller stream error: {}", error_string);
                tokio::time::sleep(Duration::from_secs(watch_restart_delay_secs)).await;
                None
            }
        }
    }
    .instrument(error_span)
    .await
}
