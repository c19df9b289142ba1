//! # Reconcile
//!
//! Converges one Broker: fetch, skip if being deleted, then run the ensure
//! sequence in order and stop at the first failure.
//!
//! Each invocation starts from scratch. Nothing is cached between runs and
//! nothing already applied is rolled back on failure; every step is
//! idempotent, so replaying the full sequence is always safe.

use super::types::{EnsureStep, ReconcileOutcome, ReconcileRequest, Reconciler, ReconcilerError};
use crate::crd::Broker;
use crate::ensure::{ClusterRole, DependencyEnsurer};
use crate::observability;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, Instrument};

/// Reconcile the Broker identified by `request`
pub async fn reconcile(
    request: ReconcileRequest,
    ctx: Arc<Reconciler>,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let span = tracing::info_span!(
        "controller.reconcile",
        resource.name = request.name.as_str(),
        resource.namespace = request.namespace.as_str(),
    );

    async move {
        let start = Instant::now();
        observability::metrics::increment_reconciliations();

        let result = reconcile_broker(&request, &ctx).await;

        observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
        if result.is_ok() {
            ctx.reset_backoff(&request.key());
        }
        result
    }
    .instrument(span)
    .await
}

async fn reconcile_broker(
    request: &ReconcileRequest,
    ctx: &Reconciler,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let broker = match ctx.store.get(&request.namespace, &request.name).await {
        Ok(Some(broker)) => broker,
        Ok(None) => {
            debug!("Broker not found, it was probably deleted");
            return Ok(ReconcileOutcome::Done);
        }
        Err(e) => return Err(ReconcilerError::Fetch(e)),
    };

    if broker.is_being_deleted() {
        info!("Broker is being deleted, nothing to do");
        return Ok(ReconcileOutcome::Done);
    }

    let ensurer = ctx
        .ensurers
        .build()
        .map_err(ReconcilerError::ClientConstruction)?;

    ensure_all(ensurer.as_ref(), &broker, &request.namespace).await?;

    info!("Broker reconciled");
    Ok(ReconcileOutcome::Done)
}

async fn ensure_all(
    ensurer: &dyn DependencyEnsurer,
    broker: &Broker,
    namespace: &str,
) -> Result<(), ReconcilerError> {
    run_step(
        EnsureStep::PrimaryDefinitions,
        ensurer.ensure_primary_definitions(),
    )
    .await?;

    run_step(
        EnsureStep::AuxiliaryDefinitions,
        ensurer.ensure_auxiliary_definitions(ClusterRole::BrokerCluster),
    )
    .await?;

    run_step(
        EnsureStep::ValidateNetworkConfig,
        ensurer.validate_network_config(namespace),
    )
    .await?;

    let spec = &broker.spec;
    run_step(
        EnsureStep::NetworkConfigRecord,
        ensurer.ensure_network_config_record(
            spec.globalnet_enabled,
            spec.globalnet_cidr_range.as_deref().unwrap_or_default(),
            spec.default_globalnet_cluster_size.unwrap_or(0),
            namespace,
        ),
    )
    .await
}

async fn run_step<F>(step: EnsureStep, operation: F) -> Result<(), ReconcilerError>
where
    F: Future<Output = anyhow::Result<()>>,
{
    let span = tracing::debug_span!("controller.reconcile.step", step = step.as_str());

    async move {
        let start = Instant::now();
        let result = operation.await;
        observability::metrics::observe_ensure_step_duration(
            step.as_str(),
            start.elapsed().as_secs_f64(),
        );

        match result {
            Ok(()) => {
                debug!("step.success");
                Ok(())
            }
            Err(source) => Err(ReconcilerError::Step { step, source }),
        }
    }
    .instrument(span)
    .await
}
