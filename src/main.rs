//! # Broker Controller
//!
//! A Kubernetes controller that prepares a namespace to act as a submariner
//! Broker.
//!
//! For every `Broker` it:
//!
//! 1. **Installs the submariner CRDs** - `Cluster`, `Endpoint` and `Gateway`
//! 2. **Installs the service discovery CRDs** - `ServiceImport` for the broker role
//! 3. **Validates globalnet allocations** - existing per-cluster global CIDRs
//! 4. **Records globalnet parameters** - the `submariner-globalnet-info` ConfigMap
//!
//! Failed reconciliations are retried with per-Broker Fibonacci backoff.
//! Metrics and probes are served on `METRICS_PORT`.

use anyhow::Result;
use broker_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(init.brokers, init.reconciler, init.server_state).await
}
