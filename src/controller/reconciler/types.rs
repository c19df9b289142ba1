//! # Types
//!
//! Core types for the reconciler.

use super::store::{BrokerStore, StoreError};
use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::crd::Broker;
use crate::ensure::EnsurerFactory;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// One step of the ordered ensure sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnsureStep {
    PrimaryDefinitions,
    AuxiliaryDefinitions,
    ValidateNetworkConfig,
    NetworkConfigRecord,
}

impl EnsureStep {
    /// Label used in metrics and log fields
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnsureStep::PrimaryDefinitions => "primary-definitions",
            EnsureStep::AuxiliaryDefinitions => "auxiliary-definitions",
            EnsureStep::ValidateNetworkConfig => "validate-network-config",
            EnsureStep::NetworkConfigRecord => "network-config-record",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            EnsureStep::PrimaryDefinitions => "ensuring the submariner CRDs",
            EnsureStep::AuxiliaryDefinitions => "ensuring the service discovery CRDs",
            EnsureStep::ValidateNetworkConfig => "validating existing globalnet configuration",
            EnsureStep::NetworkConfigRecord => "ensuring the globalnet ConfigMap",
        }
    }
}

impl std::fmt::Display for EnsureStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("error retrieving Broker resource")]
    Fetch(#[source] StoreError),

    #[error("error creating kube client")]
    ClientConstruction(#[source] anyhow::Error),

    #[error("error {}", .step.description())]
    Step {
        step: EnsureStep,
        #[source]
        source: anyhow::Error,
    },
}

impl ReconcilerError {
    /// The ensure step that failed, if the failure happened inside the sequence
    #[must_use]
    pub fn step(&self) -> Option<EnsureStep> {
        match self {
            ReconcilerError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Label used for the error metric
    #[must_use]
    pub fn metric_label(&self) -> &'static str {
        match self {
            ReconcilerError::Fetch(_) => "fetch",
            ReconcilerError::ClientConstruction(_) => "client",
            ReconcilerError::Step { step, .. } => step.as_str(),
        }
    }
}

/// Identifies the Broker to reconcile; the object is always re-read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReconcileRequest {
    pub namespace: String,
    pub name: String,
}

impl ReconcileRequest {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn for_broker(broker: &Broker) -> Self {
        Self::new(broker.namespace().unwrap_or_default(), broker.name_any())
    }

    /// Key used for per-resource state such as backoff
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl std::fmt::Display for ReconcileRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Successful result of a reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing further until the Broker changes
    Done,
    RequeueAfter(Duration),
}

impl ReconcileOutcome {
    #[must_use]
    pub fn into_action(self) -> Action {
        match self {
            ReconcileOutcome::Done => Action::await_change(),
            ReconcileOutcome::RequeueAfter(delay) => Action::requeue(delay),
        }
    }
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}

/// Shared reconcile context
///
/// The store and ensurer factory are injected so the engine never reaches for
/// ambient configuration.
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn BrokerStore>,
    pub ensurers: Arc<dyn EnsurerFactory>,
    pub config: ControllerConfig,
    // Backoff state per resource (identified by namespace/name)
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        store: Arc<dyn BrokerStore>,
        ensurers: Arc<dyn EnsurerFactory>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            ensurers,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Drop the error history of a resource
    ///
    /// Called after every successful reconcile, including those of deleted or
    /// missing Brokers, so the map only holds resources that are failing.
    pub fn reset_backoff(&self, key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(key);
        }
    }

    /// Record a failure for `key` and return the next delay and error count
    pub fn next_backoff(&self, key: &str) -> Option<(Duration, u32)> {
        let mut states = self.backoff_states.lock().ok()?;
        let state = states.entry(key.to_string()).or_insert_with(|| {
            BackoffState::new(self.config.backoff_min_secs, self.config.backoff_max_secs)
        });
        state.increment_error();
        Some((state.backoff.next_backoff(), state.error_count))
    }

    #[must_use]
    pub fn error_count(&self, key: &str) -> u32 {
        self.backoff_states
            .lock()
            .ok()
            .and_then(|states| states.get(key).map(|s| s.error_count))
            .unwrap_or(0)
    }
}
