//! Common test utilities
//!
//! In-memory stand-ins for the cluster API. The recording ensurer runs the
//! real ensure functions against these fakes, so tests observe actual writes.

#![allow(dead_code, reason = "Each test crate uses a different subset")]

use async_trait::async_trait;
use broker_controller::config::ControllerConfig;
use broker_controller::controller::reconciler::{
    BrokerStore, EnsureStep, Reconciler, StoreError,
};
use broker_controller::crd::{Broker, BrokerSpec};
use broker_controller::ensure::globalnet::{self, ConfigMapStore};
use broker_controller::ensure::{
    lighthouse, submariner, ClusterRole, CrdUpdater, DependencyEnsurer, EnsurerFactory,
};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const NAMESPACE: &str = "submariner-k8s-broker";

pub fn broker(namespace: &str, name: &str, spec: BrokerSpec) -> Broker {
    let mut broker = Broker::new(name, spec);
    broker.metadata.namespace = Some(namespace.to_string());
    broker
}

pub fn globalnet_spec(cidr: &str, cluster_size: u32) -> BrokerSpec {
    BrokerSpec {
        globalnet_enabled: true,
        globalnet_cidr_range: Some(cidr.to_string()),
        default_globalnet_cluster_size: Some(cluster_size),
    }
}

pub fn mark_deleted(broker: &mut Broker) {
    broker.metadata.deletion_timestamp =
        Some(serde_json::from_value(serde_json::json!("2024-05-01T10:00:00Z")).unwrap());
}

pub fn reconciler(store: Arc<MemoryBrokerStore>, factory: Arc<RecordingFactory>) -> Arc<Reconciler> {
    Arc::new(Reconciler::new(store, factory, ControllerConfig::default()))
}

// ---------------------------------------------------------------------------
// Broker store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryBrokerStore {
    brokers: Mutex<HashMap<(String, String), Broker>>,
    failure: Mutex<Option<String>>,
}

impl MemoryBrokerStore {
    pub fn with(brokers: impl IntoIterator<Item = Broker>) -> Arc<Self> {
        let store = Self::default();
        for broker in brokers {
            store.insert(broker);
        }
        Arc::new(store)
    }

    pub fn insert(&self, broker: Broker) {
        let key = (
            broker.metadata.namespace.clone().unwrap_or_default(),
            broker.metadata.name.clone().unwrap_or_default(),
        );
        self.brokers.lock().unwrap().insert(key, broker);
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl BrokerStore for MemoryBrokerStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Broker>, StoreError> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(StoreError::Unavailable(message));
        }
        Ok(self
            .brokers
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// CRDs
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCrdUpdater {
    crds: Mutex<BTreeMap<String, CustomResourceDefinition>>,
    writes: AtomicUsize,
}

impl MemoryCrdUpdater {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn names(&self) -> Vec<String> {
        self.crds.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl CrdUpdater for MemoryCrdUpdater {
    async fn create_or_update(&self, crd: &CustomResourceDefinition) -> anyhow::Result<bool> {
        let name = crd.metadata.name.clone().unwrap_or_default();
        let mut crds = self.crds.lock().unwrap();
        if crds.get(&name) == Some(crd) {
            return Ok(false);
        }
        crds.insert(name, crd.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// ConfigMaps
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemoryConfigMaps {
    maps: Arc<Mutex<BTreeMap<(String, String), ConfigMap>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryConfigMaps {
    pub fn namespaced(&self, namespace: &str) -> NamespacedConfigMaps {
        NamespacedConfigMaps {
            inner: self.clone(),
            namespace: namespace.to_string(),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.maps
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn put(&self, namespace: &str, name: &str, data: &[(&str, &str)]) {
        let mut config_map = ConfigMap::default();
        config_map.metadata.name = Some(name.to_string());
        config_map.metadata.namespace = Some(namespace.to_string());
        config_map.metadata.labels = Some(BTreeMap::from([(
            "component".to_string(),
            "submariner-globalnet".to_string(),
        )]));
        config_map.data = Some(
            data.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self.maps
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), config_map);
    }

    pub fn clear_labels(&self, namespace: &str, name: &str) {
        if let Some(config_map) = self
            .maps
            .lock()
            .unwrap()
            .get_mut(&(namespace.to_string(), name.to_string()))
        {
            config_map.metadata.labels = None;
        }
    }
}

pub struct NamespacedConfigMaps {
    inner: MemoryConfigMaps,
    namespace: String,
}

impl NamespacedConfigMaps {
    fn key(&self, name: &str) -> (String, String) {
        (self.namespace.clone(), name.to_string())
    }
}

#[async_trait]
impl ConfigMapStore for NamespacedConfigMaps {
    async fn get(&self, name: &str) -> Result<Option<ConfigMap>, kube::Error> {
        Ok(self.inner.maps.lock().unwrap().get(&self.key(name)).cloned())
    }

    async fn create(&self, config_map: &ConfigMap) -> Result<ConfigMap, kube::Error> {
        let name = config_map.metadata.name.clone().unwrap_or_default();
        let mut stored = config_map.clone();
        stored.metadata.namespace = Some(self.namespace.clone());
        self.inner
            .maps
            .lock()
            .unwrap()
            .insert(self.key(&name), stored.clone());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }

    async fn replace(&self, name: &str, config_map: &ConfigMap) -> Result<ConfigMap, kube::Error> {
        self.inner
            .maps
            .lock()
            .unwrap()
            .insert(self.key(name), config_map.clone());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(config_map.clone())
    }
}

// ---------------------------------------------------------------------------
// Ensurers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    PrimaryDefinitions,
    AuxiliaryDefinitions(ClusterRole),
    ValidateNetworkConfig {
        namespace: String,
    },
    NetworkConfigRecord {
        enabled: bool,
        cidr_range: String,
        cluster_size: u32,
        namespace: String,
    },
}

impl Call {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Call::ValidateNetworkConfig { namespace }
            | Call::NetworkConfigRecord { namespace, .. } => Some(namespace),
            _ => None,
        }
    }
}

/// Makes validation in one namespace wait until the record in another is written
#[derive(Clone)]
pub struct Gate {
    pub wait_in: String,
    pub release_after: String,
    pub notify: Arc<Notify>,
}

#[derive(Clone, Default)]
pub struct FakeCluster {
    pub crds: Arc<MemoryCrdUpdater>,
    pub config_maps: MemoryConfigMaps,
}

pub struct RecordingEnsurer {
    cluster: FakeCluster,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_step: Option<EnsureStep>,
    gate: Option<Gate>,
}

impl RecordingEnsurer {
    fn record(&self, call: Call, step: EnsureStep) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail_step == Some(step) {
            anyhow::bail!("injected failure");
        }
        Ok(())
    }
}

#[async_trait]
impl DependencyEnsurer for RecordingEnsurer {
    async fn ensure_primary_definitions(&self) -> anyhow::Result<()> {
        self.record(Call::PrimaryDefinitions, EnsureStep::PrimaryDefinitions)?;
        submariner::ensure(self.cluster.crds.as_ref()).await?;
        Ok(())
    }

    async fn ensure_auxiliary_definitions(&self, role: ClusterRole) -> anyhow::Result<()> {
        self.record(Call::AuxiliaryDefinitions(role), EnsureStep::AuxiliaryDefinitions)?;
        lighthouse::ensure(self.cluster.crds.as_ref(), role).await?;
        Ok(())
    }

    async fn validate_network_config(&self, namespace: &str) -> anyhow::Result<()> {
        self.record(
            Call::ValidateNetworkConfig {
                namespace: namespace.to_string(),
            },
            EnsureStep::ValidateNetworkConfig,
        )?;
        if let Some(gate) = &self.gate {
            if gate.wait_in == namespace {
                gate.notify.notified().await;
            }
        }
        let store = self.cluster.config_maps.namespaced(namespace);
        globalnet::validate_existing_global_networks(&store).await?;
        Ok(())
    }

    async fn ensure_network_config_record(
        &self,
        enabled: bool,
        cidr_range: &str,
        default_cluster_size: u32,
        namespace: &str,
    ) -> anyhow::Result<()> {
        self.record(
            Call::NetworkConfigRecord {
                enabled,
                cidr_range: cidr_range.to_string(),
                cluster_size: default_cluster_size,
                namespace: namespace.to_string(),
            },
            EnsureStep::NetworkConfigRecord,
        )?;
        let store = self.cluster.config_maps.namespaced(namespace);
        globalnet::ensure_config_map(
            &store,
            Some(namespace),
            enabled,
            cidr_range,
            default_cluster_size,
        )
        .await?;
        if let Some(gate) = &self.gate {
            if gate.release_after == namespace {
                gate.notify.notify_one();
            }
        }
        Ok(())
    }
}

/// Hands out a fresh [`RecordingEnsurer`] per reconcile and keeps each call log
#[derive(Default)]
pub struct RecordingFactory {
    pub cluster: FakeCluster,
    pub fail_step: Option<EnsureStep>,
    pub fail_build: bool,
    pub gate: Option<Gate>,
    logs: Mutex<Vec<Arc<Mutex<Vec<Call>>>>>,
}

impl RecordingFactory {
    pub fn failing_at(step: EnsureStep) -> Arc<Self> {
        Arc::new(Self {
            fail_step: Some(step),
            ..Default::default()
        })
    }

    /// A factory whose client construction always fails
    pub fn failing_build() -> Arc<Self> {
        Arc::new(Self {
            fail_build: true,
            ..Default::default()
        })
    }

    /// A healthy factory over existing cluster state
    pub fn on_cluster(cluster: FakeCluster) -> Arc<Self> {
        Arc::new(Self {
            cluster,
            ..Default::default()
        })
    }

    pub fn gated(gate: Gate) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Default::default()
        })
    }

    /// Number of ensurer sets built, one per reconcile that got past the fetch
    pub fn builds(&self) -> usize {
        self.logs.lock().unwrap().len()
    }

    /// Call sequence of each reconcile, in build order
    pub fn call_logs(&self) -> Vec<Vec<Call>> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .map(|log| log.lock().unwrap().clone())
            .collect()
    }

    pub fn all_calls(&self) -> Vec<Call> {
        self.call_logs().into_iter().flatten().collect()
    }
}

impl EnsurerFactory for RecordingFactory {
    fn build(&self) -> anyhow::Result<Arc<dyn DependencyEnsurer>> {
        if self.fail_build {
            anyhow::bail!("unable to load in-cluster configuration");
        }
        let calls = Arc::new(Mutex::new(Vec::new()));
        self.logs.lock().unwrap().push(Arc::clone(&calls));
        Ok(Arc::new(RecordingEnsurer {
            cluster: self.cluster.clone(),
            calls,
            fail_step: self.fail_step,
            gate: self.gate.clone(),
        }))
    }
}

/// The complete sequence a successful reconcile of a Broker in `namespace` runs
pub fn full_sequence(enabled: bool, cidr_range: &str, cluster_size: u32, namespace: &str) -> Vec<Call> {
    vec![
        Call::PrimaryDefinitions,
        Call::AuxiliaryDefinitions(ClusterRole::BrokerCluster),
        Call::ValidateNetworkConfig {
            namespace: namespace.to_string(),
        },
        Call::NetworkConfigRecord {
            enabled,
            cidr_range: cidr_range.to_string(),
            cluster_size,
            namespace: namespace.to_string(),
        },
    ]
}
