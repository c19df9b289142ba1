//! # Dependency Ensurers
//!
//! Everything a Broker needs to exist in the cluster, expressed as
//! independent idempotent operations.
//!
//! - `crd_updater`: create-or-update for CRDs
//! - `submariner`: primary definition set
//! - `lighthouse`: auxiliary definition set, by cluster role
//! - `globalnet`: globalnet record validation and create-or-update

pub mod crd_updater;
pub mod globalnet;
pub mod lighthouse;
pub mod submariner;

pub use crd_updater::{CrdUpdater, KubeCrdUpdater};
pub use globalnet::{ConfigMapStore, GlobalnetError};
pub use lighthouse::ClusterRole;

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::Api;
use kube::Client;
use std::sync::Arc;
use tracing::debug;

/// The four operations a reconcile runs, in order
#[async_trait]
pub trait DependencyEnsurer: Send + Sync {
    async fn ensure_primary_definitions(&self) -> Result<()>;

    async fn ensure_auxiliary_definitions(&self, role: ClusterRole) -> Result<()>;

    /// Read-only check of the existing globalnet record in `namespace`
    async fn validate_network_config(&self, namespace: &str) -> Result<()>;

    async fn ensure_network_config_record(
        &self,
        enabled: bool,
        cidr_range: &str,
        default_cluster_size: u32,
        namespace: &str,
    ) -> Result<()>;
}

/// Builds the ensurer set used for one reconcile
pub trait EnsurerFactory: Send + Sync {
    fn build(&self) -> Result<Arc<dyn DependencyEnsurer>>;
}

/// Ensurer set backed by the cluster API
#[derive(Clone)]
pub struct KubeEnsurer {
    client: Client,
    crds: Arc<dyn CrdUpdater>,
}

impl std::fmt::Debug for KubeEnsurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeEnsurer").finish_non_exhaustive()
    }
}

impl KubeEnsurer {
    #[must_use]
    pub fn new(client: Client, crds: Arc<dyn CrdUpdater>) -> Self {
        Self { client, crds }
    }

    fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl DependencyEnsurer for KubeEnsurer {
    async fn ensure_primary_definitions(&self) -> Result<()> {
        let changed = submariner::ensure(self.crds.as_ref()).await?;
        debug!(changed, "Primary definitions ensured");
        Ok(())
    }

    async fn ensure_auxiliary_definitions(&self, role: ClusterRole) -> Result<()> {
        let changed = lighthouse::ensure(self.crds.as_ref(), role).await?;
        debug!(changed, role = %role, "Auxiliary definitions ensured");
        Ok(())
    }

    async fn validate_network_config(&self, namespace: &str) -> Result<()> {
        let store = self.config_maps(namespace);
        globalnet::validate_existing_global_networks(&store)
            .await
            .context("error validating existing globalnet configuration")
    }

    async fn ensure_network_config_record(
        &self,
        enabled: bool,
        cidr_range: &str,
        default_cluster_size: u32,
        namespace: &str,
    ) -> Result<()> {
        let store = self.config_maps(namespace);
        let change = globalnet::ensure_config_map(
            &store,
            Some(namespace),
            enabled,
            cidr_range,
            default_cluster_size,
        )
        .await
        .context("error creating globalnet configmap on Broker")?;
        debug!(?change, "Globalnet ConfigMap ensured");
        Ok(())
    }
}

/// Builds a [`KubeEnsurer`] from an injected client configuration
///
/// CRD writes go through the long-lived updater; a fresh cluster client is
/// built from `config` for each reconcile.
#[derive(Clone)]
pub struct KubeEnsurerFactory {
    config: kube::Config,
    crds: Arc<dyn CrdUpdater>,
}

impl std::fmt::Debug for KubeEnsurerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeEnsurerFactory")
            .field("cluster_url", &self.config.cluster_url)
            .finish_non_exhaustive()
    }
}

impl KubeEnsurerFactory {
    #[must_use]
    pub fn new(config: kube::Config, crds: Arc<dyn CrdUpdater>) -> Self {
        Self { config, crds }
    }
}

impl EnsurerFactory for KubeEnsurerFactory {
    fn build(&self) -> Result<Arc<dyn DependencyEnsurer>> {
        let client = Client::try_from(self.config.clone())
            .context("failed to build cluster client from configuration")?;
        Ok(Arc::new(KubeEnsurer::new(client, Arc::clone(&self.crds))))
    }
}
