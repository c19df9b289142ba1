//! # Service Discovery Definitions
//!
//! The auxiliary definition set from `multicluster.x-k8s.io`. Which kinds are
//! needed depends on the role of the cluster.

use super::crd_updater::{ensure_definitions, CrdUpdater};
use crate::crd::{ServiceExport, ServiceImport};
use anyhow::Result;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

/// Role of the cluster the definitions are installed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterRole {
    /// Broker cluster: holds aggregated imports only
    BrokerCluster,
    /// Participating cluster: exports and imports services
    DataCluster,
}

impl ClusterRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterRole::BrokerCluster => "broker-cluster",
            ClusterRole::DataCluster => "data-cluster",
        }
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<CustomResourceDefinition> {
        match self {
            ClusterRole::BrokerCluster => vec![ServiceImport::crd()],
            ClusterRole::DataCluster => vec![ServiceImport::crd(), ServiceExport::crd()],
        }
    }
}

impl std::fmt::Display for ClusterRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Create or update the auxiliary definitions for `role`
pub async fn ensure(updater: &dyn CrdUpdater, role: ClusterRole) -> Result<bool> {
    ensure_definitions(updater, &role.definitions()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(role: ClusterRole) -> Vec<String> {
        role.definitions()
            .into_iter()
            .map(|crd| crd.spec.names.kind)
            .collect()
    }

    #[test]
    fn test_broker_cluster_needs_imports_only() {
        assert_eq!(kinds(ClusterRole::BrokerCluster), vec!["ServiceImport"]);
    }

    #[test]
    fn test_data_cluster_needs_imports_and_exports() {
        assert_eq!(
            kinds(ClusterRole::DataCluster),
            vec!["ServiceImport", "ServiceExport"]
        );
    }

    #[test]
    fn test_definitions_use_multicluster_group() {
        for crd in ClusterRole::DataCluster.definitions() {
            assert_eq!(crd.spec.group, "multicluster.x-k8s.io");
        }
    }
}
