//! # Multi-Cluster Services CRDs
//!
//! `ServiceImport` and `ServiceExport` from the multicluster.x-k8s.io API,
//! used by the service discovery (lighthouse) agents.

use serde::{Deserialize, Serialize};

/// A service made available to the cluster set
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "ServiceImport",
    group = "multicluster.x-k8s.io",
    version = "v1alpha1",
    namespaced,
    shortname = "svcim"
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceImportSpec {
    /// "ClusterSetIP" or "Headless"
    pub r#type: String,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
    #[serde(default)]
    pub ips: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    #[serde(default)]
    pub name: Option<String>,
    pub port: i32,
    #[serde(default)]
    pub protocol: Option<String>,
}

/// Marks a local service for export to the cluster set
#[derive(
    kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema,
)]
#[kube(
    kind = "ServiceExport",
    group = "multicluster.x-k8s.io",
    version = "v1alpha1",
    namespaced,
    shortname = "svcex"
)]
pub struct ServiceExportSpec {}
