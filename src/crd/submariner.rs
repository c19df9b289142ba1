//! # Submariner Broker CRDs
//!
//! Resource types member clusters exchange through the Broker namespace.
//! Only the schema matters to this controller: it installs the definitions,
//! the member cluster agents own the objects.

use serde::{Deserialize, Serialize};

/// A cluster joined to the cluster set
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(kind = "Cluster", group = "submariner.io", version = "v1", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Cluster ID, unique within the cluster set
    #[serde(rename = "cluster_id")]
    pub cluster_id: String,
    #[serde(default, rename = "color_codes")]
    pub color_codes: Vec<String>,
    #[serde(default, rename = "service_cidr")]
    pub service_cidr: Vec<String>,
    #[serde(default, rename = "cluster_cidr")]
    pub cluster_cidr: Vec<String>,
    /// Global CIDRs assigned when globalnet is enabled
    #[serde(default, rename = "global_cidr")]
    pub global_cidr: Vec<String>,
}

/// A gateway endpoint of a member cluster
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(kind = "Endpoint", group = "submariner.io", version = "v1", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    #[serde(rename = "cluster_id")]
    pub cluster_id: String,
    #[serde(rename = "cable_name")]
    pub cable_name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default, rename = "private_ip")]
    pub private_ip: String,
    #[serde(default, rename = "public_ip")]
    pub public_ip: String,
    #[serde(default, rename = "nat_enabled")]
    pub nat_enabled: bool,
    /// Cable driver (e.g. "libreswan", "wireguard", "vxlan")
    #[serde(default)]
    pub backend: String,
}

/// Gateway health as reported by the active gateway engine
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Gateway",
    group = "submariner.io",
    version = "v1",
    namespaced,
    status = "GatewayStatus",
    printcolumn = r#"{"name":"HA Status", "type":"string", "jsonPath":".status.haStatus"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    /// "active" or "passive"
    #[serde(default)]
    pub ha_status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status_failure: Option<String>,
}
