//! # Broker Spec
//!
//! The desired-state object this controller converges toward.

use serde::{Deserialize, Serialize};

/// Broker Custom Resource Definition
///
/// A Broker marks a namespace as the rendezvous point of a cluster set. The
/// controller installs the CRDs the member clusters synchronise through and
/// records the globalnet parameters the Broker declares.
///
/// # Example
///
/// ```yaml
/// apiVersion: submariner.io/v1alpha1
/// kind: Broker
/// metadata:
///   name: submariner-broker
///   namespace: submariner-k8s-broker
/// spec:
///   globalnetEnabled: true
///   globalnetCIDRRange: 242.0.0.0/16
///   defaultGlobalnetClusterSize: 8192
/// ```
#[derive(
    kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema,
)]
#[kube(
    kind = "Broker",
    group = "submariner.io",
    version = "v1alpha1",
    namespaced,
    printcolumn = r#"{"name":"Globalnet", "type":"boolean", "jsonPath":".spec.globalnetEnabled"}, {"name":"CIDR", "type":"string", "jsonPath":".spec.globalnetCIDRRange"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BrokerSpec {
    /// Enable globalnet (overlapping CIDR support) for the cluster set
    #[serde(default)]
    pub globalnet_enabled: bool,
    /// Global CIDR range from which per-cluster global CIDRs are allocated
    /// Defaults to 242.0.0.0/8 when globalnet is enabled and no range is given
    #[serde(default, rename = "globalnetCIDRRange")]
    pub globalnet_cidr_range: Option<String>,
    /// Default number of global IPs allocated to each cluster
    /// Defaults to 65536 when globalnet is enabled and no size is given
    #[serde(default)]
    pub default_globalnet_cluster_size: Option<u32>,
}

impl Broker {
    /// Whether the API server has marked this object for deletion
    #[must_use]
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}
