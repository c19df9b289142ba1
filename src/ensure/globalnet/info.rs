//! # Globalnet Record
//!
//! Typed view over the `submariner-globalnet-info` ConfigMap.

use super::GlobalnetError;
use k8s_openapi::api::core::v1::ConfigMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ENABLED_KEY: &str = "globalnetEnabled";
pub const CIDR_RANGE_KEY: &str = "globalnetCidrRange";
pub const CLUSTER_SIZE_KEY: &str = "globalnetClusterSize";
pub const CLUSTER_INFO_KEY: &str = "clusterinfo";

/// Global CIDRs allocated to one participating cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterGlobalNetwork {
    pub cluster_id: String,
    #[serde(default)]
    pub global_cidr: Vec<String>,
}

/// Parsed content of the globalnet record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalnetInfo {
    pub enabled: bool,
    pub cidr_range: String,
    pub cluster_size: u32,
    pub clusters: Vec<ClusterGlobalNetwork>,
}

impl GlobalnetInfo {
    /// Parse the record's data
    ///
    /// Missing parameter keys read as their zero values. A present but
    /// unparseable value is an error.
    pub fn from_config_map(config_map: &ConfigMap) -> Result<Self, GlobalnetError> {
        let empty = BTreeMap::new();
        let data = config_map.data.as_ref().unwrap_or(&empty);

        let enabled = match data.get(ENABLED_KEY).map(String::as_str) {
            None | Some("") => false,
            Some(value) => value.parse::<bool>().map_err(|e| {
                GlobalnetError::MalformedRecord(format!("{ENABLED_KEY} {value:?}: {e}"))
            })?,
        };

        let cluster_size = match data.get(CLUSTER_SIZE_KEY).map(String::as_str) {
            None | Some("") => 0,
            Some(value) => value.parse::<u32>().map_err(|e| {
                GlobalnetError::MalformedRecord(format!("{CLUSTER_SIZE_KEY} {value:?}: {e}"))
            })?,
        };

        let clusters = match data.get(CLUSTER_INFO_KEY).map(|v| v.trim()) {
            None | Some("") => Vec::new(),
            Some(value) => serde_json::from_str(value).map_err(|e| {
                GlobalnetError::MalformedRecord(format!("{CLUSTER_INFO_KEY} is not valid JSON: {e}"))
            })?,
        };

        Ok(Self {
            enabled,
            cidr_range: data.get(CIDR_RANGE_KEY).cloned().unwrap_or_default(),
            cluster_size,
            clusters,
        })
    }
}
