//! # Globalnet
//!
//! Broker-side globalnet configuration, kept in the
//! `submariner-globalnet-info` ConfigMap in the Broker's namespace.
//!
//! - `info`: typed view over the record
//! - `validate`: consistency checks for existing cluster allocations
//! - `config_map`: create-or-update of the record parameters

mod config_map;
mod info;
mod validate;

pub use config_map::{ensure_config_map, GlobalnetParameters, RecordChange};
pub use info::{ClusterGlobalNetwork, GlobalnetInfo};
pub use validate::validate_global_networks;

use crate::constants::GLOBALNET_CONFIGMAP_NAME;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Api, PostParams};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlobalnetError {
    #[error("invalid CIDR {cidr:?}")]
    InvalidCidr {
        cidr: String,
        #[source]
        source: ipnet::AddrParseError,
    },

    #[error("invalid globalnet cluster size {size}: {reason}")]
    InvalidClusterSize { size: u32, reason: String },

    #[error("malformed globalnet ConfigMap: {0}")]
    MalformedRecord(String),

    #[error("global CIDR {cidr} of cluster {cluster} is outside the globalnet range {range}")]
    OutsideRange {
        cluster: String,
        cidr: String,
        range: String,
    },

    #[error("global CIDR {cidr} of cluster {cluster} overlaps with cluster {other}")]
    Overlapping {
        cluster: String,
        cidr: String,
        other: String,
    },

    #[error("global CIDRs {cidr} and {other_cidr} of cluster {cluster} overlap")]
    OverlappingWithinCluster {
        cluster: String,
        cidr: String,
        other_cidr: String,
    },

    #[error("globalnet ConfigMap request failed")]
    Store(#[from] kube::Error),
}

/// Namespaced ConfigMap access used by the globalnet ensurers
#[async_trait]
pub trait ConfigMapStore: Send + Sync {
    /// `Ok(None)` when the ConfigMap does not exist
    async fn get(&self, name: &str) -> Result<Option<ConfigMap>, kube::Error>;
    async fn create(&self, config_map: &ConfigMap) -> Result<ConfigMap, kube::Error>;
    async fn replace(&self, name: &str, config_map: &ConfigMap) -> Result<ConfigMap, kube::Error>;
}

#[async_trait]
impl ConfigMapStore for Api<ConfigMap> {
    async fn get(&self, name: &str) -> Result<Option<ConfigMap>, kube::Error> {
        self.get_opt(name).await
    }

    async fn create(&self, config_map: &ConfigMap) -> Result<ConfigMap, kube::Error> {
        Api::create(self, &PostParams::default(), config_map).await
    }

    async fn replace(&self, name: &str, config_map: &ConfigMap) -> Result<ConfigMap, kube::Error> {
        Api::replace(self, name, &PostParams::default(), config_map).await
    }
}

/// Validate the allocations in the existing record, if there is one
pub async fn validate_existing_global_networks(
    store: &dyn ConfigMapStore,
) -> Result<(), GlobalnetError> {
    match store.get(GLOBALNET_CONFIGMAP_NAME).await? {
        None => Ok(()),
        Some(config_map) => validate_global_networks(&GlobalnetInfo::from_config_map(&config_map)?),
    }
}
