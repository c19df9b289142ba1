//! # Globalnet Record Ensurer
//!
//! Create-or-update of the globalnet ConfigMap. Cluster allocations in
//! `clusterinfo` belong to the participating clusters and are never
//! overwritten here.

use super::info::{CIDR_RANGE_KEY, CLUSTER_INFO_KEY, CLUSTER_SIZE_KEY, ENABLED_KEY};
use super::validate::{parse_cidr, validate_global_networks};
use super::{ConfigMapStore, GlobalnetError, GlobalnetInfo};
use crate::constants::{
    DEFAULT_GLOBALNET_CIDR, DEFAULT_GLOBALNET_CLUSTER_SIZE, GLOBALNET_COMPONENT_LABEL,
    GLOBALNET_CONFIGMAP_NAME,
};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Normalized globalnet parameters as written to the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalnetParameters {
    pub enabled: bool,
    pub cidr_range: String,
    pub cluster_size: u32,
}

impl GlobalnetParameters {
    /// Apply defaults and validate
    ///
    /// When enabled, an empty range becomes the default range and a zero size
    /// becomes the default size. The size must be a power of two no larger
    /// than the range. Disabled parameters are recorded as given.
    pub fn normalize(enabled: bool, cidr_range: &str, cluster_size: u32) -> Result<Self, GlobalnetError> {
        if !enabled {
            return Ok(Self {
                enabled,
                cidr_range: cidr_range.to_string(),
                cluster_size,
            });
        }

        let cidr_range = if cidr_range.is_empty() {
            DEFAULT_GLOBALNET_CIDR
        } else {
            cidr_range
        };
        let cluster_size = if cluster_size == 0 {
            DEFAULT_GLOBALNET_CLUSTER_SIZE
        } else {
            cluster_size
        };

        let range = parse_cidr(cidr_range)?;
        if !cluster_size.is_power_of_two() {
            return Err(GlobalnetError::InvalidClusterSize {
                size: cluster_size,
                reason: "must be a power of two".to_string(),
            });
        }
        let range_size = 1u64 << (32 - u32::from(range.prefix_len()));
        if u64::from(cluster_size) > range_size {
            return Err(GlobalnetError::InvalidClusterSize {
                size: cluster_size,
                reason: format!("larger than the {range_size} addresses in {cidr_range}"),
            });
        }

        Ok(Self {
            enabled,
            cidr_range: cidr_range.to_string(),
            cluster_size,
        })
    }

    fn data(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (ENABLED_KEY.to_string(), self.enabled.to_string()),
            (CIDR_RANGE_KEY.to_string(), self.cidr_range.clone()),
            (CLUSTER_SIZE_KEY.to_string(), self.cluster_size.to_string()),
        ])
    }

    fn new_config_map(&self, namespace: Option<&str>) -> ConfigMap {
        let mut data = self.data();
        data.insert(CLUSTER_INFO_KEY.to_string(), "[]".to_string());

        ConfigMap {
            metadata: ObjectMeta {
                name: Some(GLOBALNET_CONFIGMAP_NAME.to_string()),
                namespace: namespace.map(str::to_string),
                labels: Some(BTreeMap::from([(
                    "component".to_string(),
                    GLOBALNET_COMPONENT_LABEL.to_string(),
                )])),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        }
    }
}

/// Outcome of [`ensure_config_map`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    Created,
    Updated,
    Unchanged,
}

/// Create the globalnet record or bring its parameters up to date
///
/// Only parameter keys whose values differ are rewritten, and the component
/// label is restored if missing. Nothing is written when the record already
/// matches, or when the recorded allocations would not fit the new parameters.
pub async fn ensure_config_map(
    store: &dyn ConfigMapStore,
    namespace: Option<&str>,
    enabled: bool,
    cidr_range: &str,
    cluster_size: u32,
) -> Result<RecordChange, GlobalnetError> {
    let params = GlobalnetParameters::normalize(enabled, cidr_range, cluster_size)?;

    let existing = match store.get(GLOBALNET_CONFIGMAP_NAME).await? {
        Some(existing) => existing,
        None => match store.create(&params.new_config_map(namespace)).await {
            Ok(_) => {
                info!(
                    globalnet.enabled = params.enabled,
                    globalnet.cidr_range = params.cidr_range.as_str(),
                    globalnet.cluster_size = params.cluster_size,
                    "Created globalnet ConfigMap"
                );
                return Ok(RecordChange::Created);
            }
            // Created concurrently, fall through to the update path
            Err(kube::Error::Api(api_err)) if api_err.code == 409 => store
                .get(GLOBALNET_CONFIGMAP_NAME)
                .await?
                .ok_or_else(|| {
                    GlobalnetError::MalformedRecord(
                        "ConfigMap reported as existing but could not be read".to_string(),
                    )
                })?,
            Err(e) => return Err(e.into()),
        },
    };

    let mut updated = existing;
    let data = updated.data.get_or_insert_with(BTreeMap::new);
    let mut changed_keys = Vec::new();
    for (key, value) in params.data() {
        if data.get(&key) != Some(&value) {
            data.insert(key.clone(), value);
            changed_keys.push(key);
        }
    }

    let labels = updated.metadata.labels.get_or_insert_with(BTreeMap::new);
    if labels.get("component").map(String::as_str) != Some(GLOBALNET_COMPONENT_LABEL) {
        labels.insert("component".to_string(), GLOBALNET_COMPONENT_LABEL.to_string());
        changed_keys.push("labels".to_string());
    }

    if changed_keys.is_empty() {
        debug!("Globalnet ConfigMap already up to date");
        return Ok(RecordChange::Unchanged);
    }

    // Existing allocations must still fit the new parameters
    validate_global_networks(&GlobalnetInfo::from_config_map(&updated)?)?;

    store.replace(GLOBALNET_CONFIGMAP_NAME, &updated).await?;
    info!(keys = ?changed_keys, "Updated globalnet ConfigMap");
    Ok(RecordChange::Updated)
}
