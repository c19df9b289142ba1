//! # Submariner Definitions
//!
//! The primary definition set every broker needs: `Cluster`, `Endpoint` and
//! `Gateway` in `submariner.io/v1`.

use super::crd_updater::{ensure_definitions, CrdUpdater};
use crate::crd::{Cluster, Endpoint, Gateway};
use anyhow::Result;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

#[must_use]
pub fn definitions() -> Vec<CustomResourceDefinition> {
    vec![Cluster::crd(), Endpoint::crd(), Gateway::crd()]
}

/// Create or update the primary definition set
pub async fn ensure(updater: &dyn CrdUpdater) -> Result<bool> {
    ensure_definitions(updater, &definitions()).await
}
