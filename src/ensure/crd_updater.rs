//! # CRD Updater
//!
//! Create-or-update for `CustomResourceDefinition` objects, used by both
//! definition ensurers.

use crate::observability;
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use tracing::{debug, info};

/// Creates a CRD or brings an existing one in line with the given definition
#[async_trait]
pub trait CrdUpdater: Send + Sync {
    /// Returns `true` when the object was created or changed on the server
    async fn create_or_update(&self, crd: &CustomResourceDefinition) -> Result<bool>;
}

/// Server-side apply implementation backed by the cluster API
#[derive(Clone)]
pub struct KubeCrdUpdater {
    api: Api<CustomResourceDefinition>,
    field_manager: String,
}

impl std::fmt::Debug for KubeCrdUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeCrdUpdater")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeCrdUpdater {
    #[must_use]
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            api: Api::all(client),
            field_manager: field_manager.into(),
        }
    }
}

#[async_trait]
impl CrdUpdater for KubeCrdUpdater {
    async fn create_or_update(&self, crd: &CustomResourceDefinition) -> Result<bool> {
        let name = crd
            .metadata
            .name
            .as_deref()
            .context("CRD has no metadata.name")?;

        let before = self
            .api
            .get_opt(name)
            .await
            .with_context(|| format!("failed to read CRD {name}"))?
            .and_then(|existing| existing.metadata.resource_version);

        let params = PatchParams::apply(&self.field_manager).force();
        let applied = self
            .api
            .patch(name, &params, &Patch::Apply(crd))
            .await
            .with_context(|| format!("failed to apply CRD {name}"))?;

        let changed = before.is_none() || before != applied.metadata.resource_version;
        if changed {
            info!(crd = name, created = before.is_none(), "CRD applied");
            observability::metrics::increment_crds_applied(name);
        } else {
            debug!(crd = name, "CRD already up to date");
        }

        Ok(changed)
    }
}

/// Apply each definition in order, stopping at the first failure
///
/// Returns `true` if any definition was created or changed.
pub(crate) async fn ensure_definitions(
    updater: &dyn CrdUpdater,
    definitions: &[CustomResourceDefinition],
) -> Result<bool> {
    let mut changed = false;
    for crd in definitions {
        let kind = crd.spec.names.kind.as_str();
        changed |= updater
            .create_or_update(crd)
            .await
            .with_context(|| format!("error creating the {kind} CRD"))?;
    }
    Ok(changed)
}
