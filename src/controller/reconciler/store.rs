//! # Broker Store
//!
//! Read access to Broker objects.

use crate::crd::Broker;
use async_trait::async_trait;
use kube::api::Api;
use kube::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Kubernetes API error")]
    Api(#[from] kube::Error),

    #[error("Broker store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BrokerStore: Send + Sync {
    /// `Ok(None)` when no Broker with this identity exists
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Broker>, StoreError>;
}

/// Reads Brokers straight from the API server
#[derive(Clone)]
pub struct KubeBrokerStore {
    client: Client,
}

impl std::fmt::Debug for KubeBrokerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeBrokerStore").finish_non_exhaustive()
    }
}

impl KubeBrokerStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BrokerStore for KubeBrokerStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Broker>, StoreError> {
        let api: Api<Broker> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}
