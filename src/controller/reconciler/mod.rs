//! # Reconciler
//!
//! Core reconciliation logic for `Broker` resources.
//!
//! ## Reconciliation Flow
//!
//! 1. Re-read the Broker; a missing Broker is done
//! 2. Skip Brokers marked for deletion
//! 3. Build the ensurer set (cluster client)
//! 4. Ensure the submariner CRDs
//! 5. Ensure the service discovery CRDs for the broker role
//! 6. Validate existing globalnet allocations
//! 7. Create or update the globalnet ConfigMap
//!
//! The first failing step ends the reconcile with an error naming that step.

pub mod reconcile;
pub mod store;
pub mod types;

pub use reconcile::reconcile;
pub use store::{BrokerStore, KubeBrokerStore, StoreError};
pub use types::{
    BackoffState, EnsureStep, ReconcileOutcome, ReconcileRequest, Reconciler, ReconcilerError,
};
