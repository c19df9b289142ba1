//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use broker_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, BackoffState, BrokerStore, EnsureStep, ReconcileOutcome, ReconcileRequest,
    Reconciler, ReconcilerError, StoreError,
};

// Ensurer seams
pub use crate::ensure::globalnet::{ConfigMapStore, GlobalnetError};
pub use crate::ensure::{ClusterRole, CrdUpdater, DependencyEnsurer, EnsurerFactory};

// Config types - for configuration management
pub use crate::config::{ControllerConfig, ServerConfig};
