//! Broker Controller Library
//!
//! Reconciles `Broker` resources: installs the CRDs member clusters
//! synchronise through and maintains the Broker namespace's globalnet
//! ConfigMap.
//!
//! ## Quick Start
//!
//! ```rust
//! use broker_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod ensure;
pub mod observability;
pub mod prelude;
pub mod runtime;
