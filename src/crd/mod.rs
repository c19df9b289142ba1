//! # Custom Resource Definitions
//!
//! CRD types for the Broker Controller.
//!
//! ## Module Structure
//!
//! - `broker.rs` - The `Broker` resource this controller reconciles
//! - `submariner.rs` - Primary CRD set installed in the Broker cluster
//! - `multicluster.rs` - Service discovery CRD set (Multi-Cluster Services API)

mod broker;
mod multicluster;
mod submariner;

pub use broker::{Broker, BrokerSpec};
pub use multicluster::{ServiceExport, ServiceExportSpec, ServiceImport, ServiceImportSpec, ServicePort};
pub use submariner::{Cluster, ClusterSpec, Endpoint, EndpointSpec, Gateway, GatewaySpec, GatewayStatus};
