//! # CRD Generator
//!
//! Prints CustomResourceDefinition YAML generated from the Rust types.
//!
//! ## Usage
//!
//! ```bash
//! # Broker CRD only
//! cargo run --bin crdgen > deploy/crd/broker.yaml
//!
//! # Every CRD the controller manages, as one multi-document stream
//! cargo run --bin crdgen -- --all | kubectl apply -f -
//! ```

use anyhow::Result;
use broker_controller::crd::Broker;
use broker_controller::ensure::{lighthouse::ClusterRole, submariner};
use clap::Parser;
use kube::CustomResourceExt;

#[derive(Debug, Parser)]
#[command(name = "crdgen", about = "Generate CRD YAML for the Broker controller")]
struct Args {
    /// Also print the submariner and service discovery CRDs
    #[arg(long)]
    all: bool,

    /// Role used to select the service discovery CRDs with --all
    #[arg(long, value_enum, default_value = "broker")]
    role: Role,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Role {
    Broker,
    Data,
}

impl From<Role> for ClusterRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Broker => ClusterRole::BrokerCluster,
            Role::Data => ClusterRole::DataCluster,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut crds = vec![Broker::crd()];
    if args.all {
        crds.extend(submariner::definitions());
        crds.extend(ClusterRole::from(args.role).definitions());
    }

    let documents = crds
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    print!("{}", documents.join("---\n"));

    Ok(())
}
