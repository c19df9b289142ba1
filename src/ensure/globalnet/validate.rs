//! # Global Network Validation
//!
//! Checks that the allocations recorded for participating clusters are
//! consistent with the configured range and with each other.

use super::{GlobalnetError, GlobalnetInfo};
use ipnet::Ipv4Net;

pub(crate) fn parse_cidr(cidr: &str) -> Result<Ipv4Net, GlobalnetError> {
    cidr.parse::<Ipv4Net>()
        .map_err(|source| GlobalnetError::InvalidCidr {
            cidr: cidr.to_string(),
            source,
        })
}

fn overlaps(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

/// Validate the cluster allocations in a parsed record
///
/// The range itself is only checked when globalnet is enabled. Cluster CIDRs
/// must always parse and must not overlap.
pub fn validate_global_networks(info: &GlobalnetInfo) -> Result<(), GlobalnetError> {
    let range = if info.enabled {
        Some(parse_cidr(&info.cidr_range)?)
    } else {
        None
    };

    let mut allocated: Vec<(&str, &str, Ipv4Net)> = Vec::new();
    for cluster in &info.clusters {
        for cidr in &cluster.global_cidr {
            let net = parse_cidr(cidr)?;

            if let Some(range) = range {
                if !range.contains(&net) {
                    return Err(GlobalnetError::OutsideRange {
                        cluster: cluster.cluster_id.clone(),
                        cidr: cidr.clone(),
                        range: info.cidr_range.clone(),
                    });
                }
            }

            if let Some((other, other_cidr, _)) = allocated
                .iter()
                .find(|(_, _, existing)| overlaps(existing, &net))
            {
                if *other == cluster.cluster_id {
                    return Err(GlobalnetError::OverlappingWithinCluster {
                        cluster: cluster.cluster_id.clone(),
                        cidr: cidr.clone(),
                        other_cidr: (*other_cidr).to_string(),
                    });
                }
                return Err(GlobalnetError::Overlapping {
                    cluster: cluster.cluster_id.clone(),
                    cidr: cidr.clone(),
                    other: (*other).to_string(),
                });
            }

            allocated.push((cluster.cluster_id.as_str(), cidr.as_str(), net));
        }
    }

    Ok(())
}
