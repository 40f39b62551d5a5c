// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Pre-resolved external data loaded from a file.
//!
//! The live IRR and PeeringDB clients run outside this tool; a build
//! consumes their answers either from the previous-run state
//! (`--use-cached`) or from a data file produced by whatever resolver
//! the operator runs.

use ipnet::{Ipv4Net, Ipv6Net};
use irr::{PrefixLimits, ResolvedPrefixes, StaticIrr, StaticLimits};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExternalData {
    irr: BTreeMap<String, IrrEntry>,
    peeringdb: BTreeMap<u32, LimitEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct IrrEntry {
    asns: Vec<u32>,
    prefixes: PrefixEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PrefixEntry {
    ipv4: Vec<String>,
    ipv6: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LimitEntry {
    ipv4: u32,
    ipv6: u32,
}

impl ExternalData {
    /// Build the fixed-answer sources the core consumes.
    pub fn into_sources(self) -> Result<(StaticIrr, StaticLimits), String> {
        let mut irr = StaticIrr::new();
        for (as_set, entry) in self.irr {
            let ipv4 = parse_prefixes::<Ipv4Net>(&as_set, &entry.prefixes.ipv4)?;
            let ipv6 = parse_prefixes::<Ipv6Net>(&as_set, &entry.prefixes.ipv6)?;
            irr = irr
                .with_asns(&as_set, entry.asns)
                .with_prefixes(&as_set, ResolvedPrefixes { ipv4, ipv6 });
        }
        let mut limits = StaticLimits::new();
        for (asn, entry) in self.peeringdb {
            limits = limits.with_limits(
                asn,
                PrefixLimits {
                    ipv4: entry.ipv4,
                    ipv6: entry.ipv6,
                },
            );
        }
        Ok((irr, limits))
    }
}

fn parse_prefixes<T: FromStr>(as_set: &str, raw: &[String]) -> Result<Vec<T>, String> {
    raw.iter()
        .map(|s| {
            T::from_str(s).map_err(|_| format!("invalid prefix '{s}' in entry for '{as_set}'"))
        })
        .collect()
}
