// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Previous-run state as a cache in front of the live sources.
//!
//! State layout written by the peer compiler and read back here:
//! `irr.<as-set>.asns`, `irr.<as-set>.prefixes.{ipv4,ipv6}` and
//! `peeringdb.<asn>.{ipv4,ipv6}`. Malformed cached entries are treated
//! as absent, not as errors; the live source then answers.

use crate::{IrrSource, PrefixLimitSource, PrefixLimits, ResolvedPrefixes};
use config::{ConfigError, StateMap};
use ipnet::{Ipv4Net, Ipv6Net};
use serde_json::json;
use std::str::FromStr;
use tracing::{debug, warn};

/// IRR resolution with previous-state fallback.
pub struct CachedIrr<'a> {
    source: &'a dyn IrrSource,
    previous: &'a StateMap,
    use_cached: bool,
}

impl<'a> CachedIrr<'a> {
    pub fn new(source: &'a dyn IrrSource, previous: &'a StateMap, use_cached: bool) -> Self {
        Self {
            source,
            previous,
            use_cached,
        }
    }

    pub fn resolve_asns(&self, as_set: &str) -> Result<Vec<u32>, ConfigError> {
        if self.use_cached
            && let Some(cached) = cached_asns(self.previous, as_set)
        {
            debug!("IRR ASNs for '{as_set}' served from cached state");
            return Ok(cached);
        }
        self.source.resolve_asns(as_set)
    }

    pub fn resolve_prefixes(&self, as_set: &str) -> Result<ResolvedPrefixes, ConfigError> {
        if self.use_cached
            && let Some(cached) = cached_prefixes(self.previous, as_set)
        {
            debug!("IRR prefixes for '{as_set}' served from cached state");
            return Ok(cached);
        }
        self.source.resolve_prefixes(as_set)
    }
}

/// PeeringDB lookup with previous-state fallback.
pub struct CachedLimits<'a> {
    source: &'a dyn PrefixLimitSource,
    previous: &'a StateMap,
    use_cached: bool,
}

impl<'a> CachedLimits<'a> {
    pub fn new(
        source: &'a dyn PrefixLimitSource,
        previous: &'a StateMap,
        use_cached: bool,
    ) -> Self {
        Self {
            source,
            previous,
            use_cached,
        }
    }

    pub fn prefix_limits(&self, asn: u32) -> Result<PrefixLimits, ConfigError> {
        if self.use_cached
            && let Some(cached) = cached_limits(self.previous, asn)
        {
            debug!("prefix limits for AS{asn} served from cached state");
            return Ok(cached);
        }
        self.source.prefix_limits(asn)
    }
}

pub fn cached_asns(state: &StateMap, as_set: &str) -> Option<Vec<u32>> {
    let values = state.get(&["irr", as_set, "asns"])?.as_array()?;
    let mut asns = Vec::with_capacity(values.len());
    for value in values {
        match value.as_u64() {
            Some(asn) if asn <= u64::from(u32::MAX) => asns.push(asn as u32),
            _ => {
                warn!("cached ASN list for '{as_set}' is malformed, ignoring cache");
                return None;
            }
        }
    }
    Some(asns)
}

pub fn cached_prefixes(state: &StateMap, as_set: &str) -> Option<ResolvedPrefixes> {
    let node = state.get(&["irr", as_set, "prefixes"])?;
    let parse =
        |version: &str| -> Option<Vec<String>> {
            node.get(version)?
                .as_array()?
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect()
        };
    let ipv4 = parse("ipv4")?
        .iter()
        .map(|s| Ipv4Net::from_str(s))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    let ipv6 = parse("ipv6")?
        .iter()
        .map(|s| Ipv6Net::from_str(s))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    Some(ResolvedPrefixes { ipv4, ipv6 })
}

pub fn cached_limits(state: &StateMap, asn: u32) -> Option<PrefixLimits> {
    let asn = asn.to_string();
    let ipv4 = state.get_u64(&["peeringdb", &asn, "ipv4"])?;
    let ipv6 = state.get_u64(&["peeringdb", &asn, "ipv6"])?;
    Some(PrefixLimits {
        ipv4: u32::try_from(ipv4).ok()?,
        ipv6: u32::try_from(ipv6).ok()?,
    })
}

/// Record resolved IRR data into the state written for the next run.
pub fn record_irr(state: &mut StateMap, as_set: &str, asns: &[u32], prefixes: &ResolvedPrefixes) {
    state.set(&["irr", as_set, "asns"], json!(asns));
    state.set(
        &["irr", as_set, "prefixes"],
        json!({
            "ipv4": prefixes.ipv4.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "ipv6": prefixes.ipv6.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }),
    );
}

/// Record resolved prefix limits into the state written for the next run.
pub fn record_limits(state: &mut StateMap, asn: u32, limits: PrefixLimits) {
    let asn = asn.to_string();
    state.set(&["peeringdb", &asn, "ipv4"], json!(limits.ipv4));
    state.set(&["peeringdb", &asn, "ipv6"], json!(limits.ipv6));
}
