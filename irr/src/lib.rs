// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! External data sources: IRR AS-SET resolution and PeeringDB prefix
//! limits.
//!
//! Both are consumed as pure functions behind traits; the real network
//! clients live outside this workspace. [`cache`] layers previous-run
//! state on top so builds can run offline (`use_cached`), and [`guard`]
//! implements the 2x change-magnitude check applied to everything these
//! sources return.

pub mod cache;
pub mod guard;

use config::ConfigError;
use ipnet::{Ipv4Net, Ipv6Net};
use std::collections::HashMap;

/// Prefixes delegated to an AS-SET, per IP version.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedPrefixes {
    pub ipv4: Vec<Ipv4Net>,
    pub ipv6: Vec<Ipv6Net>,
}

impl ResolvedPrefixes {
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }
}

/// Session prefix limits as published in PeeringDB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrefixLimits {
    pub ipv4: u32,
    pub ipv6: u32,
}

/// Internet Routing Registry resolver.
pub trait IrrSource {
    fn resolve_asns(&self, as_set: &str) -> Result<Vec<u32>, ConfigError>;
    fn resolve_prefixes(&self, as_set: &str) -> Result<ResolvedPrefixes, ConfigError>;
}

/// PeeringDB-style prefix-limit lookup.
pub trait PrefixLimitSource {
    fn prefix_limits(&self, asn: u32) -> Result<PrefixLimits, ConfigError>;
}

/// Fixed-answer IRR source for tests and offline builds.
#[derive(Debug, Default)]
pub struct StaticIrr {
    asns: HashMap<String, Vec<u32>>,
    prefixes: HashMap<String, ResolvedPrefixes>,
}

impl StaticIrr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asns(mut self, as_set: &str, asns: Vec<u32>) -> Self {
        self.asns.insert(as_set.to_owned(), asns);
        self
    }

    pub fn with_prefixes(mut self, as_set: &str, prefixes: ResolvedPrefixes) -> Self {
        self.prefixes.insert(as_set.to_owned(), prefixes);
        self
    }
}

impl IrrSource for StaticIrr {
    fn resolve_asns(&self, as_set: &str) -> Result<Vec<u32>, ConfigError> {
        self.asns
            .get(as_set)
            .cloned()
            .ok_or_else(|| ConfigError::not_found("AS-SET", as_set))
    }

    fn resolve_prefixes(&self, as_set: &str) -> Result<ResolvedPrefixes, ConfigError> {
        self.prefixes
            .get(as_set)
            .cloned()
            .ok_or_else(|| ConfigError::not_found("AS-SET", as_set))
    }
}

/// Fixed-answer prefix-limit source for tests and offline builds.
#[derive(Debug, Default)]
pub struct StaticLimits {
    limits: HashMap<u32, PrefixLimits>,
}

impl StaticLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, asn: u32, limits: PrefixLimits) -> Self {
        self.limits.insert(asn, limits);
        self
    }
}

impl PrefixLimitSource for StaticLimits {
    fn prefix_limits(&self, asn: u32) -> Result<PrefixLimits, ConfigError> {
        self.limits
            .get(&asn)
            .copied()
            .ok_or_else(|| ConfigError::not_found("PeeringDB ASN", asn.to_string()))
    }
}
