// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Route classes: the closed set of axes a BGP policy can key on.
//!
//! Redistribute flags, accept flags, community tagging and AS-PATH
//! prepending are all keyed by route class, and every "walk all classes"
//! loop in the compiler iterates [`RouteClass::ALL`] so the emitted
//! order is identical everywhere.

use config::ConfigError;
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, PartialOrd, Ord)]
#[strum(serialize_all = "snake_case")]
pub enum RouteClass {
    Connected,
    Kernel,
    KernelBlackhole,
    KernelDefault,
    Static,
    StaticBlackhole,
    StaticDefault,
    Originated,
    OriginatedDefault,
    BgpOwn,
    BgpOwnBlackhole,
    BgpOwnDefault,
    BgpCustomer,
    BgpCustomerBlackhole,
    BgpPeering,
    BgpTransit,
    BgpTransitDefault,
}

impl RouteClass {
    /// Canonical enumeration order for every per-class walk.
    pub const ALL: &'static [RouteClass] = &[
        RouteClass::Connected,
        RouteClass::Kernel,
        RouteClass::KernelBlackhole,
        RouteClass::KernelDefault,
        RouteClass::Static,
        RouteClass::StaticBlackhole,
        RouteClass::StaticDefault,
        RouteClass::Originated,
        RouteClass::OriginatedDefault,
        RouteClass::BgpOwn,
        RouteClass::BgpOwnBlackhole,
        RouteClass::BgpOwnDefault,
        RouteClass::BgpCustomer,
        RouteClass::BgpCustomerBlackhole,
        RouteClass::BgpPeering,
        RouteClass::BgpTransit,
        RouteClass::BgpTransitDefault,
    ];

    pub fn parse(key: &str) -> Result<Self, ConfigError> {
        RouteClass::from_str(key).map_err(|_| ConfigError::UnknownRouteClass(key.to_owned()))
    }

    pub fn is_default(self) -> bool {
        matches!(
            self,
            RouteClass::KernelDefault
                | RouteClass::StaticDefault
                | RouteClass::OriginatedDefault
                | RouteClass::BgpOwnDefault
                | RouteClass::BgpTransitDefault
        )
    }

    pub fn is_blackhole(self) -> bool {
        matches!(
            self,
            RouteClass::KernelBlackhole
                | RouteClass::StaticBlackhole
                | RouteClass::BgpOwnBlackhole
                | RouteClass::BgpCustomerBlackhole
        )
    }

    pub fn is_bgp(self) -> bool {
        matches!(
            self,
            RouteClass::BgpOwn
                | RouteClass::BgpOwnBlackhole
                | RouteClass::BgpOwnDefault
                | RouteClass::BgpCustomer
                | RouteClass::BgpCustomerBlackhole
                | RouteClass::BgpPeering
                | RouteClass::BgpTransit
                | RouteClass::BgpTransitDefault
        )
    }
}

/// Per-class boolean flags (redistribute / accept axes). BTreeMap keyed
/// by the enum keeps iteration in canonical class order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassFlags {
    flags: BTreeMap<RouteClass, bool>,
}

impl ClassFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, class: RouteClass, value: bool) -> Self {
        self.set(class, value);
        self
    }

    pub fn set(&mut self, class: RouteClass, value: bool) {
        self.flags.insert(class, value);
    }

    /// True iff the class was explicitly set to true.
    pub fn enabled(&self, class: RouteClass) -> bool {
        self.flags.get(&class).copied().unwrap_or(false)
    }

    pub fn is_set(&self, class: RouteClass) -> bool {
        self.flags.contains_key(&class)
    }

    pub fn iter_enabled(&self) -> impl Iterator<Item = RouteClass> + '_ {
        self.flags
            .iter()
            .filter(|(_, v)| **v)
            .map(|(class, _)| *class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snake_case_keys() {
        assert_eq!(
            RouteClass::parse("bgp_customer_blackhole").expect("parse"),
            RouteClass::BgpCustomerBlackhole
        );
        assert_eq!(RouteClass::parse("connected").expect("parse"), RouteClass::Connected);
        assert!(RouteClass::parse("bgp_nonsense").is_err());
    }

    #[test]
    fn test_display_matches_keys() {
        assert_eq!(RouteClass::KernelBlackhole.to_string(), "kernel_blackhole");
        assert_eq!(RouteClass::BgpOwnDefault.to_string(), "bgp_own_default");
    }

    #[test]
    fn test_class_flags_iterate_in_canonical_order() {
        let mut flags = ClassFlags::new();
        flags.set(RouteClass::BgpTransit, true);
        flags.set(RouteClass::Connected, true);
        flags.set(RouteClass::Static, false);
        let enabled: Vec<_> = flags.iter_enabled().collect();
        assert_eq!(enabled, vec![RouteClass::Connected, RouteClass::BgpTransit]);
    }

    #[test]
    fn test_classification_helpers() {
        assert!(RouteClass::StaticDefault.is_default());
        assert!(RouteClass::BgpCustomerBlackhole.is_blackhole());
        assert!(RouteClass::BgpPeering.is_bgp());
        assert!(!RouteClass::Connected.is_bgp());
    }
}
