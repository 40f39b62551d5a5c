// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! BGP peer types and the option-legality guard.
//!
//! `peer_type` is the discriminant that legalizes or forbids every other
//! policy axis. The per-option role sets live in one declarative table
//! checked by a single guard instead of being restated at every use.

use config::ConfigError;
use std::str::FromStr;
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeerType {
    #[strum(serialize = "customer")]
    Customer,
    #[strum(serialize = "internal")]
    Internal,
    #[strum(serialize = "peer")]
    Peer,
    #[strum(serialize = "routecollector")]
    Routecollector,
    #[strum(serialize = "routeserver")]
    Routeserver,
    #[strum(serialize = "rrclient")]
    Rrclient,
    #[strum(serialize = "rrserver")]
    Rrserver,
    #[strum(serialize = "rrserver-rrserver")]
    RrserverRrserver,
    #[strum(serialize = "transit")]
    Transit,
}

impl PeerType {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        PeerType::from_str(value).map_err(|_| ConfigError::UnknownPeerType(value.to_owned()))
    }

    /// Trusted internal family: iBGP roles.
    pub fn is_internal_family(self) -> bool {
        matches!(
            self,
            PeerType::Internal
                | PeerType::Rrclient
                | PeerType::Rrserver
                | PeerType::RrserverRrserver
        )
    }

    /// External-ish roles that carry a location and cost.
    pub fn is_external(self) -> bool {
        matches!(
            self,
            PeerType::Customer
                | PeerType::Peer
                | PeerType::Routeserver
                | PeerType::Routecollector
                | PeerType::Transit
        )
    }

    /// Receive-only analysis/exchange peers.
    pub fn is_collector(self) -> bool {
        matches!(self, PeerType::Routecollector | PeerType::Routeserver)
    }

    /// Prefix/ASN filters act as allow-lists for these types; deny-lists
    /// for everything else.
    pub fn filters_are_allow_lists(self) -> bool {
        matches!(self, PeerType::Customer | PeerType::Peer | PeerType::Transit)
    }

    /// Requires a route-reflector cluster id to be set globally first.
    pub fn requires_cluster_id(self) -> bool {
        matches!(self, PeerType::Rrclient | PeerType::RrserverRrserver)
    }
}

/// Role sets for validated options.
pub const COST_TYPES: &[PeerType] = &[
    PeerType::Customer,
    PeerType::Peer,
    PeerType::Routeserver,
    PeerType::Transit,
];
pub const LOCATION_TYPES: &[PeerType] = &[
    PeerType::Customer,
    PeerType::Peer,
    PeerType::Routeserver,
    PeerType::Routecollector,
    PeerType::Transit,
];
pub const REPLACE_ASPATH_TYPES: &[PeerType] = &[PeerType::Customer, PeerType::Internal];
pub const BLACKHOLE_COMMUNITY_TYPES: &[PeerType] = &[PeerType::Transit];
pub const DEFAULT_COMMUNITY_TYPES: &[PeerType] = &[
    PeerType::Internal,
    PeerType::Rrclient,
    PeerType::Rrserver,
    PeerType::RrserverRrserver,
    PeerType::Transit,
];

/// The one guard every per-option role check goes through.
pub fn check_option_role(
    peer: &str,
    peer_type: PeerType,
    option: &str,
    allowed: &[PeerType],
) -> Result<(), ConfigError> {
    if allowed.contains(&peer_type) {
        return Ok(());
    }
    Err(ConfigError::OptionNotAllowed {
        peer: peer.to_owned(),
        option: option.to_owned(),
        peer_type: peer_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_nine_types() {
        for name in [
            "customer",
            "internal",
            "peer",
            "routecollector",
            "routeserver",
            "rrclient",
            "rrserver",
            "rrserver-rrserver",
            "transit",
        ] {
            let parsed = PeerType::parse(name).expect("known type");
            assert_eq!(parsed.to_string(), name);
        }
        assert!(matches!(
            PeerType::parse("upstream"),
            Err(ConfigError::UnknownPeerType(_))
        ));
    }

    #[test]
    fn test_role_families() {
        assert!(PeerType::Rrclient.is_internal_family());
        assert!(!PeerType::Transit.is_internal_family());
        assert!(PeerType::Routecollector.is_collector());
        assert!(PeerType::Transit.filters_are_allow_lists());
        assert!(!PeerType::Rrserver.filters_are_allow_lists());
        assert!(PeerType::RrserverRrserver.requires_cluster_id());
        assert!(!PeerType::Rrserver.requires_cluster_id());
    }

    #[test]
    fn test_option_role_guard_message() {
        let err = check_option_role("peer1", PeerType::Rrclient, "cost", COST_TYPES)
            .expect_err("must fail");
        assert_eq!(
            err.to_string(),
            "peer 'peer1': option 'cost' is not supported for peer type 'rrclient'"
        );
        check_option_role("peer1", PeerType::Customer, "cost", COST_TYPES).expect("allowed");
    }
}
