// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! The reasons why we may reject a network plan.
//!
//! Every failure is fatal to the whole build: a half-valid routing
//! configuration is worse than no configuration change, so nothing is
//! caught and recovered internally. Messages name the offending entity
//! and option so the operator can find them among many peers.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An option was set on a peer whose type does not support it.
    #[error("peer '{peer}': option '{option}' is not supported for peer type '{peer_type}'")]
    OptionNotAllowed {
        peer: String,
        option: String,
        peer_type: String,
    },

    /// Self-contradictory peer configuration.
    #[error("peer '{peer}': {reason}")]
    InvalidPeer { peer: String, reason: String },

    /// Self-contradictory OSPF area configuration.
    #[error("OSPF area '{area}': {reason}")]
    InvalidArea { area: String, reason: String },

    /// Self-contradictory interface configuration (OSPF/RIP/Direct).
    #[error("interface '{interface}': {reason}")]
    InvalidInterface { interface: String, reason: String },

    #[error("'{0}' is not a valid BGP peer type")]
    UnknownPeerType(String),

    #[error("'{0}' is not a valid route class")]
    UnknownRouteClass(String),

    /// Resolved external data deviates more than 2x from the cached
    /// previous value. Catches IRR/PeeringDB glitches and fat-fingered
    /// config changes before they halve or double an acceptance policy.
    #[error(
        "peer '{peer}': {what} changed from {previous} to {current}, \
         more than 2x difference (set the matching ignore flag to override)"
    )]
    DeviationExceeded {
        peer: String,
        what: String,
        previous: u64,
        current: u64,
    },

    /// A named entity was referenced but never defined.
    #[error("no such {kind} '{name}'")]
    NotFound { kind: String, name: String },

    /// Defect in the generator itself, not in user input.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl ConfigError {
    pub fn invalid_peer(peer: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidPeer {
            peer: peer.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        ConfigError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }
}
