// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Change-magnitude guard for externally resolved data.
//!
//! A newly resolved value that more than doubles or more than halves
//! against the cached previous value aborts the build. Prefix lists are
//! compared by network count, normalized into /24 (IPv4) and /48 (IPv6)
//! blocks so aggregation changes do not trip the guard.

use crate::ResolvedPrefixes;
use config::ConfigError;
use ipnet::{Ipv4Net, Ipv6Net};

/// True iff `current` is beyond (2x previous, previous/2). The
/// boundaries themselves pass: exactly 2N and exactly N/2 are fine.
pub fn deviation_exceeded(previous: u64, current: u64) -> bool {
    current > previous.saturating_mul(2) || current.saturating_mul(2) < previous
}

/// Apply the guard, producing the standard fatal error.
pub fn check_deviation(
    peer: &str,
    what: &str,
    previous: Option<u64>,
    current: u64,
) -> Result<(), ConfigError> {
    match previous {
        Some(previous) if deviation_exceeded(previous, current) => {
            Err(ConfigError::DeviationExceeded {
                peer: peer.to_owned(),
                what: what.to_owned(),
                previous,
                current,
            })
        }
        _ => Ok(()),
    }
}

/// Number of /24 blocks covered by an IPv4 prefix.
pub fn blocks_v4(net: &Ipv4Net) -> u64 {
    let len = net.prefix_len();
    if len >= 24 { 1 } else { 1u64 << (24 - len) }
}

/// Number of /48 blocks covered by an IPv6 prefix.
pub fn blocks_v6(net: &Ipv6Net) -> u64 {
    let len = net.prefix_len();
    if len >= 48 { 1 } else { 1u64 << (48 - len) }
}

/// Normalized network counts for a resolved prefix set, per IP version.
pub fn network_counts(prefixes: &ResolvedPrefixes) -> (u64, u64) {
    let v4 = prefixes.ipv4.iter().map(blocks_v4).sum();
    let v6 = prefixes.ipv6.iter().map(blocks_v6).sum();
    (v4, v6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_guard_boundaries() {
        /* exactly 2N and exactly N/2 must pass */
        assert!(!deviation_exceeded(100, 200));
        assert!(!deviation_exceeded(100, 50));
        assert!(deviation_exceeded(100, 201));
        assert!(deviation_exceeded(100, 49));
        /* odd previous: floor(N/2) passes, anything below raises */
        assert!(!deviation_exceeded(5, 3));
        assert!(deviation_exceeded(5, 2));
    }

    #[test]
    fn test_check_deviation_no_previous() {
        assert!(check_deviation("peer1", "prefix limit", None, 1_000_000).is_ok());
        let err = check_deviation("peer1", "prefix limit", Some(10), 21).expect_err("must raise");
        assert!(matches!(err, ConfigError::DeviationExceeded { .. }));
    }

    #[test]
    fn test_block_counting() {
        let v4 = Ipv4Net::from_str("100.101.0.0/22").expect("Bad prefix");
        assert_eq!(blocks_v4(&v4), 4);
        let v4_long = Ipv4Net::from_str("100.101.0.0/28").expect("Bad prefix");
        assert_eq!(blocks_v4(&v4_long), 1);

        let v6 = Ipv6Net::from_str("2001:db8::/44").expect("Bad prefix");
        assert_eq!(blocks_v6(&v6), 16);
        let v6_long = Ipv6Net::from_str("2001:db8::/64").expect("Bad prefix");
        assert_eq!(blocks_v6(&v6_long), 1);
    }
}
