// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Derived-name construction for tables, filters, pipes and protocols.
//!
//! Table names carry the internal `t_` prefix plus an IP-version suffix;
//! filter and protocol names are built from the *stripped* table names,
//! with the prefix re-added only on `table` / `peer table` lines.

/// Internal table-name prefix, stripped for name construction.
pub const TABLE_PREFIX: &str = "t_";

/// IP version of a rendered table / filter / protocol stanza.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub const BOTH: &'static [IpVersion] = &[IpVersion::V4, IpVersion::V6];

    /// Suffix appended to versioned names ("4" / "6").
    pub fn suffix(self) -> &'static str {
        match self {
            IpVersion::V4 => "4",
            IpVersion::V6 => "6",
        }
    }

    /// BIRD channel keyword ("ipv4" / "ipv6").
    pub fn channel(self) -> &'static str {
        match self {
            IpVersion::V4 => "ipv4",
            IpVersion::V6 => "ipv6",
        }
    }
}

/// Strip the internal table prefix for name construction.
pub fn strip_table(name: &str) -> &str {
    name.strip_prefix(TABLE_PREFIX).unwrap_or(name)
}

/// Full table name for a stripped base, e.g. `bgp` -> `t_bgp4`. The
/// daemon's built-in master tables keep their fixed names.
pub fn table_name(base: &str, version: IpVersion) -> String {
    if base == "master" {
        return format!("master{}", version.suffix());
    }
    format!("{TABLE_PREFIX}{base}{}", version.suffix())
}

/// Peer names may carry hyphens; symbol names may not.
pub fn peer_symbol(peer: &str) -> String {
    peer.replace('-', "_")
}

/// Peer-specific table base: `bgp_AS65001_peerX`.
pub fn peer_table_base(asn: u32, peer: &str) -> String {
    format!("bgp_AS{asn}_{}", peer_symbol(peer))
}

/// Versioned filter name shared by pipe wiring and the peer compiler.
pub fn filter_name(src: &str, dst: &str, direction: &str, version: Option<IpVersion>) -> String {
    let suffix = version.map(IpVersion::suffix).unwrap_or("");
    format!("f_{}_{}_{direction}{suffix}", strip_table(src), strip_table(dst))
}

/// Pipe protocol name between two tables.
pub fn pipe_name(src: &str, dst: &str, version: IpVersion) -> String {
    format!("p_{}_{}{}", strip_table(src), strip_table(dst), version.suffix())
}

/// BGP protocol stanza name for a peer.
pub fn bgp_protocol_name(asn: u32, peer: &str, version: IpVersion) -> String {
    format!("p_AS{asn}_{}{}", peer_symbol(peer), version.suffix())
}
