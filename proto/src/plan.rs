// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! The network plan: declarative intent records as loaded from the plan
//! file. These are plain data; all cross-field validation happens when
//! the protocol sections compile them.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use ordermap::OrderMap;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkPlan {
    pub router_id: Ipv4Addr,
    #[serde(default)]
    pub bgp: Option<BgpPlan>,
    #[serde(default)]
    pub ospf: Option<OspfPlan>,
    #[serde(default)]
    pub rip: Option<RipPlan>,
    #[serde(default)]
    pub static_routes: Vec<StaticRoute>,
    #[serde(default)]
    pub kernel: KernelPlan,
    #[serde(default)]
    pub direct: Option<DirectPlan>,
    #[serde(default)]
    pub rpki: Option<RpkiPlan>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BgpPlan {
    /// Local ASN.
    pub asn: u32,
    /// Route-reflector cluster id; must be set before any rrclient /
    /// rrserver-rrserver peer is defined.
    #[serde(default)]
    pub cluster_id: Option<Ipv4Addr>,
    /// Build-wide graceful-shutdown default, overridable per peer and
    /// from previous-run state directives.
    #[serde(default)]
    pub graceful_shutdown: bool,
    /// Build-wide quarantine default, same precedence.
    #[serde(default)]
    pub quarantine: bool,
    /// Prefixes originated by this router into BGP.
    #[serde(default)]
    pub originate4: Vec<Ipv4Net>,
    #[serde(default)]
    pub originate6: Vec<Ipv6Net>,
    #[serde(default)]
    pub peers: OrderMap<String, BgpPeerConfig>,
}

/// Raw per-peer record. `peer_type` legalizes or forbids every other
/// axis; the peer compiler enforces that at construction.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BgpPeerConfig {
    pub description: Option<String>,
    pub peer_type: String,
    pub asn: Option<u32>,

    /* network attachment, per IP version */
    pub neighbor4: Option<Ipv4Addr>,
    pub neighbor6: Option<Ipv6Addr>,
    pub source_address4: Option<Ipv4Addr>,
    pub source_address6: Option<Ipv6Addr>,

    /* protocol tunables */
    pub connect_retry_time: Option<u16>,
    pub connect_delay_time: Option<u16>,
    pub error_wait_time: Option<u16>,
    pub multihop: Option<u8>,
    pub ttl_security: Option<bool>,
    pub password: Option<String>,
    pub passive: Option<bool>,
    pub add_paths: Option<bool>,

    /* prefix limits; PeeringDB-resolved for customer/peer when absent */
    pub prefix_limit4: Option<u32>,
    pub prefix_limit6: Option<u32>,

    pub quarantine: Option<bool>,
    pub graceful_shutdown: Option<bool>,

    /// Local-preference offset, external-ish peers only.
    pub cost: Option<i16>,
    /// ISO-3166 numeric location tag, external-ish peers only.
    pub location: Option<u32>,
    /// Replace the peer's private AS-PATH with our own ASN.
    pub replace_aspath: bool,
    /// Large-community tags a transit peer must carry for targeted
    /// blackholes to be honored.
    pub blackhole_community: Vec<String>,

    /* per-route-class policy, keyed by route-class name */
    pub redistribute: OrderMap<String, bool>,
    pub accept: OrderMap<String, bool>,
    pub prepend: OrderMap<String, u8>,
    pub communities: OrderMap<String, Vec<String>>,
    pub large_communities: OrderMap<String, Vec<String>>,

    /* tagging applied to routes received from this peer */
    pub incoming_communities: Vec<String>,
    pub incoming_large_communities: Vec<String>,
    pub local_preference: Option<u32>,

    pub import_filter: FilterSpec,
    pub import_filter_deny: FilterSpec,
    pub export_filter: FilterSpec,

    pub constraints: ConstraintOverrides,
}

/// Prefix/ASN/AS-SET filter lists. Allow-list or deny-list semantics
/// depend on the peer type consuming them.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSpec {
    pub as_sets: Vec<String>,
    pub prefixes: Vec<IpNet>,
    pub origin_asns: Vec<u32>,
    pub peer_asns: Vec<u32>,
}

/// Prefix-length constraint overrides; defaults depend on peer type and
/// route class (normal vs blackhole).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConstraintOverrides {
    pub import_maxlen4: Option<u8>,
    pub import_minlen4: Option<u8>,
    pub import_maxlen6: Option<u8>,
    pub import_minlen6: Option<u8>,
    pub blackhole_import_maxlen4: Option<u8>,
    pub blackhole_import_minlen4: Option<u8>,
    pub blackhole_import_maxlen6: Option<u8>,
    pub blackhole_import_minlen6: Option<u8>,
    pub aspath_import_maxlen: Option<u8>,
    pub aspath_import_minlen: Option<u8>,
    pub community_import_maxlen: Option<u8>,
    pub large_community_import_maxlen: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OspfPlan {
    #[serde(default = "default_true")]
    pub v4: bool,
    #[serde(default = "default_true")]
    pub v6: bool,
    #[serde(default)]
    pub areas: OrderMap<String, OspfAreaConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OspfAreaConfig {
    pub stub: bool,
    pub interfaces: OrderMap<String, OspfInterfaceConfig>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OspfInterfaceConfig {
    pub cost: Option<u16>,
    pub ecmp_weight: Option<u16>,
    pub hello_time: Option<u16>,
    pub wait_time: Option<u16>,
    pub stub: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RipPlan {
    pub redistribute_connected: bool,
    pub redistribute_static: bool,
    pub redistribute_kernel: bool,
    pub interfaces: OrderMap<String, RipInterfaceConfig>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RipInterfaceConfig {
    pub metric: Option<u8>,
    pub update_time: Option<u16>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticRoute {
    pub prefix: IpNet,
    #[serde(default)]
    pub nexthop: Option<IpAddr>,
    #[serde(default)]
    pub blackhole: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelPlan {
    /// Export routes to the kernel table.
    pub export: bool,
    /// Learn routes already present in the kernel table.
    pub learn: bool,
    /// Keep routes installed across daemon restarts.
    pub persist: bool,
}

impl Default for KernelPlan {
    fn default() -> Self {
        Self {
            export: true,
            learn: false,
            persist: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectPlan {
    pub interfaces: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpkiPlan {
    pub host: String,
    #[serde(default = "default_rtr_port")]
    pub port: u16,
    #[serde(default = "default_rtr_refresh")]
    pub refresh: u16,
}

fn default_true() -> bool {
    true
}
fn default_rtr_port() -> u16 {
    323
}
fn default_rtr_refresh() -> u16 {
    900
}
