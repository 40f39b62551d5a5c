// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! The BGP peer compiler.
//!
//! `try_new` runs the validation gates in a fixed order; any failure
//! aborts the whole build. `emit` then produces the peer's tables,
//! constants, the four filters and the protocol stanzas, in an order
//! that never changes between runs.

use crate::bgp::peertype::{
    BLACKHOLE_COMMUNITY_TYPES, COST_TYPES, DEFAULT_COMMUNITY_TYPES, LOCATION_TYPES, PeerType,
    REPLACE_ASPATH_TYPES, check_option_role,
};
use crate::bgp::templates;
use crate::filters;
use crate::names::{IpVersion, bgp_protocol_name, filter_name, peer_table_base};
use crate::pipe::{Pipe, PipeFilter};
use crate::plan::{BgpPeerConfig, BgpPlan, FilterSpec};
use crate::routeclass::{ClassFlags, RouteClass};
use crate::{BuildContext, bgp};
use config::ConfigError;
use doc::ConfigDoc;
use functions::FunctionRegistry;
use ipnet::IpNet;
use irr::cache::{cached_limits, cached_prefixes, record_irr, record_limits};
use irr::guard::{check_deviation, network_counts};
use serde_json::json;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::debug;

const ADD_PATHS_TYPES: &[PeerType] = &[
    PeerType::Internal,
    PeerType::Rrclient,
    PeerType::Rrserver,
    PeerType::RrserverRrserver,
];

/// Prefix/AS-PATH/community size bounds applied on import.
#[derive(Clone, Copy, Debug)]
struct Bounds {
    minlen4: u8,
    maxlen4: u8,
    minlen6: u8,
    maxlen6: u8,
    blackhole_minlen4: u8,
    blackhole_maxlen4: u8,
    blackhole_minlen6: u8,
    blackhole_maxlen6: u8,
    aspath_minlen: u8,
    aspath_maxlen: u8,
    community_maxlen: u8,
    large_community_maxlen: u8,
}

impl Bounds {
    fn defaults(peer_type: PeerType) -> Self {
        let (minlen4, maxlen4, minlen6, maxlen6) = if peer_type.is_internal_family() {
            (4, 32, 8, 128)
        } else {
            (8, 24, 16, 48)
        };
        Self {
            minlen4,
            maxlen4,
            minlen6,
            maxlen6,
            blackhole_minlen4: 24,
            blackhole_maxlen4: 32,
            blackhole_minlen6: 64,
            blackhole_maxlen6: 128,
            aspath_minlen: 1,
            aspath_maxlen: 100,
            community_maxlen: 100,
            large_community_maxlen: 100,
        }
    }

    fn apply(mut self, overrides: &crate::plan::ConstraintOverrides) -> Self {
        if let Some(v) = overrides.import_minlen4 {
            self.minlen4 = v;
        }
        if let Some(v) = overrides.import_maxlen4 {
            self.maxlen4 = v;
        }
        if let Some(v) = overrides.import_minlen6 {
            self.minlen6 = v;
        }
        if let Some(v) = overrides.import_maxlen6 {
            self.maxlen6 = v;
        }
        if let Some(v) = overrides.blackhole_import_minlen4 {
            self.blackhole_minlen4 = v;
        }
        if let Some(v) = overrides.blackhole_import_maxlen4 {
            self.blackhole_maxlen4 = v;
        }
        if let Some(v) = overrides.blackhole_import_minlen6 {
            self.blackhole_minlen6 = v;
        }
        if let Some(v) = overrides.blackhole_import_maxlen6 {
            self.blackhole_maxlen6 = v;
        }
        if let Some(v) = overrides.aspath_import_minlen {
            self.aspath_minlen = v;
        }
        if let Some(v) = overrides.aspath_import_maxlen {
            self.aspath_maxlen = v;
        }
        if let Some(v) = overrides.community_import_maxlen {
            self.community_maxlen = v;
        }
        if let Some(v) = overrides.large_community_import_maxlen {
            self.large_community_maxlen = v;
        }
        self
    }
}

/// One resolved allow or deny list: statically configured entries plus
/// IRR-resolved entries, with a note per contributing batch.
#[derive(Clone, Debug, Default)]
struct ListSet {
    origin_asns: Vec<u32>,
    prefixes4: Vec<String>,
    prefixes6: Vec<String>,
    notes: Vec<String>,
}

impl ListSet {
    fn has_prefixes(&self) -> bool {
        !self.prefixes4.is_empty() || !self.prefixes6.is_empty()
    }
}

#[derive(Debug)]
pub struct BgpPeer {
    name: String,
    peer_type: PeerType,
    asn: u32,
    local_asn: u32,
    cluster_id: Option<std::net::Ipv4Addr>,
    versions: Vec<IpVersion>,
    config: BgpPeerConfig,
    table_base: String,
    redistribute: ClassFlags,
    accept: ClassFlags,
    prepend: BTreeMap<RouteClass, u8>,
    communities: BTreeMap<RouteClass, Vec<String>>,
    large_communities: BTreeMap<RouteClass, Vec<String>>,
    incoming_communities: Vec<String>,
    incoming_large_communities: Vec<String>,
    blackhole_targets: Vec<String>,
    graceful_shutdown: bool,
    quarantine: bool,
    passive: bool,
    prefix_limit4: Option<u32>,
    prefix_limit6: Option<u32>,
    allow: ListSet,
    deny: ListSet,
    export: ListSet,
    peer_asns: Vec<u32>,
    bounds: Bounds,
}

impl BgpPeer {
    pub fn try_new(
        name: &str,
        config: &BgpPeerConfig,
        plan: &BgpPlan,
        ctx: &mut BuildContext,
    ) -> Result<Self, ConfigError> {
        /* gate 1: known type, usable name */
        let peer_type = PeerType::parse(&config.peer_type)?;
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::invalid_peer(
                name,
                "peer name may only contain letters, digits, underscores and hyphens",
            ));
        }

        /* gate 2: route-reflector roles need a cluster id first */
        if peer_type.requires_cluster_id() && plan.cluster_id.is_none() {
            return Err(ConfigError::invalid_peer(
                name,
                format!("peer type '{peer_type}' requires a route-reflector cluster_id"),
            ));
        }

        /* gate 3: ASN presence and internal equality */
        let asn = config
            .asn
            .ok_or_else(|| ConfigError::invalid_peer(name, "option 'asn' is required"))?;
        if peer_type.is_internal_family() && asn != plan.asn && !config.replace_aspath {
            return Err(ConfigError::invalid_peer(
                name,
                format!(
                    "peer ASN {asn} does not match local ASN {} for peer type '{peer_type}'",
                    plan.asn
                ),
            ));
        }

        /* gate 4: replace_aspath role and private-ASN requirement */
        if config.replace_aspath {
            check_option_role(name, peer_type, "replace_aspath", REPLACE_ASPATH_TYPES)?;
            if !ctx.globals.is_private_asn(asn) {
                return Err(ConfigError::invalid_peer(
                    name,
                    format!("option 'replace_aspath' requires a private peer ASN, got {asn}"),
                ));
            }
        }

        /* gate 5: location tagging */
        if config.location.is_some() {
            check_option_role(name, peer_type, "location", LOCATION_TYPES)?;
        }

        /* gate 6: neighbor/source pairing per IP version */
        let mut versions = Vec::new();
        if config.neighbor4.is_some() != config.source_address4.is_some() {
            return Err(ConfigError::invalid_peer(
                name,
                "options 'neighbor4' and 'source_address4' must be set together",
            ));
        }
        if config.neighbor6.is_some() != config.source_address6.is_some() {
            return Err(ConfigError::invalid_peer(
                name,
                "options 'neighbor6' and 'source_address6' must be set together",
            ));
        }
        if config.neighbor4.is_some() {
            versions.push(IpVersion::V4);
        }
        if config.neighbor6.is_some() {
            versions.push(IpVersion::V6);
        }
        if versions.is_empty() {
            return Err(ConfigError::invalid_peer(
                name,
                "at least one of 'neighbor4' and 'neighbor6' is required",
            ));
        }

        /* gate 7: cost and blackhole targeting roles */
        if config.cost.is_some() {
            check_option_role(name, peer_type, "cost", COST_TYPES)?;
        }
        let mut blackhole_targets = Vec::new();
        if !config.blackhole_community.is_empty() {
            check_option_role(name, peer_type, "blackhole_community", BLACKHOLE_COMMUNITY_TYPES)?;
            for raw in &config.blackhole_community {
                blackhole_targets.push(parse_large_community(name, raw)?);
            }
        }
        if config.add_paths.is_some() {
            check_option_role(name, peer_type, "add_paths", ADD_PATHS_TYPES)?;
        }

        /* gate 8: community axes keyed by route class */
        let mut communities = BTreeMap::new();
        for (key, values) in &config.communities {
            let class = RouteClass::parse(key)?;
            if class.is_default() {
                check_option_role(
                    name,
                    peer_type,
                    &format!("communities.{class}"),
                    DEFAULT_COMMUNITY_TYPES,
                )?;
            }
            let parsed: Result<Vec<_>, _> =
                values.iter().map(|raw| parse_community(name, raw)).collect();
            communities.insert(class, parsed?);
        }
        let mut large_communities = BTreeMap::new();
        for (key, values) in &config.large_communities {
            let class = RouteClass::parse(key)?;
            if class.is_default() {
                check_option_role(
                    name,
                    peer_type,
                    &format!("large_communities.{class}"),
                    DEFAULT_COMMUNITY_TYPES,
                )?;
            }
            let parsed: Result<Vec<_>, _> = values
                .iter()
                .map(|raw| parse_large_community(name, raw))
                .collect();
            large_communities.insert(class, parsed?);
        }
        let incoming_communities: Result<Vec<_>, _> = config
            .incoming_communities
            .iter()
            .map(|raw| parse_community(name, raw))
            .collect();
        let incoming_large_communities: Result<Vec<_>, _> = config
            .incoming_large_communities
            .iter()
            .map(|raw| parse_large_community(name, raw))
            .collect();

        let mut prepend = BTreeMap::new();
        for (key, count) in &config.prepend {
            let class = RouteClass::parse(key)?;
            if !(1..=10).contains(count) {
                return Err(ConfigError::invalid_peer(
                    name,
                    format!("prepend count for '{class}' must be between 1 and 10, got {count}"),
                ));
            }
            if peer_type.is_collector() && (class.is_default() || class.is_blackhole()) {
                return Err(ConfigError::OptionNotAllowed {
                    peer: name.to_owned(),
                    option: format!("prepend.{class}"),
                    peer_type: peer_type.to_string(),
                });
            }
            prepend.insert(class, *count);
        }

        /* gate 9: redistribute defaults per family, forbidden combos */
        let mut redistribute = default_redistribute(peer_type);
        for (key, value) in &config.redistribute {
            redistribute.set(RouteClass::parse(key)?, *value);
        }
        for class in RouteClass::ALL {
            if !redistribute.enabled(*class) {
                continue;
            }
            if class.is_blackhole()
                && !peer_type.is_internal_family()
                && peer_type != PeerType::Transit
            {
                return Err(ConfigError::invalid_peer(
                    name,
                    format!("redistributing '{class}' to peer type '{peer_type}' is not supported"),
                ));
            }
        }
        if redistribute.enabled(RouteClass::BgpCustomerBlackhole)
            && !redistribute.enabled(RouteClass::BgpCustomer)
        {
            return Err(ConfigError::invalid_peer(
                name,
                "redistributing 'bgp_customer_blackhole' requires 'bgp_customer'",
            ));
        }

        let mut accept = ClassFlags::new();
        for (key, value) in &config.accept {
            let class = RouteClass::parse(key)?;
            let legal = matches!(
                (class, peer_type),
                (RouteClass::BgpCustomerBlackhole, PeerType::Customer)
                    | (RouteClass::BgpOwnBlackhole, _)
                    | (RouteClass::BgpOwnDefault, _)
                    | (RouteClass::BgpTransitDefault, PeerType::Transit)
            ) && match class {
                RouteClass::BgpOwnBlackhole | RouteClass::BgpOwnDefault => {
                    peer_type.is_internal_family()
                }
                _ => true,
            };
            if !legal {
                return Err(ConfigError::OptionNotAllowed {
                    peer: name.to_owned(),
                    option: format!("accept.{class}"),
                    peer_type: peer_type.to_string(),
                });
            }
            accept.set(class, *value);
        }
        if accept.enabled(RouteClass::BgpCustomerBlackhole)
            && config.import_filter.as_sets.is_empty()
            && config.import_filter.prefixes.is_empty()
        {
            return Err(ConfigError::invalid_peer(
                name,
                "accepting 'bgp_customer_blackhole' requires a prefix or AS-SET import filter",
            ));
        }

        /* gate 10: prefix limits, PeeringDB-resolved for customer/peer */
        let mut prefix_limit4 = config.prefix_limit4;
        let mut prefix_limit6 = config.prefix_limit6;
        if matches!(peer_type, PeerType::Customer | PeerType::Peer)
            && (prefix_limit4.is_none() || prefix_limit6.is_none())
        {
            let limits = ctx.limits().prefix_limits(asn)?;
            if !ctx.globals.ignore_peeringdb_changes {
                let previous = cached_limits(ctx.previous, asn);
                check_deviation(
                    name,
                    "IPv4 prefix limit",
                    previous.map(|p| u64::from(p.ipv4)),
                    u64::from(limits.ipv4),
                )?;
                check_deviation(
                    name,
                    "IPv6 prefix limit",
                    previous.map(|p| u64::from(p.ipv6)),
                    u64::from(limits.ipv6),
                )?;
            }
            record_limits(&mut ctx.state, asn, limits);
            prefix_limit4 = prefix_limit4.or(Some(limits.ipv4)).filter(|v| *v > 0);
            prefix_limit6 = prefix_limit6.or(Some(limits.ipv6)).filter(|v| *v > 0);
            debug!("peer '{name}': prefix limits {prefix_limit4:?}/{prefix_limit6:?} via PeeringDB");
        }

        /* gate 11: AS-SET resolution with the network-count guard.
         * Filters act as allow-lists for customer/peer/transit and as
         * deny-lists for everything else. */
        let resolved = resolve_filter_spec(name, &config.import_filter, ctx)?;
        let (mut allow, mut deny) = if peer_type.filters_are_allow_lists() {
            (resolved, ListSet::default())
        } else {
            (ListSet::default(), resolved)
        };
        let deny_overlay = resolve_filter_spec(name, &config.import_filter_deny, ctx)?;
        merge_lists(&mut deny, deny_overlay);
        let export = resolve_filter_spec(name, &config.export_filter, ctx)?;
        normalize_lists(&mut allow);
        normalize_lists(&mut deny);

        let mut peer_asns = config.import_filter.peer_asns.clone();
        peer_asns.sort_unstable();
        peer_asns.dedup();

        /* gate 12: graceful-shutdown / quarantine precedence */
        let graceful_shutdown = effective_toggle(
            ctx,
            name,
            "+graceful_shutdown",
            config.graceful_shutdown,
            plan.graceful_shutdown,
        );
        let quarantine =
            effective_toggle(ctx, name, "+quarantine", config.quarantine, plan.quarantine);

        let passive = config
            .passive
            .unwrap_or(matches!(peer_type, PeerType::Customer | PeerType::Rrclient));
        let bounds = Bounds::defaults(peer_type).apply(&config.constraints);

        Ok(Self {
            name: name.to_owned(),
            peer_type,
            asn,
            local_asn: plan.asn,
            cluster_id: plan.cluster_id,
            versions,
            config: config.clone(),
            table_base: peer_table_base(asn, name),
            redistribute,
            accept,
            prepend,
            communities,
            large_communities,
            incoming_communities: incoming_communities?,
            incoming_large_communities: incoming_large_communities?,
            blackhole_targets,
            graceful_shutdown,
            quarantine,
            passive,
            prefix_limit4,
            prefix_limit6,
            allow,
            deny,
            export,
            peer_asns,
            bounds,
        })
    }

    fn accepts_blackholes(&self) -> bool {
        match self.peer_type {
            PeerType::Customer => self.accept.enabled(RouteClass::BgpCustomerBlackhole),
            _ if self.peer_type.is_internal_family() => {
                self.accept.enabled(RouteClass::BgpOwnBlackhole)
            }
            _ => false,
        }
    }

    fn accepts_default(&self) -> bool {
        match self.peer_type {
            PeerType::Transit => self.accept.enabled(RouteClass::BgpTransitDefault),
            _ if self.peer_type.is_internal_family() => {
                self.accept.enabled(RouteClass::BgpOwnDefault)
            }
            _ => false,
        }
    }

    fn relation(&self) -> Option<(&'static str, u32)> {
        match self.peer_type {
            PeerType::Customer => Some(("BGP_LC_RELATION_CUSTOMER", bgp::PREF_CUSTOMER)),
            PeerType::Peer => Some(("BGP_LC_RELATION_PEER", bgp::PREF_PEER)),
            PeerType::Routeserver => Some(("BGP_LC_RELATION_ROUTESERVER", bgp::PREF_ROUTESERVER)),
            PeerType::Transit => Some(("BGP_LC_RELATION_TRANSIT", bgp::PREF_TRANSIT)),
            _ => None,
        }
    }

    fn const_name(&self, suffix: &str) -> String {
        format!("BGP_AS{}_{}_{suffix}", self.asn, crate::names::peer_symbol(&self.name))
    }

    /// Ordered emission of everything this peer contributes.
    pub fn emit(&self, ctx: &mut BuildContext) -> Result<ConfigDoc, ConfigError> {
        let mut out = ConfigDoc::new();
        out.title(&format!("Peer {} (AS{}, {})", self.name, self.asn, self.peer_type), 1);

        for version in &self.versions {
            ctx.tables.declare(&self.table_base, *version);
        }
        self.emit_list_constants(ctx);

        self.emit_bgp_export(&mut out, &mut ctx.functions);
        self.emit_bgp_import(&mut out, ctx);
        self.emit_peer_export(&mut out);
        self.emit_peer_import(&mut out, ctx);
        self.emit_protocols(&mut out);

        out.append(
            Pipe::new(&self.table_base, "bgp")
                .set_export(PipeFilter::Unversioned)
                .set_import(PipeFilter::Unversioned)
                .set_versions(&self.versions)
                .render(),
        );

        ctx.state.set(
            &["bgp", "peers", &self.name],
            json!({
                "asn": self.asn,
                "type": self.peer_type.to_string(),
                "protocols": self
                    .versions
                    .iter()
                    .map(|v| bgp_protocol_name(self.asn, &self.name, *v))
                    .collect::<Vec<_>>(),
            }),
        );
        Ok(out)
    }

    fn emit_list_constants(&self, ctx: &mut BuildContext) {
        if !self.allow.origin_asns.is_empty() {
            for note in &self.allow.notes {
                ctx.constants.comment(note);
            }
            ctx.constants
                .define(&self.const_name("asns"), asn_list(&self.allow.origin_asns));
        }
        if !self.peer_asns.is_empty() {
            ctx.constants
                .define(&self.const_name("peer_asns"), asn_list(&self.peer_asns));
        }
        if !self.deny.origin_asns.is_empty() {
            ctx.constants
                .define(&self.const_name("deny_asns"), asn_list(&self.deny.origin_asns));
        }
        if !self.export.origin_asns.is_empty() {
            ctx.constants
                .define(&self.const_name("export_asns"), asn_list(&self.export.origin_asns));
        }

        let mut sets: Vec<(String, &[String])> = Vec::new();
        if !self.allow.prefixes4.is_empty() {
            sets.push((self.const_name("prefixes_v4"), &self.allow.prefixes4));
        }
        if !self.allow.prefixes6.is_empty() {
            sets.push((self.const_name("prefixes_v6"), &self.allow.prefixes6));
        }
        if !self.deny.prefixes4.is_empty() {
            sets.push((self.const_name("deny_prefixes_v4"), &self.deny.prefixes4));
        }
        if !self.deny.prefixes6.is_empty() {
            sets.push((self.const_name("deny_prefixes_v6"), &self.deny.prefixes6));
        }
        if !self.export.prefixes4.is_empty() {
            sets.push((self.const_name("export_prefixes_v4"), &self.export.prefixes4));
        }
        if !self.export.prefixes6.is_empty() {
            sets.push((self.const_name("export_prefixes_v6"), &self.export.prefixes6));
        }
        for (name, prefixes) in sets {
            let refs: Vec<&str> = prefixes.iter().map(String::as_str).collect();
            ctx.constants
                .add_block(crate::sections::constants::prefix_set(&name, &refs));
        }
        /* blackhole-eligible variants: every listed prefix widened to
         * "this length or longer" so host routes inside it match */
        if self.accepts_blackholes() && self.allow.has_prefixes() {
            if !self.allow.prefixes4.is_empty() {
                let widened: Vec<String> =
                    self.allow.prefixes4.iter().map(|p| widen(p)).collect();
                let refs: Vec<&str> = widened.iter().map(String::as_str).collect();
                ctx.constants.add_block(crate::sections::constants::prefix_set(
                    &self.const_name("blackhole_v4"),
                    &refs,
                ));
            }
            if !self.allow.prefixes6.is_empty() {
                let widened: Vec<String> =
                    self.allow.prefixes6.iter().map(|p| widen(p)).collect();
                let refs: Vec<&str> = widened.iter().map(String::as_str).collect();
                ctx.constants.add_block(crate::sections::constants::prefix_set(
                    &self.const_name("blackhole_v6"),
                    &refs,
                ));
            }
        }
    }

    /// Peer table -> shared BGP table: drop anything marked filtered.
    fn emit_bgp_export(&self, out: &mut ConfigDoc, reg: &mut FunctionRegistry) {
        let name = filter_name(&self.table_base, "bgp", "export", None);
        let mut body = Vec::new();
        body.push(format!("\t{};", templates::reject_filtered(reg)));
        body.push("\taccept;".to_owned());
        out.append(filter_block(&name, body));
    }

    /// Shared BGP table -> peer table: the outbound policy pipeline.
    fn emit_bgp_import(&self, out: &mut ConfigDoc, ctx: &mut BuildContext) {
        let fname = filter_name(&self.table_base, "bgp", "import", None);
        let reg = &mut ctx.functions;
        let mut body = Vec::new();

        body.push(format!("\t{};", templates::reject_noadvertise(reg)));
        if !self.peer_type.is_internal_family() {
            /* targeted blackholes strip NOEXPORT for their target peer,
             * so the strip must run before the NOEXPORT check */
            for target in &self.blackhole_targets {
                body.push(format!("\t{};", templates::blackhole_target_strip(reg, target)));
            }
            body.push(format!("\t{};", templates::reject_noexport(reg)));
        }
        if let Some(location) = self.config.location {
            body.push(format!("\t{};", templates::noexport_location(reg, location)));
        }

        for class in RouteClass::ALL {
            let matcher = class_matcher(reg, *class);
            body.push(format!("\tif ({matcher}) then {{"));
            if !self.redistribute.enabled(*class) {
                body.push(format!(
                    "\t\t{};",
                    templates::reject_noredistribute(reg, &class.to_string())
                ));
            } else {
                self.emit_accept_branch(&mut body, reg, *class, &mut ctx.need_bogons);
            }
            body.push("\t}".to_owned());
        }
        body.push(
            "\tprint filter_name, \" rejecting \", net, \" no matching route class\";".to_owned(),
        );
        body.push("\treject;".to_owned());
        out.append(filter_block(&fname, body));
    }

    /// Actions applied when a redistribute class matched, fixed order.
    fn emit_accept_branch(
        &self,
        body: &mut Vec<String>,
        reg: &mut FunctionRegistry,
        class: RouteClass,
        need_bogons: &mut bool,
    ) {
        if !class.is_default() && !self.peer_type.is_internal_family() {
            *need_bogons = true;
            body.push(format!("\t\t{};", filters::reject_bogons(reg)));
        }
        if !self.export.origin_asns.is_empty() {
            body.push(format!(
                "\t\t{};",
                templates::origin_asn_allow(reg, &self.const_name("export_asns"))
            ));
        }
        if !self.export.prefixes4.is_empty() {
            body.push(format!(
                "\t\t{};",
                templates::prefix_allow(reg, &self.const_name("export_prefixes_v4"), false)
            ));
        }
        if !self.export.prefixes6.is_empty() {
            body.push(format!(
                "\t\t{};",
                templates::prefix_allow(reg, &self.const_name("export_prefixes_v6"), true)
            ));
        }
        if self.peer_type.is_collector() {
            body.push(format!("\t\t{};", templates::strip_all_communities(reg)));
        } else {
            for community in self.communities.get(&class).into_iter().flatten() {
                body.push(format!("\t\tbgp_community.add({community});"));
            }
            for lc in self.large_communities.get(&class).into_iter().flatten() {
                body.push(format!("\t\tbgp_large_community.add({lc});"));
            }
        }
        if !self.peer_type.is_internal_family() {
            if self.config.replace_aspath {
                body.push(format!("\t\t{};", templates::replace_aspath(reg)));
            }
            body.push(format!("\t\t{};", templates::prepend_dynamic(reg)));
            body.push(format!("\t\t{};", templates::strip_private_lc(reg)));
        }
        if let Some(count) = self.prepend.get(&class) {
            body.push(format!("\t\t{};", templates::prepend(reg, *count)));
        }
        if self.graceful_shutdown {
            body.push(format!("\t\t{};", templates::graceful_shutdown_tag(reg)));
        }
        if class.is_blackhole() && !self.peer_type.is_internal_family() {
            body.push(format!("\t\t{};", templates::blackhole_community_sub(reg)));
        }
        body.push("\t\taccept;".to_owned());
    }

    /// Peer table -> neighbor: pass-through, unless quarantined. Routes
    /// this peer's own protocol instances put into the table must not
    /// bounce straight back to the neighbor.
    fn emit_peer_export(&self, out: &mut ConfigDoc) {
        let name = filter_name(&self.table_base, "peer", "export", None);
        let mut body = Vec::new();
        if self.quarantine {
            body.push(
                "\tprint filter_name, \" rejecting \", net, \" peer is quarantined\";".to_owned(),
            );
            body.push("\treject;".to_owned());
        } else {
            for version in &self.versions {
                let proto = bgp_protocol_name(self.asn, &self.name, *version);
                body.push(format!("\tif (proto = \"{proto}\") then reject;"));
            }
            body.push("\taccept;".to_owned());
        }
        out.append(filter_block(&name, body));
    }

    /// Neighbor -> peer table: the inbound policy pipeline.
    fn emit_peer_import(&self, out: &mut ConfigDoc, ctx: &mut BuildContext) {
        let fname = filter_name(&self.table_base, "peer", "import", None);
        let reg = &mut ctx.functions;
        let mut body = Vec::new();

        if self.peer_type == PeerType::Routecollector {
            /* collectors only receive; nothing they send is used */
            body.push("\treject;".to_owned());
            out.append(filter_block(&fname, body));
            return;
        }

        let internal = self.peer_type.is_internal_family();
        if !internal {
            body.push(format!("\t{};", templates::strip_private_lc(reg)));
        }
        if let Some((relation_lc, base_pref)) = self.relation() {
            let pref = self
                .config
                .local_preference
                .unwrap_or_else(|| effective_pref(base_pref, self.config.cost));
            body.push(format!(
                "\t{};",
                templates::relation_tag(reg, relation_lc, &pref.to_string())
            ));
        }

        if !self.accepts_default() {
            body.push(format!("\t{};", templates::reject_default(reg)));
        }
        if !internal {
            ctx.need_bogons = true;
            body.push(format!("\t{};", filters::reject_bogons(reg)));
        }

        let b = &self.bounds;
        if self.accepts_blackholes() {
            let bh4 =
                templates::blackhole_len_bound(reg, b.blackhole_minlen4, b.blackhole_maxlen4, false);
            let bh6 =
                templates::blackhole_len_bound(reg, b.blackhole_minlen6, b.blackhole_maxlen6, true);
            let is_blackhole = filters::is_blackhole(reg);
            let len4 = filters::prefix_len_bound(reg, b.minlen4, b.maxlen4, false);
            let len6 = filters::prefix_len_bound(reg, b.minlen6, b.maxlen6, true);
            body.push(format!("\tif ({is_blackhole}) then {{"));
            body.push(format!("\t\t{bh4};"));
            body.push(format!("\t\t{bh6};"));
            body.push("\t} else {".to_owned());
            body.push(format!("\t\t{len4};"));
            body.push(format!("\t\t{len6};"));
            body.push("\t}".to_owned());
        } else {
            body.push(format!("\t{};", templates::reject_blackhole(reg)));
            body.push(format!(
                "\t{};",
                filters::prefix_len_bound(reg, b.minlen4, b.maxlen4, false)
            ));
            body.push(format!(
                "\t{};",
                filters::prefix_len_bound(reg, b.minlen6, b.maxlen6, true)
            ));
        }
        body.push(format!(
            "\t{};",
            filters::aspath_len_bound(reg, b.aspath_minlen, b.aspath_maxlen)
        ));
        body.push(format!(
            "\t{};",
            filters::community_len_bound(reg, b.community_maxlen, false)
        ));
        body.push(format!(
            "\t{};",
            filters::community_len_bound(reg, b.large_community_maxlen, true)
        ));

        if self.peer_type.is_external() && self.peer_type != PeerType::Routeserver {
            body.push(format!("\t{};", templates::first_asn_check(reg, self.asn)));
        }
        if !self.peer_asns.is_empty() {
            body.push(format!(
                "\t{};",
                templates::peer_asn_allow(reg, &self.const_name("peer_asns"))
            ));
        }
        if !self.allow.origin_asns.is_empty() {
            body.push(format!(
                "\t{};",
                templates::origin_asn_allow(reg, &self.const_name("asns"))
            ));
        }
        if !self.deny.origin_asns.is_empty() {
            body.push(format!(
                "\t{};",
                templates::origin_asn_deny(reg, &self.const_name("deny_asns"))
            ));
        }

        if self.allow.has_prefixes() {
            self.emit_prefix_allow_checks(&mut body, reg);
        }
        if !self.deny.prefixes4.is_empty() {
            body.push(format!(
                "\t{};",
                templates::prefix_deny(reg, &self.const_name("deny_prefixes_v4"), false)
            ));
        }
        if !self.deny.prefixes6.is_empty() {
            body.push(format!(
                "\t{};",
                templates::prefix_deny(reg, &self.const_name("deny_prefixes_v6"), true)
            ));
        }

        if self.quarantine {
            body.push(format!("\t{};", templates::quarantine_tag(reg)));
        }
        if let Some(location) = self.config.location {
            body.push(format!("\t{};", templates::location_tag(reg, location)));
        }
        for community in &self.incoming_communities {
            body.push(format!("\tbgp_community.add({community});"));
        }
        for lc in &self.incoming_large_communities {
            body.push(format!("\tbgp_large_community.add({lc});"));
        }
        if internal && let Some(pref) = self.config.local_preference {
            body.push(format!("\tbgp_local_pref = {pref};"));
        }
        body.push(format!("\t{};", templates::graceful_shutdown_floor(reg)));
        body.push("\taccept;".to_owned());
        out.append(filter_block(&fname, body));
    }

    /// Allow-list prefix checks; blackholes match against the widened
    /// variant when accepted, otherwise the normal sets apply.
    fn emit_prefix_allow_checks(&self, body: &mut Vec<String>, reg: &mut FunctionRegistry) {
        let normal4 = (!self.allow.prefixes4.is_empty())
            .then(|| templates::prefix_allow(reg, &self.const_name("prefixes_v4"), false));
        let normal6 = (!self.allow.prefixes6.is_empty())
            .then(|| templates::prefix_allow(reg, &self.const_name("prefixes_v6"), true));
        if self.accepts_blackholes() {
            let bh4 = (!self.allow.prefixes4.is_empty())
                .then(|| templates::prefix_allow(reg, &self.const_name("blackhole_v4"), false));
            let bh6 = (!self.allow.prefixes6.is_empty())
                .then(|| templates::prefix_allow(reg, &self.const_name("blackhole_v6"), true));
            let is_blackhole = filters::is_blackhole(reg);
            body.push(format!("\tif ({is_blackhole}) then {{"));
            for call in [bh4, bh6].into_iter().flatten() {
                body.push(format!("\t\t{call};"));
            }
            body.push("\t} else {".to_owned());
            for call in [normal4, normal6].into_iter().flatten() {
                body.push(format!("\t\t{call};"));
            }
            body.push("\t}".to_owned());
        } else {
            for call in [normal4, normal6].into_iter().flatten() {
                body.push(format!("\t{call};"));
            }
        }
    }

    fn emit_protocols(&self, out: &mut ConfigDoc) {
        for version in &self.versions {
            let proto = bgp_protocol_name(self.asn, &self.name, *version);
            let (neighbor, source): (IpAddr, IpAddr) = match version {
                IpVersion::V4 => (
                    IpAddr::V4(self.config.neighbor4.unwrap_or(std::net::Ipv4Addr::UNSPECIFIED)),
                    IpAddr::V4(
                        self.config
                            .source_address4
                            .unwrap_or(std::net::Ipv4Addr::UNSPECIFIED),
                    ),
                ),
                IpVersion::V6 => (
                    IpAddr::V6(self.config.neighbor6.unwrap_or(std::net::Ipv6Addr::UNSPECIFIED)),
                    IpAddr::V6(
                        self.config
                            .source_address6
                            .unwrap_or(std::net::Ipv6Addr::UNSPECIFIED),
                    ),
                ),
            };
            out.push(format!("protocol bgp {proto} {{"));
            if let Some(description) = &self.config.description {
                out.push(format!("\tdescription \"{description}\";"));
            }
            out.push(format!("\tlocal {source} as {};", self.local_asn));
            out.push(format!("\tneighbor {neighbor} as {};", self.asn));
            out.push(format!("\tsource address {source};"));
            if self.passive {
                out.push("\tpassive;".to_owned());
            }
            if let Some(hops) = self.config.multihop {
                out.push(format!("\tmultihop {hops};"));
            }
            if self.config.ttl_security == Some(true) {
                out.push("\tttl security;".to_owned());
            }
            if let Some(password) = &self.config.password {
                out.push(format!("\tpassword \"{password}\";"));
            }
            if let Some(time) = self.config.connect_retry_time {
                out.push(format!("\tconnect retry time {time};"));
            }
            if let Some(time) = self.config.connect_delay_time {
                out.push(format!("\tconnect delay time {time};"));
            }
            if let Some(time) = self.config.error_wait_time {
                out.push(format!("\terror wait time {time}, {};", u32::from(time) * 4));
            }
            if matches!(self.peer_type, PeerType::Rrclient | PeerType::RrserverRrserver) {
                out.push("\trr client;".to_owned());
                if let Some(cluster_id) = self.cluster_id {
                    out.push(format!("\trr cluster id {cluster_id};"));
                }
            }
            out.push(format!("\t{} {{", version.channel()));
            out.push(format!(
                "\t\ttable {};",
                crate::names::table_name(&self.table_base, *version)
            ));
            out.push(format!("\t\tigp table master{};", version.suffix()));
            out.push(format!(
                "\t\timport filter {};",
                filter_name(&self.table_base, "peer", "import", None)
            ));
            out.push(format!(
                "\t\texport filter {};",
                filter_name(&self.table_base, "peer", "export", None)
            ));
            /* we are the routing edge for everything except our own rr
             * clients, which must see the original next hop */
            if self.peer_type != PeerType::Rrclient {
                out.push("\t\tnext hop self;".to_owned());
            }
            if self.peer_type.is_internal_family() && self.config.add_paths == Some(true) {
                out.push("\t\tadd paths on;".to_owned());
            }
            let limit = match version {
                IpVersion::V4 => self.prefix_limit4,
                IpVersion::V6 => self.prefix_limit6,
            };
            if let Some(limit) = limit {
                out.push(format!("\t\timport limit {limit} action restart;"));
            }
            out.push("\t};".to_owned());
            out.push("};".to_owned());
            out.push(String::new());
        }
    }
}

/* helpers */

/// Redistribute defaults: the internal family passes everything we and
/// our downstreams know, external peers only us and our customers.
fn default_redistribute(peer_type: PeerType) -> ClassFlags {
    let mut flags = ClassFlags::new()
        .with(RouteClass::BgpOwn, true)
        .with(RouteClass::BgpCustomer, true);
    if peer_type.is_internal_family() {
        flags.set(RouteClass::BgpPeering, true);
        flags.set(RouteClass::BgpTransit, true);
    }
    flags
}

fn effective_pref(base: u32, cost: Option<i16>) -> u32 {
    let pref = i64::from(base) - i64::from(cost.unwrap_or(0));
    pref.clamp(1, i64::from(u32::MAX)) as u32
}

/// Three-layer toggle precedence: build default, per-peer explicit,
/// previous-state override directive.
fn effective_toggle(
    ctx: &BuildContext,
    peer: &str,
    directive: &str,
    explicit: Option<bool>,
    default: bool,
) -> bool {
    let mut value = explicit.unwrap_or(default);
    if let Some(forced) = ctx
        .previous
        .override_for(&["bgp", directive], peer)
        .and_then(serde_json::Value::as_bool)
    {
        debug!("peer '{peer}': '{directive}' forced to {forced} by state override");
        value = forced;
    }
    value
}

/// Resolve a filter spec into concrete lists: static entries plus IRR
/// AS-SET resolution, with the 2x network-count guard per AS-SET.
fn resolve_filter_spec(
    peer: &str,
    spec: &FilterSpec,
    ctx: &mut BuildContext,
) -> Result<ListSet, ConfigError> {
    let mut out = ListSet::default();
    if !spec.origin_asns.is_empty() {
        out.notes
            .push(format!("{} ASNs from static config", spec.origin_asns.len()));
        out.origin_asns.extend(&spec.origin_asns);
    }
    for prefix in &spec.prefixes {
        match prefix {
            IpNet::V4(net) => out.prefixes4.push(net.to_string()),
            IpNet::V6(net) => out.prefixes6.push(net.to_string()),
        }
    }
    for as_set in &spec.as_sets {
        let asns = ctx.irr().resolve_asns(as_set)?;
        let prefixes = ctx.irr().resolve_prefixes(as_set)?;
        if !ctx.globals.ignore_irr_changes {
            let (current4, current6) = network_counts(&prefixes);
            let previous = cached_prefixes(ctx.previous, as_set).map(|p| network_counts(&p));
            check_deviation(
                peer,
                &format!("IPv4 network count for '{as_set}'"),
                previous.map(|p| p.0),
                current4,
            )?;
            check_deviation(
                peer,
                &format!("IPv6 network count for '{as_set}'"),
                previous.map(|p| p.1),
                current6,
            )?;
        }
        record_irr(&mut ctx.state, as_set, &asns, &prefixes);
        out.notes
            .push(format!("{} ASNs from AS-SET {as_set}", asns.len()));
        out.origin_asns.extend(asns);
        out.prefixes4
            .extend(prefixes.ipv4.iter().map(ToString::to_string));
        out.prefixes6
            .extend(prefixes.ipv6.iter().map(ToString::to_string));
    }
    Ok(out)
}

fn merge_lists(into: &mut ListSet, from: ListSet) {
    into.origin_asns.extend(from.origin_asns);
    into.prefixes4.extend(from.prefixes4);
    into.prefixes6.extend(from.prefixes6);
    into.notes.extend(from.notes);
    normalize_lists(into);
}

fn normalize_lists(lists: &mut ListSet) {
    lists.origin_asns.sort_unstable();
    lists.origin_asns.dedup();
    lists.prefixes4.sort();
    lists.prefixes4.dedup();
    lists.prefixes6.sort();
    lists.prefixes6.dedup();
}

fn asn_list(asns: &[u32]) -> String {
    let rendered: Vec<String> = asns.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

/// Widen a prefix to "this length or longer" for blackhole matching.
fn widen(prefix: &str) -> String {
    if prefix.ends_with('+') {
        prefix.to_owned()
    } else {
        format!("{prefix}+")
    }
}

fn filter_block(name: &str, body: Vec<String>) -> Vec<String> {
    let mut lines = Vec::with_capacity(body.len() + 5);
    lines.push(format!("filter {name} {{"));
    lines.push("\tstring filter_name;".to_owned());
    lines.push(format!("\tfilter_name = \"{name}\";"));
    lines.extend(body);
    lines.push("};".to_owned());
    lines.push(String::new());
    lines
}

/// Route-class matcher expression over the shared classifiers.
fn class_matcher(reg: &mut FunctionRegistry, class: RouteClass) -> String {
    let connected = filters::is_connected(reg);
    let kernel = filters::is_kernel(reg);
    let stat = filters::is_static(reg);
    let bgp_src = filters::is_bgp(reg);
    let blackhole = filters::is_blackhole(reg);
    let default = filters::is_default(reg);
    let own = templates::is_own(reg);
    let customer = templates::is_customer(reg);
    let peering = templates::is_peering(reg);
    let transit = templates::is_transit(reg);
    match class {
        RouteClass::Connected => connected,
        RouteClass::Kernel => format!("{kernel} && !{blackhole} && !{default}"),
        RouteClass::KernelBlackhole => format!("{kernel} && {blackhole}"),
        RouteClass::KernelDefault => format!("{kernel} && {default}"),
        RouteClass::Static => format!("{stat} && !{own} && !{blackhole} && !{default}"),
        RouteClass::StaticBlackhole => format!("{stat} && !{own} && {blackhole}"),
        RouteClass::StaticDefault => format!("{stat} && !{own} && {default}"),
        RouteClass::Originated => format!("{stat} && {own} && !{default}"),
        RouteClass::OriginatedDefault => format!("{stat} && {own} && {default}"),
        RouteClass::BgpOwn => format!("{bgp_src} && {own} && !{blackhole} && !{default}"),
        RouteClass::BgpOwnBlackhole => format!("{bgp_src} && {own} && {blackhole}"),
        RouteClass::BgpOwnDefault => format!("{bgp_src} && {own} && {default}"),
        RouteClass::BgpCustomer => format!("{bgp_src} && {customer} && !{blackhole}"),
        RouteClass::BgpCustomerBlackhole => format!("{bgp_src} && {customer} && {blackhole}"),
        RouteClass::BgpPeering => format!("{bgp_src} && {peering}"),
        RouteClass::BgpTransit => format!("{bgp_src} && {transit} && !{default}"),
        RouteClass::BgpTransitDefault => format!("{bgp_src} && {transit} && {default}"),
    }
}

fn parse_community(peer: &str, raw: &str) -> Result<String, ConfigError> {
    let parts: Vec<&str> = raw.split(':').collect();
    let parsed: Option<Vec<u16>> = parts.iter().map(|p| p.parse::<u16>().ok()).collect();
    match parsed {
        Some(values) if values.len() == 2 => Ok(format!("({}, {})", values[0], values[1])),
        _ => Err(ConfigError::invalid_peer(
            peer,
            format!("'{raw}' is not a valid community (expected 'asn:value')"),
        )),
    }
}

fn parse_large_community(peer: &str, raw: &str) -> Result<String, ConfigError> {
    let parts: Vec<&str> = raw.split(':').collect();
    let parsed: Option<Vec<u32>> = parts.iter().map(|p| p.parse::<u32>().ok()).collect();
    match parsed {
        Some(values) if values.len() == 3 => {
            Ok(format!("({}, {}, {})", values[0], values[1], values[2]))
        }
        _ => Err(ConfigError::invalid_peer(
            peer,
            format!("'{raw}' is not a valid large community (expected 'asn:fn:value')"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Globals, StateMap};
    use irr::{PrefixLimits, ResolvedPrefixes, StaticIrr, StaticLimits};

    fn plan() -> BgpPlan {
        BgpPlan {
            asn: 65000,
            cluster_id: None,
            graceful_shutdown: false,
            quarantine: false,
            originate4: vec![],
            originate6: vec![],
            peers: Default::default(),
        }
    }

    fn customer() -> BgpPeerConfig {
        BgpPeerConfig {
            peer_type: "customer".to_owned(),
            asn: Some(65001),
            neighbor4: Some("192.0.2.2".parse().expect("addr")),
            source_address4: Some("192.0.2.1".parse().expect("addr")),
            ..Default::default()
        }
    }

    fn sources() -> (StaticIrr, StaticLimits) {
        (
            StaticIrr::new(),
            StaticLimits::new().with_limits(65001, PrefixLimits { ipv4: 100, ipv6: 50 }),
        )
    }

    fn compile(
        name: &str,
        config: BgpPeerConfig,
        plan: BgpPlan,
        globals: Globals,
        previous: StateMap,
        irr: StaticIrr,
        pdb: StaticLimits,
    ) -> Result<Vec<String>, ConfigError> {
        let mut ctx = BuildContext::new(&globals, &previous, &irr, &pdb);
        let peer = BgpPeer::try_new(name, &config, &plan, &mut ctx)?;
        Ok(peer.emit(&mut ctx)?.lines())
    }

    #[test]
    fn test_rrclient_requires_cluster_id() {
        let (irr, pdb) = sources();
        let config = BgpPeerConfig {
            peer_type: "rrclient".to_owned(),
            asn: Some(65000),
            ..customer()
        };
        let err = compile(
            "rr1",
            config.clone(),
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("rrclient"));
        assert!(err.to_string().contains("cluster_id"));

        let mut with_cluster = plan();
        with_cluster.cluster_id = Some("192.0.2.255".parse().expect("addr"));
        let (irr, pdb) = sources();
        let lines = compile(
            "rr1",
            config,
            with_cluster,
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("compiles with cluster id");
        assert!(lines.contains(&"\trr client;".to_owned()));
        assert!(lines.contains(&"\trr cluster id 192.0.2.255;".to_owned()));
    }

    #[test]
    fn test_internal_asn_must_match_local() {
        let (irr, pdb) = sources();
        let config = BgpPeerConfig {
            peer_type: "internal".to_owned(),
            asn: Some(65009),
            ..customer()
        };
        let err = compile(
            "core1",
            config,
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("does not match local ASN 65000"));
    }

    #[test]
    fn test_neighbor_source_pairing() {
        let (irr, pdb) = sources();
        let mut config = customer();
        config.source_address4 = None;
        let err = compile(
            "peer1",
            config,
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("'neighbor4' and 'source_address4'"));
    }

    #[test]
    fn test_replace_aspath_needs_private_asn() {
        let (irr, pdb) = sources();
        let mut config = customer();
        config.replace_aspath = true;
        let err = compile(
            "peer1",
            config,
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("private peer ASN"));
    }

    #[test]
    fn test_kernel_blackhole_redistribute_rejected_for_customer() {
        let (irr, pdb) = sources();
        let mut config = customer();
        config
            .redistribute
            .insert("kernel_blackhole".to_owned(), true);
        let err = compile(
            "peer1",
            config,
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect_err("must fail");
        assert!(
            err.to_string()
                .contains("redistributing 'kernel_blackhole' to peer type 'customer'")
        );
    }

    #[test]
    fn test_customer_blackhole_accept_round_trip() {
        /* no import filter present: enabling blackhole accept fails */
        let (irr, pdb) = sources();
        let mut config = customer();
        config
            .accept
            .insert("bgp_customer_blackhole".to_owned(), true);
        let err = compile(
            "peer1",
            config.clone(),
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("prefix or AS-SET import filter"));

        /* with a prefix filter the blackhole size check replaces the
         * unconditional reject */
        let (irr, pdb) = sources();
        config
            .import_filter
            .prefixes
            .push("100.101.0.0/24".parse().expect("prefix"));
        let lines = compile(
            "peer1",
            config,
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("compiles");
        let text = lines.join("\n");
        assert!(text.contains("bgp_blackhole_len_v4(filter_name, 24, 32)"));
        assert!(!text.contains("bgp_reject_blackhole(filter_name)"));
        assert!(text.contains("BGP_AS65001_peer1_blackhole_v4"));
    }

    #[test]
    fn test_prefix_limit_deviation_guard() {
        let previous = {
            let mut state = StateMap::new();
            record_limits(&mut state, 65001, PrefixLimits { ipv4: 10, ipv6: 50 });
            state
        };
        let (irr, pdb) = sources(); /* pdb answers ipv4=100, >2x of 10 */
        let err = compile(
            "peer1",
            customer(),
            plan(),
            Globals::default(),
            previous.clone(),
            irr,
            pdb,
        )
        .expect_err("must fail");
        assert!(matches!(
            err,
            ConfigError::DeviationExceeded {
                previous: 10,
                current: 100,
                ..
            }
        ));

        let (irr, pdb) = sources();
        let globals = Globals {
            ignore_peeringdb_changes: true,
            ..Default::default()
        };
        compile("peer1", customer(), plan(), globals, previous, irr, pdb)
            .expect("ignore flag bypasses the guard");
    }

    #[test]
    fn test_as_set_resolution_and_constants() {
        let prefixes = ResolvedPrefixes {
            ipv4: vec!["100.101.0.0/22".parse().expect("prefix")],
            ipv6: vec!["2001:db8:100::/48".parse().expect("prefix")],
        };
        let irr = StaticIrr::new()
            .with_asns("AS-EXAMPLE", vec![65010, 65011])
            .with_prefixes("AS-EXAMPLE", prefixes);
        let (_, pdb) = sources();
        let globals = Globals::default();
        let previous = StateMap::new();
        let mut ctx = BuildContext::new(&globals, &previous, &irr, &pdb);
        let mut config = customer();
        config.import_filter.as_sets.push("AS-EXAMPLE".to_owned());
        let peer = BgpPeer::try_new("peer1", &config, &plan(), &mut ctx).expect("valid");
        peer.emit(&mut ctx).expect("emit");

        let constants = ctx.constants.render(false).to_string();
        assert!(constants.contains("# 2 ASNs from AS-SET AS-EXAMPLE"));
        assert!(constants.contains("define BGP_AS65001_peer1_asns = [65010, 65011];"));
        assert!(constants.contains("define BGP_AS65001_peer1_prefixes_v4 = ["));
        /* resolved data is recorded for the next run */
        assert!(ctx.state.get(&["irr", "AS-EXAMPLE", "asns"]).is_some());
    }

    #[test]
    fn test_quarantine_precedence_from_state() {
        let previous = StateMap::from_value(serde_json::json!({
            "bgp": {"+quarantine": {"peer*": true}}
        }));
        let (irr, pdb) = sources();
        let lines = compile(
            "peer1",
            customer(),
            plan(),
            Globals::default(),
            previous,
            irr,
            pdb,
        )
        .expect("compiles");
        let text = lines.join("\n");
        assert!(text.contains("bgp_quarantine_tag(filter_name)"));
        assert!(text.contains("peer is quarantined"));
    }

    #[test]
    fn test_emitted_names_follow_naming_rule() {
        let (irr, pdb) = sources();
        let lines = compile(
            "peerX",
            customer(),
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("compiles");
        let text = lines.join("\n");
        assert!(text.contains("filter f_bgp_AS65001_peerX_bgp_export {"));
        assert!(text.contains("filter f_bgp_AS65001_peerX_bgp_import {"));
        assert!(text.contains("filter f_bgp_AS65001_peerX_peer_import {"));
        assert!(text.contains("protocol bgp p_AS65001_peerX4 {"));
        assert!(text.contains("protocol pipe p_bgp_AS65001_peerX_bgp4 {"));
        assert!(text.contains("\texport filter f_bgp_AS65001_peerX_bgp_export;"));
        /* IPv4-only peer: no v6 stanza or pipe */
        assert!(!text.contains("p_AS65001_peerX6"));
    }

    #[test]
    fn test_peer_export_excludes_own_protocol_routes() {
        let (irr, pdb) = sources();
        let lines = compile(
            "peerX",
            customer(),
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("compiles");
        let text = lines.join("\n");
        let export_at = text
            .find("filter f_bgp_AS65001_peerX_peer_export {")
            .expect("export filter");
        let tail = &text[export_at..];
        assert!(tail.contains("\tif (proto = \"p_AS65001_peerX4\") then reject;"));
        assert!(tail.contains("\taccept;"));

        /* quarantined peers reject outright, no exclusion needed */
        let (irr, pdb) = sources();
        let mut config = customer();
        config.quarantine = Some(true);
        let lines = compile(
            "peerX",
            config,
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("compiles");
        let text = lines.join("\n");
        let export_at = text
            .find("filter f_bgp_AS65001_peerX_peer_export {")
            .expect("export filter");
        assert!(!text[export_at..].contains("then reject"));
        assert!(text[export_at..].contains("peer is quarantined"));
    }

    #[test]
    fn test_next_hop_self_except_rrclients() {
        let (irr, pdb) = sources();
        let lines = compile(
            "peer1",
            customer(),
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("compiles");
        assert!(lines.contains(&"\t\tnext hop self;".to_owned()));

        let mut with_cluster = plan();
        with_cluster.cluster_id = Some("192.0.2.255".parse().expect("addr"));
        let (irr, pdb) = sources();
        let config = BgpPeerConfig {
            peer_type: "rrclient".to_owned(),
            asn: Some(65000),
            ..customer()
        };
        let lines = compile(
            "rr1",
            config,
            with_cluster,
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("compiles");
        assert!(!lines.contains(&"\t\tnext hop self;".to_owned()));
    }

    #[test]
    fn test_hyphenated_peer_name_maps_to_symbols() {
        let (irr, pdb) = sources();
        let lines = compile(
            "ab-1",
            customer(),
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("hyphenated names are legal");
        let text = lines.join("\n");
        assert!(text.contains("protocol bgp p_AS65001_ab_14 {"));
        assert!(text.contains("filter f_bgp_AS65001_ab_1_peer_import {"));
        assert!(!text.contains("ab-1_"));

        let (irr, pdb) = sources();
        let err = compile(
            "ab 1",
            customer(),
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("letters, digits, underscores and hyphens"));
    }

    #[test]
    fn test_export_list_checks_follow_class_match() {
        let (irr, pdb) = sources();
        let mut config = customer();
        config.export_filter.origin_asns.push(65001);
        let lines = compile(
            "peer1",
            config,
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("compiles");
        let text = lines.join("\n");
        /* the origin-ASN export check lives inside the class branches,
         * after the bogon check, not ahead of the walk */
        let import_at = text
            .find("filter f_bgp_AS65001_peer1_bgp_import {")
            .expect("import filter");
        let tail = &text[import_at..];
        let class_at = tail.find("then {").expect("class branch");
        let check_at = tail
            .find("bgp_origin_asn_allow(filter_name, BGP_AS65001_peer1_export_asns)")
            .expect("export check");
        assert!(check_at > class_at);
        assert!(tail.contains("\t\tbgp_origin_asn_allow(filter_name, BGP_AS65001_peer1_export_asns);"));
    }

    #[test]
    fn test_redistribute_defaults_per_family() {
        assert!(default_redistribute(PeerType::Customer).enabled(RouteClass::BgpOwn));
        assert!(default_redistribute(PeerType::Customer).enabled(RouteClass::BgpCustomer));
        assert!(!default_redistribute(PeerType::Customer).enabled(RouteClass::BgpTransit));
        assert!(default_redistribute(PeerType::Rrserver).enabled(RouteClass::BgpTransit));
        assert!(default_redistribute(PeerType::Rrserver).enabled(RouteClass::BgpPeering));
    }

    #[test]
    fn test_community_parsing() {
        assert_eq!(parse_community("p", "65535:666").expect("parse"), "(65535, 666)");
        assert!(parse_community("p", "65536:0").is_err());
        assert!(parse_community("p", "1:2:3").is_err());
        assert_eq!(
            parse_large_community("p", "65000:3:1").expect("parse"),
            "(65000, 3, 1)"
        );
        assert!(parse_large_community("p", "65000:3").is_err());
    }

    #[test]
    fn test_effective_pref_cost_offset() {
        assert_eq!(effective_pref(750, None), 750);
        assert_eq!(effective_pref(750, Some(10)), 740);
        assert_eq!(effective_pref(750, Some(-50)), 800);
        /* cost can never push the preference to zero */
        assert_eq!(effective_pref(150, Some(10_000)), 1);
    }

    #[test]
    fn test_collector_strips_communities_and_imports_nothing() {
        let (irr, pdb) = sources();
        let config = BgpPeerConfig {
            peer_type: "routecollector".to_owned(),
            ..customer()
        };
        let lines = compile(
            "mon1",
            config,
            plan(),
            Globals::default(),
            StateMap::new(),
            irr,
            pdb,
        )
        .expect("compiles");
        let text = lines.join("\n");
        assert!(text.contains("bgp_strip_communities_all(filter_name)"));
        /* the peer import filter is a bare reject */
        let import_at = text
            .find("filter f_bgp_AS65001_mon1_peer_import {")
            .expect("import filter");
        let tail = &text[import_at..];
        assert!(tail.lines().take(5).any(|l| l == "\treject;"));
    }
}
