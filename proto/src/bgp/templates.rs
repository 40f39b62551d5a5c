// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! BGP filter-function templates.
//!
//! Template bodies reference the constants the BGP section defines
//! (`BGP_ASN`, the `BGP_LC_*` large-community scheme and the
//! `BGP_PREF_*` local-preference bases). Bodies are registered on first
//! reference; call sites receive the call expression only.

use crate::filters::fbody;
use functions::{FuncArg, FunctionRegistry};

/* classifiers over the relation large-community */

fn relation_classifier(reg: &mut FunctionRegistry, name: &str, lc: &str) -> String {
    let body = fbody(&[
        &format!("function {name}() {{"),
        &format!("\tif ({lc} ~ bgp_large_community) then return true;"),
        "\treturn false;",
        "}",
    ]);
    reg.call_plain(name, &[], |_| body)
}

pub fn is_own(reg: &mut FunctionRegistry) -> String {
    relation_classifier(reg, "bgp_is_own", "BGP_LC_RELATION_OWN")
}
pub fn is_customer(reg: &mut FunctionRegistry) -> String {
    relation_classifier(reg, "bgp_is_customer", "BGP_LC_RELATION_CUSTOMER")
}
pub fn is_peering(reg: &mut FunctionRegistry) -> String {
    reg.call_plain("bgp_is_peering", &[], |reg| {
        let peer = relation_classifier(reg, "bgp_is_peer", "BGP_LC_RELATION_PEER");
        let rs = relation_classifier(reg, "bgp_is_routeserver", "BGP_LC_RELATION_ROUTESERVER");
        fbody(&[
            "function bgp_is_peering() {",
            &format!("\tif {peer} then return true;"),
            &format!("\tif {rs} then return true;"),
            "\treturn false;",
            "}",
        ])
    })
}
pub fn is_transit(reg: &mut FunctionRegistry) -> String {
    relation_classifier(reg, "bgp_is_transit", "BGP_LC_RELATION_TRANSIT")
}

/* filtered-marker handling */

pub fn reject_filtered(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_reject_filtered", &[], |_| {
        fbody(&[
            "function bgp_reject_filtered(string filter_name) {",
            "\tif (BGP_LC_FILTERED ~ bgp_large_community) then {",
            "\t\tprint filter_name, \" [bgp_reject_filtered] rejecting filtered \", net;",
            "\t\treject;",
            "\t}",
            "}",
        ])
    })
}

/// Explicit non-match marker for a redistribute axis that is off.
pub fn reject_noredistribute(reg: &mut FunctionRegistry, class: &str) -> String {
    reg.call(
        "bgp_reject_noredistribute",
        &[FuncArg::Str(class.to_owned())],
        |_| {
            fbody(&[
                "function bgp_reject_noredistribute(string filter_name; string class) {",
                "\tprint filter_name, \" [bgp_reject_noredistribute] \", class, \" not redistributed, rejecting \", net;",
                "\treject;",
                "}",
            ])
        },
    )
}

/* community hygiene */

pub fn strip_all_communities(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_strip_communities_all", &[], |_| {
        fbody(&[
            "function bgp_strip_communities_all(string filter_name) {",
            "\tprint filter_name, \" [bgp_strip_communities_all] stripping communities from \", net;",
            "\tbgp_community.delete([(0..65535, 0..65535)]);",
            "\tbgp_large_community.delete([(0..4294967295, 0..4294967295, 0..4294967295)]);",
            "}",
        ])
    })
}

pub fn strip_private_lc(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_strip_lc_private", &[], |_| {
        fbody(&[
            "function bgp_strip_lc_private(string filter_name) {",
            "\tbgp_large_community.delete([(BGP_ASN, 0..4294967295, 0..4294967295)]);",
            "}",
        ])
    })
}

/* relation tagging on import */

pub fn relation_tag(reg: &mut FunctionRegistry, relation_lc: &str, pref: &str) -> String {
    reg.call(
        "bgp_import_relation_tag",
        &[FuncArg::Raw(relation_lc.to_owned()), FuncArg::Raw(pref.to_owned())],
        |_| {
            fbody(&[
                "function bgp_import_relation_tag(string filter_name; lc relation; int pref) {",
                "\tbgp_large_community.add(relation);",
                "\tbgp_local_pref = pref;",
                "}",
            ])
        },
    )
}

/* default-route and blackhole policing on import */

pub fn reject_default(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_reject_default", &[], |reg| {
        let is_default = crate::filters::is_default(reg);
        fbody(&[
            "function bgp_reject_default(string filter_name) {",
            &format!("\tif {is_default} then {{"),
            "\t\tprint filter_name, \" [bgp_reject_default] rejecting default route \", net;",
            "\t\treject;",
            "\t}",
            "}",
        ])
    })
}

pub fn reject_blackhole(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_reject_blackhole", &[], |reg| {
        let is_blackhole = crate::filters::is_blackhole(reg);
        fbody(&[
            "function bgp_reject_blackhole(string filter_name) {",
            &format!("\tif {is_blackhole} then {{"),
            "\t\tprint filter_name, \" [bgp_reject_blackhole] rejecting blackhole \", net;",
            "\t\treject;",
            "\t}",
            "}",
        ])
    })
}

/// Length bounds for accepted blackhole routes; distinct from the normal
/// prefix-size bound because blackholes are typically host routes.
pub fn blackhole_len_bound(
    reg: &mut FunctionRegistry,
    minlen: u8,
    maxlen: u8,
    v6: bool,
) -> String {
    let name = if v6 {
        "bgp_blackhole_len_v6"
    } else {
        "bgp_blackhole_len_v4"
    };
    let net_type = if v6 { "NET_IP6" } else { "NET_IP4" };
    reg.call(
        name,
        &[FuncArg::Int(i64::from(minlen)), FuncArg::Int(i64::from(maxlen))],
        |reg| {
            let is_blackhole = crate::filters::is_blackhole(reg);
            fbody(&[
                &format!("function {name}(string filter_name; int minlen; int maxlen) {{"),
                &format!("\tif (net.type != {net_type}) then return true;"),
                &format!("\tif !{is_blackhole} then return true;"),
                "\tif (net.len < minlen || net.len > maxlen) then {",
                &format!("\t\tprint filter_name, \" [{name}] rejecting blackhole \", net, \" length out of bounds\";"),
                "\t\treject;",
                "\t}",
                "\treturn true;",
                "}",
            ])
        },
    )
}

/* AS-PATH and ASN policing */

pub fn first_asn_check(reg: &mut FunctionRegistry, asn: u32) -> String {
    reg.call("bgp_first_asn_check", &[FuncArg::from(asn)], |_| {
        fbody(&[
            "function bgp_first_asn_check(string filter_name; int peer_asn) {",
            "\tif (bgp_path.first != peer_asn) then {",
            "\t\tprint filter_name, \" [bgp_first_asn_check] rejecting \", net, \" wrong first ASN\";",
            "\t\treject;",
            "\t}",
            "}",
        ])
    })
}

pub fn origin_asn_allow(reg: &mut FunctionRegistry, set_name: &str) -> String {
    reg.call(
        "bgp_origin_asn_allow",
        &[FuncArg::Raw(set_name.to_owned())],
        |_| {
            fbody(&[
                "function bgp_origin_asn_allow(string filter_name; int set asns) {",
                "\tif (bgp_path.last_nonaggregated !~ asns) then {",
                "\t\tprint filter_name, \" [bgp_origin_asn_allow] rejecting \", net, \" origin not in allow list\";",
                "\t\treject;",
                "\t}",
                "}",
            ])
        },
    )
}

pub fn origin_asn_deny(reg: &mut FunctionRegistry, set_name: &str) -> String {
    reg.call(
        "bgp_origin_asn_deny",
        &[FuncArg::Raw(set_name.to_owned())],
        |_| {
            fbody(&[
                "function bgp_origin_asn_deny(string filter_name; int set asns) {",
                "\tif (bgp_path.last_nonaggregated ~ asns) then {",
                "\t\tprint filter_name, \" [bgp_origin_asn_deny] rejecting \", net, \" origin in deny list\";",
                "\t\treject;",
                "\t}",
                "}",
            ])
        },
    )
}

pub fn peer_asn_allow(reg: &mut FunctionRegistry, set_name: &str) -> String {
    reg.call(
        "bgp_peer_asn_allow",
        &[FuncArg::Raw(set_name.to_owned())],
        |_| {
            fbody(&[
                "function bgp_peer_asn_allow(string filter_name; int set asns) {",
                "\tif (bgp_path.first !~ asns) then {",
                "\t\tprint filter_name, \" [bgp_peer_asn_allow] rejecting \", net, \" peer ASN not in allow list\";",
                "\t\treject;",
                "\t}",
                "}",
            ])
        },
    )
}

/* prefix-set policing */

pub fn prefix_allow(reg: &mut FunctionRegistry, set_name: &str, v6: bool) -> String {
    let name = if v6 { "bgp_prefix_allow_v6" } else { "bgp_prefix_allow_v4" };
    let net_type = if v6 { "NET_IP6" } else { "NET_IP4" };
    reg.call(name, &[FuncArg::Raw(set_name.to_owned())], |_| {
        fbody(&[
            &format!("function {name}(string filter_name; prefix set prefixes) {{"),
            &format!("\tif (net.type != {net_type}) then return true;"),
            "\tif (net !~ prefixes) then {",
            &format!("\t\tprint filter_name, \" [{name}] rejecting \", net, \" not in allow list\";"),
            "\t\treject;",
            "\t}",
            "\treturn true;",
            "}",
        ])
    })
}

pub fn prefix_deny(reg: &mut FunctionRegistry, set_name: &str, v6: bool) -> String {
    let name = if v6 { "bgp_prefix_deny_v6" } else { "bgp_prefix_deny_v4" };
    let net_type = if v6 { "NET_IP6" } else { "NET_IP4" };
    reg.call(name, &[FuncArg::Raw(set_name.to_owned())], |_| {
        fbody(&[
            &format!("function {name}(string filter_name; prefix set prefixes) {{"),
            &format!("\tif (net.type != {net_type}) then return true;"),
            "\tif (net ~ prefixes) then {",
            &format!("\t\tprint filter_name, \" [{name}] rejecting \", net, \" in deny list\";"),
            "\t\treject;",
            "\t}",
            "\treturn true;",
            "}",
        ])
    })
}

/* quarantine, location, graceful shutdown */

pub fn quarantine_tag(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_quarantine_tag", &[], |_| {
        fbody(&[
            "function bgp_quarantine_tag(string filter_name) {",
            "\tprint filter_name, \" [bgp_quarantine_tag] quarantining \", net;",
            "\tbgp_large_community.add(BGP_LC_ACTION_QUARANTINE);",
            "\tbgp_large_community.add(BGP_LC_FILTERED);",
            "}",
        ])
    })
}

pub fn location_tag(reg: &mut FunctionRegistry, location: u32) -> String {
    reg.call("bgp_location_tag", &[FuncArg::from(location)], |_| {
        fbody(&[
            "function bgp_location_tag(string filter_name; int location) {",
            "\tbgp_large_community.add((BGP_ASN, 8, location));",
            "}",
        ])
    })
}

pub fn noexport_location(reg: &mut FunctionRegistry, location: u32) -> String {
    reg.call("bgp_noexport_location", &[FuncArg::from(location)], |_| {
        fbody(&[
            "function bgp_noexport_location(string filter_name; int location) {",
            "\tif ((BGP_ASN, 6, location) ~ bgp_large_community) then {",
            "\t\tprint filter_name, \" [bgp_noexport_location] rejecting \", net, \" marked NOEXPORT for location\";",
            "\t\treject;",
            "\t}",
            "}",
        ])
    })
}

pub fn graceful_shutdown_tag(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_graceful_shutdown_tag", &[], |_| {
        fbody(&[
            "function bgp_graceful_shutdown_tag(string filter_name) {",
            "\tbgp_community.add((65535, 0));",
            "}",
        ])
    })
}

pub fn graceful_shutdown_floor(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_graceful_shutdown_floor", &[], |_| {
        fbody(&[
            "function bgp_graceful_shutdown_floor(string filter_name) {",
            "\tif ((65535, 0) ~ bgp_community) then {",
            "\t\tprint filter_name, \" [bgp_graceful_shutdown_floor] zeroing local_pref of \", net;",
            "\t\tbgp_local_pref = 0;",
            "\t}",
            "}",
        ])
    })
}

/* well-known community handling on export */

pub fn reject_noadvertise(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_reject_noadvertise", &[], |_| {
        fbody(&[
            "function bgp_reject_noadvertise(string filter_name) {",
            "\tif ((65535, 65282) ~ bgp_community) then {",
            "\t\tprint filter_name, \" [bgp_reject_noadvertise] rejecting NOADVERTISE \", net;",
            "\t\treject;",
            "\t}",
            "}",
        ])
    })
}

pub fn reject_noexport(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_reject_noexport", &[], |_| {
        fbody(&[
            "function bgp_reject_noexport(string filter_name) {",
            "\tif ((65535, 65281) ~ bgp_community) then {",
            "\t\tprint filter_name, \" [bgp_reject_noexport] rejecting NOEXPORT \", net;",
            "\t\treject;",
            "\t}",
            "}",
        ])
    })
}

/// A blackhole carrying the peer's configured targeting tag is meant
/// for this peer specifically; clear NOEXPORT so it passes the check
/// that follows.
pub fn blackhole_target_strip(reg: &mut FunctionRegistry, target_lc: &str) -> String {
    reg.call(
        "bgp_blackhole_target_strip",
        &[FuncArg::Raw(target_lc.to_owned())],
        |reg| {
            let is_blackhole = crate::filters::is_blackhole(reg);
            fbody(&[
                "function bgp_blackhole_target_strip(string filter_name; lc target) {",
                &format!("\tif ({is_blackhole} && target ~ bgp_large_community) then {{"),
                "\t\tbgp_community.delete([(65535, 65281)]);",
                "\t}",
                "}",
            ])
        },
    )
}

/* AS-PATH mangling */

pub fn replace_aspath(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_replace_aspath", &[], |_| {
        fbody(&[
            "function bgp_replace_aspath(string filter_name) {",
            "\tif (BGP_LC_ACTION_REPLACE_ASPATH ~ bgp_large_community) then {",
            "\t\tprint filter_name, \" [bgp_replace_aspath] replacing AS-PATH of \", net;",
            "\t\tbgp_path.empty;",
            "\t\tbgp_path.prepend(BGP_ASN);",
            "\t}",
            "}",
        ])
    })
}

/// Prepend our ASN `count` times (static per-class count).
pub fn prepend(reg: &mut FunctionRegistry, count: u8) -> String {
    reg.call("bgp_prepend", &[FuncArg::Int(i64::from(count))], |_| {
        let mut lines = vec!["function bgp_prepend(string filter_name; int count) {".to_owned()];
        for n in 1..=10u8 {
            lines.push(format!("\tif (count >= {n}) then bgp_path.prepend(BGP_ASN);"));
        }
        lines.push("}".to_owned());
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        fbody(&refs)
    })
}

/// Prepend driven by a `(BGP_ASN, 5, n)` large community on the route.
pub fn prepend_dynamic(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_prepend_dynamic", &[], |reg| {
        let mut lines = vec!["function bgp_prepend_dynamic(string filter_name) {".to_owned()];
        for n in 1..=10u8 {
            let call = prepend(reg, n);
            lines.push(format!(
                "\tif ((BGP_ASN, 5, {n}) ~ bgp_large_community) then {call};"
            ));
        }
        lines.push("}".to_owned());
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        fbody(&refs)
    })
}

/* blackhole signaling on export */

pub fn blackhole_community_sub(reg: &mut FunctionRegistry) -> String {
    reg.call("bgp_blackhole_community_sub", &[], |reg| {
        let is_blackhole = crate::filters::is_blackhole(reg);
        fbody(&[
            "function bgp_blackhole_community_sub(string filter_name) {",
            &format!("\tif {is_blackhole} then {{"),
            "\t\tbgp_large_community.delete([(BGP_ASN, 666, 0..4294967295)]);",
            "\t\tbgp_community.add((65535, 666));",
            "\t}",
            "}",
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifiers_share_registry() {
        let mut reg = FunctionRegistry::new();
        assert_eq!(is_own(&mut reg), "bgp_is_own()");
        assert_eq!(is_peering(&mut reg), "bgp_is_peering()");
        /* is_peering pulls in its two sub-classifiers */
        assert!(reg.is_registered("bgp_is_peer"));
        assert!(reg.is_registered("bgp_is_routeserver"));
    }

    #[test]
    fn test_prepend_dynamic_registers_prepend() {
        let mut reg = FunctionRegistry::new();
        let expr = prepend_dynamic(&mut reg);
        assert_eq!(expr, "bgp_prepend_dynamic(filter_name)");
        assert!(reg.is_registered("bgp_prepend"));
        let text = reg.render().expect("render").to_string();
        assert!(text.contains("if (count >= 10) then bgp_path.prepend(BGP_ASN);"));
    }

    #[test]
    fn test_argument_serialization_in_calls() {
        let mut reg = FunctionRegistry::new();
        assert_eq!(
            reject_noredistribute(&mut reg, "bgp_transit"),
            "bgp_reject_noredistribute(filter_name, \"bgp_transit\")"
        );
        assert_eq!(
            prefix_allow(&mut reg, "BGP_AS65001_peer1_prefixes_v4", false),
            "bgp_prefix_allow_v4(filter_name, BGP_AS65001_peer1_prefixes_v4)"
        );
        assert_eq!(first_asn_check(&mut reg, 65001), "bgp_first_asn_check(filter_name, 65001)");
    }
}
