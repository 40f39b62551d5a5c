// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Shared filter-function templates: route classification and bounding
//! helpers referenced by every protocol compiler. Each helper registers
//! its declaration on first use and returns the call expression.

use functions::{FuncArg, FunctionRegistry};

/// Join template lines into one declaration body.
pub fn fbody(lines: &[&str]) -> String {
    lines.join("\n")
}

pub fn is_default(reg: &mut FunctionRegistry) -> String {
    reg.call_plain("is_default", &[], |_| {
        fbody(&[
            "function is_default() {",
            "\tif (net.type = NET_IP4 && net = 0.0.0.0/0) then return true;",
            "\tif (net.type = NET_IP6 && net = ::/0) then return true;",
            "\treturn false;",
            "}",
        ])
    })
}

pub fn is_blackhole(reg: &mut FunctionRegistry) -> String {
    reg.call_plain("is_blackhole", &[], |_| {
        fbody(&[
            "function is_blackhole() {",
            "\tif ((65535, 666) ~ bgp_community) then return true;",
            "\tif (dest = RTD_BLACKHOLE) then return true;",
            "\treturn false;",
            "}",
        ])
    })
}

pub fn is_kernel(reg: &mut FunctionRegistry) -> String {
    reg.call_plain("is_kernel", &[], |_| {
        fbody(&[
            "function is_kernel() {",
            "\tif (source = RTS_INHERIT) then return true;",
            "\treturn false;",
            "}",
        ])
    })
}

pub fn is_static(reg: &mut FunctionRegistry) -> String {
    reg.call_plain("is_static", &[], |_| {
        fbody(&[
            "function is_static() {",
            "\tif (source = RTS_STATIC) then return true;",
            "\treturn false;",
            "}",
        ])
    })
}

pub fn is_bgp(reg: &mut FunctionRegistry) -> String {
    reg.call_plain("is_bgp", &[], |_| {
        fbody(&[
            "function is_bgp() {",
            "\tif (source = RTS_BGP) then return true;",
            "\treturn false;",
            "}",
        ])
    })
}

pub fn is_connected(reg: &mut FunctionRegistry) -> String {
    reg.call_plain("is_connected", &[], |_| {
        fbody(&[
            "function is_connected() {",
            "\tif (source = RTS_DEVICE) then return true;",
            "\treturn false;",
            "}",
        ])
    })
}

/// Reject bogon prefixes. Caller must flip `need_bogons` on the build
/// context so the constant lists are emitted.
pub fn reject_bogons(reg: &mut FunctionRegistry) -> String {
    reg.call("filter_reject_bogons", &[], |_| {
        fbody(&[
            "function filter_reject_bogons(string filter_name) {",
            "\tif (net.type = NET_IP4 && net ~ BOGONS_V4) then {",
            "\t\tprint filter_name, \" [filter_reject_bogons] rejecting bogon \", net;",
            "\t\treject;",
            "\t}",
            "\tif (net.type = NET_IP6 && net ~ BOGONS_V6) then {",
            "\t\tprint filter_name, \" [filter_reject_bogons] rejecting bogon \", net;",
            "\t\treject;",
            "\t}",
            "}",
        ])
    })
}

/// Reject prefixes outside [minlen, maxlen] for the given IP version.
pub fn prefix_len_bound(reg: &mut FunctionRegistry, minlen: u8, maxlen: u8, v6: bool) -> String {
    let name = if v6 {
        "filter_prefix_len_v6"
    } else {
        "filter_prefix_len_v4"
    };
    let net_type = if v6 { "NET_IP6" } else { "NET_IP4" };
    reg.call(
        name,
        &[FuncArg::Int(i64::from(minlen)), FuncArg::Int(i64::from(maxlen))],
        |_| {
            fbody(&[
                &format!("function {name}(string filter_name; int minlen; int maxlen) {{"),
                &format!("\tif (net.type != {net_type}) then return true;"),
                "\tif (net.len < minlen || net.len > maxlen) then {",
                &format!(
                    "\t\tprint filter_name, \" [{name}] rejecting \", net, \" length out of bounds\";"
                ),
                "\t\treject;",
                "\t}",
                "\treturn true;",
                "}",
            ])
        },
    )
}

/// Reject AS-PATHs outside [minlen, maxlen].
pub fn aspath_len_bound(reg: &mut FunctionRegistry, minlen: u8, maxlen: u8) -> String {
    reg.call(
        "filter_aspath_len",
        &[FuncArg::Int(i64::from(minlen)), FuncArg::Int(i64::from(maxlen))],
        |_| {
            fbody(&[
                "function filter_aspath_len(string filter_name; int minlen; int maxlen) {",
                "\tif (bgp_path.len < minlen || bgp_path.len > maxlen) then {",
                "\t\tprint filter_name, \" [filter_aspath_len] rejecting \", net, \" AS-PATH length out of bounds\";",
                "\t\treject;",
                "\t}",
                "\treturn true;",
                "}",
            ])
        },
    )
}

/// Reject routes carrying more than `maxlen` communities.
pub fn community_len_bound(reg: &mut FunctionRegistry, maxlen: u8, large: bool) -> String {
    let (name, attr) = if large {
        ("filter_lc_len", "bgp_large_community")
    } else {
        ("filter_community_len", "bgp_community")
    };
    reg.call(name, &[FuncArg::Int(i64::from(maxlen))], |_| {
        fbody(&[
            &format!("function {name}(string filter_name; int maxlen) {{"),
            &format!("\tif ({attr}.len > maxlen) then {{"),
            &format!("\t\tprint filter_name, \" [{name}] rejecting \", net, \" too many communities\";"),
            "\t\treject;",
            "\t}",
            "\treturn true;",
            "}",
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classifiers_register_once() {
        let mut reg = FunctionRegistry::new();
        assert_eq!(is_default(&mut reg), "is_default()");
        assert_eq!(is_default(&mut reg), "is_default()");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_bound_calls_carry_arguments() {
        let mut reg = FunctionRegistry::new();
        let expr = prefix_len_bound(&mut reg, 8, 24, false);
        assert_eq!(expr, "filter_prefix_len_v4(filter_name, 8, 24)");
        /* same template, different arguments: body registered once */
        let expr = prefix_len_bound(&mut reg, 16, 28, false);
        assert_eq!(expr, "filter_prefix_len_v4(filter_name, 16, 28)");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_distinct_templates_per_version() {
        let mut reg = FunctionRegistry::new();
        prefix_len_bound(&mut reg, 8, 24, false);
        prefix_len_bound(&mut reg, 16, 48, true);
        assert!(reg.is_registered("filter_prefix_len_v4"));
        assert!(reg.is_registered("filter_prefix_len_v6"));
    }

    #[test]
    fn test_rendered_bodies_are_functions() {
        let mut reg = FunctionRegistry::new();
        reject_bogons(&mut reg);
        community_len_bound(&mut reg, 100, true);
        let text = reg.render().expect("render").to_string();
        assert!(text.contains("function filter_reject_bogons(string filter_name) {"));
        assert!(text.contains("function filter_lc_len(string filter_name; int maxlen) {"));
    }
}
