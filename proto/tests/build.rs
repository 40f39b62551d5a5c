// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

use birdgen_proto as proto;

use config::{Globals, StateMap};
use irr::{PrefixLimits, ResolvedPrefixes, StaticIrr, StaticLimits};
use proto::plan::NetworkPlan;
use proto::sections::builder::{BuildOutput, Builder};
use tracing_test::traced_test;

const PLAN: &str = r#"
router_id: 192.0.2.1
static_routes:
  - prefix: 100.101.0.0/24
    nexthop: 192.0.2.9
bgp:
  asn: 65001
  originate4:
    - 100.64.0.0/10
  peers:
    ab-1:
      peer_type: customer
      asn: 65010
      neighbor4: 192.0.2.2
      source_address4: 192.0.2.1
      import_filter:
        as_sets:
          - AS-EXAMPLE
    core1:
      peer_type: internal
      asn: 65001
      neighbor4: 192.0.2.3
      source_address4: 192.0.2.1
      neighbor6: 2001:db8::3
      source_address6: 2001:db8::1
"#;

fn sources() -> (StaticIrr, StaticLimits) {
    let irr = StaticIrr::new()
        .with_asns("AS-EXAMPLE", vec![65010, 65020])
        .with_prefixes(
            "AS-EXAMPLE",
            ResolvedPrefixes {
                ipv4: vec!["100.101.0.0/22".parse().expect("prefix")],
                ipv6: vec![],
            },
        );
    let limits = StaticLimits::new().with_limits(
        65010,
        PrefixLimits {
            ipv4: 100,
            ipv6: 20,
        },
    );
    (irr, limits)
}

fn build(previous: StateMap) -> BuildOutput {
    let plan: NetworkPlan = serde_yaml_ng::from_str(PLAN).expect("parse");
    let globals = Globals {
        test_mode: true,
        ..Default::default()
    };
    let (irr, limits) = sources();
    Builder::new(&globals, &previous, &irr, &limits)
        .build(plan)
        .expect("build")
}

#[test]
#[traced_test]
fn full_build_renders_every_section() {
    let text = build(StateMap::new()).text();

    assert!(text.contains("router id 192.0.2.1;"));
    assert!(text.contains("protocol static static4 {"));
    assert!(text.contains("define BGP_ASN = 65001;"));
    assert!(text.contains("protocol device {"));
    assert!(text.contains("protocol kernel kernel4 {"));
}

#[test]
fn hyphenated_peer_names_render_as_symbols() {
    let text = build(StateMap::new()).text();

    /* the plan key keeps its hyphen; every emitted symbol uses an
     * underscore instead */
    assert!(text.contains("protocol bgp p_AS65010_ab_14 {"));
    assert!(text.contains("filter f_bgp_AS65010_ab_1_peer_import {"));
    assert!(text.contains("table t_bgp_AS65010_ab_14;"));
    assert!(!text.contains("ab-1_"));
}

#[test]
fn peer_export_filters_exclude_own_protocol_routes() {
    let text = build(StateMap::new()).text();

    /* the customer's table holds routes its own protocol contributed;
     * those must not bounce straight back out */
    let export_at = text
        .find("filter f_bgp_AS65010_ab_1_peer_export {")
        .expect("export filter");
    let tail = &text[export_at..];
    assert!(tail.contains("\tif (proto = \"p_AS65010_ab_14\") then reject;"));

    /* dual-stack peers exclude one protocol instance per version */
    let export_at = text
        .find("filter f_bgp_AS65001_core1_peer_export {")
        .expect("export filter");
    let tail = &text[export_at..];
    assert!(tail.contains("\tif (proto = \"p_AS65001_core14\") then reject;"));
    assert!(tail.contains("\tif (proto = \"p_AS65001_core16\") then reject;"));
}

#[test]
fn glob_overrides_pick_the_last_sorted_match() {
    let previous = StateMap::from_value(serde_json::json!({
        "bgp": {"+quarantine": {"a-*": false, "ab-*": true}}
    }));
    let text = build(previous).text();

    /* both patterns match 'ab-1'; sorted ascending, 'ab-*' comes last
     * and its value wins, so the peer builds quarantined */
    let export_at = text
        .find("filter f_bgp_AS65010_ab_1_peer_export {")
        .expect("export filter");
    assert!(text[export_at..].contains("peer is quarantined"));
}

#[test]
fn state_snapshot_covers_external_data_and_peers() {
    let output = build(StateMap::new());

    assert!(output.state.get(&["irr", "AS-EXAMPLE", "asns"]).is_some());
    assert_eq!(output.state.get_u64(&["peeringdb", "65010", "ipv4"]), Some(100));
    assert!(output.state.get(&["bgp", "peers", "ab-1"]).is_some());
    assert!(output.state.get(&["bgp", "peers", "core1"]).is_some());
}
