// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! BGP section: global constants, originated routes, one compiled
//! sub-section per peer, and the pipe into the master tables.
//!
//! Internal large-community scheme, all under our own ASN:
//!   (BGP_ASN, 1, 1)  filtered marker
//!   (BGP_ASN, 3, n)  relation (1 own, 2 customer, 3 peer, 4 transit,
//!                    5 routeserver)
//!   (BGP_ASN, 4, n)  action (1 replace AS-PATH, 2 quarantine)
//!   (BGP_ASN, 5, n)  prepend our ASN n times on export
//!   (BGP_ASN, 6, l)  do not export at location l
//!   (BGP_ASN, 8, l)  learned at location l

pub mod peer;
pub mod peertype;
pub mod templates;

use crate::names::IpVersion;
use crate::pipe::Pipe;
use crate::plan::BgpPlan;
use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;
use peer::BgpPeer;
use serde_json::json;
use tracing::info;

/// Local-preference bases per relation.
pub const PREF_OWN: u32 = 950;
pub const PREF_CUSTOMER: u32 = 750;
pub const PREF_PEER: u32 = 470;
pub const PREF_ROUTESERVER: u32 = 450;
pub const PREF_TRANSIT: u32 = 150;

#[derive(Debug)]
pub struct BgpSection {
    plan: BgpPlan,
    doc: ConfigDoc,
    configured: bool,
}

impl BgpSection {
    pub fn new(plan: BgpPlan) -> Self {
        Self {
            plan,
            doc: ConfigDoc::new(),
            configured: false,
        }
    }

    fn define_constants(&self, ctx: &mut BuildContext) {
        let constants = &mut ctx.constants;
        constants.comment("BGP");
        constants.define("BGP_ASN", self.plan.asn);
        constants.define("BGP_LC_FILTERED", "(BGP_ASN, 1, 1)");
        constants.define("BGP_LC_RELATION_OWN", "(BGP_ASN, 3, 1)");
        constants.define("BGP_LC_RELATION_CUSTOMER", "(BGP_ASN, 3, 2)");
        constants.define("BGP_LC_RELATION_PEER", "(BGP_ASN, 3, 3)");
        constants.define("BGP_LC_RELATION_TRANSIT", "(BGP_ASN, 3, 4)");
        constants.define("BGP_LC_RELATION_ROUTESERVER", "(BGP_ASN, 3, 5)");
        constants.define("BGP_LC_ACTION_REPLACE_ASPATH", "(BGP_ASN, 4, 1)");
        constants.define("BGP_LC_ACTION_QUARANTINE", "(BGP_ASN, 4, 2)");
        constants.define("BGP_PREF_OWN", PREF_OWN);
        constants.define("BGP_PREF_CUSTOMER", PREF_CUSTOMER);
        constants.define("BGP_PREF_PEER", PREF_PEER);
        constants.define("BGP_PREF_ROUTESERVER", PREF_ROUTESERVER);
        constants.define("BGP_PREF_TRANSIT", PREF_TRANSIT);
    }

    fn emit_originate(&mut self, ctx: &mut BuildContext) {
        if self.plan.originate4.is_empty() && self.plan.originate6.is_empty() {
            return;
        }
        /* originated routes enter t_bgp tagged as our own so every
         * per-class walk classifies them without knowing the protocol */
        self.doc.push("filter f_bgp_originate_import {".to_owned());
        self.doc.push("\tstring filter_name;".to_owned());
        self.doc
            .push("\tfilter_name = \"f_bgp_originate_import\";".to_owned());
        self.doc
            .push("\tbgp_large_community.add(BGP_LC_RELATION_OWN);".to_owned());
        self.doc.push("\tbgp_local_pref = BGP_PREF_OWN;".to_owned());
        self.doc.push("\taccept;".to_owned());
        self.doc.push("};".to_owned());
        self.doc.push(String::new());

        if !self.plan.originate4.is_empty() {
            let table = ctx.tables.declare("bgp", IpVersion::V4);
            self.doc.push("protocol static bgp_originate4 {".to_owned());
            self.doc.push(format!(
                "\tipv4 {{ table {table}; import filter f_bgp_originate_import; }};"
            ));
            for prefix in &self.plan.originate4 {
                self.doc.push(format!("\troute {prefix} unreachable;"));
            }
            self.doc.push("};".to_owned());
            self.doc.push(String::new());
        }
        if !self.plan.originate6.is_empty() {
            let table = ctx.tables.declare("bgp", IpVersion::V6);
            self.doc.push("protocol static bgp_originate6 {".to_owned());
            self.doc.push(format!(
                "\tipv6 {{ table {table}; import filter f_bgp_originate_import; }};"
            ));
            for prefix in &self.plan.originate6 {
                self.doc.push(format!("\troute {prefix} unreachable;"));
            }
            self.doc.push("};".to_owned());
            self.doc.push(String::new());
        }
    }
}

impl Section for BgpSection {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;

        self.define_constants(ctx);
        ctx.tables.declare("bgp", IpVersion::V4);
        ctx.tables.declare("bgp", IpVersion::V6);
        ctx.state.set(&["bgp", "asn"], json!(self.plan.asn));

        self.doc.title("BGP", 1);
        self.emit_originate(ctx);

        for (name, config) in &self.plan.peers {
            info!("compiling BGP peer '{name}'");
            let peer = BgpPeer::try_new(name, config, &self.plan, ctx)?;
            self.doc.append(peer.emit(ctx)?);
        }

        /* kernel/static/connected routes reach t_bgp through the master
         * pipe; redistribute flags decide per peer what leaves again */
        self.doc.append(
            Pipe::new("bgp", "master")
                .set_import(crate::pipe::PipeFilter::all())
                .render(),
        );
        Ok(())
    }

    fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Globals, StateMap};
    use irr::{StaticIrr, StaticLimits};

    fn empty_plan() -> BgpPlan {
        BgpPlan {
            asn: 65000,
            cluster_id: None,
            graceful_shutdown: false,
            quarantine: false,
            originate4: vec!["100.64.0.0/10".parse().expect("prefix")],
            originate6: vec![],
            peers: Default::default(),
        }
    }

    #[test]
    fn test_constants_and_originate() {
        let globals = Globals::default();
        let previous = StateMap::new();
        let (irr, pdb) = (StaticIrr::new(), StaticLimits::new());
        let mut ctx = BuildContext::new(&globals, &previous, &irr, &pdb);
        let mut section = BgpSection::new(empty_plan());
        section.configure(&mut ctx).expect("configure");

        let constants = ctx.constants.render(false).to_string();
        assert!(constants.contains("define BGP_ASN = 65000;"));
        assert!(constants.contains("define BGP_LC_RELATION_CUSTOMER = (BGP_ASN, 3, 2);"));
        assert!(constants.contains("define BGP_PREF_TRANSIT = 150;"));

        let lines = section.doc().lines();
        assert!(lines.contains(&"protocol static bgp_originate4 {".to_owned()));
        assert!(lines.contains(&"\troute 100.64.0.0/10 unreachable;".to_owned()));
        assert!(!lines.iter().any(|l| l.contains("bgp_originate6")));
        assert!(lines.contains(&"protocol pipe p_bgp_master4 {".to_owned()));
        assert!(ctx.tables.contains("bgp", IpVersion::V6));
    }

    #[test]
    fn test_configure_is_idempotent() {
        let globals = Globals::default();
        let previous = StateMap::new();
        let (irr, pdb) = (StaticIrr::new(), StaticLimits::new());
        let mut ctx = BuildContext::new(&globals, &previous, &irr, &pdb);
        let mut section = BgpSection::new(empty_plan());
        section.configure(&mut ctx).expect("configure");
        let first = section.doc().lines();
        section.configure(&mut ctx).expect("reconfigure");
        assert_eq!(first, section.doc().lines());
    }
}
