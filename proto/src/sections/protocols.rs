// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Protocols section: every protocol the plan enables, in fixed order.
//!
//! Device is always present (BIRD needs it for interface state), then
//! kernel, direct, static, RIP, OSPF, RPKI and finally BGP. The order
//! is part of the output contract, not cosmetic.

use crate::bgp::BgpSection;
use crate::direct::DirectSection;
use crate::kernel::KernelSection;
use crate::ospf::OspfSection;
use crate::plan::NetworkPlan;
use crate::rip::RipSection;
use crate::rpki::RpkiSection;
use crate::statics::StaticSection;
use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;

pub struct ProtocolsSection {
    sections: Vec<Box<dyn Section>>,
    doc: ConfigDoc,
    configured: bool,
}

impl ProtocolsSection {
    pub fn new(plan: NetworkPlan) -> Self {
        let mut sections: Vec<Box<dyn Section>> = Vec::new();
        sections.push(Box::new(KernelSection::new(plan.kernel)));
        if let Some(direct) = plan.direct {
            sections.push(Box::new(DirectSection::new(direct)));
        }
        if !plan.static_routes.is_empty() {
            sections.push(Box::new(StaticSection::new(plan.static_routes)));
        }
        if let Some(rip) = plan.rip {
            sections.push(Box::new(RipSection::new(rip)));
        }
        if let Some(ospf) = plan.ospf {
            sections.push(Box::new(OspfSection::new(ospf)));
        }
        if let Some(rpki) = plan.rpki {
            sections.push(Box::new(RpkiSection::new(rpki)));
        }
        if let Some(bgp) = plan.bgp {
            sections.push(Box::new(BgpSection::new(bgp)));
        }
        Self {
            sections,
            doc: ConfigDoc::new(),
            configured: false,
        }
    }
}

impl Section for ProtocolsSection {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;

        self.doc.title("Protocols", 1);
        self.doc.push("protocol device {".to_owned());
        self.doc.push("\tscan time 10;".to_owned());
        self.doc.push("};".to_owned());
        self.doc.push(String::new());

        for section in &mut self.sections {
            section.configure(ctx)?;
        }
        for section in &self.sections {
            self.doc.append(section.doc().clone());
        }
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

    #[test]
    fn test_device_protocol_always_present() {
        let plan: NetworkPlan = serde_yaml_ng::from_str("router_id: 192.0.2.1\n").expect("parse");
        let globals = Globals::default();
        let previous = StateMap::new();
        let (irr, pdb) = (StaticIrr::new(), StaticLimits::new());
        let mut ctx = BuildContext::new(&globals, &previous, &irr, &pdb);

        let mut section = ProtocolsSection::new(plan);
        section.configure(&mut ctx).expect("configure");
        let lines = section.doc().lines();
        assert!(lines.contains(&"protocol device {".to_owned()));
        /* kernel is on by default */
        assert!(lines.iter().any(|l| l.contains("protocol kernel")));
    }

    #[test]
    fn test_protocol_order_kernel_before_bgp() {
        let yaml = r#"
router_id: 192.0.2.1
bgp:
  asn: 65000
"#;
        let plan: NetworkPlan = serde_yaml_ng::from_str(yaml).expect("parse");
        let globals = Globals::default();
        let previous = StateMap::new();
        let (irr, pdb) = (StaticIrr::new(), StaticLimits::new());
        let mut ctx = BuildContext::new(&globals, &previous, &irr, &pdb);

        let mut section = ProtocolsSection::new(plan);
        section.configure(&mut ctx).expect("configure");
        let text = section.doc().lines().join("\n");
        let kernel_at = text.find("protocol kernel").expect("kernel");
        let bgp_at = text.find("# BGP").expect("bgp banner");
        assert!(kernel_at < bgp_at);
    }
}
