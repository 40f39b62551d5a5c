// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! OSPF section: v2 for IPv4, v3 for IPv6.

use crate::names::IpVersion;
use crate::pipe::Pipe;
use crate::plan::{OspfAreaConfig, OspfInterfaceConfig, OspfPlan};
use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;
use tracing::debug;

#[derive(Debug)]
pub struct OspfSection {
    plan: OspfPlan,
    doc: ConfigDoc,
    configured: bool,
}

impl OspfSection {
    pub fn new(plan: OspfPlan) -> Self {
        Self {
            plan,
            doc: ConfigDoc::new(),
            configured: false,
        }
    }

    fn validate_area(area_name: &str, area: &OspfAreaConfig) -> Result<(), ConfigError> {
        if area.interfaces.is_empty() {
            return Err(ConfigError::InvalidArea {
                area: area_name.to_owned(),
                reason: "area has no interfaces".to_owned(),
            });
        }
        for (ifname, iface) in &area.interfaces {
            if iface.stub && iface.ecmp_weight.is_some() {
                return Err(ConfigError::InvalidInterface {
                    interface: ifname.to_owned(),
                    reason: "option 'ecmp_weight' is not supported on a stub interface"
                        .to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Effective interface tunables: explicit config, then pattern-matched
    /// cost overrides from previous-run state under `ospf.+cost`.
    fn effective(
        ctx: &BuildContext,
        ifname: &str,
        iface: &OspfInterfaceConfig,
    ) -> Result<OspfInterfaceConfig, ConfigError> {
        let mut out = iface.clone();
        if let Some(value) = ctx.previous.override_for(&["ospf", "+cost"], ifname) {
            let cost = value.as_u64().and_then(|v| u16::try_from(v).ok()).ok_or_else(|| {
                ConfigError::InvalidInterface {
                    interface: ifname.to_owned(),
                    reason: "state override for 'cost' is not an integer".to_owned(),
                }
            })?;
            debug!("OSPF interface {ifname}: cost {cost} from state override");
            out.cost = Some(cost);
        }
        Ok(out)
    }

    fn render_interface(doc: &mut ConfigDoc, ifname: &str, iface: &OspfInterfaceConfig) {
        if *iface == OspfInterfaceConfig::default() {
            doc.push(format!("\t\tinterface \"{ifname}\";"));
            return;
        }
        doc.push(format!("\t\tinterface \"{ifname}\" {{"));
        if let Some(cost) = iface.cost {
            doc.push(format!("\t\t\tcost {cost};"));
        }
        if let Some(weight) = iface.ecmp_weight {
            doc.push(format!("\t\t\tecmp weight {weight};"));
        }
        if let Some(hello) = iface.hello_time {
            doc.push(format!("\t\t\thello {hello};"));
        }
        if let Some(wait) = iface.wait_time {
            doc.push(format!("\t\t\twait {wait};"));
        }
        if iface.stub {
            doc.push("\t\t\tstub;".to_owned());
        }
        doc.push("\t\t};".to_owned());
    }
}

impl Section for OspfSection {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;

        if self.plan.areas.is_empty() {
            return Err(ConfigError::InvalidArea {
                area: "ospf".to_owned(),
                reason: "OSPF requires at least one area".to_owned(),
            });
        }
        for (area_name, area) in &self.plan.areas {
            Self::validate_area(area_name, area)?;
        }

        self.doc.title("OSPF", 1);
        let versions: Vec<IpVersion> = IpVersion::BOTH
            .iter()
            .copied()
            .filter(|v| match v {
                IpVersion::V4 => self.plan.v4,
                IpVersion::V6 => self.plan.v6,
            })
            .collect();
        for version in &versions {
            let table = ctx.tables.declare("ospf", *version);
            let keyword = match version {
                IpVersion::V4 => "v2",
                IpVersion::V6 => "v3",
            };
            self.doc
                .push(format!("protocol ospf {keyword} ospf{} {{", version.suffix()));
            self.doc
                .push(format!("\t{} {{ table {table}; }};", version.channel()));
            for (area_name, area) in &self.plan.areas {
                self.doc.push(format!("\tarea {area_name} {{"));
                if area.stub {
                    self.doc.push("\t\tstub;".to_owned());
                }
                for (ifname, iface) in &area.interfaces {
                    let iface = Self::effective(ctx, ifname, iface)?;
                    Self::render_interface(&mut self.doc, ifname, &iface);
                }
                self.doc.push("\t};".to_owned());
            }
            self.doc.push("};".to_owned());
            self.doc.push(String::new());
        }
        self.doc
            .append(Pipe::new("ospf", "master").set_versions(&versions).render());
        Ok(())
    }

    fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}
