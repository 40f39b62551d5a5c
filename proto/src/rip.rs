// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! RIP section.

use crate::names::IpVersion;
use crate::pipe::Pipe;
use crate::plan::{RipInterfaceConfig, RipPlan};
use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct RipSection {
    plan: RipPlan,
    doc: ConfigDoc,
    configured: bool,
}

impl RipSection {
    pub fn new(plan: RipPlan) -> Self {
        Self {
            plan,
            doc: ConfigDoc::new(),
            configured: false,
        }
    }

    /// Effective interface tunables: explicit config, then pattern-matched
    /// overrides from previous-run state under `rip.+metric` /
    /// `rip.+update_time`.
    fn effective(
        ctx: &BuildContext,
        ifname: &str,
        iface: &RipInterfaceConfig,
    ) -> Result<RipInterfaceConfig, ConfigError> {
        let mut out = iface.clone();
        if let Some(value) = ctx.previous.override_for(&["rip", "+metric"], ifname) {
            let metric = value.as_u64().and_then(|v| u8::try_from(v).ok()).ok_or_else(|| {
                ConfigError::InvalidInterface {
                    interface: ifname.to_owned(),
                    reason: "state override for 'metric' is not a small integer".to_owned(),
                }
            })?;
            debug!("RIP interface {ifname}: metric {metric} from state override");
            out.metric = Some(metric);
        }
        if let Some(value) = ctx.previous.override_for(&["rip", "+update_time"], ifname) {
            let time = value.as_u64().and_then(|v| u16::try_from(v).ok()).ok_or_else(|| {
                ConfigError::InvalidInterface {
                    interface: ifname.to_owned(),
                    reason: "state override for 'update_time' is not an integer".to_owned(),
                }
            })?;
            out.update_time = Some(time);
        }
        Ok(out)
    }
}

impl Section for RipSection {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;

        if self.plan.interfaces.is_empty() {
            return Err(ConfigError::InvalidInterface {
                interface: "rip".to_owned(),
                reason: "RIP requires at least one interface".to_owned(),
            });
        }

        self.doc.title("RIP", 1);
        for version in IpVersion::BOTH {
            let table = ctx.tables.declare("rip", *version);
            let keyword = match version {
                IpVersion::V4 => "rip",
                IpVersion::V6 => "rip ng",
            };
            self.doc
                .push(format!("protocol {keyword} rip{} {{", version.suffix()));
            self.doc
                .push(format!("\t{} {{ table {table}; }};", version.channel()));
            for (ifname, iface) in &self.plan.interfaces {
                let iface = Self::effective(ctx, ifname, iface)?;
                if iface == RipInterfaceConfig::default() {
                    self.doc.push(format!("\tinterface \"{ifname}\";"));
                    continue;
                }
                self.doc.push(format!("\tinterface \"{ifname}\" {{"));
                if let Some(metric) = iface.metric {
                    self.doc.push(format!("\t\tmetric {metric};"));
                }
                if let Some(time) = iface.update_time {
                    self.doc.push(format!("\t\tupdate time {time};"));
                }
                self.doc.push("\t};".to_owned());
            }
            self.doc.push("};".to_owned());
            self.doc.push(String::new());
        }
        self.doc.append(Pipe::new("rip", "master").render());
        Ok(())
    }

    fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}
