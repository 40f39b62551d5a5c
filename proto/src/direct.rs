// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Direct protocol section: device routes for selected interfaces.

use crate::names::IpVersion;
use crate::pipe::Pipe;
use crate::plan::DirectPlan;
use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;

#[derive(Debug)]
pub struct DirectSection {
    plan: DirectPlan,
    doc: ConfigDoc,
    configured: bool,
}

impl DirectSection {
    pub fn new(plan: DirectPlan) -> Self {
        Self {
            plan,
            doc: ConfigDoc::new(),
            configured: false,
        }
    }
}

impl Section for DirectSection {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;

        if self.plan.interfaces.is_empty() {
            return Err(ConfigError::InvalidInterface {
                interface: "direct".to_owned(),
                reason: "direct protocol requires at least one interface".to_owned(),
            });
        }

        self.doc.title("Direct", 1);
        for version in IpVersion::BOTH {
            let table = ctx.tables.declare("direct", *version);
            self.doc
                .push(format!("protocol direct direct{} {{", version.suffix()));
            self.doc
                .push(format!("\t{} {{ table {table}; }};", version.channel()));
            let quoted: Vec<String> = self
                .plan
                .interfaces
                .iter()
                .map(|ifname| format!("\"{ifname}\""))
                .collect();
            self.doc.push(format!("\tinterface {};", quoted.join(", ")));
            self.doc.push("};".to_owned());
            self.doc.push(String::new());
        }
        self.doc.append(Pipe::new("direct", "master").render());
        Ok(())
    }

    fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}
