// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Kernel protocol section: exchange between the daemon and the OS
//! routing tables.

use crate::names::IpVersion;
use crate::pipe::{Pipe, PipeFilter};
use crate::plan::KernelPlan;
use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;

#[derive(Debug, Default)]
pub struct KernelSection {
    plan: KernelPlan,
    doc: ConfigDoc,
    configured: bool,
}

impl KernelSection {
    pub fn new(plan: KernelPlan) -> Self {
        Self {
            plan,
            doc: ConfigDoc::new(),
            configured: false,
        }
    }
}

impl Section for KernelSection {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;

        self.doc.title("Kernel", 1);
        for version in IpVersion::BOTH {
            let table = ctx.tables.declare("kernel", *version);
            self.doc
                .push(format!("protocol kernel kernel{} {{", version.suffix()));
            if let Some(kernel_table) = ctx.globals.routing_table {
                self.doc.push(format!("\tkernel table {kernel_table};"));
            }
            if let Some(vrf) = &ctx.globals.vrf {
                self.doc.push(format!("\tvrf \"{vrf}\";"));
            }
            if self.plan.persist {
                self.doc.push("\tpersist;".to_owned());
            }
            if self.plan.learn {
                self.doc.push("\tlearn;".to_owned());
            }
            self.doc.push(format!("\t{} {{", version.channel()));
            self.doc.push(format!("\t\ttable {table};"));
            let export = if self.plan.export { "all" } else { "none" };
            self.doc.push(format!("\t\texport {export};"));
            let import = if self.plan.learn { "all" } else { "none" };
            self.doc.push(format!("\t\timport {import};"));
            self.doc.push("\t};".to_owned());
            self.doc.push("};".to_owned());
            self.doc.push(String::new());
        }

        /* master feeds the kernel table; learned routes flow back */
        let import = if self.plan.learn {
            PipeFilter::all()
        } else {
            PipeFilter::none()
        };
        self.doc
            .append(Pipe::new("kernel", "master").set_import(import).render());
        Ok(())
    }

    fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}
