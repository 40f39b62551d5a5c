// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Main section: header banner, VRF and kernel routing-table binding.

use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;

#[derive(Debug, Default)]
pub struct MainSection {
    doc: ConfigDoc,
    configured: bool,
}

impl MainSection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Section for MainSection {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;

        self.doc.title("Global", 1);
        if let Some(vrf) = &ctx.globals.vrf {
            let table = ctx.globals.routing_table.ok_or_else(|| {
                ConfigError::Internal(format!("vrf '{vrf}' set without a routing table id"))
            })?;
            self.doc.push(format!("# vrf {vrf} (kernel table {table})"));
        }
        self.doc
            .push("timeformat base iso long;".to_owned());
        self.doc
            .push("timeformat log iso long;".to_owned());
        self.doc
            .push("timeformat protocol iso long;".to_owned());
        self.doc.push("timeformat route iso long;".to_owned());
        self.doc.append("");
        Ok(())
    }

    fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}
