// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! RPKI section: ROA tables fed from an RTR source.

use crate::plan::RpkiPlan;
use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;

#[derive(Debug)]
pub struct RpkiSection {
    plan: RpkiPlan,
    doc: ConfigDoc,
    configured: bool,
}

impl RpkiSection {
    pub fn new(plan: RpkiPlan) -> Self {
        Self {
            plan,
            doc: ConfigDoc::new(),
            configured: false,
        }
    }
}

impl Section for RpkiSection {
    fn configure(&mut self, _ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;

        if self.plan.host.is_empty() {
            return Err(ConfigError::not_found("RTR host", "rpki"));
        }

        self.doc.title("RPKI", 1);
        /* roa tables are their own kind, not part of the t_ namespace */
        self.doc.push("roa4 table t_roa4;".to_owned());
        self.doc.push("roa6 table t_roa6;".to_owned());
        self.doc.push(String::new());
        self.doc.push("protocol rpki rpki1 {".to_owned());
        self.doc.push("\troa4 { table t_roa4; };".to_owned());
        self.doc.push("\troa6 { table t_roa6; };".to_owned());
        self.doc
            .push(format!("\tremote \"{}\" port {};", self.plan.host, self.plan.port));
        self.doc
            .push(format!("\trefresh keep {};", self.plan.refresh));
        self.doc
            .push(format!("\tretry keep {};", self.plan.refresh));
        self.doc.push("};".to_owned());
        self.doc.push(String::new());
        Ok(())
    }

    fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}
