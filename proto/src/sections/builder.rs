// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! The root builder: one plan in, one configuration document and one
//! updated state mapping out.
//!
//! Pass 1 configures every section while the shared accumulators
//! (constants, functions, tables) collect contributions; pass 2
//! flattens in the fixed assembly order. Nothing is observable until
//! the whole build succeeded, so a failed build changes nothing.

use crate::plan::NetworkPlan;
use crate::sections::logging::LoggingSection;
use crate::sections::main::MainSection;
use crate::sections::protocols::ProtocolsSection;
use crate::sections::routerid::RouterIdSection;
use crate::{BuildContext, Section};
use config::{ConfigError, Globals, StateMap};
use doc::ConfigDoc;
use irr::{IrrSource, PrefixLimitSource};
use tracing::info;

/// The result of one successful build.
#[derive(Debug)]
pub struct BuildOutput {
    /// The configuration document, line by line.
    pub lines: Vec<String>,
    /// State to persist for the next run.
    pub state: StateMap,
}

impl BuildOutput {
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

pub struct Builder<'a> {
    globals: &'a Globals,
    previous: &'a StateMap,
    irr: &'a dyn IrrSource,
    limits: &'a dyn PrefixLimitSource,
}

impl<'a> Builder<'a> {
    pub fn new(
        globals: &'a Globals,
        previous: &'a StateMap,
        irr: &'a dyn IrrSource,
        limits: &'a dyn PrefixLimitSource,
    ) -> Self {
        Self {
            globals,
            previous,
            irr,
            limits,
        }
    }

    pub fn build(&self, plan: NetworkPlan) -> Result<BuildOutput, ConfigError> {
        let mut ctx = BuildContext::new(self.globals, self.previous, self.irr, self.limits);

        let mut logging = LoggingSection::new();
        let mut main = MainSection::new();
        let mut router_id = RouterIdSection::new(plan.router_id);
        let mut protocols = ProtocolsSection::new(plan);

        logging.configure(&mut ctx)?;
        main.configure(&mut ctx)?;
        router_id.configure(&mut ctx)?;
        protocols.configure(&mut ctx)?;

        let mut doc = ConfigDoc::new();
        doc.append(logging.doc().clone());
        doc.append(main.doc().clone());
        doc.append(router_id.doc().clone());
        if !ctx.constants.is_empty() || ctx.need_bogons {
            doc.append(ctx.constants.render(ctx.need_bogons));
        }
        if !ctx.functions.is_empty() {
            let mut functions = ConfigDoc::new();
            functions.title("Functions", 1);
            functions.append(
                ctx.functions
                    .render()
                    .map_err(|e| ConfigError::Internal(e.to_string()))?,
            );
            doc.append(functions);
        }
        doc.append(ctx.tables.render());
        doc.append(protocols.doc().clone());

        let output = BuildOutput {
            lines: doc.lines(),
            state: ctx.state,
        };
        info!("built configuration, {} lines", output.lines.len());
        Ok(output)
    }
}
