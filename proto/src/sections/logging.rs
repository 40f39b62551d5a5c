// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Logging section: where the daemon logs and how loudly.

use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;

#[derive(Debug, Default)]
pub struct LoggingSection {
    doc: ConfigDoc,
    configured: bool,
}

impl LoggingSection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Section for LoggingSection {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;

        self.doc.title("Logging", 1);
        let target = match &ctx.globals.log_file {
            Some(path) => format!("\"{path}\""),
            None => "stderr".to_owned(),
        };
        let classes = if ctx.globals.debug { "all" } else { "{ error, fatal, warning }" };
        self.doc.push(format!("log {target} {classes};"));
        if ctx.globals.debug {
            self.doc.push("debug protocols all;".to_owned());
        }
        self.doc.append("");
        Ok(())
    }

    fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}
