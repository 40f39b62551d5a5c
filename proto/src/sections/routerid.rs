// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Router-id section.

use crate::{BuildContext, Section};
use config::ConfigError;
use doc::ConfigDoc;
use std::net::Ipv4Addr;

#[derive(Debug)]
pub struct RouterIdSection {
    router_id: Ipv4Addr,
    doc: ConfigDoc,
    configured: bool,
}

impl RouterIdSection {
    pub fn new(router_id: Ipv4Addr) -> Self {
        Self {
            router_id,
            doc: ConfigDoc::new(),
            configured: false,
        }
    }
}

impl Section for RouterIdSection {
    fn configure(&mut self, _ctx: &mut BuildContext) -> Result<(), ConfigError> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;
        self.doc.title("Router ID", 1);
        self.doc.push(format!("router id {};", self.router_id));
        self.doc.append("");
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
    use std::str::FromStr;

    #[test]
    fn test_router_id_line() {
        let globals = Globals::default();
        let previous = StateMap::new();
        let (irr, pdb) = (StaticIrr::new(), StaticLimits::new());
        let mut ctx = BuildContext::new(&globals, &previous, &irr, &pdb);

        let mut section =
            RouterIdSection::new(Ipv4Addr::from_str("192.0.2.1").expect("Bad address"));
        section.configure(&mut ctx).expect("configure");
        assert!(section.doc().lines().contains(&"router id 192.0.2.1;".to_owned()));
    }
}
