// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Shared routing-table accumulator.
//!
//! Protocol sections declare the tables they need; each (base, version)
//! pair is declared at most once, in first-declaration order.

use crate::names::{IpVersion, table_name};
use doc::ConfigDoc;
use ordermap::OrderSet;

#[derive(Debug, Default)]
pub struct Tables {
    declared: OrderSet<(String, IpVersion)>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table for `base` (stripped name) and return its full
    /// name. Repeat declarations are collapsed.
    pub fn declare(&mut self, base: &str, version: IpVersion) -> String {
        self.declared.insert((base.to_owned(), version));
        table_name(base, version)
    }

    pub fn contains(&self, base: &str, version: IpVersion) -> bool {
        self.declared.contains(&(base.to_owned(), version))
    }

    pub fn render(&self) -> ConfigDoc {
        let mut out = ConfigDoc::new();
        out.title("Tables", 1);
        for (base, version) in &self.declared {
            out.push(format!(
                "{} table {};",
                version.channel(),
                table_name(base, *version)
            ));
        }
        out.append("");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_declare_dedup_and_order() {
        let mut tables = Tables::new();
        assert_eq!(tables.declare("bgp", IpVersion::V4), "t_bgp4");
        assert_eq!(tables.declare("bgp_AS65001_peerX", IpVersion::V4), "t_bgp_AS65001_peerX4");
        tables.declare("bgp", IpVersion::V4);
        let lines = tables.render().lines();
        let decls: Vec<_> = lines.iter().filter(|l| l.contains("table")).collect();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0], "ipv4 table t_bgp4;");
        assert_eq!(decls[1], "ipv4 table t_bgp_AS65001_peerX4;");
    }

    #[test]
    fn test_versions_are_distinct() {
        let mut tables = Tables::new();
        tables.declare("bgp", IpVersion::V4);
        tables.declare("bgp", IpVersion::V6);
        assert!(tables.contains("bgp", IpVersion::V6));
        let lines = tables.render().lines();
        assert!(lines.contains(&"ipv6 table t_bgp6;".to_owned()));
    }
}
