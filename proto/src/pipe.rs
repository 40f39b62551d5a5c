// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Pipe protocols connecting pairs of internal routing tables.

use crate::names::{IpVersion, filter_name, pipe_name, table_name};
use doc::ConfigDoc;

/// Per-direction filter policy of a pipe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipeFilter {
    /// Fixed keyword, e.g. `export all;` / `import none;`.
    Literal(String),
    /// Filter name carries the IP-version suffix.
    Versioned,
    /// One filter shared by both IP versions.
    Unversioned,
}

impl PipeFilter {
    pub fn all() -> Self {
        PipeFilter::Literal("all".to_owned())
    }
    pub fn none() -> Self {
        PipeFilter::Literal("none".to_owned())
    }

    fn clause(&self, direction: &str, src: &str, dst: &str, version: IpVersion) -> String {
        match self {
            PipeFilter::Literal(keyword) => format!("\t{direction} {keyword};"),
            PipeFilter::Versioned => format!(
                "\t{direction} filter {};",
                filter_name(src, dst, direction, Some(version))
            ),
            PipeFilter::Unversioned => {
                format!("\t{direction} filter {};", filter_name(src, dst, direction, None))
            }
        }
    }
}

/// A pipe between two tables, by stripped base name.
#[derive(Clone, Debug)]
pub struct Pipe {
    src: String,
    dst: String,
    export: PipeFilter,
    import: PipeFilter,
    versions: Vec<IpVersion>,
}

impl Pipe {
    pub fn new(src: &str, dst: &str) -> Self {
        Self {
            src: crate::names::strip_table(src).to_owned(),
            dst: crate::names::strip_table(dst).to_owned(),
            export: PipeFilter::all(),
            import: PipeFilter::none(),
            versions: IpVersion::BOTH.to_vec(),
        }
    }

    pub fn set_export(mut self, filter: PipeFilter) -> Self {
        self.export = filter;
        self
    }

    pub fn set_import(mut self, filter: PipeFilter) -> Self {
        self.import = filter;
        self
    }

    /// Restrict to a subset of IP versions (e.g. an IPv4-only peer).
    pub fn set_versions(mut self, versions: &[IpVersion]) -> Self {
        self.versions = versions.to_vec();
        self
    }

    /// Filter names this pipe references, for emission by the caller.
    pub fn filter_names(&self, direction: &str) -> Vec<String> {
        let policy = match direction {
            "export" => &self.export,
            _ => &self.import,
        };
        match policy {
            PipeFilter::Literal(_) => vec![],
            PipeFilter::Unversioned => vec![filter_name(&self.src, &self.dst, direction, None)],
            PipeFilter::Versioned => self
                .versions
                .iter()
                .map(|v| filter_name(&self.src, &self.dst, direction, Some(*v)))
                .collect(),
        }
    }

    pub fn render(&self) -> ConfigDoc {
        let mut out = ConfigDoc::new();
        for version in &self.versions {
            out.push(format!(
                "protocol pipe {} {{",
                pipe_name(&self.src, &self.dst, *version)
            ));
            out.push(format!("\ttable {};", table_name(&self.src, *version)));
            out.push(format!("\tpeer table {};", table_name(&self.dst, *version)));
            out.push(self.export.clause("export", &self.src, &self.dst, *version));
            out.push(self.import.clause("import", &self.src, &self.dst, *version));
            out.push("};".to_owned());
            out.push(String::new());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unversioned_export_filter_naming() {
        let pipe = Pipe::new("t_bgp_AS65001_peerX", "t_bgp")
            .set_export(PipeFilter::Unversioned)
            .set_import(PipeFilter::Unversioned)
            .set_versions(&[IpVersion::V4]);
        let lines = pipe.render().lines();
        assert_eq!(lines[0], "protocol pipe p_bgp_AS65001_peerX_bgp4 {");
        assert_eq!(lines[1], "\ttable t_bgp_AS65001_peerX4;");
        assert_eq!(lines[2], "\tpeer table t_bgp4;");
        assert_eq!(lines[3], "\texport filter f_bgp_AS65001_peerX_bgp_export;");
        assert_eq!(lines[4], "\timport filter f_bgp_AS65001_peerX_bgp_import;");
    }

    #[test]
    fn test_versioned_filter_names_per_stack() {
        let pipe = Pipe::new("master", "t_kernel").set_export(PipeFilter::Versioned);
        assert_eq!(
            pipe.filter_names("export"),
            vec!["f_master_kernel_export4", "f_master_kernel_export6"]
        );
        assert_eq!(pipe.filter_names("import"), Vec::<String>::new());
    }

    #[test]
    fn test_literal_clauses() {
        let pipe = Pipe::new("t_a", "t_b").set_versions(&[IpVersion::V6]);
        let lines = pipe.render().lines();
        assert!(lines.contains(&"\texport all;".to_owned()));
        assert!(lines.contains(&"\timport none;".to_owned()));
    }
}
