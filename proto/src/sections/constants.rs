// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Shared constants accumulator.
//!
//! Any section may define constants while it configures; the section
//! flattens after all contributions exist. Bogon prefix lists are only
//! emitted when some consumer flipped `need_bogons` on the context.

use doc::{ConfigDoc, ORDER_EARLY};
use std::fmt::Display;

/// IPv4 bogon prefixes, rejected on import from untrusted peers.
const BOGONS_V4: &[&str] = &[
    "0.0.0.0/8+",
    "10.0.0.0/8+",
    "100.64.0.0/10+",
    "127.0.0.0/8+",
    "169.254.0.0/16+",
    "172.16.0.0/12+",
    "192.0.2.0/24+",
    "192.168.0.0/16+",
    "198.18.0.0/15+",
    "198.51.100.0/24+",
    "203.0.113.0/24+",
    "224.0.0.0/3+",
];

/// IPv6 bogon prefixes.
const BOGONS_V6: &[&str] = &[
    "::/96+",
    "::ffff:0:0/96+",
    "100::/64+",
    "2001:db8::/32+",
    "2002::/16+",
    "fc00::/7+",
    "fe80::/10+",
    "ff00::/8+",
];

#[derive(Debug, Default)]
pub struct Constants {
    doc: ConfigDoc,
}

impl Constants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a named constant: `define NAME = value;`.
    pub fn define(&mut self, name: &str, value: impl Display) {
        self.doc.append(format!("define {name} = {value};"));
    }

    /// Add a comment line ahead of a constant batch.
    pub fn comment(&mut self, text: &str) {
        self.doc.append(format!("# {text}"));
    }

    /// Add a pre-formatted batch (e.g. a multi-line prefix set).
    pub fn add_block(&mut self, lines: Vec<String>) {
        self.doc.append(lines);
    }

    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Flatten, with the banner and (when needed) the bogon lists first.
    pub fn render(&self, need_bogons: bool) -> ConfigDoc {
        let mut out = ConfigDoc::new();
        out.title("Constants", 1);
        if need_bogons {
            out.add(prefix_set("BOGONS_V4", BOGONS_V4), ORDER_EARLY);
            out.add(prefix_set("BOGONS_V6", BOGONS_V6), ORDER_EARLY);
        }
        out.add(self.doc.clone(), ORDER_EARLY + 1);
        out.append("");
        out
    }
}

/// Render a named prefix set constant, one prefix per line.
pub fn prefix_set(name: &str, prefixes: &[&str]) -> Vec<String> {
    let mut lines = Vec::with_capacity(prefixes.len() + 2);
    lines.push(format!("define {name} = ["));
    for (idx, prefix) in prefixes.iter().enumerate() {
        let sep = if idx + 1 == prefixes.len() { "" } else { "," };
        lines.push(format!("\t{prefix}{sep}"));
    }
    lines.push("];".to_owned());
    lines
}
