// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Ordered document builder used to assemble BIRD configuration text.
//!
//! A [`ConfigDoc`] accumulates units (single lines, line blocks or nested
//! documents) in numeric priority buckets. Flattening walks the buckets in
//! ascending order; within a bucket, insertion order is preserved. All
//! contributions happen before the first flatten (two-pass build), so
//! `lines()` is pure and may be called any number of times.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::AddAssign;

/// Default priority band for primary content.
pub const ORDER_EARLY: u16 = 10;
/// Priority band for trailing content appended behind another
/// component's primary content.
pub const ORDER_LATE: u16 = 50;

/// One unit of output in a [`ConfigDoc`] bucket.
#[derive(Clone, Debug)]
pub enum DocUnit {
    /// A single literal line.
    Line(String),
    /// An ordered batch of literal lines.
    Block(Vec<String>),
    /// A nested, already-assembled sub-document.
    Nested(ConfigDoc),
}

impl From<String> for DocUnit {
    fn from(line: String) -> Self {
        DocUnit::Line(line)
    }
}
impl From<&str> for DocUnit {
    fn from(line: &str) -> Self {
        DocUnit::Line(line.to_owned())
    }
}
impl From<Vec<String>> for DocUnit {
    fn from(block: Vec<String>) -> Self {
        DocUnit::Block(block)
    }
}
impl From<ConfigDoc> for DocUnit {
    fn from(doc: ConfigDoc) -> Self {
        DocUnit::Nested(doc)
    }
}

/// Object to ease building ordered configuration documents.
#[derive(Clone, Debug, Default)]
pub struct ConfigDoc {
    buckets: BTreeMap<u16, Vec<DocUnit>>,
}

impl ConfigDoc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `unit` to the bucket for `order`.
    pub fn add(&mut self, unit: impl Into<DocUnit>, order: u16) {
        self.buckets.entry(order).or_default().push(unit.into());
    }

    /// Append `unit` at the late priority band ([`ORDER_LATE`]).
    pub fn append(&mut self, unit: impl Into<DocUnit>) {
        self.add(unit, ORDER_LATE);
    }

    /// Append `unit` at the early priority band ([`ORDER_EARLY`]).
    pub fn push(&mut self, unit: impl Into<DocUnit>) {
        self.add(unit, ORDER_EARLY);
    }

    /// Append a `#`-boxed banner at the given order.
    pub fn title(&mut self, text: &str, order: u16) {
        self.add(
            vec![
                "#".to_owned(),
                format!("# {text}"),
                "#".to_owned(),
                String::new(),
            ],
            order,
        );
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Flatten all buckets in ascending order, preserving insertion
    /// order within a bucket and recursing into nested documents.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for units in self.buckets.values() {
            for unit in units {
                match unit {
                    DocUnit::Line(line) => out.push(line.clone()),
                    DocUnit::Block(block) => out.extend(block.iter().cloned()),
                    DocUnit::Nested(doc) => out.extend(doc.lines()),
                }
            }
        }
        out
    }
}

/// Impl Display for [`ConfigDoc`]. This provides to_string().
impl Display for ConfigDoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Make it very easy to add lines at the early band.
impl AddAssign<String> for ConfigDoc {
    fn add_assign(&mut self, rhs: String) {
        self.push(rhs);
    }
}
impl AddAssign<&str> for ConfigDoc {
    fn add_assign(&mut self, rhs: &str) {
        self.push(rhs);
    }
}
impl AddAssign<Vec<String>> for ConfigDoc {
    fn add_assign(&mut self, rhs: Vec<String>) {
        self.push(rhs);
    }
}
impl AddAssign<ConfigDoc> for ConfigDoc {
    fn add_assign(&mut self, rhs: ConfigDoc) {
        self.push(rhs);
    }
}
