// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Memoizing registry for named BIRD filter functions.
//!
//! The filter language requires every function to be declared exactly once
//! at global scope, while call sites are scattered across many peers. The
//! registry stores each template body the first time its name is touched
//! and always hands back a call expression; [`FunctionRegistry::render`]
//! then emits the declarations once, in registration order.

use doc::ConfigDoc;
use ordermap::OrderMap;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A name was marked in-flight but its body never arrived. This is a
    /// defect in the generator, not in user input.
    #[error("function template '{0}' was never resolved")]
    UnresolvedTemplate(String),
}

/// One positional argument of a generated function call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FuncArg {
    /// Pre-quoted variable reference or identifier, passed through as-is.
    Raw(String),
    /// Double-quoted string literal.
    Str(String),
    /// Decimal integer literal.
    Int(i64),
    /// `true` / `false` literal.
    Bool(bool),
}

impl Display for FuncArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuncArg::Raw(ident) => write!(f, "{ident}"),
            FuncArg::Str(s) => write!(f, "\"{s}\""),
            FuncArg::Int(v) => write!(f, "{v}"),
            FuncArg::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for FuncArg {
    fn from(s: &str) -> Self {
        FuncArg::Str(s.to_owned())
    }
}
impl From<String> for FuncArg {
    fn from(s: String) -> Self {
        FuncArg::Str(s)
    }
}
impl From<i64> for FuncArg {
    fn from(v: i64) -> Self {
        FuncArg::Int(v)
    }
}
impl From<u32> for FuncArg {
    fn from(v: u32) -> Self {
        FuncArg::Int(i64::from(v))
    }
}
impl From<bool> for FuncArg {
    fn from(v: bool) -> Self {
        FuncArg::Bool(v)
    }
}

/// Registry of named function templates, insertion-ordered.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    templates: OrderMap<String, Option<String>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference function `name`, registering `body` on first touch, and
    /// return the call expression with an implicit leading `filter_name`
    /// argument.
    pub fn call<F>(&mut self, name: &str, args: &[FuncArg], body: F) -> String
    where
        F: FnOnce(&mut Self) -> String,
    {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(FuncArg::Raw("filter_name".to_owned()));
        full.extend(args.iter().cloned());
        self.reference(name, body);
        Self::call_expr(name, &full)
    }

    /// Like [`FunctionRegistry::call`] but without the implicit
    /// `filter_name` argument.
    pub fn call_plain<F>(&mut self, name: &str, args: &[FuncArg], body: F) -> String
    where
        F: FnOnce(&mut Self) -> String,
    {
        self.reference(name, body);
        Self::call_expr(name, args)
    }

    /// Register `body` for `name` if this is the first reference. The
    /// placeholder is inserted before the body is computed so templates
    /// that reference other templates (or themselves) terminate.
    fn reference<F>(&mut self, name: &str, body: F)
    where
        F: FnOnce(&mut Self) -> String,
    {
        if self.templates.contains_key(name) {
            return;
        }
        self.templates.insert(name.to_owned(), None);
        let rendered = body(self);
        if let Some(slot) = self.templates.get_mut(name) {
            *slot = Some(rendered);
        }
    }

    fn call_expr(name: &str, args: &[FuncArg]) -> String {
        let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
        format!("{name}({})", rendered.join(", "))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Emit every registered declaration once, in registration order, each
    /// followed by a blank separator line.
    pub fn render(&self) -> Result<ConfigDoc, RegistryError> {
        let mut out = ConfigDoc::new();
        for (name, body) in &self.templates {
            let body = body
                .as_ref()
                .ok_or_else(|| RegistryError::UnresolvedTemplate(name.clone()))?;
            out += body.lines().map(str::to_owned).collect::<Vec<_>>();
            out += "";
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn noop_body(_: &mut FunctionRegistry) -> String {
        "function noop() {\n\treturn true;\n}".to_owned()
    }

    #[test]
    fn test_arg_serialization() {
        assert_eq!(FuncArg::Raw("bgp_path".to_owned()).to_string(), "bgp_path");
        assert_eq!(FuncArg::from("peer x").to_string(), "\"peer x\"");
        assert_eq!(FuncArg::from(65001u32).to_string(), "65001");
        assert_eq!(FuncArg::from(true).to_string(), "true");
        assert_eq!(FuncArg::from(false).to_string(), "false");
    }

    #[test]
    fn test_call_includes_filter_name() {
        let mut reg = FunctionRegistry::new();
        let expr = reg.call("noop", &[FuncArg::from(42u32)], noop_body);
        assert_eq!(expr, "noop(filter_name, 42)");
    }

    #[test]
    fn test_call_plain_omits_filter_name() {
        let mut reg = FunctionRegistry::new();
        let expr = reg.call_plain("noop", &[], noop_body);
        assert_eq!(expr, "noop()");
    }

    #[test]
    fn test_body_registered_once() {
        let mut reg = FunctionRegistry::new();
        let mut calls = 0;
        for _ in 0..3 {
            reg.call("noop", &[], |_| {
                calls += 1;
                "function noop() {}".to_owned()
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_recursive_template_reference() {
        let mut reg = FunctionRegistry::new();
        let expr = reg.call_plain("outer", &[], |reg| {
            let inner = reg.call_plain("inner", &[], |_| "function inner() {}".to_owned());
            format!("function outer() {{\n\t{inner};\n}}")
        });
        assert_eq!(expr, "outer()");
        assert!(reg.is_registered("inner"));
        assert!(reg.is_registered("outer"));
        /* both bodies render, registration order (outer touched first) */
        let lines = reg.render().expect("render").lines();
        assert_eq!(lines[0], "function outer() {");
        assert!(lines.iter().any(|l| l == "function inner() {}"));
    }

    #[test]
    fn test_render_dedup_and_separators() {
        let mut reg = FunctionRegistry::new();
        reg.call("noop", &[], noop_body);
        reg.call("noop", &[], noop_body);
        let lines = reg.render().expect("render").lines();
        let decls = lines
            .iter()
            .filter(|l| l.starts_with("function noop"))
            .count();
        assert_eq!(decls, 1);
        assert_eq!(lines.last().map(String::as_str), Some(""));
    }
}
