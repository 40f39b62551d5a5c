// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Operator override directives from previous-run state.
//!
//! Directives live under keys like `bgp.+graceful_shutdown` and are keyed
//! by exact peer name or by glob pattern. Precedence: an exact-name key
//! always wins; otherwise all matching glob keys are sorted ascending and
//! the last one wins.

use crate::statemap::StateMap;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Compile a glob pattern (`*`, `?`) into an anchored regex.
fn glob_regex(pattern: &str) -> Option<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            ch => expr.push_str(&regex::escape(&ch.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).ok()
}

pub fn glob_matches(pattern: &str, name: &str) -> bool {
    glob_regex(pattern).is_some_and(|re| re.is_match(name))
}

impl StateMap {
    /// Look up the override directive for `name` under
    /// `directive_path` (e.g. `["bgp", "+graceful_shutdown"]`).
    pub fn override_for(&self, directive_path: &[&str], name: &str) -> Option<&Value> {
        let directives = self.get_object(directive_path)?;

        if let Some(value) = directives.get(name) {
            debug!("override {directive_path:?}: exact match for '{name}'");
            return Some(value);
        }

        /* globs sorted ascending; the last matching one wins */
        let mut keys: Vec<&String> = directives.keys().collect();
        keys.sort();
        let mut winner = None;
        for key in keys {
            if glob_matches(key, name) {
                winner = directives.get(key);
            }
        }
        if winner.is_some() {
            debug!("override {directive_path:?}: glob match for '{name}'");
        }
        winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_glob_matching() {
        assert!(glob_matches("a-*", "a-1"));
        assert!(glob_matches("peer?", "peer1"));
        assert!(!glob_matches("peer?", "peer10"));
        assert!(!glob_matches("b-*", "a-1"));
        /* regex metacharacters in the pattern are literal */
        assert!(glob_matches("as65000.peer", "as65000.peer"));
        assert!(!glob_matches("as65000.peer", "as65000xpeer"));
    }

    #[test]
    fn test_exact_key_beats_globs() {
        let state = StateMap::from_value(json!({
            "bgp": {"+quarantine": {"ab-1": false, "ab-*": true}}
        }));
        let value = state.override_for(&["bgp", "+quarantine"], "ab-1");
        assert_eq!(value, Some(&json!(false)));
    }

    #[test]
    fn test_later_sorted_glob_wins() {
        let state = StateMap::from_value(json!({
            "bgp": {"+graceful_shutdown": {"a-*": false, "ab-*": true}}
        }));
        /* "ab-1" matches both; "ab-*" sorts after "a-*" and wins */
        let value = state.override_for(&["bgp", "+graceful_shutdown"], "ab-1");
        assert_eq!(value, Some(&json!(true)));
    }

    #[test]
    fn test_no_match_returns_none() {
        let state = StateMap::from_value(json!({
            "bgp": {"+quarantine": {"x-*": true}}
        }));
        assert_eq!(state.override_for(&["bgp", "+quarantine"], "y-1"), None);
    }
}
