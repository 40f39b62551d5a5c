// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

//! Nested state mapping persisted between runs.
//!
//! The previous run's map is read for cached IRR/PeeringDB data, change
//! diffing and operator override directives; the current run writes a
//! fresh map with the facts it computed, persisted only if the whole
//! build succeeds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct StateMap {
    root: Map<String, Value>,
}

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(root) => Self { root },
            _ => Self::default(),
        }
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Walk `path` through nested objects.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(*first)?;
        for key in rest {
            current = current.as_object()?.get(*key)?;
        }
        Some(current)
    }

    pub fn get_u64(&self, path: &[&str]) -> Option<u64> {
        self.get(path)?.as_u64()
    }

    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn get_object(&self, path: &[&str]) -> Option<&Map<String, Value>> {
        self.get(path)?.as_object()
    }

    /// Set `path` to `value`, creating intermediate objects. Replaces any
    /// non-object found along the way.
    pub fn set(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut current = &mut self.root;
        for key in parents {
            let entry = current
                .entry((*key).to_owned())
                .or_insert_with(|| json!({}));
            if !entry.is_object() {
                *entry = json!({});
            }
            current = entry.as_object_mut().unwrap_or_else(|| unreachable!());
        }
        current.insert((*last).to_owned(), value);
    }
}
