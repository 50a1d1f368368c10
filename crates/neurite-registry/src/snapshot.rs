// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Introspection over currently active overrides
//!
//! `all_defaults` reports what the presently entered scope stack would hand
//! to a construction happening right now. It reads the stack and the scope
//! tables and mutates nothing.

use crate::stack;
use neurite_params::Value;
use serde::Serialize;

/// One active override: `(scope, category, param, value)` plus the scope's
/// distance from the top of the stack (0 = innermost).
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEntry {
    pub scope: String,
    pub depth_from_top: usize,
    pub category: String,
    pub param: String,
    pub value: Value,
}

/// Overrides active in the current scope stack, innermost-first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DefaultsSnapshot {
    pub entries: Vec<SnapshotEntry>,
}

impl DefaultsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The value a category-level resolution would pick right now, if any.
    pub fn effective(&self, category: &str, param: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| e.category == category && e.param == param)
            .map(|e| &e.value)
    }
}

impl std::fmt::Display for DefaultsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "no active overrides");
        }
        let lines = self
            .entries
            .iter()
            .map(|e| {
                format!(
                    "  - [{}] {}.{} = {}",
                    e.scope, e.category, e.param, e.value
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        write!(f, "active overrides (innermost first):\n{}", lines)
    }
}

/// Snapshot every override set in the currently entered scope stack,
/// optionally filtered to one category. Scopes that have exited are not
/// reported. Read-only.
pub fn all_defaults(category: Option<&str>) -> DefaultsSnapshot {
    let mut entries = Vec::new();
    for (depth_from_top, scope) in stack::active_innermost_first().iter().enumerate() {
        for (cat, param, value) in scope.category_overrides(category) {
            entries.push(SnapshotEntry {
                scope: scope.display_name(),
                depth_from_top,
                category: cat,
                param,
                value,
            });
        }
    }
    DefaultsSnapshot { entries }
}
