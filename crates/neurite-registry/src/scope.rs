// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scope override tables
//!
//! A `Scope` holds the overrides that apply while it is entered: per-category
//! tables of default replacements, plus per-instance tables consulted when a
//! specific object is re-queried. Scopes are cheap `Arc` handles; the tables
//! behind them are shared and lock-protected because instance overrides may
//! be mutated from other threads while a scope is entered elsewhere.

use crate::object::InstanceId;
use ahash::AHashMap;
use neurite_params::{CategoryRegistry, ParamResult, Value};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique scope identity, used for stack-balance checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

struct ScopeInner {
    id: ScopeId,
    label: Option<String>,
    /// category -> param name -> overridden default
    category: RwLock<AHashMap<String, AHashMap<String, Value>>>,
    /// instance -> param name -> overridden value
    instance: RwLock<AHashMap<InstanceId, AHashMap<String, Value>>>,
}

/// A nestable container of default-value overrides.
///
/// Cloning a `Scope` clones the handle, not the tables: all clones see the
/// same overrides, and a scope entered on one thread can be populated from
/// another.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A scope carrying a diagnostic label (e.g. the owning network's name).
    pub fn labeled(label: impl Into<String>) -> Self {
        Self::build(Some(label.into()))
    }

    fn build(label: Option<String>) -> Self {
        let id = ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed));
        debug!(scope = %id, label = label.as_deref().unwrap_or(""), "scope created");
        Self {
            inner: Arc::new(ScopeInner {
                id,
                label,
                category: RwLock::new(AHashMap::new()),
                instance: RwLock::new(AHashMap::new()),
            }),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    /// Label if present, otherwise the scope id. Used in logs and snapshots.
    pub fn display_name(&self) -> String {
        match self.label() {
            Some(label) => label.to_string(),
            None => self.id().to_string(),
        }
    }

    /// Override the default for `(category, name)` inside this scope.
    ///
    /// The value is validated against the declared validator before any table
    /// is touched; a rejected value leaves this scope exactly as it was.
    /// Overwrites a prior override for the same pair in this scope only.
    ///
    /// # Errors
    ///
    /// - `ParamError::UnknownCategory` / `UnknownParameter` for undeclared keys
    /// - `ParamError::InvalidValue` if the validator rejects the value
    pub fn set_category_default(
        &self,
        registry: &CategoryRegistry,
        category: &str,
        name: &str,
        value: Value,
    ) -> ParamResult<()> {
        let spec = registry.param(category, name)?;
        spec.validator.check(name, &value)?;

        debug!(scope = %self.id(), category, param = name, value = %value, "category default set");
        self.inner
            .category
            .write()
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }

    /// Remove a category-level override. Returns `false` (a silent no-op)
    /// when nothing was set for the pair in this scope.
    pub fn unset_category_default(&self, category: &str, name: &str) -> bool {
        let mut table = self.inner.category.write();
        let removed = match table.get_mut(category) {
            Some(params) => params.remove(name).is_some(),
            None => false,
        };
        if removed {
            debug!(scope = %self.id(), category, param = name, "category default unset");
        }
        removed
    }

    /// Override a value for one specific instance inside this scope.
    ///
    /// Takes precedence over category-level overrides in the same scope for
    /// future per-instance queries; already-resolved construction-time
    /// attributes are never revisited.
    pub fn set_instance_override(
        &self,
        registry: &CategoryRegistry,
        category: &str,
        instance: InstanceId,
        name: &str,
        value: Value,
    ) -> ParamResult<()> {
        let spec = registry.param(category, name)?;
        spec.validator.check(name, &value)?;

        debug!(scope = %self.id(), %instance, param = name, value = %value, "instance override set");
        self.inner
            .instance
            .write()
            .entry(instance)
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }

    /// Remove an instance-level override. Silent no-op (`false`) when unset.
    pub fn unset_instance_override(&self, instance: InstanceId, name: &str) -> bool {
        let mut table = self.inner.instance.write();
        match table.get_mut(&instance) {
            Some(params) => params.remove(name).is_some(),
            None => false,
        }
    }

    /// Category-level override lookup. Read-only.
    pub fn category_override(&self, category: &str, name: &str) -> Option<Value> {
        self.inner
            .category
            .read()
            .get(category)
            .and_then(|params| params.get(name))
            .cloned()
    }

    /// Instance-level override lookup. Read-only.
    pub fn instance_override(&self, instance: InstanceId, name: &str) -> Option<Value> {
        self.inner
            .instance
            .read()
            .get(&instance)
            .and_then(|params| params.get(name))
            .cloned()
    }

    /// Snapshot of this scope's category-level overrides, optionally filtered.
    /// Entries are `(category, param, value)` sorted for stable output.
    pub fn category_overrides(&self, filter: Option<&str>) -> Vec<(String, String, Value)> {
        let table = self.inner.category.read();
        let mut entries: Vec<(String, String, Value)> = table
            .iter()
            .filter(|(category, _)| filter.map_or(true, |f| f == category.as_str()))
            .flat_map(|(category, params)| {
                params
                    .iter()
                    .map(|(name, value)| (category.clone(), name.clone(), value.clone()))
            })
            .collect();
        entries.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        entries
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurite_params::{ParamError, ParamSpec, Validator};

    fn registry() -> CategoryRegistry {
        let mut registry = CategoryRegistry::new();
        registry.declare_category("ensemble").unwrap();
        registry
            .declare_parameter(
                "ensemble",
                ParamSpec::new("radius", Value::Float(1.0)).validator(Validator::Positive),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_set_and_get_category_default() {
        let registry = registry();
        let scope = Scope::new();
        scope
            .set_category_default(&registry, "ensemble", "radius", Value::Float(2.0))
            .unwrap();
        assert_eq!(
            scope.category_override("ensemble", "radius"),
            Some(Value::Float(2.0))
        );
    }

    #[test]
    fn test_set_overwrites_within_same_scope() {
        let registry = registry();
        let scope = Scope::new();
        scope
            .set_category_default(&registry, "ensemble", "radius", Value::Float(2.0))
            .unwrap();
        scope
            .set_category_default(&registry, "ensemble", "radius", Value::Float(3.0))
            .unwrap();
        assert_eq!(
            scope.category_override("ensemble", "radius"),
            Some(Value::Float(3.0))
        );
    }

    #[test]
    fn test_rejected_value_leaves_table_unchanged() {
        let registry = registry();
        let scope = Scope::new();
        scope
            .set_category_default(&registry, "ensemble", "radius", Value::Float(2.0))
            .unwrap();

        let result = scope.set_category_default(&registry, "ensemble", "radius", Value::Float(-5.0));
        assert!(matches!(result, Err(ParamError::InvalidValue { .. })));
        assert_eq!(
            scope.category_override("ensemble", "radius"),
            Some(Value::Float(2.0))
        );
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let registry = registry();
        let scope = Scope::new();
        let result = scope.set_category_default(&registry, "ensemble", "colour", Value::from("red"));
        assert!(matches!(result, Err(ParamError::UnknownParameter { .. })));
    }

    #[test]
    fn test_unset_is_silent_noop_when_never_set() {
        let scope = Scope::new();
        assert!(!scope.unset_category_default("ensemble", "radius"));
    }

    #[test]
    fn test_unset_removes_override() {
        let registry = registry();
        let scope = Scope::new();
        scope
            .set_category_default(&registry, "ensemble", "radius", Value::Float(2.0))
            .unwrap();
        assert!(scope.unset_category_default("ensemble", "radius"));
        assert_eq!(scope.category_override("ensemble", "radius"), None);
    }

    #[test]
    fn test_clone_shares_tables() {
        let registry = registry();
        let scope = Scope::new();
        let alias = scope.clone();
        scope
            .set_category_default(&registry, "ensemble", "radius", Value::Float(2.0))
            .unwrap();
        assert_eq!(
            alias.category_override("ensemble", "radius"),
            Some(Value::Float(2.0))
        );
        assert_eq!(scope, alias);
    }

    #[test]
    fn test_instance_override_isolated_per_instance() {
        let registry = registry();
        let scope = Scope::new();
        let a = InstanceId::next();
        let b = InstanceId::next();
        scope
            .set_instance_override(&registry, "ensemble", a, "radius", Value::Float(9.0))
            .unwrap();
        assert_eq!(scope.instance_override(a, "radius"), Some(Value::Float(9.0)));
        assert_eq!(scope.instance_override(b, "radius"), None);
        // Category-level table untouched
        assert_eq!(scope.category_override("ensemble", "radius"), None);
    }

    #[test]
    fn test_concurrent_instance_mutation() {
        let registry = std::sync::Arc::new(registry());
        let scope = Scope::new();
        let mut handles = vec![];
        for _ in 0..8 {
            let scope = scope.clone();
            let registry = std::sync::Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                let id = InstanceId::next();
                scope
                    .set_instance_override(&registry, "ensemble", id, "radius", Value::Float(2.0))
                    .unwrap();
                id
            }));
        }
        for handle in handles {
            let id = handle.join().unwrap();
            assert_eq!(scope.instance_override(id, "radius"), Some(Value::Float(2.0)));
        }
    }
}
