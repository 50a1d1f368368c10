// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Category and parameter declarations
//!
//! A category is a declared kind of configurable model object ("ensemble",
//! "connection", "probe"). Each category carries an ordered table of
//! parameter declarations. Declarations are static: they never change because
//! a scope is entered or exited, and third-party extension happens through
//! the same `declare_parameter` call the core uses.

use crate::{ParamError, ParamResult, Validator, Value};
use ahash::AHashMap;

/// A single parameter declaration on a category.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    /// Static default; `None` declares an optional parameter with no fallback.
    pub default: Option<Value>,
    pub validator: Validator,
    /// Required parameters must resolve to *some* value at construction time.
    pub required: bool,
}

impl ParamSpec {
    /// Declare a parameter with a static default.
    pub fn new(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
            validator: Validator::Any,
            required: false,
        }
    }

    /// Declare an optional parameter with no static default.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            validator: Validator::Any,
            required: false,
        }
    }

    /// Declare a required parameter: no static default, and resolution fails
    /// unless a scope override or explicit argument supplies a value.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            validator: Validator::Any,
            required: true,
        }
    }

    /// Attach a validator (builder style).
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }
}

/// Scope-independent parameter metadata returned by `describe`.
#[derive(Debug, Clone)]
pub struct ParamMeta {
    pub category: String,
    pub name: String,
    pub default: Option<Value>,
    pub constraint: String,
    pub required: bool,
}

/// All declarations for one category, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CategorySpec {
    pub name: String,
    params: Vec<ParamSpec>,
    index: AHashMap<String, usize>,
}

impl CategorySpec {
    fn new(name: String) -> Self {
        Self {
            name,
            params: Vec::new(),
            index: AHashMap::new(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.index.get(name).map(|i| &self.params[*i])
    }

    /// Declared parameters in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Registry of declared categories and their parameter tables.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    categories: AHashMap<String, CategorySpec>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new category.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::DuplicateCategory` if the name is already taken.
    pub fn declare_category(&mut self, name: impl Into<String>) -> ParamResult<()> {
        let name = name.into();
        if self.categories.contains_key(&name) {
            return Err(ParamError::DuplicateCategory(name));
        }
        self.categories
            .insert(name.clone(), CategorySpec::new(name));
        Ok(())
    }

    /// Declare a parameter on an existing category.
    ///
    /// Re-declaration is never idempotent: a second declaration of the same
    /// name fails even with identical metadata, so name collisions between
    /// backends surface immediately. A declared default must itself satisfy
    /// the declared validator.
    ///
    /// # Errors
    ///
    /// - `ParamError::UnknownCategory` if the category was never declared
    /// - `ParamError::DuplicateParameter` if the name is already declared
    /// - `ParamError::InvalidValue` if the default fails its own validator
    pub fn declare_parameter(&mut self, category: &str, spec: ParamSpec) -> ParamResult<()> {
        // Validate the default before touching any table
        if let Some(default) = &spec.default {
            spec.validator.check(&spec.name, default)?;
        }

        let cat = self
            .categories
            .get_mut(category)
            .ok_or_else(|| ParamError::UnknownCategory(category.to_string()))?;

        if cat.index.contains_key(&spec.name) {
            return Err(ParamError::DuplicateParameter {
                category: category.to_string(),
                param: spec.name,
            });
        }

        cat.index.insert(spec.name.clone(), cat.params.len());
        cat.params.push(spec);
        Ok(())
    }

    pub fn category(&self, name: &str) -> ParamResult<&CategorySpec> {
        self.categories
            .get(name)
            .ok_or_else(|| ParamError::UnknownCategory(name.to_string()))
    }

    /// Look up one parameter declaration.
    pub fn param(&self, category: &str, name: &str) -> ParamResult<&ParamSpec> {
        self.category(category)?
            .param(name)
            .ok_or_else(|| ParamError::UnknownParameter {
                category: category.to_string(),
                param: name.to_string(),
            })
    }

    /// Static metadata for one parameter, independent of any scope.
    pub fn describe(&self, category: &str, name: &str) -> ParamResult<ParamMeta> {
        let spec = self.param(category, name)?;
        Ok(ParamMeta {
            category: category.to_string(),
            name: spec.name.clone(),
            default: spec.default.clone(),
            constraint: spec.validator.describe(),
            required: spec.required,
        })
    }

    /// Declared parameters of a category, declaration order.
    pub fn params(&self, category: &str) -> ParamResult<impl Iterator<Item = &ParamSpec>> {
        Ok(self.category(category)?.params())
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(|s| s.as_str())
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_ensemble() -> CategoryRegistry {
        let mut registry = CategoryRegistry::new();
        registry.declare_category("ensemble").unwrap();
        registry
            .declare_parameter(
                "ensemble",
                ParamSpec::new("radius", Value::Float(1.0)).validator(Validator::Positive),
            )
            .unwrap();
        registry
            .declare_parameter(
                "ensemble",
                ParamSpec::new("n_neurons", Value::Int(50)).validator(Validator::Positive),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_declare_and_describe() {
        let registry = registry_with_ensemble();
        let meta = registry.describe("ensemble", "radius").unwrap();
        assert_eq!(meta.default, Some(Value::Float(1.0)));
        assert_eq!(meta.constraint, "value > 0");
        assert!(!meta.required);
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let mut registry = registry_with_ensemble();
        let result = registry.declare_category("ensemble");
        assert_eq!(
            result,
            Err(ParamError::DuplicateCategory("ensemble".to_string()))
        );
    }

    #[test]
    fn test_duplicate_parameter_rejected_even_with_identical_metadata() {
        let mut registry = registry_with_ensemble();
        let result = registry.declare_parameter(
            "ensemble",
            ParamSpec::new("radius", Value::Float(1.0)).validator(Validator::Positive),
        );
        assert!(matches!(
            result,
            Err(ParamError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn test_declare_on_unknown_category() {
        let mut registry = CategoryRegistry::new();
        let result = registry.declare_parameter("probe", ParamSpec::optional("target"));
        assert_eq!(
            result,
            Err(ParamError::UnknownCategory("probe".to_string()))
        );
    }

    #[test]
    fn test_default_must_pass_own_validator() {
        let mut registry = CategoryRegistry::new();
        registry.declare_category("ensemble").unwrap();
        let result = registry.declare_parameter(
            "ensemble",
            ParamSpec::new("radius", Value::Float(-1.0)).validator(Validator::Positive),
        );
        assert!(matches!(result, Err(ParamError::InvalidValue { .. })));
        // Rejected declaration leaves the category untouched
        assert!(registry.param("ensemble", "radius").is_err());
    }

    #[test]
    fn test_third_party_extension_after_the_fact() {
        let mut registry = registry_with_ensemble();
        // A backend attaches its own metadata parameter later
        registry
            .declare_parameter("ensemble", ParamSpec::optional("gpu_group"))
            .unwrap();
        assert!(registry.param("ensemble", "gpu_group").is_ok());
    }

    #[test]
    fn test_declaration_order_preserved() {
        let registry = registry_with_ensemble();
        let names: Vec<_> = registry
            .params("ensemble")
            .unwrap()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names, vec!["radius", "n_neurons"]);
    }
}
