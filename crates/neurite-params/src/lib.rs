// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurite Parameter Declarations
//!
//! Static parameter metadata for configurable model objects:
//! - Dynamic [`Value`] type carried by every parameter
//! - Declarative [`Validator`] constraints checked before any value is accepted
//! - [`ParamSpec`] / [`CategorySpec`] declarations held by a [`CategoryRegistry`]
//!
//! Declarations are scope-independent: they describe what a category of object
//! *can* be configured with, not what it currently resolves to. Scope handling
//! and resolution live in `neurite-registry`.
//!
//! ## Usage
//!
//! ```rust
//! use neurite_params::{CategoryRegistry, ParamSpec, Validator, Value};
//!
//! let mut registry = CategoryRegistry::new();
//! registry.declare_category("ensemble").unwrap();
//! registry.declare_parameter(
//!     "ensemble",
//!     ParamSpec::new("radius", Value::Float(1.0)).validator(Validator::Positive),
//! ).unwrap();
//!
//! let meta = registry.describe("ensemble", "radius").unwrap();
//! assert_eq!(meta.default, Some(Value::Float(1.0)));
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod category;
pub mod validator;
pub mod value;

pub use category::{CategoryRegistry, CategorySpec, ParamMeta, ParamSpec};
pub use validator::Validator;
pub use value::Value;

/// Re-export for convenience
pub use serde;

/// Parameter declaration and validation error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("Category '{0}' already declared")]
    DuplicateCategory(String),

    #[error("Parameter '{param}' already declared on category '{category}'")]
    DuplicateParameter { category: String, param: String },

    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    #[error("Unknown parameter '{param}' on category '{category}'")]
    UnknownParameter { category: String, param: String },

    #[error("Invalid value for '{param}': {value} violates constraint ({constraint})")]
    InvalidValue {
        param: String,
        value: String,
        constraint: String,
    },

    #[error("Missing required parameter '{param}' on category '{category}'")]
    MissingRequired { category: String, param: String },
}

/// Result type for parameter operations
pub type ParamResult<T> = Result<T, ParamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_types_compile() {
        // Smoke test to ensure types are properly defined
        let _registry = CategoryRegistry::new();
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = ParamError::InvalidValue {
            param: "radius".to_string(),
            value: "-1".to_string(),
            constraint: "value > 0".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("radius"));
        assert!(msg.contains("-1"));
        assert!(msg.contains("value > 0"));
    }
}
