// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurite Scoped Default Registry
//!
//! Hierarchical resolution of construction-time defaults for model objects:
//! - [`Scope`] - a nestable container of default-value overrides
//! - Thread-local active-scope stack with RAII [`ScopeGuard`] release
//! - [`resolve`] - one-shot precedence walk at object construction time
//! - [`ConfiguredObject`] / [`Network`] - objects whose parameters are
//!   resolved exactly once and never retroactively changed
//! - TOML scope loading for file-based override sets
//!
//! ## Resolution precedence
//!
//! ```text
//! explicit argument  >  instance override (innermost scope first)
//!                    >  category override (innermost scope first)
//!                    >  static declared default
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use neurite_params::{CategoryRegistry, ParamSpec, Validator, Value};
//! use neurite_registry::{enter, resolve, Scope};
//!
//! let mut registry = CategoryRegistry::new();
//! registry.declare_category("ensemble").unwrap();
//! registry.declare_parameter(
//!     "ensemble",
//!     ParamSpec::new("radius", Value::Float(1.0)).validator(Validator::Positive),
//! ).unwrap();
//!
//! let scope = Scope::new();
//! scope.set_category_default(&registry, "ensemble", "radius", Value::Float(1.5)).unwrap();
//!
//! let guard = enter(&scope);
//! let radius = resolve(&registry, "ensemble", "radius", None, None).unwrap();
//! assert_eq!(radius, Some(Value::Float(1.5)));
//! guard.exit().unwrap();
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod object;
pub mod resolve;
pub mod scope;
pub mod snapshot;
pub mod stack;

pub use loader::{find_scope_file, load_scope, scope_from_toml_str};
pub use object::{build_object, ConfiguredObject, InstanceId, Network, NetworkBuilder};
pub use resolve::{resolve, resolve_for_instance};
pub use scope::{Scope, ScopeId};
pub use snapshot::{all_defaults, DefaultsSnapshot, SnapshotEntry};
pub use stack::{depth, enter, is_clean, ScopeGuard};

pub use neurite_params::{ParamError, ParamResult};

/// Registry error types
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("Scope stack corruption: tried to exit scope {expected}, but {found} is on top")]
    ScopeStackCorruption { expected: String, found: String },

    #[error("Scope file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read scope file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Unsupported override value for '{key}': {reason}")]
    UnsupportedValue { key: String, reason: String },
}

impl From<toml::de::Error> for RegistryError {
    fn from(err: toml::de::Error) -> Self {
        RegistryError::ParseError(err.to_string())
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
