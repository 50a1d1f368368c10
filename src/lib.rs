//! # Neurite - Scoped Default Registry for Neural Simulation Models
//!
//! Neurite resolves construction-time parameter defaults for model objects
//! (ensembles, connections, probes) through a stack of nested configuration
//! scopes: the innermost entered scope wins, explicit arguments always win,
//! and the static declared default is the final fallback. Objects resolve
//! each parameter exactly once when built; later scope changes never touch
//! them.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! neurite = "0.1"
//! ```
//!
//! ```rust
//! use neurite::prelude::*;
//!
//! // Declare what an "ensemble" can be configured with
//! let mut registry = CategoryRegistry::new();
//! registry.declare_category("ensemble")?;
//! registry.declare_parameter(
//!     "ensemble",
//!     ParamSpec::new("radius", Value::Float(1.0)).validator(Validator::Positive),
//! )?;
//!
//! // Override the default inside a network's scope
//! let mut net = Network::new("model");
//! net.scope().set_category_default(&registry, "ensemble", "radius", Value::Float(1.5))?;
//!
//! let id = net.build(&registry, |b| b.add("ensemble", &[]))?;
//! assert_eq!(net.get(id).unwrap().get("radius"), Some(&Value::Float(1.5)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Components
//!
//! - **`neurite-params`**: dynamic [`Value`] type, [`Validator`] constraints,
//!   and the static [`CategoryRegistry`] of parameter declarations
//! - **`neurite-registry`**: [`Scope`] override tables, the thread-local
//!   active-scope stack, [`resolve`] precedence walk, [`Network`] containers,
//!   and TOML scope loading

pub use neurite_params as params;
pub use neurite_registry as registry;

pub use neurite_params::{
    CategoryRegistry, CategorySpec, ParamError, ParamMeta, ParamResult, ParamSpec, Validator,
    Value,
};
pub use neurite_registry::{
    all_defaults, build_object, depth, enter, find_scope_file, is_clean, load_scope, resolve,
    resolve_for_instance, scope_from_toml_str, ConfiguredObject, DefaultsSnapshot, InstanceId,
    Network, NetworkBuilder, RegistryError, RegistryResult, Scope, ScopeGuard, ScopeId,
    SnapshotEntry,
};

/// Common imports for model-construction code
pub mod prelude {
    pub use crate::{
        all_defaults, build_object, enter, resolve, CategoryRegistry, ConfiguredObject,
        InstanceId, Network, ParamSpec, RegistryError, Scope, Validator, Value,
    };
}
