// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configured objects and network containers
//!
//! Objects are configured exactly once: `build_object` resolves every
//! declared parameter at construction time and freezes the results. Entering
//! or mutating scopes afterwards never touches an existing object.

use crate::resolve::resolve;
use crate::scope::Scope;
use crate::stack::{enter, ScopeGuard};
use crate::RegistryResult;
use ahash::AHashMap;
use neurite_params::{CategoryRegistry, ParamError, ParamResult, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a configured object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// An instance of a category with its parameters resolved and frozen.
#[derive(Debug, Clone)]
pub struct ConfiguredObject {
    id: InstanceId,
    category: String,
    attrs: AHashMap<String, Value>,
    extras: AHashMap<String, Value>,
}

impl ConfiguredObject {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Construction-time resolved value. `None` for optional parameters that
    /// nothing supplied.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Attach ad hoc metadata outside the declared parameter mechanism.
    ///
    /// Advisory only: emits a warning and stores the value anyway. Backends
    /// that want first-class parameters should declare them on the category
    /// instead.
    pub fn attach_extra(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        warn!(
            instance = %self.id,
            category = %self.category,
            attr = %name,
            "attaching undeclared attribute; declare_parameter is the supported extension point"
        );
        self.extras.insert(name, value);
    }

    pub fn get_extra(&self, name: &str) -> Option<&Value> {
        self.extras.get(name)
    }
}

/// Construct an object of `category`, resolving each declared parameter
/// exactly once against the explicit arguments and the active scope stack.
///
/// # Errors
///
/// - `ParamError::UnknownCategory` for an undeclared category
/// - `ParamError::UnknownParameter` for an explicit name nothing declared
/// - `ParamError::InvalidValue` / `MissingRequired` from resolution
pub fn build_object(
    registry: &CategoryRegistry,
    category: &str,
    explicit: &[(&str, Value)],
) -> ParamResult<ConfiguredObject> {
    let spec = registry.category(category)?;

    // Reject unknown explicit names before resolving anything
    for (name, _) in explicit {
        if spec.param(name).is_none() {
            return Err(ParamError::UnknownParameter {
                category: category.to_string(),
                param: name.to_string(),
            });
        }
    }

    let id = InstanceId::next();
    let mut attrs = AHashMap::new();
    for param in spec.params() {
        let given = explicit
            .iter()
            .find(|(name, _)| *name == param.name)
            .map(|(_, value)| value.clone());
        if let Some(value) = resolve(registry, category, &param.name, given, Some(id))? {
            attrs.insert(param.name.clone(), value);
        }
    }

    Ok(ConfiguredObject {
        id,
        category: category.to_string(),
        attrs,
        extras: AHashMap::new(),
    })
}

/// An owning container of configured objects with an implicit scope.
///
/// Creating a network creates its scope; [`Network::build`] enters that scope
/// for the duration of a closure so that objects added inside pick up the
/// network's overrides. The scope can be populated before, between, or after
/// build sections via [`Network::scope`].
pub struct Network {
    name: String,
    scope: Scope,
    objects: Vec<ConfiguredObject>,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let scope = Scope::labeled(name.clone());
        Self {
            name,
            scope,
            objects: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The network's own scope, for override configuration.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Run `f` with this network's scope entered. The scope is released on
    /// every exit path, including when `f` errors.
    pub fn build<R>(
        &mut self,
        registry: &CategoryRegistry,
        f: impl FnOnce(&mut NetworkBuilder<'_>) -> RegistryResult<R>,
    ) -> RegistryResult<R> {
        let guard: ScopeGuard = enter(&self.scope);
        let mut builder = NetworkBuilder {
            registry,
            objects: &mut self.objects,
        };
        let result = f(&mut builder);
        match result {
            Ok(value) => {
                guard.exit()?;
                Ok(value)
            }
            Err(err) => {
                // Guard drop unwinds the scope
                drop(guard);
                Err(err)
            }
        }
    }

    pub fn objects(&self) -> &[ConfiguredObject] {
        &self.objects
    }

    pub fn get(&self, id: InstanceId) -> Option<&ConfiguredObject> {
        self.objects.iter().find(|o| o.id() == id)
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("name", &self.name)
            .field("scope", &self.scope.id())
            .field("objects", &self.objects.len())
            .finish()
    }
}

/// Build-section handle: adds objects to the owning network while its scope
/// is entered.
pub struct NetworkBuilder<'a> {
    registry: &'a CategoryRegistry,
    objects: &'a mut Vec<ConfiguredObject>,
}

impl NetworkBuilder<'_> {
    /// Construct and take ownership of a new object.
    pub fn add(&mut self, category: &str, explicit: &[(&str, Value)]) -> RegistryResult<InstanceId> {
        let object = build_object(self.registry, category, explicit)?;
        let id = object.id();
        self.objects.push(object);
        Ok(id)
    }
}
