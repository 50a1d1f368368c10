// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Construction-time value resolution
//!
//! One precedence walk per parameter per constructed object. Resolution is
//! strictly read-only: asking for a value never fills in a default anywhere.

use crate::object::InstanceId;
use crate::stack;
use neurite_params::{CategoryRegistry, ParamError, ParamResult, Value};

/// Resolve the effective value for `(category, name)`.
///
/// Precedence, first match wins:
/// 1. `explicit` construction-time argument (validated, always wins)
/// 2. instance-level override for `instance`, innermost active scope first
/// 3. category-level override, innermost active scope first
/// 4. static declared default
///
/// Returns `Ok(None)` for an optional parameter that nothing supplies.
///
/// # Errors
///
/// - `ParamError::UnknownCategory` / `UnknownParameter` for undeclared keys
/// - `ParamError::InvalidValue` if an explicit value fails the validator
/// - `ParamError::MissingRequired` if the parameter is required and the
///   whole chain comes up empty
pub fn resolve(
    registry: &CategoryRegistry,
    category: &str,
    name: &str,
    explicit: Option<Value>,
    instance: Option<InstanceId>,
) -> ParamResult<Option<Value>> {
    let spec = registry.param(category, name)?;

    // 1. Explicit argument always wins
    if let Some(value) = explicit {
        spec.validator.check(name, &value)?;
        return Ok(Some(value));
    }

    // 2-3. Walk the active stack, most specific scope first
    for scope in stack::active_innermost_first() {
        if let Some(id) = instance {
            if let Some(value) = scope.instance_override(id, name) {
                return Ok(Some(value));
            }
        }
        if let Some(value) = scope.category_override(category, name) {
            return Ok(Some(value));
        }
    }

    // 4. Static declared default
    if let Some(default) = &spec.default {
        return Ok(Some(default.clone()));
    }

    if spec.required {
        return Err(ParamError::MissingRequired {
            category: category.to_string(),
            param: name.to_string(),
        });
    }
    Ok(None)
}

/// Re-query a parameter for an already-built instance through the currently
/// active scopes. This governs future reads only; it never rewrites the
/// value resolved at construction time.
pub fn resolve_for_instance(
    registry: &CategoryRegistry,
    category: &str,
    name: &str,
    instance: InstanceId,
) -> ParamResult<Option<Value>> {
    resolve(registry, category, name, None, Some(instance))
}
