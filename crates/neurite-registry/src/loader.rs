// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! TOML scope loading
//!
//! Deployment-specific override sets live in a TOML file of `[category]`
//! tables:
//!
//! ```toml
//! [ensemble]
//! radius = 1.5
//! n_neurons = 100
//!
//! [connection]
//! synapse_tau = 0.005
//! ```
//!
//! Every key is checked against the declared categories and validators before
//! a scope is returned, so a loaded scope is valid in full or not at all.

use crate::scope::Scope;
use crate::{RegistryError, RegistryResult};
use neurite_params::{CategoryRegistry, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const SCOPE_FILE_NAME: &str = "neurite_defaults.toml";

/// Find the default-override file.
///
/// Search order:
/// 1. `NEURITE_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurite_defaults.toml`
/// 3. Ancestor directories (up to 5 levels, for workspace roots)
///
/// # Errors
///
/// Returns `RegistryError::FileNotFound` listing every searched location.
pub fn find_scope_file() -> RegistryResult<PathBuf> {
    if let Ok(env_path) = env::var("NEURITE_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(RegistryError::FileNotFound(format!(
            "File specified by NEURITE_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(SCOPE_FILE_NAME));
        let mut current = cwd;
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(SCOPE_FILE_NAME));
                    current = parent.to_path_buf();
                }
                None => break,
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Err(RegistryError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet NEURITE_CONFIG_PATH to specify a custom location.",
        SCOPE_FILE_NAME, search_list
    )))
}

/// Load a scope from a TOML file.
///
/// # Arguments
///
/// * `path` - Optional path. If `None`, [`find_scope_file`] is used.
/// * `registry` - Declarations to validate every key and value against.
///
/// # Errors
///
/// Returns an error if the file is missing, is invalid TOML, names an
/// undeclared category or parameter, or carries a validator-rejected value.
pub fn load_scope(path: Option<&Path>, registry: &CategoryRegistry) -> RegistryResult<Scope> {
    let file = match path {
        Some(p) => p.to_path_buf(),
        None => find_scope_file()?,
    };
    let content = fs::read_to_string(&file)?;
    let scope = scope_from_toml_str(&content, registry)?;
    info!(file = %file.display(), "scope overrides loaded");
    Ok(scope)
}

/// Parse a TOML document of `[category]` override tables into a scope.
pub fn scope_from_toml_str(content: &str, registry: &CategoryRegistry) -> RegistryResult<Scope> {
    let table: toml::Table = content.parse::<toml::Table>()?;

    // Stage and validate everything before constructing the scope
    let mut staged: Vec<(String, String, Value)> = Vec::new();
    for (category, entry) in &table {
        let params = entry.as_table().ok_or_else(|| RegistryError::ParseError(format!(
            "expected a table of parameters under [{}]",
            category
        )))?;
        for (name, raw) in params {
            let value = convert_toml_value(category, name, raw)?;
            let spec = registry.param(category, name)?;
            spec.validator.check(name, &value)?;
            staged.push((category.clone(), name.clone(), value));
        }
    }

    let scope = Scope::labeled("file");
    for (category, name, value) in staged {
        // Already validated above; registry lookups cannot fail here
        scope.set_category_default(registry, &category, &name, value)?;
    }
    Ok(scope)
}

fn convert_toml_value(category: &str, name: &str, raw: &toml::Value) -> RegistryResult<Value> {
    let key = format!("{}.{}", category, name);
    match raw {
        toml::Value::Boolean(v) => Ok(Value::Bool(*v)),
        toml::Value::Integer(v) => Ok(Value::Int(*v)),
        toml::Value::Float(v) => Ok(Value::Float(*v)),
        toml::Value::String(v) => Ok(Value::Str(v.clone())),
        toml::Value::Array(items) => {
            let mut floats = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    toml::Value::Float(v) => floats.push(*v),
                    toml::Value::Integer(v) => floats.push(*v as f64),
                    other => {
                        return Err(RegistryError::UnsupportedValue {
                            key,
                            reason: format!("array element '{}' is not numeric", other),
                        })
                    }
                }
            }
            Ok(Value::FloatVec(floats))
        }
        other => Err(RegistryError::UnsupportedValue {
            key,
            reason: format!("'{}' has no parameter value representation", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurite_params::{ParamSpec, Validator};
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

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
            .declare_parameter(
                "ensemble",
                ParamSpec::new("n_neurons", Value::Int(50)).validator(Validator::Positive),
            )
            .unwrap();
        registry
            .declare_parameter("ensemble", ParamSpec::optional("encoders"))
            .unwrap();
        registry
    }

    #[test]
    fn test_parse_valid_overrides() {
        let registry = registry();
        let scope = scope_from_toml_str(
            "[ensemble]\nradius = 1.5\nn_neurons = 100\nencoders = [0.5, -0.5]\n",
            &registry,
        )
        .unwrap();
        assert_eq!(
            scope.category_override("ensemble", "radius"),
            Some(Value::Float(1.5))
        );
        assert_eq!(
            scope.category_override("ensemble", "n_neurons"),
            Some(Value::Int(100))
        );
        assert_eq!(
            scope.category_override("ensemble", "encoders"),
            Some(Value::FloatVec(vec![0.5, -0.5]))
        );
    }

    #[test]
    fn test_unknown_category_rejected() {
        let registry = registry();
        let result = scope_from_toml_str("[probe]\ntarget = \"a\"\n", &registry);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let registry = registry();
        let result = scope_from_toml_str("[ensemble]\ncolour = \"red\"\n", &registry);
        assert!(result.is_err());
    }

    #[test]
    fn test_validator_rejection_is_all_or_nothing() {
        let registry = registry();
        // radius is fine, n_neurons violates Positive; nothing is returned
        let result =
            scope_from_toml_str("[ensemble]\nradius = 1.5\nn_neurons = -3\n", &registry);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_syntax() {
        let registry = registry();
        let result = scope_from_toml_str("[ensemble\nradius = ", &registry);
        assert!(matches!(result, Err(RegistryError::ParseError(_))));
    }

    #[test]
    fn test_find_scope_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom_defaults.toml");
        File::create(&path).unwrap();

        env::set_var("NEURITE_CONFIG_PATH", path.to_str().unwrap());
        let result = find_scope_file();
        env::remove_var("NEURITE_CONFIG_PATH");

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), path);
    }

    #[test]
    fn test_find_scope_file_env_var_missing_target() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("NEURITE_CONFIG_PATH", "/nonexistent/defaults.toml");
        let result = find_scope_file();
        env::remove_var("NEURITE_CONFIG_PATH");
        assert!(matches!(result, Err(RegistryError::FileNotFound(_))));
    }

    #[test]
    fn test_load_scope_from_file() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let registry = registry();
        let dir = tempdir().unwrap();
        let path = dir.path().join(SCOPE_FILE_NAME);

        let mut file = File::create(&path).unwrap();
        writeln!(file, "[ensemble]").unwrap();
        writeln!(file, "radius = 2.0").unwrap();

        let scope = load_scope(Some(&path), &registry).unwrap();
        assert_eq!(
            scope.category_override("ensemble", "radius"),
            Some(Value::Float(2.0))
        );
    }
}
