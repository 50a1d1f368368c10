// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parameter validators
//!
//! Every value entering a declaration default, a scope override, or an
//! explicit construction argument passes through the parameter's validator
//! first. A rejected value never reaches any table.

use crate::{ParamError, ParamResult, Value};
use std::sync::Arc;

/// Declarative constraint attached to a parameter.
#[derive(Clone)]
pub enum Validator {
    /// Accept anything
    Any,
    /// Numeric, strictly positive
    Positive,
    /// Numeric, zero or greater
    NonNegative,
    /// Numeric, within `[min, max]` inclusive
    Range { min: f64, max: f64 },
    /// String drawn from a fixed set of modes
    OneOf(Vec<String>),
    /// Arbitrary predicate supplied by the declaring backend
    Custom {
        description: String,
        check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
    },
}

impl Validator {
    /// Human-readable constraint description, used in error messages and
    /// `describe` output.
    pub fn describe(&self) -> String {
        match self {
            Validator::Any => "any value".to_string(),
            Validator::Positive => "value > 0".to_string(),
            Validator::NonNegative => "value >= 0".to_string(),
            Validator::Range { min, max } => format!("{} <= value <= {}", min, max),
            Validator::OneOf(options) => format!("one of [{}]", options.join(", ")),
            Validator::Custom { description, .. } => description.clone(),
        }
    }

    /// Check `value` for parameter `param`.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::InvalidValue` naming the parameter, the offending
    /// value, and the violated constraint.
    pub fn check(&self, param: &str, value: &Value) -> ParamResult<()> {
        let ok = match self {
            Validator::Any => true,
            Validator::Positive => value.as_f64().map(|v| v > 0.0).unwrap_or(false),
            Validator::NonNegative => value.as_f64().map(|v| v >= 0.0).unwrap_or(false),
            Validator::Range { min, max } => value
                .as_f64()
                .map(|v| v >= *min && v <= *max)
                .unwrap_or(false),
            Validator::OneOf(options) => value
                .as_str()
                .map(|s| options.iter().any(|o| o == s))
                .unwrap_or(false),
            Validator::Custom { check, .. } => check(value),
        };

        if ok {
            Ok(())
        } else {
            Err(ParamError::InvalidValue {
                param: param.to_string(),
                value: value.to_string(),
                constraint: self.describe(),
            })
        }
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validator({})", self.describe())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Validator::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_accepts_int_and_float() {
        assert!(Validator::Positive.check("radius", &Value::Float(1.5)).is_ok());
        assert!(Validator::Positive.check("n_neurons", &Value::Int(50)).is_ok());
    }

    #[test]
    fn test_positive_rejects_zero_and_non_numeric() {
        assert!(Validator::Positive.check("radius", &Value::Float(0.0)).is_err());
        assert!(Validator::Positive
            .check("radius", &Value::Str("big".to_string()))
            .is_err());
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let v = Validator::Range { min: 0.0, max: 1.0 };
        assert!(v.check("fraction", &Value::Float(0.0)).is_ok());
        assert!(v.check("fraction", &Value::Float(1.0)).is_ok());
        assert!(v.check("fraction", &Value::Float(1.01)).is_err());
    }

    #[test]
    fn test_one_of_modes() {
        let v = Validator::OneOf(vec!["lif".to_string(), "rate".to_string()]);
        assert!(v.check("neuron_type", &Value::from("lif")).is_ok());
        assert!(v.check("neuron_type", &Value::from("izhikevich")).is_err());
        // Non-string values never match a mode list
        assert!(v.check("neuron_type", &Value::Int(1)).is_err());
    }

    #[test]
    fn test_custom_predicate_and_description() {
        let v = Validator::Custom {
            description: "even integer".to_string(),
            check: Arc::new(|value| matches!(value, Value::Int(i) if i % 2 == 0)),
        };
        assert!(v.check("dims", &Value::Int(4)).is_ok());
        let err = v.check("dims", &Value::Int(3)).unwrap_err();
        assert!(err.to_string().contains("even integer"));
    }

    #[test]
    fn test_rejection_message_contains_value() {
        let err = Validator::Positive
            .check("radius", &Value::Float(-2.0))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("radius"));
        assert!(msg.contains("-2"));
        assert!(msg.contains("value > 0"));
    }
}
