//! Conditions over blackboard values.

use crate::core::condition::{Condition, EvalContext};
use crate::core::tolerance::{DEFAULT_EPS, close_to};
use crate::error::PlanError;

/// Holds while a numeric field is strictly greater than `threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct Above {
    field: String,
    threshold: f64,
}

impl Above {
    pub fn new(field: impl Into<String>, threshold: f64) -> Self {
        Self {
            field: field.into(),
            threshold,
        }
    }
}

impl Condition for Above {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        Ok(ctx.data().number(&self.field)? > self.threshold)
    }
}

/// Holds while a numeric field is strictly less than `threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct Below {
    field: String,
    threshold: f64,
}

impl Below {
    pub fn new(field: impl Into<String>, threshold: f64) -> Self {
        Self {
            field: field.into(),
            threshold,
        }
    }
}

impl Condition for Below {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        Ok(ctx.data().number(&self.field)? < self.threshold)
    }
}

/// What a [`CloseTo`] compares against.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Value(f64),
    Field(String),
}

/// Holds while a numeric field is within tolerance of a target.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseTo {
    field: String,
    target: Target,
    eps: f64,
}

impl CloseTo {
    pub fn value(field: impl Into<String>, target: f64) -> Self {
        Self {
            field: field.into(),
            target: Target::Value(target),
            eps: DEFAULT_EPS,
        }
    }

    pub fn field(field: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            target: Target::Field(target_field.into()),
            eps: DEFAULT_EPS,
        }
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }
}

impl Condition for CloseTo {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        let value = ctx.data().number(&self.field)?;
        let target = match &self.target {
            Target::Value(target) => *target,
            Target::Field(field) => ctx.data().number(field)?,
        };
        Ok(close_to(value, target, self.eps))
    }
}

/// Holds while a flag field equals `expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagIs {
    field: String,
    expected: bool,
}

impl FlagIs {
    pub fn new(field: impl Into<String>, expected: bool) -> Self {
        Self {
            field: field.into(),
            expected,
        }
    }
}

impl Condition for FlagIs {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        Ok(ctx.data().flag(&self.field)? == self.expected)
    }
}
