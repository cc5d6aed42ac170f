//! Shared blackboard of robot state read by tasks and conditions.
//!
//! The mission owns the only `Blackboard`. Tasks and conditions only ever see
//! `&Blackboard`; writes go through [`Blackboard::update`], which enforces the
//! single writer registered for each field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// A typed blackboard value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Flag(_) => "flag",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Flag(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    value: Value,
    writer: String,
}

/// Named state fields, each owned by exactly one writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blackboard {
    fields: BTreeMap<String, Entry>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `field` with its owning writer and initial value.
    ///
    /// Re-declaring by the same writer replaces the value; another writer is
    /// rejected.
    pub fn declare(
        &mut self,
        field: impl Into<String>,
        writer: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), PlanError> {
        let field = field.into();
        let writer = writer.into();
        if let Some(existing) = self.fields.get(&field)
            && existing.writer != writer
        {
            return Err(PlanError::ForeignWriter {
                field,
                owner: existing.writer.clone(),
                writer,
            });
        }
        self.fields.insert(
            field,
            Entry {
                value: value.into(),
                writer,
            },
        );
        Ok(())
    }

    /// Overwrite a declared field. The value keeps its declared type.
    pub fn update(
        &mut self,
        writer: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), PlanError> {
        let entry = self
            .fields
            .get_mut(field)
            .ok_or_else(|| PlanError::MissingField(field.to_string()))?;
        if entry.writer != writer {
            return Err(PlanError::ForeignWriter {
                field: field.to_string(),
                owner: entry.writer.clone(),
                writer: writer.to_string(),
            });
        }
        let value = value.into();
        if std::mem::discriminant(&entry.value) != std::mem::discriminant(&value) {
            return Err(PlanError::FieldType {
                field: field.to_string(),
                expected: entry.value.type_name(),
                found: value.type_name(),
            });
        }
        entry.value = value;
        Ok(())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Result<&Value, PlanError> {
        self.fields
            .get(field)
            .map(|entry| &entry.value)
            .ok_or_else(|| PlanError::MissingField(field.to_string()))
    }

    pub fn number(&self, field: &str) -> Result<f64, PlanError> {
        match self.get(field)? {
            Value::Number(value) => Ok(*value),
            other => Err(type_error(field, "number", other)),
        }
    }

    pub fn flag(&self, field: &str) -> Result<bool, PlanError> {
        match self.get(field)? {
            Value::Flag(value) => Ok(*value),
            other => Err(type_error(field, "flag", other)),
        }
    }

}

fn type_error(field: &str, expected: &'static str, found: &Value) -> PlanError {
    PlanError::FieldType {
        field: field.to_string(),
        expected,
        found: found.type_name(),
    }
}
