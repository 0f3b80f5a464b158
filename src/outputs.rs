//! Typed access to the outputs of a deployed component instance.
//!
//! Outputs are fetched once, at deploy time, as a raw JSON map; the
//! accessors here coerce individual entries into the shapes the tests
//! assert on (scalar string, ordered list of strings, map of scalars,
//! map of objects).  An absent key or a shape mismatch is an
//! [`Error::Output`] carrying the key and what was actually found.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Read-only snapshot of a deployed instance's outputs.
#[derive(Clone, Debug, Default)]
pub struct OutputSet {
    values: Map<String, Value>,
}

impl OutputSet {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Build from `terraform output -json`, where every entry is wrapped
    /// as `{"sensitive": ..., "type": ..., "value": ...}`.  Entries that
    /// are not wrapped (already raw values) are kept as-is, so the same
    /// parser accepts both the CLI format and plain maps.
    pub fn from_terraform_json(value: Value) -> Result<Self> {
        let Value::Object(entries) = value else {
            return Err(Error::output(format!(
                "expected a JSON object of outputs, got {}",
                type_name(&value)
            )));
        };
        let mut values = Map::new();
        for (key, entry) in entries {
            let unwrapped = match entry {
                Value::Object(mut obj) if obj.contains_key("value") => {
                    obj.remove("value").unwrap_or(Value::Null)
                }
                other => other,
            };
            values.insert(key, unwrapped);
        }
        Ok(Self { values })
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names of all present outputs, in key order.
    pub fn keys(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    fn get(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| Error::output(format!("output `{key}` is not present")))
    }

    /// A scalar output, coerced to the string the CLI would print
    /// (numbers and booleans included — a count output of `2` reads as
    /// `"2"`).
    pub fn string(&self, key: &str) -> Result<String> {
        match self.get(key)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(Error::output(format!(
                "output `{key}` is not a scalar, got {}",
                type_name(other)
            ))),
        }
    }

    /// An ordered list-of-strings output.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>> {
        let value = self.get(key)?;
        let Value::Array(items) = value else {
            return Err(Error::output(format!(
                "output `{key}` is not a list, got {}",
                type_name(value)
            )));
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(Error::output(format!(
                    "output `{key}` contains a non-string element ({})",
                    type_name(other)
                ))),
            })
            .collect()
    }

    /// A map output whose values are scalars (e.g. add-on name → version).
    pub fn string_map(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let value = self.get(key)?;
        let Value::Object(entries) = value else {
            return Err(Error::output(format!(
                "output `{key}` is not a map, got {}",
                type_name(value)
            )));
        };
        entries
            .iter()
            .map(|(name, value)| match value {
                Value::String(s) => Ok((name.clone(), s.clone())),
                Value::Number(n) => Ok((name.clone(), n.to_string())),
                Value::Bool(b) => Ok((name.clone(), b.to_string())),
                other => Err(Error::output(format!(
                    "output `{key}` entry `{name}` is not a scalar ({})",
                    type_name(other)
                ))),
            })
            .collect()
    }

    /// A map output whose values are objects (e.g. fargate profiles).
    pub fn object_map(&self, key: &str) -> Result<BTreeMap<String, Map<String, Value>>> {
        let value = self.get(key)?;
        let Value::Object(entries) = value else {
            return Err(Error::output(format!(
                "output `{key}` is not a map, got {}",
                type_name(value)
            )));
        };
        entries
            .iter()
            .map(|(name, value)| match value {
                Value::Object(obj) => Ok((name.clone(), obj.clone())),
                other => Err(Error::output(format!(
                    "output `{key}` entry `{name}` is not an object ({})",
                    type_name(other)
                ))),
            })
            .collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
