use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};

/// The declared type of a field.
///
/// Values are held as JSON, so each type maps onto a JSON shape. `Float`
/// only accepts floating point numbers; integers do not widen implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Bool,
    Integer,
    Float,
    Text,
    List,
    Map,
}

impl FieldType {
    /// Infers the type of a JSON value. `null` has no field type.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Bool),
            Value::Number(n) if n.is_f64() => Some(Self::Float),
            Value::Number(_) => Some(Self::Integer),
            Value::String(_) => Some(Self::Text),
            Value::Array(_) => Some(Self::List),
            Value::Object(_) => Some(Self::Map),
        }
    }

    /// Returns true if `value` has this type's JSON shape.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_f64(),
            Self::Text => value.is_string(),
            Self::List => value.is_array(),
            Self::Map => value.is_object(),
        }
    }

    /// The default used when a field is declared by type alone.
    pub fn zero_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Integer => Value::from(0),
            Self::Float => Value::from(0.0),
            Self::Text => Value::String(String::new()),
            Self::List => Value::Array(Vec::new()),
            Self::Map => Value::Object(serde_json::Map::new()),
        }
    }

    /// Parses a string into this type.
    ///
    /// Used for sources that can only deliver text, such as the process
    /// environment. Returns `None` when the text does not unambiguously
    /// denote a value of this type.
    pub fn coerce_str(self, raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        match self {
            Self::Text => Some(Value::String(raw.to_string())),
            Self::Integer => trimmed.parse::<i64>().ok().map(Value::from),
            Self::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::from),
            Self::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            Self::List | Self::Map => serde_json::from_str::<Value>(trimmed)
                .ok()
                .filter(|v| self.matches(v)),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::List => "list",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// A named slot holding a value of a fixed type.
///
/// The current value always satisfies the declared type: every assignment
/// goes through [`TypedField::assign`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypedField {
    name: String,
    field_type: FieldType,
    default: Value,
    value: Value,
}

impl TypedField {
    /// Declares a field from a default, a type, or both.
    ///
    /// With only a default the type is inferred from it. With only a type
    /// the default is the type's zero value.
    pub fn new(default: Option<Value>, field_type: Option<FieldType>) -> ModelResult<Self> {
        let (default, field_type) = match (default, field_type) {
            (None, None) => {
                return Err(ModelError::Config(
                    "a field needs a default or a declared type".into(),
                ));
            }
            (Some(default), Some(ty)) => {
                if !ty.matches(&default) {
                    return Err(ModelError::Config(format!(
                        "default {default} does not match declared type {ty}"
                    )));
                }
                (default, ty)
            }
            (Some(default), None) => {
                let ty = FieldType::of(&default).ok_or_else(|| {
                    ModelError::Config("cannot infer a field type from a null default".into())
                })?;
                (default, ty)
            }
            (None, Some(ty)) => (ty.zero_value(), ty),
        };

        Ok(Self {
            name: String::new(),
            field_type,
            value: default.clone(),
            default,
        })
    }

    /// Shorthand for a text field.
    pub fn text(default: &str) -> Self {
        Self::unchecked(Value::String(default.into()), FieldType::Text)
    }

    /// Shorthand for an integer field.
    pub fn integer(default: i64) -> Self {
        Self::unchecked(Value::from(default), FieldType::Integer)
    }

    /// Shorthand for a float field.
    pub fn float(default: f64) -> Self {
        let value = serde_json::Number::from_f64(default)
            .map(Value::Number)
            .unwrap_or_else(|| FieldType::Float.zero_value());
        Self::unchecked(value, FieldType::Float)
    }

    /// Shorthand for a boolean field.
    pub fn bool(default: bool) -> Self {
        Self::unchecked(Value::Bool(default), FieldType::Bool)
    }

    /// Shorthand for a list field.
    pub fn list(default: Vec<Value>) -> Self {
        Self::unchecked(Value::Array(default), FieldType::List)
    }

    /// Shorthand for a map field.
    pub fn map(default: serde_json::Map<String, Value>) -> Self {
        Self::unchecked(Value::Object(default), FieldType::Map)
    }

    fn unchecked(default: Value, field_type: FieldType) -> Self {
        Self {
            name: String::new(),
            field_type,
            value: default.clone(),
            default,
        }
    }

    pub(crate) fn bind_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Deserializes the current value into `T`.
    pub fn get_as<T: DeserializeOwned>(&self) -> ModelResult<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }

    /// Checks `value` against the declared type, or against `type_override`
    /// when one is given.
    pub fn matches(&self, value: &Value, type_override: Option<FieldType>) -> bool {
        type_override.unwrap_or(self.field_type).matches(value)
    }

    /// Replaces the current value. On a type mismatch the current value is
    /// left untouched.
    pub fn assign(&mut self, value: Value) -> ModelResult<()> {
        if !self.field_type.matches(&value) {
            return Err(ModelError::TypeMismatch {
                field: self.name.clone(),
                expected: self.field_type,
                value,
            });
        }
        self.value = value;
        Ok(())
    }

    /// Restores the declared default.
    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    /// Returns true if the current value differs from the default.
    pub fn is_modified(&self) -> bool {
        self.value != self.default
    }
}
