use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::field::TypedField;

/// Ordered mapping from field name to current value.
pub type Snapshot = Map<String, Value>;

/// A data model that declares its fields once.
///
/// `declare` is the shared, immutable shape of the model: each instance
/// builds its own [`FieldSchema`] from it, so values are never shared.
///
/// Environment sources lowercase variable names, so a field is reachable
/// from the environment only if its name is lowercase.
///
/// ```ignore
/// struct Profile;
///
/// impl DataModel for Profile {
///     fn declare(schema: &mut SchemaBuilder) {
///         schema
///             .field("name", TypedField::text("default_name"))
///             .field("age", TypedField::integer(30));
///     }
/// }
/// ```
pub trait DataModel {
    fn declare(schema: &mut SchemaBuilder);
}

/// Collects field declarations in order. Errors are deferred to
/// [`SchemaBuilder::build`] so declarations can be chained.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<TypedField>,
    error: Option<ModelError>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field built from the fallible [`TypedField::new`].
    pub fn try_field(&mut self, name: &str, field: ModelResult<TypedField>) -> &mut Self {
        match field {
            Ok(field) => self.field(name, field),
            Err(e) => {
                self.error.get_or_insert(e);
                self
            }
        }
    }

    /// Declares a field and binds its name.
    pub fn field(&mut self, name: &str, mut field: TypedField) -> &mut Self {
        field.bind_name(name);
        self.fields.push(field);
        self
    }

    /// Finishes the schema, rejecting empty and duplicate names.
    pub fn build(self) -> ModelResult<FieldSchema> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let mut index = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if field.name().is_empty() {
                return Err(ModelError::Schema("field name must not be empty".into()));
            }
            if index.insert(field.name().to_string(), i).is_some() {
                return Err(ModelError::Schema(format!(
                    "field `{}` is declared more than once",
                    field.name()
                )));
            }
        }

        Ok(FieldSchema {
            fields: self.fields,
            index,
        })
    }
}

/// The fields of one data model instance, in declaration order.
///
/// Membership is fixed once built; values stay mutable through
/// [`FieldSchema::set`].
#[derive(Debug, Clone)]
pub struct FieldSchema {
    fields: Vec<TypedField>,
    index: HashMap<String, usize>,
}

impl FieldSchema {
    /// Runs the model's declarations and builds the schema.
    pub fn build_from_model<M: DataModel>() -> ModelResult<Self> {
        let mut builder = SchemaBuilder::new();
        M::declare(&mut builder);
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&TypedField> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut TypedField> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.fields[i]),
            None => None,
        }
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypedField> {
        self.fields.iter()
    }

    /// Declared field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(TypedField::name).collect()
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).map(TypedField::value)
    }

    /// Current value of a field deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> ModelResult<T> {
        self.field(name)
            .ok_or_else(|| ModelError::UnknownField(name.into()))?
            .get_as()
    }

    /// Type-checked assignment to a declared field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        self.field_mut(name)
            .ok_or_else(|| ModelError::UnknownField(name.into()))?
            .assign(value.into())
    }

    /// Restores every field to its default.
    pub fn reset(&mut self) {
        self.fields.iter_mut().for_each(TypedField::reset);
    }

    /// Current values keyed by name, in declaration order.
    pub fn snapshot(&self) -> Snapshot {
        self.fields
            .iter()
            .map(|f| (f.name().to_string(), f.value().clone()))
            .collect()
    }
}
