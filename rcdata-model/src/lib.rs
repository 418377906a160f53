//! Typed field model for rcdata.
//!
//! Defines the layered field model every rcdata container is built on:
//! - [`TypedField`]: a named, typed, defaulted value slot
//! - [`FieldSchema`]: the ordered fields of one data model instance
//! - [`DataModel`] / [`SchemaBuilder`]: explicit field declaration
//! - [`Source`] / [`Priority`]: ranked providers of candidate values
//! - [`SourceMerger`]: priority resolution of sources into a schema
//!
//! Values are JSON (`serde_json::Value`); [`FieldType`] pins each field to
//! one JSON shape and every assignment is checked against it.

mod error;
mod field;
mod merge;
mod schema;
mod source;

pub use error::{ModelError, ModelResult};
pub use field::{FieldType, TypedField};
pub use merge::{Resolution, SourceMerger};
pub use schema::{DataModel, FieldSchema, SchemaBuilder, Snapshot};
pub use source::{Coercion, Priorities, Priority, Source};
