//! Priority resolution of ranked sources into a schema.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::schema::FieldSchema;
use crate::source::{Coercion, Priority, Source};

/// Which source supplied each field's final value.
///
/// Fields missing here kept their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    winners: BTreeMap<String, (String, Priority)>,
    skipped: Vec<String>,
}

impl Resolution {
    /// Name of the source whose value the field ended up with.
    pub fn winner(&self, field: &str) -> Option<&str> {
        self.winners.get(field).map(|(source, _)| source.as_str())
    }

    pub fn winning_priority(&self, field: &str) -> Option<Priority> {
        self.winners.get(field).map(|(_, p)| *p)
    }

    /// Names of sources dropped because their priority was disabled.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Number of fields overwritten by some source.
    pub fn resolved_count(&self) -> usize {
        self.winners.len()
    }
}

/// Applies sources to a schema in ascending priority, last write wins.
pub struct SourceMerger;

impl SourceMerger {
    /// Resolves `sources` into `schema`.
    ///
    /// Sources at a disabled priority are skipped. The rest are applied in
    /// ascending priority order (ties keep their order in `sources`), so the
    /// highest enabled source providing a field decides its value.
    ///
    /// Fail-fast: the first rejected value aborts resolution with a
    /// [`ModelError::Rejected`]. Assignments made before it stay applied.
    pub fn resolve(schema: &mut FieldSchema, sources: Vec<Source>) -> ModelResult<Resolution> {
        let mut resolution = Resolution::default();
        let mut enabled = Vec::with_capacity(sources.len());
        for source in sources {
            if source.is_enabled() {
                enabled.push(source);
            } else {
                debug!(source = %source.name, "Source disabled, skipping");
                resolution.skipped.push(source.name);
            }
        }
        enabled.sort_by_key(|s| s.priority);

        for source in enabled {
            for (name, candidate) in source.values {
                let Some(field) = schema.field_mut(&name) else {
                    debug!(source = %source.name, field = %name, "Ignoring undeclared field");
                    continue;
                };

                let value = match (source.coercion, candidate) {
                    (Coercion::FromString, Value::String(raw)) => {
                        field.field_type().coerce_str(&raw).ok_or_else(|| {
                            ModelError::Rejected {
                                source_name: source.name.clone(),
                                field: name.clone(),
                                reason: format!(
                                    "cannot read {raw:?} as {}",
                                    field.field_type()
                                ),
                            }
                        })?
                    }
                    (_, candidate) => candidate,
                };

                field.assign(value).map_err(|e| ModelError::Rejected {
                    source_name: source.name.clone(),
                    field: name.clone(),
                    reason: e.to_string(),
                })?;
                resolution
                    .winners
                    .insert(name, (source.name.clone(), source.priority));
            }
            debug!(source = %source.name, priority = %source.priority, "Source applied");
        }

        Ok(resolution)
    }
}
