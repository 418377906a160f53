use std::ffi::OsString;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Rank of a source. Higher wins; [`Priority::DISABLED`] skips the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    /// Sentinel that removes a source from resolution entirely.
    pub const DISABLED: Priority = Priority(-1);

    /// Negative ranks, the sentinel included, are all treated as disabled.
    pub fn is_enabled(self) -> bool {
        self.0 >= 0
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_enabled() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("disabled")
        }
    }
}

/// Ranks of the four standard sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priorities {
    pub init: Priority,
    pub env: Priority,
    pub file: Priority,
    pub defaults: Priority,
}

impl Default for Priorities {
    fn default() -> Self {
        Self {
            init: Priority(4),
            env: Priority(3),
            file: Priority(2),
            defaults: Priority(1),
        }
    }
}

impl Priorities {
    /// Only the file is consulted; everything else stays at its default.
    pub fn file_only() -> Self {
        Self {
            init: Priority::DISABLED,
            env: Priority::DISABLED,
            file: Priority(2),
            defaults: Priority::DISABLED,
        }
    }
}

/// How a source's values are fitted to a field's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    /// Values must already have the declared type.
    #[default]
    Strict,
    /// String values are parsed toward the declared type.
    FromString,
}

/// A named, ranked provider of candidate field values.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub priority: Priority,
    pub coercion: Coercion,
    pub values: Map<String, Value>,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        priority: impl Into<Priority>,
        values: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            priority: priority.into(),
            coercion: Coercion::Strict,
            values,
        }
    }

    /// Explicit constructor arguments.
    pub fn init(priority: impl Into<Priority>, values: Map<String, Value>) -> Self {
        Self::new("init", priority, values)
    }

    /// Values decoded from a persisted file.
    pub fn file(priority: impl Into<Priority>, values: Map<String, Value>) -> Self {
        Self::new("file", priority, values)
    }

    /// Compiled-in or host-supplied defaults.
    pub fn defaults(priority: impl Into<Priority>, values: Map<String, Value>) -> Self {
        Self::new("defaults", priority, values)
    }

    /// Environment variables named `{prefix}{FIELD}`, read once from `vars`.
    ///
    /// The field name is the remainder after the prefix, lowercased, so only
    /// fields declared in lowercase can be set this way. Values arrive as
    /// strings and are coerced to each field's declared type.
    pub fn from_env<I, K, V>(priority: impl Into<Priority>, prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let field = key.as_ref().strip_prefix(prefix)?;
                if field.is_empty() {
                    return None;
                }
                Some((field.to_ascii_lowercase(), Value::String(value.into())))
            })
            .collect();

        Self {
            name: "env".into(),
            priority: priority.into(),
            coercion: Coercion::FromString,
            values,
        }
    }

    /// Like [`Source::from_env`] over platform strings. Entries whose name or
    /// value is not valid Unicode are skipped.
    pub fn from_env_os<I>(priority: impl Into<Priority>, prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let vars = vars
            .into_iter()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (key, _) => {
                    debug!(key = ?key, "Skipping non-Unicode environment entry");
                    None
                }
            });
        Self::from_env(priority, prefix, vars)
    }

    /// Snapshot of the current process environment.
    pub fn from_process_env(priority: impl Into<Priority>, prefix: &str) -> Self {
        Self::from_env_os(priority, prefix, std::env::vars_os())
    }

    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.priority.is_enabled()
    }
}
