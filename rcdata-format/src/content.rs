//! Logical payload kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FormatError, FormatResult};

/// What a file's payload holds. Fixed for the lifetime of a file.
///
/// The header identifier routes a reader to the right deserializer; the
/// 3-byte tag is repeated in the expansion record as a cross-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Generic keyed data (configuration and similar).
    #[default]
    Generic,
    /// A single resource.
    Resource,
    /// An index of resource files.
    ResourceIndex,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [Self::Generic, Self::Resource, Self::ResourceIndex];

    /// 4-bit header identifier.
    pub const fn identifier(self) -> u8 {
        match self {
            Self::Generic => 0x0,
            Self::Resource => 0x1,
            Self::ResourceIndex => 0x2,
        }
    }

    /// 3-byte discriminator stored in the expansion record.
    pub const fn tag(self) -> [u8; 3] {
        match self {
            Self::Generic => [0x00, 0x00, 0x00],
            Self::Resource => [0x00, 0x01, 0x00],
            Self::ResourceIndex => [0x00, 0x01, 0x01],
        }
    }

    pub fn from_identifier(identifier: u8) -> FormatResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.identifier() == identifier)
            .ok_or_else(|| FormatError::UnknownContentType(format!("identifier {identifier:#x}")))
    }

    pub fn from_tag(tag: [u8; 3]) -> FormatResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.tag() == tag)
            .ok_or_else(|| FormatError::UnknownContentType(hex::encode(tag)))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generic => "generic",
            Self::Resource => "resource",
            Self::ResourceIndex => "resource_index",
        };
        f.write_str(name)
    }
}
