//! Persistence for rcdata.
//!
//! Ties the field model to disk:
//! - [`PersistentStore`]: writes `[header][expansion][body]` atomically and
//!   reads it back, running compaction, signing, and hashing as the header
//!   declares
//! - [`Data`]: a schema resolved from init, env, file, and defaults sources,
//!   bound to an optional file
//! - [`ConfigData`], [`Resource`], [`ResourceIndex`]: the stock models
//!
//! # Body layout
//!
//! The payload is a JSON envelope `{"content_type": .., "fields": {..}}`.
//! Compaction runs first, then signing prepends `[sig_len:u16 LE][sig]`,
//! then hashing prepends `[digest_len:u8][digest]`. Reading undoes the
//! stages in reverse and fails on the first check that does not hold.

mod config;
mod data;
mod error;
mod pipeline;
mod resource;
mod store;

pub use config::ConfigData;
pub use data::{Data, OpenOptions};
pub use error::{StoreError, StoreResult};
pub use resource::{
    COMPACT_INDEX_EXT, COMPACT_RESOURCE_EXT, INDEX_EXT, RESOURCE_EXT, Resource, ResourceIndex,
    ResourceOptions,
};
pub use store::{Loaded, PersistentStore};
