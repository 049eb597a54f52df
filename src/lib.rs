//! Board Cache
//!
//! Client-side cache of server-owned boards, ordered columns and tags.
//! Writes are applied optimistically, confirmed by the remote gateway, and
//! rolled back when the gateway rejects them.
//!
//! Layers:
//! - collection: immutable keyed maps with structural sharing
//! - chain: ordering of `next`-linked entities and its repair routines
//! - gateway: async contract of the remote system, plus an in-memory server
//! - store: optimistic coordinators, one per entity kind
//! - selectors: pure queries over store snapshots

pub mod chain;
pub mod collection;
pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod models;
pub mod selectors;
pub mod store;

pub use collection::Collection;
pub use config::{RollbackPolicy, StoreConfig};
pub use entity::{Entity, Linked, Patch, Resource};
pub use error::{ChainError, ConfigError, GatewayError, GatewayResult};
pub use store::{BoardStore, ColumnStore, EntityStore, ErrorStore, TagStore};
