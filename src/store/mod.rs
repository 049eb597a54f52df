//! Store Layer
//!
//! Explicitly constructed state containers, one per entity kind, each with
//! an injected gateway. Cross-store reads go through snapshots.

mod boards;
mod entity_store;
mod errors;


use crate::gateway::OrderedGateway;
use crate::models::{Column, Tag};

pub use boards::BoardStore;
pub use entity_store::EntityStore;
pub use errors::{ErrorStore, Notification, Operation};

pub type ColumnStore = EntityStore<Column, dyn OrderedGateway<Column>>;
pub type TagStore = EntityStore<Tag>;
