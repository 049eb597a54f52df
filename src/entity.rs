//! Core Entity Traits
//!
//! Every cached kind is an `Entity` with a server-assigned id. Kinds that the
//! remote gateway serves are `Resource`s, and kinds ordered by a forward
//! `next` pointer are `Linked`.

use std::fmt::Debug;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::collection::Collection;
use crate::models::BoardId;

/// Core trait for all cached entities
pub trait Entity: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Partial update payload applied on top of a full entity value
pub trait Patch<T> {
    /// Returns a new value with the patched fields replaced
    fn apply_to(&self, entity: &T) -> T;
}

/// An entity kind served by the remote gateway
pub trait Resource: Entity + Serialize + DeserializeOwned {
    /// Creation payload (no id)
    type Create: Clone + Debug + Send + Sync + 'static;
    /// Update payload (only the fields to change)
    type Update: Patch<Self> + Clone + Debug + Send + Sync + 'static;

    /// Short kind name used in logs and error notifications
    const KIND: &'static str;

    /// The board this entity belongs to. Boards return their own id.
    fn board_id(&self) -> BoardId;

    /// Build the canonical value a server would store for a fresh id
    fn from_create(id: Self::Id, payload: &Self::Create) -> Self;

    /// Sibling edits needed once `created` joins `collection`
    fn insert_edits(_collection: &Collection<Self>, _created: &Self) -> Vec<Self> {
        Vec::new()
    }

    /// Sibling edits needed once `id` leaves `collection`
    fn remove_edits(_collection: &Collection<Self>, _id: Self::Id) -> Vec<Self> {
        Vec::new()
    }
}

/// An entity ordered inside its scope by a singly-linked `next` relation.
///
/// `None` is the sentinel: the entity is the tail of its scope's chain.
pub trait Linked: Resource {
    type Scope: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn scope(&self) -> Self::Scope;

    fn next_id(&self) -> Option<Self::Id>;

    /// Same entity with `next` replaced
    fn with_next(&self, next: Option<Self::Id>) -> Self;
}
