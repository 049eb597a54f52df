//! Remote Gateway Contract
//!
//! Async interface to the server that owns every entity. Expected failures
//! come back as `GatewayError` values, never as panics.

mod memory;

use async_trait::async_trait;

use crate::entity::{Linked, Resource};
use crate::error::GatewayResult;
use crate::models::{Board, BoardId, Status, UserId};

pub use memory::MemoryGateway;

/// CRUD calls shared by every entity kind
#[async_trait]
pub trait Gateway<T: Resource>: Send + Sync {
    async fn fetch_one(&self, id: T::Id) -> GatewayResult<T>;

    /// All entities, or only those of the given boards
    async fn fetch_many(&self, board_ids: Option<Vec<BoardId>>) -> GatewayResult<Vec<T>>;

    /// Returns the stored entity with its server-assigned id
    async fn create(&self, payload: T::Create) -> GatewayResult<T>;

    async fn update(&self, id: T::Id, payload: T::Update) -> GatewayResult<T>;

    async fn delete(&self, id: T::Id) -> GatewayResult<Status>;
}

/// Extra call for kinds ordered by a `next` pointer
#[async_trait]
pub trait OrderedGateway<T: Linked>: Gateway<T> {
    /// Make `id` precede `next_id` (`None`: last). The server relinks the
    /// neighbours itself and returns the moved entity.
    async fn move_to(&self, id: T::Id, next_id: Option<T::Id>) -> GatewayResult<T>;
}

/// Board membership calls
#[async_trait]
pub trait BoardGateway: Gateway<Board> {
    async fn invite_user(&self, board_id: BoardId, user_id: UserId) -> GatewayResult<Status>;

    /// The current user leaves the board
    async fn leave(&self, board_id: BoardId) -> GatewayResult<Status>;
}
