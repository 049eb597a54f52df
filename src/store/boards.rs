//! Board Store
//!
//! Boards plus the id of the board the user is looking at. The selection is
//! tracked apart from the collection and survives fetches.

use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::watch;

use super::entity_store::EntityStore;
use super::errors::{ErrorStore, Operation};
use crate::config::StoreConfig;
use crate::gateway::BoardGateway;
use crate::models::{Board, BoardId, Status, UserId};

pub struct BoardStore {
    boards: EntityStore<Board, dyn BoardGateway>,
    current: watch::Sender<Option<BoardId>>,
}

impl BoardStore {
    pub fn new(gateway: Arc<dyn BoardGateway>, config: &StoreConfig) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            boards: EntityStore::new(gateway, config),
            current,
        }
    }

    pub fn with_errors(mut self, errors: ErrorStore) -> Self {
        self.boards = self.boards.with_errors(errors);
        self
    }

    // ========================
    // Selection
    // ========================

    pub fn select(&self, board_id: Option<BoardId>) {
        self.current.send_if_modified(|current| {
            let changed = *current != board_id;
            *current = board_id;
            changed
        });
    }

    pub fn current_id(&self) -> Option<BoardId> {
        *self.current.borrow()
    }

    /// The selected board, when it is cached
    pub fn current(&self) -> Option<Arc<Board>> {
        self.current_id().and_then(|id| self.boards.get(id))
    }

    pub fn subscribe_current(&self) -> watch::Receiver<Option<BoardId>> {
        self.current.subscribe()
    }

    fn clear_selection_of(&self, board_id: BoardId) {
        self.current.send_if_modified(|current| {
            if *current != Some(board_id) {
                return false;
            }
            *current = None;
            true
        });
    }

    // ========================
    // Remote-backed operations
    // ========================

    /// Deleting the selected board also clears the selection
    pub async fn delete(&self, board_id: BoardId) -> Option<Status> {
        let status = self.boards.delete(board_id).await?;
        self.clear_selection_of(board_id);
        Some(status)
    }

    /// Invite a user, then refetch the board to pick up its member list
    pub async fn invite_user(&self, board_id: BoardId, user_id: UserId) -> Option<Status> {
        match self.boards.gateway().invite_user(board_id, user_id).await {
            Ok(status) => {
                self.boards.fetch_one(board_id).await;
                Some(status)
            }
            Err(error) => {
                self.boards
                    .report(Operation::Invite, Some(board_id.to_string()), error);
                None
            }
        }
    }

    /// Leave a board; on success it disappears from the cache
    pub async fn leave(&self, board_id: BoardId) -> Option<Status> {
        match self.boards.gateway().leave(board_id).await {
            Ok(status) => {
                self.boards.remove(board_id);
                self.clear_selection_of(board_id);
                Some(status)
            }
            Err(error) => {
                self.boards
                    .report(Operation::Leave, Some(board_id.to_string()), error);
                None
            }
        }
    }
}

impl Deref for BoardStore {
    type Target = EntityStore<Board, dyn BoardGateway>;

    fn deref(&self) -> &Self::Target {
        &self.boards
    }
}
