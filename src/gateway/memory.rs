//! In-Memory Gateway
//!
//! Stand-in for the remote server: assigns ids, relinks chains server-side
//! with the same routines the client uses, and can be told to fail or lag.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{BoardGateway, Gateway, OrderedGateway};
use crate::chain::{self, MovePlan};
use crate::collection::Collection;
use crate::entity::{Linked, Patch, Resource};
use crate::error::{GatewayError, GatewayResult};
use crate::models::{Board, BoardId, Status, UserId};

struct ServerState<T: Resource> {
    entities: Collection<T>,
    next_id: u32,
}

pub struct MemoryGateway<T: Resource> {
    state: Mutex<ServerState<T>>,
    latency: Option<Duration>,
    failures: AtomicUsize,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl<T: Resource> MemoryGateway<T>
where
    T::Id: From<u32> + Into<u32>,
{
    pub fn new() -> Self {
        Self::with_entities(Vec::new())
    }

    /// Server pre-populated with `entities`; new ids continue after the largest
    pub fn with_entities(entities: Vec<T>) -> Self {
        let next_id = entities
            .iter()
            .map(|entity| entity.id().into())
            .max()
            .unwrap_or(0)
            + 1;

        Self {
            state: Mutex::new(ServerState {
                entities: Collection::from_entities(entities),
                next_id,
            }),
            latency: None,
            failures: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call sleeps this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Reject the next `count` calls
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// While offline every call fails with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of calls received so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Server-side state, for assertions
    pub async fn snapshot(&self) -> Collection<T> {
        self.state.lock().await.entities.clone()
    }

    async fn begin(&self, operation: &str) -> GatewayResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(format!("{} {}", T::KIND, operation)));
        }
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(GatewayError::Rejected(format!(
                "{} {} failed",
                T::KIND,
                operation
            )));
        }
        Ok(())
    }
}

impl<T: Resource> Default for MemoryGateway<T>
where
    T::Id: From<u32> + Into<u32>,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Resource> Gateway<T> for MemoryGateway<T>
where
    T::Id: From<u32> + Into<u32>,
{
    async fn fetch_one(&self, id: T::Id) -> GatewayResult<T> {
        self.begin("fetch").await?;
        let state = self.state.lock().await;
        state
            .entities
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(T::KIND, id))
    }

    async fn fetch_many(&self, board_ids: Option<Vec<BoardId>>) -> GatewayResult<Vec<T>> {
        self.begin("fetch").await?;
        let state = self.state.lock().await;
        Ok(state
            .entities
            .sorted()
            .into_iter()
            .filter(|entity| {
                board_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&entity.board_id()))
            })
            .map(|entity| T::clone(&entity))
            .collect())
    }

    async fn create(&self, payload: T::Create) -> GatewayResult<T> {
        self.begin("create").await?;
        let mut state = self.state.lock().await;

        let created = T::from_create(T::Id::from(state.next_id), &payload);
        state.next_id += 1;

        let edits = T::insert_edits(&state.entities, &created);
        state.entities = state.entities.set_many(edits).set(created.clone());
        Ok(created)
    }

    async fn update(&self, id: T::Id, payload: T::Update) -> GatewayResult<T> {
        self.begin("update").await?;
        let mut state = self.state.lock().await;

        let existing = state
            .entities
            .get(id)
            .ok_or_else(|| GatewayError::not_found(T::KIND, id))?;
        let updated = payload.apply_to(existing);
        state.entities = state.entities.set(updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: T::Id) -> GatewayResult<Status> {
        self.begin("delete").await?;
        let mut state = self.state.lock().await;

        if !state.entities.contains(id) {
            return Err(GatewayError::not_found(T::KIND, id));
        }
        let edits = T::remove_edits(&state.entities, id);
        state.entities = state.entities.set_many(edits).remove(id);
        Ok(Status::ok())
    }
}

#[async_trait]
impl<T: Linked> OrderedGateway<T> for MemoryGateway<T>
where
    T::Id: From<u32> + Into<u32>,
{
    async fn move_to(&self, id: T::Id, next_id: Option<T::Id>) -> GatewayResult<T> {
        self.begin("move").await?;
        let mut state = self.state.lock().await;

        match chain::plan_move(&state.entities, id, next_id) {
            MovePlan::Relink(edits) => {
                state.entities = state.entities.set_many(edits);
            }
            MovePlan::Unchanged => {}
            MovePlan::Invalid(reason) => return Err(GatewayError::Rejected(reason.to_string())),
        }

        state
            .entities
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(T::KIND, id))
    }
}

#[async_trait]
impl BoardGateway for MemoryGateway<Board> {
    async fn invite_user(&self, board_id: BoardId, user_id: UserId) -> GatewayResult<Status> {
        self.begin("invite").await?;
        let mut state = self.state.lock().await;

        let board = state
            .entities
            .get(board_id)
            .ok_or_else(|| GatewayError::not_found(Board::KIND, board_id))?;
        if board.user_ids.contains(&user_id) {
            return Err(GatewayError::Rejected(format!(
                "user {} is already a member",
                user_id
            )));
        }

        let mut board = board.clone();
        board.user_ids.push(user_id);
        state.entities = state.entities.set(board);
        Ok(Status::ok())
    }

    async fn leave(&self, board_id: BoardId) -> GatewayResult<Status> {
        self.begin("leave").await?;
        let mut state = self.state.lock().await;

        if !state.entities.contains(board_id) {
            return Err(GatewayError::not_found(Board::KIND, board_id));
        }
        state.entities = state.entities.remove(board_id);
        Ok(Status::ok())
    }
}
