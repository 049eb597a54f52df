//! Optimistic Entity Store
//!
//! One store per entity kind. Every remote-backed write follows the same
//! protocol: capture the values it is about to touch, apply the guess
//! locally, call the gateway, then either commit the server's canonical
//! values or restore the captured ones. Local writes are synchronous, so a
//! caller reading right after issuing an operation already sees the guess.

use std::sync::Arc;

use tokio::sync::watch;

use super::errors::{ErrorStore, Notification, Operation};
use crate::chain::{self, MovePlan};
use crate::collection::Collection;
use crate::config::{RollbackPolicy, StoreConfig};
use crate::entity::{Linked, Patch, Resource};
use crate::error::GatewayError;
use crate::gateway::{Gateway, OrderedGateway};
use crate::models::{BoardId, Status};

/// Values touched by one optimistic write
struct Batch<T: Resource> {
    /// Value before the write; `None` when the entity did not exist
    captured: Vec<(T::Id, Option<Arc<T>>)>,
    /// Value the write installed; `None` when it removed the entity
    installed: Vec<(T::Id, Option<Arc<T>>)>,
}

impl<T: Resource> Batch<T> {
    fn empty() -> Self {
        Self {
            captured: Vec::new(),
            installed: Vec::new(),
        }
    }

    /// True while nothing else has overwritten what this batch installed
    fn is_current(&self, collection: &Collection<T>) -> bool {
        self.installed.iter().all(|(id, installed)| {
            match (collection.get_arc(*id), installed) {
                (None, None) => true,
                (Some(current), Some(installed)) => Arc::ptr_eq(&current, installed),
                _ => false,
            }
        })
    }
}

pub struct EntityStore<T: Resource, G: ?Sized + Gateway<T> = dyn Gateway<T>> {
    state: watch::Sender<Collection<T>>,
    gateway: Arc<G>,
    policy: RollbackPolicy,
    errors: Option<ErrorStore>,
}

impl<T: Resource, G: ?Sized + Gateway<T>> EntityStore<T, G> {
    pub fn new(gateway: Arc<G>, config: &StoreConfig) -> Self {
        let (state, _) = watch::channel(Collection::new());
        Self {
            state,
            gateway,
            policy: config.rollback,
            errors: None,
        }
    }

    /// Forward absorbed gateway errors to `errors`
    pub fn with_errors(mut self, errors: ErrorStore) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    // ========================
    // Reads
    // ========================

    /// Current state, optimistic guesses included
    pub fn snapshot(&self) -> Collection<T> {
        self.state.borrow().clone()
    }

    /// Wakes on every state transition
    pub fn subscribe(&self) -> watch::Receiver<Collection<T>> {
        self.state.subscribe()
    }

    pub fn get(&self, id: T::Id) -> Option<Arc<T>> {
        self.state.borrow().get_arc(id)
    }

    // ========================
    // Local writes (no remote call)
    // ========================

    pub fn add(&self, entity: T) {
        self.write(|state| state.set(entity));
    }

    pub fn add_many(&self, entities: Vec<T>) {
        self.write(|state| state.set_many(entities));
    }

    pub fn remove(&self, id: T::Id) {
        self.write(|state| state.remove(id));
    }

    pub fn remove_many(&self, ids: Vec<T::Id>) {
        self.write(|state| state.remove_many(ids));
    }

    pub fn reset(&self) {
        self.write(|_| Collection::new());
    }

    /// Replace the state; publishes only when the result is a new object
    fn write(&self, update: impl FnOnce(&Collection<T>) -> Collection<T>) {
        self.state.send_if_modified(|state| {
            let next = update(state);
            if next.ptr_eq(state) {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Plan and apply an optimistic write in one state transition.
    /// `plan` returns the values to set and the ids to remove, or `None`
    /// to leave the state untouched.
    fn apply_optimistic(
        &self,
        plan: impl FnOnce(&Collection<T>) -> Option<(Vec<T>, Vec<T::Id>)>,
    ) -> Option<Batch<T>> {
        let mut batch = None;
        self.state.send_if_modified(|state| {
            let Some((sets, removes)) = plan(state) else {
                return false;
            };

            let touched: Vec<T::Id> = sets
                .iter()
                .map(|entity| entity.id())
                .chain(removes.iter().copied())
                .collect();
            let next = state.set_many(sets).remove_many(removes);

            let captured = touched.iter().map(|id| (*id, state.get_arc(*id))).collect();
            let installed = touched.iter().map(|id| (*id, next.get_arc(*id))).collect();
            batch = Some(Batch { captured, installed });

            if next.ptr_eq(state) {
                return false;
            }
            *state = next;
            true
        });
        batch
    }

    /// Restore every captured value of `batch` in one transition
    fn rollback(&self, batch: Batch<T>) {
        if batch.captured.is_empty() {
            return;
        }
        if self.policy == RollbackPolicy::SkipStale && !batch.is_current(&self.snapshot()) {
            tracing::debug!(kind = T::KIND, "rollback skipped, a newer write touched the batch");
            return;
        }

        let touched = batch.captured.len();
        self.write(|state| {
            batch
                .captured
                .into_iter()
                .fold(state.clone(), |state, (id, previous)| match previous {
                    Some(previous) => state.set_arc(previous),
                    None => state.remove(id),
                })
        });
        tracing::warn!(kind = T::KIND, touched, "optimistic write rolled back");
    }

    /// Replace the guesses of `batch` with the server's values
    fn commit(&self, batch: Batch<T>, canonical: Vec<T>) {
        if self.policy == RollbackPolicy::SkipStale && !batch.is_current(&self.snapshot()) {
            tracing::debug!(kind = T::KIND, "commit skipped, a newer write touched the batch");
            return;
        }
        self.write(|state| state.set_many(canonical));
        tracing::debug!(kind = T::KIND, touched = batch.installed.len(), "optimistic write committed");
    }

    pub(crate) fn report(&self, operation: Operation, target: Option<String>, error: GatewayError) {
        tracing::warn!(
            kind = T::KIND,
            %operation,
            target = target.as_deref().unwrap_or("-"),
            %error,
            "remote call failed"
        );

        if let Some(errors) = &self.errors {
            errors.push(Notification {
                kind: T::KIND,
                operation,
                target,
                error,
                at: chrono::Utc::now(),
            });
        }
    }

    // ========================
    // Remote-backed operations
    // ========================

    pub async fn fetch_one(&self, id: T::Id) -> Option<T> {
        match self.gateway.fetch_one(id).await {
            Ok(entity) => {
                self.add(entity.clone());
                Some(entity)
            }
            Err(error) => {
                self.report(Operation::Fetch, Some(format!("{:?}", id)), error);
                None
            }
        }
    }

    /// Fetch and merge: cached entities missing from the response stay
    pub async fn fetch_many(&self, board_ids: Option<Vec<BoardId>>) -> Option<Vec<T>> {
        match self.gateway.fetch_many(board_ids).await {
            Ok(entities) => {
                self.add_many(entities.clone());
                Some(entities)
            }
            Err(error) => {
                self.report(Operation::Fetch, None, error);
                None
            }
        }
    }

    /// Fetch and replace everything inside the filter (everything when `None`)
    pub async fn refresh(&self, board_ids: Option<Vec<BoardId>>) -> Option<Vec<T>> {
        match self.gateway.fetch_many(board_ids.clone()).await {
            Ok(entities) => {
                let fetched = entities.clone();
                self.write(|state| {
                    let kept = match &board_ids {
                        Some(ids) => state.retain(|entity| !ids.contains(&entity.board_id())),
                        None => Collection::new(),
                    };
                    kept.set_many(fetched)
                });
                Some(entities)
            }
            Err(error) => {
                self.report(Operation::Fetch, None, error);
                None
            }
        }
    }

    /// Ids are server-assigned, so nothing is guessed before the response
    pub async fn create(&self, payload: T::Create) -> Option<T> {
        match self.gateway.create(payload).await {
            Ok(created) => {
                let inserted = created.clone();
                self.write(|state| {
                    let edits = T::insert_edits(state, &inserted);
                    state.set_many(edits).set(inserted)
                });
                tracing::debug!(kind = T::KIND, id = ?created.id(), "created");
                Some(created)
            }
            Err(error) => {
                self.report(Operation::Create, None, error);
                None
            }
        }
    }

    pub async fn update(&self, id: T::Id, payload: T::Update) -> Option<T> {
        let batch = self
            .apply_optimistic(|state| {
                state
                    .get(id)
                    .map(|current| (vec![payload.apply_to(current)], Vec::new()))
            })
            .unwrap_or_else(Batch::empty);

        match self.gateway.update(id, payload).await {
            Ok(updated) => {
                self.commit(batch, vec![updated.clone()]);
                Some(updated)
            }
            Err(error) => {
                self.rollback(batch);
                self.report(Operation::Update, Some(format!("{:?}", id)), error);
                None
            }
        }
    }

    /// The remote delete is issued even when `id` is not cached
    pub async fn delete(&self, id: T::Id) -> Option<Status> {
        let batch = self
            .apply_optimistic(|state| {
                if !state.contains(id) {
                    return None;
                }
                Some((T::remove_edits(state, id), vec![id]))
            })
            .unwrap_or_else(Batch::empty);

        match self.gateway.delete(id).await {
            Ok(status) => {
                tracing::debug!(kind = T::KIND, id = ?id, "deleted");
                Some(status)
            }
            Err(error) => {
                self.rollback(batch);
                self.report(Operation::Delete, Some(format!("{:?}", id)), error);
                None
            }
        }
    }
}

impl<T: Linked, G: ?Sized + OrderedGateway<T>> EntityStore<T, G> {
    /// Ordered members of `scope`, head first
    pub fn ordered(&self, scope: T::Scope) -> Vec<Arc<T>> {
        chain::materialize_order(&self.snapshot(), scope)
    }

    /// Move `id` in front of `next_id` (`None`: to the end of its scope).
    ///
    /// The relinked neighbours are applied locally as one batch, the remote
    /// call names only `(id, next_id)`, and the batch is restored as a unit
    /// when the call fails. Moves that change nothing issue no remote call.
    pub async fn move_to(&self, id: T::Id, next_id: Option<T::Id>) -> Option<T> {
        let mut skipped = None;
        let batch = self.apply_optimistic(|state| match chain::plan_move(state, id, next_id) {
            MovePlan::Relink(edits) => Some((edits, Vec::new())),
            MovePlan::Unchanged => {
                skipped = Some("unchanged");
                None
            }
            MovePlan::Invalid(reason) => {
                skipped = Some(reason);
                None
            }
        });

        let Some(batch) = batch else {
            tracing::debug!(
                kind = T::KIND,
                id = ?id,
                next = ?next_id,
                reason = skipped.unwrap_or("-"),
                "move skipped"
            );
            return None;
        };

        match self.gateway.move_to(id, next_id).await {
            Ok(moved) => {
                self.commit(batch, vec![moved.clone()]);
                Some(moved)
            }
            Err(error) => {
                self.rollback(batch);
                self.report(Operation::Move, Some(format!("{:?}", id)), error);
                None
            }
        }
    }
}
