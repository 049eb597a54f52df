//! Keyed Entity Collection
//!
//! Immutable id -> entity map. Every write returns a new collection that
//! shares the `Arc` of every untouched entry, so a watcher holding an older
//! snapshot can compare entries by pointer to see what changed.
//! No ordering is implied here; see `chain` for ordered kinds.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::entity::Entity;

pub struct Collection<T: Entity> {
    entries: Arc<HashMap<T::Id, Arc<T>>>,
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(HashMap::new()),
        }
    }

    pub fn from_entities(entities: impl IntoIterator<Item = T>) -> Self {
        Self::new().set_many(entities)
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.entries.get(&id).map(|entity| entity.as_ref())
    }

    /// Shared handle to the stored value, for identity checks
    pub fn get_arc(&self, id: T::Id) -> Option<Arc<T>> {
        self.entries.get(&id).cloned()
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in arbitrary order
    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.values()
    }

    /// Entries ordered by id
    pub fn sorted(&self) -> Vec<Arc<T>> {
        let mut values: Vec<Arc<T>> = self.entries.values().cloned().collect();
        values.sort_by_key(|entity| entity.id());
        values
    }

    /// Insert or replace by id
    pub fn set(&self, entity: T) -> Self {
        self.set_arc(Arc::new(entity))
    }

    pub fn set_arc(&self, entity: Arc<T>) -> Self {
        let mut entries = HashMap::clone(&self.entries);
        entries.insert(entity.id(), entity);
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Fold of `set`: later entries win on id collision
    pub fn set_many(&self, entities: impl IntoIterator<Item = T>) -> Self {
        let mut entities = entities.into_iter().peekable();
        if entities.peek().is_none() {
            return self.clone();
        }
        let mut entries = HashMap::clone(&self.entries);
        for entity in entities {
            entries.insert(entity.id(), Arc::new(entity));
        }
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Removing an absent id returns the same collection
    pub fn remove(&self, id: T::Id) -> Self {
        if !self.entries.contains_key(&id) {
            return self.clone();
        }
        let mut entries = HashMap::clone(&self.entries);
        entries.remove(&id);
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn remove_many(&self, ids: impl IntoIterator<Item = T::Id>) -> Self {
        ids.into_iter()
            .fold(self.clone(), |collection, id| collection.remove(id))
    }

    /// Keep only the entries matching `keep`
    pub fn retain(&self, mut keep: impl FnMut(&T) -> bool) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(_, entity)| keep(entity))
            .map(|(id, entity)| (*id, Arc::clone(entity)))
            .collect();
        Self {
            entries: Arc::new(entries),
        }
    }

    /// True when both handles are the very same state object
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<T: Entity> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> PartialEq for Collection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.entries == other.entries
    }
}

impl<T: Entity> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.sorted()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;

    fn make_tag(id: u32, name: &str) -> Tag {
        Tag {
            id,
            board_id: 1,
            name: name.to_string(),
            color: None,
        }
    }

    #[test]
    fn test_set_shares_untouched_entries() {
        let before = Collection::from_entities(vec![make_tag(1, "a"), make_tag(2, "b")]);
        let after = before.set(make_tag(2, "renamed"));

        assert!(Arc::ptr_eq(
            &before.get_arc(1).unwrap(),
            &after.get_arc(1).unwrap()
        ));
        assert_eq!(after.get(2).unwrap().name, "renamed");
        assert_eq!(before.get(2).unwrap().name, "b");
    }

    #[test]
    fn test_set_is_idempotent() {
        let base = Collection::from_entities(vec![make_tag(1, "a")]);
        let once = base.set(make_tag(2, "b"));
        let twice = once.set(make_tag(2, "b"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_set_many_later_entries_win() {
        let collection =
            Collection::new().set_many(vec![make_tag(1, "first"), make_tag(1, "second")]);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(1).unwrap().name, "second");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let base = Collection::from_entities(vec![make_tag(1, "a"), make_tag(2, "b")]);
        let once = base.remove(1);
        let twice = once.remove(1);

        assert_eq!(once, twice);
        assert!(once.ptr_eq(&twice));
        assert!(!once.contains(1));
        assert!(base.contains(1));
    }

    #[test]
    fn test_remove_many_and_retain() {
        let base = Collection::from_entities((1..=5).map(|id| make_tag(id, "t")));
        let removed = base.remove_many(vec![1, 3, 9]);
        assert_eq!(
            removed.sorted().iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![2, 4, 5]
        );

        let even = base.retain(|tag| tag.id % 2 == 0);
        assert_eq!(even.len(), 2);
        assert!(Arc::ptr_eq(&even.get_arc(2).unwrap(), &base.get_arc(2).unwrap()));
    }
}
