//! Chain Utilities
//!
//! Ordered kinds store only a forward `next` pointer. Within a scope the
//! pointers must form one simple chain ending at the sentinel (`None`).
//! This module is the single place that reads and repairs that structure:
//! materializing the order, and planning the edits of a move, insert or
//! removal. All functions are pure; callers apply the returned edits.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::collection::Collection;
use crate::entity::Linked;
use crate::error::ChainError;

/// Members of `scope`, ordered by id so ties resolve deterministically
fn members<T: Linked>(collection: &Collection<T>, scope: T::Scope) -> Vec<Arc<T>> {
    collection
        .sorted()
        .into_iter()
        .filter(|entity| entity.scope() == scope)
        .collect()
}

/// `next id -> entity pointing at it`, first member wins on a branch
fn predecessors<T: Linked>(members: &[Arc<T>]) -> HashMap<T::Id, &Arc<T>> {
    let mut map = HashMap::new();
    for member in members {
        if let Some(next) = member.next_id() {
            map.entry(next).or_insert(member);
        }
    }
    map
}

/// Ordered members of `scope`, head first.
///
/// Walks backwards from the tail through "who points at me". A scope without
/// a tail yields an empty list. The walk stops on a cycle instead of looping.
pub fn materialize_order<T: Linked>(collection: &Collection<T>, scope: T::Scope) -> Vec<Arc<T>> {
    let members = members(collection, scope);
    let Some(tail) = members.iter().find(|member| member.next_id().is_none()) else {
        return Vec::new();
    };

    let predecessors = predecessors(&members);
    let mut seen = HashSet::from([tail.id()]);
    let mut ordered = vec![Arc::clone(tail)];
    let mut current = tail;

    while let Some(&previous) = predecessors.get(&current.id()) {
        if !seen.insert(previous.id()) {
            break;
        }
        ordered.push(Arc::clone(previous));
        current = previous;
    }

    ordered.reverse();
    ordered
}

/// Result of planning a move
#[derive(Debug, Clone, PartialEq)]
pub enum MovePlan<T> {
    /// New values of every entity the move touches, moved entity last
    Relink(Vec<T>),
    /// The entity already sits there, or was asked to precede itself
    Unchanged,
    /// Applying the move would break the chain
    Invalid(&'static str),
}

/// Plan the edits that make `id` precede `new_next` (`None`: become the tail).
///
/// Up to three entities change: the old predecessor closes the gap, the new
/// predecessor points at `id`, and `id` points at `new_next`.
pub fn plan_move<T: Linked>(
    collection: &Collection<T>,
    id: T::Id,
    new_next: Option<T::Id>,
) -> MovePlan<T> {
    if new_next == Some(id) {
        return MovePlan::Unchanged;
    }
    let Some(entity) = collection.get(id) else {
        return MovePlan::Invalid("unknown entity");
    };
    if entity.next_id() == new_next {
        return MovePlan::Unchanged;
    }

    let scope = entity.scope();
    if let Some(target) = new_next {
        match collection.get(target) {
            Some(target) if target.scope() == scope => {}
            _ => return MovePlan::Invalid("target is not in the same scope"),
        }
    }

    let members = members(collection, scope);
    let old_predecessor = members
        .iter()
        .find(|member| member.next_id() == Some(id));
    let new_predecessor = members
        .iter()
        .find(|member| member.id() != id && member.next_id() == new_next);

    // Moving to the end needs the current tail; a target of None with no
    // other tail means the chain is already broken.
    if new_next.is_none() && new_predecessor.is_none() {
        return MovePlan::Invalid("scope has no tail");
    }

    let mut edits = Vec::with_capacity(3);
    if let Some(previous) = old_predecessor {
        edits.push(previous.with_next(entity.next_id()));
    }
    if let Some(previous) = new_predecessor {
        edits.push(previous.with_next(Some(id)));
    }
    edits.push(entity.with_next(new_next));

    MovePlan::Relink(edits)
}

/// Edits needed once `created` joins the collection: whoever pointed at the
/// same `next` (the old tail when appending) now points at `created`.
pub fn plan_insert<T: Linked>(collection: &Collection<T>, created: &T) -> Vec<T> {
    members(collection, created.scope())
        .iter()
        .find(|member| member.id() != created.id() && member.next_id() == created.next_id())
        .map(|previous| vec![previous.with_next(Some(created.id()))])
        .unwrap_or_default()
}

/// Edits needed once `id` leaves the collection: its predecessor skips it
pub fn plan_remove<T: Linked>(collection: &Collection<T>, id: T::Id) -> Vec<T> {
    let Some(entity) = collection.get(id) else {
        return Vec::new();
    };
    members(collection, entity.scope())
        .iter()
        .find(|member| member.next_id() == Some(id))
        .map(|previous| vec![previous.with_next(entity.next_id())])
        .unwrap_or_default()
}

/// Check every chain invariant of `scope`
pub fn verify_chain<T: Linked>(collection: &Collection<T>, scope: T::Scope) -> Result<(), ChainError> {
    let members = members(collection, scope);
    if members.is_empty() {
        return Ok(());
    }

    let ids: HashSet<T::Id> = members.iter().map(|member| member.id()).collect();
    let mut targets = HashSet::new();
    let mut tails = 0;

    for member in &members {
        match member.next_id() {
            None => tails += 1,
            Some(next) if next == member.id() => {
                return Err(ChainError::SelfLink(format!("{:?}", member.id())));
            }
            Some(next) if !ids.contains(&next) => {
                return Err(ChainError::DanglingNext(format!("{:?}", member.id())));
            }
            Some(next) => {
                if !targets.insert(next) {
                    return Err(ChainError::Branch(format!("{:?}", next)));
                }
            }
        }
    }

    match tails {
        0 => return Err(ChainError::NoTail),
        1 => {}
        n => return Err(ChainError::MultipleTails(n)),
    }

    let reachable = materialize_order(collection, scope).len();
    if reachable < members.len() {
        return Err(ChainError::Unreachable(members.len() - reachable));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;
    use proptest::prelude::*;

    fn make_column(id: u32, board_id: u32, next_id: Option<u32>) -> Column {
        Column {
            id,
            board_id,
            name: format!("Column {}", id),
            next_id,
        }
    }

    /// Board 1 holds A(1) -> B(2) -> C(3)
    fn abc() -> Collection<Column> {
        Collection::from_entities(vec![
            make_column(1, 1, Some(2)),
            make_column(2, 1, Some(3)),
            make_column(3, 1, None),
        ])
    }

    fn order(collection: &Collection<Column>, board_id: u32) -> Vec<u32> {
        materialize_order(collection, board_id)
            .iter()
            .map(|column| column.id)
            .collect()
    }

    fn apply(collection: &Collection<Column>, plan: MovePlan<Column>) -> Collection<Column> {
        match plan {
            MovePlan::Relink(edits) => collection.set_many(edits),
            _ => collection.clone(),
        }
    }

    #[test]
    fn test_materialize_order() {
        let collection = abc().set_many(vec![make_column(10, 2, None), make_column(11, 2, Some(10))]);

        assert_eq!(order(&collection, 1), vec![1, 2, 3]);
        assert_eq!(order(&collection, 2), vec![11, 10]);
        assert!(order(&collection, 3).is_empty());
    }

    #[test]
    fn test_materialize_without_tail_is_empty() {
        let collection = Collection::from_entities(vec![
            make_column(1, 1, Some(2)),
            make_column(2, 1, Some(1)),
        ]);
        assert!(order(&collection, 1).is_empty());
    }

    #[test]
    fn test_move_before_predecessor() {
        let collection = abc();
        let moved = apply(&collection, plan_move(&collection, 3, Some(2)));
        assert_eq!(order(&moved, 1), vec![1, 3, 2]);
        assert_eq!(moved.get(2).unwrap().next_id, None);
    }

    #[test]
    fn test_move_head_to_tail() {
        let collection = abc();
        let plan = plan_move(&collection, 1, None);

        let MovePlan::Relink(edits) = &plan else {
            panic!("expected relink, got {:?}", plan);
        };
        // A has no predecessor: only the old tail and A itself change
        assert_eq!(edits.len(), 2);

        let moved = apply(&collection, plan);
        assert_eq!(order(&moved, 1), vec![2, 3, 1]);
    }

    #[test]
    fn test_move_to_head() {
        let collection = abc();
        let moved = apply(&collection, plan_move(&collection, 3, Some(1)));
        assert_eq!(order(&moved, 1), vec![3, 1, 2]);
    }

    #[test]
    fn test_move_touches_at_most_three() {
        let collection = Collection::from_entities(vec![
            make_column(1, 1, Some(2)),
            make_column(2, 1, Some(3)),
            make_column(3, 1, Some(4)),
            make_column(4, 1, Some(5)),
            make_column(5, 1, None),
        ]);
        let MovePlan::Relink(edits) = plan_move(&collection, 2, Some(5)) else {
            panic!("expected relink");
        };
        assert_eq!(
            edits.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 4, 2]
        );
        assert_eq!(order(&collection.set_many(edits), 1), vec![1, 3, 4, 2, 5]);
    }

    #[test]
    fn test_noop_moves() {
        let collection = abc();
        assert_eq!(plan_move(&collection, 2, Some(2)), MovePlan::Unchanged);
        assert_eq!(plan_move(&collection, 2, Some(3)), MovePlan::Unchanged);
        assert_eq!(plan_move(&collection, 3, None), MovePlan::Unchanged);
    }

    #[test]
    fn test_invalid_moves() {
        let collection = abc().set(make_column(10, 2, None));
        assert!(matches!(plan_move(&collection, 9, None), MovePlan::Invalid(_)));
        assert!(matches!(plan_move(&collection, 1, Some(10)), MovePlan::Invalid(_)));
        assert!(matches!(plan_move(&collection, 1, Some(42)), MovePlan::Invalid(_)));

        let broken = Collection::from_entities(vec![
            make_column(1, 1, Some(2)),
            make_column(2, 1, Some(1)),
        ]);
        assert!(matches!(plan_move(&broken, 1, None), MovePlan::Invalid(_)));
    }

    #[test]
    fn test_plan_insert_appends_after_tail() {
        let collection = abc();
        let created = make_column(4, 1, None);
        let edits = plan_insert(&collection, &created);
        assert_eq!(edits, vec![make_column(3, 1, Some(4))]);

        let inserted = collection.set_many(edits).set(created);
        assert_eq!(order(&inserted, 1), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_plan_insert_in_the_middle() {
        let collection = abc();
        let created = make_column(4, 1, Some(2));
        let inserted = collection.set_many(plan_insert(&collection, &created)).set(created);
        assert_eq!(order(&inserted, 1), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_plan_remove_closes_gap() {
        let collection = abc();
        let edits = plan_remove(&collection, 2);
        assert_eq!(edits, vec![make_column(1, 1, Some(3))]);

        let removed = collection.set_many(edits).remove(2);
        assert_eq!(order(&removed, 1), vec![1, 3]);
        assert!(plan_remove(&collection, 42).is_empty());
        assert!(plan_remove(&collection, 1).is_empty());
    }

    #[test]
    fn test_verify_chain_reports_violations() {
        assert_eq!(verify_chain(&abc(), 1), Ok(()));
        assert_eq!(verify_chain(&Collection::<Column>::new(), 1), Ok(()));

        let self_link = abc().set(make_column(2, 1, Some(2)));
        assert!(matches!(verify_chain(&self_link, 1), Err(ChainError::SelfLink(_))));

        let branch = abc().set(make_column(3, 1, Some(2)));
        assert!(matches!(verify_chain(&branch, 1), Err(ChainError::Branch(_))));

        let two_tails = abc().set(make_column(4, 1, None));
        assert_eq!(verify_chain(&two_tails, 1), Err(ChainError::MultipleTails(2)));

        let dangling = abc().set(make_column(3, 1, Some(99)));
        assert!(matches!(verify_chain(&dangling, 1), Err(ChainError::DanglingNext(_))));

        let detached_cycle = abc().set_many(vec![
            make_column(4, 1, Some(5)),
            make_column(5, 1, Some(4)),
        ]);
        assert_eq!(verify_chain(&detached_cycle, 1), Err(ChainError::Unreachable(2)));
    }

    proptest! {
        #[test]
        fn prop_moves_keep_chain_intact(
            size in 1u32..8,
            moves in prop::collection::vec((any::<u32>(), any::<u32>()), 0..24),
        ) {
            let mut collection = Collection::from_entities((1..=size).map(|id| {
                make_column(id, 1, if id == size { None } else { Some(id + 1) })
            }));
            let mut model: Vec<u32> = (1..=size).collect();

            for (raw_id, raw_target) in moves {
                let id = raw_id % size + 1;
                let target = match raw_target % (size + 1) {
                    0 => None,
                    n => Some(n),
                };

                collection = apply(&collection, plan_move(&collection, id, target));

                if target != Some(id) {
                    model.retain(|&m| m != id);
                    match target.and_then(|t| model.iter().position(|&m| m == t)) {
                        Some(index) => model.insert(index, id),
                        None => model.push(id),
                    }
                }

                prop_assert_eq!(verify_chain(&collection, 1), Ok(()));
                prop_assert_eq!(order(&collection, 1), model.clone());
            }
        }
    }
}
