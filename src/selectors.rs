//! Selectors
//!
//! Pure queries over store snapshots. Safe to call on every render; results
//! depend only on the arguments.

use std::sync::Arc;

use crate::chain;
use crate::collection::Collection;
use crate::entity::{Entity, Linked, Resource};
use crate::models::{Board, BoardId};

pub fn by_id<T: Entity>(collection: &Collection<T>, id: T::Id) -> Option<Arc<T>> {
    collection.get_arc(id)
}

/// Entities of one board, ordered by id
pub fn by_scope<T: Resource>(collection: &Collection<T>, board_id: BoardId) -> Vec<Arc<T>> {
    collection
        .sorted()
        .into_iter()
        .filter(|entity| entity.board_id() == board_id)
        .collect()
}

/// Entities of one scope in chain order
pub fn ordered_by_scope<T: Linked>(collection: &Collection<T>, scope: T::Scope) -> Vec<Arc<T>> {
    chain::materialize_order(collection, scope)
}

pub fn current_board(boards: &Collection<Board>, current: Option<BoardId>) -> Option<Arc<Board>> {
    current.and_then(|id| boards.get_arc(id))
}

/// `current` comes from the board store's selection
pub fn in_current_board<T: Resource>(
    collection: &Collection<T>,
    current: Option<BoardId>,
) -> Vec<Arc<T>> {
    current
        .map(|board_id| by_scope(collection, board_id))
        .unwrap_or_default()
}

pub fn ordered_in_current_board<T: Linked<Scope = BoardId>>(
    collection: &Collection<T>,
    current: Option<BoardId>,
) -> Vec<Arc<T>> {
    current
        .map(|board_id| ordered_by_scope(collection, board_id))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, Tag};

    fn columns() -> Collection<Column> {
        Collection::from_entities(vec![
            Column { id: 4, board_id: 1, name: "Done".to_string(), next_id: None },
            Column { id: 2, board_id: 1, name: "Todo".to_string(), next_id: Some(4) },
            Column { id: 3, board_id: 2, name: "Ideas".to_string(), next_id: None },
        ])
    }

    fn ids<T: Entity<Id = u32>>(entities: &[Arc<T>]) -> Vec<u32> {
        entities.iter().map(|entity| entity.id()).collect()
    }

    #[test]
    fn test_scope_filters() {
        let columns = columns();
        assert_eq!(ids(&by_scope(&columns, 1)), vec![2, 4]);
        assert_eq!(ids(&ordered_by_scope(&columns, 1)), vec![2, 4]);
        assert_eq!(ids(&by_scope(&columns, 2)), vec![3]);
        assert!(by_id(&columns, 9).is_none());
    }

    #[test]
    fn test_current_board_views() {
        let boards = Collection::from_entities(vec![Board {
            id: 1,
            name: "Sprint".to_string(),
            user_ids: vec![7],
        }]);
        let columns = columns();

        assert_eq!(current_board(&boards, Some(1)).unwrap().name, "Sprint");
        assert!(current_board(&boards, Some(2)).is_none());
        assert!(current_board(&boards, None).is_none());

        assert_eq!(ids(&ordered_in_current_board(&columns, Some(1))), vec![2, 4]);
        assert!(ordered_in_current_board(&columns, None).is_empty());

        let tags = Collection::from_entities(vec![Tag {
            id: 5,
            board_id: 2,
            name: "Bug".to_string(),
            color: None,
        }]);
        assert_eq!(ids(&in_current_board(&tags, Some(2))), vec![5]);
        assert!(in_current_board(&tags, Some(1)).is_empty());
    }

    #[test]
    fn test_selectors_are_repeatable() {
        let columns = columns();
        let first = ordered_by_scope(&columns, 1);
        let second = ordered_by_scope(&columns, 1);
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
    }
}
