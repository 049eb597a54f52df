//! Error Notifications
//!
//! Remote rejections absorbed by the stores end up here so the UI can show
//! them. Only the most recent `capacity` notifications are kept.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::GatewayError;

/// The store operation whose remote call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Fetch,
    Create,
    Update,
    Delete,
    Move,
    Invite,
    Leave,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Fetch => "fetch",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Move => "move",
            Operation::Invite => "invite",
            Operation::Leave => "leave",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub kind: &'static str,
    pub operation: Operation,
    /// Target entity, when the operation had one
    pub target: Option<String>,
    pub error: GatewayError,
    pub at: DateTime<Utc>,
}

/// Shared, bounded list of recent notifications
#[derive(Clone)]
pub struct ErrorStore {
    notifications: Arc<watch::Sender<VecDeque<Notification>>>,
    capacity: usize,
}

impl ErrorStore {
    pub fn new(capacity: usize) -> Self {
        let (notifications, _) = watch::channel(VecDeque::new());
        Self {
            notifications: Arc::new(notifications),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, notification: Notification) {
        let capacity = self.capacity;
        self.notifications.send_modify(|list| {
            list.push_back(notification);
            while list.len() > capacity {
                list.pop_front();
            }
        });
    }

    pub fn latest(&self) -> Option<Notification> {
        self.notifications.borrow().back().cloned()
    }

    /// Oldest first
    pub fn all(&self) -> Vec<Notification> {
        self.notifications.borrow().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.notifications.send_if_modified(|list| {
            let had_any = !list.is_empty();
            list.clear();
            had_any
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<VecDeque<Notification>> {
        self.notifications.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(operation: Operation) -> Notification {
        Notification {
            kind: "column",
            operation,
            target: Some("3".to_string()),
            error: GatewayError::Rejected("nope".to_string()),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_keeps_only_most_recent() {
        let errors = ErrorStore::new(2);
        errors.push(notification(Operation::Create));
        errors.push(notification(Operation::Update));
        errors.push(notification(Operation::Move));

        let operations: Vec<Operation> = errors.all().iter().map(|n| n.operation).collect();
        assert_eq!(operations, vec![Operation::Update, Operation::Move]);
        assert_eq!(errors.latest().unwrap().operation, Operation::Move);

        errors.clear();
        assert!(errors.latest().is_none());
    }

    #[test]
    fn test_clones_share_the_list() {
        let errors = ErrorStore::new(4);
        let receiver = errors.subscribe();
        errors.clone().push(notification(Operation::Delete));

        assert!(receiver.has_changed().unwrap());
        assert_eq!(errors.all().len(), 1);
    }
}
