// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Named value cells that announce changes on a broadcast channel

use serde::Serialize;
use tokio::sync::broadcast;

/// Notification sent when an observable value actually changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyChanged {
    pub property: &'static str,
}

/// Capacity of the change notification channel
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Creates the sender shared by a group of observable cells
#[must_use]
pub fn change_channel() -> broadcast::Sender<PropertyChanged> {
    broadcast::channel(CHANGE_CHANNEL_CAPACITY).0
}

/// A value that notifies subscribers when it is set to something different
#[derive(Debug)]
pub struct Observable<T> {
    name: &'static str,
    value: T,
    changes: broadcast::Sender<PropertyChanged>,
}

impl<T: PartialEq> Observable<T> {
    pub fn new(name: &'static str, value: T, changes: broadcast::Sender<PropertyChanged>) -> Self {
        Self {
            name,
            value,
            changes,
        }
    }

    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stores `value`, returning whether it differed from the current one
    ///
    /// Exactly one notification is sent per effective change; none for an equal value.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        // no subscribers is fine
        let _ = self.changes.send(PropertyChanged {
            property: self.name,
        });
        tracing::trace!("Property changed: {}", self.name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_equal_value_does_not_notify() {
        let tx = change_channel();
        let mut rx = tx.subscribe();
        let mut cell = Observable::new("status_message", String::from("Ready"), tx);

        assert!(!cell.set("Ready".to_string()));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_changed_value_notifies_once_with_name() {
        let tx = change_channel();
        let mut rx = tx.subscribe();
        let mut cell = Observable::new("is_connecting", false, tx);

        assert!(cell.set(true));
        assert_eq!(
            rx.try_recv(),
            Ok(PropertyChanged {
                property: "is_connecting"
            })
        );
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert!(*cell.get());
    }

    #[test]
    fn test_set_without_subscribers() {
        let mut cell = Observable::new("selected_router", None::<u32>, change_channel());
        assert!(cell.set(Some(3)));
        assert_eq!(cell.get(), &Some(3));
        assert_eq!(cell.name(), "selected_router");
    }
}
