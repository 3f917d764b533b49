//! Kind → handler lookup.
//!
//! The player layer keys its table by [`MessageKind`](crate::MessageKind),
//! the room layer by its own event kind. Tables are filled once at startup
//! and only read afterwards.

use std::collections::HashMap;
use std::hash::Hash;

/// A map holding at most one handler per kind.
#[derive(Debug, Clone)]
pub struct HandlerTable<K, H> {
    handlers: HashMap<K, H>,
}

impl<K: Eq + Hash, H> HandlerTable<K, H> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for `kind`, returning the handler it replaced.
    ///
    /// Last write wins.
    pub fn register(&mut self, kind: K, handler: H) -> Option<H> {
        self.handlers.insert(kind, handler)
    }

    /// Looks up the handler for `kind`. Unregistered kinds yield `None`,
    /// which callers treat as "nothing to do".
    pub fn get(&self, kind: &K) -> Option<&H> {
        self.handlers.get(kind)
    }

    pub fn contains(&self, kind: &K) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<K: Eq + Hash, H> Default for HandlerTable<K, H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageKind;

    fn one() -> u8 {
        1
    }

    fn two() -> u8 {
        2
    }

    #[test]
    fn test_register_overwrites_previous_handler() {
        let mut table: HandlerTable<MessageKind, fn() -> u8> = HandlerTable::new();
        assert!(table.register(MessageKind::LoginRequest, one).is_none());
        let replaced = table.register(MessageKind::LoginRequest, two);

        assert_eq!(replaced.map(|h| h()), Some(1));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&MessageKind::LoginRequest).map(|h| h()), Some(2));
    }

    #[test]
    fn test_unregistered_kind_yields_none() {
        let mut table: HandlerTable<MessageKind, fn() -> u8> = HandlerTable::new();
        table.register(MessageKind::MoveRequest, one);
        assert!(table.get(&MessageKind::LeaveRoomRequest).is_none());
        assert!(!table.contains(&MessageKind::LeaveRoomRequest));
    }

    #[test]
    fn test_new_table_is_empty() {
        let table: HandlerTable<u8, ()> = HandlerTable::default();
        assert!(table.is_empty());
    }
}
