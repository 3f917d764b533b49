//! The process-wide player and room registry.
//!
//! Two independent concurrent maps, one per actor kind. Get-or-create goes
//! through `DashMap`'s entry API: the shard lock held by the entry decides
//! which caller constructs the actor, and only that caller spawns it.
//!
//! The registry is an owned value, shared as `Arc<Registry>` by the server
//! and every player. There is no global instance.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use roomcast_protocol::{Envelope, PlayerId, RoomId};
use roomcast_room::{
    room_handlers, EventTable, Mailbox, PlayerDirectory, RoomActor,
    RoomConfig, RoomHandle,
};

use crate::PlayerHandle;

/// Identifier → handle lookup for every live player and room.
pub struct Registry {
    players: DashMap<PlayerId, PlayerHandle>,
    rooms: DashMap<RoomId, RoomHandle>,
    /// Next room id to hand out. Starts at 1.
    next_room_id: AtomicU64,
    room_config: RoomConfig,
    events: Arc<EventTable>,
}

impl Registry {
    /// Creates a registry whose rooms use the standard event table.
    pub fn new(room_config: RoomConfig) -> Arc<Self> {
        Self::with_events(room_config, room_handlers())
    }

    /// Creates a registry whose rooms dispatch through `events`.
    pub fn with_events(room_config: RoomConfig, events: EventTable) -> Arc<Self> {
        Arc::new(Self {
            players: DashMap::new(),
            rooms: DashMap::new(),
            next_room_id: AtomicU64::new(1),
            room_config,
            events: Arc::new(events),
        })
    }

    pub fn room_config(&self) -> &RoomConfig {
        &self.room_config
    }

    /// Allocates the next room identifier. Strictly increasing, never reused.
    pub fn next_room_id(&self) -> RoomId {
        RoomId(self.next_room_id.fetch_add(1, Ordering::Relaxed))
    }

    // -- Rooms -------------------------------------------------------------

    /// Returns the room registered under `id`, creating and spawning it if
    /// there is none. The flag is `true` for the one caller that created it.
    pub fn get_or_create_room(
        self: &Arc<Self>,
        id: RoomId,
        name: impl Into<Arc<str>>,
    ) -> (RoomHandle, bool) {
        let (handle, actor) = match self.rooms.entry(id) {
            Entry::Occupied(entry) => return (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let directory: Arc<dyn PlayerDirectory> =
                    Arc::new(RegistryDirectory(Arc::downgrade(self)));
                let (handle, actor) = RoomActor::new(
                    id,
                    name,
                    &self.room_config,
                    directory,
                    Arc::clone(&self.events),
                );
                entry.insert(handle.clone());
                (handle, actor)
            }
        };

        tokio::spawn(actor.run());
        tracing::info!(room_id = %id, name = handle.name(), "room created");
        (handle, true)
    }

    /// Creates a room under a freshly allocated id.
    pub fn create_room(self: &Arc<Self>, name: impl Into<Arc<str>>) -> RoomHandle {
        let id = self.next_room_id();
        self.get_or_create_room(id, name).0
    }

    pub fn room(&self, id: RoomId) -> Option<RoomHandle> {
        self.rooms.get(&id).map(|entry| entry.value().clone())
    }

    /// Every registered room, ascending by id.
    pub fn rooms(&self) -> Vec<RoomHandle> {
        let mut rooms: Vec<RoomHandle> =
            self.rooms.iter().map(|entry| entry.value().clone()).collect();
        rooms.sort_by_key(RoomHandle::id);
        rooms
    }

    /// Cancels the room's event loop and forgets it. Unknown ids are a no-op.
    pub fn remove_room(&self, id: RoomId) -> Option<RoomHandle> {
        if let Some(entry) = self.rooms.get(&id) {
            entry.value().cancel();
        }
        let (_, handle) = self.rooms.remove(&id)?;
        tracing::info!(room_id = %id, "room removed");
        Some(handle)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    // -- Players -----------------------------------------------------------

    /// Returns the player registered under `id`, or registers the handle
    /// produced by `make` and spawns its task.
    ///
    /// `make` runs at most once, and only when `id` is vacant.
    pub fn get_or_create_player<F, Fut>(
        &self,
        id: PlayerId,
        make: F,
    ) -> (PlayerHandle, bool)
    where
        F: FnOnce() -> (PlayerHandle, Fut),
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (handle, task) = match self.players.entry(id) {
            Entry::Occupied(entry) => return (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let (handle, task) = make();
                entry.insert(handle.clone());
                (handle, task)
            }
        };

        tokio::spawn(task);
        (handle, true)
    }

    pub fn player(&self, id: &PlayerId) -> Option<PlayerHandle> {
        self.players.get(id).map(|entry| entry.value().clone())
    }

    /// Cancels the player's tasks and forgets it. Unknown ids are a no-op.
    pub fn remove_player(&self, id: &PlayerId) -> Option<PlayerHandle> {
        if let Some(entry) = self.players.get(id) {
            entry.value().cancel();
        }
        self.players.remove(id).map(|(_, handle)| handle)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

impl PlayerDirectory for Registry {
    fn outbox(&self, player: &PlayerId) -> Option<Mailbox<Envelope>> {
        self.players
            .get(player)
            .map(|entry| entry.value().outbox().clone())
    }
}

/// The directory rooms see. Weak, so a room task never keeps the registry
/// that owns its handle alive.
struct RegistryDirectory(Weak<Registry>);

impl PlayerDirectory for RegistryDirectory {
    fn outbox(&self, player: &PlayerId) -> Option<Mailbox<Envelope>> {
        self.0.upgrade()?.outbox(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_ids_start_at_one_and_increase() {
        let registry = Registry::new(RoomConfig::default());
        assert_eq!(registry.next_room_id(), RoomId(1));
        assert_eq!(registry.next_room_id(), RoomId(2));
        assert_eq!(registry.next_room_id(), RoomId(3));
    }

    #[tokio::test]
    async fn test_get_or_create_room_returns_existing() {
        let registry = Registry::new(RoomConfig::default());
        let (first, created) = registry.get_or_create_room(RoomId(5), "five");
        assert!(created);
        let (second, created) = registry.get_or_create_room(RoomId(5), "other");
        assert!(!created);
        assert_eq!(second.id(), first.id());
        assert_eq!(second.name(), "five");
        assert_eq!(registry.room_count(), 1);
    }

    #[tokio::test]
    async fn test_rooms_listed_by_ascending_id() {
        let registry = Registry::new(RoomConfig::default());
        registry.get_or_create_room(RoomId(3), "c");
        registry.get_or_create_room(RoomId(1), "a");
        registry.get_or_create_room(RoomId(2), "b");

        let names: Vec<String> =
            registry.rooms().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_remove_room_cancels_and_forgets() {
        let registry = Registry::new(RoomConfig::default());
        let room = registry.create_room("gone");
        let removed = registry.remove_room(room.id()).expect("room existed");

        assert!(removed.is_cancelled());
        assert!(room.is_cancelled());
        assert!(registry.room(room.id()).is_none());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let registry = Registry::new(RoomConfig::default());
        assert!(registry.remove_room(RoomId(42)).is_none());
        assert!(registry.remove_player(&PlayerId::from("nobody")).is_none());
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.player_count(), 0);
    }

    #[test]
    fn test_directory_misses_unknown_player() {
        let registry = Registry::new(RoomConfig::default());
        assert!(registry.outbox(&PlayerId::from("ghost")).is_none());
    }
}
