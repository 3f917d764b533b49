//! Concurrency tests for the registry.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use roomcast_protocol::{PlayerId, RoomId};
use roomcast_room::RoomConfig;
use roomcast_session::{player_handlers, Player, PlayerConfig, Registry};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_room_ids_are_exactly_one_to_n() {
    const N: u64 = 64;
    let registry = Registry::new(RoomConfig::default());

    let tasks: Vec<_> = (0..N)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.create_room(format!("room-{i}")).id() })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for task in tasks {
        assert!(ids.insert(task.await.unwrap()), "duplicate room id");
    }

    let expected: BTreeSet<RoomId> = (1..=N).map(RoomId).collect();
    assert_eq!(ids, expected);
    assert_eq!(registry.room_count(), N as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_create_room_creates_once() {
    const M: usize = 32;
    let registry = Registry::new(RoomConfig::default());

    let tasks: Vec<_> = (0..M)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry.get_or_create_room(RoomId(9), format!("contender-{i}"))
            })
        })
        .collect();

    let mut created = 0;
    let mut names = BTreeSet::new();
    for task in tasks {
        let (room, was_created) = task.await.unwrap();
        assert_eq!(room.id(), RoomId(9));
        names.insert(room.name().to_string());
        if was_created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(names.len(), 1, "every caller sees the canonical room");
    assert_eq!(registry.room_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_create_player_constructs_once() {
    const M: usize = 32;
    let registry = Registry::new(RoomConfig::default());
    let constructed = Arc::new(AtomicUsize::new(0));
    let handlers = Arc::new(player_handlers());

    let tasks: Vec<_> = (0..M)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let constructed = Arc::clone(&constructed);
            let handlers = Arc::clone(&handlers);
            tokio::spawn(async move {
                // Keep the client end alive so the spawned player stays up.
                let (client, server) = tokio::io::duplex(1024);
                let (reader, writer) = tokio::io::split(server);
                let (_, created) =
                    registry.get_or_create_player(PlayerId::from("same"), || {
                        constructed.fetch_add(1, Ordering::SeqCst);
                        let (handle, player) = Player::new(
                            PlayerId::from("same"),
                            reader,
                            writer,
                            Arc::clone(&registry),
                            handlers,
                            PlayerConfig::default(),
                        );
                        (handle, player.run())
                    });
                (created, client)
            })
        })
        .collect();

    let mut created = 0;
    let mut clients = Vec::new();
    for task in tasks {
        let (was_created, client) = task.await.unwrap();
        if was_created {
            created += 1;
        }
        clients.push(client);
    }

    assert_eq!(created, 1);
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert_eq!(registry.player_count(), 1);
}

#[tokio::test]
async fn test_remove_player_cancels_its_tasks() {
    let registry = Registry::new(RoomConfig::default());
    let (_client, server) = tokio::io::duplex(1024);
    let (reader, writer) = tokio::io::split(server);

    let (handle, _) = registry.get_or_create_player(PlayerId::from("p"), || {
        let (handle, player) = Player::new(
            PlayerId::from("p"),
            reader,
            writer,
            Arc::clone(&registry),
            Arc::new(player_handlers()),
            PlayerConfig::default(),
        );
        (handle, player.run())
    });

    let removed = registry.remove_player(&PlayerId::from("p"));
    assert!(removed.is_some());
    assert!(handle.is_cancelled());
    assert!(registry.player(&PlayerId::from("p")).is_none());
}
