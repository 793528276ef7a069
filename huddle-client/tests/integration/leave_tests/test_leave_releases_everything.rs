use huddle_client::{CoordinatorConfig, NegotiationState};
use huddle_core::MemoryDatabase;

use crate::integration::{ROOM, init_tracing, room_paths};
use crate::utils::{WAIT_TIMEOUT_MS, candidate, spawn_peer};

#[tokio::test]
async fn test_leave_releases_everything() {
    init_tracing();

    let db = MemoryDatabase::new();
    let peer_a = spawn_peer(&db, CoordinatorConfig::default());
    let peer_b = spawn_peer(&db, CoordinatorConfig::default());

    let a = peer_a.join(ROOM).await;
    let b = peer_b.join(ROOM).await;

    peer_a
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| {
            s.session(&b)
                .is_some_and(|x| x.state == NegotiationState::Connected)
        })
        .await
        .expect("A should connect to B");

    // Give B a candidate mailbox so leave has something to clear.
    let a_to_b = peer_a.transports.latest_for(&b).await.unwrap();
    a_to_b.emit_local_candidate(candidate(3)).await;
    peer_b
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.candidate_listeners == 1)
        .await
        .expect("B should watch A's candidates");

    peer_b.handle.leave_room().await.expect("leave");

    let snapshot = peer_b.snapshot().await;
    assert!(!snapshot.is_joined());
    assert!(snapshot.sessions.is_empty());
    assert!(peer_b.media.all_stopped().await, "Tracks stopped");
    for transport in peer_b.transports.all().await {
        assert!(transport.is_closed());
    }
    assert!(peer_b.observer.has_left(&a).await);

    let paths = room_paths();
    assert!(db.snapshot(&paths.presence(&b)).is_none());
    assert!(db.snapshot(&paths.signal_inbox(&b)).is_none());
    assert!(db.snapshot(&paths.candidate_inbox(&b)).is_none());
    assert_eq!(db.listeners_at(&paths.signal_inbox(&b)), 0);
    assert_eq!(db.listeners_at(&paths.candidate_inbox(&b)), 0);
    assert_eq!(db.listeners_at(&paths.candidates(&b, &a)), 0);

    // A tears down its side once B's presence disappears.
    let a_view = peer_a
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.sessions.is_empty())
        .await
        .expect("A should drop the session with B");
    assert!(a_view.known_peers.is_empty());
    assert_eq!(a_view.candidate_listeners, 0);
    assert!(a_to_b.is_closed());
    assert!(peer_a.observer.has_left(&b).await);

    peer_a.handle.leave_room().await.expect("leave");
    assert_eq!(db.listener_count(), 0, "No residual subscriptions");
    assert!(db.snapshot(paths.room()).is_none(), "Room is empty");
}
