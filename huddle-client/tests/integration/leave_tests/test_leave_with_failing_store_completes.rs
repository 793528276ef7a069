use huddle_client::{CoordinatorConfig, NegotiationState};
use huddle_core::MemoryDatabase;

use crate::integration::{ROOM, init_tracing};
use crate::utils::{WAIT_TIMEOUT_MS, spawn_peer};

#[tokio::test]
async fn test_leave_with_failing_store_completes() {
    init_tracing();

    let db = MemoryDatabase::new();
    let peer_a = spawn_peer(&db, CoordinatorConfig::default());
    let peer_b = spawn_peer(&db, CoordinatorConfig::default());

    let a = peer_a.join(ROOM).await;
    let b = peer_b.join(ROOM).await;

    peer_b
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| {
            s.session(&a)
                .is_some_and(|x| x.state == NegotiationState::Connected)
        })
        .await
        .expect("B should connect to A");

    // Every store call from B fails from here on.
    peer_b.store.disconnect();

    peer_b
        .handle
        .leave_room()
        .await
        .expect("leave completes despite store errors");

    let snapshot = peer_b.snapshot().await;
    assert!(!snapshot.is_joined());
    assert!(snapshot.sessions.is_empty());
    assert!(peer_b.media.all_stopped().await, "Tracks stopped");
    for transport in peer_b.transports.all().await {
        assert!(transport.is_closed());
    }
    assert!(peer_b.observer.has_left(&a).await);

    // The deferred removal still tells A that B is gone.
    peer_a
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.session(&b).is_none())
        .await
        .expect("A should tear down the session with B");
}
