use huddle_client::CoordinatorConfig;
use huddle_core::MemoryDatabase;

use crate::integration::{ROOM, init_tracing, room_paths};
use crate::utils::{WAIT_TIMEOUT_MS, spawn_peer};

#[tokio::test]
async fn test_aborted_coordinator_removes_presence() {
    init_tracing();

    let db = MemoryDatabase::new();
    let peer_a = spawn_peer(&db, CoordinatorConfig::default());
    let peer_b = spawn_peer(&db, CoordinatorConfig::default());

    let a = peer_a.join(ROOM).await;
    let b = peer_b.join(ROOM).await;

    peer_a
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.session(&b).is_some())
        .await
        .expect("A should see B");

    // Abnormal termination: the task is dropped mid-flight, no leave runs.
    peer_b.task.abort();
    let _ = peer_b.task.await;

    assert!(db.snapshot(&room_paths().presence(&b)).is_none());
    assert!(peer_b.media.all_stopped().await);

    peer_a
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.session(&b).is_none())
        .await
        .expect("A should tear down the session with B");
    assert!(peer_a.observer.has_left(&b).await);
    assert!(db.snapshot(&room_paths().presence(&a)).is_some());
}
