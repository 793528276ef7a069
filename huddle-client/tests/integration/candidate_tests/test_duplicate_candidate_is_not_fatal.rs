use huddle_client::{CoordinatorConfig, NegotiationState};
use huddle_core::MemoryDatabase;

use crate::integration::{GhostPeer, ROOM, init_tracing};
use crate::utils::{WAIT_TIMEOUT_MS, candidate, spawn_peer};
use huddle_core::{SessionDescription, SignalEnvelope};

#[tokio::test]
async fn test_duplicate_candidate_is_not_fatal() {
    init_tracing();

    let db = MemoryDatabase::new();
    let peer = spawn_peer(&db, CoordinatorConfig::default());
    let id = peer.join(ROOM).await;

    let ghost = GhostPeer::new(&db, "p_dup");
    ghost
        .signal(&id, SignalEnvelope::Offer(SessionDescription::offer("dup-offer")))
        .await;
    peer.wait_for_snapshot(WAIT_TIMEOUT_MS, |s| {
        s.session(&ghost.id)
            .is_some_and(|x| x.state == NegotiationState::Connected)
    })
    .await
    .expect("Offer should be answered");

    // The same candidate delivered twice: the transport rejects the repeat.
    ghost.send_candidate(&id, &candidate(7)).await;
    ghost.send_candidate(&id, &candidate(7)).await;
    ghost.send_candidate(&id, &candidate(8)).await;

    let transport = peer.transports.latest_for(&ghost.id).await.unwrap();
    let mut received = Vec::new();
    for _ in 0..(WAIT_TIMEOUT_MS / 10) {
        received = transport.candidates().await;
        if received.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(received, vec![candidate(7), candidate(8)]);

    let snapshot = peer.snapshot().await;
    assert!(snapshot.is_joined());
    assert_eq!(
        snapshot.session(&ghost.id).unwrap().state,
        NegotiationState::Connected
    );
}
