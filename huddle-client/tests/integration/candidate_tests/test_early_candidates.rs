use huddle_client::{CoordinatorConfig, EarlyCandidatePolicy, NegotiationState};
use huddle_core::{MemoryDatabase, SessionDescription, SignalEnvelope};

use crate::integration::{GhostPeer, ROOM, init_tracing};
use crate::utils::{WAIT_TIMEOUT_MS, candidate, spawn_peer};

#[tokio::test]
async fn test_early_candidate_is_dropped_by_default() {
    init_tracing();

    let db = MemoryDatabase::new();
    let peer = spawn_peer(&db, CoordinatorConfig::default());
    let id = peer.join(ROOM).await;

    let ghost = GhostPeer::new(&db, "p_late");
    ghost.send_candidate(&id, &candidate(1)).await;

    peer.wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.candidate_listeners == 1)
        .await
        .expect("Peer should watch the new sender");

    ghost
        .signal(&id, SignalEnvelope::Offer(SessionDescription::offer("late-offer")))
        .await;
    let snapshot = peer
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| {
            s.session(&ghost.id)
                .is_some_and(|x| x.state == NegotiationState::Connected)
        })
        .await
        .expect("Offer should still be answered");

    assert_eq!(snapshot.pending_candidates, 0);
    let transport = peer.transports.latest_for(&ghost.id).await.unwrap();
    assert!(transport.candidates().await.is_empty(), "Early candidate is lost");

    // Later candidates flow normally.
    ghost.send_candidate(&id, &candidate(2)).await;
    let mut received = Vec::new();
    for _ in 0..(WAIT_TIMEOUT_MS / 10) {
        received = transport.candidates().await;
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(received, vec![candidate(2)]);
}

#[tokio::test]
async fn test_early_candidate_is_buffered_when_enabled() {
    init_tracing();

    let db = MemoryDatabase::new();
    let config = CoordinatorConfig::default().with_early_candidates(EarlyCandidatePolicy::Buffer);
    let peer = spawn_peer(&db, config);
    let id = peer.join(ROOM).await;

    let ghost = GhostPeer::new(&db, "p_late");
    ghost.send_candidate(&id, &candidate(1)).await;

    peer.wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.pending_candidates == 1)
        .await
        .expect("Early candidate should be queued");

    ghost
        .signal(&id, SignalEnvelope::Offer(SessionDescription::offer("late-offer")))
        .await;
    let snapshot = peer
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| {
            s.session(&ghost.id)
                .is_some_and(|x| x.state == NegotiationState::Connected)
        })
        .await
        .expect("Offer should be answered");

    assert_eq!(snapshot.pending_candidates, 0);
    let transport = peer.transports.latest_for(&ghost.id).await.unwrap();
    assert_eq!(transport.candidates().await, vec![candidate(1)], "Replayed after offer");
}

#[tokio::test]
async fn test_buffered_candidates_are_discarded_when_sender_leaves() {
    init_tracing();

    let db = MemoryDatabase::new();
    let config = CoordinatorConfig::default().with_early_candidates(EarlyCandidatePolicy::Buffer);
    let peer = spawn_peer(&db, config);
    let id = peer.join(ROOM).await;

    let ghost = GhostPeer::new(&db, "p_flaky");
    ghost.enter().await;
    ghost.send_candidate(&id, &candidate(1)).await;

    peer.wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.pending_candidates == 1)
        .await
        .expect("Early candidate should be queued");

    ghost.store.disconnect();

    let snapshot = peer
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.pending_candidates == 0)
        .await
        .expect("Queue should be dropped with the peer");
    assert_eq!(snapshot.candidate_listeners, 0);
    assert!(snapshot.sessions.is_empty());
}
