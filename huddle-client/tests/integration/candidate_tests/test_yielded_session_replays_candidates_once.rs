use huddle_client::{CoordinatorConfig, EarlyCandidatePolicy, NegotiationState};
use huddle_core::{MemoryDatabase, SessionDescription, SignalEnvelope};
use std::time::Duration;

use crate::integration::{GhostPeer, ROOM, init_tracing};
use crate::utils::{WAIT_TIMEOUT_MS, candidate, spawn_peer};

#[tokio::test]
async fn test_yielded_session_replays_candidates_once() {
    init_tracing();

    let db = MemoryDatabase::new();
    // "p_0" sorts below every generated id, so the local peer yields.
    let ghost = GhostPeer::new(&db, "p_0");
    ghost.enter().await;

    let config = CoordinatorConfig::default().with_early_candidates(EarlyCandidatePolicy::Buffer);
    let peer = spawn_peer(&db, config);
    let id = peer.join(ROOM).await;

    peer.wait_for_snapshot(WAIT_TIMEOUT_MS, |s| {
        s.session(&ghost.id)
            .is_some_and(|x| x.state == NegotiationState::OfferSent)
    })
    .await
    .expect("Peer should offer to the member already present");

    // No answer yet, so the offering session queues it.
    ghost.send_candidate(&id, &candidate(1)).await;
    peer.wait_for_snapshot(WAIT_TIMEOUT_MS, |s| s.pending_candidates == 1)
        .await
        .expect("Candidate should be queued");

    ghost
        .signal(&id, SignalEnvelope::Offer(SessionDescription::offer("ghost-offer")))
        .await;
    let snapshot = peer
        .wait_for_snapshot(WAIT_TIMEOUT_MS, |s| {
            s.session(&ghost.id)
                .is_some_and(|x| x.state == NegotiationState::Connected)
        })
        .await
        .expect("Peer should answer the colliding offer");
    assert_eq!(snapshot.pending_candidates, 0);

    let transport = peer.transports.latest_for(&ghost.id).await.unwrap();
    let mut received = Vec::new();
    for _ in 0..(WAIT_TIMEOUT_MS / 10) {
        received = transport.candidates().await;
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(received, vec![candidate(1)]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.candidate_attempts(), 1, "Applied exactly once");
}
