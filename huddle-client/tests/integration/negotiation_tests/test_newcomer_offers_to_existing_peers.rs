use huddle_client::{CoordinatorConfig, NegotiationState, Role};
use huddle_core::MemoryDatabase;

use crate::integration::{ROOM, init_tracing};
use crate::utils::{TestPeer, WAIT_TIMEOUT_MS, spawn_peer};

async fn wait_connected(peer: &TestPeer, count: usize) {
    peer.wait_for_snapshot(WAIT_TIMEOUT_MS, |s| {
        s.sessions.len() == count
            && s.sessions
                .values()
                .all(|x| x.state == NegotiationState::Connected)
    })
    .await
    .expect("sessions should connect");
}

#[tokio::test]
async fn test_newcomer_offers_to_existing_peers() {
    init_tracing();

    let db = MemoryDatabase::new();
    let peers: Vec<TestPeer> = (0..4)
        .map(|_| spawn_peer(&db, CoordinatorConfig::default()))
        .collect();

    let mut ids = Vec::new();
    for (i, peer) in peers.iter().enumerate() {
        ids.push(peer.join(ROOM).await);
        for earlier in &peers[..=i] {
            wait_connected(earlier, i).await;
        }
    }

    for (i, peer) in peers.iter().enumerate() {
        let snapshot = peer.snapshot().await;
        for (j, other) in ids.iter().enumerate() {
            if i == j {
                continue;
            }

            let transports = peer.transports.transports_for(other).await;
            assert_eq!(transports.len(), 1, "One session per remote");

            let expected = if j < i { Role::Initiator } else { Role::Responder };
            assert_eq!(snapshot.session(other).unwrap().role, expected);
            assert_eq!(
                transports[0].offers_created(),
                usize::from(j < i),
                "peer {} toward peer {}",
                i,
                j
            );
        }
    }
}
