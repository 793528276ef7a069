use huddle_client::CoordinatorConfig;
use huddle_core::{MemoryDatabase, PresenceRecord};

use crate::integration::{ROOM, init_tracing, room_paths};
use crate::utils::spawn_peer;

#[tokio::test]
async fn test_single_peer_joins_room() {
    init_tracing();

    let db = MemoryDatabase::new();
    let peer = spawn_peer(&db, CoordinatorConfig::default());

    let id = peer.join(ROOM).await;
    assert!(id.as_str().starts_with("p_"));

    let snapshot = peer.snapshot().await;
    assert!(snapshot.is_joined());
    assert_eq!(snapshot.local_id.as_ref(), Some(&id));
    assert!(snapshot.sessions.is_empty(), "Nobody to negotiate with");
    assert!(snapshot.known_peers.is_empty());
    assert!(snapshot.media_live);

    let stored = db
        .snapshot(&room_paths().presence(&id))
        .expect("Presence record should exist");
    let record: PresenceRecord = serde_json::from_value(stored).expect("presence shape");
    assert!(
        record.joined_at().is_some(),
        "Server timestamp should be resolved"
    );

    assert_eq!(db.listeners_at(&room_paths().peers()), 1);
    assert_eq!(db.listeners_at(&room_paths().signal_inbox(&id)), 1);
    assert_eq!(db.listeners_at(&room_paths().candidate_inbox(&id)), 1);
}
