use huddle_client::{CoordinatorConfig, CoordinatorError};
use huddle_core::{MemoryDatabase, RoomId};

use crate::integration::{ROOM, init_tracing};
use crate::utils::spawn_peer;

#[tokio::test]
async fn test_already_joined_is_rejected() {
    init_tracing();

    let db = MemoryDatabase::new();
    let peer = spawn_peer(&db, CoordinatorConfig::default());
    let id = peer.join(ROOM).await;

    let second = peer
        .handle
        .join_room(RoomId::parse("another").unwrap())
        .await;
    assert!(matches!(second, Err(CoordinatorError::AlreadyJoined(room)) if room.as_str() == ROOM));

    let snapshot = peer.snapshot().await;
    assert_eq!(snapshot.local_id, Some(id));
    assert_eq!(peer.media.acquired().await, 1, "No second capture");
}
