use crate::coordinator::CoordinatorSnapshot;
use crate::error::CoordinatorError;
use huddle_core::{PeerId, RoomId};
use tokio::sync::oneshot;

/// Requests sent to the coordinator task by a [`CoordinatorHandle`](crate::CoordinatorHandle).
#[derive(Debug)]
pub enum CoordinatorCommand {
    Join {
        room: RoomId,
        reply: oneshot::Sender<Result<PeerId, CoordinatorError>>,
    },

    /// No-op when not joined.
    Leave { reply: oneshot::Sender<()> },

    Snapshot {
        reply: oneshot::Sender<CoordinatorSnapshot>,
    },
}
