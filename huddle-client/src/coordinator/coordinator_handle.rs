use crate::config::CoordinatorConfig;
use crate::coordinator::{
    Collaborators, CoordinatorCommand, CoordinatorSnapshot, SignalingCoordinator,
};
use crate::error::CoordinatorError;
use huddle_core::{PeerId, RoomId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Cloneable front end of a running [`SignalingCoordinator`]. The task stops,
/// leaving any joined room, once every handle is dropped.
#[derive(Clone)]
pub struct CoordinatorHandle {
    command_tx: mpsc::Sender<CoordinatorCommand>,
}

impl CoordinatorHandle {
    pub fn spawn(
        collaborators: Collaborators,
        config: CoordinatorConfig,
    ) -> (Self, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let coordinator = SignalingCoordinator::new(collaborators, config, command_rx);
        let task = tokio::spawn(coordinator.run());
        (Self { command_tx }, task)
    }

    /// Joins `room` under a freshly generated peer id and returns it.
    pub async fn join_room(&self, room: RoomId) -> Result<PeerId, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorCommand::Join { room, reply }).await?;
        rx.await.map_err(|_| CoordinatorError::Stopped)?
    }

    pub async fn leave_room(&self) -> Result<(), CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorCommand::Leave { reply }).await?;
        rx.await.map_err(|_| CoordinatorError::Stopped)
    }

    pub async fn snapshot(&self) -> Result<CoordinatorSnapshot, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| CoordinatorError::Stopped)
    }

    async fn send(&self, cmd: CoordinatorCommand) -> Result<(), CoordinatorError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| CoordinatorError::Stopped)
    }
}
