use crate::config::CoordinatorConfig;
use crate::coordinator::{
    Collaborators, CoordinatorCommand, CoordinatorContext, CoordinatorSnapshot, JoinedRoom,
    StoreEvent,
};
use crate::error::CoordinatorError;
use crate::transport::TransportEvent;
use huddle_core::{PeerId, RoomId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owns membership, negotiation and cleanup for at most one room at a time.
///
/// Commands, store notifications and transport callbacks all arrive on
/// channels and are handled one at a time by [`SignalingCoordinator::run`],
/// so the session map needs no locking.
pub struct SignalingCoordinator {
    ctx: CoordinatorContext,
    command_rx: mpsc::Receiver<CoordinatorCommand>,
    store_rx: mpsc::UnboundedReceiver<StoreEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    epoch: u64,
    room: Option<JoinedRoom>,
}

impl SignalingCoordinator {
    pub fn new(
        collaborators: Collaborators,
        config: CoordinatorConfig,
        command_rx: mpsc::Receiver<CoordinatorCommand>,
    ) -> Self {
        let (store_tx, store_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::channel(256);

        Self {
            ctx: CoordinatorContext::new(collaborators, config, store_tx, transport_tx),
            command_rx,
            store_rx,
            transport_rx,
            epoch: 0,
            room: None,
        }
    }

    pub async fn run(mut self) {
        info!("Signaling coordinator started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down coordinator.");
                            break;
                        }
                    }
                }

                evt = self.store_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_store_event(e).await;
                    }
                }

                evt = self.transport_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_transport_event(e).await;
                    }
                }
            }
        }

        self.leave().await;
        info!("Signaling coordinator finished");
    }

    async fn handle_command(&mut self, cmd: CoordinatorCommand) {
        match cmd {
            CoordinatorCommand::Join { room, reply } => {
                let result = self.join(room).await;
                let _ = reply.send(result);
            }

            CoordinatorCommand::Leave { reply } => {
                self.leave().await;
                let _ = reply.send(());
            }

            CoordinatorCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn join(&mut self, room_id: RoomId) -> Result<PeerId, CoordinatorError> {
        if let Some(room) = &self.room {
            return Err(CoordinatorError::AlreadyJoined(room.room_id.clone()));
        }

        let stream = self
            .ctx
            .media
            .acquire()
            .await
            .map_err(CoordinatorError::DeviceUnavailable)?;

        self.epoch += 1;
        let local_id = PeerId::new();
        info!("Joining room {} as {}", room_id, local_id);

        // Owned by self before any store write so Drop can clean up a join
        // that never finishes.
        let room = self
            .room
            .insert(JoinedRoom::new(room_id, local_id.clone(), self.epoch, stream));
        let entered = room.enter(&self.ctx).await;
        if let Err(e) = entered {
            warn!("Join failed, rolling back: {}", e);
            self.leave().await;
            return Err(e.into());
        }

        Ok(local_id)
    }

    async fn leave(&mut self) {
        let Some(room) = self.room.take() else {
            debug!("Leave requested while not in a room");
            return;
        };
        room.leave(&self.ctx).await;
    }

    async fn handle_store_event(&mut self, event: StoreEvent) {
        let Some(room) = self.room.as_mut().filter(|r| r.epoch == event.epoch()) else {
            debug!("Ignoring store event from a previous join");
            return;
        };

        match event {
            StoreEvent::Signal { snapshot, .. } => room.handle_signal(&self.ctx, snapshot).await,
            StoreEvent::CandidateSender { from, .. } => room.watch_candidates(&self.ctx, from),
            StoreEvent::Candidate { from, snapshot, .. } => {
                room.handle_candidate(&self.ctx, from, snapshot).await
            }
            StoreEvent::PeerRemoved { peer, .. } => room.handle_peer_removed(&self.ctx, peer).await,
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let Some(room) = self.room.as_mut().filter(|r| r.epoch == event.epoch) else {
            debug!("Ignoring transport event from a previous join");
            return;
        };
        room.handle_transport_event(&self.ctx, event).await;
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        self.room
            .as_ref()
            .map(JoinedRoom::snapshot)
            .unwrap_or_default()
    }
}

impl Drop for SignalingCoordinator {
    fn drop(&mut self) {
        if let Some(room) = self.room.take() {
            let presence = room.presence_path();
            warn!(
                "Coordinator dropped while in room {}; removing {}",
                room.room_id, presence
            );
            self.ctx.store.remove_detached(&presence);
            room.stop_media();
        }
    }
}
