use crate::config::CoordinatorConfig;
use crate::coordinator::StoreEvent;
use crate::media::LocalMediaSource;
use crate::observer::RoomObserver;
use crate::transport::{TransportEvent, TransportFactory};
use huddle_core::{ChildListener, ChildSnapshot, PeerId, RealtimeStore};
use std::sync::Arc;
use tokio::sync::mpsc;

/// External collaborators injected into a coordinator.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn RealtimeStore>,
    pub transports: Arc<dyn TransportFactory>,
    pub media: Arc<dyn LocalMediaSource>,
    pub observer: Arc<dyn RoomObserver>,
}

/// Everything a joined room needs from its coordinator besides its own state.
pub(crate) struct CoordinatorContext {
    pub(crate) store: Arc<dyn RealtimeStore>,
    pub(crate) transports: Arc<dyn TransportFactory>,
    pub(crate) media: Arc<dyn LocalMediaSource>,
    pub(crate) observer: Arc<dyn RoomObserver>,
    pub(crate) config: CoordinatorConfig,
    pub(crate) store_tx: mpsc::UnboundedSender<StoreEvent>,
    pub(crate) transport_tx: mpsc::Sender<TransportEvent>,
}

impl CoordinatorContext {
    pub(crate) fn new(
        collaborators: Collaborators,
        config: CoordinatorConfig,
        store_tx: mpsc::UnboundedSender<StoreEvent>,
        transport_tx: mpsc::Sender<TransportEvent>,
    ) -> Self {
        Self {
            store: collaborators.store,
            transports: collaborators.transports,
            media: collaborators.media,
            observer: collaborators.observer,
            config,
            store_tx,
            transport_tx,
        }
    }

    pub(crate) fn signal_listener(&self, epoch: u64) -> ChildListener {
        self.listener(move |snapshot| StoreEvent::Signal { epoch, snapshot })
    }

    pub(crate) fn candidate_sender_listener(&self, epoch: u64) -> ChildListener {
        self.listener(move |snapshot| StoreEvent::CandidateSender {
            epoch,
            from: PeerId::from(snapshot.key),
        })
    }

    pub(crate) fn candidate_listener(&self, epoch: u64, from: PeerId) -> ChildListener {
        self.listener(move |snapshot| StoreEvent::Candidate {
            epoch,
            from: from.clone(),
            snapshot,
        })
    }

    pub(crate) fn membership_listener(&self, epoch: u64) -> ChildListener {
        self.listener(move |snapshot| StoreEvent::PeerRemoved {
            epoch,
            peer: PeerId::from(snapshot.key),
        })
    }

    // Store callbacks only enqueue; all handling happens on the coordinator task.
    fn listener<F>(&self, to_event: F) -> ChildListener
    where
        F: Fn(ChildSnapshot) -> StoreEvent + Send + Sync + 'static,
    {
        let tx = self.store_tx.clone();
        Box::new(move |snapshot| {
            let _ = tx.send(to_event(snapshot));
        })
    }
}
