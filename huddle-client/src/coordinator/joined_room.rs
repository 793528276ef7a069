use crate::config::EarlyCandidatePolicy;
use crate::coordinator::{
    CoordinatorContext, CoordinatorSnapshot, NegotiationSession, NegotiationState, Role,
    SessionSnapshot, role_toward,
};
use crate::media::LocalStream;
use crate::transport::{PeerTransport, TransportEvent, TransportEventKind, TransportEvents};
use anyhow::{Context, Result, anyhow};
use huddle_core::store::encode;
use huddle_core::{
    ChildSnapshot, IceCandidate, ListenerId, PeerId, PresenceRecord, RoomId, RoomPaths,
    SessionDescription, SignalEnvelope, StoreError, StorePath,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// State owned by the coordinator for the duration of one join.
pub(crate) struct JoinedRoom {
    pub(crate) room_id: RoomId,
    pub(crate) local_id: PeerId,
    pub(crate) epoch: u64,
    paths: RoomPaths,
    stream: LocalStream,
    sessions: HashMap<PeerId, NegotiationSession>,
    candidate_listeners: HashMap<PeerId, ListenerId>,
    pending_candidates: HashMap<PeerId, Vec<IceCandidate>>,
    known_peers: HashSet<PeerId>,
    departed: HashSet<PeerId>,
    next_session: u64,
    signal_listener: Option<ListenerId>,
    candidate_inbox_listener: Option<ListenerId>,
    membership_listener: Option<ListenerId>,
}

impl JoinedRoom {
    pub(crate) fn new(room_id: RoomId, local_id: PeerId, epoch: u64, stream: LocalStream) -> Self {
        Self {
            paths: RoomPaths::new(&room_id),
            room_id,
            local_id,
            epoch,
            stream,
            sessions: HashMap::new(),
            candidate_listeners: HashMap::new(),
            pending_candidates: HashMap::new(),
            known_peers: HashSet::new(),
            departed: HashSet::new(),
            next_session: 0,
            signal_listener: None,
            candidate_inbox_listener: None,
            membership_listener: None,
        }
    }

    pub(crate) fn presence_path(&self) -> StorePath {
        self.paths.presence(&self.local_id)
    }

    pub(crate) fn stop_media(&self) {
        self.stream.stop();
    }

    /// Publishes presence, offers to every peer already in the room and
    /// subscribes to the local mailboxes.
    pub(crate) async fn enter(&mut self, ctx: &CoordinatorContext) -> Result<(), StoreError> {
        let presence = self.presence_path();
        ctx.store
            .set(&presence, encode(&presence, &PresenceRecord::pending())?)
            .await?;

        if let Err(e) = ctx.store.on_disconnect_remove(&presence).await {
            warn!("Failed to register disconnect cleanup for {}: {}", presence, e);
        }

        // Subscribed before the membership read so a peer leaving in between
        // still gets torn down.
        self.membership_listener = Some(
            ctx.store
                .on_child_removed(&self.paths.peers(), ctx.membership_listener(self.epoch)),
        );

        let existing = self.existing_peers(ctx).await?;
        info!(
            "Joined room {} as {} with {} existing peer(s)",
            self.room_id,
            self.local_id,
            existing.len()
        );

        for peer in existing {
            self.announce(ctx, &peer).await;
            self.initiate(ctx, &peer).await;
        }

        self.signal_listener = Some(ctx.store.on_child_added(
            &self.paths.signal_inbox(&self.local_id),
            ctx.signal_listener(self.epoch),
        ));
        self.candidate_inbox_listener = Some(ctx.store.on_child_added(
            &self.paths.candidate_inbox(&self.local_id),
            ctx.candidate_sender_listener(self.epoch),
        ));

        Ok(())
    }

    async fn existing_peers(&self, ctx: &CoordinatorContext) -> Result<Vec<PeerId>, StoreError> {
        let mut peers: Vec<PeerId> = match ctx.store.get(&self.paths.peers()).await? {
            Some(Value::Object(members)) => members
                .keys()
                .map(|key| PeerId::from(key.as_str()))
                .filter(|peer| peer != &self.local_id)
                .collect(),
            _ => Vec::new(),
        };
        peers.sort();
        Ok(peers)
    }

    /// Reports `peer` to the observer the first time it is seen.
    async fn announce(&mut self, ctx: &CoordinatorContext, peer: &PeerId) {
        if self.known_peers.insert(peer.clone()) {
            info!("Peer {} joined room {}", peer, self.room_id);
            ctx.observer.on_peer_joined(peer.clone()).await;
        }
    }

    async fn ensure_session(
        &mut self,
        ctx: &CoordinatorContext,
        remote: &PeerId,
        role: Role,
    ) -> Result<()> {
        if self.sessions.contains_key(remote) {
            return Ok(());
        }

        self.next_session += 1;
        let events = TransportEvents::new(
            remote.clone(),
            self.epoch,
            self.next_session,
            ctx.transport_tx.clone(),
        );
        let transport = ctx
            .transports
            .create(&ctx.config.transport, &self.stream, events)
            .await
            .with_context(|| format!("creating transport for {}", remote))?;

        debug!("Created {:?} session for {}", role, remote);
        self.sessions.insert(
            remote.clone(),
            NegotiationSession::new(remote.clone(), self.next_session, role, transport),
        );
        Ok(())
    }

    fn session_mut(&mut self, remote: &PeerId) -> Result<&mut NegotiationSession> {
        self.sessions
            .get_mut(remote)
            .ok_or_else(|| anyhow!("no session for {}", remote))
    }

    fn transport_for(&self, remote: &PeerId) -> Result<Arc<dyn PeerTransport>> {
        self.sessions
            .get(remote)
            .map(NegotiationSession::transport)
            .ok_or_else(|| anyhow!("no session for {}", remote))
    }

    /// Offers to a peer that was already present when this peer joined.
    pub(crate) async fn initiate(&mut self, ctx: &CoordinatorContext, remote: &PeerId) {
        if let Err(e) = self.send_offer(ctx, remote, role_toward(true)).await {
            error!("Failed to send offer to {}: {:?}", remote, e);
        }
    }

    async fn send_offer(
        &mut self,
        ctx: &CoordinatorContext,
        remote: &PeerId,
        role: Role,
    ) -> Result<()> {
        self.ensure_session(ctx, remote, role).await?;
        if let Some(session) = self.sessions.get(remote)
            && session.state() != NegotiationState::New
        {
            debug!("Session with {} already negotiating", remote);
            return Ok(());
        }

        let transport = self.transport_for(remote)?;
        let offer = transport.create_offer().await?;
        transport.set_local_description(offer.clone()).await?;

        let path = self.paths.signal(remote, &self.local_id);
        deliver(ctx, &path, &SignalEnvelope::Offer(offer)).await?;
        self.session_mut(remote)?.offer_sent()?;

        info!("Sent offer to {}", remote);
        Ok(())
    }

    pub(crate) async fn handle_signal(
        &mut self,
        ctx: &CoordinatorContext,
        snapshot: ChildSnapshot,
    ) {
        let from = PeerId::from(snapshot.key.as_str());
        let envelope: SignalEnvelope = match snapshot.decode() {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Ignoring malformed signal from {}: {}", from, e);
                return;
            }
        };

        match envelope {
            SignalEnvelope::Offer(offer) => self.handle_offer(ctx, from, offer).await,
            SignalEnvelope::Answer(answer) => self.handle_answer(from, answer).await,
        }
    }

    async fn handle_offer(
        &mut self,
        ctx: &CoordinatorContext,
        from: PeerId,
        offer: SessionDescription,
    ) {
        if self.departed.contains(&from) {
            debug!("Ignoring offer from departed peer {}", from);
            return;
        }

        self.announce(ctx, &from).await;

        match self.sessions.get(&from).map(NegotiationSession::state) {
            Some(NegotiationState::OfferSent) => {
                // Both sides offered. The lower id keeps its offer.
                if self.local_id < from {
                    info!("Offer collision with {}: keeping local offer", from);
                    return;
                }
                info!("Offer collision with {}: yielding to remote offer", from);
                self.close_session(&from).await;
                self.unwatch_candidates(ctx, &from);
                // The store replays these once the new session watches again.
                self.pending_candidates.remove(&from);
            }
            Some(NegotiationState::OfferReceived | NegotiationState::AnswerSent) => {
                debug!("Ignoring duplicate offer from {}", from);
                return;
            }
            _ => {}
        }

        if let Err(e) = self.send_answer(ctx, &from, offer).await {
            error!("Failed to answer offer from {}: {:?}", from, e);
        }

        // Replays candidates that reached a replaced session.
        self.watch_candidates(ctx, from);
    }

    async fn send_answer(
        &mut self,
        ctx: &CoordinatorContext,
        from: &PeerId,
        offer: SessionDescription,
    ) -> Result<()> {
        self.ensure_session(ctx, from, role_toward(false)).await?;

        let transport = self.transport_for(from)?;
        transport.set_remote_description(offer).await?;
        self.session_mut(from)?.offer_received()?;
        self.flush_candidates(from).await;

        let answer = transport.create_answer().await?;
        transport.set_local_description(answer.clone()).await?;
        self.session_mut(from)?.answer_committed()?;

        let path = self.paths.signal(from, &self.local_id);
        deliver(ctx, &path, &SignalEnvelope::Answer(answer)).await?;
        self.session_mut(from)?.answer_delivered()?;

        info!("Answered offer from {}", from);
        Ok(())
    }

    async fn handle_answer(&mut self, from: PeerId, answer: SessionDescription) {
        let Some(session) = self.sessions.get(&from) else {
            warn!("Discarding answer from {}: no session", from);
            return;
        };
        if session.state() != NegotiationState::OfferSent {
            warn!(
                "Discarding answer from {}: session is {:?}",
                from,
                session.state()
            );
            return;
        }

        let transport = session.transport();
        if let Err(e) = transport.set_remote_description(answer).await {
            error!("Failed to apply answer from {}: {:?}", from, e);
            return;
        }
        if let Some(session) = self.sessions.get_mut(&from)
            && let Err(e) = session.answer_applied()
        {
            warn!("Answer from {} applied out of order: {}", from, e);
        }

        self.flush_candidates(&from).await;
        info!("Negotiation with {} complete", from);
    }

    /// Subscribes to the candidates `from` addresses to this peer.
    pub(crate) fn watch_candidates(&mut self, ctx: &CoordinatorContext, from: PeerId) {
        if from == self.local_id
            || self.departed.contains(&from)
            || self.candidate_listeners.contains_key(&from)
        {
            return;
        }

        let path = self.paths.candidates(&self.local_id, &from);
        let listener = ctx
            .store
            .on_child_added(&path, ctx.candidate_listener(self.epoch, from.clone()));
        debug!("Watching candidates at {}", path);
        self.candidate_listeners.insert(from, listener);
    }

    fn unwatch_candidates(&mut self, ctx: &CoordinatorContext, from: &PeerId) {
        if let Some(listener) = self.candidate_listeners.remove(from) {
            ctx.store.off(listener);
        }
    }

    pub(crate) async fn handle_candidate(
        &mut self,
        ctx: &CoordinatorContext,
        from: PeerId,
        snapshot: ChildSnapshot,
    ) {
        if self.departed.contains(&from) {
            return;
        }

        let candidate: IceCandidate = match snapshot.decode() {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Ignoring malformed candidate from {}: {}", from, e);
                return;
            }
        };

        let session = self
            .sessions
            .get(&from)
            .map(|s| (s.transport(), s.has_remote_description()));

        match (session, ctx.config.early_candidates) {
            (Some((transport, true)), _)
            | (Some((transport, false)), EarlyCandidatePolicy::Drop) => {
                apply_candidate(&from, transport, candidate).await;
            }
            (_, EarlyCandidatePolicy::Buffer) => {
                debug!("Buffering early candidate from {}", from);
                self.pending_candidates.entry(from).or_default().push(candidate);
            }
            (None, EarlyCandidatePolicy::Drop) => {
                warn!("Dropping candidate from {}: no session", from);
            }
        }
    }

    async fn flush_candidates(&mut self, from: &PeerId) {
        let Some(pending) = self.pending_candidates.remove(from) else {
            return;
        };
        let Some(transport) = self.sessions.get(from).map(NegotiationSession::transport) else {
            return;
        };

        debug!("Replaying {} buffered candidate(s) from {}", pending.len(), from);
        for candidate in pending {
            apply_candidate(from, Arc::clone(&transport), candidate).await;
        }
    }

    pub(crate) async fn handle_peer_removed(&mut self, ctx: &CoordinatorContext, peer: PeerId) {
        if peer == self.local_id {
            warn!("Own presence in room {} was removed externally", self.room_id);
            return;
        }

        info!("Peer {} left room {}", peer, self.room_id);
        self.departed.insert(peer.clone());
        self.close_session(&peer).await;
        self.unwatch_candidates(ctx, &peer);
        self.pending_candidates.remove(&peer);

        if self.known_peers.remove(&peer) {
            ctx.observer.on_peer_left(peer).await;
        }
    }

    pub(crate) async fn handle_transport_event(
        &mut self,
        ctx: &CoordinatorContext,
        event: TransportEvent,
    ) {
        let peer = event.peer_id;
        let Some(session) = self.sessions.get_mut(&peer) else {
            debug!("Transport event for {} without session", peer);
            return;
        };
        if session.id() != event.session {
            debug!("Ignoring event from replaced transport for {}", peer);
            return;
        }

        match event.kind {
            TransportEventKind::LocalCandidate(candidate) => {
                let path = self.paths.candidates(&peer, &self.local_id);
                let pushed = match encode(&path, &candidate) {
                    Ok(value) => ctx.store.push(&path, value).await.map(|_| ()),
                    Err(e) => Err(e),
                };
                if let Err(e) = pushed {
                    warn!("Failed to relay candidate to {}: {}", peer, e);
                }
            }

            TransportEventKind::RemoteMedia(media) => {
                info!("Receiving track {} from {}", media.track_id, peer);
                ctx.observer.on_remote_media(peer, media).await;
            }

            TransportEventKind::ConnectionState(state) => {
                debug!("Connection to {} is {:?}", peer, state);
                session.set_connection(state);
                ctx.observer.on_connection_state(peer, state).await;
            }
        }
    }

    async fn close_session(&mut self, peer: &PeerId) {
        let Some(session) = self.sessions.remove(peer) else {
            return;
        };
        if let Err(e) = session.transport().close().await {
            warn!("Failed to close transport for {}: {:?}", peer, e);
        }
    }

    /// Releases everything this join created. Store failures are logged and
    /// never stop local cleanup.
    pub(crate) async fn leave(mut self, ctx: &CoordinatorContext) {
        info!("Leaving room {} as {}", self.room_id, self.local_id);

        let presence = self.presence_path();
        if let Err(e) = ctx.store.remove(&presence).await {
            warn!("Failed to remove presence {}: {}", presence, e);
        }
        if let Err(e) = ctx.store.cancel_on_disconnect(&presence).await {
            warn!("Failed to cancel disconnect cleanup for {}: {}", presence, e);
        }

        if let Some(listener) = self.signal_listener.take() {
            ctx.store.off(listener);
        }
        let inbox = self.paths.signal_inbox(&self.local_id);
        if let Err(e) = ctx.store.remove(&inbox).await {
            warn!("Failed to remove signal inbox {}: {}", inbox, e);
        }

        if let Some(listener) = self.candidate_inbox_listener.take() {
            ctx.store.off(listener);
        }
        for (_, listener) in self.candidate_listeners.drain() {
            ctx.store.off(listener);
        }
        let inbox = self.paths.candidate_inbox(&self.local_id);
        if let Err(e) = ctx.store.remove(&inbox).await {
            warn!("Failed to remove candidate inbox {}: {}", inbox, e);
        }

        if let Some(listener) = self.membership_listener.take() {
            ctx.store.off(listener);
        }

        let peers: Vec<PeerId> = self.sessions.keys().cloned().collect();
        for peer in peers {
            self.close_session(&peer).await;
        }
        self.pending_candidates.clear();

        let mut known: Vec<PeerId> = self.known_peers.drain().collect();
        known.sort();
        for peer in known {
            ctx.observer.on_peer_left(peer).await;
        }

        self.stream.stop();
    }

    pub(crate) fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            room: Some(self.room_id.clone()),
            local_id: Some(self.local_id.clone()),
            sessions: self
                .sessions
                .values()
                .map(|s| {
                    let snapshot = SessionSnapshot {
                        role: s.role(),
                        state: s.state(),
                        connection: s.connection(),
                    };
                    (s.remote_id().clone(), snapshot)
                })
                .collect(),
            known_peers: self.known_peers.iter().cloned().collect(),
            candidate_listeners: self.candidate_listeners.len(),
            pending_candidates: self.pending_candidates.values().map(Vec::len).sum(),
            media_live: self.stream.is_live(),
        }
    }
}

/// Writes an envelope to a mailbox slot. The slot is cleared first so a
/// replacement still reaches the recipient as a new child.
async fn deliver(
    ctx: &CoordinatorContext,
    path: &StorePath,
    envelope: &SignalEnvelope,
) -> Result<(), StoreError> {
    let value = encode(path, envelope)?;
    ctx.store.remove(path).await?;
    ctx.store.set(path, value).await
}

async fn apply_candidate(
    from: &PeerId,
    transport: Arc<dyn PeerTransport>,
    candidate: IceCandidate,
) {
    if let Err(e) = transport.add_ice_candidate(candidate).await {
        warn!("Failed to add ICE candidate for {}: {:?}", from, e);
    }
}
