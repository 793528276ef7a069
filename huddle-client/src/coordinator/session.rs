use crate::transport::{ConnectionState, PeerTransport};
use huddle_core::PeerId;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Join-order rule. A newcomer offers to every peer already present when it
/// joined; a member never offers to a peer that arrives later. This yields
/// at most one offer per unordered pair.
pub fn role_toward(remote_present_at_join: bool) -> Role {
    if remote_present_at_join {
        Role::Initiator
    } else {
        Role::Responder
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    New,
    /// Local offer committed and delivered; waiting for the answer.
    OfferSent,
    OfferReceived,
    /// Local answer committed, not yet delivered.
    AnswerSent,
    /// Both descriptions are set.
    Connected,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot {action} while {from:?}")]
pub struct InvalidTransition {
    pub from: NegotiationState,
    pub action: &'static str,
}

/// Local state for one remote peer.
pub(crate) struct NegotiationSession {
    remote_id: PeerId,
    id: u64,
    role: Role,
    state: NegotiationState,
    connection: ConnectionState,
    transport: Arc<dyn PeerTransport>,
}

impl NegotiationSession {
    pub(crate) fn new(
        remote_id: PeerId,
        id: u64,
        role: Role,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        Self {
            remote_id,
            id,
            role,
            state: NegotiationState::New,
            connection: ConnectionState::New,
            transport,
        }
    }

    pub(crate) fn remote_id(&self) -> &PeerId {
        &self.remote_id
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn role(&self) -> Role {
        self.role
    }

    pub(crate) fn state(&self) -> NegotiationState {
        self.state
    }

    pub(crate) fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub(crate) fn set_connection(&mut self, state: ConnectionState) {
        self.connection = state;
    }

    pub(crate) fn transport(&self) -> Arc<dyn PeerTransport> {
        Arc::clone(&self.transport)
    }

    /// Remote candidates can only be applied once the remote description is set.
    pub(crate) fn has_remote_description(&self) -> bool {
        matches!(
            self.state,
            NegotiationState::OfferReceived
                | NegotiationState::AnswerSent
                | NegotiationState::Connected
        )
    }

    pub(crate) fn offer_sent(&mut self) -> Result<(), InvalidTransition> {
        self.transition(NegotiationState::New, NegotiationState::OfferSent, "send offer")
    }

    pub(crate) fn offer_received(&mut self) -> Result<(), InvalidTransition> {
        match self.state {
            NegotiationState::New | NegotiationState::Connected => {
                self.state = NegotiationState::OfferReceived;
                Ok(())
            }
            from => Err(InvalidTransition {
                from,
                action: "accept offer",
            }),
        }
    }

    pub(crate) fn answer_committed(&mut self) -> Result<(), InvalidTransition> {
        self.transition(
            NegotiationState::OfferReceived,
            NegotiationState::AnswerSent,
            "commit answer",
        )
    }

    pub(crate) fn answer_delivered(&mut self) -> Result<(), InvalidTransition> {
        self.transition(
            NegotiationState::AnswerSent,
            NegotiationState::Connected,
            "deliver answer",
        )
    }

    pub(crate) fn answer_applied(&mut self) -> Result<(), InvalidTransition> {
        self.transition(
            NegotiationState::OfferSent,
            NegotiationState::Connected,
            "apply answer",
        )
    }

    fn transition(
        &mut self,
        expected: NegotiationState,
        next: NegotiationState,
        action: &'static str,
    ) -> Result<(), InvalidTransition> {
        if self.state != expected {
            return Err(InvalidTransition {
                from: self.state,
                action,
            });
        }
        self.state = next;
        Ok(())
    }
}
