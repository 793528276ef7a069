mod coordinator_command;
mod coordinator_context;
mod coordinator_handle;
mod joined_room;
mod session;
mod signaling_coordinator;
mod snapshot;
mod store_event;

pub use coordinator_command::*;
pub use coordinator_context::Collaborators;
pub use coordinator_handle::*;
pub use session::{InvalidTransition, NegotiationState, Role, role_toward};
pub use signaling_coordinator::*;
pub use snapshot::*;

pub(crate) use coordinator_context::CoordinatorContext;
pub(crate) use joined_room::JoinedRoom;
pub(crate) use session::NegotiationSession;
pub(crate) use store_event::StoreEvent;
