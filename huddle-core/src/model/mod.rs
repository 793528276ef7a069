mod peer;
mod presence;
mod room;
mod signaling;

pub use peer::PeerId;
pub use presence::{PresenceRecord, ServerValue, Timestamp};
pub use room::{InvalidRoomId, RoomId};
pub use signaling::{IceCandidate, IceServerConfig, SdpType, SessionDescription, SignalEnvelope};
