pub use huddle_core::model::{PeerId, RoomId};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod store {
    pub use huddle_core::paths::*;
    pub use huddle_core::store::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use huddle_client::*;
}
