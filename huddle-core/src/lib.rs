pub mod model;
pub mod paths;
pub mod store;
pub mod utils;

pub use model::*;
pub use paths::{RoomPaths, StorePath};
pub use store::{
    ChildListener, ChildSnapshot, ListenerId, MemoryDatabase, MemoryStore, RealtimeStore,
    StoreError,
};
