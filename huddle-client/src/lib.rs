mod config;
mod coordinator;
mod error;
mod media;
mod observer;
mod transport;

pub use config::*;
pub use coordinator::*;
pub use error::*;
pub use media::*;
pub use observer::*;
pub use transport::*;
