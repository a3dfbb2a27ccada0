pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod stats;

pub use client::SyncClient;
pub use config::{ClientConfig, DEFAULT_JOIN_TIMEOUT_SECS};
pub use endpoint::room_url;
pub use error::SessionError;
pub use session::NetworkSession;
pub use stats::{ConnectionState, SessionStats};
