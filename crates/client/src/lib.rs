pub mod net;

pub use net::{
    ClientConfig, ConnectionState, DEFAULT_JOIN_TIMEOUT_SECS, NetworkSession, SessionError,
    SessionStats, SyncClient, room_url,
};
