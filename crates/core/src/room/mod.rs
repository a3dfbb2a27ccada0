mod listeners;
mod state;

pub use listeners::{ListenerId, Listeners, RoomListener};
pub use state::{RoomEvent, RoomState};
