mod protocol;

pub use protocol::{
    ClientMessage, MoveData, PlayerState, ProfileWire, ProtocolError, ServerMessage, WireVec3,
    hand_from_wire,
};
