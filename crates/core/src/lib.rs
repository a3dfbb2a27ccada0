pub mod config;
pub mod interpolation;
pub mod math;
pub mod net;
pub mod player;
pub mod room;
pub mod sync;

pub use config::{
    ConfigError, DEFAULT_DAMPING, DEFAULT_ROOM_NAME, DEFAULT_SEND_INTERVAL_MS,
    DEFAULT_SERVER_ENDPOINT, ENDPOINT_ENV, ROOM_ENV, SyncConfig,
};
pub use interpolation::{
    InterpolatedPlayer, InterpolationConfig, InterpolationEngine, InterpolationStats,
    PoseInterpolator, RenderTransforms, default_local_hand,
};
pub use math::{Euler, Transform, head_rotation, slerp_shortest, smoothing_factor};
pub use net::{
    ClientMessage, MoveData, PlayerState, ProfileWire, ProtocolError, ServerMessage, WireVec3,
    hand_from_wire,
};
pub use player::{
    HandInput, HandPose, HandSample, HandSide, LEFT_HAND_OFFSET, PlayerMap, PlayerPose,
    PlayerStore, ProfileData, RIGHT_HAND_OFFSET, Reconciler, RemotePlayer, SessionId,
};
pub use room::{ListenerId, Listeners, RoomEvent, RoomListener, RoomState};
pub use sync::{
    LocalSample, OutboundSync, ProfileTracker, TransformSampler, TransformSource,
    default_hand_pose, move_data,
};
