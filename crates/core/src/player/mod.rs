mod pose;
mod reconcile;
mod store;

pub use pose::{
    HandInput, HandPose, HandSample, HandSide, LEFT_HAND_OFFSET, PlayerPose, ProfileData,
    RIGHT_HAND_OFFSET, SessionId,
};
pub use reconcile::Reconciler;
pub use store::{PlayerMap, PlayerStore, RemotePlayer};
