mod outbound;
mod profile;
mod sampler;

pub use outbound::{LocalSample, OutboundSync, default_hand_pose, move_data};
pub use profile::ProfileTracker;
pub use sampler::{TransformSampler, TransformSource};
