mod engine;
mod pose;

pub use engine::{InterpolatedPlayer, InterpolationConfig, InterpolationEngine, InterpolationStats};
pub use pose::{PoseInterpolator, RenderTransforms, default_local_hand};
