use glam::{Quat, Vec3};

use crate::player::{HandInput, HandSample, HandSide};

use super::outbound::LocalSample;

/// Render-side view of the local player.
pub trait TransformSource {
    fn camera_world_position(&self) -> Vec3;

    fn camera_world_rotation(&self) -> Quat;

    fn hand(&self, _side: HandSide) -> HandInput {
        HandSample::Untracked
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransformSampler {
    pub xr: bool,
}

impl TransformSampler {
    pub fn new(xr: bool) -> Self {
        Self { xr }
    }

    pub fn sample(&self, source: &dyn TransformSource) -> LocalSample {
        let (left_hand, right_hand) = if self.xr {
            (source.hand(HandSide::Left), source.hand(HandSide::Right))
        } else {
            (HandSample::Untracked, HandSample::Untracked)
        };

        LocalSample {
            head_position: source.camera_world_position(),
            head_rotation: source.camera_world_rotation().normalize(),
            xr: self.xr,
            left_hand,
            right_hand,
        }
    }
}
