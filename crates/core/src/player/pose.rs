use glam::{Quat, Vec3};

use crate::math::{Euler, head_rotation};

pub type SessionId = String;

pub const LEFT_HAND_OFFSET: Vec3 = Vec3::new(-0.3, -0.5, -0.3);
pub const RIGHT_HAND_OFFSET: Vec3 = Vec3::new(0.3, -0.5, -0.3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub const BOTH: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    /// Resting hand position relative to the head when no hand data exists.
    pub fn default_offset(self) -> Vec3 {
        match self {
            HandSide::Left => LEFT_HAND_OFFSET,
            HandSide::Right => RIGHT_HAND_OFFSET,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HandSide::Left => "left",
            HandSide::Right => "right",
        }
    }
}

/// World-space hand pose.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandPose {
    pub position: Vec3,
    pub rotation: Euler,
}

impl HandPose {
    pub fn new(position: Vec3, rotation: Euler) -> Self {
        Self { position, rotation }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HandSample {
    Tracked(HandPose),
    #[default]
    Untracked,
}

/// Hand input on the sending side has the same shape as a received sample.
pub type HandInput = HandSample;

impl HandSample {
    pub fn pose(&self) -> Option<&HandPose> {
        match self {
            HandSample::Tracked(pose) => Some(pose),
            HandSample::Untracked => None,
        }
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self, HandSample::Tracked(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerPose {
    pub position: Vec3,
    pub rotation: Euler,
    pub left_hand: HandSample,
    pub right_hand: HandSample,
}

impl PlayerPose {
    pub fn new(position: Vec3, rotation: Euler) -> Self {
        Self {
            position,
            rotation,
            left_hand: HandSample::Untracked,
            right_hand: HandSample::Untracked,
        }
    }

    pub fn with_hands(mut self, left: HandSample, right: HandSample) -> Self {
        self.left_hand = left;
        self.right_hand = right;
        self
    }

    pub fn hand(&self, side: HandSide) -> &HandSample {
        match side {
            HandSide::Left => &self.left_hand,
            HandSide::Right => &self.right_hand,
        }
    }

    pub fn head_rotation(&self) -> Quat {
        head_rotation(self.rotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileData {
    pub is_xr: bool,
    pub is_hand_tracking: Option<bool>,
}

impl ProfileData {
    pub fn desktop() -> Self {
        Self {
            is_xr: false,
            is_hand_tracking: Some(false),
        }
    }

    pub fn xr(is_hand_tracking: bool) -> Self {
        Self {
            is_xr: true,
            is_hand_tracking: Some(is_hand_tracking),
        }
    }
}
