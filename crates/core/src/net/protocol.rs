use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::math::Euler;
use crate::player::{HandPose, HandSample, ProfileData, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WireVec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for WireVec3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<WireVec3> for Vec3 {
    fn from(v: WireVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Euler> for WireVec3 {
    fn from(e: Euler) -> Self {
        Self::new(e.x, e.y, e.z)
    }
}

impl From<WireVec3> for Euler {
    fn from(v: WireVec3) -> Self {
        Euler::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveData {
    pub position: WireVec3,
    pub rotation: WireVec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand_position: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand_rotation: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand_position: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand_rotation: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand_tracked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand_tracked: Option<bool>,
}

impl MoveData {
    pub fn has_hands(&self) -> bool {
        self.left_hand_position.is_some() || self.right_hand_position.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileWire {
    #[serde(rename = "isXR")]
    pub is_xr: bool,
    #[serde(
        rename = "isHandTracking",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_hand_tracking: Option<bool>,
}

impl From<ProfileData> for ProfileWire {
    fn from(profile: ProfileData) -> Self {
        Self {
            is_xr: profile.is_xr,
            is_hand_tracking: profile.is_hand_tracking,
        }
    }
}

impl From<ProfileWire> for ProfileData {
    fn from(wire: ProfileWire) -> Self {
        Self {
            is_xr: wire.is_xr,
            is_hand_tracking: wire.is_hand_tracking,
        }
    }
}

fn default_visible() -> bool {
    true
}

/// Server-side state of one player as pushed by the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[serde(default)]
    pub position: WireVec3,
    #[serde(default)]
    pub rotation: WireVec3,
    #[serde(rename = "isXR", default)]
    pub is_xr: bool,
    #[serde(default)]
    pub is_hand_tracking: bool,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand_position: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand_rotation: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand_position: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand_rotation: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand_tracked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand_tracked: Option<bool>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            position: WireVec3::default(),
            rotation: WireVec3::default(),
            is_xr: false,
            is_hand_tracking: false,
            is_visible: true,
            left_hand_position: None,
            left_hand_rotation: None,
            right_hand_position: None,
            right_hand_rotation: None,
            left_hand_tracked: None,
            right_hand_tracked: None,
        }
    }
}

impl PlayerState {
    pub fn left_hand(&self) -> HandSample {
        hand_from_wire(
            self.left_hand_tracked,
            self.left_hand_position,
            self.left_hand_rotation,
        )
    }

    pub fn right_hand(&self) -> HandSample {
        hand_from_wire(
            self.right_hand_tracked,
            self.right_hand_position,
            self.right_hand_rotation,
        )
    }
}

/// An explicit flag wins; without one a hand counts as tracked only when both
/// its position and rotation are present. A hand at the exact world origin is
/// still a tracked hand.
pub fn hand_from_wire(
    tracked: Option<bool>,
    position: Option<WireVec3>,
    rotation: Option<WireVec3>,
) -> HandSample {
    match (tracked, position, rotation) {
        (Some(false), _, _) => HandSample::Untracked,
        (Some(true), Some(position), rotation) => HandSample::Tracked(HandPose::new(
            position.into(),
            rotation.map(Euler::from).unwrap_or_default(),
        )),
        (None, Some(position), Some(rotation)) => {
            HandSample::Tracked(HandPose::new(position.into(), rotation.into()))
        }
        _ => HandSample::Untracked,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "MOVE")]
    Move(MoveData),
    #[serde(rename = "CHANGE_PROFILE")]
    ChangeProfile(ProfileWire),
    #[serde(rename = "LEAVE")]
    Leave,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "JOINED")]
    Joined {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        room: String,
    },
    #[serde(rename = "JOIN_ERROR")]
    JoinError { reason: String },
    #[serde(rename = "PLAYER_ADD")]
    PlayerAdd {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        player: PlayerState,
    },
    #[serde(rename = "PLAYER_CHANGE")]
    PlayerChange {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        player: PlayerState,
    },
    #[serde(rename = "PLAYER_REMOVE")]
    PlayerRemove {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Move(_) => "MOVE",
            ClientMessage::ChangeProfile(_) => "CHANGE_PROFILE",
            ClientMessage::Leave => "LEAVE",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Joined { .. } => "JOINED",
            ServerMessage::JoinError { .. } => "JOIN_ERROR",
            ServerMessage::PlayerAdd { .. } => "PLAYER_ADD",
            ServerMessage::PlayerChange { .. } => "PLAYER_CHANGE",
            ServerMessage::PlayerRemove { .. } => "PLAYER_REMOVE",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
