use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Euler angles in radians, always composed in YXZ order (yaw, pitch, roll).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Euler {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn from_quat(rotation: Quat) -> Self {
        let (y, x, z) = rotation.to_euler(EulerRot::YXZ);
        Self { x, y, z }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.y, self.x, self.z)
    }

    /// Head rotations never carry roll.
    pub fn without_roll(self) -> Self {
        Self { z: 0.0, ..self }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn approach(&mut self, target: &Transform, t: f32) {
        self.position = self.position.lerp(target.position, t);
        self.rotation = slerp_shortest(self.rotation, target.rotation, t);
    }

    /// Re-expresses a world transform in this transform's local frame.
    pub fn world_to_local(&self, world: &Transform) -> Transform {
        let inverse = self.rotation.inverse();
        Transform {
            position: inverse * (world.position - self.position),
            rotation: (inverse * world.rotation).normalize(),
        }
    }

    pub fn local_to_world(&self, local: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }
}

/// Frame-rate independent blend factor `1 - exp(-k * dt)`.
pub fn smoothing_factor(damping: f32, dt: f32) -> f32 {
    if dt <= 0.0 || damping <= 0.0 || !dt.is_finite() {
        return 0.0;
    }
    1.0 - (-damping * dt).exp()
}

pub fn slerp_shortest(from: Quat, to: Quat, t: f32) -> Quat {
    if from.dot(to) < 0.0 {
        from.slerp(-to, t)
    } else {
        from.slerp(to, t)
    }
}

/// Rotation of a head from its wire euler; roll is dropped.
pub fn head_rotation(euler: Euler) -> Quat {
    euler.without_roll().to_quat()
}
