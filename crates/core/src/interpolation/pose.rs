use glam::Quat;

use crate::math::{Transform, smoothing_factor};
use crate::player::{HandSample, HandSide, PlayerPose};

/// Hand transform relative to the head when the sender has no data for it.
pub fn default_local_hand(side: HandSide) -> Transform {
    Transform::new(side.default_offset(), Quat::IDENTITY)
}

fn hand_world(sample: &HandSample) -> Option<Transform> {
    sample
        .pose()
        .map(|pose| Transform::new(pose.position, pose.rotation.to_quat()))
}

#[derive(Debug, Clone, Copy)]
struct HandTrack {
    side: HandSide,
    world_target: Option<Transform>,
    has_data: bool,
    local: Transform,
}

impl HandTrack {
    fn new(side: HandSide, sample: &HandSample, head: &Transform) -> Self {
        let world_target = hand_world(sample);
        let local = match &world_target {
            Some(target) => head.world_to_local(target),
            None => default_local_hand(side),
        };

        Self {
            side,
            world_target,
            has_data: world_target.is_some(),
            local,
        }
    }

    fn retarget(&mut self, sample: &HandSample) {
        match hand_world(sample) {
            Some(target) => {
                self.world_target = Some(target);
                self.has_data = true;
            }
            // the last world target is kept but no longer followed
            None => self.has_data = false,
        }
    }

    fn local_target(&self, head: &Transform) -> Transform {
        match (&self.world_target, self.has_data) {
            (Some(target), true) => head.world_to_local(target),
            _ => default_local_hand(self.side),
        }
    }
}

/// Interpolated transforms of one remote avatar, ready to hand to a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransforms {
    pub head: Transform,
    pub left_hand_local: Transform,
    pub right_hand_local: Transform,
    pub left_hand_world: Transform,
    pub right_hand_world: Transform,
    /// False when the sender hid its avatar; nothing should be drawn.
    pub visible: bool,
    pub show_left_hand: bool,
    pub show_right_hand: bool,
}

impl RenderTransforms {
    pub fn hand_local(&self, side: HandSide) -> &Transform {
        match side {
            HandSide::Left => &self.left_hand_local,
            HandSide::Right => &self.right_hand_local,
        }
    }

    pub fn hand_world(&self, side: HandSide) -> &Transform {
        match side {
            HandSide::Left => &self.left_hand_world,
            HandSide::Right => &self.right_hand_world,
        }
    }
}

/// Exponential smoothing of one remote player's head and hands. Heads move in
/// world space; hands are smoothed in the head's local frame so a turning head
/// carries its hands along instead of letting them swing through space.
#[derive(Debug, Clone)]
pub struct PoseInterpolator {
    head: Transform,
    head_target: Transform,
    left: HandTrack,
    right: HandTrack,
    pub show_hands: bool,
    pub visible: bool,
}

impl PoseInterpolator {
    pub fn new(pose: &PlayerPose) -> Self {
        let head = Transform::new(pose.position, pose.head_rotation());

        Self {
            head,
            head_target: head,
            left: HandTrack::new(HandSide::Left, &pose.left_hand, &head),
            right: HandTrack::new(HandSide::Right, &pose.right_hand, &head),
            show_hands: false,
            visible: true,
        }
    }

    pub fn set_target(&mut self, pose: &PlayerPose) {
        self.head_target = Transform::new(pose.position, pose.head_rotation());
        self.left.retarget(&pose.left_hand);
        self.right.retarget(&pose.right_hand);
    }

    /// Head first, then hands against the updated head frame.
    pub fn step(&mut self, dt: f32, damping: f32) {
        let t = smoothing_factor(damping, dt);
        if t <= 0.0 {
            return;
        }

        let head_target = self.head_target;
        self.head.approach(&head_target, t);

        let head = self.head;
        for hand in [&mut self.left, &mut self.right] {
            let target = hand.local_target(&head);
            hand.local.approach(&target, t);
        }
    }

    pub fn head(&self) -> &Transform {
        &self.head
    }

    pub fn head_target(&self) -> &Transform {
        &self.head_target
    }

    pub fn has_hand_data(&self, side: HandSide) -> bool {
        match side {
            HandSide::Left => self.left.has_data,
            HandSide::Right => self.right.has_data,
        }
    }

    pub fn transforms(&self) -> RenderTransforms {
        RenderTransforms {
            head: self.head,
            left_hand_local: self.left.local,
            right_hand_local: self.right.local,
            left_hand_world: self.head.local_to_world(&self.left.local),
            right_hand_world: self.head.local_to_world(&self.right.local),
            visible: self.visible,
            show_left_hand: self.visible && self.show_hands,
            show_right_hand: self.visible && self.show_hands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Euler;
    use crate::player::HandPose;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-4;

    fn standing(x: f32) -> PlayerPose {
        PlayerPose::new(Vec3::new(x, 1.6, 0.0), Euler::ZERO)
    }

    #[test]
    fn test_first_tick_does_not_teleport() {
        let pose = PlayerPose::new(Vec3::new(3.0, 1.6, -2.0), Euler::new(0.1, 0.8, 0.0));
        let mut interpolator = PoseInterpolator::new(&pose);

        interpolator.step(1.0 / 60.0, 12.0);

        let head = interpolator.transforms().head;
        assert_eq!(head.position, pose.position);
        assert!(head.rotation.abs_diff_eq(pose.head_rotation(), EPSILON));
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut interpolator = PoseInterpolator::new(&standing(0.0));
        interpolator.set_target(&standing(5.0));

        interpolator.step(0.0, 12.0);
        assert_eq!(interpolator.head().position.x, 0.0);
    }

    fn converge(dt: f32) {
        let damping = 12.0;
        let t99 = 100.0f32.ln() / damping;
        let steps = (t99 / dt).ceil() as usize;

        let mut interpolator = PoseInterpolator::new(&standing(0.0));
        interpolator.set_target(&standing(1.0));

        let mut remaining = 1.0f32;
        for step in 0..steps {
            interpolator.step(dt, damping);
            let now = 1.0 - interpolator.head().position.x;
            assert!(now < remaining, "not monotonic at step {}", step);
            remaining = now;

            if step + 2 == steps {
                assert!(remaining > 0.009, "converged too early: {}", remaining);
            }
        }

        assert!(remaining <= 0.0101, "remaining {} after {} steps", remaining, steps);
    }

    #[test]
    fn test_converges_at_30hz() {
        converge(1.0 / 30.0);
    }

    #[test]
    fn test_converges_at_120hz() {
        converge(1.0 / 120.0);
    }

    #[test]
    fn test_untracked_hands_start_at_default_offset() {
        let interpolator = PoseInterpolator::new(&standing(0.0));
        let transforms = interpolator.transforms();

        assert_eq!(
            transforms.left_hand_local,
            default_local_hand(HandSide::Left)
        );
        let right_world = transforms.right_hand_world.position;
        assert!((right_world - Vec3::new(0.3, 1.1, -0.3)).length() < EPSILON);
    }

    #[test]
    fn test_hand_stays_put_when_head_turns() {
        let hand = HandPose::new(Vec3::new(0.3, 1.2, -0.4), Euler::ZERO);
        let pose = standing(0.0).with_hands(HandSample::Tracked(hand), HandSample::Untracked);
        let mut interpolator = PoseInterpolator::new(&pose);

        let turned = PlayerPose {
            rotation: Euler::new(0.0, FRAC_PI_2, 0.0),
            ..pose
        };
        interpolator.set_target(&turned);
        interpolator.step(2.0, 12.0);

        let transforms = interpolator.transforms();
        assert!(
            transforms
                .head
                .rotation
                .abs_diff_eq(turned.head_rotation(), EPSILON)
        );
        assert!((transforms.left_hand_world.position - hand.position).length() < EPSILON);
    }

    #[test]
    fn test_lost_hand_returns_to_default() {
        let hand = HandPose::new(Vec3::new(1.0, 0.0, 1.0), Euler::ZERO);
        let pose = standing(0.0).with_hands(HandSample::Untracked, HandSample::Tracked(hand));
        let mut interpolator = PoseInterpolator::new(&pose);
        assert!(interpolator.has_hand_data(HandSide::Right));

        interpolator.set_target(&standing(0.0));
        assert!(!interpolator.has_hand_data(HandSide::Right));

        interpolator.step(5.0, 12.0);
        let local = interpolator.transforms().right_hand_local;
        assert!((local.position - Vec3::new(0.3, -0.5, -0.3)).length() < EPSILON);
    }
}
