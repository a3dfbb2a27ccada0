use std::time::{Duration, Instant};

use glam::{Quat, Vec3};

use crate::config::SyncConfig;
use crate::math::Euler;
use crate::net::{ClientMessage, MoveData, WireVec3};
use crate::player::{HandInput, HandPose, HandSample, HandSide};

/// Local player transform captured from the render loop for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSample {
    pub head_position: Vec3,
    pub head_rotation: Quat,
    pub xr: bool,
    pub left_hand: HandInput,
    pub right_hand: HandInput,
}

impl Default for LocalSample {
    fn default() -> Self {
        Self {
            head_position: Vec3::ZERO,
            head_rotation: Quat::IDENTITY,
            xr: false,
            left_hand: HandSample::Untracked,
            right_hand: HandSample::Untracked,
        }
    }
}

impl LocalSample {
    pub fn desktop(head_position: Vec3, head_rotation: Quat) -> Self {
        Self {
            head_position,
            head_rotation,
            ..Default::default()
        }
    }

    pub fn hand(&self, side: HandSide) -> &HandInput {
        match side {
            HandSide::Left => &self.left_hand,
            HandSide::Right => &self.right_hand,
        }
    }
}

/// Where a hand rests when the device reports nothing for it: the side's
/// offset carried along with the camera, facing where the camera faces.
pub fn default_hand_pose(side: HandSide, camera_position: Vec3, camera_rotation: Quat) -> HandPose {
    HandPose {
        position: camera_position + camera_rotation * side.default_offset(),
        rotation: Euler::from_quat(camera_rotation).without_roll(),
    }
}

pub fn move_data(sample: &LocalSample) -> MoveData {
    let mut data = MoveData {
        position: sample.head_position.into(),
        rotation: Euler::from_quat(sample.head_rotation).without_roll().into(),
        ..Default::default()
    };

    if !sample.xr {
        return data;
    }

    for side in HandSide::BOTH {
        let (pose, tracked) = match sample.hand(side) {
            HandSample::Tracked(pose) => (*pose, true),
            HandSample::Untracked => (
                default_hand_pose(side, sample.head_position, sample.head_rotation),
                false,
            ),
        };
        let position = Some(WireVec3::from(pose.position));
        let rotation = Some(WireVec3::from(pose.rotation));

        match side {
            HandSide::Left => {
                data.left_hand_position = position;
                data.left_hand_rotation = rotation;
                data.left_hand_tracked = Some(tracked);
            }
            HandSide::Right => {
                data.right_hand_position = position;
                data.right_hand_rotation = rotation;
                data.right_hand_tracked = Some(tracked);
            }
        }
    }

    data
}

/// Rate limits local pose updates to one `MOVE` per send interval, always
/// carrying the most recent sample.
#[derive(Debug)]
pub struct OutboundSync {
    send_interval: Duration,
    pending: Option<LocalSample>,
    next_send_at: Option<Instant>,
    samples_received: u64,
    messages_emitted: u64,
}

impl OutboundSync {
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_interval(config.send_interval())
    }

    pub fn with_interval(send_interval: Duration) -> Self {
        Self {
            send_interval,
            pending: None,
            next_send_at: None,
            samples_received: 0,
            messages_emitted: 0,
        }
    }

    pub fn send_interval(&self) -> Duration {
        self.send_interval
    }

    pub fn push_sample(&mut self, now: Instant, sample: LocalSample) {
        self.samples_received += 1;
        self.pending = Some(sample);
        if self.next_send_at.is_none() {
            self.next_send_at = Some(now + self.send_interval);
        }
    }

    pub fn poll(&mut self, now: Instant) -> Option<ClientMessage> {
        let due = self.next_send_at?;
        if now < due {
            return None;
        }
        let sample = self.pending.take()?;

        let mut next = due + self.send_interval;
        if next <= now {
            next = now + self.send_interval;
        }
        self.next_send_at = Some(next);
        self.messages_emitted += 1;

        Some(ClientMessage::Move(move_data(&sample)))
    }

    pub fn sample(&mut self, now: Instant, sample: LocalSample) -> Option<ClientMessage> {
        self.push_sample(now, sample);
        self.poll(now)
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.next_send_at = None;
    }

    pub fn samples_received(&self) -> u64 {
        self.samples_received
    }

    pub fn messages_emitted(&self) -> u64 {
        self.messages_emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn sample_at(x: f32) -> LocalSample {
        LocalSample::desktop(Vec3::new(x, 1.6, 0.0), Quat::IDENTITY)
    }

    fn moved_x(message: &ClientMessage) -> f32 {
        match message {
            ClientMessage::Move(data) => data.position.x,
            other => panic!("Expected MOVE, got {:?}", other),
        }
    }

    #[test]
    fn test_one_message_per_window_with_latest_sample() {
        let mut outbound = OutboundSync::with_interval(Duration::from_millis(50));
        let start = Instant::now();

        for i in 0..5u64 {
            let now = start + Duration::from_millis(i * 10);
            assert!(outbound.sample(now, sample_at(i as f32)).is_none());
        }

        let sent = outbound
            .poll(start + Duration::from_millis(50))
            .expect("window elapsed");
        assert_eq!(moved_x(&sent), 4.0);
        assert!(outbound.poll(start + Duration::from_millis(50)).is_none());
        assert_eq!(outbound.messages_emitted(), 1);
        assert_eq!(outbound.samples_received(), 5);
    }

    #[test]
    fn test_no_message_without_new_sample() {
        let mut outbound = OutboundSync::with_interval(Duration::from_millis(50));
        let start = Instant::now();

        outbound.push_sample(start, sample_at(1.0));
        assert!(outbound.poll(start + Duration::from_millis(60)).is_some());
        assert!(outbound.poll(start + Duration::from_millis(200)).is_none());
    }

    #[test]
    fn test_deadline_resets_after_stall() {
        let mut outbound = OutboundSync::with_interval(Duration::from_millis(50));
        let start = Instant::now();

        outbound.push_sample(start, sample_at(0.0));
        let late = start + Duration::from_millis(500);
        outbound.push_sample(late, sample_at(1.0));
        assert!(outbound.poll(late).is_some());

        outbound.push_sample(late + Duration::from_millis(10), sample_at(2.0));
        assert!(outbound.poll(late + Duration::from_millis(10)).is_none());
        assert!(outbound.poll(late + Duration::from_millis(50)).is_some());
    }

    #[test]
    fn test_default_hands_at_identity_camera() {
        let left = default_hand_pose(HandSide::Left, Vec3::ZERO, Quat::IDENTITY);
        let right = default_hand_pose(HandSide::Right, Vec3::ZERO, Quat::IDENTITY);

        assert!((left.position - Vec3::new(-0.3, -0.5, -0.3)).length() < EPSILON);
        assert!((right.position - Vec3::new(0.3, -0.5, -0.3)).length() < EPSILON);
        assert_eq!(left.rotation, Euler::ZERO);
    }

    #[test]
    fn test_default_hand_follows_camera_yaw() {
        let yaw = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let camera = Vec3::new(1.0, 1.6, 0.0);
        let right = default_hand_pose(HandSide::Right, camera, yaw);

        let expected = camera + Vec3::new(-0.3, -0.5, -0.3);
        assert!((right.position - expected).length() < 1e-4);
        assert!((right.rotation.y - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_xr_move_flags_synthesized_hands() {
        let tracked = HandPose::new(Vec3::new(0.1, 1.2, -0.4), Euler::new(0.2, 0.0, 0.1));
        let sample = LocalSample {
            head_position: Vec3::new(0.0, 1.6, 0.0),
            head_rotation: Quat::IDENTITY,
            xr: true,
            left_hand: HandSample::Tracked(tracked),
            right_hand: HandSample::Untracked,
        };

        let data = move_data(&sample);
        assert_eq!(data.left_hand_tracked, Some(true));
        assert_eq!(data.left_hand_position, Some(WireVec3::new(0.1, 1.2, -0.4)));
        assert_eq!(data.right_hand_tracked, Some(false));
        let right = data.right_hand_position.expect("synthesized");
        assert!((right.y - 1.1).abs() < EPSILON);
    }

    #[test]
    fn test_desktop_move_has_no_hands_and_no_roll() {
        let rotation = Euler::new(0.2, 0.8, 0.5).to_quat();
        let sample = LocalSample {
            left_hand: HandSample::Tracked(HandPose::default()),
            ..LocalSample::desktop(Vec3::ZERO, rotation)
        };

        let data = move_data(&sample);
        assert!(!data.has_hands());
        assert_eq!(data.rotation.z, 0.0);
        assert!((data.rotation.y - 0.8).abs() < 1e-4);
    }
}
