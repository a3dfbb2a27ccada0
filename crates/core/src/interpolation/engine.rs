use std::collections::HashMap;

use crate::config::{DEFAULT_DAMPING, SyncConfig};
use crate::player::{PlayerMap, RemotePlayer, SessionId};

use super::pose::{PoseInterpolator, RenderTransforms};

#[derive(Debug, Clone)]
pub struct InterpolationConfig {
    pub damping: f32,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
        }
    }
}

impl From<&SyncConfig> for InterpolationConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            damping: config.damping,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterpolatedPlayer {
    pub session_id: SessionId,
    pub is_xr: bool,
    pub is_hand_tracking: bool,
    pub is_visible: bool,
    interpolator: PoseInterpolator,
}

impl InterpolatedPlayer {
    fn new(session_id: SessionId, player: &RemotePlayer) -> Self {
        let mut interpolator = PoseInterpolator::new(&player.pose);
        interpolator.show_hands = player.is_xr;
        interpolator.visible = player.is_visible;

        Self {
            session_id,
            is_xr: player.is_xr,
            is_hand_tracking: player.is_hand_tracking,
            is_visible: player.is_visible,
            interpolator,
        }
    }

    fn retarget(&mut self, player: &RemotePlayer) {
        self.is_xr = player.is_xr;
        self.is_hand_tracking = player.is_hand_tracking;
        self.is_visible = player.is_visible;
        self.interpolator.show_hands = player.is_xr;
        self.interpolator.visible = player.is_visible;
        self.interpolator.set_target(&player.pose);
    }

    pub fn interpolator(&self) -> &PoseInterpolator {
        &self.interpolator
    }

    pub fn transforms(&self) -> RenderTransforms {
        self.interpolator.transforms()
    }
}

/// Per-view set of remote avatars being smoothed toward their latest state.
#[derive(Debug)]
pub struct InterpolationEngine {
    config: InterpolationConfig,
    players: HashMap<SessionId, InterpolatedPlayer>,
    syncs: u64,
    steps: u64,
    last_dt: f32,
}

impl InterpolationEngine {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            players: HashMap::new(),
            syncs: 0,
            steps: 0,
            last_dt: 0.0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(InterpolationConfig::default())
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Brings the avatar set in line with a store snapshot: new ids start at
    /// their current pose, known ids get a new target, missing ids are dropped.
    pub fn sync(&mut self, snapshot: &PlayerMap, local: Option<&str>) {
        self.players
            .retain(|id, _| snapshot.contains_key(id) && Some(id.as_str()) != local);

        for (id, player) in snapshot {
            if Some(id.as_str()) == local {
                continue;
            }
            match self.players.get_mut(id) {
                Some(existing) => existing.retarget(player),
                None => {
                    log::debug!("Tracking remote player {}", id);
                    self.players
                        .insert(id.clone(), InterpolatedPlayer::new(id.clone(), player));
                }
            }
        }

        self.syncs += 1;
    }

    pub fn update(&mut self, delta_time: f32) {
        let damping = self.config.damping;
        for player in self.players.values_mut() {
            player.interpolator.step(delta_time, damping);
        }
        self.steps += 1;
        self.last_dt = delta_time;
    }

    pub fn get(&self, session_id: &str) -> Option<&InterpolatedPlayer> {
        self.players.get(session_id)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.players.contains_key(session_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &InterpolatedPlayer> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn reset(&mut self) {
        self.players.clear();
        self.syncs = 0;
        self.steps = 0;
        self.last_dt = 0.0;
    }

    pub fn debug_stats(&self) -> InterpolationStats {
        InterpolationStats {
            player_count: self.players.len(),
            hand_proxies: self
                .players
                .values()
                .filter(|p| p.interpolator.visible && p.interpolator.show_hands)
                .count(),
            syncs: self.syncs,
            steps: self.steps,
            last_dt: self.last_dt,
            damping: self.config.damping,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterpolationStats {
    pub player_count: usize,
    pub hand_proxies: usize,
    pub syncs: u64,
    pub steps: u64,
    pub last_dt: f32,
    pub damping: f32,
}
