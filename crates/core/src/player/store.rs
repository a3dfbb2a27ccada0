use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::net::PlayerState;

use super::pose::{PlayerPose, SessionId};

#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlayer {
    pub is_xr: bool,
    pub is_hand_tracking: bool,
    pub is_visible: bool,
    pub pose: PlayerPose,
}

impl From<&PlayerState> for RemotePlayer {
    fn from(state: &PlayerState) -> Self {
        let pose = PlayerPose::new(state.position.into(), state.rotation.into())
            .with_hands(state.left_hand(), state.right_hand());

        Self {
            is_xr: state.is_xr,
            is_hand_tracking: state.is_hand_tracking,
            is_visible: state.is_visible,
            pose,
        }
    }
}

pub type PlayerMap = HashMap<SessionId, RemotePlayer>;

#[derive(Debug, Default)]
struct StoreInner {
    players: RwLock<Arc<PlayerMap>>,
    version: AtomicU64,
}

/// Shared per-player store. Writers replace the map copy-on-write, so a
/// snapshot held by the render loop never changes underneath it.
#[derive(Debug, Clone, Default)]
pub struct PlayerStore {
    inner: Arc<StoreInner>,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<PlayerMap> {
        let guard = self
            .inner
            .players
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Bumped on every mutation; lets readers skip unchanged frames.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    pub fn upsert(&self, session_id: SessionId, player: RemotePlayer) {
        self.mutate(|players| {
            players.insert(session_id, player);
            true
        });
    }

    pub fn remove(&self, session_id: &str) -> bool {
        self.mutate(|players| players.remove(session_id).is_some())
    }

    pub fn clear(&self) {
        self.mutate(|players| {
            let had_players = !players.is_empty();
            players.clear();
            had_players
        });
    }

    pub fn get(&self, session_id: &str) -> Option<RemotePlayer> {
        self.snapshot().get(session_id).cloned()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.snapshot().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Remote players sorted by session id, never including `local`.
    pub fn remote_players(&self, local: Option<&str>) -> Vec<(SessionId, RemotePlayer)> {
        let snapshot = self.snapshot();
        let mut players: Vec<(SessionId, RemotePlayer)> = snapshot
            .iter()
            .filter(|(id, _)| Some(id.as_str()) != local)
            .map(|(id, player)| (id.clone(), player.clone()))
            .collect();
        players.sort_by(|a, b| a.0.cmp(&b.0));
        players
    }

    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut PlayerMap) -> bool,
    {
        let mut guard = self
            .inner
            .players
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let changed = f(Arc::make_mut(&mut guard));
        if changed {
            self.inner.version.fetch_add(1, Ordering::AcqRel);
        }
        changed
    }
}
