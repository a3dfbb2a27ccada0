use std::sync::{Arc, PoisonError, RwLock};

use crate::room::RoomEvent;

use super::pose::SessionId;
use super::store::{PlayerStore, RemotePlayer};

/// Projects room change events into the player store, one entry per remote
/// session. Cheap enough to run inside a network callback.
#[derive(Debug, Clone)]
pub struct Reconciler {
    store: PlayerStore,
    local_session: Arc<RwLock<Option<SessionId>>>,
}

impl Reconciler {
    pub fn new(store: PlayerStore) -> Self {
        Self {
            store,
            local_session: Arc::new(RwLock::new(None)),
        }
    }

    pub fn store(&self) -> &PlayerStore {
        &self.store
    }

    pub fn local_session(&self) -> Option<SessionId> {
        self.local_session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Also evicts an entry stored for the local id before it was known. The
    /// id is published and the entry evicted under one write guard, so no
    /// concurrent `handle` can slip the local session back in.
    pub fn set_local_session(&self, session_id: Option<SessionId>) {
        let mut local = self
            .local_session
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = &session_id {
            if self.store.remove(id) {
                log::debug!("Evicted echoed local session {}", id);
            }
        }
        *local = session_id;
    }

    pub fn handle(&self, event: &RoomEvent) {
        // held until the store write lands
        let local = self
            .local_session
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = event.session_id() {
            if local.as_deref() == Some(id) {
                return;
            }
        }

        match event {
            RoomEvent::Added { session_id, player } => {
                log::debug!("Player {} joined", session_id);
                self.store
                    .upsert(session_id.clone(), RemotePlayer::from(player));
            }
            RoomEvent::Changed { session_id, player } => {
                self.store
                    .upsert(session_id.clone(), RemotePlayer::from(player));
            }
            RoomEvent::Removed { session_id } => {
                if self.store.remove(session_id) {
                    log::debug!("Player {} left", session_id);
                }
            }
            RoomEvent::Reset => {
                self.store.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{PlayerState, WireVec3};
    use crate::player::HandSample;

    fn state(x: f32) -> PlayerState {
        PlayerState {
            position: WireVec3::new(x, 1.6, 0.0),
            ..Default::default()
        }
    }

    fn added(id: &str, x: f32) -> RoomEvent {
        RoomEvent::Added {
            session_id: id.into(),
            player: state(x),
        }
    }

    #[test]
    fn test_lifecycle() {
        let reconciler = Reconciler::new(PlayerStore::new());

        reconciler.handle(&added("a", 1.0));
        assert!(reconciler.store().contains("a"));

        reconciler.handle(&RoomEvent::Changed {
            session_id: "a".into(),
            player: state(4.0),
        });
        assert_eq!(reconciler.store().get("a").unwrap().pose.position.x, 4.0);

        reconciler.handle(&RoomEvent::Removed {
            session_id: "a".into(),
        });
        assert!(!reconciler.store().contains("a"));
    }

    #[test]
    fn test_change_replaces_whole_entry() {
        let reconciler = Reconciler::new(PlayerStore::new());
        let mut with_hand = state(0.0);
        with_hand.is_xr = true;
        with_hand.left_hand_position = Some(WireVec3::new(-0.2, 1.2, -0.3));
        with_hand.left_hand_rotation = Some(WireVec3::default());

        reconciler.handle(&RoomEvent::Added {
            session_id: "a".into(),
            player: with_hand,
        });
        assert!(reconciler.store().get("a").unwrap().pose.left_hand.is_tracked());

        reconciler.handle(&RoomEvent::Changed {
            session_id: "a".into(),
            player: state(1.0),
        });
        let entry = reconciler.store().get("a").unwrap();
        assert_eq!(entry.pose.left_hand, HandSample::Untracked);
        assert!(!entry.is_xr);
    }

    #[test]
    fn test_local_session_is_never_stored() {
        let reconciler = Reconciler::new(PlayerStore::new());
        reconciler.handle(&added("me", 0.0));
        reconciler.handle(&added("other", 1.0));

        reconciler.set_local_session(Some("me".into()));
        assert!(!reconciler.store().contains("me"));

        reconciler.handle(&RoomEvent::Changed {
            session_id: "me".into(),
            player: state(9.0),
        });
        assert!(!reconciler.store().contains("me"));
        assert!(reconciler.store().contains("other"));
    }

    #[test]
    fn test_concurrent_echo_cannot_outlive_local_id() {
        for _ in 0..200 {
            let reconciler = Reconciler::new(PlayerStore::new());
            let echo = reconciler.clone();

            std::thread::scope(|scope| {
                scope.spawn(|| {
                    for i in 0..200 {
                        echo.handle(&added("me", i as f32));
                    }
                });
                reconciler.set_local_session(Some("me".into()));
            });

            assert!(!reconciler.store().contains("me"));
        }
    }

    #[test]
    fn test_reset_clears_store() {
        let reconciler = Reconciler::new(PlayerStore::new());
        reconciler.handle(&added("a", 0.0));
        reconciler.handle(&added("b", 0.0));

        reconciler.handle(&RoomEvent::Reset);
        assert!(reconciler.store().is_empty());
    }
}
