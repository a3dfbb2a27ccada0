use std::time::Instant;

use llmeta::{
    InterpolationConfig, InterpolationEngine, ListenerId, OutboundSync, PlayerStore, ProfileData,
    ProfileTracker, Reconciler, SessionId, TransformSampler, TransformSource,
};

use super::config::ClientConfig;
use super::error::SessionError;
use super::session::NetworkSession;
use super::stats::SessionStats;

/// Owns everything one view of the room needs: the session, the shared
/// player store fed by the reconciler, outbound pacing and the interpolators.
#[derive(Debug)]
pub struct SyncClient {
    config: ClientConfig,
    session: NetworkSession,
    reconciler: Reconciler,
    listener: Option<ListenerId>,
    sampler: TransformSampler,
    outbound: OutboundSync,
    profile: ProfileData,
    profile_tracker: ProfileTracker,
    engine: InterpolationEngine,
    synced_version: Option<u64>,
    shut_down: bool,
}

impl SyncClient {
    pub fn new(config: ClientConfig) -> Result<Self, SessionError> {
        config.validate()?;

        Ok(Self {
            session: NetworkSession::new(config.clone()),
            reconciler: Reconciler::new(PlayerStore::new()),
            listener: None,
            sampler: TransformSampler::new(false),
            outbound: OutboundSync::new(&config.sync),
            profile: ProfileData::desktop(),
            profile_tracker: ProfileTracker::new(),
            engine: InterpolationEngine::new(InterpolationConfig::from(&config.sync)),
            synced_version: None,
            shut_down: false,
            config,
        })
    }

    pub async fn connect(&mut self) -> Result<SessionId, SessionError> {
        self.shut_down = false;
        self.clear_local_state();

        if self.listener.is_none() {
            let reconciler = self.reconciler.clone();
            self.listener = Some(self.session.add_listener(move |event| reconciler.handle(event)));
        }

        let room_name = self.config.sync.room_name.clone();
        let session_id = self.session.connect(&room_name).await?;
        self.reconciler.set_local_session(Some(session_id.clone()));

        if let Some(message) = self.profile_tracker.update(self.profile) {
            self.session.send(message);
        }

        Ok(session_id)
    }

    pub fn set_profile(&mut self, profile: ProfileData) {
        self.profile = profile;
        self.sampler.xr = profile.is_xr;

        if self.session.is_connected() {
            if let Some(message) = self.profile_tracker.update(profile) {
                self.session.send(message);
            }
        }
    }

    /// One render tick: pace the local pose out, pick up store changes and
    /// advance every remote avatar by `delta_time` seconds.
    pub fn frame(
        &mut self,
        delta_time: f32,
        now: Instant,
        source: &dyn TransformSource,
    ) -> &InterpolationEngine {
        if self.session.is_connected() {
            let sample = self.sampler.sample(source);
            if let Some(message) = self.outbound.sample(now, sample) {
                self.session.send(message);
            }
        }

        let store = self.reconciler.store();
        let version = store.version();
        if self.synced_version != Some(version) {
            let local = self.reconciler.local_session();
            self.engine.sync(&store.snapshot(), local.as_deref());
            self.synced_version = Some(version);
        }

        self.engine.update(delta_time);
        &self.engine
    }

    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Some(id) = self.listener.take() {
            self.session.remove_listener(id);
        }
        self.session.disconnect();
        self.clear_local_state();
        log::info!("Sync client shut down");
    }

    /// Like [`shutdown`](Self::shutdown), but returns only after `LEAVE` has
    /// been written and the socket closed.
    pub async fn close(&mut self) {
        self.shutdown();
        self.session.close().await;
    }

    fn clear_local_state(&mut self) {
        self.reconciler.set_local_session(None);
        self.reconciler.store().clear();
        self.engine.reset();
        self.outbound.reset();
        self.profile_tracker.reset();
        self.synced_version = None;
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn session(&self) -> &NetworkSession {
        &self.session
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.session_id()
    }

    pub fn store(&self) -> &PlayerStore {
        self.reconciler.store()
    }

    pub fn engine(&self) -> &InterpolationEngine {
        &self.engine
    }

    pub fn profile(&self) -> ProfileData {
        self.profile
    }

    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use llmeta::{Euler, PlayerState, RoomEvent, WireVec3};

    struct Still;

    impl TransformSource for Still {
        fn camera_world_position(&self) -> Vec3 {
            Vec3::new(0.0, 1.6, 0.0)
        }

        fn camera_world_rotation(&self) -> Quat {
            Quat::IDENTITY
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ClientConfig::default();
        config.sync.send_interval_ms = 0;

        assert!(matches!(
            SyncClient::new(config),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn test_frame_without_connection_tracks_store() {
        let mut client = SyncClient::new(ClientConfig::default()).unwrap();
        client.reconciler.handle(&RoomEvent::Added {
            session_id: "remote".into(),
            player: PlayerState {
                position: WireVec3::new(2.0, 1.6, 0.0),
                rotation: Euler::ZERO.into(),
                ..Default::default()
            },
        });

        let engine = client.frame(1.0 / 60.0, Instant::now(), &Still);
        assert_eq!(engine.len(), 1);
        assert_eq!(
            engine.get("remote").unwrap().transforms().head.position.x,
            2.0
        );
        assert_eq!(client.stats().messages_dropped, 0);
    }

    #[test]
    fn test_shutdown_clears_everything_once() {
        let mut client = SyncClient::new(ClientConfig::default()).unwrap();
        client.reconciler.handle(&RoomEvent::Added {
            session_id: "remote".into(),
            player: PlayerState::default(),
        });
        client.frame(1.0 / 60.0, Instant::now(), &Still);

        client.shutdown();
        client.shutdown();

        assert!(client.store().is_empty());
        assert!(client.engine().is_empty());
        assert!(client.session_id().is_none());
    }

    #[test]
    fn test_profile_is_held_until_connected() {
        let mut client = SyncClient::new(ClientConfig::default()).unwrap();
        client.set_profile(ProfileData::xr(true));

        assert_eq!(client.profile(), ProfileData::xr(true));
        assert!(client.profile_tracker.last_sent().is_none());
        assert_eq!(client.stats().messages_dropped, 0);
    }
}
