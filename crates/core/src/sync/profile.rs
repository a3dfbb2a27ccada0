use crate::net::ClientMessage;
use crate::player::ProfileData;

/// Emits `CHANGE_PROFILE` only when the local profile actually changes.
#[derive(Debug, Default)]
pub struct ProfileTracker {
    last_sent: Option<ProfileData>,
}

impl ProfileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, profile: ProfileData) -> Option<ClientMessage> {
        if self.last_sent == Some(profile) {
            return None;
        }
        self.last_sent = Some(profile);
        Some(ClientMessage::ChangeProfile(profile.into()))
    }

    pub fn last_sent(&self) -> Option<ProfileData> {
        self.last_sent
    }

    /// Forget what was sent so the next update goes out again.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}
