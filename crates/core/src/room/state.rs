use std::collections::HashMap;

use crate::net::{PlayerState, ServerMessage};
use crate::player::SessionId;

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Added {
        session_id: SessionId,
        player: PlayerState,
    },
    Changed {
        session_id: SessionId,
        player: PlayerState,
    },
    Removed {
        session_id: SessionId,
    },
    /// The room view was dropped wholesale (disconnect or reconnect).
    Reset,
}

impl RoomEvent {
    pub fn from_server(message: ServerMessage) -> Option<Self> {
        match message {
            ServerMessage::PlayerAdd { session_id, player } => {
                Some(RoomEvent::Added { session_id, player })
            }
            ServerMessage::PlayerChange { session_id, player } => {
                Some(RoomEvent::Changed { session_id, player })
            }
            ServerMessage::PlayerRemove { session_id } => Some(RoomEvent::Removed { session_id }),
            ServerMessage::Joined { .. } | ServerMessage::JoinError { .. } => None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            RoomEvent::Added { session_id, .. }
            | RoomEvent::Changed { session_id, .. }
            | RoomEvent::Removed { session_id } => Some(session_id),
            RoomEvent::Reset => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::Added { .. } => "add",
            RoomEvent::Changed { .. } => "change",
            RoomEvent::Removed { .. } => "remove",
            RoomEvent::Reset => "reset",
        }
    }
}

/// Client-side mirror of the room's keyed player collection.
#[derive(Debug, Clone, Default)]
pub struct RoomState {
    players: HashMap<SessionId, PlayerState>,
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the event had no effect (removing an unknown id).
    pub fn apply(&mut self, event: &RoomEvent) -> bool {
        match event {
            RoomEvent::Added { session_id, player } | RoomEvent::Changed { session_id, player } => {
                self.players.insert(session_id.clone(), player.clone());
                true
            }
            RoomEvent::Removed { session_id } => self.players.remove(session_id).is_some(),
            RoomEvent::Reset => {
                let had_players = !self.players.is_empty();
                self.players.clear();
                had_players
            }
        }
    }

    pub fn get(&self, session_id: &str) -> Option<&PlayerState> {
        self.players.get(session_id)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.players.contains_key(session_id)
    }

    pub fn players(&self) -> impl Iterator<Item = (&SessionId, &PlayerState)> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Replays the current contents as `Added` events, sorted by id.
    pub fn as_added_events(&self) -> Vec<RoomEvent> {
        let mut ids: Vec<&SessionId> = self.players.keys().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| RoomEvent::Added {
                session_id: id.clone(),
                player: self.players[id].clone(),
            })
            .collect()
    }
}
