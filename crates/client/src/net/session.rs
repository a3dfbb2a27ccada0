use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use llmeta::{
    ClientMessage, ListenerId, Listeners, RoomEvent, RoomState, ServerMessage, SessionId,
};

use super::config::ClientConfig;
use super::endpoint::room_url;
use super::error::SessionError;
use super::stats::{ConnectionState, SessionStats};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketWriter = SplitSink<Socket, Message>;
type SocketReader = SplitStream<Socket>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct Shared {
    state: Mutex<ConnectionState>,
    session_id: RwLock<Option<SessionId>>,
    room: RwLock<Arc<RoomState>>,
    listeners: Mutex<Listeners>,
    stats: Mutex<SessionStats>,
    generation: AtomicU64,
    /// Serializes generation changes against room updates and their emission.
    events: Mutex<()>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(ConnectionState::Disconnected),
            session_id: RwLock::new(None),
            room: RwLock::new(Arc::new(RoomState::new())),
            listeners: Mutex::new(Listeners::new()),
            stats: Mutex::new(SessionStats::default()),
            generation: AtomicU64::new(0),
            events: Mutex::new(()),
        }
    }

    fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    fn set_state(&self, state: ConnectionState) {
        *lock(&self.state) = state;
    }

    fn set_session_id(&self, session_id: Option<SessionId>) {
        *self
            .session_id
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session_id;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Retires the current generation and drops everything tied to it.
    /// Returns the new generation.
    fn advance(&self) -> u64 {
        let _order = lock(&self.events);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.reset();
        generation
    }

    /// Clears the session only if no newer generation has taken over.
    fn clear_if_current(&self, generation: u64) {
        let _order = lock(&self.events);
        if self.is_current(generation) {
            self.reset();
        }
    }

    /// Applies a room event unless its generation was retired. Nothing from a
    /// retired generation can land after the `Reset` that retired it.
    fn apply_if_current(&self, generation: u64, event: RoomEvent) -> bool {
        let _order = lock(&self.events);
        if !self.is_current(generation) {
            return false;
        }
        self.apply(event);
        true
    }

    fn reset(&self) {
        self.set_session_id(None);
        self.set_state(ConnectionState::Disconnected);
        self.apply(RoomEvent::Reset);
    }

    fn apply(&self, event: RoomEvent) {
        {
            let mut room = self.room.write().unwrap_or_else(PoisonError::into_inner);
            Arc::make_mut(&mut room).apply(&event);
        }
        log::debug!(
            "Room event {} {}",
            event.kind(),
            event.session_id().unwrap_or("-")
        );
        let listeners = lock(&self.listeners).snapshot();
        for listener in listeners {
            listener(&event);
        }
    }

    fn handle_frame(&self, text: &str) -> Option<ServerMessage> {
        lock(&self.stats).record_received(text.len());
        match ServerMessage::decode(text) {
            Ok(message) => Some(message),
            Err(e) => {
                log::warn!("Skipping malformed frame: {}", e);
                lock(&self.stats).malformed_frames += 1;
                None
            }
        }
    }
}

/// One connection to one room. Room state and listeners live here; the socket
/// itself is driven by a background task.
#[derive(Debug)]
pub struct NetworkSession {
    config: ClientConfig,
    shared: Arc<Shared>,
    cmd_tx: Option<mpsc::UnboundedSender<ClientMessage>>,
    task: Option<JoinHandle<()>>,
}

impl NetworkSession {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared::new()),
            cmd_tx: None,
            task: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn connect(&mut self, room_name: &str) -> Result<SessionId, SessionError> {
        if self.cmd_tx.is_some() || self.task.is_some() {
            log::info!("Leaving current room before joining {}", room_name);
            self.shared.set_state(ConnectionState::Disconnecting);
            self.disconnect();
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Previous socket task ended abnormally: {}", e);
            }
        }

        let generation = self.shared.advance();
        self.shared.set_state(ConnectionState::Connecting);

        match self.open(room_name, generation).await {
            Ok((session_id, writer, reader)) => {
                let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
                self.shared.set_session_id(Some(session_id.clone()));
                self.shared.set_state(ConnectionState::Connected);
                self.cmd_tx = Some(cmd_tx);
                self.task = Some(tokio::spawn(run_socket(
                    Arc::clone(&self.shared),
                    generation,
                    writer,
                    reader,
                    cmd_rx,
                )));
                log::info!("Joined room {} as {}", room_name, session_id);
                Ok(session_id)
            }
            Err(e) => {
                log::warn!("Failed to join room {}: {}", room_name, e);
                self.shared.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    async fn open(
        &self,
        room_name: &str,
        generation: u64,
    ) -> Result<(SessionId, SocketWriter, SocketReader), SessionError> {
        let url = room_url(&self.config.sync.endpoint, room_name)?;
        log::info!("Connecting to {}", url);

        let (socket, _) = connect_async(url.as_str()).await?;
        let (mut writer, mut reader) = socket.split();

        let timeout = self.config.join_timeout;
        let joined = tokio::time::timeout(timeout, self.await_join(&mut reader, generation)).await;
        match joined {
            Ok(Ok(session_id)) => Ok((session_id, writer, reader)),
            Ok(Err(e)) => {
                let _ = writer.close().await;
                Err(e)
            }
            Err(_) => {
                let _ = writer.close().await;
                Err(SessionError::JoinTimeout(timeout))
            }
        }
    }

    async fn await_join(
        &self,
        reader: &mut SocketReader,
        generation: u64,
    ) -> Result<SessionId, SessionError> {
        while let Some(frame) = reader.next().await {
            match frame? {
                Message::Text(text) => match self.shared.handle_frame(text.as_str()) {
                    Some(ServerMessage::Joined { session_id, .. }) => return Ok(session_id),
                    Some(ServerMessage::JoinError { reason }) => {
                        return Err(SessionError::JoinRejected(reason));
                    }
                    Some(message) => {
                        if let Some(event) = RoomEvent::from_server(message) {
                            self.shared.apply_if_current(generation, event);
                        }
                    }
                    None => {}
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
        Err(SessionError::ClosedBeforeJoin)
    }

    /// Leaves the room if joined. Safe to call at any time. Room state is
    /// empty once this returns; `LEAVE` is flushed by the socket task, so use
    /// [`close`](Self::close) when the runtime is about to go away.
    pub fn disconnect(&mut self) {
        let was_active = self.cmd_tx.is_some();
        self.shared.advance();

        if let Some(cmd_tx) = self.cmd_tx.take() {
            let _ = cmd_tx.send(ClientMessage::Leave);
        }
        if was_active {
            log::info!("Disconnected from room");
        }
    }

    /// Disconnects and waits for the socket task to send `LEAVE` and close.
    pub async fn close(&mut self) {
        if self.cmd_tx.is_some() {
            self.disconnect();
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Socket task ended abnormally: {}", e);
            }
        }
    }

    pub fn send(&self, message: ClientMessage) {
        let delivered = match (&self.cmd_tx, self.shared.state()) {
            (Some(cmd_tx), ConnectionState::Connected) => cmd_tx.send(message).is_ok(),
            _ => false,
        };
        if !delivered {
            log::warn!("Dropping outbound message while not connected");
            lock(&self.shared.stats).messages_dropped += 1;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.shared.state() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.shared
            .session_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn room(&self) -> Arc<RoomState> {
        let room = self
            .shared
            .room
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&room)
    }

    /// Listeners run on the socket task; keep them to cheap state updates.
    /// They are called with no registry lock held, so adding or removing
    /// listeners from inside one is allowed and takes effect on the next event.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RoomEvent) + Send + Sync + 'static,
    {
        lock(&self.shared.listeners).add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        lock(&self.shared.listeners).remove(id)
    }

    pub fn stats(&self) -> SessionStats {
        lock(&self.shared.stats).clone()
    }
}

impl Drop for NetworkSession {
    fn drop(&mut self) {
        if let Some(cmd_tx) = self.cmd_tx.take() {
            self.shared.generation.fetch_add(1, Ordering::AcqRel);
            let _ = cmd_tx.send(ClientMessage::Leave);
        }
    }
}

async fn run_socket(
    shared: Arc<Shared>,
    generation: u64,
    mut writer: SocketWriter,
    mut reader: SocketReader,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientMessage>,
) {
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(message) = cmd else {
                    let _ = writer.close().await;
                    break;
                };
                let leaving = matches!(message, ClientMessage::Leave);
                let text = match message.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("Failed to encode {}: {}", message.kind(), e);
                        continue;
                    }
                };
                let bytes = text.len();
                if let Err(e) = writer.send(Message::Text(text.into())).await {
                    log::warn!("Socket send failed: {}", e);
                    break;
                }
                lock(&shared.stats).record_sent(bytes);
                if leaving {
                    let _ = writer.close().await;
                    break;
                }
            }

            frame = reader.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !shared.is_current(generation) {
                            continue;
                        }
                        // the generation is checked again under the event lock
                        match shared.handle_frame(text.as_str()) {
                            Some(ServerMessage::Joined { .. } | ServerMessage::JoinError { .. }) => {
                                log::debug!("Ignoring join reply on an open session");
                            }
                            Some(message) => {
                                if let Some(event) = RoomEvent::from_server(message) {
                                    shared.apply_if_current(generation, event);
                                }
                            }
                            None => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        log::info!("Room closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::warn!("Socket error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    shared.clear_if_current(generation);
}
