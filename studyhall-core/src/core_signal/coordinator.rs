//! Session coordinator
//!
//! Tracks who is in which signaling room and routes join/leave events; media
//! never passes through here. Rooms live in a map behind an `RwLock`, each
//! room guarded by its own mutex, so unrelated rooms never contend. The
//! in-memory membership is the live source of truth; persisted session and
//! participant rows are audit history.

use crate::core_content::code::{generate_code, CODE_RETRY_BUDGET};
use crate::core_content::{ClassroomService, ContentError};
use crate::core_model::VideoSession;
use crate::core_policy::Actor;
use metrics::{counter, gauge};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{info, warn};

use super::error::SignalError;
use super::events::{ClientId, CreateSessionRequest, JoinSessionRequest, SignalEvent};
use super::room::{Room, RoomMember};

struct ClientState {
    sender: mpsc::UnboundedSender<SignalEvent>,
    rooms: Vec<String>,
}

pub struct SessionCoordinator {
    service: Arc<ClassroomService>,
    rooms: RwLock<HashMap<String, Arc<Mutex<Room>>>>,
    clients: Mutex<HashMap<ClientId, ClientState>>,
    next_client_id: AtomicU64,
}

fn events_room_key(classroom_code: &str) -> String {
    format!("{}-events", classroom_code)
}

impl SessionCoordinator {
    pub fn new(service: Arc<ClassroomService>) -> Self {
        Self {
            service,
            rooms: RwLock::new(HashMap::new()),
            clients: Mutex::new(HashMap::new()),
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Register a client connection; events arrive on the returned receiver
    pub async fn connect(&self) -> (ClientId, mpsc::UnboundedReceiver<SignalEvent>) {
        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.lock().await.insert(
            id,
            ClientState {
                sender: tx,
                rooms: Vec::new(),
            },
        );
        gauge!("signal.clients.connected").increment(1.0);
        (id, rx)
    }

    /// Subscribe to a classroom's event channel. Membership is not
    /// re-validated here; it is enforced where sessions are created and
    /// joined.
    pub async fn subscribe_classroom_events(
        &self,
        client: ClientId,
        classroom_code: &str,
    ) -> Result<(), SignalError> {
        if classroom_code.trim().is_empty() {
            return Err(SignalError::BadRequest(
                "classroom code is required".to_string(),
            ));
        }
        self.join_room(&events_room_key(classroom_code), client, None)
            .await
    }

    /// Open a live session: persist the row, put the creator in the session
    /// room, and announce it on the classroom's event channel
    pub async fn create_session(
        &self,
        client: ClientId,
        actor: &Actor,
        request: CreateSessionRequest,
    ) -> Result<VideoSession, SignalError> {
        request.validate()?;
        let classroom = self
            .service
            .find_classroom(actor, &request.classroom_code)?;

        let session = self.allocate_session(actor, classroom.id).await?;

        self.join_room(&session.code, client, Some(request.peer_id.clone()))
            .await?;

        // Everyone watching the classroom hears about it, except the creator.
        let announcement = SignalEvent::SessionCreated {
            classroom_code: classroom.code.clone(),
            session_code: session.code.clone(),
        };
        if let Some(room) = self.room(&events_room_key(&classroom.code)).await {
            room.lock().await.broadcast_excluding(client, &announcement);
        }

        counter!("signal.sessions.created").increment(1);
        info!(session = %session.code, classroom = %classroom.code, "live session opened");
        Ok(session)
    }

    /// Join a live session room; existing members hear the joiner's peer id
    pub async fn join_session(
        &self,
        client: ClientId,
        actor: &Actor,
        request: JoinSessionRequest,
    ) -> Result<VideoSession, SignalError> {
        request.validate()?;
        let session = self
            .service
            .find_video_session(Some(actor), &request.session_code)?;

        // The live room is the source of truth; a session with no room has
        // ended even if its audit row survives.
        let room = self
            .room(&session.code)
            .await
            .ok_or_else(|| SignalError::NotFound("session".to_string()))?;

        let sender = self.track_room(client, &session.code).await?;
        {
            let mut guard = room.lock().await;
            if !guard.contains(client) {
                guard.broadcast_excluding(
                    client,
                    &SignalEvent::ParticipantJoined {
                        session_code: session.code.clone(),
                        peer_id: request.peer_id.clone(),
                    },
                );
                guard.join(RoomMember {
                    client,
                    peer_id: Some(request.peer_id.clone()),
                    sender,
                });
            }
        }

        // Best-effort audit trail; the live set above is authoritative.
        match self.service.session_membership(actor, &session) {
            Ok(Some(member)) => {
                if let Err(e) = self.service.record_participant(session.id, member.id) {
                    warn!(session = %session.code, error = %e, "participant audit row failed");
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(session = %session.code, error = %e, "participant audit lookup failed")
            }
        }

        counter!("signal.sessions.joined").increment(1);
        Ok(session)
    }

    /// Drop a client from every room it occupies, announcing its departure
    /// to each session room it was in. The only cancellation signal.
    pub async fn disconnect(&self, client: ClientId) {
        let state = self.clients.lock().await.remove(&client);
        let Some(state) = state else { return };
        gauge!("signal.clients.connected").decrement(1.0);

        for key in state.rooms {
            let Some(room) = self.room(&key).await else {
                continue;
            };

            let empty = {
                let mut guard = room.lock().await;
                if let Some(member) = guard.remove(client) {
                    if let Some(peer_id) = member.peer_id {
                        guard.broadcast_excluding(
                            client,
                            &SignalEvent::ParticipantLeft {
                                session_code: key.clone(),
                                peer_id,
                            },
                        );
                    }
                }
                guard.is_empty()
            };

            if empty {
                self.drop_room_if_empty(&key).await;
            }
        }
    }

    /// Number of live rooms, event channels included
    pub async fn active_rooms(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Live member count of one session room
    pub async fn room_size(&self, session_code: &str) -> usize {
        match self.room(session_code).await {
            Some(room) => room.lock().await.len(),
            None => 0,
        }
    }

    /// Fresh session code, collision-checked against the live room set and
    /// the persisted code namespace
    async fn allocate_session(
        &self,
        actor: &Actor,
        classroom_id: crate::core_model::ClassroomId,
    ) -> Result<VideoSession, SignalError> {
        for _ in 0..CODE_RETRY_BUDGET {
            let code = generate_code();
            if self.rooms.read().await.contains_key(&code) {
                continue;
            }
            match self.service.create_video_session(actor, classroom_id, &code) {
                Ok(session) => return Ok(session),
                Err(ContentError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ContentError::CodeGenerationExhausted.into())
    }

    async fn room(&self, key: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(key).cloned()
    }

    /// Record the room key on the client and hand back its sender
    async fn track_room(
        &self,
        client: ClientId,
        key: &str,
    ) -> Result<mpsc::UnboundedSender<SignalEvent>, SignalError> {
        let mut clients = self.clients.lock().await;
        let state = clients.get_mut(&client).ok_or(SignalError::Closed)?;
        if !state.rooms.iter().any(|k| k == key) {
            state.rooms.push(key.to_string());
        }
        Ok(state.sender.clone())
    }

    async fn join_room(
        &self,
        key: &str,
        client: ClientId,
        peer_id: Option<String>,
    ) -> Result<(), SignalError> {
        let sender = self.track_room(client, key).await?;
        let room = {
            let mut rooms = self.rooms.write().await;
            rooms
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Room::default())))
                .clone()
        };
        room.lock().await.join(RoomMember {
            client,
            peer_id,
            sender,
        });
        Ok(())
    }

    async fn drop_room_if_empty(&self, key: &str) {
        let Some(room) = self.room(key).await else {
            return;
        };
        if !room.lock().await.is_empty() {
            return;
        }

        // Re-check under the write lock without awaiting inside it; a held
        // room lock means a join is in flight, so leave the room alone.
        let mut rooms = self.rooms.write().await;
        let still_empty = match rooms.get(key) {
            Some(current) => current
                .try_lock()
                .map(|guard| guard.is_empty())
                .unwrap_or(false),
            None => false,
        };
        if still_empty {
            rooms.remove(key);
        }
    }
}
