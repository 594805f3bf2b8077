use std::sync::Arc;
use std::time::Duration;

use babblefish_config::RoomSettings;
use babblefish_pipeline::{InferencePipeline, LanguageRegistry};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::info;

use crate::protocol::ErrorCode;
use crate::room::{spawn_room, JoinRejected, RoomHandle};

#[derive(Debug)]
pub enum RoomAdmission {
    RoomFull,
}

/// Owns every live `RoomHandle`, creates Rooms on first join, enforces the
/// global room cap, and reaps idle-expired rooms reported by their tasks.
///
/// Grounded on the teacher's `RoomManager` (a `DashMap<ObjectId, MediaRoom>`
/// plus a connection->room index), collapsed to a single `DashMap<String,
/// RoomHandle>` since this core has no separate media-transport layer to
/// track alongside the room.
pub struct RoomManager {
    rooms: DashMap<String, RoomHandle>,
    settings: RoomSettings,
    utterance_hard_cap_seconds: f64,
    registry: Arc<LanguageRegistry>,
    pipeline: Arc<InferencePipeline>,
    reaper_tx: mpsc::UnboundedSender<String>,
}

impl RoomManager {
    pub fn new(
        settings: RoomSettings,
        utterance_hard_cap_seconds: f64,
        registry: Arc<LanguageRegistry>,
        pipeline: Arc<InferencePipeline>,
    ) -> Arc<Self> {
        let (reaper_tx, mut reaper_rx) = mpsc::unbounded_channel::<String>();
        let manager = Arc::new(Self {
            rooms: DashMap::new(),
            settings,
            utterance_hard_cap_seconds,
            registry,
            pipeline,
            reaper_tx,
        });

        let reaper_manager = Arc::clone(&manager);
        tokio::spawn(async move {
            while let Some(room_id) = reaper_rx.recv().await {
                reaper_manager.rooms.remove(&room_id);
                info!(room_id, "room reaped after idle timeout");
            }
        });

        manager
    }

    /// Returns the handle for `room_id`, creating the room if it doesn't
    /// exist yet. Enforces `max_rooms` at creation time only — an existing
    /// room is always reachable for a rejoin regardless of current load.
    pub fn get_or_create(&self, room_id: &str) -> Result<RoomHandle, RoomAdmission> {
        if let Some(handle) = self.rooms.get(room_id) {
            return Ok(handle.clone());
        }

        if self.rooms.len() >= self.settings.max_rooms {
            return Err(RoomAdmission::RoomFull);
        }

        let handle = spawn_room(
            room_id.to_string(),
            self.settings.max_participants_per_room,
            Duration::from_secs(self.settings.room_timeout_seconds),
            Arc::clone(&self.registry),
            Arc::clone(&self.pipeline),
            self.utterance_hard_cap_seconds,
            self.reaper_tx.clone(),
        );

        info!(room_id, "room created");
        self.rooms.insert(room_id.to_string(), handle.clone());
        Ok(handle)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Free permits on the shared pipeline, for the health endpoint.
    pub fn available_pipeline_permits(&self) -> usize {
        self.pipeline.available_permits()
    }
}

pub fn join_rejected_message(reason: &JoinRejected) -> (ErrorCode, String) {
    match reason {
        JoinRejected::RoomFull => (
            ErrorCode::RoomFull,
            "Room is full (max participants reached)".to_string(),
        ),
        JoinRejected::UnsupportedLanguage(lang) => (
            ErrorCode::UnsupportedLanguage,
            format!("Unsupported language: {lang}"),
        ),
    }
}
