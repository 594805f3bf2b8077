use serde::{Deserialize, Serialize};

/// Inbound client -> server message, discriminated by `type`.
///
/// `Serialize` is derived alongside `Deserialize` so integration tests can
/// construct and send these directly instead of hand-building JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        room_id: String,
        language: String,
        name: String,
        #[serde(default)]
        capabilities: Option<serde_json::Value>,
    },
    Audio {
        data: String,
        timestamp: u64,
    },
    UtteranceEnd {
        timestamp: u64,
    },
    Leave,
    Ping,
}

/// Outbound server -> client message, discriminated by `type`.
///
/// `Deserialize` is derived alongside `Serialize` so integration tests can
/// decode what the server sent instead of matching on raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined {
        room_id: String,
        participant_id: String,
        participants: Vec<ParticipantView>,
    },
    ParticipantJoined {
        participant: ParticipantView,
    },
    ParticipantLeft {
        participant_id: String,
    },
    Translation {
        speaker_id: String,
        speaker_name: String,
        source_lang: String,
        source_text: String,
        translations: std::collections::HashMap<String, String>,
        timestamp: u64,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
    Pong,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RoomFull,
    PipelineError,
    InvalidMessage,
    UnsupportedLanguage,
    Unauthorized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: String,
    pub name: String,
    pub language: String,
}

/// Longest `name` accepted at `join`, per §6 "bounded length".
pub const MAX_NAME_LEN: usize = 64;

/// `room_id` must match `[A-Z2-9]{6}` exactly (§6). The transport itself
/// would accept any string; this validation is fixed at join time (§9).
pub fn is_valid_room_id(room_id: &str) -> bool {
    room_id.len() == 6
        && room_id
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'9').contains(&b))
}

pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= MAX_NAME_LEN
}
