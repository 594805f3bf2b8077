use std::sync::Arc;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::protocol::{ClientMessage, ErrorCode, ServerMessage, is_valid_name, is_valid_room_id};
use crate::room::RoomHandle;
use crate::room_manager::{RoomAdmission, join_rejected_message};
use crate::send_queue::SendQueue;
use crate::state::AppState;

/// Per-connection outbound queue depth. Sized generously since `translation`
/// traffic is droppable (§5/§7) — this only needs to absorb a burst, not
/// every message ever produced.
const SEND_QUEUE_CAPACITY: usize = 64;

/// A pre-join connection that sends anything other than `join`, or a joined
/// one that sends `join` again, past this many offenses is closed. The spec
/// leaves "repeated offenders may be closed" (§7) to the implementation.
const INVALID_MESSAGE_CLOSE_THRESHOLD: u32 = 5;

/// Per-connection state machine, independent of the Room's own participant
/// state machine (§4.4) — this one only tracks whether the socket has
/// completed `join` yet.
enum Connection {
    PreJoin,
    Joined {
        room: RoomHandle,
        participant_id: String,
    },
    /// The participant issued `leave`; the socket is still open (so a
    /// repeated `leave` can be answered idempotently, per (L2)) but carries
    /// no further room presence.
    Left,
}

pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let send_queue = SendQueue::new(SEND_QUEUE_CAPACITY);

    let writer_queue = Arc::clone(&send_queue);
    let mut writer = tokio::spawn(async move {
        loop {
            let msg = writer_queue.recv().await;
            let text = serde_json::to_string(&msg).expect("ServerMessage always serializes");
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut conn = Connection::PreJoin;
    let mut invalid_messages = 0u32;

    loop {
        let next = tokio::time::timeout(state.idle_connection_timeout, stream.next()).await;

        let frame = match next {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                warn!(error = %e, "websocket read error");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                info!("idle connection timeout reached, closing");
                break;
            }
        };

        match frame {
            Message::Text(text) => {
                let keep_going = handle_text(
                    &state,
                    &send_queue,
                    &mut conn,
                    &mut invalid_messages,
                    text.as_str(),
                )
                .await;
                if !keep_going {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {
                // The wire protocol carries audio as base64 inside `audio`
                // JSON frames (§6); raw binary/control frames outside the
                // JSON envelope are not part of the schema. axum answers
                // protocol-level ping/pong itself before this loop sees it.
            }
        }
    }

    if let Connection::Joined {
        room,
        participant_id,
    } = &conn
    {
        room.leave(participant_id.clone()).await;
    }

    writer.abort();
}

/// Handles one inbound text frame. Returns `false` when the connection
/// should be closed: either a repeated-offender cutoff on invalid messages,
/// or a critical server message that couldn't be queued for delivery and
/// the participant must therefore be forcibly disconnected (§7).
async fn handle_text(
    state: &AppState,
    send_queue: &Arc<SendQueue>,
    conn: &mut Connection,
    invalid_messages: &mut u32,
    text: &str,
) -> bool {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(_) => {
            return reply_invalid(send_queue, invalid_messages, "unrecognized message type");
        }
    };

    match msg {
        ClientMessage::Join { room_id, language, name, .. } => match conn {
            Connection::PreJoin => handle_join(state, send_queue, conn, room_id, language, name).await,
            Connection::Joined { .. } => reply_invalid(send_queue, invalid_messages, "already joined"),
            Connection::Left => reply_invalid(send_queue, invalid_messages, "already left"),
        },
        ClientMessage::Audio { data, timestamp } => match conn {
            Connection::Joined { room, participant_id } => {
                room.audio(participant_id.clone(), data, timestamp).await;
                true
            }
            Connection::PreJoin => {
                reply_invalid(send_queue, invalid_messages, "must join before sending audio")
            }
            Connection::Left => true,
        },
        ClientMessage::UtteranceEnd { .. } => match conn {
            Connection::Joined { room, participant_id } => {
                room.utterance_end(participant_id.clone()).await;
                true
            }
            Connection::PreJoin => reply_invalid(
                send_queue,
                invalid_messages,
                "must join before sending utterance_end",
            ),
            Connection::Left => true,
        },
        ClientMessage::Leave => match conn {
            Connection::Joined { room, participant_id } => {
                room.leave(participant_id.clone()).await;
                *conn = Connection::Left;
                true
            }
            Connection::PreJoin => {
                reply_invalid(send_queue, invalid_messages, "must join before leaving")
            }
            // (L2): a second `leave` is a no-op.
            Connection::Left => true,
        },
        ClientMessage::Ping => match conn {
            Connection::PreJoin => {
                reply_invalid(send_queue, invalid_messages, "must join before pinging")
            }
            Connection::Joined { .. } | Connection::Left => send_pong(send_queue),
        },
    }
}

async fn handle_join(
    state: &AppState,
    send_queue: &Arc<SendQueue>,
    conn: &mut Connection,
    room_id: String,
    language: String,
    name: String,
) -> bool {
    if !is_valid_room_id(&room_id) {
        return send_error(send_queue, ErrorCode::InvalidMessage, "room_id must match [A-Z2-9]{6}");
    }
    if !is_valid_name(&name) {
        return send_error(
            send_queue,
            ErrorCode::InvalidMessage,
            "name must be non-empty and bounded",
        );
    }

    let room = match state.room_manager.get_or_create(&room_id) {
        Ok(room) => room,
        Err(RoomAdmission::RoomFull) => {
            return send_error(send_queue, ErrorCode::RoomFull, "Room is full (max rooms reached)");
        }
    };

    match room.join(name, language, Arc::clone(send_queue)).await {
        Ok(outcome) => {
            debug!(room_id, participant_id = %outcome.participant_id, "participant joined");
            let sent = send_queue.enqueue(ServerMessage::Joined {
                room_id: room_id.clone(),
                participant_id: outcome.participant_id.clone(),
                participants: outcome.participants,
            });
            *conn = Connection::Joined {
                room,
                participant_id: outcome.participant_id,
            };
            sent.is_ok()
        }
        Err(reason) => {
            let (code, message) = join_rejected_message(&reason);
            send_error(send_queue, code, &message)
        }
    }
}

fn send_error(send_queue: &SendQueue, code: ErrorCode, message: &str) -> bool {
    send_queue
        .enqueue(ServerMessage::Error {
            code,
            message: message.to_string(),
        })
        .is_ok()
}

fn send_pong(send_queue: &SendQueue) -> bool {
    send_queue.enqueue(ServerMessage::Pong).is_ok()
}

fn reply_invalid(send_queue: &SendQueue, invalid_messages: &mut u32, message: &str) -> bool {
    *invalid_messages += 1;
    let queued = send_error(send_queue, ErrorCode::InvalidMessage, message);
    queued && *invalid_messages < INVALID_MESSAGE_CLOSE_THRESHOLD
}
