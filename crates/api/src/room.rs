use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use babblefish_pipeline::pipeline::{OpusSessionState, UtteranceAssembler};
use babblefish_pipeline::{InferencePipeline, LanguageRegistry};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::protocol::{ErrorCode, ParticipantView, ServerMessage};
use crate::send_queue::SendQueue;

const DECODE_ERROR_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParticipantState {
    Idle,
    Speaking,
    Processing,
}

struct Participant {
    id: String,
    name: String,
    language: String,
    send_queue: Arc<SendQueue>,
    state: ParticipantState,
    opus: OpusSessionState,
    assembler: UtteranceAssembler,
    consecutive_decode_errors: u32,
    /// Bumped every time an utterance is finalized; lets a pipeline result
    /// that arrives after the participant started a new utterance (or left)
    /// be told apart from the one it belongs to.
    generation: u64,
}

#[derive(Debug)]
pub enum JoinRejected {
    RoomFull,
    UnsupportedLanguage(String),
}

pub struct JoinOutcome {
    pub participant_id: String,
    pub participants: Vec<ParticipantView>,
}

enum RoomCommand {
    Join {
        name: String,
        language: String,
        send_queue: Arc<SendQueue>,
        reply: oneshot::Sender<Result<JoinOutcome, JoinRejected>>,
    },
    Audio {
        participant_id: String,
        data: String,
        #[allow(dead_code)]
        timestamp: u64,
    },
    UtteranceEnd {
        participant_id: String,
    },
    Leave {
        participant_id: String,
    },
    PipelineFinished {
        participant_id: String,
        generation: u64,
        outcome: Result<babblefish_pipeline::PipelineResult, babblefish_pipeline::PipelineError>,
    },
}

/// Handle held by the transport layer to talk to a Room's single-writer task.
#[derive(Clone)]
pub struct RoomHandle {
    pub room_id: String,
    commands: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub async fn join(
        &self,
        name: String,
        language: String,
        send_queue: Arc<SendQueue>,
    ) -> Result<JoinOutcome, JoinRejected> {
        let (reply, rx) = oneshot::channel();
        let _ = self
            .commands
            .send(RoomCommand::Join {
                name,
                language,
                send_queue,
                reply,
            })
            .await;
        rx.await.unwrap_or(Err(JoinRejected::RoomFull))
    }

    pub async fn audio(&self, participant_id: String, data: String, timestamp: u64) {
        let _ = self
            .commands
            .send(RoomCommand::Audio {
                participant_id,
                data,
                timestamp,
            })
            .await;
    }

    pub async fn utterance_end(&self, participant_id: String) {
        let _ = self
            .commands
            .send(RoomCommand::UtteranceEnd { participant_id })
            .await;
    }

    pub async fn leave(&self, participant_id: String) {
        let _ = self.commands.send(RoomCommand::Leave { participant_id }).await;
    }
}

/// Spawns a Room's task and returns a handle to it.
///
/// `on_empty_timeout` is invoked (by notifying the returned channel) once
/// the room has been empty for `room_timeout_seconds`, so the owning
/// `RoomManager` can drop its entry. The task then exits.
pub fn spawn_room(
    room_id: String,
    max_participants: usize,
    room_timeout: Duration,
    registry: Arc<LanguageRegistry>,
    pipeline: Arc<InferencePipeline>,
    utterance_hard_cap_seconds: f64,
    reaper: mpsc::UnboundedSender<String>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(256);
    let handle = RoomHandle {
        room_id: room_id.clone(),
        commands: tx.clone(),
    };

    tokio::spawn(room_task(
        room_id,
        max_participants,
        room_timeout,
        registry,
        pipeline,
        utterance_hard_cap_seconds,
        rx,
        tx,
        reaper,
    ));

    handle
}

#[allow(clippy::too_many_arguments)]
async fn room_task(
    room_id: String,
    max_participants: usize,
    room_timeout: Duration,
    registry: Arc<LanguageRegistry>,
    pipeline: Arc<InferencePipeline>,
    utterance_hard_cap_seconds: f64,
    mut inbox: mpsc::Receiver<RoomCommand>,
    self_tx: mpsc::Sender<RoomCommand>,
    reaper: mpsc::UnboundedSender<String>,
) {
    let mut participants: HashMap<String, Participant> = HashMap::new();
    let mut next_id: u64 = 1;
    let mut idle_since = Some(tokio::time::Instant::now());

    loop {
        let idle_deadline = idle_since.map(|since| since + room_timeout);

        let cmd = match idle_deadline {
            Some(deadline) => {
                tokio::select! {
                    cmd = inbox.recv() => cmd,
                    _ = tokio::time::sleep_until(deadline) => {
                        info!(room_id = %room_id, "room idle timeout reached, tearing down");
                        let _ = reaper.send(room_id.clone());
                        return;
                    }
                }
            }
            None => inbox.recv().await,
        };

        let Some(cmd) = cmd else {
            return;
        };

        match cmd {
            RoomCommand::Join {
                name,
                language,
                send_queue,
                reply,
            } => {
                let outcome = handle_join(
                    &mut participants,
                    &mut next_id,
                    &registry,
                    name,
                    language,
                    send_queue,
                    max_participants,
                    utterance_hard_cap_seconds,
                );
                idle_since = if participants.is_empty() {
                    Some(tokio::time::Instant::now())
                } else {
                    None
                };
                let _ = reply.send(outcome);
            }
            RoomCommand::Audio {
                participant_id,
                data,
                ..
            } => {
                handle_audio(&mut participants, &participant_id, &data);
            }
            RoomCommand::UtteranceEnd { participant_id } => {
                handle_utterance_end(&mut participants, &participant_id, &pipeline, self_tx.clone());
            }
            RoomCommand::Leave { participant_id } => {
                handle_leave(&mut participants, &participant_id);
                idle_since = if participants.is_empty() {
                    Some(tokio::time::Instant::now())
                } else {
                    None
                };
            }
            RoomCommand::PipelineFinished {
                participant_id,
                generation,
                outcome,
            } => {
                handle_pipeline_finished(&mut participants, &participant_id, generation, outcome);
            }
        }
    }
}

fn handle_join(
    participants: &mut HashMap<String, Participant>,
    next_id: &mut u64,
    registry: &LanguageRegistry,
    name: String,
    language: String,
    send_queue: Arc<SendQueue>,
    max_participants: usize,
    utterance_hard_cap_seconds: f64,
) -> Result<JoinOutcome, JoinRejected> {
    if !registry.is_supported(&language) {
        return Err(JoinRejected::UnsupportedLanguage(language));
    }
    if participants.len() >= max_participants {
        return Err(JoinRejected::RoomFull);
    }

    let id = format!("P_{:02}", *next_id);
    *next_id += 1;

    let opus = OpusSessionState::new().expect("opus decoder init should not fail");
    let assembler = UtteranceAssembler::new(16_000, utterance_hard_cap_seconds);

    let roster: Vec<ParticipantView> = participants
        .values()
        .map(|p| ParticipantView {
            id: p.id.clone(),
            name: p.name.clone(),
            language: p.language.clone(),
        })
        .collect();

    let view = ParticipantView {
        id: id.clone(),
        name: name.clone(),
        language: language.clone(),
    };

    for other in participants.values() {
        let _ = other.send_queue.enqueue(ServerMessage::ParticipantJoined {
            participant: view.clone(),
        });
    }

    participants.insert(
        id.clone(),
        Participant {
            id: id.clone(),
            name,
            language,
            send_queue,
            state: ParticipantState::Idle,
            opus,
            assembler,
            consecutive_decode_errors: 0,
            generation: 0,
        },
    );

    debug!(participant_id = %id, "participant joined");

    Ok(JoinOutcome {
        participant_id: id,
        participants: roster,
    })
}

fn handle_audio(participants: &mut HashMap<String, Participant>, participant_id: &str, data: &str) {
    let Some(participant) = participants.get_mut(participant_id) else {
        return;
    };
    if participant.state == ParticipantState::Processing {
        return;
    }

    match participant.opus.decode(data) {
        Ok(samples) => {
            participant.consecutive_decode_errors = 0;
            participant.assembler.push(&samples);
            participant.state = ParticipantState::Speaking;
        }
        Err(e) => {
            participant.consecutive_decode_errors += 1;
            warn!(participant_id, error = %e, "dropped corrupted opus packet");
            if participant.consecutive_decode_errors >= DECODE_ERROR_THRESHOLD {
                participant.assembler.take();
                participant.state = ParticipantState::Idle;
                participant.consecutive_decode_errors = 0;
                let _ = participant.send_queue.enqueue(ServerMessage::Error {
                    code: ErrorCode::PipelineError,
                    message: "CorruptedStream".to_string(),
                });
            }
        }
    }
}

fn handle_utterance_end(
    participants: &mut HashMap<String, Participant>,
    participant_id: &str,
    pipeline: &Arc<InferencePipeline>,
    self_tx: mpsc::Sender<RoomCommand>,
) {
    let target_shorts: Vec<String> = participants
        .values()
        .map(|p| p.language.clone())
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();

    let Some(participant) = participants.get_mut(participant_id) else {
        return;
    };
    if participant.state != ParticipantState::Speaking || participant.assembler.is_empty() {
        return;
    }

    if participant.assembler.is_truncated() {
        warn!(
            participant_id,
            "utterance exceeded hard cap, oldest samples discarded"
        );
    }
    let pcm = participant.assembler.take();
    let _ = participant.opus.reset();
    participant.state = ParticipantState::Processing;
    participant.generation += 1;
    let generation = participant.generation;
    let declared_lang = participant.language.clone();

    let pipeline = Arc::clone(pipeline);
    let participant_id = participant_id.to_string();

    tokio::spawn(async move {
        let outcome = pipeline
            .transcribe_and_translate(pcm, &declared_lang, &target_shorts)
            .await;
        let _ = self_tx
            .send(RoomCommand::PipelineFinished {
                participant_id,
                generation,
                outcome,
            })
            .await;
    });
}

fn handle_pipeline_finished(
    participants: &mut HashMap<String, Participant>,
    participant_id: &str,
    generation: u64,
    outcome: Result<babblefish_pipeline::PipelineResult, babblefish_pipeline::PipelineError>,
) {
    // The speaker may have left while the job was in flight; the job was
    // always allowed to complete, but its result is simply discarded.
    let Some(participant) = participants.get_mut(participant_id) else {
        return;
    };
    if participant.generation != generation {
        return;
    }

    participant.state = ParticipantState::Idle;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            warn!(participant_id, error = %e, "pipeline call failed");
            let _ = participant.send_queue.enqueue(ServerMessage::Error {
                code: ErrorCode::PipelineError,
                message: e.to_string(),
            });
            return;
        }
    };

    for diagnostic in &result.diagnostics {
        debug!(participant_id, %diagnostic, "pipeline diagnostic");
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let speaker_name = participant.name.clone();
    let speaker_id = participant.id.clone();

    let message = ServerMessage::Translation {
        speaker_id: speaker_id.clone(),
        speaker_name,
        source_lang: result.source_lang,
        source_text: result.source_text,
        translations: result.translations,
        timestamp,
    };

    for other in participants.values() {
        if other.id == speaker_id {
            continue;
        }
        let _ = other.send_queue.enqueue(message.clone());
    }
}

fn handle_leave(participants: &mut HashMap<String, Participant>, participant_id: &str) {
    if participants.remove(participant_id).is_none() {
        return;
    }
    for other in participants.values() {
        let _ = other
            .send_queue
            .enqueue(ServerMessage::ParticipantLeft {
                participant_id: participant_id.to_string(),
            });
    }
}
