use std::time::Duration;

use babblefish_api::protocol::{ClientMessage, ErrorCode, ServerMessage};

use crate::fixtures::ws::{connect, join, recv, recv_timeout, send};
use crate::fixtures::TestApp;

fn audio(garbage: &str) -> ClientMessage {
    ClientMessage::Audio {
        data: garbage.to_string(),
        timestamp: 0,
    }
}

/// `audio` before `join` is rejected like any other message requiring a
/// joined connection.
#[tokio::test]
async fn audio_before_join_is_invalid_message() {
    let app = TestApp::spawn().await;
    let mut ws = connect(&app).await;

    send(&mut ws, &audio("not valid base64!!")).await;
    match recv(&mut ws).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidMessage),
        other => panic!("expected Error, got {other:?}"),
    }
}

/// (decode-error threshold) five consecutive packets that fail to decode as
/// base64/Opus drop the in-progress utterance and surface a single
/// `CorruptedStream` diagnostic, without disconnecting the participant.
#[tokio::test]
async fn five_consecutive_decode_errors_surface_corrupted_stream() {
    let app = TestApp::spawn().await;
    let mut ws = connect(&app).await;
    send(&mut ws, &join("ABCDEF", "en", "Alice")).await;
    let _ = recv(&mut ws).await;

    for _ in 0..4 {
        send(&mut ws, &audio("not valid base64!!")).await;
    }
    // No error yet: below the threshold.
    assert!(recv_timeout(&mut ws, Duration::from_millis(200))
        .await
        .is_none());

    send(&mut ws, &audio("not valid base64!!")).await;
    match recv(&mut ws).await {
        ServerMessage::Error { code, message } => {
            assert_eq!(code, ErrorCode::PipelineError);
            assert_eq!(message, "CorruptedStream");
        }
        other => panic!("expected Error, got {other:?}"),
    }

    // The connection survives: a subsequent ping still gets a pong.
    send(&mut ws, &ClientMessage::Ping).await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::Pong));
}

/// (B2) `utterance_end` with nothing buffered (no audio ever decoded) is a
/// silent no-op — no translation broadcast, no error.
#[tokio::test]
async fn utterance_end_with_empty_assembler_is_a_no_op() {
    let app = TestApp::spawn().await;
    let mut alice = connect(&app).await;
    send(&mut alice, &join("ABCDEF", "en", "Alice")).await;
    let _ = recv(&mut alice).await;

    let mut bob = connect(&app).await;
    send(&mut bob, &join("ABCDEF", "es", "Bob")).await;
    let _ = recv(&mut bob).await;
    let _ = recv(&mut alice).await; // ParticipantJoined for Bob

    send(
        &mut alice,
        &ClientMessage::UtteranceEnd { timestamp: 0 },
    )
    .await;

    assert!(recv_timeout(&mut bob, Duration::from_millis(300))
        .await
        .is_none());
}

/// `audio`/`utterance_end` sent after `leave` are silently ignored — the
/// Room no longer has a participant entry to route them to.
#[tokio::test]
async fn audio_after_leave_is_ignored() {
    let app = TestApp::spawn().await;
    let mut ws = connect(&app).await;
    send(&mut ws, &join("ABCDEF", "en", "Alice")).await;
    let _ = recv(&mut ws).await;

    send(&mut ws, &ClientMessage::Leave).await;
    send(&mut ws, &audio("not valid base64!!")).await;
    send(&mut ws, &ClientMessage::UtteranceEnd { timestamp: 0 }).await;

    assert!(recv_timeout(&mut ws, Duration::from_millis(300))
        .await
        .is_none());
}
