use std::time::Duration;

use babblefish_api::protocol::{ClientMessage, ServerMessage};

use crate::fixtures::opus_audio::encode_tone_packets;
use crate::fixtures::ws::{connect, join, recv, recv_timeout, send};
use crate::fixtures::TestApp;

async fn speak(ws: &mut crate::fixtures::ws::WsStream, num_frames: usize) {
    for (i, packet) in encode_tone_packets(num_frames).into_iter().enumerate() {
        send(
            ws,
            &ClientMessage::Audio {
                data: packet,
                timestamp: i as u64 * 20,
            },
        )
        .await;
    }
    send(ws, &ClientMessage::UtteranceEnd { timestamp: 0 }).await;
}

/// (S1, P4, P5) A real Opus-encoded utterance is decoded, transcribed by
/// the deterministic ASR, and translated for every distinct target
/// language present in the room. The speaker never receives its own
/// broadcast, and the identity mapping holds for the speaker's own
/// language.
#[tokio::test]
async fn utterance_broadcasts_translation_to_other_participants_only() {
    let app = TestApp::spawn().await;

    let mut alice = connect(&app).await;
    send(&mut alice, &join("ABCDEF", "en", "Alice")).await;
    let _ = recv(&mut alice).await;

    let mut bob = connect(&app).await;
    send(&mut bob, &join("ABCDEF", "es", "Bob")).await;
    let bob_id = match recv(&mut bob).await {
        ServerMessage::Joined { participant_id, .. } => participant_id,
        other => panic!("expected Joined, got {other:?}"),
    };
    let _ = recv(&mut alice).await; // ParticipantJoined for Bob

    speak(&mut bob, 5).await;

    let alice_translation = recv(&mut alice).await;
    match alice_translation {
        ServerMessage::Translation {
            speaker_id,
            source_lang,
            source_text,
            translations,
            ..
        } => {
            assert_eq!(speaker_id, bob_id);
            assert_eq!(source_lang, "es");
            // identity case: the speaker's own language maps to the
            // verbatim transcription.
            assert_eq!(translations.get("es"), Some(&source_text));
            assert_eq!(
                translations.get("en"),
                Some(&format!("[eng_Latn] {source_text}"))
            );
        }
        other => panic!("expected Translation, got {other:?}"),
    }

    // Bob is the speaker: he must not receive his own broadcast. Anything
    // else arriving for him within the window is a protocol violation.
    assert!(recv_timeout(&mut bob, Duration::from_millis(300))
        .await
        .is_none());
}

/// (S5) Two participants finalize utterances within milliseconds of each
/// other. The shared single-permit pipeline serializes the two calls, but
/// both still complete and broadcast correctly — no deadlock, no crosstalk.
#[tokio::test]
async fn concurrent_utterances_from_two_speakers_both_broadcast() {
    let app = TestApp::spawn().await;

    let mut alice = connect(&app).await;
    send(&mut alice, &join("ABCDEF", "en", "Alice")).await;
    let alice_id = match recv(&mut alice).await {
        ServerMessage::Joined { participant_id, .. } => participant_id,
        other => panic!("expected Joined, got {other:?}"),
    };

    let mut bob = connect(&app).await;
    send(&mut bob, &join("ABCDEF", "es", "Bob")).await;
    let bob_id = match recv(&mut bob).await {
        ServerMessage::Joined { participant_id, .. } => participant_id,
        other => panic!("expected Joined, got {other:?}"),
    };
    let _ = recv(&mut alice).await; // ParticipantJoined for Bob

    // Fire both utterances without waiting on one another.
    let (alice_speak, bob_speak) = tokio::join!(speak(&mut alice, 3), speak(&mut bob, 3));
    let _ = (alice_speak, bob_speak);

    // Alice should see Bob's result and vice versa, in some order, each
    // exactly once, and never its own speaker id.
    let a1 = recv(&mut alice).await;
    let b1 = recv(&mut bob).await;

    match a1 {
        ServerMessage::Translation { speaker_id, .. } => assert_eq!(speaker_id, bob_id),
        other => panic!("expected Translation, got {other:?}"),
    }
    match b1 {
        ServerMessage::Translation { speaker_id, .. } => assert_eq!(speaker_id, alice_id),
        other => panic!("expected Translation, got {other:?}"),
    }
}

/// (B4) If the only other participant leaves while a pipeline call is in
/// flight, the eventual broadcast simply has zero recipients — it must not
/// crash the Room task or cross-talk a stale `participant_left`.
#[tokio::test]
async fn speaker_broadcast_survives_recipient_leaving_mid_flight() {
    let app = TestApp::spawn().await;

    let mut alice = connect(&app).await;
    send(&mut alice, &join("ABCDEF", "en", "Alice")).await;
    let _ = recv(&mut alice).await;

    let mut bob = connect(&app).await;
    send(&mut bob, &join("ABCDEF", "es", "Bob")).await;
    let _ = recv(&mut bob).await;
    let _ = recv(&mut alice).await; // ParticipantJoined for Bob

    for packet in encode_tone_packets(3) {
        send(
            &mut alice,
            &ClientMessage::Audio {
                data: packet,
                timestamp: 0,
            },
        )
        .await;
    }
    send(&mut alice, &ClientMessage::UtteranceEnd { timestamp: 0 }).await;

    // Bob leaves immediately, before the pipeline result can possibly have
    // returned. Alice (the speaker) is still owed the `participant_left`
    // broadcast for Bob; the translation result, once it lands, has zero
    // recipients and never shows up for her.
    send(&mut bob, &ClientMessage::Leave).await;
    drop(bob);

    match recv(&mut alice).await {
        ServerMessage::ParticipantLeft { .. } => {}
        other => panic!("expected ParticipantLeft, got {other:?}"),
    }

    // The room must still be alive and responsive afterwards, and the
    // discarded translation result must never surface.
    send(&mut alice, &ClientMessage::Ping).await;
    assert!(matches!(recv(&mut alice).await, ServerMessage::Pong));
}
