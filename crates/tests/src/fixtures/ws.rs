use std::time::Duration;

use babblefish_api::protocol::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use super::test_app::TestApp;

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub async fn connect(app: &TestApp) -> WsStream {
    let (ws, _) = connect_async(&app.ws_url).await.expect("websocket connect");
    ws
}

pub async fn send(ws: &mut WsStream, msg: &ClientMessage) {
    let text = serde_json::to_string(msg).expect("ClientMessage serializes");
    ws.send(Message::Text(text.into()))
        .await
        .expect("websocket send");
}

/// Waits for the next frame and decodes it as a `ServerMessage`. Panics if
/// the socket closes or a non-text frame arrives — every scenario here
/// expects a reply.
pub async fn recv(ws: &mut WsStream) -> ServerMessage {
    let frame = ws
        .next()
        .await
        .expect("connection closed before a reply arrived")
        .expect("websocket read error");
    let text = frame.into_text().expect("expected a text frame");
    serde_json::from_str(&text).expect("reply should be a valid ServerMessage")
}

/// Like `recv`, but gives up after `dur` instead of hanging — used to assert
/// the *absence* of a broadcast (e.g. (B2), (B4)).
pub async fn recv_timeout(ws: &mut WsStream, dur: Duration) -> Option<ServerMessage> {
    tokio::time::timeout(dur, recv(ws)).await.ok()
}

pub fn join(room_id: &str, language: &str, name: &str) -> ClientMessage {
    ClientMessage::Join {
        room_id: room_id.to_string(),
        language: language.to_string(),
        name: name.to_string(),
        capabilities: None,
    }
}
