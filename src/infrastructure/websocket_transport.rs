// STOMP over WebSocket push transport
use crate::application::push_transport::{MessageStream, PushTransport};
use crate::infrastructure::config::PushSettings;
use crate::infrastructure::stomp_frame::Frame;
use crate::infrastructure::stomp_transport::{client_heartbeat, connected_reply, next_message, server_silence_limit};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use futures::stream::Stream;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to one WebSocket endpoint per subscription. Every WebSocket
/// message carries STOMP frames; a bare newline is a heart-beat.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
    virtual_host: String,
    heartbeat_ms: u64,
}

impl WebSocketTransport {
    pub fn new(url: &str, settings: &PushSettings) -> Self {
        Self {
            url: url.to_string(),
            virtual_host: settings.virtual_host.clone(),
            heartbeat_ms: settings.heartbeat_ms,
        }
    }
}

fn text_message(frame: &Frame) -> Result<Message> {
    let mut out = BytesMut::new();
    frame.encode(&mut out);
    let text = String::from_utf8(out.to_vec()).context("STOMP frame is not valid UTF-8")?;
    Ok(Message::Text(text))
}

/// Appends the payload of a data message to `buffer`. False once the broker
/// closed the socket.
fn append_payload(buffer: &mut BytesMut, message: Message) -> bool {
    match message {
        Message::Text(text) => buffer.extend_from_slice(text.as_bytes()),
        Message::Binary(data) => buffer.extend_from_slice(&data),
        Message::Close(_) => return false,
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
    }
    true
}

async fn next_with_limit<S>(source: &mut S, limit: Option<Duration>) -> Result<Option<Message>>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let next = match limit {
        Some(limit) => tokio::time::timeout(limit, source.next())
            .await
            .context("No heart-beat from broker")?,
        None => source.next().await,
    };
    next.transpose().context("Failed to read from broker")
}

enum Wake {
    Message(Result<Option<Message>>),
    Beat,
}

#[async_trait]
impl PushTransport for WebSocketTransport {
    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        let (socket, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(self.url.as_str()))
            .await
            .context("Timed out connecting to broker")?
            .with_context(|| format!("Failed to open WebSocket {}", self.url))?;
        let (mut sink, mut source) = socket.split();

        sink.send(text_message(&Frame::connect(&self.virtual_host, self.heartbeat_ms))?)
            .await
            .context("Failed to send CONNECT")?;

        let mut buffer = BytesMut::new();
        let handshake = async {
            loop {
                if let Some(connected) = connected_reply(&mut buffer)? {
                    return Ok::<_, anyhow::Error>(connected);
                }
                let open = match next_with_limit(&mut source, None).await? {
                    Some(message) => append_payload(&mut buffer, message),
                    None => false,
                };
                if !open {
                    anyhow::bail!("Broker closed the connection during handshake");
                }
            }
        };
        let connected = tokio::time::timeout(CONNECT_TIMEOUT, handshake)
            .await
            .context("Timed out waiting for CONNECTED")??;
        tracing::debug!(
            "STOMP session {} established over {}",
            connected.header("session").unwrap_or("-"),
            self.url
        );

        sink.send(text_message(&Frame::subscribe("sub-0", topic))?)
            .await
            .context("Failed to send SUBSCRIBE")?;

        let silence_limit = server_silence_limit(&connected, self.heartbeat_ms);
        let client_beat = client_heartbeat(&connected, self.heartbeat_ms);
        let topic = topic.to_string();

        let messages = async_stream::stream! {
            let mut beat = client_beat.map(tokio::time::interval);
            loop {
                loop {
                    match next_message(&mut buffer, &topic) {
                        Ok(Some(body)) => yield Ok(body),
                        Ok(None) => break,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }

                let wake = match beat.as_mut() {
                    Some(beat) => tokio::select! {
                        message = next_with_limit(&mut source, silence_limit) => Wake::Message(message),
                        _ = beat.tick() => Wake::Beat,
                    },
                    None => Wake::Message(next_with_limit(&mut source, silence_limit).await),
                };
                match wake {
                    Wake::Beat => {
                        if let Err(e) = sink.send(Message::Text("\n".to_string())).await {
                            yield Err(anyhow::Error::from(e).context("Failed to send heart-beat"));
                            return;
                        }
                    }
                    Wake::Message(Ok(Some(message))) => {
                        if !append_payload(&mut buffer, message) {
                            return;
                        }
                    }
                    Wake::Message(Ok(None)) => return,
                    Wake::Message(Err(e)) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        };

        Ok(messages.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::stomp_frame::{Decoded, decode};
    use tokio::net::TcpListener;
    use tokio_tungstenite::{WebSocketStream, accept_async};

    fn settings() -> PushSettings {
        PushSettings {
            enabled: true,
            heartbeat_ms: 0,
            ..PushSettings::default()
        }
    }

    /// Reads WebSocket messages until `count` frames arrived, answering
    /// CONNECT with `reply`.
    async fn read_frames(
        socket: &mut WebSocketStream<tokio::net::TcpStream>,
        count: usize,
        reply: &str,
    ) -> Vec<Frame> {
        let mut frames = Vec::new();
        while frames.len() < count {
            let message = socket.next().await.unwrap().unwrap();
            let mut buffer = BytesMut::from(&message.into_data()[..]);
            while let Some(decoded) = decode(&mut buffer).unwrap() {
                if let Decoded::Frame(frame) = decoded {
                    if frame.command == "CONNECT" {
                        socket.send(Message::Text(reply.to_string())).await.unwrap();
                    }
                    frames.push(frame);
                }
            }
        }
        frames
    }

    #[test]
    fn test_append_payload() {
        let mut buffer = BytesMut::new();
        assert!(append_payload(&mut buffer, Message::Text("\n".to_string())));
        assert!(append_payload(&mut buffer, Message::Ping(vec![1])));
        assert!(append_payload(&mut buffer, Message::Binary(b"MESSAGE".to_vec())));
        assert!(!append_payload(&mut buffer, Message::Close(None)));
        assert_eq!(&buffer[..], b"\nMESSAGE");
    }

    #[tokio::test]
    async fn test_subscribe_and_receive_messages() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws/meterstand/websocket", listener.local_addr().unwrap());

        let broker = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            let frames = read_frames(&mut socket, 2, "CONNECTED\nversion:1.2\nheart-beat:0,0\n\n\0").await;
            socket
                .send(Message::Text("\n".to_string()))
                .await
                .unwrap();
            socket
                .send(Message::Text(
                    "MESSAGE\ndestination:/topic/meterstand\ncontent-length:12\n\n{\"watt\":410}\0".to_string(),
                ))
                .await
                .unwrap();
            socket.close(None).await.unwrap();
            frames
        });

        let transport = WebSocketTransport::new(&url, &settings());
        let mut messages = transport.subscribe("/topic/meterstand").await.unwrap();

        let first = messages.next().await.unwrap().unwrap();
        assert_eq!(first, "{\"watt\":410}");
        assert!(messages.next().await.is_none());

        let frames = broker.await.unwrap();
        assert_eq!(frames[0].command, "CONNECT");
        assert_eq!(frames[0].header("accept-version"), Some("1.2"));
        assert_eq!(frames[1].command, "SUBSCRIBE");
        assert_eq!(frames[1].header("destination"), Some("/topic/meterstand"));
    }

    #[tokio::test]
    async fn test_error_frame_refuses_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws/klimaat/websocket", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            read_frames(&mut socket, 1, "ERROR\nmessage:bad login\n\n\0").await;
            // Wait for the client to hang up.
            let _ = socket.next().await;
        });

        let transport = WebSocketTransport::new(&url, &settings());
        let error = transport.subscribe("/topic/klimaat").await.err().unwrap();
        assert!(error.to_string().contains("bad login"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws/klimaat/websocket", listener.local_addr().unwrap());
        drop(listener);

        let transport = WebSocketTransport::new(&url, &settings());
        assert!(transport.subscribe("/topic/klimaat").await.is_err());
    }
}
