// STOMP over TCP push transport, and the session rules shared with the WebSocket transport
use crate::application::push_transport::{MessageStream, PushTransport};
use crate::infrastructure::config::PushSettings;
use crate::infrastructure::stomp_frame::{Decoded, Frame, decode};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct StompTransport {
    broker_address: String,
    virtual_host: String,
    heartbeat_ms: u64,
}

impl StompTransport {
    pub fn new(settings: &PushSettings) -> Self {
        Self {
            broker_address: settings.broker_address.clone(),
            virtual_host: settings.virtual_host.clone(),
            heartbeat_ms: settings.heartbeat_ms,
        }
    }

    async fn handshake(&self, stream: &mut TcpStream, buffer: &mut BytesMut) -> Result<Frame> {
        let mut out = BytesMut::new();
        Frame::connect(&self.virtual_host, self.heartbeat_ms).encode(&mut out);
        stream.write_all(&out).await.context("Failed to send CONNECT")?;

        loop {
            if let Some(connected) = connected_reply(buffer)? {
                return Ok(connected);
            }
            let read = stream.read_buf(buffer).await.context("Failed to read CONNECTED")?;
            if read == 0 {
                anyhow::bail!("Broker closed the connection during handshake");
            }
        }
    }
}

/// The broker's answer to CONNECT, once `buffer` holds it.
pub(crate) fn connected_reply(buffer: &mut BytesMut) -> Result<Option<Frame>> {
    loop {
        match decode(buffer)? {
            Some(Decoded::Frame(frame)) if frame.command == "CONNECTED" => return Ok(Some(frame)),
            Some(Decoded::Frame(frame)) if frame.command == "ERROR" => {
                anyhow::bail!(
                    "Broker refused connection: {}",
                    frame.header("message").unwrap_or("no reason given")
                );
            }
            Some(Decoded::Frame(frame)) => {
                anyhow::bail!("Unexpected {} frame during handshake", frame.command)
            }
            Some(Decoded::Heartbeat) => continue,
            None => return Ok(None),
        }
    }
}

/// Takes the next MESSAGE body off `buffer`, skipping heart-beats and other
/// frames. `Ok(None)` means more input is needed. Errors end the session.
pub(crate) fn next_message(buffer: &mut BytesMut, topic: &str) -> Result<Option<String>> {
    loop {
        match decode(buffer).context("Malformed frame from broker")? {
            Some(Decoded::Frame(frame)) => match frame.command.as_str() {
                "MESSAGE" => return Ok(Some(frame.body_text()?)),
                "ERROR" => anyhow::bail!(
                    "Broker error on {}: {}",
                    topic,
                    frame.header("message").unwrap_or("no reason given")
                ),
                other => tracing::debug!("Ignoring {} frame on {}", other, topic),
            },
            Some(Decoded::Heartbeat) => {}
            None => return Ok(None),
        }
    }
}

/// Interval in which the broker promised to send something, if any. The
/// broker sends at the larger of what it offers and what we asked for.
pub(crate) fn server_silence_limit(connected: &Frame, requested_ms: u64) -> Option<Duration> {
    let (server_sends, _) = connected.heartbeat();
    if server_sends == 0 || requested_ms == 0 {
        return None;
    }
    Some(Duration::from_millis(server_sends.max(requested_ms) * 2))
}

/// Interval for our own heart-beats, when both sides want them.
pub(crate) fn client_heartbeat(connected: &Frame, requested_ms: u64) -> Option<Duration> {
    let (_, server_wants) = connected.heartbeat();
    (requested_ms > 0 && server_wants > 0).then(|| Duration::from_millis(server_wants.max(requested_ms)))
}

enum Wake {
    Read(Result<usize>),
    Beat,
}

async fn read_more(reader: &mut OwnedReadHalf, buffer: &mut BytesMut, limit: Option<Duration>) -> Result<usize> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, reader.read_buf(buffer))
            .await
            .context("No heart-beat from broker")?
            .context("Failed to read from broker"),
        None => reader.read_buf(buffer).await.context("Failed to read from broker"),
    }
}

#[async_trait]
impl PushTransport for StompTransport {
    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.broker_address))
            .await
            .context("Timed out connecting to broker")?
            .with_context(|| format!("Failed to connect to broker at {}", self.broker_address))?;

        let mut buffer = BytesMut::with_capacity(READ_BUFFER_SIZE);
        let connected = tokio::time::timeout(CONNECT_TIMEOUT, self.handshake(&mut stream, &mut buffer))
            .await
            .context("Timed out waiting for CONNECTED")??;
        tracing::debug!(
            "STOMP session {} established",
            connected.header("session").unwrap_or("-")
        );

        let mut out = BytesMut::new();
        Frame::subscribe("sub-0", topic).encode(&mut out);
        stream.write_all(&out).await.context("Failed to send SUBSCRIBE")?;

        let silence_limit = server_silence_limit(&connected, self.heartbeat_ms);
        let client_beat = client_heartbeat(&connected, self.heartbeat_ms);

        let (mut reader, mut writer) = stream.into_split();
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
                        read = read_more(&mut reader, &mut buffer, silence_limit) => Wake::Read(read),
                        _ = beat.tick() => Wake::Beat,
                    },
                    None => Wake::Read(read_more(&mut reader, &mut buffer, silence_limit).await),
                };
                let read = match wake {
                    Wake::Read(read) => read,
                    Wake::Beat => {
                        if let Err(e) = writer.write_all(b"\n").await {
                            yield Err(anyhow::Error::from(e).context("Failed to send heart-beat"));
                            return;
                        }
                        continue;
                    }
                };

                match read {
                    Ok(0) => return,
                    Ok(_) => {}
                    Err(e) => {
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
    use tokio::net::TcpListener;

    fn settings(broker_address: String) -> PushSettings {
        PushSettings {
            enabled: true,
            broker_address,
            heartbeat_ms: 0,
            ..PushSettings::default()
        }
    }

    #[test]
    fn test_server_silence_limit() {
        let connected = Frame::new("CONNECTED").with_header("heart-beat", "5000,0");
        assert_eq!(server_silence_limit(&connected, 10_000), Some(Duration::from_secs(20)));
        assert_eq!(server_silence_limit(&connected, 0), None);
        assert_eq!(server_silence_limit(&Frame::new("CONNECTED"), 10_000), None);
    }

    #[test]
    fn test_client_heartbeat() {
        let connected = Frame::new("CONNECTED").with_header("heart-beat", "0,15000");
        assert_eq!(client_heartbeat(&connected, 10_000), Some(Duration::from_secs(15)));
        assert_eq!(client_heartbeat(&connected, 0), None);
        assert_eq!(client_heartbeat(&Frame::new("CONNECTED"), 10_000), None);
    }

    #[test]
    fn test_next_message_skips_heartbeats_and_receipts() {
        let mut buffer = BytesMut::from(&b"\nRECEIPT\nreceipt-id:1\n\n\0MESSAGE\n\n{}\0MESSAGE\n\n{"[..]);

        assert_eq!(next_message(&mut buffer, "/topic/klimaat").unwrap().as_deref(), Some("{}"));
        assert_eq!(next_message(&mut buffer, "/topic/klimaat").unwrap(), None);

        let mut buffer = BytesMut::from(&b"ERROR\nmessage:gone\n\n\0"[..]);
        let error = next_message(&mut buffer, "/topic/klimaat").unwrap_err();
        assert!(error.to_string().contains("gone"));
    }

    #[tokio::test]
    async fn test_subscribe_and_receive_messages() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let broker = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = BytesMut::new();
            let mut frames = Vec::new();
            while frames.len() < 2 {
                match decode(&mut buffer).unwrap() {
                    Some(Decoded::Frame(frame)) => {
                        if frame.command == "CONNECT" {
                            let mut out = BytesMut::new();
                            Frame::new("CONNECTED")
                                .with_header("version", "1.2")
                                .encode(&mut out);
                            socket.write_all(&out).await.unwrap();
                        }
                        frames.push(frame);
                    }
                    Some(Decoded::Heartbeat) => {}
                    None => {
                        socket.read_buf(&mut buffer).await.unwrap();
                    }
                }
            }
            socket
                .write_all(b"MESSAGE\ndestination:/topic/meterstand\n\n{\"watt\":410}\0\n")
                .await
                .unwrap();
            frames
        });

        let transport = StompTransport::new(&settings(address));
        let mut messages = transport.subscribe("/topic/meterstand").await.unwrap();

        let first = messages.next().await.unwrap().unwrap();
        assert_eq!(first, "{\"watt\":410}");
        assert!(messages.next().await.is_none());

        let frames = broker.await.unwrap();
        assert_eq!(frames[0].header("accept-version"), Some("1.2"));
        assert_eq!(frames[1].command, "SUBSCRIBE");
        assert_eq!(frames[1].header("destination"), Some("/topic/meterstand"));
    }

    #[tokio::test]
    async fn test_error_frame_refuses_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = BytesMut::new();
            while decode(&mut buffer).unwrap().is_none() {
                socket.read_buf(&mut buffer).await.unwrap();
            }
            let mut out = BytesMut::new();
            Frame::new("ERROR")
                .with_header("message", "bad login")
                .encode(&mut out);
            socket.write_all(&out).await.unwrap();
            // Wait for the client to hang up.
            let _ = socket.read_buf(&mut buffer).await;
        });

        let transport = StompTransport::new(&settings(address));
        let error = transport.subscribe("/topic/klimaat").await.err().unwrap();
        assert!(error.to_string().contains("bad login"));
    }
}
