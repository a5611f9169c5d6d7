// Push channel - keeps one topic subscription alive and feeds a single subscriber
use crate::application::push_transport::PushTransport;
use crate::application::task_guard::TaskGuard;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    /// Waiting `delay` before connection attempt `attempt + 1`.
    Reconnecting { attempt: u32, delay: Duration },
}

pub struct PushChannel {
    transport: Arc<dyn PushTransport>,
    topic: String,
    reconnect_delay: Duration,
    state: Arc<watch::Sender<ChannelState>>,
}

/// Keeps the channel running. Dropping it stops the reconnect loop.
pub struct PushSubscription {
    _task: TaskGuard,
    state: Arc<watch::Sender<ChannelState>>,
}

impl PushSubscription {
    #[cfg(test)]
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.state.send_replace(ChannelState::Disconnected);
    }
}

impl PushChannel {
    pub fn new(transport: Arc<dyn PushTransport>, topic: impl Into<String>, reconnect_delay: Duration) -> Self {
        let (state, _) = watch::channel(ChannelState::Disconnected);
        Self {
            transport,
            topic: topic.into(),
            reconnect_delay,
            state: Arc::new(state),
        }
    }

    /// Starts the connect/reconnect loop. Every message body is decoded as
    /// JSON and handed to `subscriber` in transport order; undecodable bodies
    /// are skipped. The subscriber gets `None` whenever the connection is
    /// lost or cannot be opened.
    pub fn start<T, F>(self, subscriber: F) -> PushSubscription
    where
        T: DeserializeOwned + Send + 'static,
        F: FnMut(Option<T>) + Send + 'static,
    {
        let state = self.state.clone();
        PushSubscription {
            _task: TaskGuard::spawn(self.run(subscriber)),
            state,
        }
    }

    async fn run<T, F>(self, mut subscriber: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: FnMut(Option<T>) + Send + 'static,
    {
        let mut attempt: u32 = 0;
        loop {
            self.state.send_replace(ChannelState::Connecting);
            match self.transport.subscribe(&self.topic).await {
                Ok(mut messages) => {
                    attempt = 0;
                    self.state.send_replace(ChannelState::Connected);
                    tracing::info!("Push channel connected to {}", self.topic);

                    while let Some(message) = messages.next().await {
                        match message {
                            Ok(body) => match serde_json::from_str::<T>(&body) {
                                Ok(value) => subscriber(Some(value)),
                                Err(e) => {
                                    tracing::warn!("Ignoring malformed message on {}: {}", self.topic, e)
                                }
                            },
                            Err(e) => {
                                tracing::warn!("Push channel {} failed: {:#}", self.topic, e);
                                break;
                            }
                        }
                    }
                    tracing::warn!("Push channel {} closed", self.topic);
                }
                Err(e) => {
                    tracing::warn!("Could not connect push channel {}: {:#}", self.topic, e);
                }
            }
            subscriber(None);

            attempt = attempt.saturating_add(1);
            self.state.send_replace(ChannelState::Reconnecting {
                attempt,
                delay: self.reconnect_delay,
            });
            tracing::debug!(
                "Reconnecting push channel {} in {:?} (attempt {})",
                self.topic,
                self.reconnect_delay,
                attempt
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }
}
