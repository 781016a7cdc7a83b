//! WebSocket push channel.
//!
//! One long-lived connection per credential over which the item service
//! notifies the client of changes. A spawned reader task parses text frames
//! into [`ChangeEvent`]s and forwards them until the service hangs up or
//! [`PushHandle::close`] is called.

use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use crate::protocol::{ChangeEvent, RequestError};

pub struct PushChannel;

impl PushChannel {
    /// Connect to the item service changefeed and spawn the reader task.
    pub async fn connect(
        base_url: &str,
        credential: &str,
        events: mpsc::Sender<ChangeEvent>,
    ) -> Result<PushHandle, RequestError> {
        let url = ws_url(base_url, credential)?;
        tracing::debug!("push channel connecting to {}", url);

        let (mut ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| RequestError::Connection(format!("websocket connect failed: {}", e)))?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    msg = ws_stream.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ChangeEvent>(&text) {
                                Ok(event) => {
                                    if events.send(event).await.is_err() {
                                        // receiver gone, session is over
                                        break;
                                    }
                                }
                                Err(_) => {
                                    // control message such as {"type": "subscribed"}
                                    tracing::trace!("push channel: non-event message: {}", text);
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            tracing::warn!("push channel read error: {}", e);
                            break;
                        }
                        Some(Ok(_)) => {}
                    },
                }
            }
            tracing::debug!("push channel reader stopped");
        });

        Ok(PushHandle {
            shutdown: Some(shutdown_tx),
            task,
        })
    }
}

/// Handle to an open push channel.
///
/// Closing is mandatory on credential change and session teardown;
/// [`PushHandle::close`] waits until the reader task has stopped.
pub struct PushHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PushHandle {
    /// Assemble a handle from a shutdown trigger and the reader task. Used
    /// by [`PushChannel::connect`] and by mock services in tests.
    pub fn new(shutdown: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        Self {
            shutdown: Some(shutdown),
            task,
        }
    }

    /// Close the channel and wait for the reader task to stop.
    pub async fn close(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

fn ws_url(base_url: &str, credential: &str) -> Result<Url, RequestError> {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("ws://{}", base)
    };

    Url::parse(&format!("{}/api/items/ws?token={}", ws_base, credential))
        .map_err(|e| RequestError::Protocol(format!("invalid push url: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_from_http_base() {
        let url = ws_url("http://localhost:3000", "tok").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:3000/api/items/ws?token=tok");
    }

    #[test]
    fn test_ws_url_from_https_base() {
        let url = ws_url("https://books.example.com/", "tok").unwrap();
        assert_eq!(
            url.as_str(),
            "wss://books.example.com/api/items/ws?token=tok"
        );
    }

    #[test]
    fn test_ws_url_from_bare_host() {
        let url = ws_url("localhost:3000", "tok").unwrap();
        assert_eq!(url.scheme(), "ws");
    }
}
