use shared::{Envelope, JobId, JobResult, Ticket};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::jobs::JobTable;
use super::listener;
use super::transport::{Transport, WsTransport};
use crate::error::{ClientError, ClientResult};

/// Authenticated notification channel with its background listener
///
/// Owns one connection. Writes (auth, subscribe) may come from any task and
/// are serialized by the transport; only the listener reads.
#[derive(Debug)]
pub struct JobChannel {
    transport: Arc<dyn Transport>,
    jobs: JobTable,
    shutdown: CancellationToken,
    listener: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl JobChannel {
    /// Connect over WebSocket and authenticate with `ticket`
    pub async fn connect(url: &str, ticket: &Ticket) -> ClientResult<Self> {
        let transport = WsTransport::connect(url).await?;
        Self::open(Arc::new(transport), ticket).await
    }

    /// Authenticate on an already connected transport and start listening
    ///
    /// The auth envelope is fire-and-forget: the server sends no
    /// acknowledgement, a rejected ticket shows up as a closed connection.
    pub async fn open(transport: Arc<dyn Transport>, ticket: &Ticket) -> ClientResult<Self> {
        let auth = serde_json::to_string(&Envelope::auth(ticket))?;
        transport.write_frame(auth).await?;
        tracing::debug!("Auth envelope sent");

        let jobs = JobTable::new();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(listener::run(
            transport.clone(),
            jobs.clone(),
            shutdown.clone(),
        ));

        Ok(Self {
            transport,
            jobs,
            shutdown,
            listener: parking_lot::Mutex::new(Some(handle)),
        })
    }

    /// Subscribe to `topic`; repeating a subscription is harmless
    pub async fn subscribe(&self, topic: &str) -> ClientResult<()> {
        if self.is_closed() {
            return Err(ClientError::ConnectionClosed);
        }
        let frame = serde_json::to_string(&Envelope::subscribe(topic))?;
        self.transport.write_frame(frame).await?;
        tracing::debug!(topic, "Subscribed");
        Ok(())
    }

    /// Subscribe to the notification topic of `job_id`
    pub async fn subscribe_job(&self, job_id: &JobId) -> ClientResult<()> {
        self.subscribe(&job_id.topic()).await
    }

    /// Wait for the result of `job_id`, optionally bounded by `timeout`
    pub async fn wait(&self, job_id: &JobId, timeout: Option<Duration>) -> ClientResult<JobResult> {
        match timeout {
            Some(timeout) => self.jobs.wait_timeout(job_id, timeout).await,
            None => self.jobs.wait(job_id).await,
        }
    }

    /// Whether the connection is gone (listener stopped)
    pub fn is_closed(&self) -> bool {
        self.jobs.is_closed()
    }

    /// Stop the listener and close the connection
    pub async fn close(&self) -> ClientResult<()> {
        self.shutdown.cancel();
        let handle = self.listener.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!("Listener task failed: {e}");
            }
        }
        self.jobs.close();
        self.transport.close().await
    }
}

impl Drop for JobChannel {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::transport::{MemoryPeer, MemoryTransport};
    use serde_json::{Value, json};
    use tokio::time::timeout;

    async fn open_channel() -> (JobChannel, MemoryPeer) {
        let (transport, peer) = MemoryTransport::pair();
        let channel = JobChannel::open(Arc::new(transport), &Ticket::new("t-1"))
            .await
            .unwrap();
        (channel, peer)
    }

    async fn next_frame(peer: &mut MemoryPeer) -> Value {
        let frame = timeout(Duration::from_secs(1), peer.outbound.recv())
            .await
            .unwrap()
            .unwrap();
        serde_json::from_str(&frame).unwrap()
    }

    #[tokio::test]
    async fn test_open_sends_auth_first() {
        let (_channel, mut peer) = open_channel().await;
        assert_eq!(
            next_frame(&mut peer).await,
            json!({"event": "auth", "method": "ticket", "ticket": "t-1"})
        );
    }

    #[tokio::test]
    async fn test_subscribe_and_wait() {
        let (channel, mut peer) = open_channel().await;
        next_frame(&mut peer).await;

        let job_id = JobId::new("job-1");
        channel.subscribe_job(&job_id).await.unwrap();
        assert_eq!(
            next_frame(&mut peer).await,
            json!({"event": "subscribe", "subscription": "jobs.job-1"})
        );

        // Resubscribing is harmless
        channel.subscribe_job(&job_id).await.unwrap();
        next_frame(&mut peer).await;

        peer.inbound
            .send(
                json!({
                    "event": "message",
                    "subscription": "jobs.job-1",
                    "data": {"status": "success", "retval": {"AppId": "app-42"}}
                })
                .to_string(),
            )
            .unwrap();

        let result = channel.wait(&job_id, None).await.unwrap();
        assert!(result.success);
        assert_eq!(result.return_value, Some(json!({"AppId": "app-42"})));
    }

    #[tokio::test]
    async fn test_wait_with_deadline() {
        let (channel, _peer) = open_channel().await;
        let err = channel
            .wait(&JobId::new("slow"), Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_closed_channel_rejects_subscribe_and_wait() {
        let (channel, peer) = open_channel().await;
        drop(peer);

        for _ in 0..100 {
            if channel.is_closed() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(channel.is_closed());

        let job_id = JobId::new("job-9");
        assert!(matches!(
            channel.subscribe_job(&job_id).await,
            Err(ClientError::ConnectionClosed)
        ));
        assert!(matches!(
            channel.wait(&job_id, None).await,
            Err(ClientError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_close() {
        let (channel, _peer) = open_channel().await;
        channel.close().await.unwrap();
        assert!(channel.is_closed());
    }
}
