//! Background listener
//!
//! The only reader of the notification channel. Demultiplexes job
//! notifications into the [`JobTable`] and closes the table when the
//! connection goes away.

use shared::{Envelope, JobId};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::jobs::JobTable;
use super::transport::Transport;
use crate::error::{ClientError, ClientResult, ErrorKind};

/// Receive the next envelope
///
/// `ConnectionClosed` when the peer closed the socket; a protocol error when
/// the frame is not a valid envelope.
pub async fn receive(transport: &dyn Transport) -> ClientResult<Envelope> {
    match transport.read_frame().await? {
        Some(frame) => serde_json::from_str(&frame).map_err(|e| {
            ClientError::InvalidResponse(format!("malformed envelope ({e}): {frame}"))
        }),
        None => Err(ClientError::ConnectionClosed),
    }
}

/// Route one envelope; returns the job id it was deposited under
pub fn dispatch(envelope: Envelope, jobs: &JobTable) -> Option<JobId> {
    let event = envelope.event_name();
    let topic = match &envelope {
        Envelope::Message { subscription, .. } => subscription.clone(),
        _ => {
            tracing::debug!(event, "Ignoring non-message envelope");
            return None;
        }
    };

    let Some(result) = envelope.into_job_result() else {
        tracing::debug!(topic = ?topic, "Ignoring message on non-job topic");
        return None;
    };

    let job_id = result.job_id.clone();
    tracing::info!(job_id = %job_id, success = result.success, "Job notification received");
    jobs.deposit(result);
    Some(job_id)
}

/// Listener loop; runs until the connection closes or `shutdown` fires
pub async fn run(transport: Arc<dyn Transport>, jobs: JobTable, shutdown: CancellationToken) {
    tracing::debug!("Listener started");

    loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("Listener shutting down");
                break;
            }
            received = receive(transport.as_ref()) => received,
        };

        match received {
            Ok(envelope) => {
                dispatch(envelope, &jobs);
            }
            Err(e) if e.kind() == ErrorKind::Protocol => {
                // Unrelated chatter on the shared channel must not kill the listener.
                tracing::warn!("Ignoring undecodable frame: {e}");
            }
            Err(ClientError::ConnectionClosed) => {
                tracing::info!("Notification channel closed");
                break;
            }
            Err(e) => {
                tracing::error!(kind = e.kind().name(), "Notification channel read error: {e}");
                break;
            }
        }
    }

    jobs.close();
    tracing::debug!("Listener stopped");
}
