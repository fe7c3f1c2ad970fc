//! Background reconnect episodes.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::retry::RetryPolicy;
use crate::transport::SessionTransport;

/// What a reconnect episode has to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EpisodeKind {
    /// Connectivity dropped but the session may still be alive.
    Resume,
    /// The session expired; a brand-new session is required.
    NewSession,
}

/// Run one reconnect episode until success, policy exhaustion, or
/// cancellation.
///
/// Each attempt resets the session identity first if the episode started
/// from an expired session and the reset has not succeeded yet. On success
/// the transport delivers a fresh connected event through the normal
/// ingress path; this function does not touch the state machine itself.
pub(crate) async fn run_episode(
    transport: Arc<dyn SessionTransport>,
    policy: Arc<dyn RetryPolicy>,
    kind: EpisodeKind,
    cancel: CancellationToken,
) {
    let started = Instant::now();
    let mut attempt = 0_u32;
    let mut reset_pending = kind == EpisodeKind::NewSession;

    loop {
        attempt += 1;

        let result = tokio::select! {
            result = try_once(transport.as_ref(), &mut reset_pending) => result,
            () = cancel.cancelled() => return,
        };

        match result {
            Ok(()) => {
                debug!(attempt, "reconnect succeeded");
                return;
            }
            Err(err) => match policy.should_retry(attempt, started.elapsed()) {
                Some(delay) => {
                    warn!(
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "reconnect attempt failed, retrying"
                    );
                    tokio::select! {
                        () = sleep(delay) => {}
                        () = cancel.cancelled() => return,
                    }
                }
                None => {
                    warn!(attempt, error = %err, "retry policy exhausted, giving up");
                    return;
                }
            },
        }
    }
}

async fn try_once(
    transport: &dyn SessionTransport,
    reset_pending: &mut bool,
) -> Result<(), SessionError> {
    if *reset_pending {
        transport.reset_session().await?;
        *reset_pending = false;
    }
    transport.connect().await
}
