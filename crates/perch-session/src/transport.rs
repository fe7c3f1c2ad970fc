//! Seam to the backing service's transport layer.

use async_trait::async_trait;

use crate::error::SessionError;

/// Connection-management operations the reconnector needs from the
/// transport layer.
///
/// The transport owns the wire protocol and the delivery of raw
/// [`SessionEvent`](crate::SessionEvent)s through the manager's
/// [`RawEventSink`](crate::RawEventSink); this trait only covers
/// re-establishing connectivity. A successful [`connect`](Self::connect) is
/// expected to result in the transport delivering a fresh connected event
/// through the sink.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Attempt to re-establish connectivity for the current session lineage.
    async fn connect(&self) -> Result<(), SessionError>;

    /// Discard the current session identity so that the next
    /// [`connect`](Self::connect) establishes a brand-new session.
    ///
    /// Called once the service confirmed expiry: the old session's
    /// server-side ephemeral state is already gone.
    async fn reset_session(&self) -> Result<(), SessionError>;
}
