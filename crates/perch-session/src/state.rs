//! Application-visible connection states.

use std::fmt;

/// State of the session with the coordination service.
///
/// Raw transport notifications are folded into these states by the
/// connection state manager; listeners and recipes only ever observe this
/// enum, never the raw events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// First successful connection of this client.
    Connected,
    /// Connectivity lost after having been connected; the session may still
    /// be recovered before the service expires it.
    Suspended,
    /// Connectivity regained after a suspension.
    Reconnected,
    /// The service confirmed that the session expired; all server-side
    /// ephemeral state for it is gone. A brand-new session is established
    /// in the background.
    Lost,
    /// Connected, but the service is serving reads only.
    ReadOnly,
}

impl ConnectionState {
    /// Whether this state represents a usable connection.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected | Self::Reconnected | Self::ReadOnly)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::Suspended => "suspended",
            Self::Reconnected => "reconnected",
            Self::Lost => "lost",
            Self::ReadOnly => "read-only",
        };
        f.write_str(name)
    }
}
