//! Raw session notifications delivered by the transport layer.

/// A raw session lifecycle notification.
///
/// The transport delivers exactly one of these per significant session
/// event, in delivery order. The manager's dispatch worker translates them
/// into [`ConnectionState`](crate::ConnectionState) transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session is established and fully usable.
    Connected,
    /// A session is established but the service is read-only.
    ConnectedReadOnly,
    /// Connectivity to the service was lost.
    Disconnected,
    /// The service confirmed that the session expired.
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_event_equality() {
        assert_eq!(SessionEvent::Connected, SessionEvent::Connected);
        assert_ne!(SessionEvent::Connected, SessionEvent::ConnectedReadOnly);
        assert_ne!(SessionEvent::Disconnected, SessionEvent::Expired);
    }
}
