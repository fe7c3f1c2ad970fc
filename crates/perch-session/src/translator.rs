//! Translation of raw session events into connection state transitions.

use crate::event::SessionEvent;
use crate::state::ConnectionState;

/// Folds raw [`SessionEvent`]s into [`ConnectionState`] transitions.
///
/// The translation is history dependent: the first connect yields
/// [`ConnectionState::Connected`] while any later one yields
/// [`ConnectionState::Reconnected`], a disconnect before any connect is
/// ignored (the first connection is still being established), and duplicate
/// notifications collapse into no transition. After the session is lost,
/// stale disconnect notifications for the dead session are suppressed until
/// a new session connects.
///
/// Owned exclusively by the dispatch worker, so no synchronization is
/// needed here.
#[derive(Debug, Default)]
pub(crate) struct EventTranslator {
    ever_connected: bool,
    last: Option<ConnectionState>,
}

impl EventTranslator {
    /// Translate one raw event; `None` means no transition is emitted.
    pub(crate) fn translate(&mut self, event: SessionEvent) -> Option<ConnectionState> {
        let next = match event {
            SessionEvent::Connected => match self.last {
                // Duplicate notification while already fully connected; a
                // reconnect requires an intervening suspension or expiry.
                Some(ConnectionState::Connected | ConnectionState::Reconnected) => return None,
                _ if self.ever_connected => ConnectionState::Reconnected,
                _ => ConnectionState::Connected,
            },
            SessionEvent::ConnectedReadOnly => ConnectionState::ReadOnly,
            SessionEvent::Disconnected => {
                if !self.ever_connected {
                    // Still establishing the first connection.
                    return None;
                }
                if self.last == Some(ConnectionState::Lost) {
                    // Stale notification for the expired session.
                    return None;
                }
                ConnectionState::Suspended
            }
            SessionEvent::Expired => ConnectionState::Lost,
        };

        if matches!(
            event,
            SessionEvent::Connected | SessionEvent::ConnectedReadOnly
        ) {
            self.ever_connected = true;
        }

        if self.last == Some(next) {
            return None;
        }
        self.last = Some(next);
        Some(next)
    }
}
