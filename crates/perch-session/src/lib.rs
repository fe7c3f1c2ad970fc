//! Session and connection lifecycle core for Perch coordination clients.
//!
//! The backing coordination service delivers raw session notifications
//! (connected, disconnected, expired, read-only) through its transport
//! layer. This crate folds those into a small set of stable
//! [`ConnectionState`]s, delivers every transition to registered
//! [`ConnectionStateListener`]s in order, drives background reconnection
//! under a pluggable [`RetryPolicy`], and exposes
//! [`ConnectionStateManager::block_until_connected`] as the "wait until the
//! client is usable" primitive.
//!
//! The transport posts events through a [`RawEventSink`]; posting never
//! blocks on listener code. When the session expires, listeners observe
//! `Suspended -> Lost` before a brand-new session is established, so
//! consumers can invalidate ephemeral state before ever seeing the new
//! session come up.

mod error;
mod event;
mod listener;
mod manager;
mod reconnect;
mod retry;
mod state;
mod translator;
mod transport;

pub use error::SessionError;
pub use event::SessionEvent;
pub use listener::{ConnectionStateListener, ListenerId};
pub use manager::{ConnectionStateManager, RawEventSink};
pub use retry::{ExponentialBackoff, RetryNTimes, RetryPolicy, RetryUntilElapsed};
pub use state::ConnectionState;
pub use transport::SessionTransport;
