//! Connection state manager: raw-event ingress, ordered dispatch, and the
//! wait-until-connected primitive.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::event::SessionEvent;
use crate::listener::{ConnectionStateListener, ListenerId, ListenerRegistry};
use crate::reconnect::{EpisodeKind, run_episode};
use crate::retry::RetryPolicy;
use crate::state::ConnectionState;
use crate::translator::EventTranslator;
use crate::transport::SessionTransport;

/// Default bound on the raw-event queue.
const DEFAULT_QUEUE_CAPACITY: usize = 25;

/// Bounded hand-off between the transport's delivery context and the
/// dispatch worker. Insertion takes a brief lock and never waits on
/// listener code.
struct EventQueue {
    events: Mutex<VecDeque<SessionEvent>>,
    capacity: AtomicUsize,
    notify: Notify,
}

impl EventQueue {
    fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: AtomicUsize::new(capacity),
            notify: Notify::new(),
        }
    }

    fn push(&self, event: SessionEvent) {
        {
            let capacity = self.capacity.load(Ordering::Relaxed);
            let mut events = self.events.lock();
            if events.len() >= capacity {
                if let Some(dropped) = events.pop_front() {
                    warn!(?dropped, "raw event queue full, dropping oldest event");
                }
            }
            events.push_back(event);
        }
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<SessionEvent> {
        self.events.lock().pop_front()
    }

    fn len(&self) -> usize {
        self.events.lock().len()
    }
}

/// Cloneable ingress handle used by the transport layer to deliver raw
/// session events.
#[derive(Clone)]
pub struct RawEventSink {
    queue: Arc<EventQueue>,
    shutdown: CancellationToken,
}

impl RawEventSink {
    /// Deliver a raw session event to the manager.
    ///
    /// Never blocks: insertion is a brief queue-lock push plus a worker
    /// wakeup. When the bounded queue is full, the oldest pending event is
    /// dropped with a warning rather than blocking the caller. Events posted
    /// after `close` are discarded.
    pub fn post(&self, event: SessionEvent) {
        if self.shutdown.is_cancelled() {
            debug!(?event, "manager closed, dropping raw event");
            return;
        }
        self.queue.push(event);
    }
}

/// Owns the connection state of one client.
///
/// Translates raw transport events into ordered [`ConnectionState`]
/// transitions, fans them out to registered listeners, drives background
/// reconnection through the [`SessionTransport`], and backs the
/// [`block_until_connected`](Self::block_until_connected) primitive.
pub struct ConnectionStateManager {
    queue: Arc<EventQueue>,
    state: Arc<watch::Sender<Option<ConnectionState>>>,
    listeners: Arc<ListenerRegistry>,
    transport: Arc<dyn SessionTransport>,
    retry_policy: Arc<dyn RetryPolicy>,
    shutdown: CancellationToken,
    started: AtomicBool,
    expired_event_delay: Option<Duration>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionStateManager {
    /// Create a manager over the given transport with the given retry
    /// policy. The manager is inert until [`start`](Self::start) is called.
    #[must_use]
    pub fn new(transport: Arc<dyn SessionTransport>, retry_policy: Arc<dyn RetryPolicy>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            queue: Arc::new(EventQueue::new(DEFAULT_QUEUE_CAPACITY)),
            state: Arc::new(state),
            listeners: Arc::new(ListenerRegistry::default()),
            transport,
            retry_policy,
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
            expired_event_delay: None,
            worker: Mutex::new(None),
        }
    }

    /// Set the bound on the raw-event queue.
    ///
    /// Applies to every [`event_sink`](Self::event_sink) handle, including
    /// ones handed out earlier.
    #[must_use]
    pub fn with_queue_capacity(self, capacity: usize) -> Self {
        self.queue
            .capacity
            .store(capacity.max(1), Ordering::Relaxed);
        self
    }

    /// Delay processing of expired notifications.
    ///
    /// A testing lever for making the expiry race deterministic; it does not
    /// change which transitions are emitted. Off by default.
    #[must_use]
    pub fn with_expired_event_delay(mut self, delay: Duration) -> Self {
        self.expired_event_delay = Some(delay);
        self
    }

    /// Ingress handle for the transport layer.
    #[must_use]
    pub fn event_sink(&self) -> RawEventSink {
        RawEventSink {
            queue: Arc::clone(&self.queue),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Start the dispatch worker.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyStarted`] on a second call.
    pub fn start(&self) -> Result<(), SessionError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyStarted);
        }

        let worker = DispatchWorker {
            queue: Arc::clone(&self.queue),
            state: Arc::clone(&self.state),
            listeners: Arc::clone(&self.listeners),
            transport: Arc::clone(&self.transport),
            retry_policy: Arc::clone(&self.retry_policy),
            shutdown: self.shutdown.clone(),
            expired_event_delay: self.expired_event_delay,
            translator: EventTranslator::default(),
            episode: None,
        };
        *self.worker.lock() = Some(tokio::spawn(worker.run()));

        debug!("connection state manager started");
        Ok(())
    }

    /// Close the manager. Idempotent.
    ///
    /// Stops accepting raw events, cancels any in-flight reconnect episode,
    /// stops the dispatch worker (pending events are discarded), and wakes
    /// every blocked [`block_until_connected`](Self::block_until_connected)
    /// caller with [`SessionError::Closed`].
    pub fn close(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        // The worker exits on its own once the token is cancelled.
        drop(self.worker.lock().take());

        let pending = self.queue.len();
        if pending > 0 {
            debug!(pending, "discarding pending raw events on close");
        }
        info!("connection state manager closed");
    }

    /// The most recently dispatched state, or `None` before the first
    /// transition.
    #[must_use]
    pub fn current_state(&self) -> Option<ConnectionState> {
        *self.state.borrow()
    }

    /// Whether the current state represents a usable connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.current_state()
            .is_some_and(ConnectionState::is_connected)
    }

    /// Register a connection state listener.
    pub fn add_listener(&self, listener: Arc<dyn ConnectionStateListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Remove a previously registered listener. Removing an unknown id is a
    /// no-op.
    pub fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }

    /// Wait until the connection is usable.
    ///
    /// Resolves immediately if [`is_connected`](Self::is_connected) already
    /// holds. The check and the wakeup observe the same latest accepted
    /// state, so a connect immediately followed by a disconnect cannot
    /// satisfy a waiter with a stale result.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the manager is closed before the
    /// connection becomes usable.
    pub async fn block_until_connected(&self) -> Result<(), SessionError> {
        if self.shutdown.is_cancelled() {
            return Err(SessionError::Closed);
        }

        let mut state_rx = self.state.subscribe();
        tokio::select! {
            result = state_rx.wait_for(|state| state.is_some_and(ConnectionState::is_connected)) => {
                match result {
                    Ok(_) => Ok(()),
                    Err(_) => Err(SessionError::Closed),
                }
            }
            () = self.shutdown.cancelled() => Err(SessionError::Closed),
        }
    }

    /// Wait until the connection is usable, up to `timeout`.
    ///
    /// Returns `Ok(true)` once connected (immediately if already connected)
    /// and `Ok(false)` if the window elapses first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the manager is closed while
    /// waiting; a timeout is never reported as an error.
    pub async fn block_until_connected_timeout(
        &self,
        timeout: Duration,
    ) -> Result<bool, SessionError> {
        match tokio::time::timeout(timeout, self.block_until_connected()).await {
            Ok(Ok(())) => Ok(true),
            Ok(Err(err)) => Err(err),
            Err(_elapsed) => Ok(false),
        }
    }
}

impl Drop for ConnectionStateManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Single consumer of the raw-event queue.
///
/// Drains events strictly in arrival order, translates them, publishes the
/// new state before notifying listeners, and manages reconnect-episode
/// lifecycle.
struct DispatchWorker {
    queue: Arc<EventQueue>,
    state: Arc<watch::Sender<Option<ConnectionState>>>,
    listeners: Arc<ListenerRegistry>,
    transport: Arc<dyn SessionTransport>,
    retry_policy: Arc<dyn RetryPolicy>,
    shutdown: CancellationToken,
    expired_event_delay: Option<Duration>,
    translator: EventTranslator,
    episode: Option<CancellationToken>,
}

impl DispatchWorker {
    async fn run(mut self) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            match self.queue.pop() {
                Some(event) => {
                    if !self.process(event).await {
                        break;
                    }
                }
                None => {
                    tokio::select! {
                        () = self.queue.notify.notified() => {}
                        () = self.shutdown.cancelled() => break,
                    }
                }
            }
        }

        if let Some(episode) = self.episode.take() {
            episode.cancel();
        }
        debug!("dispatch worker stopped");
    }

    /// Handle one raw event. Returns `false` when shutdown interrupted
    /// processing.
    async fn process(&mut self, event: SessionEvent) -> bool {
        if event == SessionEvent::Expired {
            if let Some(delay) = self.expired_event_delay {
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = self.shutdown.cancelled() => return false,
                }
            }
        }

        let Some(next) = self.translator.translate(event) else {
            debug!(?event, "raw event produced no transition");
            return true;
        };
        info!(state = %next, "connection state changed");

        // Publish before notifying so waiters never observe the transition
        // later than listeners do.
        self.state.send_replace(Some(next));

        for listener in self.listeners.snapshot() {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener.state_changed(next)));
            if outcome.is_err() {
                warn!(state = %next, "connection state listener panicked");
            }
        }

        // Listeners reacting to a lost session (cache invalidation and the
        // like) have run by the time reconnection starts.
        match next {
            ConnectionState::Suspended => self.start_episode(EpisodeKind::Resume),
            ConnectionState::Lost => self.start_episode(EpisodeKind::NewSession),
            ConnectionState::Connected
            | ConnectionState::Reconnected
            | ConnectionState::ReadOnly => self.cancel_episode(),
        }
        true
    }

    fn start_episode(&mut self, kind: EpisodeKind) {
        self.cancel_episode();
        let token = self.shutdown.child_token();
        self.episode = Some(token.clone());
        tokio::spawn(run_episode(
            Arc::clone(&self.transport),
            Arc::clone(&self.retry_policy),
            kind,
            token,
        ));
    }

    fn cancel_episode(&mut self) {
        if let Some(token) = self.episode.take() {
            token.cancel();
        }
    }
}
