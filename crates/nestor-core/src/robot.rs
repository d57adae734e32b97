//! The robot: listener registry and receive pipeline.
//!
//! [`Robot`] owns the ordered listener list and dispatches inbound messages
//! to it. A receive cycle evaluates listeners in registration order and
//! invokes only the first one whose pattern matches:
//!
//! 1. If the message is already finished, nothing is evaluated
//! 2. The first matching listener gets a fresh [`Response`] and a [`Done`]
//! 3. The cycle resolves once that listener completes `Done`
//!
//! # Example
//!
//! ```rust
//! use nestor_core::{Message, ReceiveOutcome, Robot};
//!
//! # tokio_test::block_on(async {
//! let robot = Robot::new("T1", "nestor", true);
//!
//! robot.hear_async("ping", |res| async move {
//!     res.send(["pong"]).await.ok();
//! }).unwrap();
//!
//! let outcome = robot.receive(Message::new("ping")).await;
//! assert_eq!(outcome, ReceiveOutcome::Completed);
//! assert_eq!(robot.sent(), vec!["pong"]);
//! # });
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use regex::Regex;
use tracing::{Instrument, Level, debug, span, trace, warn};

use crate::error::RegisterResult;
use crate::http::HttpOptions;
use crate::listener::{Captures, Done, Listener, spawn_completion};
use crate::message::Message;
use crate::pattern::respond_pattern;
use crate::relay::Relay;
use crate::response::Response;

/// How a receive cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// No listener matched.
    Unmatched,
    /// The message was already finished, so no listener was evaluated.
    Finished,
    /// A listener matched and completed its `Done` handle.
    Completed,
    /// A listener matched but dropped its `Done` handle without completing.
    Abandoned,
}

impl ReceiveOutcome {
    /// Returns true if a listener callback was invoked.
    pub fn matched(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

struct RobotInner {
    team_id: String,
    bot_id: String,
    debug_mode: AtomicBool,
    listeners: RwLock<Vec<Arc<Listener>>>,
    to_send: Mutex<Vec<String>>,
    to_reply: Mutex<Vec<String>>,
    relay: Option<Arc<dyn Relay>>,
    global_http_options: RwLock<HttpOptions>,
}

/// A chat robot bound to one team and bot identity.
///
/// `Robot` is a cheap handle; clones share the same listeners and buffers.
///
/// # Thread Safety
///
/// The listener list only grows and is read under a shared lock, so
/// registering from inside a callback is safe. The debug buffers are guarded
/// per robot.
#[derive(Clone)]
pub struct Robot {
    inner: Arc<RobotInner>,
}

impl Robot {
    /// Creates a robot without a relay.
    pub fn new(team_id: impl Into<String>, bot_id: impl Into<String>, debug_mode: bool) -> Self {
        Self::builder(team_id, bot_id).debug_mode(debug_mode).build()
    }

    /// Starts building a robot.
    pub fn builder(team_id: impl Into<String>, bot_id: impl Into<String>) -> RobotBuilder {
        RobotBuilder {
            team_id: team_id.into(),
            bot_id: bot_id.into(),
            debug_mode: false,
            relay: None,
            global_http_options: HttpOptions::default(),
        }
    }

    /// Tenant key.
    pub fn team_id(&self) -> &str {
        &self.inner.team_id
    }

    /// Bot identity used for addressed patterns.
    pub fn bot_id(&self) -> &str {
        &self.inner.bot_id
    }

    /// Whether responses are buffered instead of sent to the relay.
    pub fn debug_mode(&self) -> bool {
        self.inner.debug_mode.load(Ordering::Acquire)
    }

    /// Switches the delivery strategy for all subsequent responses.
    pub fn set_debug_mode(&self, enabled: bool) {
        self.inner.debug_mode.store(enabled, Ordering::Release);
    }

    pub(crate) fn relay(&self) -> Option<&Arc<dyn Relay>> {
        self.inner.relay.as_ref()
    }

    /// Robot-wide HTTP options, layered under call-site options.
    pub fn global_http_options(&self) -> HttpOptions {
        self.inner.global_http_options.read().clone()
    }

    /// Replaces the robot-wide HTTP options.
    pub fn set_global_http_options(&self, options: HttpOptions) {
        *self.inner.global_http_options.write() = options;
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a listener that tests `pattern` against the raw text.
    pub fn hear<F>(&self, pattern: &str, callback: F) -> RegisterResult
    where
        F: Fn(Response, Done) + Send + Sync + 'static,
    {
        let regex = Regex::new(pattern)?;
        self.add_listener(Listener::new(regex, callback));
        Ok(())
    }

    /// Registers a listener that only fires when the text is addressed to the bot.
    ///
    /// See [`respond_pattern`] for the accepted addressing forms.
    pub fn respond<F>(&self, pattern: &str, callback: F) -> RegisterResult
    where
        F: Fn(Response, Done) + Send + Sync + 'static,
    {
        let regex = self.respond_pattern(pattern)?;
        self.add_listener(Listener::new(regex, callback));
        Ok(())
    }

    /// Like [`hear`](Self::hear), completing once the returned future resolves.
    pub fn hear_async<F, Fut>(&self, pattern: &str, handler: F) -> RegisterResult
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hear(pattern, spawn_completion(handler))
    }

    /// Like [`respond`](Self::respond), completing once the returned future resolves.
    pub fn respond_async<F, Fut>(&self, pattern: &str, handler: F) -> RegisterResult
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.respond(pattern, spawn_completion(handler))
    }

    /// Rewrites `pattern` to require addressing to this robot.
    pub fn respond_pattern(&self, pattern: &str) -> Result<Regex, regex::Error> {
        respond_pattern(pattern, self.bot_id())
    }

    /// Appends a pre-built listener.
    pub fn add_listener(&self, listener: Listener) {
        trace!(pattern = listener.regex().as_str(), "Registering listener");
        self.inner.listeners.write().push(Arc::new(listener));
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Runs one receive cycle for `message`.
    ///
    /// Resolving the returned future is the completion signal: it happens
    /// immediately when nothing matches, and otherwise only after the matched
    /// listener completes its [`Done`]. A listener that keeps `Done` alive
    /// without completing it leaves the cycle pending indefinitely.
    ///
    /// A panic raised synchronously by the callback propagates to the caller.
    pub async fn receive(&self, message: impl Into<Arc<Message>>) -> ReceiveOutcome {
        let message = message.into();
        let span = span!(
            Level::DEBUG,
            "receive",
            team_id = %self.team_id(),
            bot_id = %self.bot_id(),
            room = message.room().unwrap_or("-"),
        );

        self.dispatch(message).instrument(span).await
    }

    /// Spawns a receive cycle and invokes `on_complete` when it resolves.
    pub fn receive_then<F>(&self, message: Message, on_complete: F) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce(ReceiveOutcome) + Send + 'static,
    {
        let robot = self.clone();
        tokio::spawn(async move {
            let outcome = robot.receive(message).await;
            on_complete(outcome);
        })
    }

    async fn dispatch(&self, message: Arc<Message>) -> ReceiveOutcome {
        let Some((index, listener, captures)) = self.first_match(&message) else {
            return if message.is_finished() {
                debug!("Message already finished, skipping listeners");
                ReceiveOutcome::Finished
            } else {
                trace!("No listener matched");
                ReceiveOutcome::Unmatched
            };
        };

        debug!(
            listener = index,
            pattern = listener.regex().as_str(),
            "Listener matched, invoking callback"
        );

        let (done, signal) = Done::channel();
        let response = Response::new(self.clone(), message, captures);
        listener.call(response, done);

        match signal.await {
            Ok(()) => {
                trace!(listener = index, "Listener completed");
                ReceiveOutcome::Completed
            }
            Err(_) => {
                warn!(
                    listener = index,
                    "Listener dropped its completion handle without completing"
                );
                ReceiveOutcome::Abandoned
            }
        }
    }

    fn first_match(&self, message: &Message) -> Option<(usize, Arc<Listener>, Captures)> {
        let listeners = self.inner.listeners.read();
        for (index, listener) in listeners.iter().enumerate() {
            if message.is_finished() {
                return None;
            }
            if let Some(captures) = listener.captures(message.text()) {
                return Some((index, Arc::clone(listener), captures));
            }
        }
        None
    }

    // =========================================================================
    // Debug Buffers
    // =========================================================================

    pub(crate) fn buffer(&self, strings: Vec<String>, reply: bool) {
        let buffer = if reply {
            &self.inner.to_reply
        } else {
            &self.inner.to_send
        };
        buffer.lock().extend(strings);
    }

    /// Strings buffered by `send` in debug mode, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.inner.to_send.lock().clone()
    }

    /// Strings buffered by `reply` in debug mode, oldest first.
    pub fn replies(&self) -> Vec<String> {
        self.inner.to_reply.lock().clone()
    }

    /// Empties both debug buffers.
    pub fn clear_buffers(&self) {
        self.inner.to_send.lock().clear();
        self.inner.to_reply.lock().clear();
    }
}

impl std::fmt::Debug for Robot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Robot")
            .field("team_id", &self.inner.team_id)
            .field("bot_id", &self.inner.bot_id)
            .field("debug_mode", &self.debug_mode())
            .field("listener_count", &self.listener_count())
            .field("has_relay", &self.inner.relay.is_some())
            .finish()
    }
}

/// Builder for [`Robot`].
pub struct RobotBuilder {
    team_id: String,
    bot_id: String,
    debug_mode: bool,
    relay: Option<Arc<dyn Relay>>,
    global_http_options: HttpOptions,
}

impl RobotBuilder {
    /// Sets the initial debug mode.
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Sets the relay used in production mode.
    pub fn relay(mut self, relay: Arc<dyn Relay>) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Sets the robot-wide HTTP options.
    pub fn global_http_options(mut self, options: HttpOptions) -> Self {
        self.global_http_options = options;
        self
    }

    /// Builds the robot.
    pub fn build(self) -> Robot {
        Robot {
            inner: Arc::new(RobotInner {
                team_id: self.team_id,
                bot_id: self.bot_id,
                debug_mode: AtomicBool::new(self.debug_mode),
                listeners: RwLock::new(Vec::new()),
                to_send: Mutex::new(Vec::new()),
                to_reply: Mutex::new(Vec::new()),
                relay: self.relay,
                global_http_options: RwLock::new(self.global_http_options),
            }),
        }
    }
}
