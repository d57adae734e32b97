//! Listeners and the completion contract.
//!
//! A [`Listener`] pairs a compiled pattern with a callback. When the robot
//! dispatches a message to it, the callback receives a [`Response`] and a
//! [`Done`] handle. Every callback follows the same contract: the receive
//! cycle ends when `Done` is completed, whether that happens before the
//! callback returns or long after.
//!
//! ```rust,ignore
//! // Synchronous style: complete before returning. Debug-mode sends are
//! // buffered by the call itself.
//! robot.hear("ping", |res, done| {
//!     let _ = res.send(["pong"]);
//!     done.complete();
//! })?;
//!
//! // Deferred style: complete once the spawned work is done.
//! robot.hear("fetch", |res, done| {
//!     tokio::spawn(async move {
//!         res.send(["fetched"]).await.ok();
//!         done.complete();
//!     });
//! })?;
//! ```

use std::future::Future;
use std::ops::Index;
use std::sync::Arc;

use regex::Regex;
use tokio::sync::oneshot;

use crate::response::Response;

/// A type-erased listener callback.
pub type Callback = Arc<dyn Fn(Response, Done) + Send + Sync>;

/// Completion handle passed to every listener callback.
///
/// Completing consumes the handle, so a cycle is signalled at most once.
/// Dropping it without completing abandons the cycle.
#[derive(Debug)]
#[must_use = "the receive cycle stays pending until `complete` is called"]
pub struct Done {
    tx: Option<oneshot::Sender<()>>,
}

impl Done {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Signals that the listener has finished its work.
    pub fn complete(mut self) {
        if let Some(tx) = self.tx.take() {
            // The receiver is gone only if the receive future was dropped.
            let _ = tx.send(());
        }
    }
}

/// Owned capture groups from a successful match.
///
/// Index `0` is the whole match; unmatched optional groups are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    groups: Vec<Option<String>>,
}

impl Captures {
    fn from_regex(caps: &regex::Captures<'_>) -> Self {
        Self {
            groups: caps
                .iter()
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect(),
        }
    }

    /// Returns group `i`, if it participated in the match.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.groups.get(i).and_then(|g| g.as_deref())
    }

    /// Returns the number of groups, including the whole match.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Index<usize> for Captures {
    type Output = str;

    /// # Panics
    ///
    /// Panics if group `i` does not exist or did not participate in the match.
    fn index(&self, i: usize) -> &str {
        self.get(i)
            .unwrap_or_else(|| panic!("no group at index '{i}'"))
    }
}

/// A registered (pattern, callback) pair.
#[derive(Clone)]
pub struct Listener {
    regex: Regex,
    callback: Callback,
}

impl Listener {
    /// Creates a listener from a compiled pattern.
    pub fn new<F>(regex: Regex, callback: F) -> Self
    where
        F: Fn(Response, Done) + Send + Sync + 'static,
    {
        Self {
            regex,
            callback: Arc::new(callback),
        }
    }

    /// Returns the compiled pattern.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Tests `text` against the pattern, returning owned captures on a match.
    pub fn captures(&self, text: &str) -> Option<Captures> {
        self.regex.captures(text).map(|c| Captures::from_regex(&c))
    }

    pub(crate) fn call(&self, response: Response, done: Done) {
        (self.callback)(response, done)
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("pattern", &self.regex.as_str())
            .finish()
    }
}

/// Adapts an async handler to the completion contract.
///
/// The future runs on the ambient Tokio runtime and `Done` is completed once
/// it resolves. A panic inside the future drops `Done`, abandoning the cycle.
pub(crate) fn spawn_completion<F, Fut>(handler: F) -> impl Fn(Response, Done) + Send + Sync + 'static
where
    F: Fn(Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    move |response, done| {
        let fut = handler(response);
        tokio::spawn(async move {
            fut.await;
            done.complete();
        });
    }
}
