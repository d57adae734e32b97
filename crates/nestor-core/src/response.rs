//! Per-match response handle.
//!
//! A [`Response`] is created for exactly one successful match and handed to
//! the listener callback. Each `send`/`reply` call is delivered immediately;
//! nothing is batched across calls.
//!
//! Delivery branches on the robot's debug mode:
//!
//! - **debug**: strings are appended to the robot's `sent`/`replies` buffers
//!   during the `send`/`reply` call itself, and the call always succeeds.
//! - **production**: the message must carry a user and a room and at least
//!   one string must be given, otherwise the call fails without any I/O.
//!   The strings are then posted to the relay in a single request.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::error::{DeliveryError, DeliveryResult};
use crate::listener::Captures;
use crate::message::Message;
use crate::relay::OutboundMessage;
use crate::robot::Robot;

/// Handle bound to (robot, message, match).
#[derive(Debug, Clone)]
pub struct Response {
    robot: Robot,
    message: Arc<Message>,
    captures: Captures,
}

impl Response {
    /// Creates a response for one match.
    pub fn new(robot: Robot, message: Arc<Message>, captures: Captures) -> Self {
        Self {
            robot,
            message,
            captures,
        }
    }

    /// The robot that dispatched the message.
    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// The matched message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Capture groups of the listener's pattern.
    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    /// Sends strings to the message's room.
    ///
    /// In debug mode the strings are buffered before this returns, so a
    /// callback that never awaits the result still records its output.
    /// Relay delivery happens when the returned future is awaited.
    pub fn send<I, S>(&self, strings: I) -> BoxFuture<'static, DeliveryResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deliver(strings.into_iter().map(Into::into).collect(), false)
    }

    /// Sends strings as a reply to the message's author.
    ///
    /// The reply flag is passed through to the relay; mentioning the user is
    /// left to the downstream transport. Buffering follows [`send`](Self::send).
    pub fn reply<I, S>(&self, strings: I) -> BoxFuture<'static, DeliveryResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deliver(strings.into_iter().map(Into::into).collect(), true)
    }

    /// Marks the message finished.
    ///
    /// This does not interrupt the running callback.
    pub fn finish(&self) {
        self.message.finish();
    }

    /// Picks one item at random, or `None` if `items` is empty.
    pub fn random<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut rand::thread_rng())
    }

    fn deliver(&self, strings: Vec<String>, reply: bool) -> BoxFuture<'static, DeliveryResult> {
        if self.robot.debug_mode() {
            self.robot.buffer(strings, reply);
            return future::ready(Ok(())).boxed();
        }

        let robot = self.robot.clone();
        let message = Arc::clone(&self.message);
        async move {
            let result = deliver_remote(&robot, &message, strings, reply).await;
            match &result {
                Ok(()) => debug!(reply, "Delivered message to relay"),
                Err(e) if e.is_precondition() => debug!(reply, error = %e, "Delivery skipped"),
                Err(e) => warn!(reply, error = %e, "Relay delivery failed"),
            }
            result
        }
        .boxed()
    }
}

async fn deliver_remote(
    robot: &Robot,
    message: &Message,
    strings: Vec<String>,
    reply: bool,
) -> DeliveryResult {
    let user = message.user().ok_or(DeliveryError::MissingUser)?;
    let room = message.room().ok_or(DeliveryError::MissingRoom)?;
    if strings.is_empty() {
        return Err(DeliveryError::NoStrings);
    }
    let relay = robot.relay().ok_or(DeliveryError::RelayUnavailable)?;

    let outbound = OutboundMessage {
        team_id: robot.team_id().to_string(),
        user_uid: user.id.clone(),
        channel_uid: room.to_string(),
        strings,
        reply,
    };
    relay.deliver(&outbound).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::User;
    use crate::relay::Relay;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingRelay {
        calls: Mutex<Vec<OutboundMessage>>,
        status: u16,
    }

    #[async_trait]
    impl Relay for RecordingRelay {
        async fn deliver(&self, message: &OutboundMessage) -> DeliveryResult {
            self.calls.lock().push(message.clone());
            if self.status == 202 {
                Ok(())
            } else {
                Err(DeliveryError::Rejected {
                    status: self.status,
                })
            }
        }
    }

    fn production_robot(status: u16) -> (Robot, Arc<RecordingRelay>) {
        let relay = Arc::new(RecordingRelay {
            status,
            ..Default::default()
        });
        let robot = Robot::builder("T1", "nestor")
            .relay(relay.clone())
            .build();
        (robot, relay)
    }

    fn response(robot: Robot, message: Message) -> Response {
        Response::new(robot, Arc::new(message), Captures::default())
    }

    #[tokio::test]
    async fn test_debug_buffers_in_order() {
        let robot = Robot::builder("T1", "nestor").debug_mode(true).build();
        let res = response(robot.clone(), Message::new("hi"));

        assert!(res.send(["one", "two"]).await.is_ok());
        assert!(res.reply(["three"]).await.is_ok());
        assert!(res.send(["four"]).await.is_ok());

        assert_eq!(robot.sent(), vec!["one", "two", "four"]);
        assert_eq!(robot.replies(), vec!["three"]);
    }

    #[test]
    fn test_debug_buffers_without_awaiting() {
        let robot = Robot::builder("T1", "nestor").debug_mode(true).build();
        let res = response(robot.clone(), Message::new("hi"));

        let _ = res.send(["one"]);
        let _ = res.reply(["two"]);

        assert_eq!(robot.sent(), vec!["one"]);
        assert_eq!(robot.replies(), vec!["two"]);
    }

    #[tokio::test]
    async fn test_debug_ignores_missing_room() {
        let robot = Robot::builder("T1", "nestor").debug_mode(true).build();
        let res = response(robot.clone(), Message::new("hi"));

        assert!(res.send(["ok"]).await.is_ok());
        assert_eq!(robot.sent(), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_missing_user_skips_relay() {
        let (robot, relay) = production_robot(202);
        let res = response(robot, Message::new("hi").in_room("C1"));

        assert_eq!(res.send(["x"]).await, Err(DeliveryError::MissingUser));
        assert!(relay.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_room_skips_relay() {
        let (robot, relay) = production_robot(202);
        let res = response(robot, Message::new("hi").with_user(User::new("U1")));

        assert_eq!(res.send(["x"]).await, Err(DeliveryError::MissingRoom));
        assert!(relay.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_strings_skip_relay() {
        let (robot, relay) = production_robot(202);
        let res = response(
            robot,
            Message::new("hi").with_user(User::new("U1")).in_room("C1"),
        );

        let empty: [&str; 0] = [];
        assert_eq!(res.reply(empty).await, Err(DeliveryError::NoStrings));
        assert!(relay.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_production_delivery() {
        let (robot, relay) = production_robot(202);
        let res = response(
            robot,
            Message::new("hi").with_user(User::new("U1")).in_room("C1"),
        );

        assert!(res.reply(["a", "b"]).await.is_ok());

        let calls = relay.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            OutboundMessage {
                team_id: "T1".into(),
                user_uid: "U1".into(),
                channel_uid: "C1".into(),
                strings: vec!["a".into(), "b".into()],
                reply: true,
            }
        );
    }

    #[tokio::test]
    async fn test_production_rejection_is_not_raised() {
        let (robot, _relay) = production_robot(500);
        let res = response(
            robot,
            Message::new("hi").with_user(User::new("U1")).in_room("C1"),
        );

        assert_eq!(
            res.send(["a"]).await,
            Err(DeliveryError::Rejected { status: 500 })
        );
    }

    #[tokio::test]
    async fn test_production_without_relay() {
        let robot = Robot::new("T1", "nestor", false);
        let res = response(
            robot,
            Message::new("hi").with_user(User::new("U1")).in_room("C1"),
        );

        assert_eq!(
            res.send(["a"]).await,
            Err(DeliveryError::RelayUnavailable)
        );
    }

    #[test]
    fn test_finish_marks_message() {
        let robot = Robot::new("T1", "nestor", true);
        let res = response(robot, Message::new("hi"));
        res.finish();
        assert!(res.message().is_finished());
    }

    #[test]
    fn test_random() {
        let robot = Robot::new("T1", "nestor", true);
        let res = response(robot, Message::new("hi"));
        let items = ["a", "b", "c"];
        assert!(items.contains(res.random(&items).unwrap()));
        assert!(res.random::<&str>(&[]).is_none());
    }
}
