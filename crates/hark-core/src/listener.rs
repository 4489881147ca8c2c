//! Listeners bind a matcher to a handler.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::HandlerError;
use crate::handler::{BoxedHandler, HandlerResult};
use crate::matcher::BoxedMatcher;
use crate::message::Message;
use crate::response::Response;
use crate::robot::Robot;

/// Opaque handle returned when a listener is registered.
///
/// Ids are assigned in registration order, which is also dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the registration index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// A matcher paired with the handler it triggers.
pub struct Listener {
    id: ListenerId,
    matcher: BoxedMatcher,
    handler: BoxedHandler,
}

impl Listener {
    pub(crate) fn new(id: ListenerId, matcher: BoxedMatcher, handler: BoxedHandler) -> Self {
        Self {
            id,
            matcher,
            handler,
        }
    }

    /// Returns this listener's id.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Tests the matcher and, on a match, runs the handler to completion.
    ///
    /// Returns `None` when the matcher declines the message, otherwise the
    /// handler's own result. Failures are passed through untouched; isolating
    /// them is the robot's job.
    pub async fn invoke(&self, robot: &Robot, message: &Arc<Message>) -> Option<HandlerResult> {
        let matched = self.matcher.try_match(message)?;
        trace!(listener = %self.id, matched = matched.as_str(), "Listener matched");

        let response = Response::new(robot.clone(), Arc::clone(message), matched);
        Some((self.handler)(response).await)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// What happened to one listener during a dispatch.
#[derive(Debug)]
pub enum ListenerOutcome {
    /// The matcher declined the message.
    Skipped,
    /// The handler ran and succeeded.
    Handled,
    /// The handler failed, panicked or timed out.
    Failed(HandlerError),
}

impl ListenerOutcome {
    /// Returns `true` if the handler ran and succeeded.
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled)
    }

    /// Returns the failure, if any.
    pub fn error(&self) -> Option<&HandlerError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::into_handler;
    use crate::matcher::RegexMatcher;
    use crate::message::User;
    use crate::testing::RecordingAdapter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn listener(pattern: &str, counter: Arc<AtomicUsize>) -> Listener {
        Listener::new(
            ListenerId::new(0),
            Arc::new(RegexMatcher::new(pattern).unwrap()),
            into_handler(move |_res: Response| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }),
        )
    }

    fn message(text: &str) -> Arc<Message> {
        Arc::new(Message::with_text(User::new("1", "ann"), "room", text, "id"))
    }

    #[tokio::test]
    async fn test_invoke_without_match_has_no_side_effects() {
        let robot = Robot::new("hark", Arc::new(RecordingAdapter::default()));
        let counter = Arc::new(AtomicUsize::new(0));
        let l = listener("hi", Arc::clone(&counter));

        assert!(l.invoke(&robot, &message("bye")).await.is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invoke_runs_handler_once() {
        let robot = Robot::new("hark", Arc::new(RecordingAdapter::default()));
        let counter = Arc::new(AtomicUsize::new(0));
        let l = listener("hi", Arc::clone(&counter));

        let result = l.invoke(&robot, &message("hi there")).await;
        assert!(matches!(result, Some(Ok(()))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invoke_passes_handler_error_through() {
        let robot = Robot::new("hark", Arc::new(RecordingAdapter::default()));
        let l = Listener::new(
            ListenerId::new(3),
            Arc::new(RegexMatcher::new("hi").unwrap()),
            into_handler(|_res: Response| async { Err::<(), _>(std::io::Error::other("nope")) }),
        );

        let result = l.invoke(&robot, &message("hi")).await;
        assert_eq!(result.unwrap().unwrap_err().to_string(), "nope");
        assert_eq!(l.id().to_string(), "listener#3");
    }
}
