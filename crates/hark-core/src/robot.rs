//! The robot orchestrator.
//!
//! A [`Robot`] owns one adapter, an ordered list of listeners and a lifecycle
//! [`EventBus`]. Transports feed messages into [`Robot::receive`], which runs
//! every listener in registration order and isolates their failures.
//!
//! # Example
//!
//! ```rust,ignore
//! let robot = Robot::new("Pybot", Arc::new(ShellAdapter::default()));
//!
//! robot.hear("hello", |res: Response| async move {
//!     res.send("hi!").await
//! })?;
//!
//! robot.respond(r"(?i)status", |res: Response| async move {
//!     res.reply("all systems nominal").await
//! })?;
//!
//! robot.run().await?;
//! ```

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{Instrument, Level, debug, error, info, span, trace};

use crate::adapter::BoxedAdapter;
use crate::bus::{EventBus, EventData, EventHandler, PublishOutcome};
use crate::error::{AdapterResult, BusResult, CoreResult, HandlerError};
use crate::handler::{BoxedHandler, IntoHandlerResult, into_handler, panic_message};
use crate::listener::{Listener, ListenerId, ListenerOutcome};
use crate::matcher::{BoxedMatcher, DirectMessageMatcher, Matcher, RegexMatcher};
use crate::message::{Message, User};
use crate::response::Response;

// =============================================================================
// Dispatch Report
// =============================================================================

/// Per-listener results of a single [`Robot::receive`] call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    outcomes: Vec<(ListenerId, ListenerOutcome)>,
}

impl DispatchReport {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, id: ListenerId, outcome: ListenerOutcome) {
        self.outcomes.push((id, outcome));
    }

    /// Returns every outcome in dispatch order.
    pub fn outcomes(&self) -> &[(ListenerId, ListenerOutcome)] {
        &self.outcomes
    }

    /// Returns the outcome for one listener.
    pub fn outcome(&self, id: ListenerId) -> Option<&ListenerOutcome> {
        self.outcomes
            .iter()
            .find(|(lid, _)| *lid == id)
            .map(|(_, outcome)| outcome)
    }

    /// Number of listeners whose handler ran and succeeded.
    pub fn handled(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_handled()).count()
    }

    /// Number of listeners whose handler failed.
    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// Number of listeners whose matcher declined the message.
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ListenerOutcome::Skipped))
            .count()
    }

    /// Iterates over failed listeners and their errors.
    pub fn failures(&self) -> impl Iterator<Item = (ListenerId, &HandlerError)> {
        self.outcomes
            .iter()
            .filter_map(|(id, o)| o.error().map(|e| (*id, e)))
    }
}

// =============================================================================
// Robot
// =============================================================================

struct RobotInner {
    name: String,
    adapter: BoxedAdapter,
    listeners: RwLock<Vec<Arc<Listener>>>,
    bus: EventBus,
    handler_timeout: RwLock<Option<Duration>>,
}

/// The orchestrator.
///
/// Cloning is cheap; every clone refers to the same listeners, bus and
/// adapter.
#[derive(Clone)]
pub struct Robot {
    inner: Arc<RobotInner>,
}

impl Robot {
    /// Creates a robot named `name` that talks through `adapter`.
    pub fn new(name: impl Into<String>, adapter: BoxedAdapter) -> Self {
        let name = name.into();
        debug!(robot = %name, "Creating robot");
        Self {
            inner: Arc::new(RobotInner {
                name,
                adapter,
                listeners: RwLock::new(Vec::new()),
                bus: EventBus::new(),
                handler_timeout: RwLock::new(None),
            }),
        }
    }

    /// Builder-style variant of [`set_handler_timeout`](Self::set_handler_timeout).
    pub fn with_handler_timeout(self, timeout: Duration) -> Self {
        self.set_handler_timeout(Some(timeout));
        self
    }

    /// Bounds how long a single handler may run. `None` disables the limit.
    pub fn set_handler_timeout(&self, timeout: Option<Duration>) {
        *self.inner.handler_timeout.write() = timeout;
    }

    /// Returns the configured handler timeout.
    pub fn handler_timeout(&self) -> Option<Duration> {
        *self.inner.handler_timeout.read()
    }

    /// Returns the robot's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the adapter.
    pub fn adapter(&self) -> &BoxedAdapter {
        &self.inner.adapter
    }

    /// Returns the lifecycle event bus.
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Registers a listener for messages containing `pattern` anywhere.
    pub fn hear<F, Fut, R>(&self, pattern: &str, handler: F) -> CoreResult<ListenerId>
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult + 'static,
    {
        let matcher = RegexMatcher::new(pattern)?;
        Ok(self.listen(matcher, handler))
    }

    /// Registers a listener for messages addressed to the robot by name.
    ///
    /// The wrapped pattern sees the full text, address included.
    pub fn respond<F, Fut, R>(&self, pattern: &str, handler: F) -> CoreResult<ListenerId>
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult + 'static,
    {
        let matcher = DirectMessageMatcher::new(RegexMatcher::new(pattern)?, self.name());
        Ok(self.listen(matcher, handler))
    }

    /// Registers a listener with an arbitrary matcher.
    pub fn listen<M, F, Fut, R>(&self, matcher: M, handler: F) -> ListenerId
    where
        M: Matcher + 'static,
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult + 'static,
    {
        self.listen_boxed(Arc::new(matcher), into_handler(handler))
    }

    /// Registers an already type-erased matcher and handler.
    pub fn listen_boxed(&self, matcher: BoxedMatcher, handler: BoxedHandler) -> ListenerId {
        let mut listeners = self.inner.listeners.write();
        let id = ListenerId::new(listeners.len());
        listeners.push(Arc::new(Listener::new(id, matcher, handler)));
        debug!(robot = %self.inner.name, listener = %id, "Listener registered");
        id
    }

    // -------------------------------------------------------------------------
    // Lifecycle Events
    // -------------------------------------------------------------------------

    /// Subscribes `handler` to `event_type` and hands it back, so the caller
    /// can keep it for a later [`off`](Self::off).
    pub fn on(&self, event_type: &str, handler: EventHandler) -> EventHandler {
        self.inner.bus.subscribe(event_type, handler.clone());
        handler
    }

    /// Unsubscribes `handler` from `event_type`.
    pub fn off(&self, event_type: &str, handler: &EventHandler) -> BusResult<()> {
        self.inner.bus.unsubscribe(event_type, handler)
    }

    /// Publishes `event_type` on the lifecycle bus.
    pub fn emit(&self, event_type: &str, data: Option<&EventData>) -> PublishOutcome {
        debug!(robot = %self.inner.name, event_type, "Emitting lifecycle event");
        self.inner.bus.publish(event_type, data)
    }

    // -------------------------------------------------------------------------
    // Outbound
    // -------------------------------------------------------------------------

    /// Sends `text` to `room` without an inbound message.
    pub async fn send(&self, room: &str, text: &str) -> AdapterResult<()> {
        let message = Message::new(None, room);
        self.inner.adapter.send(&message, text).await
    }

    /// Replies to `user` in `room` without an inbound message.
    pub async fn reply(&self, user: User, room: &str, text: &str) -> AdapterResult<()> {
        let message = Message::new(Some(user), room);
        self.inner.adapter.reply(&message, text).await
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    /// Runs the adapter's transport loop until it ends.
    pub async fn run(&self) -> AdapterResult<()> {
        info!(robot = %self.inner.name, listeners = self.listener_count(), "Robot running");
        let result = self.inner.adapter.run(self).await;
        info!(robot = %self.inner.name, "Robot stopped");
        result
    }

    /// Closes the adapter.
    pub async fn shutdown(&self) -> AdapterResult<()> {
        info!(robot = %self.inner.name, "Shutting down");
        self.inner.adapter.close().await
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Dispatches `message` to every listener in registration order.
    ///
    /// A failing listener is logged and the remaining listeners still run.
    /// Listeners registered while a dispatch is in flight take part from the
    /// next message on.
    pub async fn receive(&self, message: Message) -> DispatchReport {
        let message = Arc::new(message);
        let span = span!(
            Level::DEBUG,
            "dispatch",
            robot = %self.inner.name,
            room = message.room(),
            message_id = message.id().unwrap_or_default(),
        );

        async {
            let listeners = self.inner.listeners.read().clone();
            let timeout = self.handler_timeout();
            let mut report = DispatchReport::with_capacity(listeners.len());

            for listener in &listeners {
                let outcome = self.invoke_isolated(listener, &message, timeout).await;
                match &outcome {
                    ListenerOutcome::Skipped => {
                        trace!(listener = %listener.id(), "Listener skipped");
                    }
                    ListenerOutcome::Handled => {
                        debug!(listener = %listener.id(), "Listener handled message");
                    }
                    ListenerOutcome::Failed(e) => {
                        error!(
                            listener = %listener.id(),
                            error = %e,
                            details = ?e,
                            "Listener failed, continuing dispatch"
                        );
                    }
                }
                report.push(listener.id(), outcome);
            }

            debug!(
                handled = report.handled(),
                failed = report.failed(),
                "Dispatch complete"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn invoke_isolated(
        &self,
        listener: &Listener,
        message: &Arc<Message>,
        timeout: Option<Duration>,
    ) -> ListenerOutcome {
        let call = AssertUnwindSafe(listener.invoke(self, message)).catch_unwind();
        let result = match timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => return ListenerOutcome::Failed(HandlerError::TimedOut(limit)),
            },
            None => call.await,
        };

        match result {
            Ok(None) => ListenerOutcome::Skipped,
            Ok(Some(Ok(()))) => ListenerOutcome::Handled,
            Ok(Some(Err(e))) => ListenerOutcome::Failed(HandlerError::Failed(e)),
            Err(payload) => {
                ListenerOutcome::Failed(HandlerError::Panicked(panic_message(payload.as_ref())))
            }
        }
    }
}

impl fmt::Debug for Robot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Robot")
            .field("name", &self.inner.name)
            .field("listeners", &self.listener_count())
            .field("events", &self.inner.bus)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{CONNECTED, DISCONNECTED};
    use crate::error::BusError;
    use crate::matcher::MatchResult;
    use crate::testing::RecordingAdapter;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn robot() -> (Robot, Arc<RecordingAdapter>) {
        let adapter = Arc::new(RecordingAdapter::default());
        (Robot::new("Pybot", adapter.clone()), adapter)
    }

    fn said(text: &str) -> Message {
        Message::with_text(User::new("42", "ann"), "room", text, "m")
    }

    fn explode() {
        panic!("handler exploded")
    }

    fn counter_handler(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn(Response) -> futures::future::Ready<()> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_res| {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[tokio::test]
    async fn test_hear_matches_anywhere() {
        let (robot, _) = robot();
        let counter = Arc::new(AtomicUsize::new(0));
        robot.hear("hi", counter_handler(&counter)).unwrap();

        let report = robot.receive(said("hi there")).await;
        assert_eq!(report.handled(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let report = robot.receive(said("bye")).await;
        assert_eq!(report.skipped(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_respond_requires_address() {
        let (robot, _) = robot();
        let counter = Arc::new(AtomicUsize::new(0));
        robot.respond("status", counter_handler(&counter)).unwrap();

        robot.receive(said("pybot: status")).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        robot.receive(said("status")).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_rejected() {
        let (robot, _) = robot();
        assert!(robot.hear("(unclosed", |_res: Response| async {}).is_err());
        assert!(robot.respond("[z-a]", |_res: Response| async {}).is_err());
        assert_eq!(robot.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_every_listener_runs_in_order() {
        let (robot, _) = robot();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            robot
                .hear("ping", move |_res: Response| {
                    let order = Arc::clone(&order);
                    async move { order.lock().push(tag) }
                })
                .unwrap();
        }

        let report = robot.receive(said("ping")).await;
        assert_eq!(report.handled(), 3);
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
        let ids: Vec<usize> = report.outcomes().iter().map(|(id, _)| id.index()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_catch_all_skips_empty_text() {
        let (robot, _) = robot();
        let counter = Arc::new(AtomicUsize::new(0));
        robot.hear(".*", counter_handler(&counter)).unwrap();

        let report = robot.receive(said("")).await;
        assert_eq!(report.handled(), 0);
        assert_eq!(report.skipped(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        robot.receive(said("anything")).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_dispatch() {
        let (robot, _) = robot();
        let counter = Arc::new(AtomicUsize::new(0));

        let failing = robot
            .hear("go", |_res: Response| async {
                Err::<(), _>(std::io::Error::other("handler broke"))
            })
            .unwrap();
        let panicking = robot
            .hear("go", |_res: Response| async { explode() })
            .unwrap();
        robot.hear("go", counter_handler(&counter)).unwrap();

        let report = robot.receive(said("go")).await;
        assert_eq!(report.failed(), 2);
        assert_eq!(report.handled(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert!(matches!(
            report.outcome(failing),
            Some(ListenerOutcome::Failed(HandlerError::Failed(e))) if e.to_string() == "handler broke"
        ));
        assert!(matches!(
            report.outcome(panicking),
            Some(ListenerOutcome::Failed(HandlerError::Panicked(msg))) if msg == "handler exploded"
        ));
    }

    #[tokio::test]
    async fn test_handler_timeout() {
        let (robot, _) = robot();
        let robot = robot.with_handler_timeout(Duration::from_millis(20));
        let counter = Arc::new(AtomicUsize::new(0));

        let slow = robot
            .hear("slow", |_res: Response| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            })
            .unwrap();
        robot.hear("slow", counter_handler(&counter)).unwrap();

        let report = robot.receive(said("slow")).await;
        assert!(matches!(
            report.outcome(slow),
            Some(ListenerOutcome::Failed(HandlerError::TimedOut(d))) if *d == Duration::from_millis(20)
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listen_with_custom_matcher() {
        let (robot, adapter) = robot();
        robot.listen(
            |msg: &Message| {
                msg.user()
                    .filter(|u| u.id() == "42")
                    .map(|_| MatchResult::new(msg.text().unwrap_or_default()))
            },
            |res: Response| async move { res.reply("I know you").await },
        );

        robot.receive(said("anything")).await;
        robot
            .receive(Message::with_text(User::new("7", "bob"), "room", "x", "m2"))
            .await;
        assert_eq!(adapter.sent_texts(), vec!["ann: I know you"]);
    }

    #[tokio::test]
    async fn test_response_is_anchored_to_message() {
        let (robot, adapter) = robot();
        robot
            .hear(r"echo (?<word>\w+)", |res: Response| async move {
                let word = res.named("word").unwrap_or_default().to_owned();
                res.send(&word).await
            })
            .unwrap();

        robot.receive(said("please echo banana")).await;
        let calls = adapter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text, "banana");
        assert_eq!(calls[0].room, "room");
        assert_eq!(calls[0].message_id.as_deref(), Some("m"));
    }

    #[tokio::test]
    async fn test_registration_during_dispatch_applies_next_time() {
        let (robot, _) = robot();
        let counter = Arc::new(AtomicUsize::new(0));

        let late_counter = Arc::clone(&counter);
        robot
            .hear("x", move |res: Response| {
                let late_counter = Arc::clone(&late_counter);
                async move {
                    let handler = counter_handler(&late_counter);
                    res.robot().hear("x", handler).map(|_| ())
                }
            })
            .unwrap();

        let report = robot.receive(said("x")).await;
        assert_eq!(report.outcomes().len(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        robot.receive(said("x")).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_outbound_without_inbound_message() {
        let (robot, adapter) = robot();
        robot.send("general", "hello all").await.unwrap();
        robot
            .reply(User::new("9", "cid"), "general", "hello you")
            .await
            .unwrap();

        let calls = adapter.calls();
        assert_eq!(adapter.sent_texts(), vec!["hello all", "cid: hello you"]);
        assert!(calls.iter().all(|c| c.room == "general" && c.message_id.is_none()));
        assert_eq!(calls[1].user.as_deref(), Some("cid"));
    }

    #[tokio::test]
    async fn test_on_off_emit() {
        let (robot, _) = robot();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let handler = robot.on(
            CONNECTED,
            EventHandler::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        robot.on(CONNECTED, handler.clone());

        assert_eq!(robot.emit(CONNECTED, None).invoked, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        robot.off(CONNECTED, &handler).unwrap();
        robot.emit(CONNECTED, None);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert_eq!(
            robot.off(DISCONNECTED, &handler),
            Err(BusError::SubscriptionNotFound {
                event_type: DISCONNECTED.into()
            })
        );
    }

    #[tokio::test]
    async fn test_run_and_shutdown_delegate_to_adapter() {
        let (robot, adapter) = robot();
        robot.run().await.unwrap();
        robot.shutdown().await.unwrap();
        assert_eq!(adapter.runs(), 1);
        assert!(adapter.is_closed());
    }
}
