//! The shell adapter implementation.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use hark_core::{
    Adapter, AdapterError, AdapterResult, CONNECTED, ConfigurableAdapter, DISCONNECTED, Message,
    Robot, User,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ShellConfig;

type Input = Box<dyn AsyncBufRead + Send + Unpin>;
type Output = Box<dyn AsyncWrite + Send + Unpin>;

/// Talks to a person at a terminal.
///
/// Each input line becomes one message from the configured user in the
/// configured room. The prompt shows the robot's name. The session ends on
/// the quit command or end of input.
pub struct ShellAdapter {
    config: ShellConfig,
    input: Mutex<Input>,
    output: Mutex<Output>,
    closed: AtomicBool,
}

impl ShellAdapter {
    /// Creates an adapter on the process's stdin and stdout.
    ///
    /// Tokio reads stdin on a blocking thread that cannot be cancelled. If
    /// the session is stopped while waiting for input (Ctrl+C in
    /// `HarkRuntime::run`), runtime shutdown still waits for that read to
    /// return. Binaries should exit the process once the runtime returns.
    pub fn new(config: ShellConfig) -> Self {
        Self::with_io(config, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }

    /// Creates an adapter on arbitrary streams.
    pub fn with_io<R, W>(config: ShellConfig, input: R, output: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            config,
            input: Mutex::new(Box::new(input)),
            output: Mutex::new(Box::new(output)),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the adapter's configuration.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Returns `true` once [`Adapter::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn write(&self, text: &str) -> AdapterResult<()> {
        if self.is_closed() {
            return Err(AdapterError::Closed);
        }
        let mut output = self.output.lock().await;
        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
        Ok(())
    }

    /// Reads one line without its terminator. `None` means end of input.
    async fn read_line(&self) -> AdapterResult<Option<String>> {
        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn message_for(&self, text: String) -> Message {
        let user = User::new(self.config.user_id.clone(), self.config.user_name.clone());
        Message::with_text(user, self.config.room.clone(), text, Uuid::new_v4().to_string())
    }

    async fn session(&self, robot: &Robot) -> AdapterResult<()> {
        let prompt = format!("{}> ", robot.name());
        loop {
            self.write(&prompt).await?;

            let Some(line) = self.read_line().await? else {
                self.write("\n").await?;
                debug!("End of input");
                return Ok(());
            };

            if line.trim() == self.config.quit_command {
                debug!("Quit command received");
                return Ok(());
            }

            let report = self.receive(robot, self.message_for(line)).await;
            debug!(
                handled = report.handled(),
                failed = report.failed(),
                "Shell message dispatched"
            );
        }
    }
}

impl Default for ShellAdapter {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}

#[async_trait]
impl Adapter for ShellAdapter {
    async fn send(&self, _message: &Message, text: &str) -> AdapterResult<()> {
        self.write(&format!("{text}\n")).await
    }

    async fn emote(&self, message: &Message, text: &str) -> AdapterResult<()> {
        self.send(message, &format!("* {text}")).await
    }

    async fn run(&self, robot: &Robot) -> AdapterResult<()> {
        info!(
            user = %self.config.user_name,
            room = %self.config.room,
            "Shell session started"
        );
        robot.emit(CONNECTED, None);

        let result = self.session(robot).await;
        if let Err(e) = &result {
            warn!(error = %e, "Shell session aborted");
        }

        robot.emit(DISCONNECTED, None);
        robot.shutdown().await?;
        info!("Shell session ended");
        result
    }

    async fn close(&self) -> AdapterResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.output.lock().await.flush().await?;
        Ok(())
    }
}

impl ConfigurableAdapter for ShellAdapter {
    type Config = ShellConfig;

    fn name() -> &'static str {
        "shell"
    }

    fn from_config(config: ShellConfig) -> AdapterResult<Self> {
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hark_core::{EventHandler, Response};
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use tokio::io::{AsyncReadExt, DuplexStream};

    struct Session {
        robot: Robot,
        adapter: Arc<ShellAdapter>,
        terminal: DuplexStream,
    }

    impl Session {
        fn new(script: &'static str) -> Self {
            Self::with_config(script, ShellConfig::default())
        }

        fn with_config(script: &'static str, config: ShellConfig) -> Self {
            let (writer, terminal) = tokio::io::duplex(64 * 1024);
            let adapter = Arc::new(ShellAdapter::with_io(
                config,
                BufReader::new(script.as_bytes()),
                writer,
            ));
            let robot = Robot::new("Hark", adapter.clone());
            Self {
                robot,
                adapter,
                terminal,
            }
        }

        /// Drops every handle on the adapter and returns what it printed.
        async fn transcript(self) -> String {
            let Self {
                robot,
                adapter,
                mut terminal,
            } = self;
            drop(robot);
            drop(adapter);

            let mut out = String::new();
            terminal.read_to_string(&mut out).await.unwrap();
            out
        }
    }

    fn count_events(robot: &Robot, event_type: &str) -> Arc<AtomicUsize> {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        robot.on(
            event_type,
            EventHandler::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        counter
    }

    #[tokio::test]
    async fn test_session_until_quit() {
        let session = Session::new("ping\nhark: status\nquit\nping\n");
        let robot = &session.robot;
        robot
            .hear("ping", |res: Response| async move { res.send("pong").await })
            .unwrap();
        robot
            .respond("status", |res: Response| async move { res.reply("all good").await })
            .unwrap();
        let connected = count_events(robot, CONNECTED);
        let disconnected = count_events(robot, DISCONNECTED);

        robot.run().await.unwrap();

        assert_eq!(connected.load(Ordering::SeqCst), 1);
        assert_eq!(disconnected.load(Ordering::SeqCst), 1);
        assert!(session.adapter.is_closed());
        assert_eq!(
            session.transcript().await,
            "Hark> pong\nHark> Shell: all good\nHark> "
        );
    }

    #[tokio::test]
    async fn test_session_until_end_of_input() {
        let session = Session::new("ping\r\n");
        session
            .robot
            .hear("^ping$", |res: Response| async move { res.send("pong").await })
            .unwrap();
        let disconnected = count_events(&session.robot, DISCONNECTED);

        session.robot.run().await.unwrap();

        assert_eq!(disconnected.load(Ordering::SeqCst), 1);
        assert_eq!(session.transcript().await, "Hark> pong\nHark> \n");
    }

    #[tokio::test]
    async fn test_emote_and_custom_quit() {
        let config = ShellConfig {
            quit_command: "exit".to_string(),
            ..Default::default()
        };
        let session = Session::with_config("dance\n  exit  \ndance\n", config);
        session
            .robot
            .hear("dance", |res: Response| async move { res.emote("dances").await })
            .unwrap();

        session.robot.run().await.unwrap();
        assert_eq!(session.transcript().await, "Hark> * dances\nHark> ");
    }

    #[tokio::test]
    async fn test_messages_carry_configured_identity() {
        let config = ShellConfig {
            user_name: "ann".to_string(),
            user_id: "7".to_string(),
            room: "terminal".to_string(),
            ..Default::default()
        };
        let session = Session::with_config("one\ntwo\n", config);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        session.robot.listen(
            |msg: &Message| msg.text().map(hark_core::MatchResult::new),
            move |res: Response| {
                let sink = Arc::clone(&sink);
                async move {
                    let msg = res.message();
                    let user = msg.user().cloned();
                    sink.lock().unwrap().push((
                        user.map(|u| (u.id().to_string(), u.name().to_string())),
                        msg.room().to_string(),
                        msg.text().map(str::to_string),
                        msg.id().map(str::to_string),
                    ));
                }
            },
        );

        session.robot.run().await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        for (user, room, _, id) in &seen {
            assert_eq!(user.as_ref(), Some(&("7".to_string(), "ann".to_string())));
            assert_eq!(room, "terminal");
            assert!(id.as_deref().is_some_and(|id| Uuid::parse_str(id).is_ok()));
        }
        assert_eq!(seen[0].2.as_deref(), Some("one"));
        assert_eq!(seen[1].2.as_deref(), Some("two"));
        assert_ne!(seen[0].3, seen[1].3);
    }

    #[tokio::test]
    async fn test_blank_lines_reach_no_listener() {
        let session = Session::new("\nping\n\n");
        session
            .robot
            .hear(".*", |res: Response| async move { res.send("heard").await })
            .unwrap();

        session.robot.run().await.unwrap();
        assert_eq!(
            session.transcript().await,
            "Hark> Hark> heard\nHark> Hark> \n"
        );
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let session = Session::new("");
        session.robot.shutdown().await.unwrap();
        let err = session.robot.send("shell", "late").await.unwrap_err();
        assert!(matches!(err, AdapterError::Closed));
    }

    #[tokio::test]
    async fn test_failing_handler_keeps_session_alive() {
        let session = Session::new("boom\nping\n");
        session
            .robot
            .hear("boom", |_res: Response| async {
                Err::<(), _>(AdapterError::Internal("kaboom".to_string()))
            })
            .unwrap();
        session
            .robot
            .hear("ping", |res: Response| async move { res.send("pong").await })
            .unwrap();

        session.robot.run().await.unwrap();
        assert_eq!(session.transcript().await, "Hark> Hark> pong\nHark> \n");
    }
}
