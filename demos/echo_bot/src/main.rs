//! Echo Bot Example
//!
//! A terminal bot showing the three ways to register listeners:
//!
//! - `hear`: fires on any message containing the pattern
//! - `respond`: fires only when the message starts with the bot's name
//! - `listen`: fires on whatever a custom matcher accepts
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot -- --name Pybot
//! ```
//!
//! ```text
//! Pybot> ping
//! PONG
//! Pybot> pybot: echo hello there
//! Shell: hello there
//! Pybot> quit
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use hark::prelude::*;
use hark::runtime::ConfigLoader;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(version, about = "A terminal echo bot built on Hark")]
struct Args {
    /// Configuration file (defaults to searching for hark.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name the bot answers to, overriding the configuration
    #[arg(short, long)]
    name: Option<String>,

    /// Configuration profile, e.g. "dev" or "prod"
    #[arg(short, long)]
    profile: Option<String>,
}

// ============================================================================
// Listeners
// ============================================================================

fn register_listeners(robot: &Robot) -> Result<()> {
    // Unaddressed: anyone saying "ping" anywhere gets an answer.
    robot.hear(r"(?i)\bping\b", |res: Response| async move {
        res.send("PONG").await
    })?;

    robot.hear(r"(?i)\bdance\b", |res: Response| async move {
        res.emote("does a little dance").await
    })?;

    // Addressed: "<name>: echo <text>". The pattern sees the whole line,
    // address included.
    robot.respond(r"echo (?<text>.+)$", |res: Response| async move {
        let text = res.named("text").unwrap_or_default().to_string();
        res.reply(&text).await
    })?;

    robot.respond(r"(?i)topic (.+)$", |res: Response| async move {
        let topic = res.group(1).unwrap_or_default().to_string();
        res.topic(&topic).await?;
        res.reply(&format!("topic set to '{topic}'")).await
    })?;

    robot.respond(r"(?i)\bhelp\b", |res: Response| async move {
        let name = res.robot().name().to_string();
        let help = format!(
            "ping                 - PONG\n\
             dance                - watch me\n\
             {name}: echo <text>  - repeat after you\n\
             {name}: topic <text> - set the topic\n\
             {name}: fail         - a handler that errors\n\
             quit                 - leave"
        );
        res.send(&help).await
    })?;

    // Failing handlers are logged; the other listeners still run.
    robot.respond(r"(?i)\bfail\b", |_res: Response| async move {
        Err::<(), _>(anyhow!("this handler always fails"))
    })?;

    // Custom matcher: every message with text, for the log.
    robot.listen(
        |message: &Message| {
            message
                .text()
                .filter(|text| !text.is_empty())
                .map(MatchResult::new)
        },
        |res: Response| async move {
            let message = res.message();
            info!(
                user = message.user().map(User::name).unwrap_or("-"),
                room = message.room(),
                text = res.matched().as_str(),
                "Heard"
            );
        },
    );

    Ok(())
}

fn register_lifecycle(robot: &Robot) {
    let name = robot.name().to_string();
    robot.on(
        CONNECTED,
        EventHandler::new(move |_| {
            info!(robot = %name, "Connected, type '{name}: help' for commands")
        }),
    );
    robot.on(
        DISCONNECTED,
        EventHandler::new(|_| warn!("Disconnected")),
    );
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(profile) = &args.profile {
        loader = loader.profile(profile);
    }
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    if let Some(name) = &args.name {
        loader = loader.set("robot.name", name);
    }
    let config = loader.load().context("failed to load configuration")?;

    let runtime = HarkRuntime::from_config(config).context("invalid configuration")?;
    let robot = runtime.create_robot::<ShellAdapter>()?;

    register_listeners(&robot)?;
    register_lifecycle(&robot);

    runtime.run(&robot).await?;

    // After Ctrl+C the shell's stdin read is still pending and would keep
    // the tokio runtime alive until the next line is entered.
    std::process::exit(0)
}
