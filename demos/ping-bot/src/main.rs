//! Ping Bot Example
//!
//! Reads chat lines from stdin and feeds them to a Nestor robot.
//!
//! In debug mode (the default `nestor.toml`) every response is printed back
//! to the terminal. With `__NESTOR_DEBUG_MODE=false` and an auth token set,
//! responses go to the relay instead.
//!
//! # Usage
//!
//! ```bash
//! cd demos/ping-bot
//! cargo run
//! > nestor ping
//! PONG
//! ```
//!
//! The files in `scripts/` select which of the scripts below are active.

use anyhow::Result;
use nestor::prelude::*;
use nestor::runtime::logging;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

// ============================================================================
// Scripts
// ============================================================================

fn ping(robot: &Robot) -> RegisterResult {
    robot.respond("ping", |res, done| {
        tokio::spawn(async move {
            res.send(["PONG"]).await.ok();
            done.complete();
        });
    })?;

    robot.respond_async("time", |res| async move {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        res.reply([format!("unix time is {secs}")]).await.ok();
    })
}

fn echo(robot: &Robot) -> RegisterResult {
    robot.respond_async(r"echo (.+)", |res| async move {
        let text = res.captures()[1].to_string();
        res.send([text]).await.ok();
    })
}

fn pick(robot: &Robot) -> RegisterResult {
    robot.hear_async(r"(?i)^pick (.+)$", |res| async move {
        let choices: Vec<String> = res.captures()[1]
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if let Some(choice) = res.random(&choices) {
            res.reply([format!("I pick {choice}")]).await.ok();
        }
    })
}

fn weather(robot: &Robot) -> RegisterResult {
    robot.respond_async(r"weather (\w+)", |res| async move {
        let city = res.captures()[1].to_string();
        let client = match res.robot().http("https://wttr.in", None) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Failed to build HTTP client");
                return;
            }
        };

        let line = match client.path(&city).query("format", "3").get().await {
            Ok(body) if body.is_success() => body.text.trim().to_string(),
            Ok(body) => format!("weather lookup failed with status {}", body.status),
            Err(e) => format!("weather lookup failed: {e}"),
        };
        res.send([line]).await.ok();
    })
}

script!("ping", ping);
script!("echo", echo);
script!("pick", pick);
script!("weather", weather);

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let runtime = NestorRuntime::from_loader(ConfigLoader::new())?;
    logging::init_from_config(&runtime.config().logging);

    let loaded = runtime.load_scripts()?;
    info!(loaded, "Ping bot ready, type a message");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if runtime.robot().debug_mode() {
        while let Some(line) = lines.next_line().await? {
            let message = Message::new(line)
                .with_user(User::new("shell").with_name("Shell"))
                .in_room("shell");
            runtime.receive(message).await;

            let robot = runtime.robot();
            for text in robot.sent() {
                println!("{text}");
            }
            for text in robot.replies() {
                println!("shell: {text}");
            }
            robot.clear_buffers();
        }
        return Ok(());
    }

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            let message = Message::new(line)
                .with_user(User::new("shell"))
                .in_room("shell");
            if tx.send(message).await.is_err() {
                break;
            }
        }
    });

    runtime.run(rx).await?;
    Ok(())
}
