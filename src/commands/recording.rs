//! Recording commands

use crate::capture::default_sources;
use crate::config::CaptureConfig;
use crate::recorder::session::{latest_recording, SessionSummary};
use crate::recorder::{Intent, LocalClockRecorder, SessionController};
use std::io::BufRead;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// One console line mapped to what it asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Intent(Intent),
    Quit,
}

pub fn parse_console_line(line: &str) -> Option<ConsoleCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "record" => Some(ConsoleCommand::Intent(Intent::ToggleRecord)),
        "p" | "pause" => Some(ConsoleCommand::Intent(Intent::TogglePause)),
        "q" | "quit" => Some(ConsoleCommand::Quit),
        _ => None,
    }
}

/// Forward stdin lines as console commands. The thread ends at EOF, on `q`, or
/// once the receiving side is gone.
fn spawn_console_reader(tx: mpsc::Sender<ConsoleCommand>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("console-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let Some(command) = parse_console_line(&line) else {
                    tracing::warn!(input = %line.trim(), "Unknown command (r = record, p = pause, q = quit)");
                    continue;
                };
                if tx.blocking_send(command).is_err() || command == ConsoleCommand::Quit {
                    break;
                }
            }
        })?;
    Ok(())
}

/// Record until `q`, EOF or Ctrl-C. Recording starts immediately; `r` toggles it
/// off and on again (each start is a new session), `p` toggles pause.
pub async fn record(config: CaptureConfig) -> anyhow::Result<Option<SessionSummary>> {
    let mut controller = SessionController::new(config, Box::new(LocalClockRecorder::new()), default_sources());

    let (tx, mut rx) = mpsc::channel(16);
    spawn_console_reader(tx)?;

    let dir = controller.start().await?;
    tracing::info!(dir = %dir.display(), "Recording (r = toggle record, p = toggle pause, q = quit)");

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(ConsoleCommand::Intent(intent)) => {
                    if let Err(err) = controller.handle_intent(intent).await {
                        tracing::error!(?intent, "Command failed: {}", err);
                    }
                }
                Some(ConsoleCommand::Quit) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    match controller.stop().await {
        Ok(summary) => Ok(summary),
        Err(err) => {
            tracing::error!("{}", err);
            Ok(Some(err.summary))
        }
    }
}

/// Most recent session directory under the configured recordings root.
pub fn latest(config: &CaptureConfig) -> Option<PathBuf> {
    latest_recording(&config.recordings_dir)
}
