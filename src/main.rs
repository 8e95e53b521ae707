//! Timeline Capture CLI
//!
//! Usage:
//!   timeline-capture record                      # Record input until q / Ctrl-C
//!   timeline-capture playback <dir> --fps 30 --frames 900 --width 1920 --height 1080
//!   timeline-capture latest                      # Print the newest recording dir

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use timeline_capture::commands::processing::{playback, PlaybackRequest};
use timeline_capture::commands::recording::{latest, record};
use timeline_capture::config::{default_config_path, CaptureConfig};
use timeline_capture::{SyncEngine, VideoProperties};

#[derive(Parser)]
#[command(name = "timeline-capture")]
#[command(about = "Capture input events alongside a screen recording and align them to video frames")]
struct Cli {
    /// Config file (created with defaults if missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a session (r = toggle record, p = toggle pause, q = quit)
    Record {
        /// Recordings root, overriding the config
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Record scroll deltas as natural scrolling
        #[arg(long)]
        natural_scrolling: bool,
    },
    /// Align a finished session to its video and write the frame map
    Playback(PlaybackArgs),
    /// Print the most recent recording directory
    Latest {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
struct PlaybackArgs {
    /// Session directory containing events.jsonl
    recording_dir: PathBuf,
    /// Native frame rate of the recorded video
    #[arg(long)]
    fps: f64,
    /// Total frames in the recorded video
    #[arg(long)]
    frames: u64,
    #[arg(long)]
    width: u32,
    #[arg(long)]
    height: u32,
    /// Output frame rate, overriding the config
    #[arg(long)]
    output_fps: Option<f64>,
    /// Also write overlays.jsonl
    #[arg(long)]
    overlays: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    timeline_capture::init_tracing();
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = CaptureConfig::load_or_create(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    match cli.command {
        Commands::Record { dir, natural_scrolling } => {
            if let Some(dir) = dir {
                config.recordings_dir = dir;
            }
            config.natural_scrolling |= natural_scrolling;
            if let Some(summary) = record(config).await? {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
        Commands::Playback(args) => {
            let mut engine = SyncEngine::from_config(&config);
            if let Some(output_fps) = args.output_fps {
                engine.output_fps = output_fps;
            }
            let request = PlaybackRequest {
                video: VideoProperties {
                    fps: args.fps,
                    width: args.width,
                    height: args.height,
                    total_frames: args.frames,
                },
                engine,
                overlays: args.overlays,
            };
            let run = playback(&args.recording_dir, &request)?;
            println!(
                "Annotated {} of {} retained frames ({} events)",
                run.annotations.frames.len(),
                run.frames.len(),
                run.annotations.event_count()
            );
        }
        Commands::Latest { dir } => {
            if let Some(dir) = dir {
                config.recordings_dir = dir;
            }
            let latest = latest(&config)
                .with_context(|| format!("No recordings under {}", config.recordings_dir.display()))?;
            println!("{}", latest.display());
        }
    }

    Ok(())
}
