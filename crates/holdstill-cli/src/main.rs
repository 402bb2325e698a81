use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use holdstill_core::{
    is_covered, score_position, validate_landmarks, FaceObservation, FrameSize, GuidanceConfig,
    PositionClass,
};
use holdstill_session::{CaptureSink, Session, SessionHandle, StatusSink, VoiceSink};

#[derive(Parser)]
#[command(name = "holdstill", about = "Guided face-capture engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify recorded observations from a JSON file, one frame per line of output
    Score {
        /// JSON file: an array of { frame, observations } records
        file: PathBuf,
    },
    /// Run a scripted capture session against console sinks
    Demo,
    /// Print the effective configuration as TOML
    Config {
        /// Optional TOML config file layered over HOLDSTILL_* variables
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// One recorded frame of detector output.
#[derive(Deserialize)]
struct RecordedFrame {
    frame: FrameSize,
    #[serde(default)]
    observations: Vec<FaceObservation>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score { file } => score(&file),
        Commands::Demo => demo().await,
        Commands::Config { file } => show_config(file.as_deref()),
    }
}

fn score(file: &std::path::Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let frames: Vec<RecordedFrame> =
        serde_json::from_str(&contents).context("parsing recorded frames")?;
    let config = GuidanceConfig::from_env();
    config.validate().context("invalid configuration")?;

    for (index, record) in frames.iter().enumerate() {
        let verdict = describe_frame(record, &config);
        println!("frame {index:>3}: {verdict}");
    }
    Ok(())
}

fn describe_frame(record: &RecordedFrame, config: &GuidanceConfig) -> String {
    match record.observations.as_slice() {
        [] => "no face".to_string(),
        [observation] => {
            let validation = validate_landmarks(&observation.landmarks);
            if !validation.is_full_face {
                return format!(
                    "incomplete face (left eye: {}, right eye: {}, nose: {}, mouth: {})",
                    validation.has_left_eye,
                    validation.has_right_eye,
                    validation.has_nose,
                    validation.has_mouth,
                );
            }
            if is_covered(&observation.landmarks, &observation.bounding_box) {
                return "covered".to_string();
            }
            let report = score_position(
                &observation.bounding_box,
                record.frame,
                config,
                false,
                true,
            );
            let class = match report.class {
                PositionClass::Good => "good",
                PositionClass::Warning => "warning",
                PositionClass::Error => "error",
                PositionClass::Invalid => "invalid",
            };
            format!("{class} — {}", report.status)
        }
        many => format!("foreign object ({} faces)", many.len()),
    }
}

fn show_config(file: Option<&std::path::Path>) -> Result<()> {
    let config = match file {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            GuidanceConfig::from_toml_str(&contents)?
        }
        None => {
            let config = GuidanceConfig::from_env();
            config.validate().context("invalid configuration")?;
            config
        }
    };
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// --- Demo session: console sinks plus a scripted user ---

struct ConsoleStatus;

impl StatusSink for ConsoleStatus {
    fn status(&mut self, message: &str) {
        println!("  status | {message}");
    }

    fn error(&mut self, message: &str) {
        println!("   error | {message}");
    }
}

struct ConsoleVoice;

impl VoiceSink for ConsoleVoice {
    fn speak(&mut self, text: &str) {
        println!("   voice | {text}");
    }

    fn cancel(&mut self) {
        println!("   voice | (interrupted)");
    }
}

struct ConsoleCapture;

impl CaptureSink for ConsoleCapture {
    fn trigger(&mut self) {
        println!(" capture | shutter fired");
    }
}

const DEMO_FRAME: FrameSize = FrameSize {
    width: 640.0,
    height: 480.0,
};

/// Scripted user: absent, then too far in a corner, then centered and holding.
fn demo_observations(step: usize) -> Vec<FaceObservation> {
    match step {
        0 | 1 => vec![],
        2..=4 => vec![synthetic_face(20.0, 20.0, 120.0, 120.0)],
        _ => vec![synthetic_face(220.0, 140.0, 420.0, 340.0)],
    }
}

fn synthetic_face(x1: f32, y1: f32, x2: f32, y2: f32) -> FaceObservation {
    use holdstill_core::{BoundingBox, LandmarkSet, Point};

    let indices: [u16; 28] = [
        263, 249, 390, 373, 374, 380, 381, 382, // left eye
        33, 7, 163, 144, 145, 153, 154, 155, // right eye
        1, 2, 98, 327, // nose
        61, 291, 0, 17, 39, 269, 181, 405, // mouth
    ];
    let center_x = (x1 + x2) / 2.0;
    let center_y = (y1 + y2) / 2.0;
    FaceObservation {
        landmarks: LandmarkSet::from_points(
            indices.iter().map(|&i| (i, Point::new(center_x, center_y))),
        ),
        bounding_box: BoundingBox::new(Point::new(x1, y1), Point::new(x2, y2)),
    }
}

async fn demo() -> Result<()> {
    // Faster accumulation than the production defaults so the demo
    // finishes in a few seconds of holding
    let config = GuidanceConfig {
        progress_step_per_tick: 5,
        ..GuidanceConfig::from_env()
    };
    config.validate().context("invalid configuration")?;
    let frame_period = Duration::from_millis(config.detection_interval_ms + 10);

    let handle = Session::spawn(
        config,
        Box::new(ConsoleStatus),
        Box::new(ConsoleVoice),
        Box::new(ConsoleCapture),
    )?;
    handle.start().await?;

    println!("holding a synthetic face in front of the camera...\n");
    run_script(&handle, frame_period).await?;

    handle.capture_completed(Ok(())).await?;
    handle.stop().await?;
    println!("\ndemo finished");
    Ok(())
}

async fn run_script(handle: &SessionHandle, frame_period: Duration) -> Result<()> {
    // Generous upper bound; the centered hold completes long before this
    for step in 0..200 {
        if handle.is_capturing().await? {
            return Ok(());
        }
        handle.submit(DEMO_FRAME, demo_observations(step)).await?;
        // The console "speech" finishes instantly
        handle.voice_finished().await?;
        tokio::time::sleep(frame_period).await;
    }
    anyhow::bail!("demo never reached capture");
}
