//! bench - capture (and optionally score) N frames and report throughput.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::time::Instant;

use awkwardness_meter::{build_registry, CameraSource, MeterConfig, Session};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(name = "bench", about = "Measure capture and scoring throughput")]
struct Args {
    /// Camera device path, or stub://name for a synthetic scene
    #[arg(long, value_name = "PATH")]
    device: Option<String>,

    /// Frames to capture
    #[arg(long, default_value_t = 100, value_name = "N")]
    frames: u64,

    /// Also run detection and scoring on each frame
    #[arg(long)]
    detect: bool,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let mut cfg = MeterConfig::load()?;
    if let Some(device) = &args.device {
        cfg.camera.device = device.clone();
    }
    cfg.comedy.memes = false;
    cfg.alerts.audio_enabled = false;
    cfg.validate()?;

    let mut camera = {
        let _stage = ui.stage("Open camera");
        let mut camera = CameraSource::new(cfg.camera.clone())?;
        camera.connect()?;
        camera
    };
    let mut scoring = if args.detect {
        let _stage = ui.stage("Prepare detector");
        let registry = build_registry(&cfg.detector, &cfg.camera)?;
        registry.prepare()?;
        Some((registry, Session::new(&cfg)?))
    } else {
        None
    };

    let start = Instant::now();
    let mut frame_count = 0u64;
    {
        let _stage = ui.stage(&format!("Capture {} frames", args.frames));
        while frame_count < args.frames {
            let Some(frame) = camera.next_frame()? else {
                break;
            };
            frame_count += 1;
            if let Some((registry, session)) = scoring.as_mut() {
                session.process_frame(frame, registry, Instant::now());
            }
        }
    }
    let elapsed = start.elapsed();
    if frame_count == 0 {
        return Err(anyhow!("camera produced no frames"));
    }

    let fps = frame_count as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    println!("📊 Performance Results:");
    println!(
        "Processed {} frames in {}",
        frame_count,
        ui::format_duration(elapsed)
    );
    println!("Average FPS: {:.1}", fps);
    println!("Frame processing time: {:.1}ms per frame", 1000.0 / fps);
    if let Some((_, session)) = &scoring {
        println!(
            "Final score {:.1}, peak {:.1}",
            session.score(),
            session.stats().peak_score
        );
    }
    Ok(())
}
