//! training - Awkwardness Training Academy
//!
//! Runs the meter with the six training scenarios. Keys 1-6 start a
//! scenario, `n` moves to the next one, `m` toggles memes, `q` quits.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use awkwardness_meter::{
    build_registry, commands, CameraSource, Command, FrameOutcome, MeterConfig, Session,
    SCENARIOS,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(name = "training", about = "Awkwardness Training Academy")]
struct Args {
    /// Camera device path, or stub://name for a synthetic scene
    #[arg(long, value_name = "PATH")]
    device: Option<String>,

    /// Detector backend (stub|replay|subprocess|tract)
    #[arg(long, value_name = "NAME")]
    detector: Option<String>,

    /// Start this scenario (1-6) right away
    #[arg(long, value_name = "N")]
    scenario: Option<usize>,

    /// Start with meme mode off
    #[arg(long)]
    no_memes: bool,

    /// UI mode for the cringe meter (auto|plain|pretty)
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
    if let Some(detector) = &args.detector {
        cfg.detector.backend = detector.clone();
    }
    if args.no_memes {
        cfg.comedy.memes = false;
    }
    cfg.validate()?;

    println!("🎓 WELCOME TO THE AWKWARDNESS TRAINING ACADEMY! 🎓");
    println!("Controls: 1-6 start a scenario, n next, m memes, r report, q quit");
    for (i, scenario) in SCENARIOS.iter().enumerate() {
        println!(
            "  {}. {} ({}s) - {}",
            i + 1,
            scenario.name,
            scenario.duration.as_secs(),
            scenario.expected_behavior
        );
    }

    let (mut camera, registry) = {
        let _stage = ui.stage("Open camera and detector");
        let camera = CameraSource::new(cfg.camera.clone())?;
        let registry = build_registry(&cfg.detector, &cfg.camera)?;
        (camera, registry)
    };
    let mut session = Session::new(&cfg)?;
    if let Some(number) = args.scenario {
        let index = number
            .checked_sub(1)
            .ok_or_else(|| anyhow!("scenarios are numbered from 1"))?;
        session.handle_command(Command::Scenario(index), Instant::now())?;
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })?;
    let keys = commands::spawn_stdin_reader();

    let meter = ui.meter();
    let mut completed = 0u32;
    let mut show = |outcome: &FrameOutcome| {
        meter.update(outcome);
        if outcome.scenario.is_some() {
            completed += 1;
            meter.println("Press 'n' for the next scenario, or keep free-playing".to_string());
        }
    };
    let summary = session.run(&mut camera, &registry, Some(&keys), &stop, &mut show)?;
    meter.finish();

    println!("🏆 TRAINING SESSION COMPLETE! {} scenario(s) finished", completed);
    println!(
        "Peak cringe {:.1}, final score {:.1} over {} frames",
        summary.peak_score, summary.final_score, summary.frames
    );
    println!("📝 Report saved as: {}", summary.report_path.display());
    Ok(())
}
