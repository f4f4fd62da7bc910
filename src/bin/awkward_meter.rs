//! awkward_meter - live awkwardness meter
//!
//! This binary:
//! 1. Loads config (AWK_CONFIG file, env overrides, then flags)
//! 2. Opens the camera and the detector backends
//! 3. Scores every frame and shows the cringe meter
//! 4. Writes a session report on exit (Ctrl-C, `q`, or end of stream)

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use awkwardness_meter::{
    build_registry, commands, CameraSource, DecayPolicy, MeterConfig, Session,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(name = "awkward_meter", about = "Live webcam awkwardness meter")]
struct Args {
    /// Camera device path, or stub://name for a synthetic scene
    #[arg(long, value_name = "PATH")]
    device: Option<String>,

    /// Detector backend (stub|replay|subprocess|tract)
    #[arg(long, value_name = "NAME")]
    detector: Option<String>,

    /// Command line for the subprocess detector
    #[arg(long, value_name = "CMD")]
    detector_command: Option<String>,

    /// Detection trace for the replay detector
    #[arg(long, value_name = "PATH")]
    trace: Option<PathBuf>,

    /// Pattern for the stub detector (calm|absent|face-touch|fidget|cycle)
    #[arg(long, value_name = "PATTERN")]
    stub_pattern: Option<String>,

    /// Stop after this many frames
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// Decay policy (always|only-when-idle)
    #[arg(long, value_name = "POLICY")]
    decay_policy: Option<DecayPolicy>,

    /// Start with meme mode off
    #[arg(long)]
    no_memes: bool,

    /// Disable audio cues and voice lines
    #[arg(long)]
    no_audio: bool,

    /// Directory for session reports
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Fixed rng seed for the cosmetic effects
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// UI mode for the cringe meter (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

impl Args {
    fn apply(&self, cfg: &mut MeterConfig) {
        if let Some(device) = &self.device {
            cfg.camera.device = device.clone();
        }
        if let Some(detector) = &self.detector {
            cfg.detector.backend = detector.clone();
        }
        if let Some(command) = &self.detector_command {
            cfg.detector.command = Some(command.clone());
        }
        if let Some(trace) = &self.trace {
            cfg.detector.trace_path = Some(trace.clone());
        }
        if let Some(pattern) = &self.stub_pattern {
            cfg.detector.stub_pattern = pattern.clone();
        }
        if let Some(policy) = self.decay_policy {
            cfg.scoring.decay_policy = policy;
        }
        if self.no_memes {
            cfg.comedy.memes = false;
        }
        if self.no_audio {
            cfg.alerts.audio_enabled = false;
        }
        if let Some(dir) = &self.report_dir {
            cfg.report.dir = dir.clone();
        }
        if self.seed.is_some() {
            cfg.comedy.seed = self.seed;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let mut cfg = MeterConfig::load()?;
    args.apply(&mut cfg);
    cfg.validate()?;

    let (mut camera, registry) = {
        let _stage = ui.stage("Open camera and detector");
        let camera = CameraSource::new(cfg.camera.clone())?;
        let registry = build_registry(&cfg.detector, &cfg.camera)?;
        (camera, registry)
    };
    let mut session = Session::new(&cfg)?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })?;
    let keys = commands::spawn_stdin_reader();

    log::info!(
        "awkward_meter running: device={} detector={} decay={}",
        cfg.camera.device,
        cfg.detector.backend,
        cfg.scoring.decay_policy
    );
    log::info!("controls: q quit, m memes, r report, 1-6 scenarios, n next scenario");

    let meter = ui.meter();
    let frame_limit = args.frames;
    let stop_at_limit = Arc::clone(&stop);
    let mut seen = 0u64;
    let mut show = |outcome: &awkwardness_meter::FrameOutcome| {
        meter.update(outcome);
        seen += 1;
        if frame_limit.is_some_and(|limit| seen >= limit) {
            stop_at_limit.store(true, Ordering::SeqCst);
        }
    };
    let summary = session.run(&mut camera, &registry, Some(&keys), &stop, &mut show)?;
    meter.finish();

    log::info!(
        "session ended ({:?}): {} frames, final {:.1}, peak {:.1}",
        summary.ended_by,
        summary.frames,
        summary.final_score,
        summary.peak_score
    );
    println!("📝 Report saved as: {}", summary.report_path.display());
    Ok(())
}
