//! One meter session: every piece of per-run state in a single owned value.
//!
//! Per frame: detect, extract the signal, update the score, update stats,
//! alerts and comedy, then build (and paint) the overlay. `run` wraps that in
//! the capture loop with a stop flag and a non-blocking command channel.

use anyhow::Result;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crate::alerts::{AlertEvent, AlertSystem, CueSink, LogCueSink};
use crate::comedy::{
    seeded_rng, FloatingEmojis, MemeRotator, RandomText, RoundRobin, ScienceTicker,
    DEFAULT_EMOJIS, DEFAULT_MEMES, DEFAULT_SCIENCE_LINES, DEFAULT_VOICE_LINES,
};
use crate::commands::Command;
use crate::config::MeterConfig;
use crate::detect::{BackendRegistry, DetectionResult};
use crate::frame::Frame;
use crate::ingest::CameraSource;
use crate::overlay::{bgr_to_rgb, OverlayModel};
use crate::report::SessionReport;
use crate::scenario::{ScenarioOutcome, ScenarioRunner};
use crate::score::{FrameSignal, ScoreTracker, TierTable};
use crate::signal::SignalExtractor;
use crate::stats::SessionStats;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);
const SCIENCE_CHANGE_CHANCE: f64 = 0.01;

/// Everything one processed frame produced.
#[derive(Clone, Debug)]
pub struct FrameOutcome {
    pub signal: FrameSignal,
    pub delta: f64,
    pub score: f64,
    pub tier_changed: bool,
    pub alerts: Vec<AlertEvent>,
    pub scenario: Option<ScenarioOutcome>,
    pub overlay: OverlayModel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    Stopped,
    EndOfStream,
    CaptureFailed,
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub frames: u64,
    pub final_score: f64,
    pub peak_score: f64,
    pub ended_by: EndReason,
    pub report_path: PathBuf,
}

pub struct Session {
    tracker: ScoreTracker,
    tiers: TierTable,
    extractor: SignalExtractor,
    stats: SessionStats,
    alerts: AlertSystem,
    memes: MemeRotator,
    emojis: FloatingEmojis,
    science: ScienceTicker,
    scenarios: ScenarioRunner,
    rng: StdRng,
    cues: Box<dyn CueSink>,
    report_dir: PathBuf,
    snapshot: bool,
    severity: usize,
    last_frame: Option<Frame>,
}

impl Session {
    pub fn new(config: &MeterConfig) -> Result<Self> {
        Self::with_start(config, Instant::now())
    }

    pub fn with_start(config: &MeterConfig, started_at: Instant) -> Result<Self> {
        config.validate()?;
        let seed = config.comedy.seed;
        let memes = MemeRotator::new(
            Box::new(RandomText::from_static(
                DEFAULT_MEMES,
                seed.map(|s| s.wrapping_add(1)),
            )),
            config.comedy.meme_interval(),
            config.comedy.memes,
        );
        let alerts = AlertSystem::new(
            config.alerts.clone(),
            Box::new(RoundRobin::from_static(DEFAULT_VOICE_LINES)),
        )?;
        Ok(Self {
            tracker: ScoreTracker::new(config.scoring)?,
            tiers: config.tier_table()?,
            extractor: SignalExtractor::new(config.signal)?,
            stats: SessionStats::new(started_at),
            alerts,
            memes,
            emojis: FloatingEmojis::new(
                DEFAULT_EMOJIS,
                config.comedy.emoji_chance,
                config.comedy.emoji_life,
            ),
            science: ScienceTicker::new(
                Box::new(RoundRobin::from_static(DEFAULT_SCIENCE_LINES)),
                SCIENCE_CHANGE_CHANCE,
            ),
            scenarios: ScenarioRunner::new(),
            rng: seeded_rng(seed),
            cues: Box::new(LogCueSink),
            report_dir: config.report.dir.clone(),
            snapshot: config.report.snapshot,
            severity: 0,
            last_frame: None,
        })
    }

    /// Route audio cues and voice lines somewhere other than the log.
    pub fn with_cue_sink(mut self, cues: Box<dyn CueSink>) -> Self {
        self.cues = cues;
        self
    }

    pub fn score(&self) -> f64 {
        self.tracker.score()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn memes_enabled(&self) -> bool {
        self.memes.is_enabled()
    }

    pub fn scenarios(&self) -> &ScenarioRunner {
        &self.scenarios
    }

    /// Score one frame's detector output.
    ///
    /// `frame_size` is only used to place floating emojis.
    pub fn process_detection(
        &mut self,
        detection: &DetectionResult,
        frame_size: (u32, u32),
        now: Instant,
    ) -> FrameOutcome {
        let signal = self.extractor.extract(detection);
        let score = self.tracker.update(&signal);
        let delta = self.tracker.last_delta();
        self.stats.record(&signal, delta, score);
        log::trace!(
            "frame {}: face={} triggers={} fidgets={} delta={:.2} score={:.2}",
            self.stats.total_frames,
            signal.face_present,
            signal.hand_trigger_count,
            signal.hand_fidget_count,
            delta,
            score
        );

        let severity = self.tiers.severity_of(score);
        let tier_changed = severity != self.severity;
        if tier_changed {
            let old = &self.tiers.tiers()[self.severity];
            let new = self.tiers.tier_for(score);
            log::info!(
                "tier: {} -> {} (score {:.1})",
                old.label,
                new.label,
                score
            );
            self.severity = severity;
        }

        let alerts = self.alerts.update(score, now, &mut self.rng);
        for event in &alerts {
            match event {
                AlertEvent::Audio(cue) => self.cues.play(*cue),
                AlertEvent::Voice(line) => self.cues.say(line),
                AlertEvent::VisualOn => log::debug!("visual alert on at {:.1}", score),
                AlertEvent::VisualOff => log::debug!("visual alert off at {:.1}", score),
            }
        }

        let (width, height) = frame_size;
        let meme = self.memes.tick(now).map(str::to_string);
        let (science, emojis) = if self.memes.is_enabled() {
            self.emojis.tick(&mut self.rng, width, height);
            (
                self.science.tick(&mut self.rng).map(str::to_string),
                self.emojis.active().to_vec(),
            )
        } else {
            (None, Vec::new())
        };
        let scenario = self.scenarios.tick(now, score);

        let mut overlay = OverlayModel::new(score, self.tiers.tier_for(score));
        overlay.border = self.alerts.border_color().map(bgr_to_rgb);
        overlay.audio_cue = self.alerts.audio_active(score);
        overlay.meme = meme;
        overlay.science = science;
        overlay.emojis = emojis;
        overlay.scenario = self.scenarios.banner(now);

        FrameOutcome {
            signal,
            delta,
            score,
            tier_changed,
            alerts,
            scenario,
            overlay,
        }
    }

    /// Detect, score and paint one frame.
    ///
    /// A detector failure is logged and the frame counts as "nothing detected".
    pub fn process_frame(
        &mut self,
        mut frame: Frame,
        registry: &BackendRegistry,
        now: Instant,
    ) -> FrameOutcome {
        let detection = match registry.detect_frame(&frame.view()) {
            Ok(detection) => detection,
            Err(err) => {
                log::warn!("detector failed on frame {}: {:#}", frame.index, err);
                DetectionResult::default()
            }
        };
        let outcome = self.process_detection(&detection, (frame.width, frame.height), now);
        log::trace!(
            "frame {} scored {:?} after capture",
            frame.index,
            now.saturating_duration_since(frame.captured_at())
        );
        outcome.overlay.paint(&mut frame);
        self.last_frame = Some(frame);
        outcome
    }

    /// Apply a keyboard command. Returns true when the session should stop.
    pub fn handle_command(&mut self, command: Command, now: Instant) -> Result<bool> {
        match command {
            Command::Quit => return Ok(true),
            Command::ToggleMemes => {
                let on = self.memes.toggle(now);
                log::info!("meme mode {}", if on { "on" } else { "off" });
            }
            Command::Report => {
                let report = self.report(now);
                for line in report.render_lines() {
                    println!("{}", line);
                }
                if let Err(err) = self.write_report(&report) {
                    log::warn!("report not saved: {:#}", err);
                }
            }
            Command::Scenario(index) => {
                if let Err(err) = self.scenarios.start(index, now) {
                    log::warn!("{}", err);
                }
            }
            Command::NextScenario => {
                self.scenarios.start_next(now);
            }
        }
        Ok(false)
    }

    pub fn report(&mut self, now: Instant) -> SessionReport {
        SessionReport::build(
            &self.stats,
            self.tracker.score(),
            self.stats.elapsed(now),
            chrono::Local::now(),
            &mut self.rng,
        )
    }

    /// Write a report (and, with `snapshot`, the last painted frame).
    pub fn write_report(&self, report: &SessionReport) -> Result<PathBuf> {
        let path = report.write_to(&self.report_dir)?;
        if self.snapshot {
            self.write_snapshot(&path);
        }
        Ok(path)
    }

    #[cfg(feature = "snapshot")]
    fn write_snapshot(&self, report_path: &Path) {
        let Some(frame) = &self.last_frame else {
            return;
        };
        match crate::report::write_snapshot(frame, report_path) {
            Ok(path) => log::info!("snapshot saved as {}", path.display()),
            Err(err) => log::warn!("snapshot failed: {:#}", err),
        }
    }

    #[cfg(not(feature = "snapshot"))]
    fn write_snapshot(&self, _report_path: &Path) {
        log::warn!("report.snapshot is set but this build lacks the snapshot feature");
    }

    /// Capture loop. Ends on the stop flag, a `q` command, end-of-stream or a
    /// capture error; the final report is written in every case.
    pub fn run(
        &mut self,
        camera: &mut CameraSource,
        registry: &BackendRegistry,
        commands: Option<&Receiver<Command>>,
        stop: &AtomicBool,
        on_frame: &mut dyn FnMut(&FrameOutcome),
    ) -> Result<RunSummary> {
        registry.prepare()?;
        camera.connect()?;
        log::info!(
            "session running: score starts at {:.1} ({})",
            self.tracker.score(),
            self.tiers.tier_for(self.tracker.score()).label
        );

        let mut last_health_log = Instant::now();
        let ended_by = loop {
            if let Some(rx) = commands {
                while let Ok(command) = rx.try_recv() {
                    if self.handle_command(command, Instant::now())? {
                        stop.store(true, Ordering::SeqCst);
                    }
                }
            }
            if stop.load(Ordering::SeqCst) {
                break EndReason::Stopped;
            }

            let frame = match camera.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("camera: end of stream");
                    break EndReason::EndOfStream;
                }
                Err(err) => {
                    log::warn!("camera: capture failed: {:#}", err);
                    break EndReason::CaptureFailed;
                }
            };

            let outcome = self.process_frame(frame, registry, Instant::now());
            on_frame(&outcome);

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = camera.stats();
                log::info!(
                    "camera health={} frames={} device={} score={:.1} peak={:.1}",
                    camera.is_healthy(),
                    stats.frames_captured,
                    stats.device,
                    self.tracker.score(),
                    self.stats.peak_score
                );
                last_health_log = Instant::now();
            }
        };

        let report = self.report(Instant::now());
        let report_path = self.write_report(&report)?;
        Ok(RunSummary {
            frames: self.stats.total_frames,
            final_score: self.tracker.score(),
            peak_score: self.stats.peak_score,
            ended_by,
            report_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{FaceRegion, HandLandmarks};

    fn quiet_config() -> MeterConfig {
        let mut config = MeterConfig::default();
        config.comedy.seed = Some(5);
        config.comedy.memes = false;
        config.comedy.emoji_chance = 0.0;
        config.alerts.voice_chance = 0.0;
        config
    }

    fn face() -> FaceRegion {
        FaceRegion {
            x: 0.4,
            y: 0.2,
            w: 0.2,
            h: 0.3,
            confidence: 0.9,
        }
    }

    #[test]
    fn absent_face_raises_score() {
        let mut session = Session::new(&quiet_config()).unwrap();
        let outcome =
            session.process_detection(&DetectionResult::default(), (640, 480), Instant::now());
        assert!(!outcome.signal.face_present);
        // 3 * 0.5 - 0.2
        assert!((outcome.score - 1.3).abs() < 1e-9);
        assert_eq!(session.stats().eye_contact_breaks, 1);
    }

    #[test]
    fn face_touch_counts_as_trigger() {
        let mut session = Session::new(&quiet_config()).unwrap();
        let detection = DetectionResult {
            faces: vec![face()],
            hands: vec![HandLandmarks::at(0.5, 0.1)],
        };
        let outcome = session.process_detection(&detection, (640, 480), Instant::now());
        assert_eq!(outcome.signal.hand_trigger_count, 1);
        assert!((outcome.score - 1.8).abs() < 1e-9);
        assert_eq!(session.stats().face_touches, 1);
        assert_eq!(session.stats().awkward_frames, 1);
    }

    #[test]
    fn tier_change_and_border() {
        let mut session = Session::new(&quiet_config()).unwrap();
        let now = Instant::now();
        let mut changed = 0;
        let mut last = None;
        for _ in 0..40 {
            let outcome = session.process_detection(&DetectionResult::default(), (640, 480), now);
            if outcome.tier_changed {
                changed += 1;
            }
            last = Some(outcome);
        }
        let last = last.unwrap();
        // 40 frames at +1.3: 52.0, past every threshold.
        assert!((last.score - 52.0).abs() < 1e-6);
        assert_eq!(changed, 4);
        assert!(last.overlay.border.is_some());
        assert_eq!(last.overlay.tier_label, "🚨 SOCIAL CATASTROPHE!");
    }

    #[test]
    fn commands_drive_memes_and_scenarios() -> Result<()> {
        let mut session = Session::new(&quiet_config())?;
        let now = Instant::now();
        assert!(!session.memes_enabled());
        assert!(!session.handle_command(Command::ToggleMemes, now)?);
        assert!(session.memes_enabled());
        assert!(!session.handle_command(Command::Scenario(2), now)?);
        assert!(session.scenarios().is_active());
        assert_eq!(session.scenarios().current().name, "The Eye Contact Avoidance");
        assert!(session.handle_command(Command::Quit, now)?);
        Ok(())
    }

    #[test]
    fn emojis_only_float_in_meme_mode() {
        let mut config = quiet_config();
        config.comedy.emoji_chance = 1.0;
        let mut session = Session::new(&config).unwrap();
        let now = Instant::now();
        let outcome = session.process_detection(&DetectionResult::default(), (640, 480), now);
        assert!(outcome.overlay.emojis.is_empty());
        assert!(outcome.overlay.science.is_none());

        session.handle_command(Command::ToggleMemes, now).unwrap();
        let outcome = session.process_detection(&DetectionResult::default(), (640, 480), now);
        assert_eq!(outcome.overlay.emojis.len(), 1);
        assert!(outcome.overlay.science.is_some());
    }

    #[test]
    fn failed_report_write_is_not_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"")?;
        let mut config = quiet_config();
        config.report.dir = blocker;
        let mut session = Session::new(&config)?;
        assert!(!session.handle_command(Command::Report, Instant::now())?);
        Ok(())
    }

    #[test]
    fn detector_failure_counts_as_no_detection() {
        use crate::detect::{DetectionCapability, DetectorBackend};
        use crate::frame::FrameView;

        struct Broken;
        impl DetectorBackend for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn supports(&self, _capability: DetectionCapability) -> bool {
                true
            }
            fn detect(&mut self, _frame: &FrameView<'_>) -> Result<DetectionResult> {
                Err(anyhow::anyhow!("model exploded"))
            }
        }

        let mut registry = BackendRegistry::new();
        registry.register(Broken);
        let mut session = Session::new(&quiet_config()).unwrap();
        let frame = Frame::filled(64, 48, 1, [0, 0, 0]).unwrap();
        let outcome = session.process_frame(frame, &registry, Instant::now());
        assert!(!outcome.signal.face_present);
        assert_eq!(session.stats().total_frames, 1);
    }
}
