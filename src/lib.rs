//! Awkwardness Meter
//!
//! Scores how socially awkward a webcam feed looks, one frame at a time, and
//! turns the score into an overlay, alerts and a session report.
//!
//! # Pipeline
//!
//! 1. **Ingest**: a `CameraSource` yields RGB frames (V4L2 device or a
//!    synthetic `stub://` scene).
//! 2. **Detect**: registered `DetectorBackend`s report face regions and hand
//!    landmarks. The models are black boxes behind that trait.
//! 3. **Signal**: detector output becomes a `FrameSignal` (face present, hands
//!    near the face, hands elsewhere).
//! 4. **Score**: `ScoreTracker::update` accumulates a weighted delta and
//!    applies decay; the score never goes negative. `TierTable` maps it to a
//!    severity label.
//! 5. **Present**: alerts, memes, floating emojis and training scenarios feed
//!    an `OverlayModel`, which is painted onto the frame.
//!
//! # Module Structure
//!
//! - `score`: update rule, config, severity tiers
//! - `frame`, `ingest`: frames and where they come from
//! - `detect`, `signal`: detector seam and signal extraction
//! - `session`: the owned per-run state and the capture loop
//! - `alerts`, `comedy`, `scenario`, `overlay`, `report`, `stats`: everything
//!   layered on top of the score

pub mod alerts;
pub mod comedy;
pub mod commands;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod overlay;
pub mod report;
pub mod scenario;
pub mod score;
pub mod session;
pub mod signal;
pub mod stats;

pub use alerts::{AlertConfig, AlertEvent, AlertSystem, AudioCue, CueSink, LogCueSink};
pub use comedy::{
    FloatingEmojis, MemeRotator, RandomText, RoundRobin, ScienceTicker, TextSource,
};
pub use commands::Command;
pub use config::MeterConfig;
pub use detect::{
    build_registry, BackendRegistry, DetectionCapability, DetectionResult, DetectorBackend,
    FaceRegion, HandLandmarks, Landmark,
};
pub use frame::{Frame, FrameView};
pub use ingest::{CameraConfig, CameraSource};
pub use overlay::OverlayModel;
pub use report::SessionReport;
pub use scenario::{Scenario, ScenarioOutcome, ScenarioRunner, SCENARIOS};
pub use score::{DecayPolicy, FrameSignal, ScoreConfig, ScoreTracker, Tier, TierTable};
pub use session::{EndReason, FrameOutcome, RunSummary, Session};
pub use signal::{SignalConfig, SignalExtractor};
pub use stats::SessionStats;
