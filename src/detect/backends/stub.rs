use anyhow::{anyhow, Result};
use std::str::FromStr;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::result::{DetectionResult, FaceRegion, HandLandmarks};
use crate::frame::FrameView;

/// Frames per phase for `StubPattern::Cycle`.
const CYCLE_PHASE_FRAMES: u64 = 30;

/// Scripted detection pattern for the stub backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StubPattern {
    /// Face in view, no hands.
    #[default]
    Calm,
    /// Nobody in view.
    Absent,
    /// Face in view with one hand near the face.
    FaceTouch,
    /// Face in view with one hand low in the frame.
    Fidget,
    /// Calm, face touch, fidget, looking away, repeating every few seconds.
    Cycle,
}

impl FromStr for StubPattern {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "calm" => Ok(Self::Calm),
            "absent" => Ok(Self::Absent),
            "face-touch" | "touch" => Ok(Self::FaceTouch),
            "fidget" => Ok(Self::Fidget),
            "cycle" => Ok(Self::Cycle),
            other => Err(anyhow!("unknown stub pattern '{}'", other)),
        }
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Calm,
    Absent,
    FaceTouch,
    Fidget,
}

/// Stub backend for testing and demos. Ignores pixels and follows a pattern.
pub struct StubBackend {
    pattern: StubPattern,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::with_pattern(StubPattern::Calm)
    }

    pub fn with_pattern(pattern: StubPattern) -> Self {
        Self { pattern }
    }

    fn phase_for(&self, frame_index: u64) -> Phase {
        match self.pattern {
            StubPattern::Calm => Phase::Calm,
            StubPattern::Absent => Phase::Absent,
            StubPattern::FaceTouch => Phase::FaceTouch,
            StubPattern::Fidget => Phase::Fidget,
            StubPattern::Cycle => match (frame_index / CYCLE_PHASE_FRAMES) % 4 {
                0 => Phase::Calm,
                1 => Phase::FaceTouch,
                2 => Phase::Fidget,
                _ => Phase::Absent,
            },
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(
            capability,
            DetectionCapability::FacePresence | DetectionCapability::HandLandmarks
        )
    }

    fn detect(&mut self, frame: &FrameView<'_>) -> Result<DetectionResult> {
        let face = FaceRegion {
            x: 0.35,
            y: 0.15,
            w: 0.3,
            h: 0.4,
            confidence: 0.95,
        };
        let result = match self.phase_for(frame.index()) {
            Phase::Calm => DetectionResult {
                faces: vec![face],
                hands: vec![],
            },
            Phase::Absent => DetectionResult::default(),
            Phase::FaceTouch => DetectionResult {
                faces: vec![face],
                hands: vec![HandLandmarks::at(0.45, 0.2)],
            },
            Phase::Fidget => DetectionResult {
                faces: vec![face],
                hands: vec![HandLandmarks::at(0.6, 0.8)],
            },
        };
        Ok(result)
    }
}
