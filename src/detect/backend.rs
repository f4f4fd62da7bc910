use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::frame::FrameView;

/// Detection capabilities a backend can provide.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectionCapability {
    /// Face regions (presence is what scoring consumes).
    FacePresence,
    /// Per-hand landmark sets.
    HandLandmarks,
}

/// Detector backend trait.
///
/// Backends are black boxes: pixels go in, face regions and hand landmarks
/// come out. A backend error is a per-frame failure; the session treats the
/// frame as "no detection" and keeps going.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the backend supports a capability.
    fn supports(&self, capability: DetectionCapability) -> bool;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &FrameView<'_>) -> Result<DetectionResult>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
