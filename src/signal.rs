//! Reduce detector output to the per-frame `FrameSignal` scoring consumes.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::detect::{landmarks, DetectionResult, HAND_LANDMARK_COUNT};
use crate::score::FrameSignal;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Landmark checked against the upper region (8 = index fingertip).
    pub fingertip_landmark: usize,
    /// Fraction of frame height counted as "near the face" (measured from the top).
    pub upper_region_fraction: f32,
    /// Faces below this confidence are ignored.
    pub min_face_confidence: f32,
    /// Hands below this confidence are ignored.
    pub min_hand_confidence: f32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            fingertip_landmark: landmarks::INDEX_FINGER_TIP,
            upper_region_fraction: 0.4,
            min_face_confidence: 0.5,
            min_hand_confidence: 0.5,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fingertip_landmark >= HAND_LANDMARK_COUNT {
            return Err(anyhow!(
                "signal.fingertip_landmark must be < {} (got {})",
                HAND_LANDMARK_COUNT,
                self.fingertip_landmark
            ));
        }
        if !(0.0..=1.0).contains(&self.upper_region_fraction) {
            return Err(anyhow!(
                "signal.upper_region_fraction must be within 0..=1 (got {})",
                self.upper_region_fraction
            ));
        }
        for (name, value) in [
            ("min_face_confidence", self.min_face_confidence),
            ("min_hand_confidence", self.min_hand_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("signal.{} must be within 0..=1 (got {})", name, value));
            }
        }
        Ok(())
    }
}

/// Where each hand ended up this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPlacement {
    /// Fingertip above the upper-region line.
    NearFace,
    /// Fingertip elsewhere.
    Elsewhere,
}

#[derive(Clone, Debug)]
pub struct SignalExtractor {
    config: SignalConfig,
}

impl SignalExtractor {
    pub fn new(config: SignalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Classify each confident hand that carries the configured landmark.
    pub fn hand_placements(&self, detection: &DetectionResult) -> Vec<HandPlacement> {
        detection
            .hands
            .iter()
            .filter(|hand| hand.confidence >= self.config.min_hand_confidence)
            .filter_map(|hand| hand.landmark(self.config.fingertip_landmark))
            .map(|tip| {
                if tip.y < self.config.upper_region_fraction {
                    HandPlacement::NearFace
                } else {
                    HandPlacement::Elsewhere
                }
            })
            .collect()
    }

    pub fn extract(&self, detection: &DetectionResult) -> FrameSignal {
        let face_present = detection
            .faces
            .iter()
            .any(|face| face.confidence >= self.config.min_face_confidence);

        let mut signal = FrameSignal {
            face_present,
            hand_trigger_count: 0,
            hand_fidget_count: 0,
        };
        for placement in self.hand_placements(detection) {
            match placement {
                HandPlacement::NearFace => signal.hand_trigger_count += 1,
                HandPlacement::Elsewhere => signal.hand_fidget_count += 1,
            }
        }
        signal
    }
}
