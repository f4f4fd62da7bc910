use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::result::{DetectionResult, FaceRegion, HandLandmarks};
use crate::frame::FrameView;

/// One line of a detection trace.
#[derive(Debug, Deserialize)]
struct TraceLine {
    #[serde(default)]
    faces: Vec<FaceRegion>,
    #[serde(default)]
    hands: Vec<HandLandmarks>,
    /// Simulated detector failure for this frame.
    #[serde(default)]
    error: Option<String>,
}

/// Replays a recorded detection trace (JSON lines, one entry per frame).
///
/// Lets a session be re-scored offline without the detector models. The trace
/// loops when it runs out.
pub struct ReplayBackend {
    entries: Vec<TraceLine>,
    cursor: usize,
}

impl ReplayBackend {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read detection trace {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid detection trace {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let entries = raw
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            })
            .map(|(n, line)| {
                serde_json::from_str::<TraceLine>(line)
                    .map_err(|e| anyhow!("line {}: {}", n + 1, e))
            })
            .collect::<Result<Vec<_>>>()?;
        if entries.is_empty() {
            return Err(anyhow!("detection trace has no entries"));
        }
        Ok(Self { entries, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(
            capability,
            DetectionCapability::FacePresence | DetectionCapability::HandLandmarks
        )
    }

    fn detect(&mut self, _frame: &FrameView<'_>) -> Result<DetectionResult> {
        let entry = &self.entries[self.cursor % self.entries.len()];
        self.cursor = self.cursor.wrapping_add(1);
        if let Some(err) = &entry.error {
            return Err(anyhow!("replayed detector failure: {}", err));
        }
        Ok(DetectionResult {
            faces: entry.faces.clone(),
            hands: entry.hands.clone(),
        })
    }
}
