use serde::{Deserialize, Serialize};

/// Number of landmarks in a hand landmark set (MediaPipe hand model).
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Hand landmark indices (MediaPipe hand landmark convention).
#[allow(dead_code)]
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;
}

/// Result of running detection on a frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Face regions (normalized 0..1 coordinates).
    #[serde(default)]
    pub faces: Vec<FaceRegion>,
    /// Hand landmark sets.
    #[serde(default)]
    pub hands: Vec<HandLandmarks>,
}

impl DetectionResult {
    /// Merge another backend's output into this one.
    pub fn merge(&mut self, other: DetectionResult) {
        self.faces.extend(other.faces);
        self.hands.extend(other.hands);
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.hands.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 0..1, normalized to frame width.
    pub x: f32,
    /// 0..1, normalized to frame height (0 is the top edge).
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub landmarks: Vec<Landmark>,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub handedness: Option<String>,
}

impl HandLandmarks {
    /// Hand with every landmark at the same point. Handy for scripted backends.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            landmarks: vec![Landmark { x, y, z: 0.0 }; HAND_LANDMARK_COUNT],
            confidence: 1.0,
            handedness: None,
        }
    }

    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    pub fn index_finger_tip(&self) -> Option<&Landmark> {
        self.landmark(landmarks::INDEX_FINGER_TIP)
    }
}

fn full_confidence() -> f32 {
    1.0
}
