use std::time::{Duration, Instant};

use crate::score::FrameSignal;

/// Frame delta above which a frame counts as awkward.
pub const AWKWARD_FRAME_DELTA: f64 = 2.0;

/// Running per-session counters.
#[derive(Clone, Debug)]
pub struct SessionStats {
    pub started_at: Instant,
    pub total_frames: u64,
    pub awkward_frames: u64,
    pub smooth_moments: u64,
    pub face_touches: u64,
    pub fidgets: u64,
    pub eye_contact_breaks: u64,
    pub peak_score: f64,
}

impl SessionStats {
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            total_frames: 0,
            awkward_frames: 0,
            smooth_moments: 0,
            face_touches: 0,
            fidgets: 0,
            eye_contact_breaks: 0,
            peak_score: 0.0,
        }
    }

    pub fn record(&mut self, signal: &FrameSignal, delta: f64, score: f64) {
        self.total_frames += 1;
        if !signal.face_present {
            self.eye_contact_breaks += 1;
        }
        self.face_touches += u64::from(signal.hand_trigger_count);
        self.fidgets += u64::from(signal.hand_fidget_count);
        if delta > AWKWARD_FRAME_DELTA {
            self.awkward_frames += 1;
        } else if delta == 0.0 {
            self.smooth_moments += 1;
        }
        self.peak_score = self.peak_score.max(score);
    }

    pub fn awkward_percentage(&self) -> f64 {
        100.0 * self.awkward_frames as f64 / self.total_frames.max(1) as f64
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_frames_by_kind() {
        let mut stats = SessionStats::new(Instant::now());
        stats.record(&FrameSignal::calm(), 0.0, 0.0);
        stats.record(&FrameSignal::new(false, 1, 2).unwrap(), 9.0, 4.5);
        stats.record(&FrameSignal::new(true, 0, 1).unwrap(), 1.0, 4.3);

        assert_eq!(stats.total_frames, 3);
        assert_eq!(stats.smooth_moments, 1);
        assert_eq!(stats.awkward_frames, 1);
        assert_eq!(stats.face_touches, 1);
        assert_eq!(stats.fidgets, 3);
        assert_eq!(stats.eye_contact_breaks, 1);
        assert_eq!(stats.peak_score, 4.5);
    }

    #[test]
    fn percentage_is_safe_without_frames() {
        let stats = SessionStats::new(Instant::now());
        assert_eq!(stats.awkward_percentage(), 0.0);
    }
}
