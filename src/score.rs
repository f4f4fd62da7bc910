//! Awkwardness score tracking.
//!
//! `ScoreTracker` turns a stream of per-frame `FrameSignal`s into a running,
//! non-negative score. `TierTable` maps a score onto a display tier.
//!
//! Update rule:
//!
//! ```text
//! delta = (face_present ? 0 : face_absent_weight)
//!       + hand_trigger_count * hand_trigger_weight
//!       + hand_fidget_count  * hand_fidget_weight
//! score = max(0, score + delta * accumulation_factor - decay)
//! ```
//!
//! where `decay` is `decay_constant` every frame (`DecayPolicy::Always`) or only
//! on frames with `delta == 0` (`DecayPolicy::OnlyWhenIdle`).

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Practical meter ceiling. The update rule does not enforce it.
pub const METER_CEILING: f64 = 100.0;

// -------------------- Frame signal --------------------

/// Per-frame summary of detector output consumed by the update rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSignal {
    pub face_present: bool,
    /// Hands whose fingertip sits in the upper frame region (face touching).
    pub hand_trigger_count: u32,
    /// Hands visible elsewhere in the frame (general fidgeting).
    pub hand_fidget_count: u32,
}

impl FrameSignal {
    /// Build a signal from possibly-signed counts. Negative counts are rejected.
    pub fn new(face_present: bool, hand_trigger_count: i64, hand_fidget_count: i64) -> Result<Self> {
        Ok(Self {
            face_present,
            hand_trigger_count: checked_count("hand_trigger_count", hand_trigger_count)?,
            hand_fidget_count: checked_count("hand_fidget_count", hand_fidget_count)?,
        })
    }

    /// Face in view, no hands.
    pub fn calm() -> Self {
        Self {
            face_present: true,
            hand_trigger_count: 0,
            hand_fidget_count: 0,
        }
    }
}

fn checked_count(name: &str, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(anyhow!("{} must be >= 0 (got {})", name, value));
    }
    u32::try_from(value).map_err(|_| anyhow!("{} out of range (got {})", name, value))
}

// -------------------- Config --------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecayPolicy {
    /// Decay every frame regardless of the frame delta.
    #[default]
    Always,
    /// Decay only on frames whose delta is exactly zero.
    OnlyWhenIdle,
}

impl FromStr for DecayPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "only-when-idle" | "only_when_idle" | "idle" => Ok(Self::OnlyWhenIdle),
            other => Err(anyhow!(
                "unknown decay policy '{}' (expected always|only-when-idle)",
                other
            )),
        }
    }
}

impl fmt::Display for DecayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::OnlyWhenIdle => f.write_str("only-when-idle"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub face_absent_weight: f64,
    pub hand_trigger_weight: f64,
    pub hand_fidget_weight: f64,
    pub accumulation_factor: f64,
    pub decay_constant: f64,
    pub decay_policy: DecayPolicy,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            face_absent_weight: 3.0,
            hand_trigger_weight: 4.0,
            hand_fidget_weight: 1.0,
            accumulation_factor: 0.5,
            decay_constant: 0.2,
            decay_policy: DecayPolicy::Always,
        }
    }
}

impl ScoreConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("face_absent_weight", self.face_absent_weight),
            ("hand_trigger_weight", self.hand_trigger_weight),
            ("hand_fidget_weight", self.hand_fidget_weight),
            ("accumulation_factor", self.accumulation_factor),
            ("decay_constant", self.decay_constant),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!(
                    "scoring.{} must be a finite value >= 0 (got {})",
                    name,
                    value
                ));
            }
        }
        Ok(())
    }

    /// Weighted frame delta before accumulation.
    pub fn frame_delta(&self, signal: &FrameSignal) -> f64 {
        let face = if signal.face_present {
            0.0
        } else {
            self.face_absent_weight
        };
        face + signal.hand_trigger_count as f64 * self.hand_trigger_weight
            + signal.hand_fidget_count as f64 * self.hand_fidget_weight
    }
}

// -------------------- Tracker --------------------

#[derive(Clone, Debug)]
pub struct ScoreTracker {
    config: ScoreConfig,
    score: f64,
    last_delta: f64,
}

impl ScoreTracker {
    pub fn new(config: ScoreConfig) -> Result<Self> {
        Self::starting_at(config, 0.0)
    }

    pub fn starting_at(config: ScoreConfig, score: f64) -> Result<Self> {
        config.validate()?;
        if !score.is_finite() || score < 0.0 {
            return Err(anyhow!("starting score must be a finite value >= 0"));
        }
        Ok(Self {
            config,
            score,
            last_delta: 0.0,
        })
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Weighted delta of the most recent update.
    pub fn last_delta(&self) -> f64 {
        self.last_delta
    }

    /// Apply one frame and return the new score.
    pub fn update(&mut self, signal: &FrameSignal) -> f64 {
        let delta = self.config.frame_delta(signal);
        let decay = match self.config.decay_policy {
            DecayPolicy::Always => self.config.decay_constant,
            DecayPolicy::OnlyWhenIdle if delta == 0.0 => self.config.decay_constant,
            DecayPolicy::OnlyWhenIdle => 0.0,
        };
        self.score = (self.score + delta * self.config.accumulation_factor - decay).max(0.0);
        self.last_delta = delta;
        self.score
    }
}

// -------------------- Tiers --------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub threshold: f64,
    pub label: String,
    #[serde(default)]
    pub emoji: String,
    /// BGR display colour.
    #[serde(default = "default_tier_color")]
    pub color: [u8; 3],
}

fn default_tier_color() -> [u8; 3] {
    [255, 255, 255]
}

impl Tier {
    pub fn new(threshold: f64, emoji: &str, label: &str, color: [u8; 3]) -> Self {
        Self {
            threshold,
            label: label.to_string(),
            emoji: emoji.to_string(),
            color,
        }
    }

    /// Label with its emoji prefix, as shown on screen.
    pub fn display(&self) -> String {
        if self.emoji.is_empty() {
            self.label.clone()
        } else {
            format!("{} {}", self.emoji, self.label)
        }
    }
}

/// Ordered `(threshold, label)` table with a zero-threshold sentinel.
#[derive(Clone, Debug, PartialEq)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(tiers: Vec<Tier>) -> Result<Self> {
        let first = tiers
            .first()
            .ok_or_else(|| anyhow!("tier table must not be empty"))?;
        if first.threshold != 0.0 {
            return Err(anyhow!(
                "tier table must start with a 0 threshold (got {})",
                first.threshold
            ));
        }
        for pair in tiers.windows(2) {
            if !(pair[1].threshold > pair[0].threshold) || !pair[1].threshold.is_finite() {
                return Err(anyhow!(
                    "tier thresholds must be strictly ascending ({} then {})",
                    pair[0].threshold,
                    pair[1].threshold
                ));
            }
        }
        Ok(Self { tiers })
    }

    /// Tier for a score: the last tier whose threshold is <= score.
    pub fn tier_for(&self, score: f64) -> &Tier {
        let idx = self
            .tiers
            .iter()
            .rposition(|tier| tier.threshold <= score)
            .unwrap_or(0);
        &self.tiers[idx]
    }

    /// Severity index of a score, 0 being the calmest tier.
    pub fn severity_of(&self, score: f64) -> usize {
        self.tiers
            .iter()
            .rposition(|tier| tier.threshold <= score)
            .unwrap_or(0)
    }

    pub fn label_for(&self, score: f64) -> &str {
        &self.tier_for(score).label
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn lowest(&self) -> &Tier {
        &self.tiers[0]
    }

    pub fn highest(&self) -> &Tier {
        &self.tiers[self.tiers.len() - 1]
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                Tier::new(0.0, "😊", "Smooth & Confident", [0, 255, 0]),
                Tier::new(5.0, "😐", "Slightly Nervous", [0, 255, 255]),
                Tier::new(15.0, "😅", "Getting Uncomfortable", [0, 165, 255]),
                Tier::new(30.0, "😰", "Major Awkwardness", [0, 100, 255]),
                Tier::new(50.0, "🚨", "SOCIAL CATASTROPHE!", [0, 0, 255]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absent_with_hand() -> FrameSignal {
        FrameSignal {
            face_present: false,
            hand_trigger_count: 1,
            hand_fidget_count: 0,
        }
    }

    #[test]
    fn single_frame_accumulates_weighted_delta() {
        let config = ScoreConfig {
            face_absent_weight: 3.0,
            hand_trigger_weight: 2.0,
            hand_fidget_weight: 0.0,
            accumulation_factor: 0.3,
            decay_constant: 0.15,
            decay_policy: DecayPolicy::Always,
        };
        let mut tracker = ScoreTracker::new(config).unwrap();
        let score = tracker.update(&absent_with_hand());
        assert!((score - 1.35).abs() < 1e-9, "score was {}", score);
        assert!((tracker.last_delta() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn score_is_clamped_at_zero() {
        let mut tracker = ScoreTracker::new(ScoreConfig::default()).unwrap();
        for _ in 0..10 {
            assert_eq!(tracker.update(&FrameSignal::calm()), 0.0);
        }
    }

    #[test]
    fn score_never_negative_for_mixed_signals() {
        let mut tracker = ScoreTracker::new(ScoreConfig {
            decay_constant: 5.0,
            ..ScoreConfig::default()
        })
        .unwrap();
        for i in 0..200u32 {
            let signal = FrameSignal {
                face_present: i % 3 != 0,
                hand_trigger_count: i % 2,
                hand_fidget_count: i % 5,
            };
            assert!(tracker.update(&signal) >= 0.0);
        }
    }

    #[test]
    fn pure_decay_is_monotonically_non_increasing() {
        let mut tracker = ScoreTracker::starting_at(ScoreConfig::default(), 12.0).unwrap();
        let mut previous = tracker.score();
        for _ in 0..100 {
            let next = tracker.update(&FrameSignal::calm());
            assert!(next <= previous);
            previous = next;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn hundred_decay_frames_from_forty() {
        let config = ScoreConfig {
            accumulation_factor: 0.0,
            decay_constant: 0.2,
            ..ScoreConfig::default()
        };
        let mut tracker = ScoreTracker::starting_at(config, 40.0).unwrap();
        for _ in 0..100 {
            tracker.update(&FrameSignal::calm());
        }
        assert!((tracker.score() - 20.0).abs() < 1e-9, "score was {}", tracker.score());
    }

    #[test]
    fn idle_policy_skips_decay_on_active_frames() {
        let config = ScoreConfig {
            face_absent_weight: 2.0,
            accumulation_factor: 1.0,
            decay_constant: 0.5,
            decay_policy: DecayPolicy::OnlyWhenIdle,
            ..ScoreConfig::default()
        };
        let mut tracker = ScoreTracker::new(config).unwrap();
        let absent = FrameSignal {
            face_present: false,
            ..FrameSignal::default()
        };
        assert_eq!(tracker.update(&absent), 2.0);
        assert_eq!(tracker.update(&FrameSignal::calm()), 1.5);

        let mut always = ScoreTracker::new(ScoreConfig {
            decay_policy: DecayPolicy::Always,
            ..config
        })
        .unwrap();
        assert_eq!(always.update(&absent), 1.5);
    }

    #[test]
    fn fidget_weight_applies_per_hand() {
        let mut tracker = ScoreTracker::new(ScoreConfig::default()).unwrap();
        let signal = FrameSignal {
            face_present: true,
            hand_trigger_count: 1,
            hand_fidget_count: 1,
        };
        // (4 + 1) * 0.5 - 0.2
        assert!((tracker.update(&signal) - 2.3).abs() < 1e-9);
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert!(FrameSignal::new(true, -1, 0).is_err());
        assert!(FrameSignal::new(true, 0, -3).is_err());
        let ok = FrameSignal::new(false, 2, 1).unwrap();
        assert_eq!(ok.hand_trigger_count, 2);
        assert_eq!(ok.hand_fidget_count, 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = ScoreConfig {
            decay_constant: -0.1,
            ..ScoreConfig::default()
        };
        assert!(ScoreTracker::new(bad).is_err());
        let nan = ScoreConfig {
            accumulation_factor: f64::NAN,
            ..ScoreConfig::default()
        };
        assert!(nan.validate().is_err());
        assert!(ScoreTracker::starting_at(ScoreConfig::default(), -1.0).is_err());
    }

    #[test]
    fn tier_lookup_covers_bounds() {
        let table = TierTable::default();
        assert_eq!(table.label_for(0.0), "Smooth & Confident");
        assert_eq!(table.label_for(4.99), "Smooth & Confident");
        assert_eq!(table.label_for(5.0), "Slightly Nervous");
        assert_eq!(table.label_for(29.9), "Getting Uncomfortable");
        assert_eq!(table.label_for(30.0), "Major Awkwardness");
        assert_eq!(table.label_for(1000.0), "SOCIAL CATASTROPHE!");
        assert_eq!(table.severity_of(1000.0), table.tiers().len() - 1);
    }

    #[test]
    fn tier_lookup_is_idempotent() {
        let table = TierTable::default();
        for score in [0.0, 7.5, 31.0, 99.0] {
            assert_eq!(table.tier_for(score), table.tier_for(score));
        }
    }

    #[test]
    fn tier_table_requires_sentinel_and_order() {
        assert!(TierTable::new(vec![]).is_err());
        assert!(TierTable::new(vec![Tier::new(1.0, "", "a", [0, 0, 0])]).is_err());
        assert!(TierTable::new(vec![
            Tier::new(0.0, "", "a", [0, 0, 0]),
            Tier::new(10.0, "", "b", [0, 0, 0]),
            Tier::new(10.0, "", "c", [0, 0, 0]),
        ])
        .is_err());
        let table = TierTable::new(vec![
            Tier::new(0.0, "", "calm", [0, 0, 0]),
            Tier::new(10.0, "", "loud", [0, 0, 0]),
        ])
        .unwrap();
        assert_eq!(table.highest().label, "loud");
        assert_eq!(table.tier_for(10.0).display(), "loud");
    }

    #[test]
    fn decay_policy_parses() {
        assert_eq!("always".parse::<DecayPolicy>().unwrap(), DecayPolicy::Always);
        assert_eq!(
            "only-when-idle".parse::<DecayPolicy>().unwrap(),
            DecayPolicy::OnlyWhenIdle
        );
        assert!("sometimes".parse::<DecayPolicy>().is_err());
        assert_eq!(DecayPolicy::OnlyWhenIdle.to_string(), "only-when-idle");
    }
}
