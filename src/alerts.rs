//! Visual, audio and voice alerts driven by the score.

use anyhow::{anyhow, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::comedy::TextSource;

/// Border palette (BGR), cycled while the visual alert is active.
pub const ALERT_PALETTE: [[u8; 3]; 3] = [[0, 0, 255], [255, 0, 0], [0, 255, 255]];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Visual alert turns on above this score...
    pub visual_on: f64,
    /// ...and off again below this one.
    pub visual_off: f64,
    pub flash_interval_ms: u64,
    pub audio_enabled: bool,
    pub audio_threshold: f64,
    pub audio_cooldown_ms: u64,
    pub voice_threshold: f64,
    /// Per-frame probability of a voice line while above `voice_threshold`.
    pub voice_chance: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            visual_on: 40.0,
            visual_off: 10.0,
            flash_interval_ms: 500,
            audio_enabled: true,
            audio_threshold: 25.0,
            audio_cooldown_ms: 2_000,
            voice_threshold: 50.0,
            voice_chance: 0.01,
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<()> {
        if self.visual_off > self.visual_on {
            return Err(anyhow!(
                "alerts.visual_off ({}) must not exceed alerts.visual_on ({})",
                self.visual_off,
                self.visual_on
            ));
        }
        if !(0.0..=1.0).contains(&self.voice_chance) {
            return Err(anyhow!(
                "alerts.voice_chance must be within 0..=1 (got {})",
                self.voice_chance
            ));
        }
        if self.flash_interval_ms == 0 {
            return Err(anyhow!("alerts.flash_interval_ms must be >= 1"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCue {
    Ding,
    Buzzer,
    Alarm,
    Explosion,
}

impl AudioCue {
    pub fn for_score(score: f64) -> Self {
        if score < 15.0 {
            Self::Ding
        } else if score < 30.0 {
            Self::Buzzer
        } else if score < 50.0 {
            Self::Alarm
        } else {
            Self::Explosion
        }
    }
}

impl fmt::Display for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ding => f.write_str("*ding* - Mild awkwardness detected"),
            Self::Buzzer => f.write_str("*buzzer* - Awkwardness increasing!"),
            Self::Alarm => f.write_str("*alarm* - HIGH CRINGE ALERT!"),
            Self::Explosion => f.write_str("*EXPLOSION* - SOCIAL MELTDOWN!"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AlertEvent {
    VisualOn,
    VisualOff,
    Audio(AudioCue),
    Voice(String),
}

/// Where audio cues and voice lines end up.
pub trait CueSink: Send {
    fn play(&mut self, cue: AudioCue);
    fn say(&mut self, line: &str);
}

/// Default sink: cues become log lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCueSink;

impl CueSink for LogCueSink {
    fn play(&mut self, cue: AudioCue) {
        log::info!("🔊 {}", cue);
    }

    fn say(&mut self, line: &str) {
        log::info!("🗣️ {}", line);
    }
}

pub struct AlertSystem {
    config: AlertConfig,
    visual_active: bool,
    color_index: usize,
    last_flash: Option<Instant>,
    last_audio: Option<Instant>,
    voice: Box<dyn TextSource>,
}

impl AlertSystem {
    pub fn new(config: AlertConfig, voice: Box<dyn TextSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            visual_active: false,
            color_index: 0,
            last_flash: None,
            last_audio: None,
            voice,
        })
    }

    pub fn visual_active(&self) -> bool {
        self.visual_active
    }

    /// Current border colour (BGR) while the visual alert is active.
    pub fn border_color(&self) -> Option<[u8; 3]> {
        self.visual_active
            .then(|| ALERT_PALETTE[self.color_index % ALERT_PALETTE.len()])
    }

    /// Audio cue shown on screen, if the score is in audio range.
    pub fn audio_active(&self, score: f64) -> bool {
        self.config.audio_enabled && score > self.config.audio_threshold
    }

    /// Feed the current score; returns the alerts raised this frame.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        score: f64,
        now: Instant,
        rng: &mut R,
    ) -> Vec<AlertEvent> {
        let mut events = Vec::new();

        if !self.visual_active && score > self.config.visual_on {
            self.visual_active = true;
            self.last_flash = Some(now);
            events.push(AlertEvent::VisualOn);
        } else if self.visual_active && score < self.config.visual_off {
            self.visual_active = false;
            events.push(AlertEvent::VisualOff);
        }

        if self.visual_active {
            let flash = Duration::from_millis(self.config.flash_interval_ms);
            let due = self
                .last_flash
                .map_or(true, |at| now.saturating_duration_since(at) >= flash);
            if due {
                self.color_index = self.color_index.wrapping_add(1);
                self.last_flash = Some(now);
            }
        }

        if self.audio_active(score) {
            let cooldown = Duration::from_millis(self.config.audio_cooldown_ms);
            let ready = self
                .last_audio
                .map_or(true, |at| now.saturating_duration_since(at) >= cooldown);
            if ready {
                self.last_audio = Some(now);
                events.push(AlertEvent::Audio(AudioCue::for_score(score)));
            }
        }

        if self.config.audio_enabled
            && score > self.config.voice_threshold
            && rng.gen_bool(self.config.voice_chance)
        {
            if let Some(line) = self.voice.next_text() {
                events.push(AlertEvent::Voice(line));
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comedy::{seeded_rng, RoundRobin};

    fn system(config: AlertConfig) -> AlertSystem {
        AlertSystem::new(config, Box::new(RoundRobin::from_static(&["Abort!"]))).unwrap()
    }

    #[test]
    fn visual_alert_has_hysteresis() {
        let mut rng = seeded_rng(Some(3));
        let mut alerts = system(AlertConfig {
            audio_enabled: false,
            ..AlertConfig::default()
        });
        let now = Instant::now();
        assert!(alerts.update(39.0, now, &mut rng).is_empty());
        assert_eq!(alerts.update(41.0, now, &mut rng), vec![AlertEvent::VisualOn]);
        assert!(alerts.border_color().is_some());
        assert!(alerts.update(20.0, now, &mut rng).is_empty());
        assert!(alerts.visual_active());
        assert_eq!(alerts.update(9.0, now, &mut rng), vec![AlertEvent::VisualOff]);
        assert_eq!(alerts.border_color(), None);
    }

    #[test]
    fn border_colour_cycles_on_flash_interval() {
        let mut rng = seeded_rng(Some(3));
        let mut alerts = system(AlertConfig {
            audio_enabled: false,
            ..AlertConfig::default()
        });
        let start = Instant::now();
        alerts.update(45.0, start, &mut rng);
        let first = alerts.border_color();
        alerts.update(45.0, start + Duration::from_millis(100), &mut rng);
        assert_eq!(alerts.border_color(), first);
        alerts.update(45.0, start + Duration::from_millis(600), &mut rng);
        assert_ne!(alerts.border_color(), first);
    }

    #[test]
    fn audio_cue_respects_cooldown() {
        let mut rng = seeded_rng(Some(3));
        let mut alerts = system(AlertConfig {
            voice_chance: 0.0,
            ..AlertConfig::default()
        });
        let start = Instant::now();
        assert!(alerts.update(20.0, start, &mut rng).is_empty());
        assert_eq!(
            alerts.update(26.0, start, &mut rng),
            vec![AlertEvent::Audio(AudioCue::Buzzer)]
        );
        assert!(alerts.update(26.0, start + Duration::from_secs(1), &mut rng).is_empty());
        assert_eq!(
            alerts.update(35.0, start + Duration::from_secs(2), &mut rng),
            vec![AlertEvent::Audio(AudioCue::Alarm)]
        );
    }

    #[test]
    fn voice_line_when_extreme() {
        let mut rng = seeded_rng(Some(3));
        let mut alerts = system(AlertConfig {
            voice_chance: 1.0,
            ..AlertConfig::default()
        });
        let events = alerts.update(60.0, Instant::now(), &mut rng);
        assert!(events.contains(&AlertEvent::Voice("Abort!".to_string())));
        assert!(events.contains(&AlertEvent::Audio(AudioCue::Explosion)));
    }

    #[test]
    fn cue_tiers() {
        assert_eq!(AudioCue::for_score(10.0), AudioCue::Ding);
        assert_eq!(AudioCue::for_score(15.0), AudioCue::Buzzer);
        assert_eq!(AudioCue::for_score(49.9), AudioCue::Alarm);
        assert_eq!(AudioCue::for_score(50.0), AudioCue::Explosion);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = AlertConfig {
            visual_off: 50.0,
            ..AlertConfig::default()
        };
        assert!(AlertSystem::new(bad, Box::new(RoundRobin::new(vec![]))).is_err());
    }
}
