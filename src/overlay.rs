//! What gets drawn on top of each frame.
//!
//! `OverlayModel` is plain data so it can be asserted on in tests and fed to
//! the terminal UI. `paint` burns the meter and the alert border into the
//! frame's pixels; text lines are left to whatever displays the model.

use crate::comedy::FloatingEmoji;
use crate::frame::Frame;
use crate::scenario::ScenarioBanner;
use crate::score::{Tier, METER_CEILING};

pub const METER_WIDTH: u32 = 150;
pub const METER_HEIGHT: u32 = 20;
/// Distance of the meter's left edge from the right edge of the frame.
pub const METER_RIGHT_INSET: u32 = 200;
pub const METER_TOP: u32 = 50;
pub const BORDER_THICKNESS: u32 = 5;
const METER_BACKGROUND: [u8; 3] = [100, 100, 100];

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayModel {
    pub score: f64,
    pub tier_label: String,
    /// Tier colour, RGB.
    pub tier_color: [u8; 3],
    /// Filled meter width in pixels, out of `METER_WIDTH`.
    pub meter_fill: u32,
    /// Alert border colour, RGB.
    pub border: Option<[u8; 3]>,
    pub audio_cue: bool,
    pub meme: Option<String>,
    /// Pseudo-science caption along the bottom edge.
    pub science: Option<String>,
    pub emojis: Vec<FloatingEmoji>,
    pub scenario: Option<ScenarioBanner>,
}

impl OverlayModel {
    pub fn new(score: f64, tier: &Tier) -> Self {
        Self {
            score,
            tier_label: tier.display(),
            tier_color: bgr_to_rgb(tier.color),
            meter_fill: meter_fill(score),
            border: None,
            audio_cue: false,
            meme: None,
            science: None,
            emojis: Vec::new(),
            scenario: None,
        }
    }

    pub fn score_text(&self) -> String {
        format!("Awkwardness Score: {:.1}", self.score)
    }

    /// Text lines in top-to-bottom order.
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = vec![self.score_text(), self.tier_label.clone()];
        if self.audio_cue {
            lines.push("🔊 AUDIO ALERT!".to_string());
        }
        if let Some(banner) = &self.scenario {
            lines.push(format!("SCENARIO: {}", banner.name));
            lines.push(format!(
                "Time Remaining: {:.1}s",
                banner.remaining.as_secs_f64()
            ));
            lines.push(banner.instructions.to_string());
        }
        if let Some(meme) = &self.meme {
            lines.push(meme.clone());
        }
        if let Some(science) = &self.science {
            lines.push(science.clone());
        }
        lines
    }

    /// Draw the meter and, when alerting, the border.
    pub fn paint(&self, frame: &mut Frame) {
        let width = frame.width;
        let x0 = width.saturating_sub(METER_RIGHT_INSET);
        let y1 = METER_TOP + METER_HEIGHT;
        frame.fill_rect(x0, METER_TOP, x0 + METER_WIDTH, y1, METER_BACKGROUND);
        if self.meter_fill > 0 {
            frame.fill_rect(x0, METER_TOP, x0 + self.meter_fill, y1, self.tier_color);
        }
        if let Some(color) = self.border {
            frame.draw_border(BORDER_THICKNESS, color);
        }
    }
}

pub fn meter_fill(score: f64) -> u32 {
    let fraction = (score / METER_CEILING).clamp(0.0, 1.0);
    (fraction * f64::from(METER_WIDTH)) as u32
}

pub fn bgr_to_rgb(bgr: [u8; 3]) -> [u8; 3] {
    [bgr[2], bgr[1], bgr[0]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::TierTable;
    use std::time::Duration;

    #[test]
    fn meter_fill_is_capped() {
        assert_eq!(meter_fill(0.0), 0);
        assert_eq!(meter_fill(50.0), 75);
        assert_eq!(meter_fill(250.0), METER_WIDTH);
    }

    #[test]
    fn model_carries_tier_display() {
        let tiers = TierTable::default();
        let model = OverlayModel::new(31.0, tiers.tier_for(31.0));
        assert_eq!(model.tier_label, "😰 Major Awkwardness");
        assert_eq!(model.tier_color, [255, 100, 0]);
        assert_eq!(model.score_text(), "Awkwardness Score: 31.0");
    }

    #[test]
    fn text_lines_include_scenario_and_meme() {
        let tiers = TierTable::default();
        let mut model = OverlayModel::new(0.0, tiers.lowest());
        model.meme = Some("This is fine.".to_string());
        model.scenario = Some(ScenarioBanner {
            number: 1,
            name: "The Forced Smile Test",
            instructions: "Smile",
            remaining: Duration::from_millis(2500),
        });
        let lines = model.text_lines();
        assert!(lines.contains(&"Time Remaining: 2.5s".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("This is fine."));
    }

    #[test]
    fn paint_draws_meter_and_border() {
        let tiers = TierTable::default();
        let mut frame = Frame::filled(640, 480, 1, [0, 0, 0]).unwrap();
        let mut model = OverlayModel::new(100.0, tiers.tier_for(100.0));
        model.border = Some([255, 0, 0]);
        model.paint(&mut frame);

        assert_eq!(frame.pixel(0, 0), Some([255, 0, 0]));
        assert_eq!(frame.pixel(320, 240), Some([0, 0, 0]));
        // Fully filled meter in the top tier colour.
        assert_eq!(frame.pixel(440 + 149, 55), Some([255, 0, 0]));
    }

    #[test]
    fn paint_leaves_unfilled_meter_grey() {
        let tiers = TierTable::default();
        let mut frame = Frame::filled(640, 480, 1, [0, 0, 0]).unwrap();
        OverlayModel::new(10.0, tiers.tier_for(10.0)).paint(&mut frame);
        assert_eq!(frame.pixel(440, 55), Some([255, 255, 0]));
        assert_eq!(frame.pixel(440 + 100, 55), Some(METER_BACKGROUND));
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0]));
    }
}
