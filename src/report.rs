//! End-of-session report.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "snapshot")]
use crate::frame::Frame;
use crate::stats::SessionStats;

pub const REPORT_PREFIX: &str = "awkwardness_report_";

const RECOMMENDATIONS: &[&str] = &[
    "Practice conversations with houseplants first",
    "Emergency topic: Ask about their favorite pizza toppings",
    "Consider professional small talk training",
    "Watch more rom-coms for inspiration",
    "Remember: Everyone is awkward sometimes!",
];

#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    pub generated_at: DateTime<Local>,
    pub duration: Duration,
    pub total_frames: u64,
    pub peak_score: f64,
    pub final_score: f64,
    pub awkward_frames: u64,
    pub awkward_percentage: f64,
    pub smooth_moments: u64,
    pub face_touches: u64,
    pub fidgets: u64,
    pub eye_contact_breaks: u64,
    /// 6..=10, drawn from the session rng.
    pub fidget_factor: u8,
    pub social_confidence: u8,
    /// 3..=7, drawn from the session rng.
    pub resilience: u8,
}

impl SessionReport {
    pub fn build<R: Rng + ?Sized>(
        stats: &SessionStats,
        final_score: f64,
        duration: Duration,
        generated_at: DateTime<Local>,
        rng: &mut R,
    ) -> Self {
        Self {
            generated_at,
            duration,
            total_frames: stats.total_frames,
            peak_score: stats.peak_score,
            final_score,
            awkward_frames: stats.awkward_frames,
            awkward_percentage: stats.awkward_percentage(),
            smooth_moments: stats.smooth_moments,
            face_touches: stats.face_touches,
            fidgets: stats.fidgets,
            eye_contact_breaks: stats.eye_contact_breaks,
            fidget_factor: rng.gen_range(6..=10),
            social_confidence: social_confidence(stats.peak_score),
            resilience: rng.gen_range(3..=7),
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}{}.txt",
            REPORT_PREFIX,
            self.generated_at.format("%Y%m%d_%H%M%S")
        )
    }

    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "🎭 ULTIMATE AWKWARDNESS ANALYSIS REPORT 🎭".to_string(),
            "=".repeat(50),
            format!("📅 Date: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S")),
            format!(
                "⏱️ Session Duration: {:.1} minutes",
                self.duration.as_secs_f64() / 60.0
            ),
            format!("🎯 Frames Analyzed: {}", self.total_frames),
            String::new(),
            "📊 AWKWARDNESS METRICS:".to_string(),
            format!("• Peak Cringe Level: {:.1}/100", self.peak_score),
            format!("• Final Score: {:.1}/100", self.final_score),
            format!(
                "• Awkward Frames: {} ({:.1}%)",
                self.awkward_frames, self.awkward_percentage
            ),
            format!("• Smooth Moments: {}", self.smooth_moments),
            format!("• Face Touches: {} (concerning)", self.face_touches),
            format!("• Fidgets: {}", self.fidgets),
            format!("• Eye Contact Breaks: {}", self.eye_contact_breaks),
            String::new(),
            "🔬 BEHAVIORAL ANALYSIS:".to_string(),
            format!("• Fidget Factor: {}/10 (high)", self.fidget_factor),
            format!("• Social Confidence: {}/10", self.social_confidence),
            format!("• Awkwardness Resilience: {}/10", self.resilience),
            String::new(),
            "💡 RECOMMENDATIONS:".to_string(),
        ];
        lines.extend(RECOMMENDATIONS.iter().map(|tip| format!("• {}", tip)));
        lines.push(String::new());
        lines.push("🎪 ENTERTAINMENT VALUE: 10/10 ⭐".to_string());
        lines.push("Successfully turned social anxiety into comedy!".to_string());
        lines
    }

    /// Write the report into `dir`, creating it if needed. A report written
    /// in the same second as an earlier one gets a `_2`, `_3`... suffix.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create report dir {}", dir.display()))?;
        let mut path = dir.join(self.file_name());
        let mut sequence = 1u32;
        while path.exists() {
            sequence += 1;
            path = dir.join(format!(
                "{}{}_{}.txt",
                REPORT_PREFIX,
                self.generated_at.format("%Y%m%d_%H%M%S"),
                sequence
            ));
        }
        fs::write(&path, self.render_lines().join("\n"))
            .with_context(|| format!("write report {}", path.display()))?;
        log::info!("report saved as {}", path.display());
        Ok(path)
    }
}

/// `max(1, 10 - floor(peak / 10))`, never above 10.
pub fn social_confidence(peak_score: f64) -> u8 {
    let penalty = (peak_score.max(0.0) / 10.0).floor().min(9.0) as u8;
    (10 - penalty).max(1)
}

/// Save the painted frame next to a report, as `<report stem>.jpg`.
#[cfg(feature = "snapshot")]
pub fn write_snapshot(frame: &Frame, report_path: &Path) -> Result<PathBuf> {
    let image = image::RgbImage::from_raw(frame.width, frame.height, frame.pixels().to_vec())
        .context("frame buffer does not match its dimensions")?;
    let path = report_path.with_extension("jpg");
    image
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .with_context(|| format!("write snapshot {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comedy::seeded_rng;
    use crate::score::FrameSignal;
    use chrono::TimeZone;
    use std::time::Instant;

    fn sample() -> SessionReport {
        let mut stats = SessionStats::new(Instant::now());
        stats.record(&FrameSignal::new(false, 1, 0).unwrap(), 7.0, 34.0);
        stats.record(&FrameSignal::calm(), 0.0, 33.8);
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        SessionReport::build(
            &stats,
            33.8,
            Duration::from_secs(90),
            at,
            &mut seeded_rng(Some(11)),
        )
    }

    #[test]
    fn confidence_formula() {
        assert_eq!(social_confidence(0.0), 10);
        assert_eq!(social_confidence(34.0), 7);
        assert_eq!(social_confidence(95.0), 1);
        assert_eq!(social_confidence(500.0), 1);
    }

    #[test]
    fn renders_metrics() {
        let report = sample();
        assert_eq!(report.file_name(), "awkwardness_report_20240309_140507.txt");
        assert!((6..=10).contains(&report.fidget_factor));
        assert!((3..=7).contains(&report.resilience));

        let lines = report.render_lines();
        assert!(lines.contains(&"⏱️ Session Duration: 1.5 minutes".to_string()));
        assert!(lines.contains(&"• Peak Cringe Level: 34.0/100".to_string()));
        assert!(lines.contains(&"• Awkward Frames: 1 (50.0%)".to_string()));
        assert!(lines.contains(&"• Social Confidence: 7/10".to_string()));
    }

    #[test]
    fn writes_into_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("reports");
        let path = sample().write_to(&target)?;
        assert!(path.starts_with(&target));
        let body = fs::read_to_string(&path)?;
        assert!(body.starts_with("🎭 ULTIMATE AWKWARDNESS ANALYSIS REPORT"));
        Ok(())
    }

    #[test]
    fn same_second_reports_do_not_overwrite() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let report = sample();
        let first = report.write_to(dir.path())?;
        let second = report.write_to(dir.path())?;
        let third = report.write_to(dir.path())?;
        assert_eq!(first, dir.path().join("awkwardness_report_20240309_140507.txt"));
        assert_eq!(second, dir.path().join("awkwardness_report_20240309_140507_2.txt"));
        assert_eq!(third, dir.path().join("awkwardness_report_20240309_140507_3.txt"));
        assert_eq!(fs::read_dir(dir.path())?.count(), 3);
        Ok(())
    }
}
