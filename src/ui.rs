use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

use awkwardness_meter::score::METER_CEILING;
use awkwardness_meter::session::FrameOutcome;

#[derive(Clone, Copy, Debug)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
    disable_pretty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool, disable_pretty: bool) -> Self {
        Self {
            mode,
            is_tty,
            disable_pretty,
        }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool, disable_pretty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty, disable_pretty)
    }

    fn use_pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty => true,
                UiMode::Auto => !self.disable_pretty,
                UiMode::Plain => false,
            }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.use_pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }

    /// The cringe meter: a live bar on a tty, tier-change lines otherwise.
    pub fn meter(&self) -> MeterDisplay {
        if self.use_pretty() {
            let bar = ProgressBar::new(METER_CEILING as u64);
            bar.set_draw_target(ProgressDrawTarget::stderr());
            let style = ProgressStyle::with_template(
                "CRINGE LEVEL [{bar:30.red/white}] {pos:>3}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            MeterDisplay { bar: Some(bar) }
        } else {
            MeterDisplay { bar: None }
        }
    }
}

pub struct MeterDisplay {
    bar: Option<ProgressBar>,
}

impl MeterDisplay {
    pub fn update(&self, outcome: &FrameOutcome) {
        let overlay = &outcome.overlay;
        match &self.bar {
            Some(bar) => {
                bar.set_position(overlay.score.min(METER_CEILING) as u64);
                let mut message = overlay.tier_label.clone();
                if let Some(banner) = &overlay.scenario {
                    message.push_str(&format!(
                        " | {} {:.1}s",
                        banner.name,
                        banner.remaining.as_secs_f64()
                    ));
                }
                if let Some(meme) = &overlay.meme {
                    message.push_str(" | ");
                    message.push_str(meme);
                }
                bar.set_message(message);
            }
            None => {
                if outcome.tier_changed {
                    eprintln!("{} | {}", overlay.score_text(), overlay.tier_label);
                }
            }
        }
        if let Some(done) = &outcome.scenario {
            self.println(format!(
                "✅ Scenario {} complete! Final awkwardness score: {:.1}",
                done.number, done.final_score
            ));
        }
    }

    pub fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let message = format!("✔ {} ({})", self.name, format_duration(elapsed));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
