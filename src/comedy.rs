//! Cosmetic text and emoji effects.
//!
//! Nothing here touches the score. Text comes from a `TextSource`, which can
//! be a random picker, a round-robin list, or any `FnMut() -> Option<String>`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

pub const DEFAULT_MEMES: &[&str] = &[
    "This is fine. 🔥🐕🔥",
    "Why are you like this? 🤷",
    "Congratulations, you played yourself 🎉",
    "Awkwardness level: It's over 9000! 💥",
    "Error 404: Social skills not found 🤖",
    "Smooth move, Shakespeare 📚",
    "Me trying to be social: 🤡",
    "Current mood: Existential crisis 💀",
    "Social battery: 1% remaining 🔋",
];

pub const DEFAULT_VOICE_LINES: &[&str] = &[
    "Awkward silence detected!",
    "Warning: Cringe levels rising!",
    "Social skills malfunction!",
    "Emergency! Call backup conversation topics!",
    "Abort mission! Abort mission!",
    "Awkwardness overload detected!",
    "Please remain calm during this social disaster.",
    "Have you tried talking about the weather?",
];

pub const DEFAULT_SCIENCE_LINES: &[&str] = &[
    "Detecting elevated cringe particles in atmosphere",
    "Social awkwardness quantum field fluctuation detected",
    "Initiating emergency conversation protocol",
    "Measuring social entropy - increasing rapidly",
    "Warning: Approaching awkwardness event horizon",
    "Calculating optimal escape trajectory",
    "Activating emergency small talk subroutines",
];

pub const DEFAULT_EMOJIS: &[&str] = &["😰", "😅", "🤦", "💀", "🚨", "⚠️", "😳"];

/// Produces cosmetic text lines on demand.
pub trait TextSource: Send {
    fn next_text(&mut self) -> Option<String>;
}

impl<F> TextSource for F
where
    F: FnMut() -> Option<String> + Send,
{
    fn next_text(&mut self) -> Option<String> {
        self()
    }
}

/// Uniform random pick from a fixed list.
pub struct RandomText {
    lines: Vec<String>,
    rng: StdRng,
}

impl RandomText {
    pub fn new(lines: Vec<String>, rng: StdRng) -> Self {
        Self { lines, rng }
    }

    pub fn from_static(lines: &[&str], seed: Option<u64>) -> Self {
        Self::new(
            lines.iter().map(|line| line.to_string()).collect(),
            seeded_rng(seed),
        )
    }
}

impl TextSource for RandomText {
    fn next_text(&mut self) -> Option<String> {
        if self.lines.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..self.lines.len());
        Some(self.lines[idx].clone())
    }
}

/// Cycles through a list in order.
pub struct RoundRobin {
    lines: Vec<String>,
    cursor: usize,
}

impl RoundRobin {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines, cursor: 0 }
    }

    pub fn from_static(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|line| line.to_string()).collect())
    }
}

impl TextSource for RoundRobin {
    fn next_text(&mut self) -> Option<String> {
        if self.lines.is_empty() {
            return None;
        }
        let line = self.lines[self.cursor % self.lines.len()].clone();
        self.cursor = self.cursor.wrapping_add(1);
        Some(line)
    }
}

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// -------------------- Meme rotation --------------------

pub struct MemeRotator {
    source: Box<dyn TextSource>,
    interval: Duration,
    current: Option<String>,
    changed_at: Option<Instant>,
    enabled: bool,
}

impl MemeRotator {
    pub fn new(source: Box<dyn TextSource>, interval: Duration, enabled: bool) -> Self {
        Self {
            source,
            interval,
            current: None,
            changed_at: None,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flip meme mode; a fresh meme is drawn when it turns on.
    pub fn toggle(&mut self, now: Instant) -> bool {
        self.enabled = !self.enabled;
        if self.enabled {
            self.rotate(now);
        }
        self.enabled
    }

    /// Current meme, rotating it when the interval has passed.
    pub fn tick(&mut self, now: Instant) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        let due = match self.changed_at {
            Some(at) => now.saturating_duration_since(at) >= self.interval,
            None => true,
        };
        if due {
            self.rotate(now);
        }
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&str> {
        if self.enabled {
            self.current.as_deref()
        } else {
            None
        }
    }

    fn rotate(&mut self, now: Instant) {
        self.current = self.source.next_text();
        self.changed_at = Some(now);
    }
}

// -------------------- Floating emojis --------------------

#[derive(Clone, Debug, PartialEq)]
pub struct FloatingEmoji {
    pub emoji: String,
    pub x: i32,
    pub y: i32,
    pub speed_y: i32,
    pub life: u32,
}

pub struct FloatingEmojis {
    palette: Vec<String>,
    spawn_chance: f64,
    life: u32,
    active: Vec<FloatingEmoji>,
}

impl FloatingEmojis {
    pub fn new(palette: &[&str], spawn_chance: f64, life: u32) -> Self {
        Self {
            palette: palette.iter().map(|e| e.to_string()).collect(),
            spawn_chance: spawn_chance.clamp(0.0, 1.0),
            life,
            active: Vec::new(),
        }
    }

    pub fn active(&self) -> &[FloatingEmoji] {
        &self.active
    }

    /// Add an emoji near the bottom of a `width` x `height` frame.
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        if self.palette.is_empty() {
            return;
        }
        let emoji = self.palette[rng.gen_range(0..self.palette.len())].clone();
        let w = width as i32;
        let x = if w > 200 {
            rng.gen_range(100..=w - 100)
        } else {
            w / 2
        };
        self.active.push(FloatingEmoji {
            emoji,
            x,
            y: (height as i32 - 100).max(0),
            speed_y: rng.gen_range(-3..=-1),
            life: self.life,
        });
    }

    /// One frame: maybe spawn, move everything up, drop expired ones.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        if rng.gen_bool(self.spawn_chance) {
            self.spawn(rng, width, height);
        }
        for emoji in &mut self.active {
            emoji.y += emoji.speed_y;
            emoji.life = emoji.life.saturating_sub(1);
        }
        self.active.retain(|emoji| emoji.life > 0 && emoji.y >= 0);
    }
}

// -------------------- Fake science caption --------------------

/// A caption that moves to its next line with a small chance each frame.
pub struct ScienceTicker {
    source: Box<dyn TextSource>,
    change_chance: f64,
    current: Option<String>,
}

impl ScienceTicker {
    pub fn new(mut source: Box<dyn TextSource>, change_chance: f64) -> Self {
        let current = source.next_text();
        Self {
            source,
            change_chance: change_chance.clamp(0.0, 1.0),
            current,
        }
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&str> {
        if rng.gen_bool(self.change_chance) {
            if let Some(next) = self.source.next_text() {
                self.current = Some(next);
            }
        }
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_wraps() {
        let mut source = RoundRobin::from_static(&["a", "b"]);
        let got: Vec<_> = (0..3).filter_map(|_| source.next_text()).collect();
        assert_eq!(got, vec!["a", "b", "a"]);
        assert!(RoundRobin::new(vec![]).next_text().is_none());
    }

    #[test]
    fn science_ticker_advances_only_on_chance() {
        let mut rng = seeded_rng(Some(1));
        let mut never = ScienceTicker::new(Box::new(RoundRobin::from_static(&["a", "b"])), 0.0);
        assert_eq!(never.tick(&mut rng), Some("a"));
        assert_eq!(never.tick(&mut rng), Some("a"));

        let mut always = ScienceTicker::new(Box::new(RoundRobin::from_static(&["a", "b"])), 1.0);
        assert_eq!(always.tick(&mut rng), Some("b"));
        assert_eq!(always.tick(&mut rng), Some("a"));
    }

    #[test]
    fn closures_are_text_sources() {
        let mut n = 0;
        let mut source = move || {
            n += 1;
            Some(format!("line {}", n))
        };
        assert_eq!(source.next_text().as_deref(), Some("line 1"));
        assert_eq!(source.next_text().as_deref(), Some("line 2"));
    }

    #[test]
    fn random_text_picks_from_list() {
        let mut source = RandomText::from_static(DEFAULT_MEMES, Some(7));
        for _ in 0..20 {
            let meme = source.next_text().unwrap();
            assert!(DEFAULT_MEMES.contains(&meme.as_str()));
        }
    }

    #[test]
    fn meme_rotates_on_interval() {
        let start = Instant::now();
        let mut rotator = MemeRotator::new(
            Box::new(RoundRobin::from_static(&["one", "two"])),
            Duration::from_secs(5),
            true,
        );
        assert_eq!(rotator.tick(start), Some("one"));
        assert_eq!(rotator.tick(start + Duration::from_secs(4)), Some("one"));
        assert_eq!(rotator.tick(start + Duration::from_secs(5)), Some("two"));
    }

    #[test]
    fn meme_toggle_hides_and_redraws() {
        let now = Instant::now();
        let mut rotator = MemeRotator::new(
            Box::new(RoundRobin::from_static(&["one", "two"])),
            Duration::from_secs(5),
            false,
        );
        assert_eq!(rotator.tick(now), None);
        assert!(rotator.toggle(now));
        assert_eq!(rotator.current(), Some("one"));
        assert!(!rotator.toggle(now));
        assert_eq!(rotator.current(), None);
    }

    #[test]
    fn floating_emojis_rise_and_expire() {
        let mut rng = seeded_rng(Some(1));
        let mut emojis = FloatingEmojis::new(DEFAULT_EMOJIS, 0.0, 3);
        emojis.spawn(&mut rng, 640, 480);
        let start_y = emojis.active()[0].y;
        assert_eq!(start_y, 380);
        emojis.tick(&mut rng, 640, 480);
        assert!(emojis.active()[0].y < start_y);
        emojis.tick(&mut rng, 640, 480);
        emojis.tick(&mut rng, 640, 480);
        assert!(emojis.active().is_empty());
    }
}
