//! Training academy scenarios.
//!
//! A scenario is a timed prompt ("touch your face five times"). The runner
//! tracks which one is active and reports an outcome with the score at the
//! moment it ran out.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    pub name: &'static str,
    pub instructions: &'static str,
    pub duration: Duration,
    pub expected_behavior: &'static str,
}

pub const SCENARIOS: [Scenario; 6] = [
    Scenario {
        name: "The Forced Smile Test",
        instructions: "Smile awkwardly for 10 seconds. Make it look forced!",
        duration: Duration::from_secs(10),
        expected_behavior: "Should detect fake facial expressions",
    },
    Scenario {
        name: "The Face Touch Challenge",
        instructions: "Touch your face nervously 5 times in 15 seconds",
        duration: Duration::from_secs(15),
        expected_behavior: "Should trigger fidget detection",
    },
    Scenario {
        name: "The Eye Contact Avoidance",
        instructions: "Look away from the camera for 5 seconds, then back",
        duration: Duration::from_secs(10),
        expected_behavior: "Should detect loss of eye contact",
    },
    Scenario {
        name: "The Nervous Fidget",
        instructions: "Play with your hair and touch your neck repeatedly",
        duration: Duration::from_secs(12),
        expected_behavior: "Should increase awkwardness score rapidly",
    },
    Scenario {
        name: "The Silent Treatment",
        instructions: "Just sit still and stare blankly at the camera",
        duration: Duration::from_secs(8),
        expected_behavior: "Should detect uncomfortable silence",
    },
    Scenario {
        name: "The Overcompensation",
        instructions: "Nod enthusiastically and gesture wildly with your hands",
        duration: Duration::from_secs(10),
        expected_behavior: "Should detect excessive hand movement",
    },
];

/// What the overlay shows while a scenario runs.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioBanner {
    pub number: usize,
    pub name: &'static str,
    pub instructions: &'static str,
    pub remaining: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioOutcome {
    pub number: usize,
    pub name: &'static str,
    pub final_score: f64,
}

pub struct ScenarioRunner {
    current: usize,
    started_at: Option<Instant>,
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self {
            current: 0,
            started_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn current(&self) -> &'static Scenario {
        &SCENARIOS[self.current]
    }

    /// Start scenario `index` (0-based).
    pub fn start(&mut self, index: usize, now: Instant) -> Result<&'static Scenario> {
        if index >= SCENARIOS.len() {
            return Err(anyhow!(
                "no scenario {} (choose 1-{})",
                index + 1,
                SCENARIOS.len()
            ));
        }
        self.current = index;
        self.started_at = Some(now);
        let scenario = &SCENARIOS[index];
        log::info!(
            "scenario {}: {} ({}s) - {}",
            index + 1,
            scenario.name,
            scenario.duration.as_secs(),
            scenario.instructions
        );
        Ok(scenario)
    }

    /// Start the scenario after the current one, wrapping around.
    pub fn start_next(&mut self, now: Instant) -> &'static Scenario {
        let next = (self.current + 1) % SCENARIOS.len();
        self.current = next;
        self.started_at = Some(now);
        let scenario = &SCENARIOS[next];
        log::info!("scenario {}: {}", next + 1, scenario.name);
        scenario
    }

    pub fn banner(&self, now: Instant) -> Option<ScenarioBanner> {
        let started_at = self.started_at?;
        let scenario = self.current();
        let elapsed = now.saturating_duration_since(started_at);
        Some(ScenarioBanner {
            number: self.current + 1,
            name: scenario.name,
            instructions: scenario.instructions,
            remaining: scenario.duration.saturating_sub(elapsed),
        })
    }

    /// Finish the active scenario once its time is up.
    pub fn tick(&mut self, now: Instant, score: f64) -> Option<ScenarioOutcome> {
        let banner = self.banner(now)?;
        if !banner.remaining.is_zero() {
            return None;
        }
        self.started_at = None;
        let outcome = ScenarioOutcome {
            number: banner.number,
            name: banner.name,
            final_score: score,
        };
        log::info!(
            "scenario {} complete, final awkwardness score {:.1}",
            outcome.number,
            outcome.final_score
        );
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_complete() {
        let start = Instant::now();
        let mut runner = ScenarioRunner::new();
        assert!(!runner.is_active());
        assert!(runner.tick(start, 0.0).is_none());

        let scenario = runner.start(4, start).unwrap();
        assert_eq!(scenario.name, "The Silent Treatment");
        let banner = runner.banner(start + Duration::from_secs(3)).unwrap();
        assert_eq!(banner.number, 5);
        assert_eq!(banner.remaining, Duration::from_secs(5));
        assert!(runner.tick(start + Duration::from_secs(7), 3.0).is_none());

        let outcome = runner.tick(start + Duration::from_secs(8), 12.5).unwrap();
        assert_eq!(outcome.final_score, 12.5);
        assert!(!runner.is_active());
    }

    #[test]
    fn next_wraps_around() {
        let now = Instant::now();
        let mut runner = ScenarioRunner::new();
        runner.start(5, now).unwrap();
        assert_eq!(runner.start_next(now).name, "The Forced Smile Test");
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut runner = ScenarioRunner::new();
        assert!(runner.start(6, Instant::now()).is_err());
        assert!(!runner.is_active());
    }
}
