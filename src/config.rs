use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::alerts::AlertConfig;
use crate::detect::StubPattern;
use crate::ingest::CameraConfig;
use crate::score::{DecayPolicy, ScoreConfig, Tier, TierTable};
use crate::signal::SignalConfig;

const DEFAULT_DETECTOR: &str = "stub";
const DEFAULT_REPORT_DIR: &str = ".";
const DEFAULT_MEME_INTERVAL_SECS: u64 = 5;
const DEFAULT_EMOJI_CHANCE: f64 = 0.01;
const DEFAULT_EMOJI_LIFE: u32 = 60;

/// Detector backends that can be named in config or on the command line.
pub const DETECTOR_BACKENDS: &[&str] = &["stub", "replay", "subprocess", "tract"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub backend: String,
    /// Pattern for the `stub` backend.
    pub stub_pattern: String,
    /// Command line for the `subprocess` backend.
    pub command: Option<String>,
    /// JSON-lines trace for the `replay` backend.
    pub trace_path: Option<PathBuf>,
    /// ONNX model for the `tract` backend.
    pub model_path: Option<PathBuf>,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            backend: DEFAULT_DETECTOR.to_string(),
            stub_pattern: "cycle".to_string(),
            command: None,
            trace_path: None,
            model_path: None,
        }
    }
}

impl DetectorSettings {
    pub fn validate(&self) -> Result<()> {
        match self.backend.as_str() {
            "stub" => {
                self.stub_pattern.parse::<StubPattern>()?;
            }
            "replay" if self.trace_path.is_none() => {
                return Err(anyhow!("detector.trace_path is required for the replay backend"));
            }
            "subprocess" if self.command.as_deref().map_or(true, |c| c.trim().is_empty()) => {
                return Err(anyhow!("detector.command is required for the subprocess backend"));
            }
            "tract" if self.model_path.is_none() => {
                return Err(anyhow!("detector.model_path is required for the tract backend"));
            }
            "replay" | "subprocess" | "tract" => {}
            other => {
                return Err(anyhow!(
                    "unknown detector backend '{}' (expected one of: {})",
                    other,
                    DETECTOR_BACKENDS.join(", ")
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComedySettings {
    pub memes: bool,
    pub meme_interval_secs: u64,
    pub emoji_chance: f64,
    pub emoji_life: u32,
    /// Fixed rng seed, for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ComedySettings {
    fn default() -> Self {
        Self {
            memes: true,
            meme_interval_secs: DEFAULT_MEME_INTERVAL_SECS,
            emoji_chance: DEFAULT_EMOJI_CHANCE,
            emoji_life: DEFAULT_EMOJI_LIFE,
            seed: None,
        }
    }
}

impl ComedySettings {
    pub fn meme_interval(&self) -> Duration {
        Duration::from_secs(self.meme_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub dir: PathBuf,
    /// Save the painted frame next to each report (feature `snapshot`).
    pub snapshot: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_REPORT_DIR),
            snapshot: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub camera: CameraConfig,
    pub scoring: ScoreConfig,
    pub signal: SignalConfig,
    pub detector: DetectorSettings,
    pub alerts: AlertConfig,
    pub comedy: ComedySettings,
    pub report: ReportSettings,
    /// Custom severity tiers. Defaults to the built-in table.
    pub tiers: Option<Vec<Tier>>,
}

impl MeterConfig {
    /// Defaults, then the file named by `AWK_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("AWK_CONFIG").ok();
        let mut cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => read_config_file(Path::new(path))?,
            _ => Self::default(),
        };
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a config file with no env overrides.
    pub fn from_path(path: &Path) -> Result<Self> {
        let cfg = read_config_file(path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(device) = env_value("AWK_CAMERA_DEVICE") {
            self.camera.device = device;
        }
        if let Some(fps) = env_value("AWK_TARGET_FPS") {
            self.camera.target_fps = fps
                .parse()
                .map_err(|_| anyhow!("AWK_TARGET_FPS must be a whole number of frames"))?;
        }
        if let Some(backend) = env_value("AWK_DETECTOR") {
            self.detector.backend = backend;
        }
        if let Some(command) = env_value("AWK_DETECTOR_COMMAND") {
            self.detector.command = Some(command);
        }
        if let Some(policy) = env_value("AWK_DECAY_POLICY") {
            self.scoring.decay_policy = policy.parse::<DecayPolicy>()?;
        }
        if let Some(dir) = env_value("AWK_REPORT_DIR") {
            self.report.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.camera.validate()?;
        self.scoring.validate()?;
        self.signal.validate()?;
        self.detector.validate()?;
        self.alerts.validate()?;
        if !(0.0..=1.0).contains(&self.comedy.emoji_chance) {
            return Err(anyhow!(
                "comedy.emoji_chance must be within 0..=1 (got {})",
                self.comedy.emoji_chance
            ));
        }
        if self.comedy.meme_interval_secs == 0 {
            return Err(anyhow!("comedy.meme_interval_secs must be >= 1"));
        }
        self.tier_table()?;
        Ok(())
    }

    pub fn tier_table(&self) -> Result<TierTable> {
        match &self.tiers {
            Some(tiers) => TierTable::new(tiers.clone()),
            None => Ok(TierTable::default()),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn read_config_file(path: &Path) -> Result<MeterConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
