mod backend;
pub mod backends;
mod registry;
mod result;

use anyhow::{anyhow, Result};

use crate::config::DetectorSettings;
use crate::ingest::CameraConfig;

pub use backend::{DetectionCapability, DetectorBackend};
pub use backends::{ReplayBackend, StubBackend, StubPattern, SubprocessBackend};
pub use registry::BackendRegistry;
pub use result::{landmarks, DetectionResult, FaceRegion, HandLandmarks, Landmark, HAND_LANDMARK_COUNT};

/// Build the registry for the configured detector backend.
///
/// A face-only backend (tract) gets hand landmarks from the subprocess
/// detector when a command is configured, and from a calm stub otherwise.
pub fn build_registry(settings: &DetectorSettings, camera: &CameraConfig) -> Result<BackendRegistry> {
    settings.validate()?;
    let mut registry = BackendRegistry::new();
    match settings.backend.as_str() {
        "stub" => {
            let pattern: StubPattern = settings.stub_pattern.parse()?;
            registry.register(StubBackend::with_pattern(pattern));
        }
        "replay" => {
            let path = settings
                .trace_path
                .as_ref()
                .ok_or_else(|| anyhow!("detector.trace_path is required for the replay backend"))?;
            registry.register(ReplayBackend::from_path(path)?);
        }
        "subprocess" => {
            let command = settings
                .command
                .as_deref()
                .ok_or_else(|| anyhow!("detector.command is required for the subprocess backend"))?;
            registry.register(SubprocessBackend::spawn(command)?);
        }
        #[cfg(feature = "backend-tract")]
        "tract" => {
            let model = settings
                .model_path
                .as_ref()
                .ok_or_else(|| anyhow!("detector.model_path is required for the tract backend"))?;
            registry.register(backends::TractBackend::new(model, camera.width, camera.height)?);
            match settings.command.as_deref() {
                Some(command) => registry.register(SubprocessBackend::spawn(command)?),
                None => {
                    log::warn!("detector: tract covers faces only, hands come from a calm stub");
                    registry.register(StubBackend::new());
                }
            }
        }
        other => {
            return Err(anyhow!(
                "detector backend '{}' is not available in this build",
                other
            ))
        }
    }
    log::debug!(
        "detector: registered {:?} for {}",
        registry.list(),
        camera.device
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_stub_registry() -> Result<()> {
        let settings = DetectorSettings::default();
        let registry = build_registry(&settings, &CameraConfig::default())?;
        assert_eq!(registry.default_name(), Some("stub"));
        registry.prepare()?;
        Ok(())
    }

    #[test]
    fn replay_needs_a_readable_trace() {
        let settings = DetectorSettings {
            backend: "replay".to_string(),
            trace_path: Some("/nonexistent/trace.jsonl".into()),
            ..DetectorSettings::default()
        };
        assert!(build_registry(&settings, &CameraConfig::default()).is_err());
    }

    #[cfg(not(feature = "backend-tract"))]
    #[test]
    fn tract_requires_feature() {
        let settings = DetectorSettings {
            backend: "tract".to_string(),
            model_path: Some("face.onnx".into()),
            ..DetectorSettings::default()
        };
        assert!(build_registry(&settings, &CameraConfig::default()).is_err());
    }
}
