use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::detect::result::DetectionResult;
use crate::frame::FrameView;

use super::backend::{DetectionCapability, DetectorBackend};

/// Capabilities the scoring pipeline needs on every frame.
const FRAME_CAPABILITIES: [DetectionCapability; 2] = [
    DetectionCapability::FacePresence,
    DetectionCapability::HandLandmarks,
];

/// Thread-safe registry of detector backends.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect` takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<Mutex<dyn DetectorBackend>>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<dyn DetectorBackend>>> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<Arc<Mutex<dyn DetectorBackend>>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Select a backend that supports the requested capability.
    ///
    /// Prefers the default backend when it supports the capability.
    pub fn backend_for_capability(
        &self,
        capability: DetectionCapability,
    ) -> Result<(String, Arc<Mutex<dyn DetectorBackend>>)> {
        if let (Some(name), Some(default_backend)) =
            (self.default_name.as_ref(), self.default_backend())
        {
            let supports = {
                let guard = default_backend
                    .lock()
                    .map_err(|_| anyhow!("default backend lock poisoned"))?;
                guard.supports(capability)
            };
            if supports {
                return Ok((name.clone(), default_backend));
            }
        }

        for name in self.list() {
            let Some(backend) = self.backends.get(&name) else {
                continue;
            };
            let supports = {
                let guard = backend
                    .lock()
                    .map_err(|_| anyhow!("backend lock poisoned"))?;
                guard.supports(capability)
            };
            if supports {
                return Ok((name, backend.clone()));
            }
        }

        Err(anyhow!(
            "no registered backend supports capability {:?}",
            capability
        ))
    }

    /// Check that every per-frame capability is covered, and warm the backends up.
    pub fn prepare(&self) -> Result<()> {
        for capability in FRAME_CAPABILITIES {
            let (name, backend) = self.backend_for_capability(capability)?;
            let mut guard = backend
                .lock()
                .map_err(|_| anyhow!("backend lock poisoned"))?;
            guard.warm_up()?;
            log::info!("detector: {:?} served by '{}'", capability, name);
        }
        Ok(())
    }

    /// Run every backend needed for face and hand detection once on a frame
    /// and merge their output.
    ///
    /// Each backend only contributes the capabilities it was picked for.
    pub fn detect_frame(&self, frame: &FrameView<'_>) -> Result<DetectionResult> {
        let mut plan: Vec<(String, Arc<Mutex<dyn DetectorBackend>>, Vec<DetectionCapability>)> =
            Vec::with_capacity(FRAME_CAPABILITIES.len());
        for capability in FRAME_CAPABILITIES {
            let (name, backend) = self.backend_for_capability(capability)?;
            match plan.iter_mut().find(|(seen, _, _)| *seen == name) {
                Some((_, _, caps)) => caps.push(capability),
                None => plan.push((name, backend, vec![capability])),
            }
        }

        let mut merged = DetectionResult::default();
        for (_, backend, caps) in plan {
            let mut guard = backend
                .lock()
                .map_err(|_| anyhow!("backend lock poisoned"))?;
            let mut result = frame.run_detector(&mut *guard)?;
            if !caps.contains(&DetectionCapability::FacePresence) {
                result.faces.clear();
            }
            if !caps.contains(&DetectionCapability::HandLandmarks) {
                result.hands.clear();
            }
            merged.merge(result);
        }
        Ok(merged)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
