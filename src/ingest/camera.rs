//! Camera frame source.
//!
//! `CameraSource` yields RGB24 `Frame`s from a local webcam (feature
//! `ingest-v4l2`) or from a synthetic `stub://` scene. `next_frame` returns
//! `Ok(None)` at end-of-stream; an `Err` means the capture itself failed.
//! Either one ends the session loop.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[cfg(feature = "ingest-v4l2")]
use super::v4l2::DeviceCamera;
use crate::frame::Frame;

pub const STUB_SCHEME: &str = "stub://";

/// Configuration for a camera source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device path (e.g. "/dev/video0") or `stub://name` for a synthetic scene.
    pub device: String,
    /// Target frame rate (frames per second).
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
    /// Synthetic sources only: end the stream after this many frames.
    pub max_frames: Option<u64>,
    /// Synthetic sources only: fail the capture after this many frames.
    pub fail_after: Option<u64>,
    /// Synthetic sources only: sleep to hold `target_fps`.
    pub paced: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            target_fps: 15,
            width: 640,
            height: 480,
            max_frames: None,
            fail_after: None,
            paced: true,
        }
    }
}

impl CameraConfig {
    /// Synthetic camera that runs as fast as the caller pulls frames.
    pub fn synthetic(name: &str, width: u32, height: u32, max_frames: Option<u64>) -> Self {
        Self {
            device: format!("{}{}", STUB_SCHEME, name),
            target_fps: 15,
            width,
            height,
            max_frames,
            fail_after: None,
            paced: false,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.device.starts_with(STUB_SCHEME)
    }

    pub fn validate(&self) -> Result<()> {
        if self.device.trim().is_empty() {
            return Err(anyhow!("camera.device must not be empty"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!(
                "camera size must be non-zero (got {}x{})",
                self.width,
                self.height
            ));
        }
        if self.target_fps == 0 {
            return Err(anyhow!("camera.target_fps must be >= 1"));
        }
        Ok(())
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub device: String,
}

pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "ingest-v4l2")]
    Device(DeviceCamera),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        config.validate()?;
        if config.is_synthetic() {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::new(config)),
            })
        } else {
            #[cfg(feature = "ingest-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::Device(DeviceCamera::new(config)?),
                })
            }
            #[cfg(not(feature = "ingest-v4l2"))]
            {
                Err(anyhow!(
                    "camera device {} requires the ingest-v4l2 feature (or use {}name)",
                    config.device,
                    STUB_SCHEME
                ))
            }
        }
    }

    /// Open the device.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.connect(),
        }
    }

    /// Capture the next frame, or `None` at end-of-stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.next_frame(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(_) => true,
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.stats(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://)
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
    scene_state: u8,
    next_due: Option<Instant>,
}

impl SyntheticCamera {
    fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            scene_state: 0,
            next_due: None,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("camera: connected to {} (synthetic)", self.config.device);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(max) = self.config.max_frames {
            if self.frame_count >= max {
                return Ok(None);
            }
        }
        if let Some(limit) = self.config.fail_after {
            if self.frame_count >= limit {
                return Err(anyhow!(
                    "camera {} stopped delivering frames after {}",
                    self.config.device,
                    limit
                ));
            }
        }
        if self.config.paced {
            self.pace();
        }
        self.frame_count += 1;

        let pixels = self.generate_synthetic_pixels();
        Frame::from_rgb(
            pixels,
            self.config.width,
            self.config.height,
            self.frame_count,
        )
        .map(Some)
    }

    fn pace(&mut self) {
        let interval = Duration::from_secs(1) / self.config.target_fps.max(1);
        let now = Instant::now();
        if let Some(due) = self.next_due {
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        self.next_due = Some(Instant::now() + interval);
    }

    /// Moving gradient, with the scene shifting every 50 frames.
    fn generate_synthetic_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.config.width as usize) * (self.config.height as usize) * 3;

        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.config.device.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_source_produces_frames() -> Result<()> {
        let mut source = CameraSource::new(CameraConfig::synthetic("test", 64, 48, None))?;
        source.connect()?;

        let frame = source.next_frame()?.expect("frame");
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.index, 1);
        assert!(source.is_healthy());
        Ok(())
    }

    #[test]
    fn synthetic_source_ends_after_max_frames() -> Result<()> {
        let mut source = CameraSource::new(CameraConfig::synthetic("short", 8, 8, Some(3)))?;
        source.connect()?;
        let mut count = 0;
        while source.next_frame()?.is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(source.stats().frames_captured, 3);
        assert!(source.next_frame()?.is_none());
        Ok(())
    }

    #[test]
    fn synthetic_source_can_fail_mid_stream() -> Result<()> {
        let mut cfg = CameraConfig::synthetic("flaky", 8, 8, None);
        cfg.fail_after = Some(2);
        let mut source = CameraSource::new(cfg)?;
        source.connect()?;
        assert!(source.next_frame()?.is_some());
        assert!(source.next_frame()?.is_some());
        let err = source.next_frame().err().expect("capture error");
        assert!(err.to_string().contains("after 2"));
        Ok(())
    }

    #[test]
    fn config_is_validated() {
        let mut cfg = CameraConfig::synthetic("bad", 0, 48, None);
        assert!(CameraSource::new(cfg.clone()).is_err());
        cfg.width = 64;
        cfg.target_fps = 0;
        assert!(cfg.validate().is_err());
    }

    #[cfg(not(feature = "ingest-v4l2"))]
    #[test]
    fn device_requires_feature() {
        assert!(CameraSource::new(CameraConfig::default()).is_err());
    }
}
