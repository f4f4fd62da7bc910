//! Frame ingestion sources.
//!
//! - Local webcams through V4L2 (feature: ingest-v4l2)
//! - Synthetic `stub://` scenes (tests, demos, benchmarks)
//!
//! All sources produce RGB24 `Frame`s. Device-native layouts (YUYV, NV12)
//! are normalised here so detectors only ever see RGB.

pub mod camera;
pub mod normalize;
#[cfg(feature = "ingest-v4l2")]
mod v4l2;

pub use camera::{CameraConfig, CameraSource, CameraStats, STUB_SCHEME};
pub use normalize::{normalize_to_rgb, PixelFormat};
