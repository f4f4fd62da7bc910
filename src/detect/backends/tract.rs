#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::result::{DetectionResult, FaceRegion};
use crate::frame::FrameView;

/// Tract-based face presence classifier.
///
/// Loads a local ONNX model taking a `1x3xHxW` RGB tensor and producing face
/// scores. The highest score decides whether a face is in view. Hands are not
/// covered; pair it with another backend for `HandLandmarks`.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    width: u32,
    height: u32,
    confidence_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            width,
            height,
            confidence_threshold: 0.5,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Frames of any size are resampled to the model input, so a driver
    /// that settles on another resolution still gets real detections.
    fn build_input(&self, frame: &FrameView<'_>) -> Result<Tensor> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(anyhow!("empty frame"));
        }
        let (width, height) = (self.width, self.height);
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width as usize),
            |(_, channel, y, x)| {
                frame.sample(x as u32, y as u32, width, height)[channel] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn extract_confidence(&self, outputs: TVec<TValue>) -> Result<f32> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let max_score = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        if max_score.is_finite() {
            Ok(max_score)
        } else {
            Ok(0.0)
        }
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(capability, DetectionCapability::FacePresence)
    }

    fn detect(&mut self, frame: &FrameView<'_>) -> Result<DetectionResult> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let confidence = self.extract_confidence(outputs)?;

        let faces = if confidence >= self.confidence_threshold {
            vec![FaceRegion {
                x: 0.0,
                y: 0.0,
                w: 1.0,
                h: 1.0,
                confidence,
            }]
        } else {
            Vec::new()
        };
        Ok(DetectionResult {
            faces,
            hands: Vec::new(),
        })
    }
}
