//! Captured video frames.
//!
//! - `Frame`: owned RGB24 pixels plus capture metadata.
//! - `FrameView`: read-only view handed to detector backends.
//!
//! Detectors receive pixels through `FrameView::run_detector`, and only
//! `DetectionResult`s flow back out.

use anyhow::{anyhow, Result};
use std::time::Instant;

use crate::detect::{DetectionResult, DetectorBackend};

/// Bytes per RGB24 pixel.
pub const RGB_CHANNELS: usize = 3;

/// One captured RGB24 frame.
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Sequence number assigned by the source (starts at 1).
    pub index: u64,
    captured_at: Instant,
}

impl Frame {
    /// Wrap RGB24 pixels. The buffer length must be `width * height * 3`.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            index,
            captured_at: Instant::now(),
        })
    }

    /// Solid-colour frame, mostly for tests and synthetic sources.
    pub fn filled(width: u32, height: u32, index: u64, rgb: [u8; 3]) -> Result<Self> {
        let len = rgb_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..(len / RGB_CHANNELS) {
            data.extend_from_slice(&rgb);
        }
        Self::from_rgb(data, width, height, index)
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView { frame: self }
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// RGB value at (x, y), if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * RGB_CHANNELS;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    /// Fill an axis-aligned rectangle, clipped to the frame. Colour is RGB.
    pub(crate) fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, rgb: [u8; 3]) {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        let stride = self.width as usize * RGB_CHANNELS;
        for y in y0..y1 {
            let row = y as usize * stride;
            for x in x0..x1 {
                let offset = row + x as usize * RGB_CHANNELS;
                self.data[offset..offset + RGB_CHANNELS].copy_from_slice(&rgb);
            }
        }
    }

    /// Draw a rectangle outline of the given thickness along the frame edges.
    pub(crate) fn draw_border(&mut self, thickness: u32, rgb: [u8; 3]) {
        let (w, h) = (self.width, self.height);
        let t = thickness.min(w / 2).min(h / 2);
        self.fill_rect(0, 0, w, t, rgb);
        self.fill_rect(0, h.saturating_sub(t), w, h, rgb);
        self.fill_rect(0, 0, t, h, rgb);
        self.fill_rect(w.saturating_sub(t), 0, w, h, rgb);
    }
}

/// Read-only frame view for detectors.
pub struct FrameView<'a> {
    frame: &'a Frame,
}

impl<'a> FrameView<'a> {
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    pub fn index(&self) -> u64 {
        self.frame.index
    }

    pub fn pixels(&self) -> &'a [u8] {
        &self.frame.data
    }

    /// Nearest-neighbour pixel for `(x, y)` in an `out_width` x `out_height`
    /// resampling of this frame.
    pub fn sample(&self, x: u32, y: u32, out_width: u32, out_height: u32) -> [u8; 3] {
        let src_x = scale_coord(x, out_width, self.frame.width);
        let src_y = scale_coord(y, out_height, self.frame.height);
        let idx = (src_y as usize * self.frame.width as usize + src_x as usize) * RGB_CHANNELS;
        [
            self.frame.data[idx],
            self.frame.data[idx + 1],
            self.frame.data[idx + 2],
        ]
    }

    /// Run a backend on this frame.
    pub fn run_detector<D: DetectorBackend + ?Sized>(
        &self,
        detector: &mut D,
    ) -> Result<DetectionResult> {
        detector.detect(self)
    }
}

fn scale_coord(coord: u32, out_len: u32, src_len: u32) -> u32 {
    let scaled = (coord as u64 * src_len as u64) / out_len.max(1) as u64;
    (scaled as u32).min(src_len.saturating_sub(1))
}

fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(RGB_CHANNELS))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_validates_length() {
        assert!(Frame::from_rgb(vec![0u8; 11], 2, 2, 1).is_err());
        let frame = Frame::from_rgb(vec![7u8; 12], 2, 2, 1).unwrap();
        assert_eq!(frame.pixel(1, 1), Some([7, 7, 7]));
        assert_eq!(frame.pixel(2, 0), None);
    }

    #[test]
    fn view_exposes_metadata() {
        let frame = Frame::filled(64, 48, 9, [1, 2, 3]).unwrap();
        let view = frame.view();
        assert_eq!(view.width(), 64);
        assert_eq!(view.height(), 48);
        assert_eq!(view.index(), 9);
        assert_eq!(view.pixels().len(), 64 * 48 * 3);
    }

    #[test]
    fn sample_maps_any_output_size_onto_the_frame() {
        let mut frame = Frame::filled(4, 4, 1, [0, 0, 0]).unwrap();
        frame.fill_rect(2, 2, 4, 4, [200, 100, 50]);
        let view = frame.view();
        // Same size is an identity lookup.
        assert_eq!(view.sample(3, 3, 4, 4), [200, 100, 50]);
        assert_eq!(view.sample(0, 0, 4, 4), [0, 0, 0]);
        // Downscale to 2x2 and upscale to 8x8 stay in bounds.
        assert_eq!(view.sample(1, 1, 2, 2), [200, 100, 50]);
        assert_eq!(view.sample(7, 7, 8, 8), [200, 100, 50]);
        assert_eq!(view.sample(2, 2, 8, 8), [0, 0, 0]);
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut frame = Frame::filled(4, 4, 1, [0, 0, 0]).unwrap();
        frame.fill_rect(2, 2, 10, 10, [9, 9, 9]);
        assert_eq!(frame.pixel(3, 3), Some([9, 9, 9]));
        assert_eq!(frame.pixel(1, 1), Some([0, 0, 0]));
    }

    #[test]
    fn border_paints_edges_only() {
        let mut frame = Frame::filled(10, 10, 1, [0, 0, 0]).unwrap();
        frame.draw_border(2, [255, 0, 0]);
        assert_eq!(frame.pixel(0, 5), Some([255, 0, 0]));
        assert_eq!(frame.pixel(9, 9), Some([255, 0, 0]));
        assert_eq!(frame.pixel(5, 5), Some([0, 0, 0]));
    }
}
