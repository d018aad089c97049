//! Bitmap comparison.

use std::fs;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::error::{Error, Result};

/// Scores the difference between two bitmaps.
pub trait ImageComparator {
    /// Compare `candidate` against `reference`, writing a heat map of the
    /// difference to `diff_output`. Returns a score in `0..=1`, where 0
    /// means identical.
    fn compare(&self, reference: &Path, candidate: &Path, diff_output: &Path) -> Result<f64>;
}

/// Mean absolute per-channel difference over RGB pixels.
#[derive(Debug, Clone)]
pub struct PixelComparator {
    amplification: u32,
}

impl PixelComparator {
    /// Create a comparator with the default heat-map gain of 8.
    pub fn new() -> Self {
        Self { amplification: 8 }
    }

    /// Set the heat-map gain.
    pub fn with_amplification(mut self, gain: u32) -> Self {
        self.amplification = gain.max(1);
        self
    }

    /// Score two in-memory images and build the heat map. `candidate` is
    /// resized to the reference dimensions when they differ.
    pub fn compare_images(&self, reference: &RgbImage, candidate: &RgbImage) -> Result<(f64, RgbImage)> {
        let (width, height) = reference.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Compare("reference image is empty".to_string()));
        }
        if candidate.width() == 0 || candidate.height() == 0 {
            return Err(Error::Compare("candidate image is empty".to_string()));
        }

        let resized;
        let candidate = if candidate.dimensions() != reference.dimensions() {
            log::debug!(
                "Resizing candidate {}x{} to {}x{}",
                candidate.width(),
                candidate.height(),
                width,
                height
            );
            resized = imageops::resize(candidate, width, height, FilterType::Triangle);
            &resized
        } else {
            candidate
        };

        let mut total: u64 = 0;
        let mut heat = RgbImage::new(width, height);
        for ((a, b), out) in reference
            .pixels()
            .zip(candidate.pixels())
            .zip(heat.pixels_mut())
        {
            let diff = [
                a[0].abs_diff(b[0]),
                a[1].abs_diff(b[1]),
                a[2].abs_diff(b[2]),
            ];
            total += diff.iter().map(|&d| d as u64).sum::<u64>();

            // ITU-R 601 luma of the difference, amplified
            let luma = (diff[0] as u32 * 299 + diff[1] as u32 * 587 + diff[2] as u32 * 114) / 1000;
            let level = (luma * self.amplification).min(255) as u8;
            *out = Rgb([level, level, level]);
        }

        let samples = width as u64 * height as u64 * 3;
        let score = total as f64 / (255.0 * samples as f64);
        Ok((score.clamp(0.0, 1.0), heat))
    }
}

impl Default for PixelComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageComparator for PixelComparator {
    fn compare(&self, reference: &Path, candidate: &Path, diff_output: &Path) -> Result<f64> {
        let reference = image::open(reference)?.to_rgb8();
        let candidate = image::open(candidate)?.to_rgb8();

        let (score, heat) = self.compare_images(&reference, &candidate)?;

        if let Some(parent) = diff_output.parent() {
            fs::create_dir_all(parent)?;
        }
        heat.save(diff_output)?;
        Ok(score)
    }
}
