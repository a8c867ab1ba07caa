// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GlyphscanError, Result};

/// Tunables for every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub deskew: DeskewConfig,
    pub rotation: RotationConfig,
    pub segmentation: SegmentationConfig,
    pub classifier: ClassifierConfig,
    /// Reference-set file. Relative paths resolve against the data directory.
    pub reference_store_path: PathBuf,
}

/// Hough-transform skew search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskewConfig {
    /// Angular resolution in degrees.
    pub angle_step_deg: f64,
    /// Half-width of the search window around 90 degrees.
    pub max_skew_deg: f64,
    /// Number of distance bins spanning +/- the image diagonal.
    pub distance_bins: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Rotations smaller than this (in degrees) are skipped.
    pub epsilon_deg: f64,
}

/// Projection-profile segmentation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// A row belongs to a text band when its foreground fraction of the image
    /// width exceeds this.
    pub row_threshold: f64,
    /// A column belongs to a glyph when its foreground fraction of the band
    /// height exceeds this.
    pub column_threshold: f64,
    /// Rows/columns added on each side of a band or glyph boundary.
    pub pixel_buffer: usize,
    /// Glyph-to-line height ratio below which a glyph may be punctuation.
    pub punctuation_ratio: f64,
    /// Gap, as a fraction of the running average glyph width, that opens a
    /// space.
    pub space_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Neighbours consulted per vote.
    pub k: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            deskew: DeskewConfig::default(),
            rotation: RotationConfig::default(),
            segmentation: SegmentationConfig::default(),
            classifier: ClassifierConfig::default(),
            reference_store_path: PathBuf::from("training_set.bin"),
        }
    }
}

impl Default for DeskewConfig {
    fn default() -> Self {
        Self {
            angle_step_deg: 0.5,
            max_skew_deg: 30.0,
            distance_bins: 2000,
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self { epsilon_deg: 0.1 }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            row_threshold: 0.0045,
            column_threshold: 0.0,
            pixel_buffer: 1,
            punctuation_ratio: 0.2,
            space_fraction: 0.6,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { k: 3 }
    }
}

impl DeskewConfig {
    /// Number of angle bins in the vote accumulator (window is inclusive).
    pub fn angle_bins(&self) -> usize {
        (2.0 * self.max_skew_deg / self.angle_step_deg) as usize + 1
    }
}

impl OcrConfig {
    /// Read a JSON config file. Missing keys take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load) but falls back to defaults on any failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let d = &self.deskew;
        if d.angle_step_deg.is_nan()
            || d.angle_step_deg <= 0.0
            || d.max_skew_deg.is_nan()
            || d.max_skew_deg < 0.0
        {
            return Err(GlyphscanError::Config(format!(
                "deskew window must be non-negative with a positive step (step {}, window {})",
                d.angle_step_deg, d.max_skew_deg
            )));
        }
        if d.distance_bins == 0 {
            return Err(GlyphscanError::Config(
                "deskew needs at least one distance bin".into(),
            ));
        }

        let s = &self.segmentation;
        for (name, value) in [
            ("row_threshold", s.row_threshold),
            ("column_threshold", s.column_threshold),
            ("punctuation_ratio", s.punctuation_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GlyphscanError::Config(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if s.space_fraction.is_nan() || s.space_fraction < 0.0 {
            return Err(GlyphscanError::Config(format!(
                "space_fraction must be non-negative, got {}",
                s.space_fraction
            )));
        }

        if self.classifier.k == 0 {
            return Err(GlyphscanError::Config("classifier k must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = OcrConfig::default();
        config.validate().expect("defaults must validate");
        assert_eq!(config.deskew.angle_bins(), 121);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: OcrConfig =
            serde_json::from_str(r#"{ "classifier": { "k": 5 } }"#).expect("parse");
        assert_eq!(config.classifier.k, 5);
        assert_eq!(config.segmentation, SegmentationConfig::default());
    }

    #[test]
    fn zero_k_is_rejected() {
        let mut config = OcrConfig::default();
        config.classifier.k = 0;
        assert!(matches!(config.validate(), Err(GlyphscanError::Config(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        let mut config = OcrConfig::default();
        config.segmentation.space_fraction = 0.75;
        config.save(&path).expect("save");

        let loaded = OcrConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = OcrConfig::load_or_default(dir.path().join("absent.json"));
        assert_eq!(config, OcrConfig::default());
    }
}
