//! Startup configuration for the glyph scan display.
//!
//! Everything here is fixed once the cycle controller is constructed; there is no live
//! reconfiguration. `ScanConfig::default()` carries the production constants.

use std::{path::PathBuf, time::Duration};

use crate::font::FontQuery;
use crate::scene::Rgb;

/// Where glyph outlines come from.
#[derive(Debug, Clone)]
pub enum OutlineSourceSpec {
    /// Resolve a face from the system font database.
    System(FontQuery),
    /// Load a TTF/OTF file from disk.
    File(PathBuf),
}

impl Default for OutlineSourceSpec {
    fn default() -> Self {
        Self::System(FontQuery {
            families: vec![
                "Helvetica".to_string(),
                "Arial".to_string(),
                "DejaVu Sans".to_string(),
                "sans-serif".to_string(),
            ],
            weight: 700,
            italic: false,
        })
    }
}

/// Rejected configuration values.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("character sequence is empty")]
    EmptySequence,

    #[error("color palette is empty")]
    EmptyPalette,

    #[error("{name} must be > 0 (got {value})")]
    NotPositive { name: &'static str, value: f32 },

    #[error("fill fraction must be in (0, 1] (got {0})")]
    FillFraction(f32),

    #[error("vertical fov must be in (0, 180) degrees (got {0})")]
    FieldOfView(f32),

    #[error("rotation range must be >= 0 degrees (got {0})")]
    RotationRange(f32),

    #[error("near plane ({near}) must be closer than far plane ({far})")]
    ClipPlanes { near: f32, far: f32 },
}

/// All tunables of the display.
///
/// World units are arbitrary but consistent: `glyph_size` is the nominal em size of a glyph
/// and every other length (depth, margin, band width) is in the same units.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Ordered character sequence; wraps after the last entry.
    pub characters: Vec<char>,
    /// Tints; one is picked uniformly at random for each new glyph.
    pub palette: Vec<Rgb>,

    /// How long one character stays active.
    pub cycle_duration: Duration,
    /// How long the scan light takes to travel from top to bottom.
    pub sweep_duration: Duration,

    /// Distance from the scan height at which illumination reaches zero.
    pub band_width: f32,
    /// Extra travel above the top and below the bottom of the glyph.
    pub margin: f32,
    /// Rim contribution factor (gated by scan intensity).
    pub rim_strength: f32,

    /// Nominal glyph em size.
    pub glyph_size: f32,
    /// Extrusion depth along Z.
    pub extrusion_depth: f32,
    /// Outline flattening / tessellation tolerance.
    pub tolerance: f32,

    /// Fraction of the viewport height the glyph height is framed to.
    ///
    /// Values below 1 make the glyph overflow the frame.
    pub fill_fraction: f32,
    /// Per-axis random rotation range in degrees (`[-range, +range]`).
    pub rotation_range_deg: f32,

    pub fov_y_deg: f32,
    pub z_near: f32,
    pub z_far: f32,

    pub outline_source: OutlineSourceSpec,

    pub title: String,
    pub clear_color: Rgb,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            characters: "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".chars().collect(),
            palette: vec![
                Rgb::from_hex(0x00ffcc),
                Rgb::from_hex(0xff3366),
                Rgb::from_hex(0x3399ff),
                Rgb::from_hex(0xffcc00),
                Rgb::from_hex(0xcc66ff),
                Rgb::from_hex(0xffffff),
            ],
            cycle_duration: Duration::from_secs(4),
            sweep_duration: Duration::from_secs(3),
            band_width: 40.0,
            margin: 60.0,
            rim_strength: 0.3,
            glyph_size: 200.0,
            extrusion_depth: 50.0,
            tolerance: 0.5,
            fill_fraction: 0.77,
            rotation_range_deg: 45.0,
            fov_y_deg: 45.0,
            z_near: 1.0,
            z_far: 10_000.0,
            outline_source: OutlineSourceSpec::default(),
            title: "glyphscan".to_string(),
            clear_color: Rgb::BLACK,
        }
    }
}

impl ScanConfig {
    /// Check invariants the controller and camera rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.characters.is_empty() {
            return Err(ConfigError::EmptySequence);
        }
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }

        let positive = [
            ("cycle_duration", self.cycle_duration.as_secs_f32()),
            ("band_width", self.band_width),
            ("glyph_size", self.glyph_size),
            ("extrusion_depth", self.extrusion_depth),
            ("tolerance", self.tolerance),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }

        if !(self.fill_fraction > 0.0 && self.fill_fraction <= 1.0) {
            return Err(ConfigError::FillFraction(self.fill_fraction));
        }
        if !(self.fov_y_deg > 0.0 && self.fov_y_deg < 180.0) {
            return Err(ConfigError::FieldOfView(self.fov_y_deg));
        }
        if !(self.rotation_range_deg >= 0.0) {
            return Err(ConfigError::RotationRange(self.rotation_range_deg));
        }
        if !(self.z_near > 0.0 && self.z_near < self.z_far) {
            return Err(ConfigError::ClipPlanes {
                near: self.z_near,
                far: self.z_far,
            });
        }
        Ok(())
    }

    /// Builder-style override for the outline source.
    pub fn with_outline_source(mut self, source: OutlineSourceSpec) -> Self {
        self.outline_source = source;
        self
    }
}
