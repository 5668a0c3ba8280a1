//! Scan-light shading model.
//!
//! The GPU evaluates this per fragment (`render/shaders/scan_solid.wgsl`); the functions here
//! are the CPU reference of the same formula and are what the tests pin down:
//!
//! ```text
//! distance  = position.y - scan_y
//! intensity = 1 - smoothstep(0, band_width, |distance|)
//! rim       = (1 - max(0, dot(N, V)))^3
//! rgb       = tint * intensity + tint * rim * rim_strength * intensity
//! alpha     = 1
//! ```

use glam::Vec3;

use crate::scene::Rgb;

/// Per-frame shading inputs, rebuilt by the cycle controller and handed to the draw call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadingState {
    pub tint: Rgb,
    /// World-space Y of the center of the light band.
    pub scan_y: f32,
    /// Height of the active solid (informational).
    pub solid_height: f32,
    pub band_width: f32,
    pub rim_strength: f32,
}

impl Default for ShadingState {
    fn default() -> Self {
        Self {
            tint: Rgb::WHITE,
            scan_y: 0.0,
            solid_height: 0.0,
            band_width: 40.0,
            rim_strength: 0.3,
        }
    }
}

/// Shaded color of one surface point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Shade {
    pub rgb: Vec3,
    /// Always 1: the glow is carried by color attenuation, not transparency.
    pub alpha: f32,
}

/// Cubic Hermite step: 0 below `edge0`, 1 above `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Light band falloff: 1 at the scan height, 0 at `band_width` or farther.
///
/// A non-positive band width degenerates to a hard step.
#[inline]
pub fn scan_intensity(distance: f32, band_width: f32) -> f32 {
    let d = distance.abs();
    if band_width <= 0.0 {
        return if d == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - smoothstep(0.0, band_width, d)
}

/// Silhouette term, largest where the surface is seen edge-on.
#[inline]
pub fn rim_term(normal: Vec3, view_dir: Vec3) -> f32 {
    let n_dot_v = normal.normalize_or_zero().dot(view_dir.normalize_or_zero());
    (1.0 - n_dot_v.max(0.0)).powi(3)
}

/// Shade one surface point.
///
/// `view_dir` points from the surface toward the eye.
pub fn shade(position: Vec3, normal: Vec3, view_dir: Vec3, state: &ShadingState) -> Shade {
    let tint = state.tint.to_vec3();
    let intensity = scan_intensity(position.y - state.scan_y, state.band_width);
    let rim = rim_term(normal, view_dir);

    Shade {
        rgb: tint * intensity + tint * rim * state.rim_strength * intensity,
        alpha: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(scan_y: f32) -> ShadingState {
        ShadingState {
            tint: Rgb::new(0.2, 0.6, 1.0),
            scan_y,
            solid_height: 100.0,
            band_width: 40.0,
            rim_strength: 0.3,
        }
    }

    #[test]
    fn smoothstep_hits_edges_and_midpoint() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(0.0, 1.0, 1.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
    }

    #[test]
    fn intensity_is_one_at_scan_height_and_zero_beyond_band() {
        assert_eq!(scan_intensity(0.0, 40.0), 1.0);
        assert_eq!(scan_intensity(40.0, 40.0), 0.0);
        assert_eq!(scan_intensity(-40.0, 40.0), 0.0);
        assert_eq!(scan_intensity(1000.0, 40.0), 0.0);
    }

    #[test]
    fn intensity_is_symmetric_and_decreasing() {
        let mut prev = 1.0;
        for i in 1..=40 {
            let d = i as f32;
            let up = scan_intensity(d, 40.0);
            assert_eq!(up, scan_intensity(-d, 40.0));
            assert!(up <= prev);
            prev = up;
        }
    }

    #[test]
    fn zero_band_width_is_a_hard_step() {
        assert_eq!(scan_intensity(0.0, 0.0), 1.0);
        assert_eq!(scan_intensity(0.01, 0.0), 0.0);
    }

    #[test]
    fn rim_is_zero_facing_and_one_edge_on() {
        assert_eq!(rim_term(Vec3::Z, Vec3::Z), 0.0);
        assert_eq!(rim_term(Vec3::X, Vec3::Z), 1.0);
        // Back-facing clamps to the edge-on value.
        assert_eq!(rim_term(Vec3::NEG_Z, Vec3::Z), 1.0);
        // Unnormalized inputs are normalized.
        assert_eq!(rim_term(Vec3::Z * 5.0, Vec3::Z * 0.1), 0.0);
    }

    #[test]
    fn facing_point_on_scan_line_gets_plain_tint() {
        let s = state(10.0);
        let out = shade(Vec3::new(3.0, 10.0, 0.0), Vec3::Z, Vec3::Z, &s);
        assert!(out.rgb.abs_diff_eq(s.tint.to_vec3(), 1e-6));
        assert_eq!(out.alpha, 1.0);
    }

    #[test]
    fn rim_is_gated_by_scan_intensity() {
        let s = state(0.0);
        // Edge-on but far from the band: black.
        let far = shade(Vec3::new(0.0, 100.0, 0.0), Vec3::X, Vec3::Z, &s);
        assert_eq!(far.rgb, Vec3::ZERO);
        assert_eq!(far.alpha, 1.0);

        // Edge-on on the band: tint * (1 + 0.3).
        let near = shade(Vec3::ZERO, Vec3::X, Vec3::Z, &s);
        assert!(near.rgb.abs_diff_eq(s.tint.to_vec3() * 1.3, 1e-6));
    }
}
