//! Glyph cycle controller.
//!
//! Drives the display: which character is shown, when it is replaced, where the scan light
//! currently is, and how far away the camera sits.
//!
//! State machine:
//! - `Idle`: no solid yet (startup, or after the render target was lost).
//! - `Active`: one solid in the scene; replaced when its cycle elapses.
//!
//! Time is injected (`update(now, ..)` with `now` measured from any fixed origin), so the
//! controller is deterministic under test. Randomness (tint, orientation) comes from the
//! injected `rand::Rng`.
//!
//! Usage sketch:
//! ```ignore
//! let mut ctl = CycleController::new(config, source, StdRng::from_entropy())?;
//! // per frame:
//! let shading = ctl.update(clock.elapsed(), &mut scene, &mut camera)?;
//! renderer.draw(&gpu, &mut pass, &camera, &scene, &shading)?;
//! ```

use std::time::Duration;

use glam::{EulerRot, Mat4, Vec3};
use rand::Rng;

use crate::config::{ConfigError, ScanConfig};
use crate::font::extrude::{ExtrudeOptions, GlyphSolid, build_glyph_solid};
use crate::font::outline::OutlineSource;
use crate::render::util::lerp;
use crate::scene::{Camera3D, DrawItem3D, Rgb, Scene3D, SolidId};
use crate::shading::ShadingState;

/// Errors surfaced by the controller.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CycleError {
    /// Every character of the sequence failed to build.
    #[error("none of the {attempted} characters in the sequence produced a renderable glyph")]
    NoRenderableGlyph { attempted: usize },
}

/// The solid currently on display plus its per-lifetime random choices.
#[derive(Debug, Clone)]
pub struct ActiveGlyph {
    pub index: usize,
    pub solid: GlyphSolid,
    pub solid_id: SolidId,
    pub tint: Rgb,
    /// XYZ Euler angles in radians, fixed for the solid's lifetime.
    pub rotation: Vec3,
    pub activated_at: Duration,
}

#[derive(Debug, Clone, Default)]
pub enum CycleState {
    #[default]
    Idle,
    Active(Box<ActiveGlyph>),
}

/// Scan height for a solid spanning `[bottom_y, top_y]`.
///
/// Starts at `top_y + margin`, moves linearly down to `bottom_y - margin` over `sweep`,
/// then holds at exactly `bottom_y - margin`. A zero sweep is already complete.
pub fn scan_height(
    top_y: f32,
    bottom_y: f32,
    margin: f32,
    elapsed: Duration,
    sweep: Duration,
) -> f32 {
    let (start, end) = (top_y + margin, bottom_y - margin);
    if sweep.is_zero() || elapsed >= sweep {
        return end;
    }
    let progress = (elapsed.as_secs_f64() / sweep.as_secs_f64()).clamp(0.0, 1.0) as f32;
    lerp(start, end, progress).clamp(start.min(end), start.max(end))
}

/// Owns the active solid, the sequence position and the random source.
pub struct CycleController<S, R> {
    config: ScanConfig,
    extrude: ExtrudeOptions,
    source: S,
    rng: R,
    sequence_index: usize,
    state: CycleState,
}

impl<S: OutlineSource, R: Rng> CycleController<S, R> {
    /// Validate `config` and start in `Idle`.
    pub fn new(config: ScanConfig, source: S, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let extrude = ExtrudeOptions {
            size: config.glyph_size,
            depth: config.extrusion_depth,
            tolerance: config.tolerance,
        };
        Ok(Self {
            config,
            extrude,
            source,
            rng,
            sequence_index: 0,
            state: CycleState::Idle,
        })
    }

    #[inline]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> &CycleState {
        &self.state
    }

    #[inline]
    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    pub fn active(&self) -> Option<&ActiveGlyph> {
        match &self.state {
            CycleState::Active(active) => Some(&**active),
            CycleState::Idle => None,
        }
    }

    /// Apply the configured projection parameters to `camera`.
    pub fn configure_camera(&self, camera: &mut Camera3D) {
        camera.fov_y = self.config.fov_y_deg.to_radians();
        camera.z_near = self.config.z_near;
        camera.z_far = self.config.z_far;
    }

    /// Advance the state machine to `now` and return this frame's shading inputs.
    ///
    /// - `Idle`: activates index 0.
    /// - `Active`: replaces the solid once `now - activated_at >= cycle_duration`, before the
    ///   scan height is computed, so the boundary frame already shows the next character.
    ///
    /// Characters that fail to build are logged and skipped. If a whole pass over the
    /// sequence fails while a solid is active, that solid is kept for another cycle.
    pub fn update(
        &mut self,
        now: Duration,
        scene: &mut Scene3D,
        camera: &mut Camera3D,
    ) -> Result<ShadingState, CycleError> {
        let due = match &self.state {
            CycleState::Idle => Some(0),
            CycleState::Active(active) => {
                let elapsed = now.saturating_sub(active.activated_at);
                (elapsed >= self.config.cycle_duration)
                    .then(|| (self.sequence_index + 1) % self.config.characters.len())
            }
        };

        if let Some(next) = due
            && let Err(err) = self.activate(next, now, scene, camera)
        {
            match &mut self.state {
                CycleState::Idle => return Err(err),
                CycleState::Active(active) => {
                    log::error!("cycle: {err}; holding {:?}", active.solid.character);
                    active.activated_at = now;
                }
            }
        }

        let CycleState::Active(active) = &self.state else {
            return Err(CycleError::NoRenderableGlyph {
                attempted: self.config.characters.len(),
            });
        };

        let elapsed = now.saturating_sub(active.activated_at);
        let scan_y = scan_height(
            active.solid.top_y,
            active.solid.bottom_y,
            self.config.margin,
            elapsed,
            self.config.sweep_duration,
        );

        Ok(ShadingState {
            tint: active.tint,
            scan_y,
            solid_height: active.solid.height(),
            band_width: self.config.band_width,
            rim_strength: self.config.rim_strength,
        })
    }

    /// Drop the active solid and return to `Idle` (next update restarts at index 0).
    pub fn reset(&mut self, scene: &mut Scene3D) {
        if let CycleState::Active(active) = std::mem::take(&mut self.state) {
            scene.remove(active.solid_id);
            log::info!("cycle: reset (dropped {:?})", active.solid.character);
        }
        self.sequence_index = 0;
    }

    /// Build the first renderable character starting at `first`, then swap it in.
    fn activate(
        &mut self,
        first: usize,
        now: Duration,
        scene: &mut Scene3D,
        camera: &mut Camera3D,
    ) -> Result<(), CycleError> {
        let n = self.config.characters.len();
        for attempt in 0..n {
            let index = (first + attempt) % n;
            let ch = self.config.characters[index];
            match build_glyph_solid(&self.source, ch, &self.extrude) {
                Ok(solid) => {
                    self.install(index, solid, now, scene, camera);
                    return Ok(());
                }
                Err(err) => log::warn!("cycle: skipping {ch:?} (index {index}): {err}"),
            }
        }
        Err(CycleError::NoRenderableGlyph { attempted: n })
    }

    fn install(
        &mut self,
        index: usize,
        solid: GlyphSolid,
        now: Duration,
        scene: &mut Scene3D,
        camera: &mut Camera3D,
    ) {
        // Release the previous solid before the new one enters the draw list.
        if let CycleState::Active(prev) = &self.state {
            scene.remove(prev.solid_id);
        }

        let tint = self.config.palette[self.rng.gen_range(0..self.config.palette.len())];
        let range = self.config.rotation_range_deg.to_radians();
        let rotation = Vec3::new(
            self.rng.gen_range(-range..=range),
            self.rng.gen_range(-range..=range),
            self.rng.gen_range(-range..=range),
        );

        let solid_id = scene.add(DrawItem3D {
            mesh: solid.mesh.clone(),
            world_from_local: Mat4::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z),
        });

        self.configure_camera(camera);
        let distance =
            camera.frame_solid_height(solid.height(), self.config.fill_fraction, solid.depth);

        log::info!(
            "cycle: showing {:?} (index {index}), height {:.1}, camera at {distance:.1}",
            solid.character,
            solid.height()
        );
        log::debug!("cycle: tint {tint:?}, rotation {rotation:?}");

        self.sequence_index = index;
        self.state = CycleState::Active(Box::new(ActiveGlyph {
            index,
            solid,
            solid_id,
            tint,
            rotation,
            activated_at: now,
        }));
    }
}

#[cfg(test)]
mod tests {
    use lyon::path::Path;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::font::FontError;
    use crate::font::tessellate::rect_path;

    /// Every glyph is a `size` wide, `size` tall box, except the ones listed as blank.
    struct Boxes {
        blank: Vec<char>,
    }

    impl OutlineSource for Boxes {
        fn outline_for(&self, ch: char, size: f32) -> Result<Path, FontError> {
            if self.blank.contains(&ch) {
                return Err(FontError::GlyphNotRenderable { ch });
            }
            Ok(rect_path(size * 0.5, size))
        }
    }

    fn config(chars: &str) -> ScanConfig {
        ScanConfig {
            characters: chars.chars().collect(),
            cycle_duration: Duration::from_secs(1),
            sweep_duration: Duration::from_secs(1),
            margin: 60.0,
            glyph_size: 100.0,
            extrusion_depth: 10.0,
            ..Default::default()
        }
    }

    fn controller(chars: &str, blank: &[char]) -> CycleController<Boxes, StdRng> {
        CycleController::new(
            config(chars),
            Boxes {
                blank: blank.to_vec(),
            },
            StdRng::seed_from_u64(7),
        )
        .unwrap()
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn scan_height_follows_the_reference_scenario() {
        let sweep = secs(1.0);
        assert_eq!(scan_height(50.0, -50.0, 60.0, secs(0.0), sweep), 110.0);
        assert_eq!(scan_height(50.0, -50.0, 60.0, secs(0.5), sweep), 0.0);
        assert_eq!(scan_height(50.0, -50.0, 60.0, secs(1.0), sweep), -110.0);
        assert_eq!(scan_height(50.0, -50.0, 60.0, secs(1.2), sweep), -110.0);
    }

    #[test]
    fn scan_height_never_rises() {
        let sweep = secs(2.0);
        let mut prev = f32::INFINITY;
        for i in 0..=300 {
            let y = scan_height(80.0, -80.0, 60.0, secs(i as f64 * 0.01), sweep);
            assert!(y <= prev, "scan rose at step {i}: {y} > {prev}");
            prev = y;
        }
    }

    #[test]
    fn completed_sweep_lands_exactly_below_the_solid() {
        let sweep = secs(1.0);
        for i in 0..500 {
            let top = 3.0 + i as f32 * 0.731_9;
            let bottom = -1.0 - i as f32 * 0.412_7;
            let end = bottom - 60.0;
            assert_eq!(scan_height(top, bottom, 60.0, sweep, sweep), end, "top {top}");
            assert_eq!(scan_height(top, bottom, 60.0, secs(1.7), sweep), end, "top {top}");
            assert_eq!(scan_height(top, bottom, 60.0, secs(0.0), sweep), top + 60.0);
        }
        assert_eq!(
            scan_height(10.0742, -7.3346, 60.0, sweep, sweep),
            -7.3346f32 - 60.0
        );
    }

    #[test]
    fn zero_sweep_is_already_complete() {
        assert_eq!(scan_height(10.0, -10.0, 5.0, secs(0.0), Duration::ZERO), -15.0);
    }

    #[test]
    fn first_update_activates_index_zero() {
        let mut ctl = controller("AB", &[]);
        let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
        assert!(matches!(ctl.state(), CycleState::Idle));

        let shading = ctl.update(secs(3.0), &mut scene, &mut cam).unwrap();
        let active = ctl.active().unwrap();
        assert_eq!(active.index, 0);
        assert_eq!(active.solid.character, 'A');
        assert_eq!(active.activated_at, secs(3.0));
        assert_eq!(scene.len(), 1);
        assert_eq!(shading.scan_y, active.solid.top_y + 60.0);
        assert!(ctl.config().palette.contains(&shading.tint));
    }

    #[test]
    fn boundary_frame_advances_before_scanning() {
        let mut ctl = controller("AB", &[]);
        let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
        ctl.update(secs(0.0), &mut scene, &mut cam).unwrap();

        let shading = ctl.update(secs(1.0), &mut scene, &mut cam).unwrap();
        let active = ctl.active().unwrap();
        assert_eq!(active.solid.character, 'B');
        assert_eq!(shading.scan_y, active.solid.top_y + 60.0);
        assert_eq!(scene.len(), 1, "previous solid must leave the scene");
    }

    #[test]
    fn sequence_has_period_n() {
        let mut ctl = controller("ABCD", &[]);
        let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
        ctl.update(secs(0.0), &mut scene, &mut cam).unwrap();

        let mut seen = vec![ctl.sequence_index()];
        for k in 1..=4 {
            ctl.update(secs(k as f64), &mut scene, &mut cam).unwrap();
            seen.push(ctl.sequence_index());
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn unrenderable_characters_are_skipped() {
        let mut ctl = controller("A B", &[' ']);
        let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
        ctl.update(secs(0.0), &mut scene, &mut cam).unwrap();
        ctl.update(secs(1.0), &mut scene, &mut cam).unwrap();
        assert_eq!(ctl.active().unwrap().solid.character, 'B');
        assert_eq!(ctl.sequence_index(), 2);
    }

    #[test]
    fn idle_with_nothing_renderable_is_an_error() {
        let mut ctl = controller("xy", &['x', 'y']);
        let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
        let err = ctl.update(secs(0.0), &mut scene, &mut cam).unwrap_err();
        assert_eq!(err, CycleError::NoRenderableGlyph { attempted: 2 });
        assert!(scene.is_empty());
        assert!(matches!(ctl.state(), CycleState::Idle));
    }

    #[test]
    fn rotation_stays_within_range_and_fixed_for_lifetime() {
        let mut ctl = controller("AB", &[]);
        let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
        let limit = 45f32.to_radians() + 1e-6;
        for k in 0..20 {
            ctl.update(secs(k as f64), &mut scene, &mut cam).unwrap();
            let r = ctl.active().unwrap().rotation;
            assert!(r.abs().max_element() <= limit, "rotation {r:?} out of range");

            ctl.update(secs(k as f64 + 0.5), &mut scene, &mut cam).unwrap();
            assert_eq!(ctl.active().unwrap().rotation, r);
        }
    }

    #[test]
    fn same_seed_gives_same_choices() {
        let run = || {
            let mut ctl = controller("ABC", &[]);
            let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
            (0..6)
                .map(|k| {
                    ctl.update(secs(k as f64), &mut scene, &mut cam).unwrap();
                    let a = ctl.active().unwrap();
                    (a.tint, a.rotation)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn camera_is_framed_on_activation() {
        let mut ctl = controller("A", &[]);
        let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
        ctl.update(secs(0.0), &mut scene, &mut cam).unwrap();

        let h = ctl.active().unwrap().solid.height();
        let expected = crate::scene::framing_distance(h, 0.77, 45f32.to_radians(), 10.0);
        assert!((cam.distance - expected).abs() < 1e-3);
    }

    /// Boxes that can be switched to fail every build.
    struct Flaky {
        failing: std::cell::Cell<bool>,
    }

    impl OutlineSource for Flaky {
        fn outline_for(&self, ch: char, size: f32) -> Result<Path, FontError> {
            if self.failing.get() {
                return Err(FontError::GlyphNotRenderable { ch });
            }
            Ok(rect_path(size * 0.5, size))
        }
    }

    #[test]
    fn failed_rebuild_holds_the_active_solid() {
        let source = Flaky {
            failing: std::cell::Cell::new(false),
        };
        let mut ctl =
            CycleController::new(config("AB"), &source, StdRng::seed_from_u64(7)).unwrap();
        let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
        ctl.update(secs(0.0), &mut scene, &mut cam).unwrap();
        let held_id = ctl.active().unwrap().solid_id;

        source.failing.set(true);
        let shading = ctl.update(secs(1.0), &mut scene, &mut cam).unwrap();

        let active = ctl.active().unwrap();
        assert_eq!(active.solid.character, 'A');
        assert_eq!(active.index, 0);
        assert_eq!(active.solid_id, held_id);
        assert_eq!(active.activated_at, secs(1.0), "hold restarts the cycle timer");
        assert_eq!(scene.len(), 1);
        assert!(scene.get(held_id).is_some());
        assert_eq!(shading.scan_y, active.solid.top_y + 60.0);

        // Once building works again the sequence continues from the held character.
        source.failing.set(false);
        ctl.update(secs(2.0), &mut scene, &mut cam).unwrap();
        assert_eq!(ctl.active().unwrap().solid.character, 'B');
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn reset_returns_to_idle_and_clears_scene() {
        let mut ctl = controller("AB", &[]);
        let (mut scene, mut cam) = (Scene3D::new(), Camera3D::default());
        ctl.update(secs(0.0), &mut scene, &mut cam).unwrap();
        ctl.update(secs(1.0), &mut scene, &mut cam).unwrap();
        assert_eq!(ctl.sequence_index(), 1);

        ctl.reset(&mut scene);
        assert!(matches!(ctl.state(), CycleState::Idle));
        assert!(scene.is_empty());

        ctl.update(secs(5.0), &mut scene, &mut cam).unwrap();
        assert_eq!(ctl.active().unwrap().index, 0);
    }
}
