//! Scene abstractions for the single-solid display.
//!
//! - A draw list (`Scene3D`) of solids, each with a mesh and a `world_from_local` transform.
//! - A perspective camera (`Camera3D`) that sits on +Z and looks at the origin.
//!
//! Notes:
//! - World units match the glyph builder's units (one em = `glyph_size`).
//! - This module does not depend on wgpu; it is renderer-agnostic.

use std::sync::Arc;

use glam::{Mat4, Vec3};

/// Linear RGB tint.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB` to normalized components.
    #[inline]
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb3 {
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    #[inline]
    pub fn include_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// CPU triangle mesh with per-vertex normals.
///
/// Vertices are not shared across faces that meet at an angle, so flat normals stay flat.
#[derive(Debug, Clone, Default)]
pub struct Mesh3D {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Mesh3D {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Aabb3 {
        let mut b = Aabb3::empty();
        for &p in &self.positions {
            b.include_point(Vec3::from_array(p));
        }
        b
    }

    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p = (Vec3::from_array(*p) + offset).to_array();
        }
    }
}

/// Draw-list handle for a solid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolidId(pub u64);

/// One entry of the draw list.
#[derive(Debug, Clone)]
pub struct DrawItem3D {
    pub mesh: Arc<Mesh3D>,
    pub world_from_local: Mat4,
}

/// Draw list: the solids the renderer should draw this frame.
#[derive(Debug, Default)]
pub struct Scene3D {
    items: Vec<(SolidId, DrawItem3D)>,
    next_id: u64,
}

impl Scene3D {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: DrawItem3D) -> SolidId {
        let id = SolidId(self.next_id);
        self.next_id += 1;
        self.items.push((id, item));
        id
    }

    /// Remove a solid; returns it if it was present.
    pub fn remove(&mut self, id: SolidId) -> Option<DrawItem3D> {
        let pos = self.items.iter().position(|(i, _)| *i == id)?;
        Some(self.items.remove(pos).1)
    }

    pub fn get(&self, id: SolidId) -> Option<&DrawItem3D> {
        self.items.iter().find(|(i, _)| *i == id).map(|(_, it)| it)
    }

    pub fn items(&self) -> impl Iterator<Item = (SolidId, &DrawItem3D)> {
        self.items.iter().map(|(id, it)| (*id, it))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Perspective camera on the +Z axis looking at the origin.
#[derive(Debug, Copy, Clone)]
pub struct Camera3D {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub distance: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self {
            fov_y: 45f32.to_radians(),
            aspect: 1.0,
            distance: 500.0,
            z_near: 1.0,
            z_far: 10_000.0,
        }
    }
}

impl Camera3D {
    /// Update aspect ratio from the viewport size in pixels.
    #[inline]
    pub fn set_viewport_px(&mut self, width: u32, height: u32) {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        self.aspect = w / h;
    }

    #[inline]
    pub fn eye(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    /// World -> clip (wgpu depth range 0..1).
    pub fn clip_from_world(&self) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        let view = Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y);
        proj * view
    }

    /// Move the camera so a solid of height `height` occupies `height * fill` of the
    /// visible height at the solid's center plane.
    ///
    /// `depth` is the solid's extrusion depth; half of it is added so the near face does not
    /// sit on the framing plane. Returns the new distance.
    pub fn frame_solid_height(&mut self, height: f32, fill: f32, depth: f32) -> f32 {
        self.distance = framing_distance(height, fill, self.fov_y, depth);
        self.distance
    }
}

/// `distance = (H * f) / (2 * tan(fov / 2)) + depth / 2`.
#[inline]
pub fn framing_distance(height: f32, fill: f32, fov_y: f32, depth: f32) -> f32 {
    let target_visible_height = height * fill;
    target_visible_height / (2.0 * (fov_y * 0.5).tan()) + depth * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_are_normalized() {
        let c = Rgb::from_hex(0xff8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn scene_add_remove_keeps_ids_unique() {
        let mut scene = Scene3D::new();
        let item = DrawItem3D {
            mesh: Arc::new(Mesh3D::default()),
            world_from_local: Mat4::IDENTITY,
        };
        let a = scene.add(item.clone());
        let b = scene.add(item);
        assert_ne!(a, b);
        assert_eq!(scene.len(), 2);

        assert!(scene.remove(a).is_some());
        assert!(scene.remove(a).is_none());
        assert!(scene.get(b).is_some());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn framing_distance_grows_with_height() {
        let fov = 45f32.to_radians();
        let mut prev = framing_distance(1.0, 0.77, fov, 10.0);
        for h in [10.0, 50.0, 100.0, 400.0, 1000.0] {
            let d = framing_distance(h, 0.77, fov, 10.0);
            assert!(d > prev, "distance must increase with height: {d} <= {prev}");
            prev = d;
        }
    }

    #[test]
    fn framed_solid_spans_expected_fraction_of_view() {
        let mut cam = Camera3D::default();
        let h = 200.0;
        let d = cam.frame_solid_height(h, 0.77, 0.0);
        let visible = 2.0 * d * (cam.fov_y * 0.5).tan();
        assert!((h * 0.77 - visible).abs() < 1e-3);
    }

    #[test]
    fn camera_projects_origin_to_screen_center() {
        let cam = Camera3D::default();
        let p = cam.clip_from_world() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((p.x / p.w).abs() < 1e-6);
        assert!((p.y / p.w).abs() < 1e-6);
        let z = p.z / p.w;
        assert!((0.0..=1.0).contains(&z), "depth {z} out of range");
    }

    #[test]
    fn mesh_bounds_and_translate() {
        let mut m = Mesh3D {
            positions: vec![[0.0, 0.0, 0.0], [2.0, 4.0, 6.0]],
            normals: vec![[0.0, 0.0, 1.0]; 2],
            indices: vec![],
        };
        let b = m.bounds();
        m.translate(-b.center());
        let b = m.bounds();
        assert_eq!(b.center(), Vec3::ZERO);
        assert_eq!(b.size(), Vec3::new(2.0, 4.0, 6.0));
    }
}
