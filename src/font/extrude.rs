//! Glyph solid builder: flat outline -> closed, centered, extruded mesh.
//!
//! Geometry:
//! - front cap at `z = +depth/2` (normal +Z), back cap at `z = -depth/2` (normal -Z)
//! - one quad per flattened contour segment for the side walls, with a flat normal
//! - no vertex is shared between faces meeting at an angle, so every edge stays sharp
//!   (no bevel, no smoothing)
//!
//! Side wall normals point out of the filled region. Contour orientation differs between
//! TrueType and CFF fonts, so the direction is decided by probing the non-zero winding number
//! just beside each segment instead of trusting the contour direction.

use std::sync::Arc;

use glam::Vec3;
use lyon::path::Path;

use crate::font::FontError;
use crate::font::outline::OutlineSource;
use crate::font::tessellate::{
    Contour, TessellateOptions, flatten_contours, tessellate_fill, winding_number,
};
use crate::scene::{Aabb3, Mesh3D};

/// Inputs fixed for every glyph of a run.
#[derive(Debug, Copy, Clone)]
pub struct ExtrudeOptions {
    /// Em size of the outline in world units.
    pub size: f32,
    /// Extrusion depth along Z.
    pub depth: f32,
    /// Curve flattening tolerance in world units.
    pub tolerance: f32,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            size: 200.0,
            depth: 50.0,
            tolerance: 0.5,
        }
    }
}

/// An extruded glyph, centered at the origin.
#[derive(Debug, Clone)]
pub struct GlyphSolid {
    pub character: char,
    pub depth: f32,
    pub mesh: Arc<Mesh3D>,
    pub bounds: Aabb3,
    /// Highest Y after centering.
    pub top_y: f32,
    /// Lowest Y after centering.
    pub bottom_y: f32,
}

impl GlyphSolid {
    #[inline]
    pub fn height(&self) -> f32 {
        self.top_y - self.bottom_y
    }
}

/// Build the solid for `ch` from `source`.
///
/// Fails with `GlyphNotRenderable` when the source has no outline for `ch` or the outline
/// encloses no area. Never returns an empty solid.
pub fn build_glyph_solid<S: OutlineSource + ?Sized>(
    source: &S,
    ch: char,
    opts: &ExtrudeOptions,
) -> Result<GlyphSolid, FontError> {
    let outline = source.outline_for(ch, opts.size)?;
    extrude_outline(ch, &outline, opts)
}

/// Extrude an already extracted outline.
pub fn extrude_outline(
    ch: char,
    outline: &Path,
    opts: &ExtrudeOptions,
) -> Result<GlyphSolid, FontError> {
    let tess = TessellateOptions {
        tolerance: opts.tolerance.max(1e-4),
        ..Default::default()
    };

    let cap = tessellate_fill(outline, tess).map_err(|reason| not_renderable(ch, &reason))?;
    let contours = flatten_contours(outline, tess.tolerance);
    if cap.triangle_count() == 0 || contours.is_empty() {
        return Err(FontError::GlyphNotRenderable { ch });
    }

    let half = opts.depth * 0.5;
    let mut mesh = Mesh3D::default();

    // Caps.
    for (z, normal) in [(half, Vec3::Z), (-half, Vec3::NEG_Z)] {
        let base = mesh.positions.len() as u32;
        for p in &cap.positions {
            mesh.positions.push([p[0], p[1], z]);
            mesh.normals.push(normal.to_array());
        }
        for tri in cap.indices.chunks_exact(3) {
            push_facing(&mut mesh, [base + tri[0], base + tri[1], base + tri[2]], normal);
        }
    }

    append_side_walls(&mut mesh, &contours, half, probe_step(opts));

    let bounds = mesh.bounds();
    if bounds.is_empty() {
        return Err(FontError::GlyphNotRenderable { ch });
    }
    mesh.translate(-bounds.center());
    let bounds = mesh.bounds();

    log::debug!(
        "extrude: {ch:?} -> {} triangles, {:.1} x {:.1} x {:.1}",
        mesh.triangle_count(),
        bounds.size().x,
        bounds.size().y,
        bounds.size().z
    );

    Ok(GlyphSolid {
        character: ch,
        depth: opts.depth,
        top_y: bounds.max.y,
        bottom_y: bounds.min.y,
        bounds,
        mesh: Arc::new(mesh),
    })
}

/// A tessellator failure means this glyph cannot be drawn; the detail only goes to the log.
fn not_renderable(ch: char, reason: &str) -> FontError {
    log::warn!("extrude: {ch:?} failed to tessellate: {reason}");
    FontError::GlyphNotRenderable { ch }
}

/// Distance used to probe the fill on either side of a wall segment.
fn probe_step(opts: &ExtrudeOptions) -> f32 {
    (opts.size * 1e-4).max(1e-4)
}

fn append_side_walls(mesh: &mut Mesh3D, contours: &[Contour], half: f32, probe: f32) {
    for contour in contours {
        for i in 0..contour.len() {
            let a = contour[i];
            let b = contour[(i + 1) % contour.len()];
            let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
            let len = (dx * dx + dy * dy).sqrt();
            if len <= f32::EPSILON {
                continue;
            }

            let mut n = [dy / len, -dx / len];
            let mid = [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5];
            let outside = [mid[0] + n[0] * probe, mid[1] + n[1] * probe];
            if winding_number(outside, contours) != 0 {
                n = [-n[0], -n[1]];
            }
            let normal = Vec3::new(n[0], n[1], 0.0);

            let base = mesh.positions.len() as u32;
            for p in [
                [a[0], a[1], half],
                [b[0], b[1], half],
                [b[0], b[1], -half],
                [a[0], a[1], -half],
            ] {
                mesh.positions.push(p);
                mesh.normals.push(normal.to_array());
            }
            push_facing(mesh, [base, base + 1, base + 2], normal);
            push_facing(mesh, [base, base + 2, base + 3], normal);
        }
    }
}

/// Push a triangle wound counter-clockwise when seen from the side `normal` points to.
fn push_facing(mesh: &mut Mesh3D, tri: [u32; 3], normal: Vec3) {
    let p = |i: u32| Vec3::from_array(mesh.positions[i as usize]);
    let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
    if face.dot(normal) >= 0.0 {
        mesh.indices.extend_from_slice(&tri);
    } else {
        mesh.indices.extend_from_slice(&[tri[0], tri[2], tri[1]]);
    }
}

#[cfg(test)]
mod tests {
    use lyon::path::Path;

    use super::*;
    use crate::font::tessellate::{frame_path, rect_path};

    struct Boxes;

    impl OutlineSource for Boxes {
        fn outline_for(&self, ch: char, size: f32) -> Result<Path, FontError> {
            match ch {
                'I' => Ok(rect_path(size * 0.2, size * 0.7)),
                'O' => Ok(frame_path(size * 0.6, size * 0.7, size * 0.1)),
                ' ' => Ok(Path::new()),
                _ => Err(FontError::GlyphNotRenderable { ch }),
            }
        }
    }

    fn opts() -> ExtrudeOptions {
        ExtrudeOptions {
            size: 100.0,
            depth: 20.0,
            tolerance: 0.1,
        }
    }

    #[test]
    fn solid_is_centered_on_all_axes() {
        let solid = build_glyph_solid(&Boxes, 'I', &opts()).unwrap();
        let c = solid.bounds.center();
        assert!(c.abs_diff_eq(Vec3::ZERO, 1e-4), "center {c:?}");
        assert!((solid.top_y - 35.0).abs() < 1e-4);
        assert!((solid.bottom_y + 35.0).abs() < 1e-4);
        assert!((solid.height() - 70.0).abs() < 1e-4);
        assert!((solid.bounds.size().z - 20.0).abs() < 1e-4);
    }

    #[test]
    fn box_glyph_has_caps_and_four_walls() {
        let solid = build_glyph_solid(&Boxes, 'I', &opts()).unwrap();
        // 2 triangles per cap, 2 per wall quad.
        assert_eq!(solid.mesh.triangle_count(), 2 * 2 + 4 * 2);
        assert_eq!(solid.mesh.positions.len(), solid.mesh.normals.len());
    }

    #[test]
    fn wall_normals_point_away_from_the_fill() {
        let solid = build_glyph_solid(&Boxes, 'O', &opts()).unwrap();
        let mesh = &solid.mesh;
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            if n[2] != 0.0 {
                continue;
            }
            let p = Vec3::from_array(*p);
            let n = Vec3::from_array(*n);
            // Outer walls sit at |x| = 30 or |y| = 35, inner walls at |x| = 20 or |y| = 25.
            let outer = (p.x.abs() - 30.0).abs() < 1e-3 && n.x.abs() > 0.5
                || (p.y.abs() - 35.0).abs() < 1e-3 && n.y.abs() > 0.5;
            let toward_center = n.dot(-p.truncate().extend(0.0)) > 0.0;
            assert_eq!(
                outer, !toward_center,
                "wall at {p:?} with normal {n:?} faces the wrong way"
            );
        }
    }

    #[test]
    fn triangles_face_along_their_normals() {
        let solid = build_glyph_solid(&Boxes, 'O', &opts()).unwrap();
        let m = &solid.mesh;
        for tri in m.indices.chunks_exact(3) {
            let p = |i: u32| Vec3::from_array(m.positions[i as usize]);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            let n = Vec3::from_array(m.normals[tri[0] as usize]);
            assert!(face.dot(n) > 0.0);
        }
    }

    #[test]
    fn edges_are_sharp() {
        // Every vertex belongs to exactly one face plane: no vertex is shared between a cap
        // and a wall.
        let solid = build_glyph_solid(&Boxes, 'I', &opts()).unwrap();
        let m = &solid.mesh;
        for tri in m.indices.chunks_exact(3) {
            let n0 = m.normals[tri[0] as usize];
            assert!(tri.iter().all(|&i| m.normals[i as usize] == n0));
        }
    }

    #[test]
    fn blank_outline_is_not_renderable() {
        let err = build_glyph_solid(&Boxes, ' ', &opts()).unwrap_err();
        assert!(matches!(err, FontError::GlyphNotRenderable { ch: ' ' }));
    }

    #[test]
    fn tessellator_failure_is_not_renderable() {
        let err = not_renderable('Q', "lyon tessellation failed: Internal");
        assert!(matches!(err, FontError::GlyphNotRenderable { ch: 'Q' }));
    }

    #[test]
    fn unknown_glyph_propagates_source_error() {
        let err = build_glyph_solid(&Boxes, '?', &opts()).unwrap_err();
        assert!(matches!(err, FontError::GlyphNotRenderable { ch: '?' }));
    }
}
