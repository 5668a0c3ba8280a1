//! Glyph/path tessellation helpers.
//!
//! Two views of the same outline are needed to extrude it:
//! - filled triangles for the flat front/back caps (`lyon::tessellation::FillTessellator`)
//! - flattened closed polylines for the side walls (`PathIterator::flattened`)
//!
//! Notes:
//! - Fonts are authored for non-zero winding; that is the default fill rule here.
//! - Indices are `u32`: side walls on curvy glyphs at fine tolerance can exceed `u16`.

use lyon::math::point;
use lyon::path::iterator::PathIterator;
use lyon::path::{Path, PathEvent};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, FillVertexConstructor,
    VertexBuffers,
};

/// Tessellation options tailored for glyph outlines.
///
/// - `tolerance`: smaller => more triangles (smoother curves), larger => fewer triangles.
/// - `fill_rule`: NonZero is the usual font default.
#[derive(Debug, Copy, Clone)]
pub struct TessellateOptions {
    pub tolerance: f32,
    pub fill_rule: FillRule,
}

impl Default for TessellateOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            fill_rule: FillRule::NonZero,
        }
    }
}

/// A filled 2D triangulation of an outline.
#[derive(Debug, Clone, Default)]
pub struct CapMesh {
    pub positions: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl CapMesh {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A closed polyline (last point connects back to the first).
pub type Contour = Vec<[f32; 2]>;

struct CapVertexCtor;

impl FillVertexConstructor<[f32; 2]> for CapVertexCtor {
    fn new_vertex(&mut self, v: FillVertex) -> [f32; 2] {
        let p = v.position();
        [p.x, p.y]
    }
}

/// Fill-tessellate an outline into cap triangles.
pub fn tessellate_fill(path: &Path, opts: TessellateOptions) -> Result<CapMesh, String> {
    let mut tess = FillTessellator::new();
    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();

    let fill = FillOptions::tolerance(opts.tolerance).with_fill_rule(opts.fill_rule);

    // Fonts can have self-intersections; keep the tessellator's intersection handling on.
    tess.tessellate_path(
        path,
        &fill,
        &mut BuffersBuilder::new(&mut buffers, CapVertexCtor),
    )
    .map_err(|e| format!("lyon tessellation failed: {e:?}"))?;

    Ok(CapMesh {
        positions: buffers.vertices,
        indices: buffers.indices,
    })
}

/// Flatten every contour of `path` into a closed polyline.
///
/// Curves are approximated within `tolerance`. Repeated points and the duplicated closing
/// point are dropped; contours with fewer than 3 distinct points are discarded.
pub fn flatten_contours(path: &Path, tolerance: f32) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mut current: Contour = Vec::new();

    for event in path.iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => {
                current.clear();
                push(&mut current, [at.x, at.y]);
            }
            PathEvent::Line { to, .. } => push(&mut current, [to.x, to.y]),
            PathEvent::End { .. } => {
                if current.len() > 1 && same_point(current[0], current[current.len() - 1]) {
                    current.pop();
                }
                if current.len() >= 3 {
                    contours.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            // `flattened` only yields lines.
            PathEvent::Quadratic { .. } | PathEvent::Cubic { .. } => {}
        }
    }

    contours
}

fn push(c: &mut Contour, p: [f32; 2]) {
    if c.last().is_none_or(|last| !same_point(*last, p)) {
        c.push(p);
    }
}

#[inline]
fn same_point(a: [f32; 2], b: [f32; 2]) -> bool {
    (a[0] - b[0]).abs() <= f32::EPSILON && (a[1] - b[1]).abs() <= f32::EPSILON
}

/// Non-zero winding number of `p` with respect to a set of closed contours.
///
/// Non-zero means "inside the glyph" under the non-zero fill rule.
pub fn winding_number(p: [f32; 2], contours: &[Contour]) -> i32 {
    let mut wn = 0;
    for c in contours {
        for i in 0..c.len() {
            let a = c[i];
            let b = c[(i + 1) % c.len()];
            let cross = (b[0] - a[0]) * (p[1] - a[1]) - (p[0] - a[0]) * (b[1] - a[1]);
            if a[1] <= p[1] {
                if b[1] > p[1] && cross > 0.0 {
                    wn += 1;
                }
            } else if b[1] <= p[1] && cross < 0.0 {
                wn -= 1;
            }
        }
    }
    wn
}

/// Axis-aligned rectangle path centered at the origin.
pub fn rect_path(w: f32, h: f32) -> Path {
    let hw = w * 0.5;
    let hh = h * 0.5;

    let mut b = Path::builder();
    b.begin(point(-hw, -hh));
    b.line_to(point(hw, -hh));
    b.line_to(point(hw, hh));
    b.line_to(point(-hw, hh));
    b.close();
    b.build()
}

/// Rectangle with a rectangular hole (outer CCW, inner CW), like an "O" made of boxes.
pub fn frame_path(w: f32, h: f32, wall: f32) -> Path {
    let (hw, hh) = (w * 0.5, h * 0.5);
    let (iw, ih) = (hw - wall, hh - wall);

    let mut b = Path::builder();
    b.begin(point(-hw, -hh));
    b.line_to(point(hw, -hh));
    b.line_to(point(hw, hh));
    b.line_to(point(-hw, hh));
    b.close();

    b.begin(point(-iw, -ih));
    b.line_to(point(-iw, ih));
    b.line_to(point(iw, ih));
    b.line_to(point(iw, -ih));
    b.close();
    b.build()
}
