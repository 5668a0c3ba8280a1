//! Font module root.
//!
//! Glyphs are rendered as extruded **vector outlines**:
//! - Discover fonts (system database) or read a font file directly.
//! - Resolve a requested family/weight/style to a concrete face.
//! - Extract glyph outlines (move_to/line_to/quad_to/curve_to) from TTF/OTF via `ttf-parser`.
//! - Convert outlines to `lyon::path::Path`, tessellate caps and flatten contours.
//! - Extrude into a closed 3D solid (`extrude`).

pub mod extrude;
pub mod outline;
pub mod tessellate;

use std::{fs, path::Path as FsPath, sync::Arc};

use fontdb::{Database, Family, ID, Query, Source, Style, Weight};
use lyon::math::point;
use lyon::path::Path;

/// A stable identifier for a selected font face within the system database.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontFaceId(pub ID);

/// Simplified font style selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontQuery {
    /// Preferred font family names, in priority order.
    /// Generic names (`serif`, `sans-serif`, `monospace`) are understood.
    pub families: Vec<String>,

    /// Weight in CSS-ish terms (100..900). 400 = regular, 700 = bold.
    pub weight: u16,

    /// Italic / oblique.
    pub italic: bool,
}

/// A parsed-once face: the font bytes plus the index inside a collection.
///
/// `face_id` is only known for faces that came from the system database.
#[derive(Debug, Clone)]
pub struct ResolvedFace {
    pub face_id: Option<FontFaceId>,
    pub bytes: Arc<[u8]>,
    pub index: u32,
    pub units_per_em: f32,
}

impl ResolvedFace {
    /// Validate raw font bytes and wrap them as a face.
    pub fn from_bytes(bytes: Arc<[u8]>, index: u32) -> Result<Self, FontError> {
        let parsed = ttf_parser::Face::parse(&bytes, index).map_err(|_| FontError::ParseFailed)?;
        let units_per_em = parsed.units_per_em() as f32;
        Ok(Self {
            face_id: None,
            bytes,
            index,
            units_per_em,
        })
    }

    /// Scale factor mapping font units to world units at `size` per em.
    #[inline]
    pub fn font_units_scale(&self, size: f32) -> f32 {
        size / self.units_per_em
    }
}

/// Errors produced by the font subsystem.
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("no fonts found on this system")]
    NoFontsAvailable,

    #[error("failed to resolve a font face for query: {0:?}")]
    ResolveFailed(FontQuery),

    #[error("font face has no file-backed source")]
    NonFileBackedSource,

    /// The outline source could not be loaded. Fatal at startup.
    #[error("failed to load outline source {source_desc}: {reason}")]
    AssetLoad { source_desc: String, reason: String },

    #[error("failed to parse font face")]
    ParseFailed,

    /// The outline source has no usable geometry for this character.
    #[error("glyph {ch:?} has no renderable outline")]
    GlyphNotRenderable { ch: char },
}

/// Face discovery backed by `fontdb`.
pub struct FontSystem {
    db: Database,
}

impl FontSystem {
    /// Create a new font system and load system fonts.
    pub fn new() -> Result<Self, FontError> {
        let mut db = Database::new();
        db.load_system_fonts();

        if db.faces().next().is_none() {
            return Err(FontError::NoFontsAvailable);
        }
        log::debug!("font: {} system faces discovered", db.len());

        Ok(Self { db })
    }

    /// Resolve a `FontQuery` to a concrete face.
    ///
    /// Resolution strategy:
    /// - Try the named families in order with the requested weight/style.
    /// - Fall back to generic `sans-serif`.
    /// - If still not found, fall back to the first face in the database.
    pub fn resolve(&self, query: &FontQuery) -> Result<ResolvedFace, FontError> {
        let style = if query.italic {
            Style::Italic
        } else {
            Style::Normal
        };
        let weight = Weight(query.weight.clamp(1, 1000));

        let mut families: Vec<Family<'_>> = Vec::new();
        for f in &query.families {
            let s = f.trim();
            if s.eq_ignore_ascii_case("serif") {
                families.push(Family::Serif);
            } else if s.eq_ignore_ascii_case("sans-serif") || s.eq_ignore_ascii_case("sans") {
                families.push(Family::SansSerif);
            } else if s.eq_ignore_ascii_case("monospace") || s.eq_ignore_ascii_case("mono") {
                families.push(Family::Monospace);
            } else if !s.is_empty() {
                families.push(Family::Name(s));
            }
        }

        let id = self
            .db
            .query(&Query {
                families: &families,
                weight,
                style,
                stretch: fontdb::Stretch::Normal,
            })
            .or_else(|| {
                self.db.query(&Query {
                    families: &[Family::SansSerif],
                    weight,
                    style,
                    stretch: fontdb::Stretch::Normal,
                })
            })
            .or_else(|| self.db.faces().next().map(|f| f.id))
            .ok_or(FontError::NoFontsAvailable)?;

        let face = self
            .db
            .face(id)
            .ok_or_else(|| FontError::ResolveFailed(query.clone()))?;

        let (path, index) = match &face.source {
            Source::File(p) => (p.to_path_buf(), face.index),
            _ => return Err(FontError::NonFileBackedSource),
        };
        log::info!(
            "font: resolved {:?} to {} (index {})",
            query.families,
            path.display(),
            index
        );

        let mut resolved = ResolvedFace::from_bytes(read_font_bytes(&path)?, index)?;
        resolved.face_id = Some(FontFaceId(id));
        Ok(resolved)
    }
}

/// Read a font file fully into shared memory.
pub fn read_font_bytes(path: &FsPath) -> Result<Arc<[u8]>, FontError> {
    let data = fs::read(path).map_err(|e| FontError::AssetLoad {
        source_desc: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(Arc::<[u8]>::from(data))
}

/// Convert `ttf-parser` outline callbacks into a `lyon::path::Path`.
///
/// Coordinates are multiplied by `scale` on the way in (font units -> world units).
/// A glyph may contain multiple contours; `move_to` starts a new one.
struct LyonOutlineBuilder {
    builder: lyon::path::Builder,
    scale: f32,
    contour_open: bool,
}

impl LyonOutlineBuilder {
    fn new(scale: f32) -> Self {
        Self {
            builder: Path::builder(),
            scale,
            contour_open: false,
        }
    }

    fn build(mut self) -> Path {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
        self.builder.build()
    }

    #[inline]
    fn p(&self, x: f32, y: f32) -> lyon::math::Point {
        point(x * self.scale, y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for LyonOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.contour_open {
            self.builder.close();
        }
        let p = self.p(x, y);
        self.builder.begin(p);
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.p(x, y);
        self.builder.line_to(p);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (c, p) = (self.p(x1, y1), self.p(x, y));
        self.builder.quadratic_bezier_to(c, p);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (c1, c2, p) = (self.p(x1, y1), self.p(x2, y2), self.p(x, y));
        self.builder.cubic_bezier_to(c1, c2, p);
    }

    fn close(&mut self) {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
    }
}

/// Extract the outline of `ch` from `face`, scaled so one em spans `size` units.
///
/// Characters without a glyph, or whose glyph has no contours (e.g. space), are reported as
/// `GlyphNotRenderable`.
pub fn glyph_outline(face: &ResolvedFace, ch: char, size: f32) -> Result<Path, FontError> {
    let parsed =
        ttf_parser::Face::parse(&face.bytes, face.index).map_err(|_| FontError::ParseFailed)?;
    let gid = parsed
        .glyph_index(ch)
        .ok_or(FontError::GlyphNotRenderable { ch })?;

    let mut builder = LyonOutlineBuilder::new(face.font_units_scale(size));
    // `None` means "no outline" (blank glyph).
    if parsed.outline_glyph(gid, &mut builder).is_none() {
        return Err(FontError::GlyphNotRenderable { ch });
    }

    Ok(builder.build())
}
