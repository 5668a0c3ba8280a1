//! Outline sources: where 2D glyph shapes come from.
//!
//! The extrusion builder only needs "give me the outline of this character at this size",
//! so that is the whole trait. The production implementation reads a font once at startup
//! (system lookup via `fontdb`, or an explicit file) and answers from memory afterwards.

use lyon::path::Path;

use crate::config::OutlineSourceSpec;
use crate::font::{FontError, FontSystem, ResolvedFace, glyph_outline, read_font_bytes};

/// Provider of flat glyph outlines.
///
/// Returned paths are in world units with Y up, one em spanning `size` units.
pub trait OutlineSource {
    fn outline_for(&self, ch: char, size: f32) -> Result<Path, FontError>;
}

impl<T: OutlineSource + ?Sized> OutlineSource for &T {
    fn outline_for(&self, ch: char, size: f32) -> Result<Path, FontError> {
        (**self).outline_for(ch, size)
    }
}

impl<T: OutlineSource + ?Sized> OutlineSource for Box<T> {
    fn outline_for(&self, ch: char, size: f32) -> Result<Path, FontError> {
        (**self).outline_for(ch, size)
    }
}

/// Font-backed outline source.
#[derive(Debug, Clone)]
pub struct FontOutlineSource {
    face: ResolvedFace,
}

impl FontOutlineSource {
    pub fn new(face: ResolvedFace) -> Self {
        Self { face }
    }
}

impl OutlineSource for FontOutlineSource {
    fn outline_for(&self, ch: char, size: f32) -> Result<Path, FontError> {
        glyph_outline(&self.face, ch, size)
    }
}

/// Load the outline source named by `spec`.
///
/// Runs once before the first frame. Every failure is reported as `FontError::AssetLoad`
/// so the caller can treat it as fatal.
pub fn load_outline_source(spec: &OutlineSourceSpec) -> Result<FontOutlineSource, FontError> {
    let face = match spec {
        OutlineSourceSpec::File(path) => {
            let bytes = read_font_bytes(path)?;
            ResolvedFace::from_bytes(bytes, 0).map_err(|e| FontError::AssetLoad {
                source_desc: path.display().to_string(),
                reason: e.to_string(),
            })?
        }
        OutlineSourceSpec::System(query) => FontSystem::new()
            .and_then(|fs| fs.resolve(query))
            .map_err(|e| match e {
                FontError::AssetLoad { .. } => e,
                other => FontError::AssetLoad {
                    source_desc: format!("system font {:?}", query.families),
                    reason: other.to_string(),
                },
            })?,
    };

    log::info!(
        "font: outline source ready ({} units/em, {} bytes)",
        face.units_per_em,
        face.bytes.len()
    );
    Ok(FontOutlineSource::new(face))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn missing_font_file_is_an_asset_load_error() {
        let spec = OutlineSourceSpec::File(PathBuf::from("/definitely/not/here.ttf"));
        let err = load_outline_source(&spec).unwrap_err();
        assert!(
            matches!(err, FontError::AssetLoad { .. }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn garbage_font_bytes_are_an_asset_load_error() {
        let dir = std::env::temp_dir().join("glyphscan-outline-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("not-a-font.ttf");
        std::fs::write(&path, b"this is not a font").unwrap();

        let err = load_outline_source(&OutlineSourceSpec::File(path)).unwrap_err();
        assert!(
            matches!(err, FontError::AssetLoad { .. }),
            "unexpected error: {err:?}"
        );
    }
}
