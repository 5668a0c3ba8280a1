//! Rendering module root.
//!
//! The `render` module owns the window/event-loop integration and the GPU side of the
//! scan display.
//!
//! Entrypoint: `render::app::run_with_builder(...)` with a `scan::ScanState`.

pub mod app;

/// GPU context, depth target, and frame acquisition errors.
pub mod gpu;

/// Frame clock and small numeric helpers.
pub mod util;

/// Depth-tested renderer for extruded glyph solids.
pub mod mesh_renderer;

/// Per-frame state tying controller, scene, and renderer together.
pub mod scan;
