//! `glyphscan` library crate root.
//!
//! Displays a cycling sequence of extruded 3D glyphs, each lit by a horizontal scan band
//! that sweeps from top to bottom. The binary stays thin and calls into the entrypoints
//! exported here.
//!
//! Layout:
//! - `config`: tunables and their validation
//! - `font`: outline sources, tessellation, extrusion
//! - `scene`: 3D meshes, draw list, camera
//! - `shading`: the scan-light model (CPU reference of the shader)
//! - `anim`: the character cycle state machine
//! - `render`: window, GPU, and frame loop

pub mod anim;
pub mod config;
pub mod font;
pub mod render;
pub mod scene;
pub mod shading;

use crate::config::ScanConfig;
use crate::render::app::{AppConfig, run_with_builder};

/// Run the scan display with the default configuration.
///
/// Note: This function does **not** initialize logging; callers decide their own setup.
pub fn run_app() -> anyhow::Result<()> {
    run_app_with_config(ScanConfig::default())
}

/// Run the scan display with `config`.
///
/// The configuration is validated and the outline source is loaded before the first frame;
/// either failure is returned from here.
pub fn run_app_with_config(config: ScanConfig) -> anyhow::Result<()> {
    config.validate()?;

    let app = AppConfig {
        title: config.title.clone(),
        ..Default::default()
    };

    run_with_builder(app, move |window| async move {
        let source = font::outline::load_outline_source(&config.outline_source)?;
        log::info!("font: loaded outline source {:?}", config.outline_source);
        render::scan::ScanState::new(window, config, source).await
    })
}
