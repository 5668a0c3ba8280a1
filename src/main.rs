//! Thin binary wrapper around the `glyphscan` library.
//!
//! Run:
//! - `cargo run` (system sans-serif bold face)
//! - `cargo run -- path/to/font.ttf`

use std::path::PathBuf;

use glyphscan::config::{OutlineSourceSpec, ScanConfig};

fn main() -> anyhow::Result<()> {
    // Keep logging setup in the binary so the library remains unopinionated.
    env_logger::init();

    let mut config = ScanConfig::default();
    if let Some(path) = std::env::args_os().nth(1) {
        config = config.with_outline_source(OutlineSourceSpec::File(PathBuf::from(path)));
    }

    glyphscan::run_app_with_config(config)
}
