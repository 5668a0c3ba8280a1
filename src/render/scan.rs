//! Frame-loop state for the scan display.
//!
//! Driven by the library runner:
//! - `render::app::run_with_builder(..., |window| async move { ScanState::new(window, ..).await })`
//!
//! Per frame:
//! - advance the cycle controller with the monotonic clock
//! - acquire the surface frame, clear color + depth
//! - draw the active solid with the controller's shading inputs
//!
//! A lost render target drops all GPU meshes and restarts the cycle from `Idle`. When no
//! character can be built, frames keep being cleared and presented.

use std::sync::Arc;

use anyhow::Context as _;
use rand::{SeedableRng as _, rngs::StdRng};
use winit::window::Window;

use crate::anim::CycleController;
use crate::config::ScanConfig;
use crate::font::outline::FontOutlineSource;
use crate::render::app::AppState;
use crate::render::gpu::{Gpu, RenderError};
use crate::render::mesh_renderer::SolidRenderer;
use crate::render::util::FrameClock;
use crate::scene::{Camera3D, Scene3D};

/// Scan display state.
pub struct ScanState {
    window: Arc<Window>,
    gpu: Gpu,
    renderer: SolidRenderer,

    scene: Scene3D,
    camera: Camera3D,
    controller: CycleController<FontOutlineSource, StdRng>,

    clock: FrameClock,
    clear_color: wgpu::Color,
    /// Set while the controller has nothing to show; the error is logged once per stall.
    stalled: bool,
}

impl ScanState {
    /// Construct the state. `source` is already loaded, so no asset I/O happens per frame.
    pub async fn new(
        window: Arc<Window>,
        config: ScanConfig,
        source: FontOutlineSource,
    ) -> anyhow::Result<Self> {
        let gpu = Gpu::new(window.clone()).await?;
        let renderer = SolidRenderer::new(&gpu).context("render: failed to create pipeline")?;

        let clear = config.clear_color;
        let clear_color = wgpu::Color {
            r: clear.r as f64,
            g: clear.g as f64,
            b: clear.b as f64,
            a: 1.0,
        };

        let controller = CycleController::new(config, source, StdRng::from_entropy())
            .context("config: invalid scan configuration")?;

        let mut camera = Camera3D::default();
        controller.configure_camera(&mut camera);
        camera.set_viewport_px(gpu.size.width, gpu.size.height);

        Ok(Self {
            window,
            gpu,
            renderer,
            scene: Scene3D::new(),
            camera,
            controller,
            clock: FrameClock::new(),
            clear_color,
            stalled: false,
        })
    }

    /// Rebuild everything that lived on the lost target and restart the cycle.
    fn recover_lost_target(&mut self) {
        log::warn!("scan: render target lost; restarting cycle");
        self.gpu.resize(self.gpu.size);
        self.renderer.clear();
        self.controller.reset(&mut self.scene);
        self.clock.reset();
    }
}

impl AppState for ScanState {
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.camera.set_viewport_px(new_size.width, new_size.height);
    }

    fn render(&mut self) -> anyhow::Result<()> {
        // Minimized: nothing to draw; the next resize requests a redraw.
        if !self.gpu.is_drawable() {
            return Ok(());
        }

        let shading = match self.controller.update(
            self.clock.elapsed(),
            &mut self.scene,
            &mut self.camera,
        ) {
            Ok(shading) => {
                self.stalled = false;
                Some(shading)
            }
            Err(err) => {
                if !self.stalled {
                    log::error!("cycle: {err}; presenting empty frames");
                    self.stalled = true;
                }
                None
            }
        };

        let (surface_texture, view) = match self.gpu.acquire_frame() {
            Ok(v) => v,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(RenderError::TargetLost) => {
                self.recover_lost_target();
                self.request_redraw();
                return Ok(());
            }
            Err(err) => {
                log::debug!("scan: {err}");
                self.request_redraw();
                return Ok(());
            }
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scan Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scan Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(shading) = &shading {
                self.renderer
                    .draw(&self.gpu, &mut pass, &self.camera, &self.scene, shading);
            }
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();

        // Continuous animation.
        self.request_redraw();

        Ok(())
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

impl Drop for ScanState {
    fn drop(&mut self) {
        self.controller.reset(&mut self.scene);
        self.renderer.clear();
    }
}
