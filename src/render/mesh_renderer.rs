//! Solid mesh renderer for the scan display.
//!
//! Draws every solid of a `scene::Scene3D` with the scan-light pipeline
//! (`shaders/scan_solid.wgsl`): camera MVP, per-solid model transform, and the frame's
//! `ShadingState` as uniforms.
//!
//! Resource model:
//! - Each solid is uploaded once, the first time its `SolidId` is seen in the scene.
//! - When an id leaves the scene its buffers are dropped on the next draw, which releases
//!   the GPU memory.
//! - Each cached solid has its own uniform buffer + bind group, so writing one solid's
//!   uniforms never aliases another's within a frame.
//!
//! Pipeline state: opaque (no blending), depth test `Less` with depth writes, no culling
//! (back faces are hidden by the depth buffer).

use std::{borrow::Cow, collections::HashMap, mem};

use wgpu::util::DeviceExt as _;

use crate::render::gpu::{DEPTH_FORMAT, Gpu};
use crate::scene::{Camera3D, DrawItem3D, Mesh3D, Scene3D, SolidId};
use crate::shading::ShadingState;

/// GPU vertex format for solids.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex3D {
    pub const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    #[inline]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Uniform layout shared with `scan_solid.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct SolidUniforms {
    clip_from_world: [[f32; 4]; 4],
    world_from_local: [[f32; 4]; 4],
    eye: [f32; 4],
    tint: [f32; 4],
    /// (scan_y, band_width, solid_height, rim_strength)
    scan: [f32; 4],
}

impl SolidUniforms {
    fn new(camera: &Camera3D, item: &DrawItem3D, shading: &ShadingState) -> Self {
        let eye = camera.eye();
        let tint = shading.tint;
        Self {
            clip_from_world: camera.clip_from_world().to_cols_array_2d(),
            world_from_local: item.world_from_local.to_cols_array_2d(),
            eye: [eye.x, eye.y, eye.z, 1.0],
            tint: [tint.r, tint.g, tint.b, 1.0],
            scan: [
                shading.scan_y,
                // WGSL smoothstep is undefined for equal edges.
                shading.band_width.max(f32::EPSILON),
                shading.solid_height,
                shading.rim_strength,
            ],
        }
    }
}

/// Interleave a scene mesh into GPU vertices.
fn build_gpu_vertices(mesh: &Mesh3D) -> Vec<Vertex3D> {
    mesh.positions
        .iter()
        .zip(&mesh.normals)
        .map(|(&position, &normal)| Vertex3D { position, normal })
        .collect()
}

/// Buffers owned by one uploaded solid.
struct GpuSolid {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Renderer for extruded glyph solids.
pub struct SolidRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    solids: HashMap<SolidId, GpuSolid>,
}

impl SolidRenderer {
    /// Create the scan-light pipeline for the surface's SRGB view format.
    pub fn new(gpu: &Gpu) -> anyhow::Result<Self> {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("SolidRenderer Scan Shader"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                    "shaders/scan_solid.wgsl"
                ))),
            });

        let uniform_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("SolidRenderer Uniform BGL"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                mem::size_of::<SolidUniforms>() as u64,
                            ),
                        },
                        count: None,
                    }],
                });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("SolidRenderer Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout],
                immediate_size: 0,
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("SolidRenderer Scan Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex3D::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.surface_format.add_srgb_suffix(),
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        Ok(Self {
            pipeline,
            uniform_layout,
            solids: HashMap::new(),
        })
    }

    /// Drop every cached GPU mesh (e.g. after the render target was lost).
    pub fn clear(&mut self) {
        self.solids.clear();
    }

    /// Upload new solids and release the ones no longer in the scene.
    fn sync(&mut self, gpu: &Gpu, scene: &Scene3D) {
        self.solids.retain(|id, _| scene.get(*id).is_some());

        for (id, item) in scene.items() {
            if item.mesh.is_empty() || self.solids.contains_key(&id) {
                continue;
            }

            let vertices = build_gpu_vertices(&item.mesh);
            let vertex_buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("SolidRenderer Vertex Buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("SolidRenderer Index Buffer"),
                    contents: bytemuck::cast_slice(&item.mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("SolidRenderer Uniform Buffer"),
                size: mem::size_of::<SolidUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("SolidRenderer Uniform BG"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

            log::debug!(
                "renderer: uploaded solid {:?} ({} vertices, {} triangles)",
                id,
                vertices.len(),
                item.mesh.triangle_count()
            );

            self.solids.insert(
                id,
                GpuSolid {
                    vertex_buffer,
                    index_buffer,
                    index_count: item.mesh.indices.len() as u32,
                    uniform_buffer,
                    bind_group,
                },
            );
        }
    }

    /// Draw all solids of `scene` into `pass` with this frame's shading inputs.
    ///
    /// The caller creates the pass (color + depth attachments) and clears it.
    pub fn draw(
        &mut self,
        gpu: &Gpu,
        pass: &mut wgpu::RenderPass<'_>,
        camera: &Camera3D,
        scene: &Scene3D,
        shading: &ShadingState,
    ) {
        self.sync(gpu, scene);

        pass.set_pipeline(&self.pipeline);

        for (id, item) in scene.items() {
            let Some(solid) = self.solids.get(&id) else {
                continue;
            };

            let uniforms = SolidUniforms::new(camera, item, shading);
            gpu.queue
                .write_buffer(&solid.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

            pass.set_bind_group(0, &solid.bind_group, &[]);
            pass.set_vertex_buffer(0, solid.vertex_buffer.slice(..));
            pass.set_index_buffer(solid.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..solid.index_count, 0, 0..1);
        }
    }
}
