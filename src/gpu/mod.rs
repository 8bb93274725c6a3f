//! wgpu backend.
//!
//! [`WgpuRenderer`] implements the pipeline's [`Renderer`] seam on a wgpu
//! device. Each offscreen `render` records and submits its own command
//! buffer, so queue submission order is what guarantees that a pass reading
//! a target sees the previous pass's writes.

mod camera;
mod particles;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;
pub use particles::ParticleRenderer;

use crate::backend::Renderer;
use crate::error::{FboError, GpuError};
use crate::scene::{OffscreenScene, OrthographicCamera, PlaneGeometry, PlaneVertex};
use crate::textures::{PositionTexture, RenderTargetDescriptor, Sampling, POSITION_FORMAT};

/// Uniform block of the simulation program.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SimUniforms {
    proj: [[f32; 4]; 4],
    time: f32,
    _padding: [f32; 3],
}

/// Device, queue and presentation surface for a window.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure with the current size after the surface was lost.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}

struct TextureInner {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

/// Shared handle to a GPU texture with its view and sampler.
///
/// Equality is identity: two handles are equal when they name the same
/// GPU resource.
#[derive(Clone)]
pub struct GpuTexture(Arc<TextureInner>);

impl GpuTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.0.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.0.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.0.sampler
    }
}

impl PartialEq for GpuTexture {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GpuTexture").field(&Arc::as_ptr(&self.0)).finish()
    }
}

/// Offscreen color target.
pub struct GpuTarget {
    texture: GpuTexture,
}

/// A compiled simulation pipeline with its own uniform buffer.
pub struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
}

/// WGSL source of a simulation program.
#[derive(Debug, Clone)]
pub struct WgslSource(pub String);

impl From<&str> for WgslSource {
    fn from(src: &str) -> Self {
        WgslSource(src.to_string())
    }
}

/// Layout shared by the simulation and display programs: position texture,
/// non-filtering sampler, uniform block.
pub(crate) fn position_bind_group_layout(
    device: &wgpu::Device,
    label: &str,
    texture_stages: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: texture_stages,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: texture_stages,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

/// Bind `texture` and `uniforms` against a position layout.
pub(crate) fn position_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    texture: &GpuTexture,
    uniforms: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(texture.view()),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(texture.sampler()),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniforms.as_entire_binding(),
            },
        ],
    })
}

/// [`Renderer`] on a wgpu device.
pub struct WgpuRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    bind_group_layout: wgpu::BindGroupLayout,
    current_target: Option<GpuTexture>,
    quad: Option<(PlaneGeometry, wgpu::Buffer)>,
}

impl WgpuRenderer {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let bind_group_layout =
            position_bind_group_layout(&device, "Simulation Bind Group Layout", wgpu::ShaderStages::FRAGMENT);
        Self {
            device,
            queue,
            bind_group_layout,
            current_target: None,
            quad: None,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Run `f` inside out-of-memory and validation error scopes.
    fn scoped<T>(&self, what: &str, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T, FboError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(self.device.as_ref());
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match out_of_memory.or(validation) {
            Some(e) => {
                log::error!("Creating {} failed: {}", what, e);
                Err(e.into())
            }
            None => Ok(value),
        }
    }

    fn create_texture(
        &self,
        label: &'static str,
        width: u32,
        height: u32,
        sampling: Sampling,
        usage: wgpu::TextureUsages,
    ) -> Result<GpuTexture, FboError> {
        self.scoped(label, |device| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: POSITION_FORMAT,
                usage,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let sampler = device.create_sampler(&sampling.sampler_descriptor(label));
            GpuTexture(Arc::new(TextureInner { texture, view, sampler }))
        })
    }

    fn quad_buffer(&mut self, geometry: PlaneGeometry) -> &wgpu::Buffer {
        if !matches!(&self.quad, Some((cached, _)) if *cached == geometry) {
            self.quad = None;
        }
        let (_, buffer) = self.quad.get_or_insert_with(|| {
            let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("FBO Quad Buffer"),
                contents: bytemuck::cast_slice(&geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });
            (geometry, buffer)
        });
        buffer
    }
}

impl Renderer for WgpuRenderer {
    type Texture = GpuTexture;
    type Target = GpuTarget;
    type Program = GpuProgram;
    type ProgramSource = WgslSource;

    fn create_data_texture(&mut self, texture: &PositionTexture) -> Result<GpuTexture, FboError> {
        let gpu_texture = self.create_texture(
            "Position Data Texture",
            texture.width,
            texture.height,
            texture.sampling,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        )?;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: gpu_texture.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texture.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texture.bytes_per_row()),
                rows_per_image: Some(texture.height),
            },
            wgpu::Extent3d {
                width: texture.width,
                height: texture.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(gpu_texture)
    }

    fn create_render_target(&mut self, desc: &RenderTargetDescriptor) -> Result<GpuTarget, FboError> {
        let texture = self.create_texture(
            "FBO Render Target",
            desc.width,
            desc.height,
            desc.sampling,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        )?;
        log::debug!("Created {}x{} render target", desc.width, desc.height);
        Ok(GpuTarget { texture })
    }

    fn target_texture(&self, target: &GpuTarget) -> GpuTexture {
        target.texture.clone()
    }

    fn create_program(&mut self, source: &WgslSource) -> Result<GpuProgram, FboError> {
        let layout = &self.bind_group_layout;
        self.scoped("simulation program", |device| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Simulation Shader"),
                source: wgpu::ShaderSource::Wgsl(source.0.as_str().into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Simulation Pipeline Layout"),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Simulation Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<PlaneVertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: POSITION_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Simulation Uniform Buffer"),
                size: std::mem::size_of::<SimUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            GpuProgram {
                pipeline,
                uniform_buffer,
            }
        })
    }

    fn set_render_target(&mut self, target: Option<&GpuTarget>) {
        self.current_target = target.map(|t| t.texture.clone());
    }

    fn render(&mut self, scene: &OffscreenScene<Self>, camera: &OrthographicCamera) -> Result<(), FboError> {
        let target = self.current_target.clone().ok_or(FboError::NoRenderTarget)?;
        let material = &scene.mesh.material;

        let uniforms = SimUniforms {
            proj: camera.projection().to_cols_array_2d(),
            time: material.uniforms.time,
            _padding: [0.0; 3],
        };
        self.queue
            .write_buffer(&material.program.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        // Rebuilt every render: posTex alternates between the two targets
        let bind_group = position_bind_group(
            &self.device,
            "Simulation Bind Group",
            &self.bind_group_layout,
            &material.uniforms.pos_tex,
            &material.program.uniform_buffer,
        );

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Simulation Encoder"),
        });
        let quad = self.quad_buffer(scene.mesh.geometry);
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Simulation Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&material.program.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, quad.slice(..));
            pass.draw(0..6, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}
