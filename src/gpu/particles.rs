//! Composite pass drawing the display layer into the swapchain.
//!
//! Each particle is an instanced six-vertex quad. The instance attribute is
//! the particle's lookup coordinate; the vertex stage samples `posMap` there
//! to find the particle's position.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use super::{position_bind_group, position_bind_group_layout, GpuTexture};
use crate::display::{ParticleDisplayLayer, ParticleVertex};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DisplayUniforms {
    view_proj: [[f32; 4]; 4],
    offset: [f32; 3],
    point_size: f32,
}

/// GPU resources for drawing a [`ParticleDisplayLayer`].
pub struct ParticleRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
}

impl ParticleRenderer {
    pub fn new(
        device: &wgpu::Device,
        layer: &ParticleDisplayLayer<GpuTexture>,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let material = layer.material();

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Lookup Buffer"),
            contents: bytemuck::cast_slice(layer.geometry()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Display Uniform Buffer"),
            size: std::mem::size_of::<DisplayUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout =
            position_bind_group_layout(device, "Display Bind Group Layout", wgpu::ShaderStages::VERTEX);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Display Shader"),
            source: wgpu::ShaderSource::Wgsl(material.shader.clone()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Display Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let blend = if material.transparent {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Display Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ParticleVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(blend),
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

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            instance_buffer,
            instance_count: layer.particle_count() as u32,
        }
    }

    /// Clear `view` and draw every particle at its published position.
    ///
    /// # Panics
    ///
    /// Panics if nothing has been published to `layer`.
    pub fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        layer: &ParticleDisplayLayer<GpuTexture>,
        view_proj: Mat4,
        clear_color: wgpu::Color,
    ) {
        let uniforms = DisplayUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            offset: layer.offset(),
            point_size: layer.material().point_size,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = position_bind_group(
            device,
            "Display Bind Group",
            &self.bind_group_layout,
            layer.pos_map(),
            &self.uniform_buffer,
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Display Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Display Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            pass.draw(0..6, 0..self.instance_count);
        }
        queue.submit(Some(encoder.finish()));
    }
}
