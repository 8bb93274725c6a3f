//! The point cloud users see.
//!
//! Vertices carry texture-lookup coordinates, never positions. Each frame the
//! display program samples the latest position texture at a vertex's `(u, v)`
//! to find where that particle is.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};

use crate::shaders::DISPLAY_SHADER;

/// Offset applied to the sampled unit-square positions so the cloud is centred.
pub const DISPLAY_OFFSET: [f32; 3] = [-0.5, -0.5, 0.0];

/// Per-particle lookup coordinate `(u, v, 0)` into the position texture.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    pub lookup: [f32; 3],
}

/// One lookup vertex per grid cell, in row-major order.
///
/// Vertex `i` gets `((i mod W) / W, floor(i / W) / H, 0)`, which is texel `i`
/// of the position texture: the same particle as field index `i`.
pub fn build_geometry(width: u32, height: u32) -> Vec<ParticleVertex> {
    let (w, h) = (width as f32, height as f32);
    (0..width * height)
        .map(|i| ParticleVertex {
            lookup: [(i % width) as f32 / w, (i / width) as f32 / h, 0.0],
        })
        .collect()
}

/// Display program description and its `posMap` binding.
#[derive(Debug, Clone)]
pub struct DisplayMaterial<T> {
    /// WGSL source of the point-sprite program.
    pub shader: Cow<'static, str>,
    /// Blend overlapping sprites.
    pub transparent: bool,
    /// Sprite half-size in clip space.
    pub point_size: f32,
    pos_map: Option<T>,
}

/// Point-sprite material with an unbound `posMap`.
pub fn build_material<T>(point_size: f32) -> DisplayMaterial<T> {
    DisplayMaterial {
        shader: Cow::Borrowed(DISPLAY_SHADER),
        transparent: true,
        point_size,
        pos_map: None,
    }
}

/// Geometry plus material for the visible particle cloud.
pub struct ParticleDisplayLayer<T> {
    geometry: Vec<ParticleVertex>,
    material: DisplayMaterial<T>,
    publish_count: u64,
}

impl<T> ParticleDisplayLayer<T> {
    pub fn new(width: u32, height: u32, point_size: f32) -> Self {
        Self {
            geometry: build_geometry(width, height),
            material: build_material(point_size),
            publish_count: 0,
        }
    }

    /// Bind `texture` as `posMap`.
    ///
    /// Only the frame driver calls this, and only after the simulation step
    /// that wrote `texture` has been issued.
    pub fn publish(&mut self, texture: T) {
        self.material.pos_map = Some(texture);
        self.publish_count += 1;
    }

    /// The texture the display program samples.
    ///
    /// # Panics
    ///
    /// Panics if nothing has been published yet; drawing would sample an
    /// undefined texture.
    pub fn pos_map(&self) -> &T {
        match &self.material.pos_map {
            Some(texture) => texture,
            None => panic!("particle display layer sampled before any texture was published"),
        }
    }

    /// How many times a texture has been published.
    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    pub fn geometry(&self) -> &[ParticleVertex] {
        &self.geometry
    }

    pub fn material(&self) -> &DisplayMaterial<T> {
        &self.material
    }

    pub fn particle_count(&self) -> usize {
        self.geometry.len()
    }

    /// Model offset applied before the view-projection.
    pub fn offset(&self) -> [f32; 3] {
        DISPLAY_OFFSET
    }
}
