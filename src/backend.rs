//! The host rendering surface.
//!
//! The ping-pong pipeline only needs a handful of primitives from whatever
//! draws for it: allocate textures, targets and programs, redirect draws to
//! an offscreen target, and render the one-quad scene. [`Renderer`] is that
//! seam. [`crate::gpu::WgpuRenderer`] implements it on a wgpu device and
//! [`crate::cpu::CpuRenderer`] implements it in memory for headless runs.

use crate::error::FboError;
use crate::scene::{OffscreenScene, OrthographicCamera};
use crate::textures::{PositionTexture, RenderTargetDescriptor};

/// Primitives the pipeline issues against the host graphics context.
pub trait Renderer: Sized {
    /// Handle to a sampleable texture.
    ///
    /// `PartialEq` compares identity of the underlying resource, not contents.
    type Texture: Clone + PartialEq;
    /// Offscreen color buffer.
    type Target;
    /// Compiled simulation program.
    type Program;
    /// What a simulation program is built from.
    type ProgramSource: Clone;

    /// Upload an encoded position texture.
    fn create_data_texture(&mut self, texture: &PositionTexture) -> Result<Self::Texture, FboError>;

    /// Allocate an offscreen render target.
    fn create_render_target(&mut self, desc: &RenderTargetDescriptor) -> Result<Self::Target, FboError>;

    /// The texture a target renders into. Stable for the target's lifetime.
    fn target_texture(&self, target: &Self::Target) -> Self::Texture;

    /// Build a fresh program instance.
    fn create_program(&mut self, source: &Self::ProgramSource) -> Result<Self::Program, FboError>;

    /// Redirect subsequent renders to `target`, or back to the default surface.
    fn set_render_target(&mut self, target: Option<&Self::Target>);

    /// Draw `scene` through `camera` into the current render target.
    ///
    /// Reads issued by a later `render` observe the writes of this one.
    fn render(&mut self, scene: &OffscreenScene<Self>, camera: &OrthographicCamera) -> Result<(), FboError>;
}
