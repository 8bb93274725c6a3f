//! # FBO Particles
//!
//! GPU particle simulation that keeps particle state in textures instead of
//! buffers. Positions live in an RGBA32F texture, one texel per particle; a
//! fragment program advances them by rendering a full-screen quad into an
//! offscreen render target, and a sprite pass reads the result back as
//! vertex positions.
//!
//! ## Quick Start
//!
//! ```ignore
//! use fbo_particles::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     env_logger::init();
//!     fbo_particles::run(FboConfig::new().with_size(256, 256))
//! }
//! ```
//!
//! ## Pipeline
//!
//! Once per frame the [`FrameDriver`] runs these stages in order:
//!
//! 1. [`RenderTargetPair::swap`] relabels the two render targets so the
//!    previous frame's output becomes the read side.
//! 2. [`SimulationPass::step`] binds the read side as `posTex`, sets
//!    `uTime`, and renders the simulation quad into the write side.
//! 3. [`ParticleDisplayLayer::publish`] exposes the written texture as
//!    `posMap` for the sprite pass.
//!
//! A target is never read and written by the same render, and the display
//! always lags the simulation by exactly one write.
//!
//! ## Backends
//!
//! Everything above is generic over [`Renderer`]. [`WgpuRenderer`] drives
//! a real device; [`CpuRenderer`] rasterizes on the CPU with a Rust kernel
//! standing in for the shader, which is what the tests use.
//!
//! ```
//! use fbo_particles::prelude::*;
//!
//! let config = FboConfig::new().with_size(4, 4);
//! let mut driver = FrameDriver::new(CpuRenderer::new(), &config, CpuKernel::identity()).unwrap();
//! driver.tick(0.016).unwrap();
//! assert_eq!(driver.state(), FrameState::Published);
//! ```

pub mod backend;
pub mod config;
pub mod cpu;
pub mod display;
pub mod driver;
pub mod error;
pub mod field;
pub mod gpu;
pub mod input;
pub mod scene;
pub mod shaders;
pub mod simulation;
pub mod targets;
pub mod textures;
pub mod time;
mod window;

pub use backend::Renderer;
pub use config::FboConfig;
pub use cpu::{CpuKernel, CpuRenderer, CpuTexture};
pub use display::ParticleDisplayLayer;
pub use driver::{FrameDriver, FrameState};
pub use error::{AppError, FboError, GpuError};
pub use field::{encode, generate_initial_field, PositionField};
pub use gpu::{WgpuRenderer, WgslSource};
pub use input::{Command, NudgeDirection};
pub use simulation::SimulationPass;
pub use targets::RenderTargetPair;
pub use textures::PositionTexture;
pub use time::SimClock;
pub use window::{run, App};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use fbo_particles::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backend::Renderer;
    pub use crate::config::FboConfig;
    pub use crate::cpu::{CpuKernel, CpuRenderer};
    pub use crate::driver::{FrameDriver, FrameState};
    pub use crate::error::{AppError, FboError};
    pub use crate::input::Command;
    pub use crate::textures::{AddressMode, FilterMode, Texel};
    pub use crate::time::SimClock;
}
