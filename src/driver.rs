//! Per-frame orchestration of the ping-pong pipeline.
//!
//! Each [`FrameDriver::tick`] swaps the render targets, runs the simulation
//! from the read target into the write target, then publishes the write
//! target to the display layer. That order is fixed: the display layer never
//! sees a target before the step writing it has been issued.
//!
//! ```ignore
//! let mut driver = FrameDriver::new(CpuRenderer::new(), &FboConfig::new(), CpuKernel::identity())?;
//! driver.tick(0.016)?;
//! driver.apply(Command::Reset)?;
//! ```

use crate::backend::Renderer;
use crate::config::FboConfig;
use crate::display::ParticleDisplayLayer;
use crate::error::FboError;
use crate::field::{encode, generate_initial_field, PositionField};
use crate::input::Command;
use crate::simulation::SimulationPass;
use crate::targets::RenderTargetPair;

/// Lifecycle of a [`FrameDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Not yet initialized, or a reset failed part-way.
    Uninitialized,
    /// Initialized or reset, no frame run since.
    Ready,
    /// Inside a simulation step.
    Stepping,
    /// The last tick's output is bound to the display layer.
    Published,
    /// Rebuilding field, program and targets.
    Resetting,
}

impl FrameState {
    /// Whether a tick may start.
    pub fn can_tick(&self) -> bool {
        matches!(self, FrameState::Ready | FrameState::Published)
    }
}

/// Owns the renderer, the render target pair and both passes.
pub struct FrameDriver<R: Renderer> {
    renderer: R,
    width: u32,
    height: u32,
    field: PositionField,
    data_texture: R::Texture,
    simulation: SimulationPass<R>,
    targets: RenderTargetPair<R>,
    display: ParticleDisplayLayer<R::Texture>,
    state: FrameState,
    last_time: Option<f32>,
    frame: u64,
}

impl<R: Renderer> FrameDriver<R> {
    /// Build the pipeline and publish the seeded state.
    pub fn new(mut renderer: R, config: &FboConfig, program: R::ProgramSource) -> Result<Self, FboError> {
        let (width, height) = (config.width, config.height);
        log::info!(
            "Initializing {}x{} particle pipeline ({} particles)",
            width,
            height,
            config.particle_count()
        );

        let field = generate_initial_field(width, height);
        let data_texture = renderer.create_data_texture(&encode(&field, width, height))?;
        let simulation = SimulationPass::new(&mut renderer, program, data_texture.clone(), width, height)?;
        let targets =
            RenderTargetPair::initialize(width, height, &mut renderer, simulation.scene(), simulation.camera())?;

        let mut display = ParticleDisplayLayer::new(width, height, config.point_size);
        display.publish(renderer.target_texture(targets.target_b()));

        Ok(Self {
            renderer,
            width,
            height,
            field,
            data_texture,
            simulation,
            targets,
            display,
            state: FrameState::Ready,
            last_time: None,
            frame: 0,
        })
    }

    /// Advance the simulation one frame.
    ///
    /// `time` should not decrease between calls; the simulation program's
    /// response to a clock running backwards is undefined.
    ///
    /// # Panics
    ///
    /// Panics if the driver is not `Ready` or `Published`.
    pub fn tick(&mut self, time: f32) -> Result<(), FboError> {
        assert!(self.state.can_tick(), "tick called while frame driver is {:?}", self.state);
        if let Some(last) = self.last_time {
            if time < last {
                log::warn!("Simulation clock went backwards: {} -> {}", last, time);
            }
        }

        self.state = FrameState::Stepping;
        let (read, write) = self.targets.swap();
        let read_texture = self.renderer.target_texture(read);
        let written = self.renderer.target_texture(write);

        if let Err(e) = self.simulation.step(&mut self.renderer, &read_texture, time, write) {
            // Undo the relabel so B still holds the last good output
            self.targets.swap();
            self.state = FrameState::Ready;
            return Err(e);
        }

        self.display.publish(written);
        self.state = FrameState::Published;
        self.last_time = Some(time);
        self.frame += 1;
        Ok(())
    }

    /// Restart from the initial field.
    ///
    /// Regenerates and re-encodes the field, rebuilds the simulation pass
    /// around the new texture, reallocates and reseeds both targets, and
    /// publishes the seeded state. If any allocation fails the driver is
    /// left `Uninitialized` until a later reset succeeds.
    pub fn reset(&mut self) -> Result<(), FboError> {
        assert!(
            self.state.can_tick() || self.state == FrameState::Uninitialized,
            "reset called while frame driver is {:?}",
            self.state
        );
        log::info!("Resetting particle simulation after {} frames", self.frame);
        self.state = FrameState::Resetting;

        match self.rebuild() {
            Ok(()) => {
                self.state = FrameState::Ready;
                self.last_time = None;
                self.frame = 0;
                Ok(())
            }
            Err(e) => {
                log::error!("Reset failed: {}", e);
                self.state = FrameState::Uninitialized;
                Err(e)
            }
        }
    }

    fn rebuild(&mut self) -> Result<(), FboError> {
        let field = generate_initial_field(self.width, self.height);
        let data_texture = self
            .renderer
            .create_data_texture(&encode(&field, self.width, self.height))?;
        self.simulation.rebuild(&mut self.renderer, data_texture.clone())?;
        self.targets = RenderTargetPair::initialize(
            self.width,
            self.height,
            &mut self.renderer,
            self.simulation.scene(),
            self.simulation.camera(),
        )?;
        self.field = field;
        self.data_texture = data_texture;
        self.display
            .publish(self.renderer.target_texture(self.targets.target_b()));
        Ok(())
    }

    /// Handle a host command.
    pub fn apply(&mut self, command: Command) -> Result<(), FboError> {
        match command {
            Command::Reset => self.reset(),
            Command::Nudge(direction) => {
                log::debug!("Nudge {:?} acknowledged", direction);
                Ok(())
            }
            Command::TogglePause | Command::SlowDown | Command::SpeedUp => {
                log::debug!("{:?} belongs to the simulation clock, ignored", command);
                Ok(())
            }
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Ticks since the last initialize or reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn display(&self) -> &ParticleDisplayLayer<R::Texture> {
        &self.display
    }

    pub fn targets(&self) -> &RenderTargetPair<R> {
        &self.targets
    }

    pub fn simulation(&self) -> &SimulationPass<R> {
        &self.simulation
    }

    /// The field the current run started from.
    pub fn field(&self) -> &PositionField {
        &self.field
    }

    /// Texture encoded from [`Self::field`].
    pub fn data_texture(&self) -> &R::Texture {
        &self.data_texture
    }
}
