//! Windowed host for the particle pipeline.
//!
//! Owns the swapchain and the composite pass. Once per redraw it advances
//! the simulation clock, ticks the frame driver, then draws the published
//! position texture as sprites. Keyboard events become [`Command`]s; the
//! pipeline itself never sees raw input.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::FboConfig;
use crate::driver::FrameDriver;
use crate::error::{AppError, FboError};
use crate::gpu::{Camera, GpuContext, ParticleRenderer, WgpuRenderer, WgslSource};
use crate::input::{command_for_event, Command};
use crate::time::SimClock;

/// Open a window and run the simulation until it is closed.
pub fn run(config: FboConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct State {
    window: Arc<Window>,
    context: GpuContext,
    driver: FrameDriver<WgpuRenderer>,
    particles: ParticleRenderer,
    camera: Camera,
    clock: SimClock,
    clear_color: wgpu::Color,
}

impl State {
    async fn new(window: Arc<Window>, config: &FboConfig) -> Result<Self, AppError> {
        let context = GpuContext::new(window.clone()).await?;
        let renderer = WgpuRenderer::new(context.device.clone(), context.queue.clone());
        let program = WgslSource(config.simulation_shader.clone());
        let driver = FrameDriver::new(renderer, config, program)?;
        let particles = ParticleRenderer::new(&context.device, driver.display(), context.config.format);

        let mut clock = SimClock::new();
        clock.set_fixed_delta(config.fixed_delta);

        let [r, g, b, a] = config.clear_color;
        Ok(Self {
            window,
            context,
            driver,
            particles,
            camera: Camera::new(),
            clock,
            clear_color: wgpu::Color { r, g, b, a },
        })
    }

    fn frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let time = self.clock.update();
        if !self.driver.state().can_tick() {
            return Ok(());
        }
        if !self.clock.is_paused() {
            if let Err(e) = self.driver.tick(time) {
                log::error!("Simulation step failed: {}", e);
                return Ok(());
            }
        }

        let output = self.context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.particles.draw(
            &self.context.device,
            &self.context.queue,
            &view,
            self.driver.display(),
            self.camera.view_proj(self.context.aspect()),
            self.clear_color,
        );
        output.present();
        Ok(())
    }

    fn apply(&mut self, command: Command) -> Result<(), FboError> {
        if self.clock.handle(command) {
            return Ok(());
        }
        self.driver.apply(command)
    }
}

/// winit application driving one [`FrameDriver`].
pub struct App {
    config: FboConfig,
    state: Option<State>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<AppError>,
}

impl App {
    pub fn new(config: FboConfig) -> Self {
        Self {
            config,
            state: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match pollster::block_on(State::new(window, &self.config)) {
            Ok(state) => self.state = Some(state),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.context.resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(command) = command_for_event(&event) {
                    if let Err(e) = state.apply(command) {
                        self.fail(event_loop, e.into());
                    }
                }
            }
            WindowEvent::MouseInput { state: button_state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = button_state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        state
                            .camera
                            .orbit((position.x - last_x) as f32, (position.y - last_y) as f32);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                state.camera.zoom(scroll);
            }
            WindowEvent::RedrawRequested => match state.frame() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.context.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    self.fail(event_loop, FboError::OutOfMemory("swapchain image".into()).into());
                }
                Err(e) => log::warn!("Surface error: {:?}", e),
            },
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}
