//! In-memory reference renderer.
//!
//! Textures are plain texel vectors and programs are Rust closures, so the
//! whole ping-pong protocol runs without a GPU. The rasterizer projects the
//! plane through the camera and shades every texel whose centre it covers,
//! sampling `posTex` with the texture's own nearest/repeat sampler state.
//!
//! Every render is appended to a trace, which is what the ordering and
//! identity tests inspect.

use std::rc::Rc;

use crate::backend::Renderer;
use crate::error::FboError;
use crate::scene::{OffscreenScene, OrthographicCamera};
use crate::textures::{PositionTexture, RenderTargetDescriptor, Sampling, Texel};

/// Per-texel simulation rule: `(input texel, texel coordinate, time) -> output texel`.
pub type KernelFn = dyn Fn(Texel, [u32; 2], f32) -> Texel;

/// A simulation program for [`CpuRenderer`].
#[derive(Clone)]
pub struct CpuKernel {
    name: &'static str,
    rule: Rc<KernelFn>,
}

impl CpuKernel {
    pub fn new<F>(name: &'static str, rule: F) -> Self
    where
        F: Fn(Texel, [u32; 2], f32) -> Texel + 'static,
    {
        Self {
            name,
            rule: Rc::new(rule),
        }
    }

    /// Copies its input unchanged.
    pub fn identity() -> Self {
        Self::new("identity", |texel, _, _| texel)
    }
}

/// Handle to a texture owned by a [`CpuRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuTexture(usize);

impl CpuTexture {
    pub fn id(&self) -> usize {
        self.0
    }
}

/// Offscreen target owned by a [`CpuRenderer`].
#[derive(Debug, PartialEq, Eq)]
pub struct CpuTarget {
    texture: CpuTexture,
}

/// A program instance. Each `create_program` call yields a distinct id.
pub struct CpuProgram {
    id: usize,
    kernel: CpuKernel,
}

impl CpuProgram {
    pub fn id(&self) -> usize {
        self.id
    }
}

/// One entry in the renderer's trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderEvent {
    /// A render of the offscreen scene.
    Render {
        program: usize,
        source: CpuTexture,
        target: CpuTexture,
        time: f32,
    },
}

struct TextureStorage {
    texels: Vec<Texel>,
    width: u32,
    height: u32,
    sampling: Sampling,
}

/// Headless [`Renderer`] backed by host memory.
#[derive(Default)]
pub struct CpuRenderer {
    textures: Vec<TextureStorage>,
    current_target: Option<CpuTexture>,
    next_program: usize,
    trace: Vec<RenderEvent>,
    texel_budget: Option<usize>,
    fail_next_render: bool,
}

impl CpuRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail allocations that would take the renderer past `texels` texels.
    ///
    /// Textures are never freed, so this counts every allocation made.
    pub fn with_texel_budget(mut self, texels: usize) -> Self {
        self.texel_budget = Some(texels);
        self
    }

    /// Make the next `render` fail with a validation error, leaving its
    /// target untouched.
    pub fn fail_next_render(&mut self) {
        self.fail_next_render = true;
    }

    /// Copy of a texture's contents.
    pub fn read_texture(&self, texture: CpuTexture) -> Vec<Texel> {
        self.textures[texture.0].texels.clone()
    }

    /// Texel at column `x`, row `y`.
    pub fn texel(&self, texture: CpuTexture, x: u32, y: u32) -> Texel {
        let storage = &self.textures[texture.0];
        storage.texels[(y * storage.width + x) as usize]
    }

    /// All renders issued so far, oldest first.
    pub fn trace(&self) -> &[RenderEvent] {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Target currently bound for rendering.
    pub fn current_target(&self) -> Option<CpuTexture> {
        self.current_target
    }

    fn allocate(&mut self, storage: TextureStorage, what: &str) -> Result<CpuTexture, FboError> {
        if let Some(budget) = self.texel_budget {
            let live: usize = self.textures.iter().map(|t| t.texels.len()).sum();
            if live + storage.texels.len() > budget {
                return Err(FboError::OutOfMemory(what.to_string()));
            }
        }
        self.textures.push(storage);
        Ok(CpuTexture(self.textures.len() - 1))
    }
}

impl Renderer for CpuRenderer {
    type Texture = CpuTexture;
    type Target = CpuTarget;
    type Program = CpuProgram;
    type ProgramSource = CpuKernel;

    fn create_data_texture(&mut self, texture: &PositionTexture) -> Result<CpuTexture, FboError> {
        let storage = TextureStorage {
            texels: texture.texels.clone(),
            width: texture.width,
            height: texture.height,
            sampling: texture.sampling,
        };
        self.allocate(storage, "position data texture")
    }

    fn create_render_target(&mut self, desc: &RenderTargetDescriptor) -> Result<CpuTarget, FboError> {
        // Uninitialised contents are NaN so an unseeded read is visible.
        let storage = TextureStorage {
            texels: vec![[f32::NAN; 4]; desc.width as usize * desc.height as usize],
            width: desc.width,
            height: desc.height,
            sampling: desc.sampling,
        };
        let texture = self.allocate(storage, "render target")?;
        Ok(CpuTarget { texture })
    }

    fn target_texture(&self, target: &CpuTarget) -> CpuTexture {
        target.texture
    }

    fn create_program(&mut self, source: &CpuKernel) -> Result<CpuProgram, FboError> {
        let id = self.next_program;
        self.next_program += 1;
        log::debug!("Built CPU program {} from kernel '{}'", id, source.name);
        Ok(CpuProgram {
            id,
            kernel: source.clone(),
        })
    }

    fn set_render_target(&mut self, target: Option<&CpuTarget>) {
        self.current_target = target.map(|t| t.texture);
    }

    fn render(&mut self, scene: &OffscreenScene<Self>, camera: &OrthographicCamera) -> Result<(), FboError> {
        let target = self.current_target.ok_or(FboError::NoRenderTarget)?;
        if std::mem::take(&mut self.fail_next_render) {
            return Err(FboError::Validation("render rejected by CPU renderer".to_string()));
        }
        let material = &scene.mesh.material;
        let source = material.uniforms.pos_tex;
        let time = material.uniforms.time;

        // Plane extent in NDC
        let [min_x, min_y, max_x, max_y] = scene.mesh.geometry.bounds();
        let lo = camera.to_ndc([min_x, min_y, 0.0]);
        let hi = camera.to_ndc([max_x, max_y, 0.0]);
        let (ndc_min_x, ndc_max_x) = (lo[0].min(hi[0]), lo[0].max(hi[0]));
        let (ndc_min_y, ndc_max_y) = (lo[1].min(hi[1]), lo[1].max(hi[1]));

        let (width, height) = {
            let t = &self.textures[target.0];
            (t.width, t.height)
        };

        let input = &self.textures[source.0];
        let mut output = self.textures[target.0].texels.clone();
        for y in 0..height {
            // Row 0 is the top of the framebuffer
            let ndc_y = 1.0 - 2.0 * (y as f32 + 0.5) / height as f32;
            if ndc_y < ndc_min_y || ndc_y > ndc_max_y {
                continue;
            }
            for x in 0..width {
                let ndc_x = 2.0 * (x as f32 + 0.5) / width as f32 - 1.0;
                if ndc_x < ndc_min_x || ndc_x > ndc_max_x {
                    continue;
                }
                let u = (ndc_x - ndc_min_x) / (ndc_max_x - ndc_min_x);
                let v = (ndc_max_y - ndc_y) / (ndc_max_y - ndc_min_y);
                let (sx, sy) = input.sampling.texel_index([u, v], input.width, input.height);
                let texel = input.texels[(sy * input.width + sx) as usize];
                output[(y * width + x) as usize] = (material.program.kernel.rule)(texel, [x, y], time);
            }
        }
        self.textures[target.0].texels = output;

        self.trace.push(RenderEvent::Render {
            program: material.program.id,
            source,
            target,
            time,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{encode, PositionField};
    use crate::scene::{PlaneGeometry, SimulationMaterial, SimulationUniforms};

    fn scene(renderer: &mut CpuRenderer, kernel: CpuKernel, size: u32) -> (OffscreenScene<CpuRenderer>, CpuTexture) {
        let field = PositionField::initial(size, size);
        let data = renderer.create_data_texture(&encode(&field, size, size)).unwrap();
        let program = renderer.create_program(&kernel).unwrap();
        let material = SimulationMaterial {
            program,
            uniforms: SimulationUniforms { pos_tex: data, time: 0.0 },
        };
        (OffscreenScene::new(PlaneGeometry::new(size as f32, size as f32), material), data)
    }

    #[test]
    fn test_render_without_target_fails() {
        let mut renderer = CpuRenderer::new();
        let (scene, _) = scene(&mut renderer, CpuKernel::identity(), 4);
        let camera = OrthographicCamera::framing(4.0, 4.0);
        assert!(matches!(renderer.render(&scene, &camera), Err(FboError::NoRenderTarget)));
    }

    #[test]
    fn test_identity_copy_covers_every_texel() {
        let mut renderer = CpuRenderer::new();
        let (scene, data) = scene(&mut renderer, CpuKernel::identity(), 8);
        let target = renderer.create_render_target(&RenderTargetDescriptor::for_grid(8, 8)).unwrap();
        renderer.set_render_target(Some(&target));
        renderer
            .render(&scene, &OrthographicCamera::framing(8.0, 8.0))
            .unwrap();
        renderer.set_render_target(None);

        assert_eq!(renderer.read_texture(target.texture), renderer.read_texture(data));
        assert_eq!(renderer.current_target(), None);
    }

    #[test]
    fn test_kernel_receives_texel_coordinates() {
        let mut renderer = CpuRenderer::new();
        let kernel = CpuKernel::new("coords", |_, [x, y], t| [x as f32, y as f32, t, 1.0]);
        let (mut scene, _) = scene(&mut renderer, kernel, 4);
        scene.mesh.material.uniforms.time = 2.5;
        let target = renderer.create_render_target(&RenderTargetDescriptor::for_grid(4, 4)).unwrap();
        renderer.set_render_target(Some(&target));
        renderer
            .render(&scene, &OrthographicCamera::framing(4.0, 4.0))
            .unwrap();

        assert_eq!(renderer.texel(target.texture, 3, 1), [3.0, 1.0, 2.5, 1.0]);
    }

    #[test]
    fn test_camera_covering_half_the_target_leaves_rest_untouched() {
        let mut renderer = CpuRenderer::new();
        let (scene, _) = scene(&mut renderer, CpuKernel::identity(), 4);
        let target = renderer.create_render_target(&RenderTargetDescriptor::for_grid(4, 4)).unwrap();
        renderer.set_render_target(Some(&target));
        // Twice as wide as the plane: only the middle half of each row is covered
        renderer
            .render(&scene, &OrthographicCamera::framing(8.0, 4.0))
            .unwrap();

        assert!(renderer.texel(target.texture, 0, 0)[0].is_nan());
        assert!(!renderer.texel(target.texture, 1, 0)[0].is_nan());
        assert!(renderer.texel(target.texture, 3, 0)[0].is_nan());
    }

    #[test]
    fn test_forced_render_failure_is_one_shot() {
        let mut renderer = CpuRenderer::new();
        let (scene, _) = scene(&mut renderer, CpuKernel::identity(), 4);
        let camera = OrthographicCamera::framing(4.0, 4.0);
        let target = renderer.create_render_target(&RenderTargetDescriptor::for_grid(4, 4)).unwrap();
        renderer.set_render_target(Some(&target));

        renderer.fail_next_render();
        assert!(matches!(renderer.render(&scene, &camera), Err(FboError::Validation(_))));
        assert!(renderer.texel(target.texture, 0, 0)[0].is_nan());
        assert!(renderer.trace().is_empty());

        renderer.render(&scene, &camera).unwrap();
        assert!(!renderer.texel(target.texture, 0, 0)[0].is_nan());
    }

    #[test]
    fn test_texel_budget_reports_out_of_memory() {
        let mut renderer = CpuRenderer::new().with_texel_budget(16);
        let desc = RenderTargetDescriptor::for_grid(4, 4);
        assert!(renderer.create_render_target(&desc).is_ok());
        assert!(matches!(renderer.create_render_target(&desc), Err(FboError::OutOfMemory(_))));
    }

    #[test]
    fn test_programs_are_distinct_instances() {
        let mut renderer = CpuRenderer::new();
        let a = renderer.create_program(&CpuKernel::identity()).unwrap();
        let b = renderer.create_program(&CpuKernel::identity()).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
