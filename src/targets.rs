//! Ping-pong render targets.
//!
//! Two equally sized offscreen buffers trade the roles "A" (read this frame)
//! and "B" (written this frame). The buffers never move; only the index of
//! A flips. At the start of a frame A is one step behind B; swapping makes
//! the freshest state the read source and hands the stale buffer over to be
//! overwritten. Output of frame N therefore lands in the buffer that held
//! output of frame N-2.

use crate::backend::Renderer;
use crate::error::FboError;
use crate::scene::{OffscreenScene, OrthographicCamera};
use crate::textures::RenderTargetDescriptor;

/// Two offscreen targets with alternating read/write roles.
pub struct RenderTargetPair<R: Renderer> {
    targets: [R::Target; 2],
    a: usize,
    desc: RenderTargetDescriptor,
}

impl<R: Renderer> RenderTargetPair<R> {
    /// Allocate both targets and seed each with one render of `seed_scene`.
    ///
    /// Seeding both means the first swap never reads undefined contents.
    pub fn initialize(
        width: u32,
        height: u32,
        renderer: &mut R,
        seed_scene: &OffscreenScene<R>,
        seed_camera: &OrthographicCamera,
    ) -> Result<Self, FboError> {
        let desc = RenderTargetDescriptor::for_grid(width, height);
        let a = renderer.create_render_target(&desc)?;
        let b = renderer.create_render_target(&desc)?;
        log::debug!("Allocated {}x{} render target pair", width, height);

        for target in [&a, &b] {
            renderer.set_render_target(Some(target));
            let seeded = renderer.render(seed_scene, seed_camera);
            renderer.set_render_target(None);
            seeded?;
        }

        Ok(Self {
            targets: [a, b],
            a: 0,
            desc,
        })
    }

    /// Exchange roles and return `(read, write)` for this frame.
    ///
    /// `read` is the buffer written last frame; `write` is the other one.
    /// No data moves.
    pub fn swap(&mut self) -> (&R::Target, &R::Target) {
        self.a = 1 - self.a;
        (&self.targets[self.a], &self.targets[1 - self.a])
    }

    /// Target currently labelled A: the read source of the latest frame.
    pub fn target_a(&self) -> &R::Target {
        &self.targets[self.a]
    }

    /// Target currently labelled B: holds the most recent output.
    pub fn target_b(&self) -> &R::Target {
        &self.targets[1 - self.a]
    }

    /// Index of the underlying buffer currently labelled A.
    pub fn a_index(&self) -> usize {
        self.a
    }

    /// Underlying buffers in allocation order.
    pub fn buffers(&self) -> &[R::Target; 2] {
        &self.targets
    }

    pub fn descriptor(&self) -> &RenderTargetDescriptor {
        &self.desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{CpuKernel, CpuRenderer};
    use crate::field::{encode, PositionField};
    use crate::simulation::SimulationPass;

    fn pair(size: u32) -> (CpuRenderer, RenderTargetPair<CpuRenderer>) {
        let mut renderer = CpuRenderer::new();
        let data = renderer
            .create_data_texture(&encode(&PositionField::initial(size, size), size, size))
            .unwrap();
        let pass = SimulationPass::new(&mut renderer, CpuKernel::identity(), data, size, size).unwrap();
        let pair = RenderTargetPair::initialize(size, size, &mut renderer, pass.scene(), pass.camera()).unwrap();
        (renderer, pair)
    }

    #[test]
    fn test_both_targets_seeded() {
        let (renderer, pair) = pair(4);
        for target in pair.buffers() {
            let texels = renderer.read_texture(renderer.target_texture(target));
            assert!(texels.iter().all(|t| t.iter().all(|c| !c.is_nan())));
        }
        assert_eq!(renderer.trace().len(), 2);
    }

    #[test]
    fn test_swap_never_self_writes() {
        let (renderer, mut pair) = pair(2);
        for _ in 0..5 {
            let (read, write) = pair.swap();
            assert_ne!(renderer.target_texture(read), renderer.target_texture(write));
        }
    }

    #[test]
    fn test_two_swaps_round_trip() {
        let (renderer, mut pair) = pair(2);
        let first_read = {
            let (read, _) = pair.swap();
            renderer.target_texture(read)
        };
        let (_, write) = pair.swap();
        assert_eq!(renderer.target_texture(write), first_read);
    }

    #[test]
    fn test_swap_relabels_without_moving_buffers() {
        let (renderer, mut pair) = pair(2);
        let before: Vec<_> = pair.buffers().iter().map(|t| renderer.target_texture(t)).collect();
        let b_before = renderer.target_texture(pair.target_b());
        pair.swap();
        let after: Vec<_> = pair.buffers().iter().map(|t| renderer.target_texture(t)).collect();
        assert_eq!(before, after);
        assert_eq!(renderer.target_texture(pair.target_a()), b_before);
    }

    #[test]
    fn test_initialize_surfaces_allocation_failure() {
        let mut renderer = CpuRenderer::new().with_texel_budget(16 * 2);
        let data = renderer
            .create_data_texture(&encode(&PositionField::initial(4, 4), 4, 4))
            .unwrap();
        let pass = SimulationPass::new(&mut renderer, CpuKernel::identity(), data, 4, 4).unwrap();
        let result = RenderTargetPair::initialize(4, 4, &mut renderer, pass.scene(), pass.camera());
        assert!(matches!(result, Err(FboError::OutOfMemory(_))));
    }
}
