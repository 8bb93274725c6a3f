//! The offscreen simulation pass.
//!
//! One full-frame plane, an orthographic camera framing it exactly, and a
//! simulation program reading `posTex` and `uTime`. Rendering the scene into
//! a target runs the program once per texel, producing the next state.

use crate::backend::Renderer;
use crate::error::FboError;
use crate::scene::{OffscreenScene, OrthographicCamera, PlaneGeometry, SimulationMaterial, SimulationUniforms};

/// Offscreen scene, camera and program that advance particle state.
pub struct SimulationPass<R: Renderer> {
    scene: OffscreenScene<R>,
    camera: OrthographicCamera,
    source: R::ProgramSource,
    width: u32,
    height: u32,
}

impl<R: Renderer> SimulationPass<R> {
    /// Build the pass with `posTex` bound to `pos_tex` and `uTime` at zero.
    pub fn new(
        renderer: &mut R,
        source: R::ProgramSource,
        pos_tex: R::Texture,
        width: u32,
        height: u32,
    ) -> Result<Self, FboError> {
        let program = renderer.create_program(&source)?;
        let (w, h) = (width as f32, height as f32);
        let material = SimulationMaterial {
            program,
            uniforms: SimulationUniforms { pos_tex, time: 0.0 },
        };
        Ok(Self {
            scene: OffscreenScene::new(PlaneGeometry::new(w, h), material),
            camera: OrthographicCamera::framing(w, h),
            source,
            width,
            height,
        })
    }

    /// Reconstruct program, scene and camera from scratch around `pos_tex`.
    ///
    /// A fresh program instance is acquired so nothing keeps referring to a
    /// texture from before the rebuild. On error the pass is unchanged.
    pub fn rebuild(&mut self, renderer: &mut R, pos_tex: R::Texture) -> Result<(), FboError> {
        *self = Self::new(renderer, self.source.clone(), pos_tex, self.width, self.height)?;
        Ok(())
    }

    /// Run one simulation step: read `read`, write into `write`.
    ///
    /// Overwrites `write`'s contents and restores the default render target.
    /// If the render fails, `posTex` and `uTime` keep their previous values.
    pub fn step(
        &mut self,
        renderer: &mut R,
        read: &R::Texture,
        time: f32,
        write: &R::Target,
    ) -> Result<(), FboError> {
        let previous = std::mem::replace(
            &mut self.scene.mesh.material.uniforms,
            SimulationUniforms {
                pos_tex: read.clone(),
                time,
            },
        );

        renderer.set_render_target(Some(write));
        let result = renderer.render(&self.scene, &self.camera);
        renderer.set_render_target(None);

        if result.is_err() {
            self.scene.mesh.material.uniforms = previous;
        }
        result
    }

    pub fn scene(&self) -> &OffscreenScene<R> {
        &self.scene
    }

    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    /// Texture currently bound as `posTex`.
    pub fn pos_tex(&self) -> &R::Texture {
        &self.scene.mesh.material.uniforms.pos_tex
    }

    /// Current `uTime`.
    pub fn time(&self) -> f32 {
        self.scene.mesh.material.uniforms.time
    }

    pub fn program(&self) -> &R::Program {
        &self.scene.mesh.material.program
    }
}
