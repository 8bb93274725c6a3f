//! Offscreen scene objects: the orthographic camera, the full-frame plane,
//! and the simulation material bound to it.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::backend::Renderer;

/// Name of the single mesh in the simulation scene.
pub const FBO_MESH_NAME: &str = "fboMesh";

/// Orthographic camera bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthographicCamera {
    /// Camera framing exactly a `width`×`height` plane centred on the origin.
    ///
    /// Near is -1 and far is 1: the pass is a depth-less 2D blit and the
    /// plane at z = 0 must land inside the clip volume.
    pub fn framing(width: f32, height: f32) -> Self {
        Self {
            left: -width / 2.0,
            right: width / 2.0,
            top: height / 2.0,
            bottom: -height / 2.0,
            near: -1.0,
            far: 1.0,
        }
    }

    /// Projection matrix into wgpu clip space.
    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }

    /// Project a plane-space point to normalized device coordinates.
    pub fn to_ndc(&self, position: [f32; 3]) -> [f32; 3] {
        let clip = self.projection() * Vec4::new(position[0], position[1], position[2], 1.0);
        [clip.x / clip.w, clip.y / clip.w, clip.z / clip.w]
    }
}

/// Vertex of the full-frame plane.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PlaneVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Flat rectangle in the z = 0 plane, centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Two triangles covering the plane. `uv.v` is 0 along the top edge, so
    /// texel rows line up with framebuffer rows.
    pub fn vertices(&self) -> [PlaneVertex; 6] {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let v = |x: f32, y: f32, u: f32, v: f32| PlaneVertex {
            position: [x, y, 0.0],
            uv: [u, v],
        };
        let top_left = v(-hw, hh, 0.0, 0.0);
        let top_right = v(hw, hh, 1.0, 0.0);
        let bottom_left = v(-hw, -hh, 0.0, 1.0);
        let bottom_right = v(hw, -hh, 1.0, 1.0);
        [bottom_left, bottom_right, top_left, top_left, bottom_right, top_right]
    }

    /// Plane-space extent as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> [f32; 4] {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        [-hw, -hh, hw, hh]
    }
}

/// Uniform values consumed by the simulation program.
#[derive(Debug, Clone)]
pub struct SimulationUniforms<T> {
    /// Authoritative positions from the previous step (`posTex`).
    pub pos_tex: T,
    /// Simulation clock (`uTime`).
    pub time: f32,
}

/// A simulation program together with its bound uniforms.
pub struct SimulationMaterial<R: Renderer> {
    pub program: R::Program,
    pub uniforms: SimulationUniforms<R::Texture>,
}

/// The one mesh of the offscreen scene.
pub struct QuadMesh<R: Renderer> {
    pub name: &'static str,
    pub geometry: PlaneGeometry,
    pub material: SimulationMaterial<R>,
}

/// Scene rendered by the simulation pass. Holds exactly one mesh.
pub struct OffscreenScene<R: Renderer> {
    pub mesh: QuadMesh<R>,
}

impl<R: Renderer> OffscreenScene<R> {
    /// Scene with a single `geometry`-sized plane driven by `material`.
    pub fn new(geometry: PlaneGeometry, material: SimulationMaterial<R>) -> Self {
        Self {
            mesh: QuadMesh {
                name: FBO_MESH_NAME,
                geometry,
                material,
            },
        }
    }
}
