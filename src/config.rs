//! Pipeline and window configuration.

use crate::shaders::SIMULATION_SHADER;

/// Configuration for a particle pipeline and the window showing it.
///
/// ```ignore
/// let config = FboConfig::new()
///     .with_size(256, 256)
///     .with_point_size(0.006)
///     .with_title("Swirl");
/// ```
#[derive(Debug, Clone)]
pub struct FboConfig {
    /// Particle grid width (texels per row).
    pub width: u32,
    /// Particle grid height (texel rows).
    pub height: u32,
    /// Sprite half-size in clip space.
    pub point_size: f32,
    /// Window title.
    pub title: String,
    /// Background color of the composite pass.
    pub clear_color: [f64; 4],
    /// WGSL simulation program for the wgpu backend.
    pub simulation_shader: String,
    /// Seconds per frame for the simulation clock. `None` follows wall time.
    pub fixed_delta: Option<f32>,
}

impl Default for FboConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            point_size: 0.004,
            title: "FBO Particles".to_string(),
            clear_color: [0.02, 0.02, 0.04, 1.0],
            simulation_shader: SIMULATION_SHADER.to_string(),
            fixed_delta: None,
        }
    }
}

impl FboConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the particle grid size.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "particle grid must be non-empty");
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_point_size(mut self, point_size: f32) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_clear_color(mut self, color: [f64; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Replace the simulation program. It must keep the default program's
    /// bindings and entry points.
    pub fn with_simulation_shader(mut self, wgsl: impl Into<String>) -> Self {
        self.simulation_shader = wgsl.into();
        self
    }

    /// Step the clock by a fixed amount per frame instead of wall time.
    pub fn with_fixed_delta(mut self, delta: f32) -> Self {
        self.fixed_delta = Some(delta);
        self
    }

    /// Number of particles in the grid.
    pub fn particle_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_512_square() {
        let config = FboConfig::default();
        assert_eq!((config.width, config.height), (512, 512));
        assert_eq!(config.fixed_delta, None);
        assert_eq!(config.particle_count(), 262_144);
    }

    #[test]
    fn test_builder_chain() {
        let config = FboConfig::new()
            .with_size(64, 32)
            .with_point_size(0.01)
            .with_title("test")
            .with_simulation_shader("// custom")
            .with_fixed_delta(1.0 / 30.0);
        assert_eq!((config.width, config.height), (64, 32));
        assert_eq!(config.particle_count(), 2048);
        assert_eq!(config.fixed_delta, Some(1.0 / 30.0));
        assert_eq!(config.title, "test");
        assert_eq!(config.simulation_shader, "// custom");
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn test_zero_size_rejected() {
        FboConfig::new().with_size(0, 8);
    }
}
