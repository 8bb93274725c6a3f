//! Initial particle positions.
//!
//! A [`PositionField`] is a W×H grid of `(x, y, z)` triples, one per
//! particle, stored flat. Cell `(x, y)` lives at `(x * H + y) * 3` and starts
//! at `(x / W, y / H, 0)`.
//!
//! ```ignore
//! let field = PositionField::initial(512, 512);
//! let texture = encode(&field, 512, 512);
//! ```

use crate::textures::PositionTexture;

/// Number of float components stored per particle in a [`PositionField`].
pub const COMPONENTS: usize = 3;

/// Flat buffer of particle positions for a W×H grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionField {
    data: Vec<f32>,
    width: u32,
    height: u32,
}

impl PositionField {
    /// Deterministically lay particles out on the unit square.
    ///
    /// Reproducible for a given size, so it doubles as the reset baseline.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn initial(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "position field must be non-empty");

        let (w, h) = (width as f32, height as f32);
        let mut data = Vec::with_capacity(width as usize * height as usize * COMPONENTS);
        for x in 0..width {
            for y in 0..height {
                data.push(x as f32 / w);
                data.push(y as f32 / h);
                data.push(0.0);
            }
        }

        Self { data, width, height }
    }

    /// Wrap an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != width * height * 3`. A mismatched buffer is a
    /// programming error; it is never truncated or padded.
    pub fn from_raw(data: Vec<f32>, width: u32, height: u32) -> Self {
        assert_eq!(
            data.len(),
            expected_len(width, height),
            "position data length does not match a {}x{} grid",
            width,
            height
        );
        Self { data, width, height }
    }

    /// Grid width in particles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in particles.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of particles.
    pub fn particle_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Position of grid cell `(x, y)`.
    pub fn cell(&self, x: u32, y: u32) -> [f32; 3] {
        let i = (x as usize * self.height as usize + y as usize) * COMPONENTS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Position of the particle at flat index `i`.
    pub fn particle(&self, i: usize) -> [f32; 3] {
        let i = i * COMPONENTS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Raw component buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Expected buffer length for a W×H grid.
pub fn expected_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * COMPONENTS
}

/// Build the reset baseline for a `width`×`height` grid.
pub fn generate_initial_field(width: u32, height: u32) -> PositionField {
    PositionField::initial(width, height)
}

/// Encode a field as a nearest-filtered, repeat-wrapped float texture.
///
/// # Panics
///
/// Panics if the field's length is not `width * height * 3`.
pub fn encode(field: &PositionField, width: u32, height: u32) -> PositionTexture {
    assert_eq!(
        field.as_slice().len(),
        expected_len(width, height),
        "position field does not match declared {}x{} texture",
        width,
        height
    );
    PositionTexture::from_rgb(field.as_slice(), width, height)
}
