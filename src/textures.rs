//! Texture descriptions shared by every backend.
//!
//! Position data travels as four-channel float texels: `(x, y, z, 1.0)`.
//! The fourth channel is padding, since wgpu has no three-channel float
//! format. Both the data texture and the render targets sample with
//! nearest filtering and repeat addressing, so each texel stays an exact,
//! independent particle state.

/// Texel format of position textures and render targets.
pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// One position-encoding texel.
pub type Texel = [f32; 4];

/// Filter mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Sharp nearest-neighbor filtering. The only mode position data tolerates.
    #[default]
    Nearest,
    /// Linear filtering. Blends neighbouring particles; display-only data.
    Linear,
}

impl From<FilterMode> for wgpu::FilterMode {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// Address mode for texture wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// Repeat/tile the texture. Coordinates wrap around.
    #[default]
    Repeat,
    /// Clamp to edge texels.
    ClampToEdge,
}

impl From<AddressMode> for wgpu::AddressMode {
    fn from(mode: AddressMode) -> Self {
        match mode {
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        }
    }
}

/// How a texture is sampled along both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sampling {
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Addressing for u and v.
    pub address_mode: AddressMode,
}

impl Sampling {
    /// Nearest on both axes, repeat-wrapped.
    pub const POSITIONS: Sampling = Sampling {
        mag_filter: FilterMode::Nearest,
        min_filter: FilterMode::Nearest,
        address_mode: AddressMode::Repeat,
    };

    /// Sampler descriptor for wgpu.
    pub fn sampler_descriptor(&self, label: &'static str) -> wgpu::SamplerDescriptor<'static> {
        let address_mode = self.address_mode.into();
        wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: self.mag_filter.into(),
            min_filter: self.min_filter.into(),
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        }
    }

    /// Resolve a normalized coordinate to a texel index with nearest sampling.
    pub fn texel_index(&self, uv: [f32; 2], width: u32, height: u32) -> (u32, u32) {
        (
            self.wrap((uv[0] * width as f32).floor() as i64, width),
            self.wrap((uv[1] * height as f32).floor() as i64, height),
        )
    }

    fn wrap(&self, i: i64, size: u32) -> u32 {
        let size = size as i64;
        match self.address_mode {
            AddressMode::Repeat => i.rem_euclid(size) as u32,
            AddressMode::ClampToEdge => i.clamp(0, size - 1) as u32,
        }
    }
}

/// CPU-side image of a position texture, ready for upload.
///
/// Created once from the initial field and replaced wholesale on reset.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionTexture {
    /// Row-major texels; texel `i` holds particle `i`.
    pub texels: Vec<Texel>,
    /// Texture width in texels.
    pub width: u32,
    /// Texture height in texels.
    pub height: u32,
    /// Sampler state used when this texture is read.
    pub sampling: Sampling,
}

impl PositionTexture {
    /// Pack an `(x, y, z)` buffer into padded texels.
    ///
    /// # Panics
    ///
    /// Panics if `rgb.len() != width * height * 3`.
    pub fn from_rgb(rgb: &[f32], width: u32, height: u32) -> Self {
        assert_eq!(
            rgb.len(),
            width as usize * height as usize * 3,
            "RGB data size mismatch"
        );
        let texels = rgb
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2], 1.0])
            .collect();
        Self {
            texels,
            width,
            height,
            sampling: Sampling::POSITIONS,
        }
    }

    /// Texel at column `x`, row `y`.
    pub fn texel(&self, x: u32, y: u32) -> Texel {
        self.texels[(y * self.width + x) as usize]
    }

    /// Texel data as bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Bytes per texel row.
    pub fn bytes_per_row(&self) -> u32 {
        self.width * std::mem::size_of::<Texel>() as u32
    }
}

/// Allocation parameters for an offscreen render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetDescriptor {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Sampler state when the target's texture is read.
    pub sampling: Sampling,
    /// Whether a stencil attachment is allocated.
    pub stencil: bool,
}

impl RenderTargetDescriptor {
    /// Float color target covering a `width`×`height` particle grid, no stencil.
    ///
    /// For square grids this is W×W; other grids keep both axes.
    pub fn for_grid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sampling: Sampling::POSITIONS,
            stencil: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_pads_alpha() {
        let tex = PositionTexture::from_rgb(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 2, 1);
        assert_eq!(tex.texels, vec![[0.1, 0.2, 0.3, 1.0], [0.4, 0.5, 0.6, 1.0]]);
        assert_eq!(tex.sampling, Sampling::POSITIONS);
        assert_eq!(tex.bytes_per_row(), 32);
        assert_eq!(tex.as_bytes().len(), 32);
    }

    #[test]
    #[should_panic(expected = "RGB data size mismatch")]
    fn test_from_rgb_rejects_mismatch() {
        PositionTexture::from_rgb(&[0.0; 5], 1, 2);
    }

    #[test]
    fn test_nearest_repeat_lookup() {
        let s = Sampling::POSITIONS;
        assert_eq!(s.texel_index([0.0, 0.0], 4, 4), (0, 0));
        assert_eq!(s.texel_index([0.99, 0.5], 4, 4), (3, 2));
        assert_eq!(s.texel_index([1.0, -0.1], 4, 4), (0, 3));
    }

    #[test]
    fn test_clamp_lookup() {
        let s = Sampling {
            address_mode: AddressMode::ClampToEdge,
            ..Sampling::POSITIONS
        };
        assert_eq!(s.texel_index([1.5, -0.5], 4, 4), (3, 0));
    }

    #[test]
    fn test_render_target_tracks_both_axes() {
        let desc = RenderTargetDescriptor::for_grid(512, 256);
        assert_eq!((desc.width, desc.height), (512, 256));
        assert!(!desc.stencil);
    }

    #[test]
    fn test_sampler_descriptor_is_nearest_repeat() {
        let desc = Sampling::POSITIONS.sampler_descriptor("positions");
        assert_eq!(desc.mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(desc.min_filter, wgpu::FilterMode::Nearest);
        assert_eq!(desc.address_mode_u, wgpu::AddressMode::Repeat);
        assert_eq!(desc.address_mode_v, wgpu::AddressMode::Repeat);
    }
}
