//! Default WGSL programs for the wgpu backend.
//!
//! Both programs share one bind group layout: the position texture at
//! binding 0, a non-filtering sampler at binding 1 and a uniform block at
//! binding 2. Replacement programs must keep that layout and the entry
//! points `vs_main` / `fs_main`.

/// Simulation program: reads `posTex`, writes the next position texel.
///
/// Particles swirl slowly about the centre of the unit square while a
/// radial wave driven by `uTime` lifts them in z.
pub const SIMULATION_SHADER: &str = r#"
struct SimUniforms {
    proj: mat4x4<f32>,
    time: f32,
};

@group(0) @binding(0)
var pos_tex: texture_2d<f32>;
@group(0) @binding(1)
var pos_sampler: sampler;
@group(0) @binding(2)
var<uniform> uniforms: SimUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.proj * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let p = textureSampleLevel(pos_tex, pos_sampler, in.uv, 0.0);

    let centered = p.xy - vec2<f32>(0.5, 0.5);
    let r = length(centered);
    let angle = 0.002 * (1.0 - r);
    let c = cos(angle);
    let s = sin(angle);
    let rotated = vec2<f32>(
        c * centered.x - s * centered.y,
        s * centered.x + c * centered.y,
    );

    let z = 0.05 * sin(uniforms.time * 2.0 + r * 20.0);
    return vec4<f32>(rotated + vec2<f32>(0.5, 0.5), z, 1.0);
}
"#;

/// Display program: places one sprite per particle at `posMap(u, v)`.
pub const DISPLAY_SHADER: &str = r#"
struct DisplayUniforms {
    view_proj: mat4x4<f32>,
    offset: vec3<f32>,
    point_size: f32,
};

@group(0) @binding(0)
var pos_map: texture_2d<f32>;
@group(0) @binding(1)
var pos_sampler: sampler;
@group(0) @binding(2)
var<uniform> uniforms: DisplayUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) quad: vec2<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) lookup: vec3<f32>,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];

    let pos = textureSampleLevel(pos_map, pos_sampler, lookup.xy, 0.0).xyz;
    var clip_pos = uniforms.view_proj * vec4<f32>(pos + uniforms.offset, 1.0);
    clip_pos.x += quad_pos.x * uniforms.point_size * clip_pos.w;
    clip_pos.y += quad_pos.y * uniforms.point_size * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.quad = quad_pos;
    out.color = vec3<f32>(pos.x, pos.y, 1.0 - 0.5 * pos.x);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.quad);
    if dist > 1.0 {
        discard;
    }
    let alpha = (1.0 - smoothstep(0.5, 1.0, dist)) * 0.8;
    return vec4<f32>(in.color, alpha);
}
"#;
