//! End-to-end tests for the ping-pong pipeline on the CPU backend.
//!
//! These drive a full [`FrameDriver`] and inspect the renderer's trace and
//! texture contents, so they cover the frame ordering, the one-frame lag
//! between simulation and display, and the reset baseline.

use fbo_particles::cpu::RenderEvent;
use fbo_particles::field::{encode, expected_len, PositionField};
use fbo_particles::textures::Sampling;
use fbo_particles::{CpuKernel, CpuRenderer, FboConfig, FrameDriver, FrameState, Renderer};
use rand::Rng;

// ============================================================================
// Helpers
// ============================================================================

/// Moves every particle +1 along x per render.
fn advance_x() -> CpuKernel {
    CpuKernel::new("advance_x", |t, _, _| [t[0] + 1.0, t[1], t[2], t[3]])
}

fn driver(width: u32, height: u32, kernel: CpuKernel) -> FrameDriver<CpuRenderer> {
    let config = FboConfig::new().with_size(width, height);
    FrameDriver::new(CpuRenderer::new(), &config, kernel).expect("driver should initialize")
}

fn published_texels(driver: &FrameDriver<CpuRenderer>) -> Vec<[f32; 4]> {
    driver.renderer().read_texture(*driver.display().pos_map())
}

fn last_render(driver: &FrameDriver<CpuRenderer>) -> RenderEvent {
    *driver.renderer().trace().last().expect("at least one render")
}

// ============================================================================
// Field Generation
// ============================================================================

#[test]
fn test_initial_field_for_random_sizes() {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let w = rng.gen_range(1..=48);
        let h = rng.gen_range(1..=48);
        let field = PositionField::initial(w, h);

        assert_eq!(field.as_slice().len(), expected_len(w, h));
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        let idx = (x as usize * h as usize + y as usize) * 3;
        assert_eq!(field.as_slice()[idx], x as f32 / w as f32);
        assert_eq!(field.as_slice()[idx + 1], y as f32 / h as f32);
        assert_eq!(field.as_slice()[idx + 2], 0.0);
    }
}

#[test]
fn test_initial_field_is_reproducible() {
    assert_eq!(PositionField::initial(33, 17), PositionField::initial(33, 17));
}

#[test]
fn test_encode_keeps_particle_order() {
    let field = PositionField::initial(6, 3);
    let texture = encode(&field, 6, 3);
    assert_eq!(texture.texels.len(), 18);
    for (i, texel) in texture.texels.iter().enumerate() {
        let [x, y, z] = field.particle(i);
        assert_eq!(*texel, [x, y, z, 1.0]);
    }
}

#[test]
#[should_panic(expected = "does not match declared")]
fn test_encode_rejects_wrong_dimensions() {
    let field = PositionField::initial(4, 4);
    let _ = encode(&field, 4, 5);
}

// ============================================================================
// Initialization
// ============================================================================

#[test]
fn test_both_targets_seeded_from_data_texture() {
    let driver = driver(8, 8, CpuKernel::identity());
    let renderer = driver.renderer();
    let expected = renderer.read_texture(*driver.data_texture());

    for target in driver.targets().buffers() {
        let texels = renderer.read_texture(renderer.target_texture(target));
        assert_eq!(texels, expected);
    }

    // Seeding is two renders from the data texture, one into each buffer
    let trace = renderer.trace();
    assert_eq!(trace.len(), 2);
    for event in trace {
        let RenderEvent::Render { source, .. } = *event;
        assert_eq!(source, *driver.data_texture());
    }
}

#[test]
fn test_targets_cover_non_square_grid() {
    let driver = driver(16, 4, CpuKernel::identity());
    let desc = driver.targets().descriptor();
    assert_eq!((desc.width, desc.height), (16, 4));
    assert!(!desc.stencil);
    assert_eq!(desc.sampling, Sampling::POSITIONS);
}

// ============================================================================
// Frame Ordering
// ============================================================================

#[test]
fn test_no_render_reads_its_own_target() {
    let mut driver = driver(8, 8, advance_x());
    for frame in 0..10 {
        driver.tick(frame as f32 * 0.016).unwrap();
    }
    for event in driver.renderer().trace() {
        let RenderEvent::Render { source, target, .. } = *event;
        assert_ne!(source, target);
    }
}

#[test]
fn test_each_frame_reads_previous_output() {
    let mut driver = driver(4, 4, advance_x());
    driver.tick(0.0).unwrap();
    let mut previous = last_render(&driver);

    for frame in 1..8 {
        driver.tick(frame as f32).unwrap();
        let current = last_render(&driver);
        let RenderEvent::Render { source: prev_source, target: prev_target, .. } = previous;
        let RenderEvent::Render { source, target, .. } = current;
        assert_eq!(source, prev_target);
        assert_eq!(target, prev_source);
        previous = current;
    }
}

#[test]
fn test_published_texture_is_this_frames_write_target() {
    let mut driver = driver(4, 4, advance_x());
    for frame in 0..5 {
        let time = frame as f32 * 0.5;
        driver.tick(time).unwrap();

        let RenderEvent::Render { program, source, target, time: seen } = last_render(&driver);
        let renderer = driver.renderer();
        assert_eq!(*driver.display().pos_map(), target);
        assert_eq!(target, renderer.target_texture(driver.targets().target_b()));
        assert_eq!(source, renderer.target_texture(driver.targets().target_a()));
        assert_eq!(program, driver.simulation().program().id());
        assert_eq!(seen, time);
        assert_eq!(driver.simulation().time(), time);
        assert_eq!(renderer.current_target(), None);
    }
}

#[test]
fn test_two_swaps_restore_labels() {
    let mut driver = driver(4, 4, CpuKernel::identity());
    let start = driver.targets().a_index();
    driver.tick(0.0).unwrap();
    assert_ne!(driver.targets().a_index(), start);
    driver.tick(0.1).unwrap();
    assert_eq!(driver.targets().a_index(), start);
}

// ============================================================================
// Simulation Lag
// ============================================================================

#[test]
fn test_display_shows_exactly_one_step_per_tick() {
    let mut driver = driver(4, 4, advance_x());
    let field = driver.field().clone();

    // Seeding applied the kernel once
    for (i, texel) in published_texels(&driver).iter().enumerate() {
        assert!((texel[0] - (field.particle(i)[0] + 1.0)).abs() < 1e-5);
    }

    for k in 1..=6 {
        driver.tick(k as f32).unwrap();
        for (i, texel) in published_texels(&driver).iter().enumerate() {
            let expected = field.particle(i)[0] + 1.0 + k as f32;
            assert!((texel[0] - expected).abs() < 1e-4, "frame {} particle {}", k, i);
            assert_eq!(texel[1], field.particle(i)[1]);
        }
        assert_eq!(driver.frame(), k);
    }
}

#[test]
fn test_read_side_lags_published_by_one_step() {
    let mut driver = driver(4, 4, advance_x());
    driver.tick(0.0).unwrap();
    driver.tick(1.0).unwrap();

    let renderer = driver.renderer();
    let a = renderer.read_texture(renderer.target_texture(driver.targets().target_a()));
    let b = renderer.read_texture(renderer.target_texture(driver.targets().target_b()));
    for (old, new) in a.iter().zip(&b) {
        assert!((new[0] - old[0] - 1.0).abs() < 1e-5);
    }
}

// ============================================================================
// Display Geometry
// ============================================================================

#[test]
fn test_vertex_i_samples_particle_i() {
    let (w, h) = (8, 4);
    let driver = driver(w, h, CpuKernel::identity());
    let renderer = driver.renderer();
    let field = driver.field();
    let published = *driver.display().pos_map();

    let geometry = driver.display().geometry();
    assert_eq!(geometry.len(), field.particle_count());
    for (i, vertex) in geometry.iter().enumerate() {
        let [u, v, z] = vertex.lookup;
        assert_eq!(z, 0.0);
        let (x, y) = Sampling::POSITIONS.texel_index([u, v], w, h);
        let texel = renderer.texel(published, x, y);
        assert_eq!([texel[0], texel[1], texel[2]], field.particle(i));
    }
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn test_reset_restores_baseline_at_default_size() {
    let mut driver = driver(512, 512, advance_x());
    let baseline = published_texels(&driver);

    for frame in 0..3 {
        driver.tick(frame as f32).unwrap();
    }
    assert_ne!(published_texels(&driver), baseline);

    driver.reset().unwrap();
    assert_eq!(driver.state(), FrameState::Ready);
    assert_eq!(*driver.field(), PositionField::initial(512, 512));
    assert_eq!(driver.field().cell(10, 20), [10.0 / 512.0, 20.0 / 512.0, 0.0]);
    assert_eq!(published_texels(&driver), baseline);
}

#[test]
fn test_reset_rebinds_fresh_program_and_texture() {
    let mut driver = driver(4, 4, advance_x());
    driver.tick(0.0).unwrap();
    let old_program = driver.simulation().program().id();
    let old_targets: Vec<_> = driver
        .targets()
        .buffers()
        .iter()
        .map(|t| driver.renderer().target_texture(t))
        .collect();

    driver.reset().unwrap();

    assert_ne!(driver.simulation().program().id(), old_program);
    assert_eq!(*driver.simulation().pos_tex(), *driver.data_texture());
    assert_eq!(driver.simulation().time(), 0.0);
    for target in driver.targets().buffers() {
        assert!(!old_targets.contains(&driver.renderer().target_texture(target)));
    }

    // The first tick after a reset behaves like the first tick after init
    driver.tick(0.0).unwrap();
    let field = driver.field().clone();
    for (i, texel) in published_texels(&driver).iter().enumerate() {
        assert!((texel[0] - (field.particle(i)[0] + 2.0)).abs() < 1e-5);
    }
}
