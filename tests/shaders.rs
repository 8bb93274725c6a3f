//! The built-in WGSL programs must parse and validate, and keep the
//! binding layout the wgpu backend creates for them.

use fbo_particles::shaders::{DISPLAY_SHADER, SIMULATION_SHADER};

fn validate(source: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(module)
}

fn entry_points(module: &naga::Module) -> Vec<(&str, naga::ShaderStage)> {
    module
        .entry_points
        .iter()
        .map(|ep| (ep.name.as_str(), ep.stage))
        .collect()
}

fn bindings(module: &naga::Module) -> Vec<u32> {
    let mut bindings: Vec<u32> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| var.binding.as_ref())
        .inspect(|b| assert_eq!(b.group, 0))
        .map(|b| b.binding)
        .collect();
    bindings.sort_unstable();
    bindings
}

#[test]
fn test_simulation_shader_validates() {
    let module = validate(SIMULATION_SHADER).expect("simulation shader should be valid");
    assert_eq!(
        entry_points(&module),
        vec![("vs_main", naga::ShaderStage::Vertex), ("fs_main", naga::ShaderStage::Fragment)]
    );
    assert_eq!(bindings(&module), vec![0, 1, 2]);
}

#[test]
fn test_display_shader_validates() {
    let module = validate(DISPLAY_SHADER).expect("display shader should be valid");
    assert_eq!(
        entry_points(&module),
        vec![("vs_main", naga::ShaderStage::Vertex), ("fs_main", naga::ShaderStage::Fragment)]
    );
    assert_eq!(bindings(&module), vec![0, 1, 2]);
}

#[test]
fn test_broken_shader_is_rejected() {
    let broken = SIMULATION_SHADER.replace("fn fs_main", "fn fs_main(");
    assert!(validate(&broken).is_err());
}
