//! Validate the shipped WGSL through naga, so shader breakage shows up in
//! `cargo test` instead of at pipeline creation on someone's GPU.

fn validate_wgsl(code: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(code)
        .map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(())
}

#[test]
fn flock_kernel_validates() {
    let source = include_str!("../src/shaders/flock.wgsl");
    if let Err(e) = validate_wgsl(source) {
        panic!("flock.wgsl failed validation: {}", e);
    }
}

#[test]
fn render_shader_validates() {
    let source = include_str!("../src/shaders/render.wgsl");
    if let Err(e) = validate_wgsl(source) {
        panic!("render.wgsl failed validation: {}", e);
    }
}

#[test]
fn flock_kernel_specializes_per_granularity() {
    // The simulation rewrites the workgroup size per species; every legal
    // granularity must still produce a valid module.
    let base = include_str!("../src/shaders/flock.wgsl");
    assert!(base.contains("@workgroup_size(256)"));

    for granularity in [1u32, 16, 64, 128, 256] {
        let specialized = base.replace(
            "@workgroup_size(256)",
            &format!("@workgroup_size({})", granularity),
        );
        if let Err(e) = validate_wgsl(&specialized) {
            panic!("granularity {} failed validation: {}", granularity, e);
        }
    }
}
