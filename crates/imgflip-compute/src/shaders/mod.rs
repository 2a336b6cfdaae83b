//! WGSL shader sources for the flip compute pipelines.

#![cfg_attr(not(feature = "wgpu"), allow(dead_code))]

/// Flip kernels: one entry point per kernel name.
///
/// `{block}` is replaced with the work group side before compilation.
/// Bindings are shared by all entry points; `dims` always describes the
/// source image.
pub const FLIP: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // src_w, src_h, c, 0

fn copy_pixel(sx: u32, sy: u32, dx: u32, dy: u32, dst_w: u32) {
    let c = dims.z;
    let src_idx = (sy * dims.x + sx) * c;
    let dst_idx = (dy * dst_w + dx) * c;

    for (var ch = 0u; ch < c; ch = ch + 1u) {
        dst[dst_idx + ch] = src[src_idx + ch];
    }
}

@compute @workgroup_size({block}, {block})
fn FlipXAxis(@builtin(global_invocation_id) id: vec3<u32>) {
    let w = dims.x;
    let h = dims.y;
    if id.x >= w || id.y >= h { return; }

    copy_pixel(w - 1u - id.x, id.y, id.x, id.y, w);
}

@compute @workgroup_size({block}, {block})
fn FlipYAxis(@builtin(global_invocation_id) id: vec3<u32>) {
    let w = dims.x;
    let h = dims.y;
    if id.x >= w || id.y >= h { return; }

    copy_pixel(id.x, h - 1u - id.y, id.x, id.y, w);
}

@compute @workgroup_size({block}, {block})
fn FlipDiag(@builtin(global_invocation_id) id: vec3<u32>) {
    // output is src_h x src_w
    let out_w = dims.y;
    let out_h = dims.x;
    if id.x >= out_w || id.y >= out_h { return; }

    copy_pixel(id.y, id.x, id.x, id.y, out_w);
}
"#;

/// Flip shader source specialized for `block x block` work groups.
pub fn flip_source(block: u32) -> String {
    FLIP.replace("{block}", &block.to_string())
}
