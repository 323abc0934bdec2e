/// WGSL for the raycast display pass: rasterize the unit cube, march each
/// fragment's ray through the volume, stop at the first threshold
/// crossing of the v channel.
pub const RAYCAST_SHADER: &str = r#"
struct DisplayParams {
    view_proj: mat4x4<f32>,
    normal_mat: mat3x3<f32>,
    camera_obj: vec3<f32>,
    depth: f32,
    threshold: f32,
    steps: f32,
    shade_mode: u32,
    _pad: f32,
};

@group(0) @binding(0) var<uniform> params: DisplayParams;
@group(0) @binding(1) var map: texture_2d_array<f32>;
@group(0) @binding(2) var map_sampler: sampler;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) pos_obj: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.clip = params.view_proj * vec4<f32>(position, 1.0);
    out.pos_obj = position;
    return out;
}

// Slab test against the unit cube centered at the origin. Returns
// (entry, exit); entry > exit means a miss.
fn hit_box(orig: vec3<f32>, dir: vec3<f32>) -> vec2<f32> {
    let box_min = vec3<f32>(-0.5);
    let box_max = vec3<f32>(0.5);
    let inv_dir = 1.0 / dir;
    let tmin_tmp = (box_min - orig) * inv_dir;
    let tmax_tmp = (box_max - orig) * inv_dir;
    let tmin = min(tmin_tmp, tmax_tmp);
    let tmax = max(tmin_tmp, tmax_tmp);
    let t0 = max(tmin.x, max(tmin.y, tmin.z));
    let t1 = min(tmax.x, min(tmax.y, tmax.z));
    return vec2<f32>(t0, t1);
}

// The v channel at a normalized volume coordinate: bilinear in-plane,
// manual lerp across the two nearest depth layers.
fn sample_v(p: vec3<f32>) -> f32 {
    let layers = i32(params.depth);
    let zf = clamp(p.z, 0.0, 1.0) * params.depth - 0.5;
    let z0 = clamp(i32(floor(zf)), 0, layers - 1);
    let z1 = min(z0 + 1, layers - 1);
    let t = clamp(zf - f32(z0), 0.0, 1.0);
    let v0 = textureSampleLevel(map, map_sampler, p.xy, z0, 0.0).y;
    let v1 = textureSampleLevel(map, map_sampler, p.xy, z1, 0.0).y;
    return mix(v0, v1, t);
}

// Central-difference gradient normal, with face normals near the cube
// boundary where one-sided samples would make the gradient noisy.
fn surface_normal(p: vec3<f32>) -> vec3<f32> {
    let eps = 0.01;
    let h = 0.01;
    var n = vec3<f32>(
        sample_v(p - vec3<f32>(h, 0.0, 0.0)) - sample_v(p + vec3<f32>(h, 0.0, 0.0)),
        sample_v(p - vec3<f32>(0.0, h, 0.0)) - sample_v(p + vec3<f32>(0.0, h, 0.0)),
        sample_v(p - vec3<f32>(0.0, 0.0, h)) - sample_v(p + vec3<f32>(0.0, 0.0, h)),
    );
    if (dot(n, n) < 1e-8) {
        n = vec3<f32>(0.0, 0.0, 1.0);
    }
    if (p.x < eps) { n = vec3<f32>(-1.0, 0.0, 0.0); }
    if (p.y < eps) { n = vec3<f32>(0.0, -1.0, 0.0); }
    if (p.z < eps) { n = vec3<f32>(0.0, 0.0, -1.0); }
    if (p.x > 1.0 - eps) { n = vec3<f32>(1.0, 0.0, 0.0); }
    if (p.y > 1.0 - eps) { n = vec3<f32>(0.0, 1.0, 0.0); }
    if (p.z > 1.0 - eps) { n = vec3<f32>(0.0, 0.0, 1.0); }
    return normalize(params.normal_mat * n);
}

fn shade(p: vec3<f32>, v: f32) -> vec4<f32> {
    if (params.shade_mode == 0u) {
        return vec4<f32>(v, v, v, v);
    }
    let n = surface_normal(p);
    let light_dir = normalize(vec3<f32>(0.3, 0.4, 1.0));
    let ambient = 0.2;
    let diffuse = max(dot(n, light_dir), 0.0);
    let lighting = ambient + diffuse * 0.8;
    return vec4<f32>(vec3<f32>(0.55, 0.85, 0.75) * lighting, 1.0);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let dir = normalize(in.pos_obj - params.camera_obj);
    let bounds = hit_box(params.camera_obj, dir);
    if (bounds.x > bounds.y) {
        discard;
        return vec4<f32>(0.0);
    }

    let t0 = max(bounds.x, 0.0);
    let inc = 1.0 / abs(dir);
    let delta = min(inc.x, min(inc.y, inc.z)) / params.steps;

    for (var t = t0; t < bounds.y; t += delta) {
        let p = params.camera_obj + dir * t + vec3<f32>(0.5);
        let v = sample_v(p);
        if (v > params.threshold) {
            return shade(p, v);
        }
    }

    discard;
    return vec4<f32>(0.0);
}
"#;
