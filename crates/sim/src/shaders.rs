//! WGSL generation for the tiled simulation passes.
//!
//! A pass writes up to K depth layers at once, one color target each, so
//! the fragment output struct is generated for the exact target count: the
//! device cap for full tiles, and once more for the short final tile when
//! the depth is not a multiple of K. Each target derives its absolute
//! depth from the per-tile `start_z` uniform.

use morphogen_common::ModelKind;

/// Per-tile uniform, vertex stage, and the stencil/drift scaffold shared
/// by every model.
const SIM_SCAFFOLD: &str = r#"
struct SimParams {
    wind_dir: vec3<f32>,
    wind: f32,
    gravity_pos: vec3<f32>,
    gravity: f32,
    // rates.xy = diffusion (Du, Dv); rates.zw and extra.x are
    // model-specific reaction constants.
    rates: vec4<f32>,
    extra: vec4<f32>,
    size: vec3<u32>,
    boundary: u32,
    pause: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

struct TileParams {
    start_z: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

@group(0) @binding(0) var<uniform> params: SimParams;
@group(0) @binding(1) var<uniform> tile: TileParams;
@group(0) @binding(2) var map: texture_2d_array<f32>;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.clip = vec4<f32>(position, 0.0, 1.0);
    return out;
}

fn load_cell(cell: vec3<i32>) -> vec2<f32> {
    return textureLoad(map, cell.xy, cell.z, 0).xy;
}

// Neighbor fetch honoring the boundary mode. Returns (u, v, weight);
// weight 0 drops the neighbor from both the stencil sum and the
// centering degree (zero-flux).
fn neighbor(cell: vec3<i32>, offset: vec3<i32>) -> vec3<f32> {
    let size = vec3<i32>(params.size);
    var n = cell + offset;
    if (params.boundary == 0u) {
        n = (n + size) % size;
    } else if (any(n < vec3<i32>(0)) || any(n >= size)) {
        return vec3<f32>(0.0);
    }
    return vec3<f32>(load_cell(n), 1.0);
}

struct Stencil {
    lap: vec2<f32>,
    grad_u: vec3<f32>,
    grad_v: vec3<f32>,
};

fn stencil_at(cell: vec3<i32>, s0: vec2<f32>) -> Stencil {
    let xp = neighbor(cell, vec3<i32>(1, 0, 0));
    let xn = neighbor(cell, vec3<i32>(-1, 0, 0));
    let yp = neighbor(cell, vec3<i32>(0, 1, 0));
    let yn = neighbor(cell, vec3<i32>(0, -1, 0));
    let zp = neighbor(cell, vec3<i32>(0, 0, 1));
    let zn = neighbor(cell, vec3<i32>(0, 0, -1));

    var st: Stencil;
    let sum = xp.xy + xn.xy + yp.xy + yn.xy + zp.xy + zn.xy;
    let degree = xp.z + xn.z + yp.z + yn.z + zp.z + zn.z;
    st.lap = sum - degree * s0;

    // Central differences; a missing neighbor falls back to the center
    // value, giving a one-sided estimate at clamped edges.
    let xpv = mix(s0, xp.xy, xp.z);
    let xnv = mix(s0, xn.xy, xn.z);
    let ypv = mix(s0, yp.xy, yp.z);
    let ynv = mix(s0, yn.xy, yn.z);
    let zpv = mix(s0, zp.xy, zp.z);
    let znv = mix(s0, zn.xy, zn.z);
    st.grad_u = 0.5 * vec3<f32>(xpv.x - xnv.x, ypv.x - ynv.x, zpv.x - znv.x);
    st.grad_v = 0.5 * vec3<f32>(xpv.y - xnv.y, ypv.y - ynv.y, zpv.y - znv.y);
    return st;
}

// Drift bias: a positive factor transports concentration along the force
// direction. One convention for every model and both forces.
fn drift(st: Stencil, p: vec3<f32>) -> vec2<f32> {
    var d = vec2<f32>(0.0);
    if (params.wind > 0.0 && dot(params.wind_dir, params.wind_dir) > 1e-12) {
        let w = normalize(params.wind_dir);
        d += params.wind * vec2<f32>(dot(st.grad_u, w), dot(st.grad_v, w));
    }
    if (params.gravity > 0.0) {
        let to_pole = params.gravity_pos - p;
        if (dot(to_pole, to_pole) > 1e-12) {
            let g = normalize(to_pole);
            d += params.gravity * vec2<f32>(dot(st.grad_u, g), dot(st.grad_v, g));
        }
    }
    return d;
}
"#;

const GRAY_SCOTT_REACTION: &str = r#"
// rates.z = feed, rates.w = kill.
fn react(s: vec2<f32>) -> vec2<f32> {
    let uvv = s.x * s.y * s.y;
    return vec2<f32>(
        -uvv + params.rates.z * (1.0 - s.x),
        uvv - (params.rates.z + params.rates.w) * s.y,
    );
}
"#;

const FITZHUGH_NAGUMO_REACTION: &str = r#"
// rates.z = a, rates.w = b, extra.x = epsilon. The all-u rest state is an
// equilibrium when b = 1.
fn react(s: vec2<f32>) -> vec2<f32> {
    return vec2<f32>(
        s.x - s.x * s.x * s.x - s.y,
        params.extra.x * (s.x - params.rates.z * s.y - params.rates.w),
    );
}
"#;

const SCHNAKENBERG_REACTION: &str = r#"
// rates.z = a, rates.w = b.
fn react(s: vec2<f32>) -> vec2<f32> {
    let uuv = s.x * s.x * s.y;
    return vec2<f32>(
        params.rates.z - s.x + uuv,
        params.rates.w - uuv,
    );
}
"#;

const SIM_KERNEL: &str = r#"
fn step_cell(cell: vec3<i32>, p: vec3<f32>) -> vec4<f32> {
    let s0 = load_cell(cell);
    if (params.pause != 0u) {
        return vec4<f32>(s0, 0.0, 1.0);
    }
    let st = stencil_at(cell, s0);
    let s = s0 + params.rates.xy * st.lap + react(s0) + drift(st, p);
    return vec4<f32>(clamp(s, vec2<f32>(0.0), vec2<f32>(1.0)), 0.0, 1.0);
}

fn shade_layer(xy: vec2<i32>, i: u32) -> vec4<f32> {
    let cell = vec3<i32>(xy, i32(tile.start_z + i));
    let p = (vec3<f32>(cell) + vec3<f32>(0.5)) / vec3<f32>(params.size);
    return step_cell(cell, p);
}
"#;

/// Source injection shares the scaffold's tile/vertex plumbing but only
/// reads its own cell, adding a Gaussian bump to v and carving it from u.
const SOURCE_SCAFFOLD: &str = r#"
struct SourceParams {
    center: vec3<f32>,
    source_size: f32,
    size: vec3<u32>,
    _pad: u32,
};

struct TileParams {
    start_z: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

@group(0) @binding(0) var<uniform> params: SourceParams;
@group(0) @binding(1) var<uniform> tile: TileParams;
@group(0) @binding(2) var map: texture_2d_array<f32>;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.clip = vec4<f32>(position, 0.0, 1.0);
    return out;
}

fn shade_layer(xy: vec2<i32>, i: u32) -> vec4<f32> {
    let z = i32(tile.start_z + i);
    let s0 = textureLoad(map, xy, z, 0).xy;
    let p = (vec3<f32>(vec3<i32>(xy, z)) + vec3<f32>(0.5)) / vec3<f32>(params.size);
    let d = p - params.center;
    let intensity = 0.5 * exp(-dot(d, d) / params.source_size);
    let s = vec2<f32>(max(0.0, s0.x - intensity), min(1.0, s0.y + intensity));
    return vec4<f32>(s, 0.0, 1.0);
}
"#;

/// Fragment entry writing `targets` color outputs, one per depth layer.
fn mrt_fragment(targets: u32) -> String {
    assert!(targets >= 1, "a tile pass writes at least one layer");
    let mut out = String::from("\nstruct FragOut {\n");
    for i in 0..targets {
        out.push_str(&format!("    @location({i}) c{i}: vec4<f32>,\n"));
    }
    out.push_str("};\n\n@fragment\nfn fs_main(in: VsOut) -> FragOut {\n");
    out.push_str("    let xy = vec2<i32>(in.clip.xy);\n    var out: FragOut;\n");
    for i in 0..targets {
        out.push_str(&format!("    out.c{i} = shade_layer(xy, {i}u);\n"));
    }
    out.push_str("    return out;\n}\n");
    out
}

/// Full WGSL for one model's simulation pass writing `targets` layers.
pub fn simulation_shader(kind: ModelKind, targets: u32) -> String {
    let reaction = match kind {
        ModelKind::GrayScott => GRAY_SCOTT_REACTION,
        ModelKind::FitzHughNagumo => FITZHUGH_NAGUMO_REACTION,
        ModelKind::Schnakenberg => SCHNAKENBERG_REACTION,
    };
    let mut src = String::with_capacity(4096);
    src.push_str(SIM_SCAFFOLD);
    src.push_str(reaction);
    src.push_str(SIM_KERNEL);
    src.push_str(&mrt_fragment(targets));
    src
}

/// Full WGSL for the source-injection pass writing `targets` layers.
pub fn source_shader(targets: u32) -> String {
    let mut src = String::with_capacity(2048);
    src.push_str(SOURCE_SCAFFOLD);
    src.push_str(&mrt_fragment(targets));
    src
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_outputs_match_target_count() {
        for targets in [1, 4, 8] {
            let src = simulation_shader(ModelKind::GrayScott, targets);
            let last = format!("out.c{} = shade_layer", targets - 1);
            let past = format!("out.c{} = shade_layer", targets);
            assert!(src.contains(&last));
            assert!(!src.contains(&past));
        }
    }

    #[test]
    fn each_model_has_its_own_reaction() {
        let gs = simulation_shader(ModelKind::GrayScott, 4);
        let fhn = simulation_shader(ModelKind::FitzHughNagumo, 4);
        let schnak = simulation_shader(ModelKind::Schnakenberg, 4);
        assert!(gs.contains("s.x * s.y * s.y"));
        assert!(fhn.contains("s.x * s.x * s.x"));
        assert!(schnak.contains("s.x * s.x * s.y"));
        // All three share the scaffold.
        for src in [&gs, &fhn, &schnak] {
            assert!(src.contains("fn stencil_at"));
            assert!(src.contains("fn drift"));
        }
    }

    #[test]
    fn source_shader_reads_only_its_own_cell() {
        let src = source_shader(8);
        assert!(src.contains("exp(-dot(d, d)"));
        assert!(!src.contains("fn neighbor"));
    }
}
