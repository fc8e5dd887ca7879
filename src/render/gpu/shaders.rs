use std::fmt::Write as _;

use crate::render::backend::MAX_TEXTURE_SLOTS_LIMIT;

/// Binding index of the shared sampler; texture slots occupy `0..SAMPLER_BINDING`.
pub(crate) const SAMPLER_BINDING: u32 = MAX_TEXTURE_SLOTS_LIMIT as u32;

/// WGSL for the batched quad pipeline with `SAMPLER_BINDING` texture slots.
///
/// Group 0 holds the slot textures and the sampler, group 1 the viewport size in pixels.
pub(crate) fn batch_shader_source() -> String {
    let mut src = String::from(
        r#"
struct Viewport {
  size: vec2<f32>,
  _pad: vec2<f32>,
};

@group(1) @binding(0) var<uniform> viewport: Viewport;

struct VsIn {
  @location(0) position: vec3<f32>,
  @location(1) texcoord: vec3<f32>,
  @location(2) alpha: f32,
};

struct VsOut {
  @builtin(position) pos: vec4<f32>,
  @location(0) uv: vec2<f32>,
  @location(1) @interpolate(flat) slot: u32,
  @location(2) alpha: f32,
};

@vertex
fn vs(in: VsIn) -> VsOut {
  let ndc = in.position.xy / viewport.size * 2.0 - vec2<f32>(1.0, 1.0);
  var o: VsOut;
  o.pos = vec4<f32>(ndc.x, -ndc.y, 0.0, 1.0);
  o.uv = in.texcoord.xy;
  o.slot = u32(in.texcoord.z + 0.5);
  o.alpha = in.alpha;
  return o;
}
"#,
    );

    for slot in 0..SAMPLER_BINDING {
        let _ = writeln!(
            src,
            "@group(0) @binding({slot}) var t{slot}: texture_2d<f32>;"
        );
    }
    let _ = writeln!(
        src,
        "@group(0) @binding({SAMPLER_BINDING}) var s_tex: sampler;"
    );

    src.push_str(
        r#"
@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  var c = vec4<f32>(0.0);
  switch in.slot {
"#,
    );
    for slot in 0..SAMPLER_BINDING {
        let _ = writeln!(
            src,
            "    case {slot}u: {{ c = textureSampleLevel(t{slot}, s_tex, in.uv, 0.0); }}"
        );
    }
    src.push_str(
        r#"    default: {}
  }
  return c * in.alpha;
}
"#,
    );
    src
}
