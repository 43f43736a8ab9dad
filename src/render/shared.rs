pub(crate) const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    sun_direction: vec4<f32>,
    sun_color: vec4<f32>,
    point_position: array<vec4<f32>, 2>,
    point_color: array<vec4<f32>, 2>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    flags: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;

    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = normalize(world_normal);
    return out;
}

fn point_light(index: i32, world_pos: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {
    let light = globals.point_position[index];
    let to_light = light.xyz - world_pos;
    let distance = length(to_light);
    let falloff = clamp(1.0 - distance / light.w, 0.0, 1.0);
    let diffuse = max(dot(normal, to_light / max(distance, 0.0001)), 0.0);
    return globals.point_color[index].rgb * diffuse * falloff * falloff;
}

@fragment
fn fs_main(input: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    if (object.flags.x > 0.5) {
        return object.color;
    }

    // Surfaces are double sided, light the face we see.
    var normal = normalize(input.normal);
    if (!front) {
        normal = -normal;
    }

    var light = globals.ambient.rgb;
    light += globals.sun_color.rgb * max(dot(normal, globals.sun_direction.xyz), 0.0);
    light += point_light(0, input.world_pos, normal);
    light += point_light(1, input.world_pos, normal);
    return vec4<f32>(object.color.rgb * light, object.color.a);
}
"#;
