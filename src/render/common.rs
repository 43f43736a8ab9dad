use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::scene::{LightRig, SceneObject};

/// Point lights the shader evaluates.
pub const MAX_POINT_LIGHTS: usize = 2;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Everything the renderer needs to draw one frame.
#[derive(Clone, Debug)]
pub struct Frame<'a> {
    pub camera: CameraParams,
    /// Linear RGB clear colour.
    pub background: Vec3,
    pub lights: &'a LightRig,
    pub objects: &'a [SceneObject],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// Colour premultiplied by intensity.
    pub ambient: [f32; 4],
    /// Direction towards the sun.
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    /// `xyz` position, `w` range.
    pub point_position: [[f32; 4]; MAX_POINT_LIGHTS],
    pub point_color: [[f32; 4]; MAX_POINT_LIGHTS],
}

impl GlobalUniform {
    pub fn from_frame(frame: &Frame<'_>) -> Self {
        let lights = frame.lights;
        let ambient = lights.ambient.color * lights.ambient.intensity;
        let sun = lights.sun.position.normalize_or_zero();
        let sun_color = lights.sun.color * lights.sun.intensity;

        let mut point_position = [[0.0; 4]; MAX_POINT_LIGHTS];
        let mut point_color = [[0.0; 4]; MAX_POINT_LIGHTS];
        for (slot, light) in lights.points.iter().take(MAX_POINT_LIGHTS).enumerate() {
            point_position[slot] = light.position.extend(light.range.max(f32::EPSILON)).into();
            point_color[slot] = (light.color * light.intensity).extend(1.0).into();
        }

        Self {
            view_proj: frame.camera.view_proj.to_cols_array_2d(),
            camera_position: frame.camera.position.extend(1.0).into(),
            ambient: ambient.extend(1.0).into(),
            sun_direction: sun.extend(0.0).into(),
            sun_color: sun_color.extend(1.0).into(),
            point_position,
            point_color,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct ObjectConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
    /// `x` is one for unlit materials.
    pub flags: [f32; 4],
}

impl ObjectConstants {
    pub fn from_object(object: &SceneObject) -> Self {
        let model = object.model_matrix();
        let normal = Mat3::from_mat4(model).inverse().transpose();
        let material = &object.material;
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            color: material.color.extend(material.opacity).into(),
            flags: [f32::from(u8::from(material.unlit)), 0.0, 0.0, 0.0],
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

/// Indices of the objects to draw, opaque ones first.
///
/// Hidden objects such as hit boxes are skipped.
pub fn draw_order(objects: &[SceneObject]) -> Vec<usize> {
    let visible = || {
        objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.material.visible)
    };
    visible()
        .filter(|(_, object)| !object.material.is_translucent())
        .chain(visible().filter(|(_, object)| object.material.is_translucent()))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn uniform_layouts_match_the_shader() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 192);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 144);
    }

    #[test]
    fn hitboxes_are_skipped_and_glass_comes_last() {
        let scene = Scene::cozy_room().unwrap();
        let order = draw_order(&scene.objects);
        let names: Vec<&str> = order
            .iter()
            .map(|&index| scene.objects[index].name.as_str())
            .collect();
        assert!(!names.contains(&"cat-hitbox"));
        assert!(!names.contains(&"sofa-seat"));
        assert_eq!(names.last(), Some(&"window-glass"));
        assert_eq!(order.len(), scene.objects.len() - 2);
    }

    #[test]
    fn point_lights_carry_intensity_and_range() {
        let mut scene = Scene::cozy_room().unwrap();
        let lamp = scene.lights.point_index("lamp").unwrap();
        scene.lights.points[lamp].intensity = 1.5;
        let frame = Frame {
            camera: CameraParams {
                view_proj: Mat4::IDENTITY,
                position: Vec3::ZERO,
            },
            background: scene.background,
            lights: &scene.lights,
            objects: &scene.objects,
        };
        let uniform = GlobalUniform::from_frame(&frame);
        assert_eq!(uniform.point_position[lamp], [-3.0, 2.0, -2.0, 8.0]);
        let expected = scene.lights.points[lamp].color * 1.5;
        assert!((Vec3::from_slice(&uniform.point_color[lamp][..3]) - expected).length() < 1e-6);
        let tv = scene.lights.point_index("tv").unwrap();
        assert_eq!(&uniform.point_color[tv][..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn unlit_materials_set_the_flag() {
        let scene = Scene::cozy_room().unwrap();
        let nose = &scene.objects[scene.find("cat-nose").unwrap()];
        assert_eq!(ObjectConstants::from_object(nose).flags[0], 1.0);
        let floor = &scene.objects[scene.find("floor").unwrap()];
        assert_eq!(ObjectConstants::from_object(floor).flags[0], 0.0);
    }
}
