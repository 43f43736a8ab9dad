use std::collections::HashMap;

use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Geometry;
use crate::raycast::Aabb;
use crate::state::{Interactive, ObjectKind};

/// Layout of the cozy room shipped with the binary.
pub const ROOM_XML: &str = include_str!("../assets/room.xml");

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid scene XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("{node} is missing the `{attribute}` attribute")]
    MissingAttribute {
        node: String,
        attribute: &'static str,
    },
    #[error("{node} has an invalid `{attribute}` value {value:?}")]
    InvalidValue {
        node: String,
        attribute: &'static str,
        value: String,
    },
    #[error("{node} references unknown material {material:?}")]
    UnknownMaterial { node: String, material: String },
    #[error("{node} has unknown shape {shape:?}")]
    UnknownShape { node: String, shape: String },
    #[error("{node} has unknown interactive kind {kind:?}")]
    UnknownKind { node: String, kind: String },
}

/// Runtime representation of the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub background: Vec3,
    pub camera: CameraSpec,
    pub lights: LightRig,
    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Builds the room bundled with the crate.
    pub fn cozy_room() -> Result<Self, SceneError> {
        Self::from_xml(ROOM_XML)
    }

    /// Parses a room layout document.
    pub fn from_xml(xml: &str) -> Result<Self, SceneError> {
        let document = Document::parse(xml)?;
        let root = document.root_element();

        let mut materials = HashMap::new();
        for node in root.descendants().filter(|n| n.has_tag_name("material")) {
            materials.insert(required_attr(&node, "name")?.to_string(), parse_material(&node)?);
        }

        let mut scene = Scene {
            background: parse_color(&root, "background", Vec3::ZERO)?,
            camera: CameraSpec::default(),
            lights: LightRig::default(),
            objects: Vec::new(),
        };

        for node in root.children().filter(Node::is_element) {
            match node.tag_name().name() {
                "camera" => scene.camera = parse_camera(&node)?,
                "ambient" => {
                    scene.lights.ambient = AmbientLight {
                        color: parse_color(&node, "color", Vec3::ONE)?,
                        intensity: parse_f32(&node, "intensity", 1.0)?,
                    }
                }
                "sun" => {
                    scene.lights.sun = DirectionalLight {
                        position: parse_vec3(&node, "position", Vec3::Y)?,
                        color: parse_color(&node, "color", Vec3::ONE)?,
                        intensity: parse_f32(&node, "intensity", 1.0)?,
                    }
                }
                "point" => scene.lights.points.push(PointLight {
                    name: required_attr(&node, "name")?.to_string(),
                    position: parse_vec3(&node, "position", Vec3::ZERO)?,
                    color: parse_color(&node, "color", Vec3::ONE)?,
                    intensity: parse_f32(&node, "intensity", 1.0)?,
                    range: parse_f32(&node, "range", 10.0)?,
                }),
                "object" => scene
                    .objects
                    .push(parse_object(&node, &materials, None, Vec3::ZERO)?),
                "group" => {
                    let group = required_attr(&node, "name")?;
                    let origin = parse_vec3(&node, "position", Vec3::ZERO)?;
                    for child in node.children().filter(|n| n.has_tag_name("object")) {
                        scene
                            .objects
                            .push(parse_object(&child, &materials, Some(group), origin)?);
                    }
                }
                _ => {}
            }
        }

        Ok(scene)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|object| object.name == name)
    }

    /// Objects tagged as click targets, with their index in [`Scene::objects`].
    pub fn interactive_objects(&self) -> impl Iterator<Item = (usize, &SceneObject, &Interactive)> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(index, object)| {
                object
                    .interactive
                    .as_ref()
                    .map(|interactive| (index, object, interactive))
            })
    }
}

/// Initial camera placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, 3.0),
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Surface appearance of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Linear RGB.
    pub color: Vec3,
    pub opacity: f32,
    /// Unlit materials ignore every light and show their colour as is.
    pub unlit: bool,
    /// Invisible objects are kept for hit-testing but never drawn.
    pub visible: bool,
}

impl Material {
    pub fn lit(color: Vec3) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn unlit(color: Vec3) -> Self {
        Self {
            color,
            unlit: true,
            ..Self::default()
        }
    }

    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            opacity: 1.0,
            unlit: false,
            visible: true,
        }
    }
}

/// Scene object as described by the room layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Translation of the enclosing group.
    pub origin: Vec3,
    /// Position relative to [`SceneObject::origin`].
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub geometry: Geometry,
    pub material: Material,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<Interactive>,
}

impl SceneObject {
    pub fn world_position(&self) -> Vec3 {
        self.origin + self.position
    }

    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z);
        Mat4::from_translation(self.world_position()) * rotation * Mat4::from_scale(self.scale)
    }

    /// Axis aligned box enclosing the transformed geometry.
    pub fn world_bounds(&self) -> Aabb {
        let half = self.geometry.half_extents();
        let model = self.model_matrix();
        let corners = (0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { -half.x } else { half.x },
                if i & 2 == 0 { -half.y } else { half.y },
                if i & 4 == 0 { -half.z } else { half.z },
            );
            model.transform_point3(corner)
        });
        Aabb::from_points(corners)
    }
}

/// Every light in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
    pub points: Vec<PointLight>,
}

impl LightRig {
    pub fn point_index(&self, name: &str) -> Option<usize> {
        self.points.iter().position(|light| light.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 0.3,
        }
    }
}

/// Directional light shining from `position` towards the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(5.0, 4.0, 3.0),
            color: Vec3::ONE,
            intensity: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub name: String,
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Distance at which the light has faded out completely.
    pub range: f32,
}

fn parse_camera(node: &Node<'_, '_>) -> Result<CameraSpec, SceneError> {
    let defaults = CameraSpec::default();
    Ok(CameraSpec {
        position: parse_vec3(node, "position", defaults.position)?,
        fov: parse_f32(node, "fov", defaults.fov)?,
        near: parse_f32(node, "near", defaults.near)?,
        far: parse_f32(node, "far", defaults.far)?,
    })
}

fn parse_material(node: &Node<'_, '_>) -> Result<Material, SceneError> {
    Ok(Material {
        color: parse_color(node, "color", Vec3::ONE)?,
        opacity: parse_f32(node, "opacity", 1.0)?,
        unlit: parse_bool(node, "unlit", false)?,
        visible: parse_bool(node, "visible", true)?,
    })
}

fn parse_object(
    node: &Node<'_, '_>,
    materials: &HashMap<String, Material>,
    group: Option<&str>,
    origin: Vec3,
) -> Result<SceneObject, SceneError> {
    let name = required_attr(node, "name")?.to_string();
    let material = match node.attribute("material") {
        Some(material) => *materials
            .get(material)
            .ok_or_else(|| SceneError::UnknownMaterial {
                node: describe(node),
                material: material.to_string(),
            })?,
        None => Material::default(),
    };
    let interactive = match node.attribute("interactive") {
        Some(tag) => {
            let kind = ObjectKind::from_tag(tag).ok_or_else(|| SceneError::UnknownKind {
                node: describe(node),
                kind: tag.to_string(),
            })?;
            let label = node.attribute("label").unwrap_or(tag).to_string();
            Some(Interactive { kind, label })
        }
        None => None,
    };

    Ok(SceneObject {
        name,
        group: group.map(str::to_string),
        origin,
        position: parse_vec3(node, "position", Vec3::ZERO)?,
        rotation: parse_vec3(node, "rotation", Vec3::ZERO)?,
        scale: parse_vec3(node, "scale", Vec3::ONE)?,
        geometry: parse_geometry(node)?,
        material,
        interactive,
    })
}

fn parse_geometry(node: &Node<'_, '_>) -> Result<Geometry, SceneError> {
    let shape = required_attr(node, "shape")?;
    let geometry = match shape {
        "box" => Geometry::Box {
            size: parse_vec3(node, "size", Vec3::ONE)?,
        },
        "cylinder" => {
            let radius = parse_f32(node, "radius", 0.5)?;
            Geometry::Cylinder {
                radius_top: parse_f32(node, "radius-top", radius)?,
                radius_bottom: parse_f32(node, "radius-bottom", radius)?,
                height: parse_f32(node, "height", 1.0)?,
                segments: parse_u32(node, "segments", 16)?,
                open_ended: parse_bool(node, "open", false)?,
            }
        }
        "cone" => Geometry::cone(
            parse_f32(node, "radius", 0.5)?,
            parse_f32(node, "height", 1.0)?,
            parse_u32(node, "segments", 16)?,
            parse_bool(node, "open", false)?,
        ),
        "sphere" => Geometry::Sphere {
            radius: parse_f32(node, "radius", 0.5)?,
            width_segments: parse_u32(node, "segments", 16)?,
            height_segments: parse_u32(node, "rings", 12)?,
        },
        other => {
            return Err(SceneError::UnknownShape {
                node: describe(node),
                shape: other.to_string(),
            })
        }
    };
    Ok(geometry)
}

fn describe(node: &Node<'_, '_>) -> String {
    match node.attribute("name") {
        Some(name) => format!("<{} name={name:?}>", node.tag_name().name()),
        None => format!("<{}>", node.tag_name().name()),
    }
}

fn required_attr<'a>(node: &Node<'a, '_>, attribute: &'static str) -> Result<&'a str, SceneError> {
    node.attribute(attribute)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SceneError::MissingAttribute {
            node: describe(node),
            attribute,
        })
}

fn invalid(node: &Node<'_, '_>, attribute: &'static str, value: &str) -> SceneError {
    SceneError::InvalidValue {
        node: describe(node),
        attribute,
        value: value.to_string(),
    }
}

fn parse_vec3(
    node: &Node<'_, '_>,
    attribute: &'static str,
    default: Vec3,
) -> Result<Vec3, SceneError> {
    let Some(value) = node.attribute(attribute) else {
        return Ok(default);
    };
    let components = value
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid(node, attribute, value))?;
    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(invalid(node, attribute, value)),
    }
}

/// Parses `#rrggbb` into linear RGB.
fn parse_color(
    node: &Node<'_, '_>,
    attribute: &'static str,
    default: Vec3,
) -> Result<Vec3, SceneError> {
    let Some(value) = node.attribute(attribute) else {
        return Ok(default);
    };
    let hex = value.trim().trim_start_matches('#');
    let rgb = u32::from_str_radix(hex, 16)
        .ok()
        .filter(|_| hex.len() == 6)
        .ok_or_else(|| invalid(node, attribute, value))?;
    Ok(hex_to_linear(rgb))
}

/// Converts a packed `0xrrggbb` sRGB colour into linear RGB.
pub fn hex_to_linear(rgb: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((rgb >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

fn parse_f32(
    node: &Node<'_, '_>,
    attribute: &'static str,
    default: f32,
) -> Result<f32, SceneError> {
    match node.attribute(attribute) {
        Some(value) => value
            .trim()
            .parse::<f32>()
            .map_err(|_| invalid(node, attribute, value)),
        None => Ok(default),
    }
}

fn parse_u32(
    node: &Node<'_, '_>,
    attribute: &'static str,
    default: u32,
) -> Result<u32, SceneError> {
    match node.attribute(attribute) {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|_| invalid(node, attribute, value)),
        None => Ok(default),
    }
}

fn parse_bool(
    node: &Node<'_, '_>,
    attribute: &'static str,
    default: bool,
) -> Result<bool, SceneError> {
    match node.attribute(attribute).map(str::trim) {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(value) => Err(invalid(node, attribute, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
    <room background="#000000">
        <camera position="0 2 4" fov="60"/>
        <ambient color="#ffffff" intensity="0.25"/>
        <point name="lamp" position="0 5 0" intensity="0" range="8"/>
        <material name="wood" color="#ff8000"/>
        <object name="floor" shape="box" size="12 0.2 12" material="wood"/>
        <group name="lamp" position="-3 0 -2">
            <object name="shade" shape="cone" radius="0.35" height="0.4" segments="16" open="true"
                    position="0 1.7 0" interactive="lamp" label="Lamp"/>
        </group>
    </room>
    "##;

    #[test]
    fn parse_scene_populates_objects_and_lights() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.camera.fov, 60.0);
        assert_eq!(scene.camera.position, Vec3::new(0.0, 2.0, 4.0));
        assert!((scene.lights.ambient.intensity - 0.25).abs() < f32::EPSILON);
        assert_eq!(scene.lights.point_index("lamp"), Some(0));
        assert_eq!(scene.lights.points[0].range, 8.0);

        let floor = &scene.objects[0];
        assert!((floor.material.color.x - 1.0).abs() < 1e-5);
        assert!(floor.material.color.y > 0.2 && floor.material.color.y < 0.25);
        assert!(floor.interactive.is_none());
    }

    #[test]
    fn group_children_inherit_the_group_origin() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        let shade = &scene.objects[scene.find("shade").unwrap()];
        assert_eq!(shade.group.as_deref(), Some("lamp"));
        assert_eq!(shade.world_position(), Vec3::new(-3.0, 1.7, -2.0));
        let interactive = shade.interactive.as_ref().unwrap();
        assert_eq!(interactive.kind, ObjectKind::Lamp);
        assert_eq!(interactive.label, "Lamp");
    }

    #[test]
    fn world_bounds_follow_rotation_and_scale() {
        let object = SceneObject {
            name: "board".to_string(),
            group: None,
            origin: Vec3::new(1.0, 0.0, 0.0),
            position: Vec3::ZERO,
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: Vec3::new(1.0, 2.0, 1.0),
            geometry: Geometry::Box {
                size: Vec3::new(2.0, 1.0, 0.5),
            },
            material: Material::default(),
            interactive: None,
        };
        let bounds = object.world_bounds();
        assert!((bounds.min - Vec3::new(0.75, -1.0, -1.0)).length() < 1e-5);
        assert!((bounds.max - Vec3::new(1.25, 1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = r#"<room><object shape="box"/></room>"#;
        let err = Scene::from_xml(bad).unwrap_err();
        assert!(matches!(
            err,
            SceneError::MissingAttribute {
                attribute: "name",
                ..
            }
        ));
    }

    #[test]
    fn unknown_interactive_kind_is_rejected() {
        let bad = r#"<room><object name="fridge" shape="box" interactive="fridge"/></room>"#;
        let err = Scene::from_xml(bad).unwrap_err();
        assert!(err.to_string().contains("fridge"));
    }

    #[test]
    fn bundled_room_has_every_interactive_kind() {
        let scene = Scene::cozy_room().unwrap();
        let kinds: Vec<ObjectKind> = scene
            .interactive_objects()
            .map(|(_, _, interactive)| interactive.kind)
            .collect();
        for kind in ObjectKind::ALL {
            assert_eq!(kinds.iter().filter(|k| **k == kind).count(), 1, "{kind:?}");
        }
        assert!(scene.lights.point_index("lamp").is_some());
        assert!(scene.lights.point_index("tv").is_some());
    }
}
