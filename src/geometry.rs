use std::f32::consts::{PI, TAU};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// GPU ready mesh buffers produced from a primitive description.
///
/// Vertices are laid out as `position.xyz` followed by `normal.xyz`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 6
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&[
            position.x, position.y, position.z, normal.x, normal.y, normal.z,
        ]);
        index
    }
}

/// Primitive shapes the room is assembled from.
///
/// A cone is a cylinder with a zero top radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Box {
        size: Vec3,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
        open_ended: bool,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
}

impl Geometry {
    pub fn cone(radius: f32, height: f32, segments: u32, open_ended: bool) -> Self {
        Self::Cylinder {
            radius_top: 0.0,
            radius_bottom: radius,
            height,
            segments,
            open_ended,
        }
    }

    /// Key under which the tessellated mesh is cached by the renderer.
    pub fn cache_key(&self) -> String {
        format!("{self:?}")
    }

    /// Half extents of the local bounding box, centred on the origin.
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            Self::Box { size } => size * 0.5,
            Self::Cylinder {
                radius_top,
                radius_bottom,
                height,
                ..
            } => {
                let radius = radius_top.max(radius_bottom);
                Vec3::new(radius, height * 0.5, radius)
            }
            Self::Sphere { radius, .. } => Vec3::splat(radius),
        }
    }

    pub fn tessellate(&self) -> Mesh {
        match *self {
            Self::Box { size } => box_mesh(size),
            Self::Cylinder {
                radius_top,
                radius_bottom,
                height,
                segments,
                open_ended,
            } => cylinder_mesh(radius_top, radius_bottom, height, segments.max(3), open_ended),
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere_mesh(radius, width_segments.max(3), height_segments.max(2)),
        }
    }
}

// (normal, u, v) with u x v == normal so every face winds counter-clockwise from outside.
const BOX_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
];

fn box_mesh(size: Vec3) -> Mesh {
    let half = size * 0.5;
    let mut mesh = Mesh::default();
    for (normal, u, v) in BOX_FACES {
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let base = mesh.vertex_count() as u32;
        for (su, sv) in corners {
            mesh.push_vertex((normal + u * su + v * sv) * half, normal);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

fn cylinder_mesh(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    segments: u32,
    open_ended: bool,
) -> Mesh {
    let mut mesh = Mesh::default();
    let half_height = height * 0.5;
    let slope = if height > f32::EPSILON {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };

    let mut bottom_ring = Vec::with_capacity(segments as usize + 1);
    let mut top_ring = Vec::with_capacity(segments as usize + 1);
    for i in 0..=segments {
        let theta = i as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        let normal = Vec3::new(sin, slope, cos).normalize();
        bottom_ring.push(mesh.push_vertex(
            Vec3::new(radius_bottom * sin, -half_height, radius_bottom * cos),
            normal,
        ));
        top_ring.push(mesh.push_vertex(
            Vec3::new(radius_top * sin, half_height, radius_top * cos),
            normal,
        ));
    }
    for i in 0..segments as usize {
        let (a, b) = (bottom_ring[i], bottom_ring[i + 1]);
        let (c, d) = (top_ring[i + 1], top_ring[i]);
        mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    if !open_ended {
        if radius_top > 0.0 {
            cap(&mut mesh, radius_top, half_height, segments, true);
        }
        if radius_bottom > 0.0 {
            cap(&mut mesh, radius_bottom, -half_height, segments, false);
        }
    }
    mesh
}

fn cap(mesh: &mut Mesh, radius: f32, y: f32, segments: u32, top: bool) {
    let normal = if top { Vec3::Y } else { Vec3::NEG_Y };
    let center = mesh.push_vertex(Vec3::new(0.0, y, 0.0), normal);
    let first = mesh.vertex_count() as u32;
    for i in 0..=segments {
        let theta = i as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        mesh.push_vertex(Vec3::new(radius * sin, y, radius * cos), normal);
    }
    for i in 0..segments {
        let (a, b) = (first + i, first + i + 1);
        if top {
            mesh.indices.extend_from_slice(&[center, a, b]);
        } else {
            mesh.indices.extend_from_slice(&[center, b, a]);
        }
    }
}

fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let mut mesh = Mesh::default();
    for y in 0..=height_segments {
        let phi = y as f32 / height_segments as f32 * PI;
        for x in 0..=width_segments {
            let theta = x as f32 / width_segments as f32 * TAU;
            let normal = Vec3::new(
                -theta.cos() * phi.sin(),
                phi.cos(),
                theta.sin() * phi.sin(),
            );
            mesh.push_vertex(normal * radius, normal);
        }
    }
    let stride = width_segments + 1;
    for y in 0..height_segments {
        for x in 0..width_segments {
            let a = y * stride + x;
            let b = a + stride;
            if y != 0 {
                mesh.indices.extend_from_slice(&[a, b, a + 1]);
            }
            if y != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, b + 1, a + 1]);
            }
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normals(mesh: &Mesh) -> impl Iterator<Item = Vec3> + '_ {
        mesh.vertices
            .chunks_exact(6)
            .map(|chunk| Vec3::new(chunk[3], chunk[4], chunk[5]))
    }

    #[test]
    fn box_has_four_vertices_per_face() {
        let mesh = Geometry::Box {
            size: Vec3::new(2.0, 1.0, 0.5),
        }
        .tessellate();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        let max_x = mesh
            .vertices
            .chunks_exact(6)
            .map(|chunk| chunk[0])
            .fold(f32::MIN, f32::max);
        assert!((max_x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn open_cone_skips_caps() {
        let open = Geometry::cone(0.35, 0.4, 16, true).tessellate();
        let closed = Geometry::cone(0.35, 0.4, 16, false).tessellate();
        assert_eq!(open.indices.len(), 16 * 6);
        // Only the bottom cap is added because the apex has no radius.
        assert_eq!(closed.indices.len(), 16 * 6 + 16 * 3);
    }

    #[test]
    fn tessellated_normals_are_unit_length() {
        let shapes = [
            Geometry::Sphere {
                radius: 0.25,
                width_segments: 16,
                height_segments: 12,
            },
            Geometry::Cylinder {
                radius_top: 0.03,
                radius_bottom: 0.02,
                height: 0.4,
                segments: 8,
                open_ended: false,
            },
        ];
        for shape in shapes {
            let mesh = shape.tessellate();
            for normal in normals(&mesh) {
                assert!((normal.length() - 1.0).abs() < 1e-4, "{shape:?}");
            }
            let count = mesh.vertex_count() as u32;
            assert!(mesh.indices.iter().all(|&index| index < count));
        }
    }

    #[test]
    fn half_extents_cover_the_widest_radius() {
        let lamp_base = Geometry::Cylinder {
            radius_top: 0.2,
            radius_bottom: 0.25,
            height: 0.1,
            segments: 16,
            open_ended: false,
        };
        assert_eq!(lamp_base.half_extents(), Vec3::new(0.25, 0.05, 0.25));
    }
}
