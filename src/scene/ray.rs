//! Rays, bounding boxes and nearest-hit scene queries

use glam::{Mat4, Vec3};

use super::{NodePath, SceneGraph};
use crate::backend::types::PrimitiveTopology;
use crate::resources::Side;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box containing every point; an empty iterator gives an inverted (empty) box
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(
            Self {
                min: Vec3::splat(f32::INFINITY),
                max: Vec3::splat(f32::NEG_INFINITY),
            },
            |acc, p| Self {
                min: acc.min.min(p),
                max: acc.max.max(p),
            },
        )
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }
}

/// A half-line with a unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// The same ray expressed in the space `inverse` maps into.
    ///
    /// The direction is intentionally left unnormalized so that `t` values stay comparable
    /// with distances along the original ray.
    fn to_local(self, inverse: &Mat4) -> Self {
        Self {
            origin: inverse.transform_point3(self.origin),
            direction: inverse.transform_vector3(self.direction),
        }
    }
}

/// Slab-method ray–AABB intersection, returns the entry distance (or 0 when starting inside)
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    if aabb.is_empty() {
        return None;
    }
    let mut t_min = 0.0_f32;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let o = ray.origin[axis];
        let d = ray.direction[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (mut t0, mut t1) = ((lo - o) * inv, (hi - o) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

/// Möller–Trumbore ray–triangle intersection honouring which faces may be hit
pub fn ray_triangle(ray: &Ray, tri: [Vec3; 3], side: Side) -> Option<f32> {
    const EPS: f32 = 1e-8;
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);

    // det > 0 means the ray approaches the counter-clockwise (front) face
    let accepted = match side {
        Side::Front => det > EPS,
        Side::Back => det < -EPS,
        Side::Double => det.abs() > EPS,
    };
    if !accepted {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - tri[0];
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t > EPS).then_some(t)
}

/// Nearest intersection between a ray and the scene
#[derive(Debug, Clone)]
pub struct Hit {
    pub distance: f32,
    pub point: Vec3,
    pub path: NodePath,
    pub tag: Option<String>,
}

/// Find the nearest triangle hit among all mesh nodes
///
/// Point clouds are skipped; they have no surface to pick.
pub fn raycast(graph: &SceneGraph, ray: &Ray) -> Option<Hit> {
    let mut best: Option<(f32, NodePath)> = None;

    for item in graph.flatten() {
        let (Some(mesh), Some(bounds), Some(material)) = (
            graph.mesh(item.mesh),
            graph.mesh_bounds(item.mesh),
            graph.material(item.material),
        ) else {
            continue;
        };
        if mesh.topology != PrimitiveTopology::TriangleList {
            continue;
        }

        let inverse = item.world.inverse();
        if !inverse.is_finite() {
            continue;
        }
        let local = ray.to_local(&inverse);
        let limit = best.as_ref().map_or(f32::INFINITY, |(t, _)| *t);
        match ray_aabb(&local, bounds) {
            Some(t) if t <= limit => {}
            _ => continue,
        }

        let nearest = mesh
            .triangles()
            .filter_map(|tri| ray_triangle(&local, tri, material.side))
            .fold(None, |acc: Option<f32>, t| Some(acc.map_or(t, |a| a.min(t))));
        if let Some(t) = nearest {
            if t < limit {
                best = Some((t, item.path));
            }
        }
    }

    best.map(|(distance, path)| Hit {
        distance,
        point: ray.at(distance),
        tag: graph.node(&path).and_then(|n| n.tag.clone()),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Material, Mesh};
    use crate::scene::{SceneNode, Transform};
    use approx::assert_relative_eq;

    #[test]
    fn slab_test_handles_axis_parallel_rays() {
        let aabb = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let hit = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        assert_relative_eq!(ray_aabb(&hit, &aabb).unwrap(), 4.0);
        let miss = Ray::new(Vec3::new(2.0, 0.0, 5.0), -Vec3::Z);
        assert!(ray_aabb(&miss, &aabb).is_none());
        let behind = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(ray_aabb(&behind, &aabb).is_none());
    }

    #[test]
    fn front_faces_only_hit_from_the_front() {
        let tri = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let from_front = Ray::new(Vec3::new(0.0, 0.0, 2.0), -Vec3::Z);
        let from_back = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);
        assert!(ray_triangle(&from_front, tri, Side::Front).is_some());
        assert!(ray_triangle(&from_back, tri, Side::Front).is_none());
        assert!(ray_triangle(&from_back, tri, Side::Back).is_some());
        assert!(ray_triangle(&from_back, tri, Side::Double).is_some());
    }

    #[test]
    fn raycast_returns_only_the_nearest_hit() {
        let mut graph = SceneGraph::new();
        let quad = graph.add_mesh(Mesh::quad(1.0, 1.0));
        let mat = graph.add_material(Material::default());
        graph
            .add_node(
                SceneNode::mesh("far", quad, mat, Transform::from_position(Vec3::new(0.0, 0.0, -5.0)))
                    .with_tag("far"),
            )
            .unwrap();
        graph
            .add_node(
                SceneNode::mesh("near", quad, mat, Transform::from_position(Vec3::new(0.0, 0.0, -2.0)))
                    .with_tag("near"),
            )
            .unwrap();

        let hit = raycast(&graph, &Ray::new(Vec3::ZERO, -Vec3::Z)).unwrap();
        assert_eq!(hit.tag.as_deref(), Some("near"));
        assert_relative_eq!(hit.distance, 2.0, epsilon = 1e-5);

        assert!(raycast(&graph, &Ray::new(Vec3::ZERO, Vec3::Z)).is_none());
    }

    #[test]
    fn raycast_respects_scale() {
        let mut graph = SceneGraph::new();
        let cube = graph.add_mesh(Mesh::cube());
        let mat = graph.add_material(Material::default());
        graph
            .add_node(SceneNode::mesh(
                "box",
                cube,
                mat,
                Transform::from_position(Vec3::new(0.0, 0.0, -4.0)).with_scale(Vec3::splat(2.0)),
            ))
            .unwrap();

        let hit = raycast(&graph, &Ray::new(Vec3::ZERO, -Vec3::Z)).unwrap();
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-4);
        assert!(hit.tag.is_none());
    }
}
