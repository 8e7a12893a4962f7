//! Mesh data structures and generation
//!
//! All generators produce counter-clockwise front faces (viewed from outside) so the
//! standard path can cull back faces for single-sided materials.

use crate::backend::types::{PrimitiveTopology, Vertex};
use crate::scene::Aabb;
use glam::{Vec2, Vec3, Vec4};
use std::f32::consts::{PI, TAU};

/// A mesh with vertex and index data
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
    pub topology: PrimitiveTopology,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: name.to_string(),
            topology: PrimitiveTopology::TriangleList,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        match self.topology {
            PrimitiveTopology::TriangleList => self.indices.len() / 3,
            PrimitiveTopology::PointList => 0,
        }
    }

    /// Get vertex data as bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Get index data as bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Iterate triangles as vertex positions
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let indices: &[u32] = match self.topology {
            PrimitiveTopology::TriangleList => &self.indices,
            PrimitiveTopology::PointList => &[],
        };
        indices.chunks_exact(3).map(|t| {
            [
                self.vertices[t[0] as usize].position,
                self.vertices[t[1] as usize].position,
                self.vertices[t[2] as usize].position,
            ]
        })
    }

    /// Local-space bounding box
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| v.position))
    }

    /// Create a unit cube centered at origin
    pub fn cube() -> Self {
        let mut mesh = Mesh::new("cube");

        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
        ];

        for (normal, right, up) in faces {
            let base = mesh.vertices.len() as u32;
            let center = normal * 0.5;
            let corners = [
                (center - right * 0.5 - up * 0.5, Vec2::new(0.0, 1.0)),
                (center + right * 0.5 - up * 0.5, Vec2::new(1.0, 1.0)),
                (center + right * 0.5 + up * 0.5, Vec2::new(1.0, 0.0)),
                (center - right * 0.5 + up * 0.5, Vec2::new(0.0, 0.0)),
            ];
            for (position, uv) in corners {
                mesh.vertices.push(Vertex::new(position, normal, uv));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    /// Create a UV sphere
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut mesh = Self::sphere_section(radius, segments, rings, PI);
        mesh.name = "sphere".into();
        mesh
    }

    /// Upper half of a UV sphere, open at the equator
    pub fn hemisphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut mesh = Self::sphere_section(radius, segments, rings, PI / 2.0);
        mesh.name = "hemisphere".into();
        mesh
    }

    fn sphere_section(radius: f32, segments: u32, rings: u32, theta_length: f32) -> Self {
        let mut mesh = Mesh::new("sphere");
        let segments = segments.max(3);
        let rings = rings.max(2);

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * theta_length;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let phi = u * TAU;
                let normal = Vec3::new(
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                );
                mesh.vertices
                    .push(Vertex::new(normal * radius, normal, Vec2::new(u, v)));
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment + 1;
                let b = ring * stride + segment;
                let c = (ring + 1) * stride + segment;
                let d = (ring + 1) * stride + segment + 1;
                if ring != 0 {
                    mesh.indices.extend_from_slice(&[a, b, d]);
                }
                if ring != rings - 1 || theta_length < PI {
                    mesh.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        mesh
    }

    /// Create a plane on the XZ axis facing +Y
    pub fn plane(width: f32, depth: f32, subdivisions: u32) -> Self {
        let mut mesh = Mesh::new("plane");
        let subdivisions = subdivisions.max(1);

        let half_width = width / 2.0;
        let half_depth = depth / 2.0;
        let step_x = width / subdivisions as f32;
        let step_z = depth / subdivisions as f32;

        for z in 0..=subdivisions {
            for x in 0..=subdivisions {
                let px = -half_width + x as f32 * step_x;
                let pz = -half_depth + z as f32 * step_z;
                mesh.vertices.push(Vertex::new(
                    Vec3::new(px, 0.0, pz),
                    Vec3::Y,
                    Vec2::new(
                        x as f32 / subdivisions as f32,
                        z as f32 / subdivisions as f32,
                    ),
                ));
            }
        }

        for z in 0..subdivisions {
            for x in 0..subdivisions {
                let current = z * (subdivisions + 1) + x;
                let next = current + subdivisions + 1;
                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        mesh
    }

    /// Create a rectangle in the XY plane facing +Z, with the image top at the top edge
    pub fn quad(width: f32, height: f32) -> Self {
        let mut mesh = Mesh::new("quad");
        let (hw, hh) = (width / 2.0, height / 2.0);
        let corners = [
            (Vec3::new(-hw, -hh, 0.0), Vec2::new(0.0, 1.0)),
            (Vec3::new(hw, -hh, 0.0), Vec2::new(1.0, 1.0)),
            (Vec3::new(hw, hh, 0.0), Vec2::new(1.0, 0.0)),
            (Vec3::new(-hw, hh, 0.0), Vec2::new(0.0, 0.0)),
        ];
        for (position, uv) in corners {
            mesh.vertices.push(Vertex::new(position, Vec3::Z, uv));
        }
        mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        mesh
    }

    /// Create a flat disc on the XZ plane facing +Y
    pub fn disc(radius: f32, segments: u32) -> Self {
        let mut mesh = Mesh::new("disc");
        let segments = segments.max(3);

        mesh.vertices
            .push(Vertex::new(Vec3::ZERO, Vec3::Y, Vec2::splat(0.5)));
        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let (s, c) = angle.sin_cos();
            mesh.vertices.push(Vertex::new(
                Vec3::new(c * radius, 0.0, -s * radius),
                Vec3::Y,
                Vec2::new(0.5 + c * 0.5, 0.5 - s * 0.5),
            ));
        }
        for i in 1..=segments {
            mesh.indices.extend_from_slice(&[0, i, i + 1]);
        }

        mesh
    }

    /// Create a cylinder with capped ends
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let mut mesh = Self::frustum(radius, radius, height, segments, false);
        mesh.name = "cylinder".into();
        mesh
    }

    /// Create a truncated cone centred at the origin along Y
    ///
    /// `open_ended` leaves out the caps, which is how the hollow's walls are built.
    pub fn frustum(
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
        open_ended: bool,
    ) -> Self {
        let mut mesh = Mesh::new("frustum");
        let segments = segments.max(3);
        let half_height = height / 2.0;
        let slope = (radius_bottom - radius_top) / height.max(f32::EPSILON);

        for i in 0..=segments {
            let u = i as f32 / segments as f32;
            let (s, c) = (u * TAU).sin_cos();
            let normal = Vec3::new(s, slope, c).normalize();
            mesh.vertices.push(Vertex::new(
                Vec3::new(s * radius_bottom, -half_height, c * radius_bottom),
                normal,
                Vec2::new(u, 1.0),
            ));
            mesh.vertices.push(Vertex::new(
                Vec3::new(s * radius_top, half_height, c * radius_top),
                normal,
                Vec2::new(u, 0.0),
            ));
        }

        for i in 0..segments {
            let b0 = i * 2;
            let t0 = b0 + 1;
            let b1 = b0 + 2;
            let t1 = b0 + 3;
            mesh.indices.extend_from_slice(&[b0, b1, t0, t0, b1, t1]);
        }

        if !open_ended {
            for (y, radius, normal) in [
                (half_height, radius_top, Vec3::Y),
                (-half_height, radius_bottom, -Vec3::Y),
            ] {
                let center = mesh.vertices.len() as u32;
                mesh.vertices.push(Vertex::new(
                    Vec3::new(0.0, y, 0.0),
                    normal,
                    Vec2::splat(0.5),
                ));
                for i in 0..=segments {
                    let (s, c) = (i as f32 / segments as f32 * TAU).sin_cos();
                    mesh.vertices.push(Vertex::new(
                        Vec3::new(s * radius, y, c * radius),
                        normal,
                        Vec2::new(0.5 + s * 0.5, 0.5 + c * 0.5),
                    ));
                }
                for i in 1..=segments {
                    if normal.y > 0.0 {
                        mesh.indices
                            .extend_from_slice(&[center, center + i, center + i + 1]);
                    } else {
                        mesh.indices
                            .extend_from_slice(&[center, center + i + 1, center + i]);
                    }
                }
            }
        }

        mesh
    }

    /// Sweep a circle of `radius` along `path`; both ends stay open
    pub fn tube(path: &[Vec3], radius: f32, radial_segments: u32) -> Self {
        let mut mesh = Mesh::new("tube");
        if path.len() < 2 {
            return mesh;
        }
        let radial = radial_segments.max(3);

        let mut reference = if path[1].x == path[0].x && path[1].z == path[0].z {
            Vec3::X
        } else {
            Vec3::Y
        };
        for (i, &point) in path.iter().enumerate() {
            let prev = path[i.saturating_sub(1)];
            let next = path[(i + 1).min(path.len() - 1)];
            let tangent = (next - prev).normalize_or_zero();
            let tangent = if tangent == Vec3::ZERO { Vec3::NEG_Y } else { tangent };

            // Parallel transport: carry the previous ring's normal along the path
            let mut normal = reference - tangent * reference.dot(tangent);
            if normal.length_squared() < 1e-8 {
                normal = tangent.any_orthonormal_vector();
            }
            let normal = normal.normalize();
            let binormal = tangent.cross(normal);
            reference = normal;

            let v = i as f32 / (path.len() - 1) as f32;
            for j in 0..=radial {
                let u = j as f32 / radial as f32;
                let (s, c) = (u * TAU).sin_cos();
                let dir = (normal * c + binormal * s).normalize();
                mesh.vertices
                    .push(Vertex::new(point + dir * radius, dir, Vec2::new(u, v)));
            }
        }

        let stride = radial + 1;
        for i in 0..(path.len() as u32 - 1) {
            for j in 0..radial {
                let a = i * stride + j;
                let b = (i + 1) * stride + j;
                let c = (i + 1) * stride + j + 1;
                let d = i * stride + j + 1;
                mesh.indices.extend_from_slice(&[a, d, b, b, d, c]);
            }
        }

        mesh
    }

    /// Low-poly faceted rock (an icosahedron with flat normals)
    pub fn rock(radius: f32) -> Self {
        let mut mesh = Mesh::new("rock");
        let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let corners = [
            Vec3::new(-1.0, phi, 0.0),
            Vec3::new(1.0, phi, 0.0),
            Vec3::new(-1.0, -phi, 0.0),
            Vec3::new(1.0, -phi, 0.0),
            Vec3::new(0.0, -1.0, phi),
            Vec3::new(0.0, 1.0, phi),
            Vec3::new(0.0, -1.0, -phi),
            Vec3::new(0.0, 1.0, -phi),
            Vec3::new(phi, 0.0, -1.0),
            Vec3::new(phi, 0.0, 1.0),
            Vec3::new(-phi, 0.0, -1.0),
            Vec3::new(-phi, 0.0, 1.0),
        ]
        .map(|c| c.normalize() * radius);
        let faces: [[usize; 3]; 20] = [
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];

        for [a, b, c] in faces {
            let (mut pa, mut pb, pc) = (corners[a], corners[b], corners[c]);
            let mut normal = (pb - pa).cross(pc - pa).normalize();
            if normal.dot(pa + pb + pc) < 0.0 {
                std::mem::swap(&mut pa, &mut pb);
                normal = -normal;
            }
            let base = mesh.vertices.len() as u32;
            mesh.vertices.push(Vertex::new(pa, normal, Vec2::new(0.0, 0.0)));
            mesh.vertices.push(Vertex::new(pb, normal, Vec2::new(1.0, 0.0)));
            mesh.vertices.push(Vertex::new(pc, normal, Vec2::new(0.5, 1.0)));
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        mesh
    }

    /// Unindexed point list with per-point colours
    pub fn point_cloud(points: &[Vec3], colors: &[Vec4]) -> Self {
        let mut mesh = Mesh::new("points");
        mesh.topology = PrimitiveTopology::PointList;
        mesh.vertices = points
            .iter()
            .enumerate()
            .map(|(i, &p)| Vertex {
                position: p,
                normal: Vec3::Y,
                uv: Vec2::ZERO,
                color: colors.get(i).copied().unwrap_or(Vec4::ONE),
            })
            .collect();
        mesh
    }
}
