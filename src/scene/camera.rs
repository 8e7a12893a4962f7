//! Perspective camera, projection to the screen and picking rays

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use super::Ray;

/// Perspective projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self::perspective(75.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Projection {
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// Eye, look-at target and lens; the stage uses a 75° lens like a person's field of view
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, 3.0),
            target: Vec3::new(0.0, 1.6, 0.0),
            up: Vec3::Y,
            projection: Projection::default(),
        }
    }
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            projection: Projection::default(),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    pub fn aspect(&self) -> f32 {
        self.projection.aspect
    }

    /// Update aspect ratio from an output size
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.projection.aspect = width / height;
    }

    /// Project a world point into normalized device coordinates; `None` behind the camera
    pub fn project(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.view_projection_matrix() * point.extend(1.0);
        (clip.w > 0.0).then(|| clip.truncate() / clip.w)
    }

    /// Ray through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_projection_matrix().inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }

    /// Ray through a pixel of a `width`×`height` viewport (origin top-left)
    pub fn ray_from_viewport(&self, x: f32, y: f32, width: f32, height: f32) -> Ray {
        let ndc = Vec2::new(x / width * 2.0 - 1.0, -(y / height * 2.0 - 1.0));
        self.ray_from_ndc(ndc)
    }

    pub fn uniform_data(&self) -> CameraUniformData {
        CameraUniformData {
            view_proj: self.view_projection_matrix(),
            position: self.position.extend(1.0),
            near_far: Vec4::new(self.projection.near, self.projection.far, 0.0, 0.0),
        }
    }
}

/// Frame uniform block shared by every standard-path shader
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniformData {
    pub view_proj: Mat4,
    pub position: Vec4,
    pub near_far: Vec4,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_ray_points_at_target() {
        let camera = Camera::default();
        let ray = camera.ray_from_viewport(400.0, 300.0, 800.0, 600.0);
        assert_relative_eq!(ray.direction.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-4);
    }

    #[test]
    fn projected_points_unproject_back() {
        let camera = Camera::default();
        let point = Vec3::new(0.5, 2.0, -4.0);
        let ndc = camera.project(point).unwrap();
        let ray = camera.ray_from_ndc(ndc.truncate());
        let to_point = (point - ray.origin).normalize();
        assert_relative_eq!(to_point.dot(ray.direction), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn points_behind_the_camera_do_not_project() {
        let camera = Camera::default();
        assert!(camera.project(Vec3::new(0.0, 1.6, 10.0)).is_none());
    }
}
