//! The camera shared by both render paths and its two sources of truth

use glam::{Quat, Vec3};

use super::{Camera, CameraInput, OrbitController, Ray};

/// A tracked position and orientation (head or controller)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Looking along local -Z
    pub fn forward(&self) -> Vec3 {
        self.orientation * -Vec3::Z
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    /// Ray from the pose along its forward direction
    pub fn ray(&self) -> Ray {
        Ray::new(self.position, self.forward())
    }
}

/// Camera plus the orbit controller (desktop) and the latest head pose (immersive)
#[derive(Debug, Clone)]
pub struct CameraRig {
    camera: Camera,
    orbit: OrbitController,
    head_pose: Option<Pose>,
}

impl CameraRig {
    pub fn new(camera: Camera) -> Self {
        let orbit = OrbitController::looking_through(&camera);
        Self {
            camera,
            orbit,
            head_pose: None,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn aspect(&self) -> f32 {
        self.camera.aspect()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width as f32, height as f32);
    }

    pub fn set_head_pose(&mut self, pose: Option<Pose>) {
        self.head_pose = pose;
    }

    pub fn head_pose(&self) -> Option<Pose> {
        self.head_pose
    }

    /// Drive the camera from whichever source is authoritative
    ///
    /// While immersive the head pose wins and orbit input is ignored; without a pose the
    /// camera keeps its last placement. Otherwise the orbit controller moves the camera.
    pub fn update(&mut self, immersive: bool, input: &CameraInput, dt: f32) {
        if immersive {
            if let Some(pose) = self.head_pose {
                self.camera.position = pose.position;
                self.camera.target = pose.position + pose.forward();
                self.camera.up = pose.up();
            }
        } else {
            self.orbit.update(&mut self.camera, input, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn head_pose_drives_the_camera_only_when_immersive() {
        let mut rig = CameraRig::new(Camera::default());
        let pose = Pose::new(
            Vec3::new(1.0, 1.7, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        rig.set_head_pose(Some(pose));

        rig.update(false, &CameraInput::default(), 0.016);
        assert_relative_eq!(rig.camera().position.z, 3.0, epsilon = 1e-4);

        rig.update(true, &CameraInput::default(), 0.016);
        assert_relative_eq!(rig.camera().position.x, 1.0);
        assert_relative_eq!(rig.camera().forward().x, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn aspect_is_exact() {
        let mut rig = CameraRig::new(Camera::default());
        rig.set_aspect(1920, 1080);
        assert_eq!(rig.aspect(), 1920.0 / 1080.0);
    }
}
