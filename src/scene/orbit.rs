//! Desktop camera control: orbit around a target on drag, dolly on scroll, pan with the keys

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use super::Camera;

/// Input gathered by the host between two frames
#[derive(Debug, Clone, Default)]
pub struct CameraInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Doubles the pan speed
    pub sprint: bool,
    /// Pointer movement in pixels since the last frame
    pub mouse_delta: Vec2,
    /// Positive scrolls towards the target
    pub scroll_delta: f32,
    /// A drag is in progress; `mouse_delta` only orbits while this is set
    pub mouse_look_active: bool,
}

impl CameraInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_deltas(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }
}

/// Keeps the polar angle off the poles, where the view basis degenerates
const POLE_MARGIN: f32 = 1e-3;

/// Orbit around `target` in spherical coordinates
///
/// `theta` turns around +Y starting at +Z, `phi` is measured down from +Y. Each scroll notch
/// scales the radius by `dolly_scale`.
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub target: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Radians per dragged pixel
    pub rotate_speed: f32,
    pub dolly_scale: f32,
    /// World units per second
    pub pan_speed: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            radius: 1.0,
            theta: 0.0,
            phi: PI / 2.0,
            min_radius: 0.25,
            max_radius: 40.0,
            rotate_speed: 0.005,
            dolly_scale: 0.95,
            pan_speed: 3.0,
        }
    }
}

impl OrbitController {
    /// Pick up the camera's current placement so the first update leaves it in place
    pub fn looking_through(camera: &Camera) -> Self {
        let mut orbit = Self {
            target: camera.target,
            ..Self::default()
        };
        let offset = camera.position - camera.target;
        orbit.radius = offset.length().max(orbit.min_radius);
        orbit.theta = offset.x.atan2(offset.z);
        orbit.phi = (offset.y / orbit.radius).clamp(-1.0, 1.0).acos();
        orbit
    }

    pub fn position(&self) -> Vec3 {
        let ring = self.radius * self.phi.sin();
        self.target
            + Vec3::new(
                ring * self.theta.sin(),
                self.radius * self.phi.cos(),
                ring * self.theta.cos(),
            )
    }

    pub fn update(&mut self, camera: &mut Camera, input: &CameraInput, dt: f32) {
        if input.scroll_delta > 0.0 {
            self.radius *= self.dolly_scale;
        } else if input.scroll_delta < 0.0 {
            self.radius /= self.dolly_scale;
        }
        self.radius = self.radius.clamp(self.min_radius, self.max_radius);

        if input.mouse_look_active {
            // dragging right or down swings the camera the other way, like grabbing the scene
            self.theta -= input.mouse_delta.x * self.rotate_speed;
            self.phi -= input.mouse_delta.y * self.rotate_speed;
            self.phi = self.phi.clamp(POLE_MARGIN, PI - POLE_MARGIN);
        }

        let pan = self.pan_direction(input);
        if pan != Vec3::ZERO {
            let speed = self.pan_speed * if input.sprint { 2.0 } else { 1.0 };
            self.target += pan * speed * dt;
        }

        camera.position = self.position();
        camera.target = self.target;
        camera.up = Vec3::Y;
    }

    /// Unit direction of the held keys, with forward and right on the ground plane
    fn pan_direction(&self, input: &CameraInput) -> Vec3 {
        let forward = -Vec3::new(self.theta.sin(), 0.0, self.theta.cos());
        let right = Vec3::new(-forward.z, 0.0, forward.x);
        [
            (input.forward, forward),
            (input.backward, -forward),
            (input.right, right),
            (input.left, -right),
            (input.up, Vec3::Y),
            (input.down, Vec3::NEG_Y),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .map(|(_, dir)| dir)
        .sum::<Vec3>()
        .normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn at_rest(orbit: &mut OrbitController, camera: &mut Camera, input: CameraInput) {
        orbit.update(camera, &input, 0.016);
    }

    #[test]
    fn picking_up_a_camera_keeps_it_in_place() {
        let mut camera = Camera::new(Vec3::new(2.0, 3.0, 4.0), Vec3::new(0.0, 1.6, 0.0));
        let before = camera.position;
        let mut orbit = OrbitController::looking_through(&camera);
        at_rest(&mut orbit, &mut camera, CameraInput::new());
        assert_relative_eq!(camera.position.x, before.x, epsilon = 1e-4);
        assert_relative_eq!(camera.position.y, before.y, epsilon = 1e-4);
        assert_relative_eq!(camera.position.z, before.z, epsilon = 1e-4);
    }

    #[test]
    fn scrolling_dollies_within_bounds() {
        let mut camera = Camera::default();
        let mut orbit = OrbitController::looking_through(&camera);
        let scroll = |delta| CameraInput {
            scroll_delta: delta,
            ..Default::default()
        };
        at_rest(&mut orbit, &mut camera, scroll(1.0));
        assert_relative_eq!(orbit.radius, 3.0 * 0.95, epsilon = 1e-5);

        for _ in 0..500 {
            at_rest(&mut orbit, &mut camera, scroll(-1.0));
        }
        assert_relative_eq!(orbit.radius, orbit.max_radius);
    }

    #[test]
    fn dragging_never_flips_over_the_pole() {
        let mut camera = Camera::default();
        let mut orbit = OrbitController::looking_through(&camera);
        let drag = CameraInput {
            mouse_look_active: true,
            mouse_delta: Vec2::new(0.0, 10_000.0),
            ..Default::default()
        };
        at_rest(&mut orbit, &mut camera, drag);
        assert_relative_eq!(orbit.phi, POLE_MARGIN);
        assert!(camera.position.y > camera.target.y);
    }

    #[test]
    fn forward_pans_towards_where_the_camera_looks() {
        let mut camera = Camera::default();
        let mut orbit = OrbitController::looking_through(&camera);
        let input = CameraInput {
            forward: true,
            ..Default::default()
        };
        orbit.update(&mut camera, &input, 1.0);
        // the default camera looks down -Z
        assert_relative_eq!(orbit.target.z, -3.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.z, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn releasing_the_button_stops_orbiting() {
        let mut camera = Camera::default();
        let mut orbit = OrbitController::looking_through(&camera);
        let hover = CameraInput {
            mouse_delta: Vec2::new(50.0, 50.0),
            ..Default::default()
        };
        let theta = orbit.theta;
        at_rest(&mut orbit, &mut camera, hover);
        assert_relative_eq!(orbit.theta, theta);
    }
}
