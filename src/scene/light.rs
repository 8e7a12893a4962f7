//! Light types for the scene

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Maximum number of spot lights the standard path uploads
pub const MAX_SPOT_LIGHTS: usize = 16;

/// Uniform light from every direction
#[derive(Debug, Clone, Copy)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// Directional light (like the sun), shining from `position` toward the origin
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl DirectionalLight {
    /// Direction the light travels in
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }
}

/// Cone light aimed at `target`
#[derive(Debug, Clone, Copy)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Distance at which the light reaches zero
    pub range: f32,
    /// Outer half-angle in radians
    pub angle: f32,
    /// Fraction of the cone that is softened, 0..1
    pub penumbra: f32,
}

impl SpotLight {
    /// Convert to GPU data format
    pub fn to_gpu_data(&self) -> GpuSpotLight {
        let direction = (self.target - self.position).normalize_or_zero();
        let outer = self.angle.cos();
        let inner = (self.angle * (1.0 - self.penumbra)).cos();
        GpuSpotLight {
            position_range: self.position.extend(self.range),
            color_intensity: self.color.extend(self.intensity),
            direction: direction.extend(0.0),
            cone: Vec4::new(inner, outer, 0.0, 0.0),
        }
    }
}

/// Exponential-squared fog
#[derive(Debug, Clone, Copy)]
pub struct Fog {
    pub color: Vec3,
    pub density: f32,
}

impl Fog {
    /// Fraction of the surface colour replaced by fog at `distance`
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

/// Every light affecting the stage, plus the clear colour and fog
#[derive(Debug, Clone)]
pub struct SceneLights {
    pub background: Vec3,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub spots: Vec<SpotLight>,
    pub fog: Option<Fog>,
}

impl SceneLights {
    pub fn uniform_data(&self) -> LightsUniformData {
        if self.spots.len() > MAX_SPOT_LIGHTS {
            log::warn!(
                "{} spot lights requested, only the first {} are uploaded",
                self.spots.len(),
                MAX_SPOT_LIGHTS
            );
        }
        let mut spots = [GpuSpotLight::zeroed(); MAX_SPOT_LIGHTS];
        for (slot, light) in spots.iter_mut().zip(&self.spots) {
            *slot = light.to_gpu_data();
        }
        let fog = self.fog.unwrap_or(Fog {
            color: self.background,
            density: 0.0,
        });

        LightsUniformData {
            ambient: self.ambient.color.extend(self.ambient.intensity),
            directional_direction: self.directional.direction().extend(0.0),
            directional_color: self
                .directional
                .color
                .extend(self.directional.intensity),
            fog: fog.color.extend(fog.density),
            counts: [self.spots.len().min(MAX_SPOT_LIGHTS) as u32, 0, 0, 0],
            spots,
        }
    }
}

/// GPU-friendly spot light
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuSpotLight {
    /// xyz = position, w = range
    pub position_range: Vec4,
    /// xyz = color, w = intensity
    pub color_intensity: Vec4,
    pub direction: Vec4,
    /// x = cos(inner angle), y = cos(outer angle)
    pub cone: Vec4,
}

/// Lights uniform for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightsUniformData {
    pub ambient: Vec4,
    pub directional_direction: Vec4,
    pub directional_color: Vec4,
    /// xyz = colour, w = density
    pub fog: Vec4,
    /// x = active spot count
    pub counts: [u32; 4],
    pub spots: [GpuSpotLight; MAX_SPOT_LIGHTS],
}
