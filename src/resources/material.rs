//! Material definitions for the standard path

use crate::backend::types::CullMode;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Which faces of a surface are drawn (and hit by rays)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

impl Side {
    pub fn cull_mode(self) -> CullMode {
        match self {
            Side::Front => CullMode::Back,
            Side::Back => CullMode::Front,
            Side::Double => CullMode::None,
        }
    }
}

/// Surface material
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color: Vec4,
    pub roughness: f32,
    pub side: Side,
    /// Skip lighting and fog; used for mirrored surfaces so they read at full brightness
    pub unlit: bool,
    /// Blend with alpha; `base_color.w` is the opacity
    pub transparent: bool,
    /// Sampled texture slot (None means the default white texture)
    pub texture: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: Vec4::ONE,
            roughness: 0.5,
            side: Side::Front,
            unlit: false,
            transparent: false,
            texture: None,
        }
    }
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Opaque lit material from an 0xRRGGBB colour
    pub fn standard(name: &str, hex: u32, roughness: f32) -> Self {
        Self::new(name)
            .with_base_color(hex_color(hex).extend(1.0))
            .with_roughness(roughness)
    }

    pub fn with_base_color(mut self, color: Vec4) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.base_color.w = opacity;
        self.transparent = opacity < 1.0;
        self
    }

    /// Alpha-blend without changing the base opacity (for textures with their own alpha)
    pub fn blended(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn with_texture(mut self, slot: usize) -> Self {
        self.texture = Some(slot);
        self
    }

    pub fn unlit(mut self) -> Self {
        self.unlit = true;
        self
    }

    /// Create a uniform data struct for GPU
    pub fn uniform_data(&self) -> MaterialUniformData {
        MaterialUniformData {
            base_color: self.base_color,
            params: [
                self.roughness,
                if self.unlit { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }
}

/// Convert an 0xRRGGBB value into linear-ish float RGB in [0, 1]
pub fn hex_color(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Material uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniformData {
    pub base_color: Vec4,
    pub params: [f32; 4], // x=roughness, y=unlit, zw=padding
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hex_colors_unpack_per_channel() {
        let c = hex_color(0x0a380a);
        assert_relative_eq!(c.x, 10.0 / 255.0);
        assert_relative_eq!(c.y, 56.0 / 255.0);
        assert_relative_eq!(c.z, 10.0 / 255.0);
    }

    #[test]
    fn opacity_below_one_turns_on_blending() {
        let pond = Material::standard("pond", 0x1e90ff, 0.2).with_opacity(0.7);
        assert!(pond.transparent);
        assert_relative_eq!(pond.base_color.w, 0.7);
        assert!(!Material::default().with_opacity(1.0).transparent);
    }

    #[test]
    fn back_side_culls_front_faces() {
        assert_eq!(Side::Back.cull_mode(), CullMode::Front);
        assert_eq!(Side::Double.cull_mode(), CullMode::None);
    }
}
