//! CPU texture data and its GPU counterpart

use crate::backend::traits::*;
use crate::backend::types::*;
use image::RgbaImage;

/// Tightly packed RGBA8 pixels
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub name: String,
}

impl TextureData {
    /// Take ownership of an image buffer
    pub fn from_image(image: RgbaImage, name: &str) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
            name: name.to_string(),
        }
    }

    /// Create a solid color texture
    pub fn solid_color(color: [u8; 4], name: &str) -> Self {
        Self {
            width: 1,
            height: 1,
            data: color.to_vec(),
            name: name.to_string(),
        }
    }

    /// Create a default white texture
    pub fn white() -> Self {
        Self::solid_color([255, 255, 255, 255], "white")
    }
}

/// GPU texture with its view
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub handle: TextureHandle,
    pub view: TextureViewHandle,
    pub width: u32,
    pub height: u32,
}

impl GpuTexture {
    /// Allocate a sampled texture without uploading anything
    pub fn allocate<B: GraphicsBackend + ?Sized>(
        backend: &mut B,
        label: &str,
        width: u32,
        height: u32,
    ) -> BackendResult<Self> {
        let handle = backend.create_texture(&TextureDescriptor::sampled(label, width, height))?;
        let view = match backend.create_texture_view(handle) {
            Ok(view) => view,
            Err(e) => {
                backend.destroy_texture(handle);
                return Err(e);
            }
        };
        Ok(Self {
            handle,
            view,
            width,
            height,
        })
    }

    /// Create and upload texture to GPU
    pub fn create<B: GraphicsBackend + ?Sized>(
        backend: &mut B,
        data: &TextureData,
    ) -> BackendResult<Self> {
        let texture = Self::allocate(backend, &data.name, data.width, data.height)?;
        texture.upload(backend, &data.data);
        Ok(texture)
    }

    /// Replace the whole texture contents
    pub fn upload<B: GraphicsBackend + ?Sized>(&self, backend: &mut B, rgba: &[u8]) {
        backend.write_texture(self.handle, rgba, self.width, self.height);
    }

    pub fn destroy<B: GraphicsBackend + ?Sized>(self, backend: &mut B) {
        backend.destroy_texture(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    #[test]
    fn create_uploads_once() {
        let mut backend = DummyBackend::new(8, 8);
        let image = RgbaImage::from_pixel(4, 2, image::Rgba([0, 100, 0, 255]));
        let tex = GpuTexture::create(&mut backend, &TextureData::from_image(image, "sign")).unwrap();
        assert_eq!(backend.texture_writes(tex.handle), 1);
        assert_eq!(backend.texture_size(tex.handle), Some((4, 2)));

        tex.destroy(&mut backend);
        assert_eq!(backend.live_textures(), 0);
    }
}
