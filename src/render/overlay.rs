//! The overlay path: widgets placed in the world, projected to screen quads and composited over
//! the 3D output

use std::time::Duration;

use glam::{Vec2, Vec3};
use image::RgbaImage;

use super::{RenderPath, RenderPathKind};
use crate::backend::{Backend, BackendResult, TextureViewHandle};
use crate::mirror::{Canvas, SharedWidget, TextRasterizer};
use crate::scene::Camera;
use crate::world::OverlayAnchor;

/// A widget shown at a world anchor
pub struct OverlayElement {
    pub anchor: OverlayAnchor,
    pub widget: SharedWidget,
}

/// Screen-space corners of a projected element, in pixels (origin top-left)
///
/// Order is top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenQuad {
    pub corners: [Vec2; 4],
    /// Mean NDC depth, used to draw far elements first
    pub depth: f32,
}

/// Everything a compositor needs for one frame
#[derive(Debug)]
pub struct OverlayFrame<'a> {
    pub size: (u32, u32),
    /// Elements whose pixels changed since the last frame
    pub updates: Vec<(usize, &'a RgbaImage)>,
    /// Visible elements, far to near
    pub quads: Vec<(usize, ScreenQuad)>,
}

/// Draws overlay quads on top of the 3D output
pub trait OverlayCompositor {
    /// Upload changed images and build this frame's draw data
    fn prepare(&mut self, backend: &mut Backend, frame: &OverlayFrame);

    /// Draw the prepared quads over `target`, keeping what is already there
    fn composite(&mut self, backend: &mut Backend, target: TextureViewHandle);

    fn release(&mut self, backend: &mut Backend);
}

/// Compositor that draws nothing; used headless and in tests
#[derive(Debug, Default, Clone)]
pub struct NullCompositor {
    pub uploads: usize,
    pub prepared_quads: usize,
    pub composites: usize,
    pub released: bool,
}

impl OverlayCompositor for NullCompositor {
    fn prepare(&mut self, _backend: &mut Backend, frame: &OverlayFrame) {
        self.uploads += frame.updates.len();
        self.prepared_quads = frame.quads.len();
    }

    fn composite(&mut self, _backend: &mut Backend, _target: TextureViewHandle) {
        self.composites += 1;
    }

    fn release(&mut self, _backend: &mut Backend) {
        self.released = true;
    }
}

struct ElementState {
    element: OverlayElement,
    image: RgbaImage,
    /// Widget revision last painted into `image`
    painted: Option<u64>,
}

/// Projects overlay elements through the camera and hands them to a compositor
pub struct OverlayPath {
    elements: Vec<ElementState>,
    compositor: Box<dyn OverlayCompositor>,
    visible: bool,
    pointer_through: bool,
    reverts: Vec<Duration>,
    width: u32,
    height: u32,
    released: bool,
}

impl OverlayPath {
    pub fn new(compositor: Box<dyn OverlayCompositor>, width: u32, height: u32) -> Self {
        Self {
            elements: Vec::new(),
            compositor,
            visible: true,
            pointer_through: false,
            reverts: Vec::new(),
            width,
            height,
            released: false,
        }
    }

    pub fn add_element(&mut self, element: OverlayElement) -> usize {
        let (w, h) = element.anchor.pixel_size;
        self.elements.push(ElementState {
            element,
            image: RgbaImage::new(w.max(1), h.max(1)),
            painted: None,
        });
        self.elements.len() - 1
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            log::debug!("Overlay {}", if visible { "shown" } else { "hidden" });
        }
        self.visible = visible;
    }

    /// Whether pointer events currently pass through the overlay to the 3D canvas
    pub fn pointer_through(&self) -> bool {
        self.pointer_through
    }

    /// Let pointer events through until `now + grace`
    ///
    /// Every call schedules its own revert; an earlier revert is not pushed back by a later call.
    pub fn enable_pointer_through(&mut self, now: Duration, grace: Duration) {
        self.pointer_through = true;
        self.reverts.push(now + grace);
    }

    /// Apply every revert that is due; returns how many fired
    pub fn expire_reverts(&mut self, now: Duration) -> usize {
        let before = self.reverts.len();
        self.reverts.retain(|&deadline| deadline > now);
        let fired = before - self.reverts.len();
        if fired > 0 {
            self.pointer_through = false;
        }
        fired
    }

    pub fn pending_reverts(&self) -> usize {
        self.reverts.len()
    }

    /// Project one element; `None` when any corner is behind the camera or the quad is off screen
    pub fn project(&self, anchor: &OverlayAnchor, camera: &Camera) -> Option<ScreenQuad> {
        let (w, h) = (anchor.pixel_size.0 as f32 / 2.0, anchor.pixel_size.1 as f32 / 2.0);
        let local = [
            Vec3::new(-w, h, 0.0),
            Vec3::new(w, h, 0.0),
            Vec3::new(w, -h, 0.0),
            Vec3::new(-w, -h, 0.0),
        ];
        let (sw, sh) = (self.width as f32, self.height as f32);
        let mut corners = [Vec2::ZERO; 4];
        let mut depth = 0.0;
        for (corner, point) in corners.iter_mut().zip(local) {
            let ndc = camera.project(anchor.world.transform_point3(point))?;
            *corner = Vec2::new((ndc.x + 1.0) / 2.0 * sw, (1.0 - ndc.y) / 2.0 * sh);
            depth += ndc.z / 4.0;
        }

        let min = corners.iter().fold(Vec2::splat(f32::INFINITY), |a, &c| a.min(c));
        let max = corners.iter().fold(Vec2::splat(f32::NEG_INFINITY), |a, &c| a.max(c));
        let on_screen = max.x >= 0.0 && max.y >= 0.0 && min.x <= sw && min.y <= sh;
        (on_screen && depth <= 1.0).then_some(ScreenQuad { corners, depth })
    }

    /// Repaint changed widgets, project every element and prepare the compositor
    ///
    /// Returns the number of elements on screen.
    pub fn render(&mut self, backend: &mut Backend, camera: &Camera) -> usize {
        if self.released {
            return 0;
        }
        let text = TextRasterizer::shared();
        let mut changed = Vec::new();
        for (index, state) in self.elements.iter_mut().enumerate() {
            let Ok(widget) = state.element.widget.try_borrow() else {
                continue;
            };
            let revision = widget.revision();
            let live = widget.live_frame();
            // live frames are repainted every frame, placeholders only when the widget changed
            if live.is_none() && state.painted == Some(revision) {
                continue;
            }
            match live {
                Some(frame) if frame.dimensions() == state.image.dimensions() => {
                    state.image.copy_from_slice(frame.as_raw());
                }
                Some(frame) => {
                    state.image = image::imageops::resize(
                        frame,
                        state.image.width(),
                        state.image.height(),
                        image::imageops::FilterType::Triangle,
                    );
                }
                None => widget.paint_placeholder(&mut Canvas::new(&mut state.image), text),
            }
            state.painted = Some(revision);
            changed.push(index);
        }

        let mut quads: Vec<(usize, ScreenQuad)> = self
            .elements
            .iter()
            .enumerate()
            .filter_map(|(i, s)| self.project(&s.element.anchor, camera).map(|q| (i, q)))
            .collect();
        quads.sort_by(|a, b| b.1.depth.total_cmp(&a.1.depth));

        let frame = OverlayFrame {
            size: (self.width, self.height),
            updates: changed.iter().map(|&i| (i, &self.elements[i].image)).collect(),
            quads,
        };
        self.compositor.prepare(backend, &frame);
        frame.quads.len()
    }

    /// Draw the prepared overlay over the 3D output
    pub fn composite(&mut self, backend: &mut Backend, target: TextureViewHandle) {
        if !self.released {
            self.compositor.composite(backend, target);
        }
    }
}

impl RenderPath for OverlayPath {
    fn kind(&self) -> RenderPathKind {
        RenderPathKind::Overlay
    }

    fn resize(&mut self, _backend: &mut Backend, width: u32, height: u32) -> BackendResult<()> {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn release(&mut self, backend: &mut Backend) {
        if self.released {
            return;
        }
        self.released = true;
        self.compositor.release(backend);
        self.reverts.clear();
        log::debug!("Overlay path released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use crate::mirror::{AssistantPanelWidget, VideoWidget};
    use glam::{Mat4, Quat};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn video_anchor() -> OverlayAnchor {
        OverlayAnchor {
            widget: "video".into(),
            world: Mat4::from_scale_rotation_translation(
                Vec3::splat(0.001),
                Quat::IDENTITY,
                Vec3::new(0.0, 2.2, -3.95),
            ),
            pixel_size: (1920, 1080),
        }
    }

    fn overlay() -> OverlayPath {
        OverlayPath::new(Box::new(NullCompositor::default()), 1280, 720)
    }

    #[test]
    fn video_projects_in_front_of_the_default_camera() {
        let path = overlay();
        let mut camera = Camera::default();
        camera.set_aspect(1280.0, 720.0);
        let quad = path.project(&video_anchor(), &camera).unwrap();
        let [tl, tr, br, bl] = quad.corners;
        assert!(tl.x < tr.x && bl.x < br.x);
        assert!(tl.y < bl.y);
        let centre = (tl + br) / 2.0;
        assert!((centre.x - 640.0).abs() < 1.0);
    }

    #[test]
    fn elements_behind_the_camera_are_dropped() {
        let path = overlay();
        let camera = Camera::new(Vec3::new(0.0, 2.2, -10.0), Vec3::new(0.0, 2.2, -20.0));
        assert!(path.project(&video_anchor(), &camera).is_none());
    }

    #[test]
    fn unchanged_placeholders_are_not_repainted() {
        let mut backend = Backend::Dummy(DummyBackend::new(1280, 720));
        let mut path = overlay();
        let panel = Rc::new(RefCell::new(AssistantPanelWidget::new()));
        path.add_element(OverlayElement {
            anchor: OverlayAnchor {
                pixel_size: (600, 800),
                ..video_anchor()
            },
            widget: panel.clone(),
        });
        path.add_element(OverlayElement {
            anchor: video_anchor(),
            widget: Rc::new(RefCell::new(VideoWidget::new("clip"))),
        });

        let camera = Camera::default();
        assert_eq!(path.render(&mut backend, &camera), 2);
        path.render(&mut backend, &camera);
        panel.borrow_mut().set_open(true);
        path.render(&mut backend, &camera);

        path.release(&mut backend);
        path.release(&mut backend);
        assert_eq!(path.render(&mut backend, &camera), 0);
    }

    #[test]
    fn every_activation_schedules_its_own_revert() {
        let mut path = overlay();
        path.enable_pointer_through(Duration::from_secs(0), Duration::from_secs(5));
        path.enable_pointer_through(Duration::from_secs(3), Duration::from_secs(5));
        assert_eq!(path.pending_reverts(), 2);

        assert_eq!(path.expire_reverts(Duration::from_secs(4)), 0);
        assert!(path.pointer_through());
        // the first click's timer fires even though a later click is still pending
        assert_eq!(path.expire_reverts(Duration::from_secs(5)), 1);
        assert!(!path.pointer_through());
        assert_eq!(path.expire_reverts(Duration::from_secs(8)), 1);
        assert_eq!(path.pending_reverts(), 0);
    }
}
