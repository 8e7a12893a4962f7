//! Owner of the camera and both render paths

use std::time::Duration;

use super::{FrameReport, OverlayPath, RenderPath, RenderPathKind, StandardPath};
use crate::backend::{Backend, BackendResult, GraphicsBackend};
use crate::mirror::MirrorSystem;
use crate::scene::{Camera, CameraInput, CameraRig, SceneGraph, SceneLights};
use crate::session::SessionState;

/// Renders the 3D scene and, outside immersive sessions, the overlay on top of it
///
/// The renderer is the only owner of the scene graph, camera rig and mirror bindings.
pub struct DualRenderer {
    backend: Backend,
    graph: SceneGraph,
    rig: CameraRig,
    mirrors: MirrorSystem,
    standard: StandardPath,
    overlay: OverlayPath,
    frame_index: u64,
    released: bool,
}

impl DualRenderer {
    /// Create mirror textures, upload the scene and size both paths to the backend's surface
    pub fn new(
        mut backend: Backend,
        graph: SceneGraph,
        lights: &SceneLights,
        camera: Camera,
        mut mirrors: MirrorSystem,
        mut overlay: OverlayPath,
    ) -> BackendResult<Self> {
        let (width, height) = backend.surface_size();
        mirrors.prime();
        mirrors.create_textures(&mut backend)?;
        let standard = StandardPath::new(&mut backend, &graph, lights, &mirrors, width, height)?;
        overlay.resize(&mut backend, width, height)?;

        let mut rig = CameraRig::new(camera);
        rig.set_aspect(width, height);

        log::info!(
            "Renderer ready on {} ({}x{}, {} objects, {} mirrors)",
            backend.name(),
            width,
            height,
            standard.object_count(),
            mirrors.bindings().len()
        );

        Ok(Self {
            backend,
            graph,
            rig,
            mirrors,
            standard,
            overlay,
            frame_index: 0,
            released: false,
        })
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut Backend {
        &mut self.backend
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    pub fn camera(&self) -> &Camera {
        self.rig.camera()
    }

    pub fn mirrors(&self) -> &MirrorSystem {
        &self.mirrors
    }

    pub fn mirrors_mut(&mut self) -> &mut MirrorSystem {
        &mut self.mirrors
    }

    pub fn standard(&self) -> &StandardPath {
        &self.standard
    }

    pub fn overlay(&self) -> &OverlayPath {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut OverlayPath {
        &mut self.overlay
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Render one frame for `state`
    pub fn render_frame(
        &mut self,
        state: SessionState,
        input: &CameraInput,
        dt: Duration,
    ) -> BackendResult<FrameReport> {
        if self.released {
            return Ok(FrameReport::default());
        }
        let immersive = state.is_immersive();
        self.rig.update(immersive, input, dt.as_secs_f32());

        let frame = self.backend.begin_frame()?;
        let mut report = FrameReport {
            immersive,
            ..Default::default()
        };

        if immersive {
            report.mirror_refreshes = self.mirrors.refresh();
            report.textures_uploaded = self.mirrors.upload(&mut self.backend);
            report.draw_calls = self.standard.render(&mut self.backend, &frame, self.rig.camera());
            report.paths.push(RenderPathKind::Standard);
        } else {
            let overlay_visible = self.overlay.is_visible();
            if overlay_visible {
                report.overlay_elements = self.overlay.render(&mut self.backend, self.rig.camera());
                report.paths.push(RenderPathKind::Overlay);
            }
            report.draw_calls = self.standard.render(&mut self.backend, &frame, self.rig.camera());
            report.paths.push(RenderPathKind::Standard);
            if overlay_visible {
                self.overlay.composite(&mut self.backend, frame.swapchain_view);
            }
        }

        self.backend.end_frame()?;
        self.frame_index += 1;
        log::trace!("Frame {}: {:?}", self.frame_index, report);
        Ok(report)
    }

    /// Resize the surface, the camera aspect and both path targets
    ///
    /// Zero-sized requests (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> BackendResult<()> {
        if self.released {
            return Ok(());
        }
        if width == 0 || height == 0 {
            log::debug!("Ignoring zero-sized resize to {}x{}", width, height);
            return Ok(());
        }
        self.backend.resize(width, height);
        self.rig.set_aspect(width, height);
        let (target_w, target_h) = self.backend.surface_size();
        if (target_w, target_h) != (width, height) {
            log::warn!(
                "Surface clamped to {}x{} (requested {}x{})",
                target_w,
                target_h,
                width,
                height
            );
        }
        self.standard.resize(&mut self.backend, target_w, target_h)?;
        self.overlay.resize(&mut self.backend, target_w, target_h)?;
        Ok(())
    }

    /// Free every GPU resource; later frames render nothing
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.overlay.release(&mut self.backend);
        self.standard.release(&mut self.backend);
        self.mirrors.release(&mut self.backend);
        log::info!("Renderer released after {} frames", self.frame_index);
    }
}
