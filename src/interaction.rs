//! Turning clicks and controller triggers into surface actions

use std::time::Duration;

use glam::{Vec2, Vec3};

use crate::scene::{raycast, Camera, Pose, Ray, SceneGraph};
use crate::surface::{SurfaceAction, SurfaceRegistry};

/// How long pointer events pass through the overlay after the video is clicked
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(5);

/// A controller trigger press, as a world-space ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerTrigger {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl ControllerTrigger {
    /// Aim along the controller's -Z
    pub fn from_pose(pose: &Pose) -> Self {
        Self {
            origin: pose.position,
            direction: pose.forward(),
        }
    }
}

/// Input the router can resolve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// Viewport pixels, origin top-left
    PointerClick { x: f32, y: f32 },
    Trigger(ControllerTrigger),
}

/// A resolved activation
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub tag: String,
    pub action: SurfaceAction,
    /// Distance along the ray to the hit
    pub distance: f32,
    /// Let pointer events through the overlay for this long
    pub pointer_through: Option<Duration>,
}

/// Resolves interactions against the registered surfaces
#[derive(Debug)]
pub struct InteractionRouter {
    registry: SurfaceRegistry,
    grace: Duration,
}

impl InteractionRouter {
    pub fn new(registry: SurfaceRegistry) -> Self {
        Self {
            registry,
            grace: DEFAULT_GRACE_WINDOW,
        }
    }

    pub fn with_grace_window(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn grace_window(&self) -> Duration {
        self.grace
    }

    /// The world-space ray an interaction casts
    pub fn ray_for(&self, interaction: &Interaction, camera: &Camera, viewport: Vec2) -> Ray {
        match *interaction {
            Interaction::PointerClick { x, y } => {
                camera.ray_from_viewport(x, y, viewport.x.max(1.0), viewport.y.max(1.0))
            }
            Interaction::Trigger(trigger) => Ray::new(trigger.origin, trigger.direction),
        }
    }

    /// Find the surface the interaction activates
    ///
    /// Only the nearest hit counts: a surface hidden behind another object is not activated.
    pub fn route(
        &self,
        interaction: &Interaction,
        graph: &SceneGraph,
        camera: &Camera,
        viewport: Vec2,
    ) -> Option<Dispatch> {
        let ray = self.ray_for(interaction, camera, viewport);
        let hit = raycast(graph, &ray)?;
        let Some(surface) = hit.tag.as_deref().and_then(|tag| self.registry.resolve(tag)) else {
            log::trace!("Nearest hit {:?} is not interactive", hit.path);
            return None;
        };

        // On desktop the overlay sits over the video; let clicks reach the canvas for a while
        let pointer_through = match (surface.action, interaction) {
            (SurfaceAction::TogglePlayback, Interaction::PointerClick { .. }) => Some(self.grace),
            _ => None,
        };
        log::debug!("Dispatching {} to {}", surface.action, surface.tag);
        Some(Dispatch {
            tag: surface.tag.clone(),
            action: surface.action,
            distance: hit.distance,
            pointer_through,
        })
    }
}
