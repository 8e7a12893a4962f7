//! Interactive surfaces: scene nodes that respond to clicks and controller triggers

use std::collections::HashMap;
use std::fmt;

use crate::scene::{NodePath, SceneGraph, SceneNode};

pub use crate::error::DuplicateTagError;

/// Tag of the video screen on the stage
pub const VIDEO_SCREEN_TAG: &str = "video-screen";
/// Tag of the assistant panel in the hollow
pub const ASSISTANT_PANEL_TAG: &str = "assistant-panel";

/// What activating a surface does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceAction {
    TogglePlayback,
    ToggleAssistant,
}

impl SurfaceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceAction::TogglePlayback => "toggle-playback",
            SurfaceAction::ToggleAssistant => "toggle-assistant",
        }
    }
}

impl fmt::Display for SurfaceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged node and the action it triggers
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveSurface {
    pub tag: String,
    pub node: NodePath,
    pub action: SurfaceAction,
}

impl InteractiveSurface {
    pub fn new(tag: &str, node: NodePath, action: SurfaceAction) -> Self {
        Self {
            tag: tag.to_string(),
            node,
            action,
        }
    }
}

/// Tag-indexed set of interactive surfaces, in registration order
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: Vec<InteractiveSurface>,
    index: HashMap<String, usize>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surface under `tag`; the surface's own tag is replaced by `tag`
    pub fn register(
        &mut self,
        tag: &str,
        mut surface: InteractiveSurface,
    ) -> Result<(), DuplicateTagError> {
        if self.index.contains_key(tag) {
            return Err(DuplicateTagError {
                tag: tag.to_string(),
            });
        }
        surface.tag = tag.to_string();
        log::debug!("Registered surface {tag} ({})", surface.action);
        self.index.insert(tag.to_string(), self.surfaces.len());
        self.surfaces.push(surface);
        Ok(())
    }

    pub fn resolve(&self, tag: &str) -> Option<&InteractiveSurface> {
        self.index.get(tag).map(|&i| &self.surfaces[i])
    }

    /// The scene node a registered tag points at
    pub fn resolve_node<'g>(&self, graph: &'g SceneGraph, tag: &str) -> Option<&'g SceneNode> {
        self.resolve(tag).and_then(|surface| graph.node(&surface.node))
    }

    pub fn list_interactive(&self) -> &[InteractiveSurface] {
        &self.surfaces
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;

    #[test]
    fn duplicate_registration_fails_and_keeps_the_first() {
        let mut registry = SurfaceRegistry::new();
        let surface =
            InteractiveSurface::new(VIDEO_SCREEN_TAG, NodePath::default(), SurfaceAction::TogglePlayback);
        registry.register(VIDEO_SCREEN_TAG, surface.clone()).unwrap();

        let again = InteractiveSurface {
            action: SurfaceAction::ToggleAssistant,
            ..surface
        };
        let err = registry.register(VIDEO_SCREEN_TAG, again).unwrap_err();
        assert_eq!(err.tag, VIDEO_SCREEN_TAG);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.resolve(VIDEO_SCREEN_TAG).map(|s| s.action),
            Some(SurfaceAction::TogglePlayback)
        );
    }

    #[test]
    fn list_keeps_registration_order_and_resolves_nodes() {
        let mut graph = SceneGraph::new();
        let panel = graph
            .add_node(SceneNode::group("panel", Transform::default()).with_tag(ASSISTANT_PANEL_TAG))
            .unwrap();
        let screen = graph
            .add_node(SceneNode::group("screen", Transform::default()).with_tag(VIDEO_SCREEN_TAG))
            .unwrap();

        let mut registry = SurfaceRegistry::new();
        registry
            .register(
                ASSISTANT_PANEL_TAG,
                InteractiveSurface::new(ASSISTANT_PANEL_TAG, panel, SurfaceAction::ToggleAssistant),
            )
            .unwrap();
        registry
            .register(
                VIDEO_SCREEN_TAG,
                InteractiveSurface::new(VIDEO_SCREEN_TAG, screen, SurfaceAction::TogglePlayback),
            )
            .unwrap();

        let tags: Vec<&str> = registry
            .list_interactive()
            .iter()
            .map(|s| s.tag.as_str())
            .collect();
        assert_eq!(tags, [ASSISTANT_PANEL_TAG, VIDEO_SCREEN_TAG]);
        assert_eq!(
            registry
                .resolve_node(&graph, VIDEO_SCREEN_TAG)
                .map(|n| n.name.as_str()),
            Some("screen")
        );
        assert!(registry.resolve("missing").is_none());
    }
}
