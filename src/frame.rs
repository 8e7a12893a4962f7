//! The frame driver: mounts the stage, runs one frame per host tick and tears everything down

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backend::{Backend, GraphicsBackend};
use crate::collaborators::{
    AmbientAudio, AmbientSound, CredentialService, NoCredentials, SilentAudio, VoiceAssistant,
};
use crate::config::StageConfig;
use crate::error::{EngineError, EngineResult};
use crate::interaction::{Dispatch, Interaction, InteractionRouter};
use crate::mirror::{AssistantPanelWidget, MirrorSystem, SharedWidget, TestPatternSource, VideoWidget};
use crate::platform::{event_queue, EventQueue, ImmersivePlatform, ListenerHandle, PlatformEvent};
use crate::render::{DualRenderer, FrameReport, OverlayCompositor, OverlayElement, OverlayPath};
use crate::scene::{Camera, CameraInput};
use crate::session::{
    RejectReason, RequestOutcome, SessionController, SessionEffect, SessionEvent, SessionState,
};
use crate::surface::{SurfaceAction, SurfaceRegistry};
use crate::world::WorldBuilder;

/// Services the stage uses but does not own the implementation of
pub struct Collaborators {
    pub credentials: Box<dyn CredentialService>,
    pub audio: Box<dyn AmbientAudio>,
}

impl Collaborators {
    /// No token endpoint and a silent sink
    pub fn offline() -> Self {
        Self {
            credentials: Box::new(NoCredentials),
            audio: Box::new(SilentAudio::new()),
        }
    }

    /// The platform's real services, as far as `config` enables them
    pub fn from_config(config: &StageConfig) -> Self {
        let mut collaborators = Self::offline();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(endpoint) = config.voice.token_endpoint.as_deref() {
            collaborators.credentials = Box::new(crate::collaborators::HttpCredentialService::new(endpoint));
        }

        #[cfg(target_arch = "wasm32")]
        if config.audio.enabled {
            match crate::collaborators::HtmlAmbientAudio::new(&config.audio.source, config.audio.volume) {
                Ok(audio) => collaborators.audio = Box::new(audio),
                Err(err) => log::warn!("{}", err),
            }
        }

        collaborators
    }
}

/// Owns the whole mounted stage
pub struct FrameDriver {
    renderer: DualRenderer,
    session: SessionController,
    router: InteractionRouter,
    platform: Box<dyn ImmersivePlatform>,
    queue: EventQueue,
    listeners: Vec<ListenerHandle>,
    video: Rc<RefCell<VideoWidget>>,
    assistant: VoiceAssistant,
    audio: AmbientSound,
    rng: StdRng,
    viewport: (u32, u32),
    last_tick: Option<Duration>,
    notices: Vec<String>,
    torn_down: bool,
}

impl FrameDriver {
    /// Build the world and renderer and start the platform's one-time capability query
    ///
    /// Only failing to build the 3D side is fatal; audio and capability problems are recovered.
    pub fn mount(
        config: &StageConfig,
        backend: Backend,
        compositor: Box<dyn OverlayCompositor>,
        mut platform: Box<dyn ImmersivePlatform>,
        collaborators: Collaborators,
    ) -> EngineResult<Self> {
        let mut rng = match config.world.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let world = WorldBuilder::new(config.world.clone()).build(&mut rng)?;
        if world.fallback_placements > 0 {
            log::warn!(
                "{} decorations used fallback placement",
                world.fallback_placements
            );
        }

        let mut registry = SurfaceRegistry::new();
        for surface in world.surfaces.iter().cloned() {
            let tag = surface.tag.clone();
            registry.register(&tag, surface)?;
        }
        let router = InteractionRouter::new(registry).with_grace_window(config.interaction.grace_window());

        let mut video = VideoWidget::new(&config.mirror.video_title);
        if config.mirror.test_pattern {
            video = video.with_source(Box::new(TestPatternSource::new(VideoWidget::WIDTH, VideoWidget::HEIGHT)));
        }
        let video = Rc::new(RefCell::new(video));
        let panel = Rc::new(RefCell::new(AssistantPanelWidget::new()));
        let widgets: [SharedWidget; 2] = [video.clone(), panel.clone()];

        // binding order must match the world's VIDEO_MIRROR and ASSISTANT_MIRROR slots
        let mut mirrors = MirrorSystem::new();
        mirrors.bind(video.clone());
        mirrors.bind(panel.clone());

        let viewport = backend.surface_size();
        let mut overlay = OverlayPath::new(compositor, viewport.0, viewport.1);
        for anchor in world.overlay_anchors {
            let Some(widget) = widgets.iter().find(|w| w.borrow().name() == anchor.widget) else {
                log::warn!("No widget named {} for an overlay anchor", anchor.widget);
                continue;
            };
            overlay.add_element(OverlayElement {
                anchor,
                widget: widget.clone(),
            });
        }

        let renderer = DualRenderer::new(
            backend,
            world.graph,
            &world.lights,
            Camera::default(),
            mirrors,
            overlay,
        )
        .map_err(|e| EngineError::Initialization(e.to_string()))?;

        let queue = event_queue();
        let listeners = platform.attach(&queue);
        platform.query_capability(&queue);

        let mut audio = AmbientSound::new(collaborators.audio);
        if config.audio.enabled {
            audio.start();
        }

        let assistant = VoiceAssistant::new(collaborators.credentials)
            .with_participant(&config.voice.participant)
            .with_panel(panel);

        log::info!("Stage mounted ({} listeners)", listeners.len());
        Ok(Self {
            renderer,
            session: SessionController::new(),
            router,
            platform,
            queue,
            listeners,
            video,
            assistant,
            audio,
            rng,
            viewport,
            last_tick: None,
            notices: Vec::new(),
            torn_down: false,
        })
    }

    /// Queue shared with host callbacks
    pub fn queue(&self) -> EventQueue {
        self.queue.clone()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn renderer(&self) -> &DualRenderer {
        &self.renderer
    }

    pub fn router(&self) -> &InteractionRouter {
        &self.router
    }

    pub fn video(&self) -> &Rc<RefCell<VideoWidget>> {
        &self.video
    }

    pub fn assistant(&self) -> &VoiceAssistant {
        &self.assistant
    }

    pub fn audio(&self) -> &AmbientSound {
        &self.audio
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether the host should keep calling [`FrameDriver::tick`]
    pub fn is_scheduled(&self) -> bool {
        !self.torn_down
    }

    /// User-visible messages raised since the last call
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Process pending events, then render one frame
    ///
    /// `now` is the time since mount. Returns `None` once torn down.
    pub fn tick(&mut self, now: Duration, input: &CameraInput) -> EngineResult<Option<FrameReport>> {
        if self.torn_down {
            return Ok(None);
        }
        let dt = self.last_tick.map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_tick = Some(now);

        let events: Vec<PlatformEvent> = self.queue.lock().drain(..).collect();
        for event in events {
            self.handle_event(event, now);
        }

        if self.session.state() == SessionState::ExitingImmersive && !self.platform.is_presenting() {
            self.session.complete_exit();
        }
        self.renderer.overlay_mut().expire_reverts(now);

        let state = self.session.state();
        if state.is_immersive() {
            let pose = self.platform.head_pose();
            self.renderer.rig_mut().set_head_pose(pose);
        }
        match self.video.try_borrow_mut() {
            Ok(mut video) => video.advance(dt),
            Err(_) => log::debug!("Video widget busy, not advancing"),
        }

        let report = self.renderer.render_frame(state, input, dt)?;
        Ok(Some(report))
    }

    /// Ask the platform for an immersive session
    pub fn request_immersive(&mut self) -> RequestOutcome {
        if self.torn_down {
            return RequestOutcome::Rejected(RejectReason::Busy);
        }
        let outcome = self.session.request_immersive();
        if outcome == RequestOutcome::Requested {
            if let Err(err) = self.platform.request_session(&self.queue) {
                let effects = self.session.handle(SessionEvent::SessionError(err.to_string()));
                self.apply_effects(effects);
            }
        }
        outcome
    }

    /// Open or close the voice assistant; returns whether it is now open
    pub fn toggle_assistant(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.assistant.toggle(&mut self.rng)
    }

    /// Stop scheduling, detach listeners, end any session and free every resource
    ///
    /// Calling it again does nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        for listener in self.listeners.drain(..) {
            self.platform.detach(&listener);
        }
        if matches!(
            self.session.state(),
            SessionState::Requesting | SessionState::Immersive
        ) {
            self.platform.end_session();
        }
        self.audio.stop();
        self.renderer.release();
        self.queue.lock().clear();
        log::info!("Stage torn down");
    }

    fn handle_event(&mut self, event: PlatformEvent, now: Duration) {
        match event {
            PlatformEvent::Session(event) => {
                let effects = self.session.handle(event);
                self.apply_effects(effects);
            }
            PlatformEvent::Resize { width, height } => {
                if let Err(err) = self.renderer.resize(width, height) {
                    log::warn!("Resize to {}x{} incomplete: {}", width, height, err);
                }
                if width > 0 && height > 0 {
                    self.viewport = (width, height);
                }
            }
            PlatformEvent::PointerClick { x, y } => {
                self.interact(Interaction::PointerClick { x, y }, now);
            }
            PlatformEvent::ControllerTrigger(trigger) => {
                self.interact(Interaction::Trigger(trigger), now);
            }
        }
    }

    fn interact(&mut self, interaction: Interaction, now: Duration) {
        let viewport = Vec2::new(self.viewport.0 as f32, self.viewport.1 as f32);
        let dispatch = self.router.route(
            &interaction,
            self.renderer.graph(),
            self.renderer.camera(),
            viewport,
        );
        if let Some(dispatch) = dispatch {
            self.dispatch(dispatch, now);
        }
    }

    fn dispatch(&mut self, dispatch: Dispatch, now: Duration) {
        match dispatch.action {
            SurfaceAction::TogglePlayback => {
                match self.video.try_borrow_mut() {
                    Ok(mut video) => {
                        video.toggle_playback();
                    }
                    Err(_) => log::warn!("Video widget busy, click ignored"),
                }
                let overlay = self.renderer.overlay_mut();
                if let (Some(grace), true) = (dispatch.pointer_through, overlay.is_visible()) {
                    overlay.enable_pointer_through(now, grace);
                }
            }
            SurfaceAction::ToggleAssistant => {
                self.assistant.toggle(&mut self.rng);
            }
        }
    }

    fn apply_effects(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::OverlayVisible(visible) => self.renderer.overlay_mut().set_visible(visible),
                SessionEffect::MirrorsActive(active) => self.renderer.mirrors_mut().set_active(active),
                SessionEffect::Notice(message) => {
                    log::warn!("{}", message);
                    self.notices.push(message);
                }
            }
        }
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        self.teardown();
    }
}
