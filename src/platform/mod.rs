//! Host and immersive-runtime integration
//!
//! Everything asynchronous (capability answers, session notifications, host input) arrives as a
//! [`PlatformEvent`] on the shared [`EventQueue`] and is consumed between frames.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::interaction::ControllerTrigger;
use crate::scene::Pose;
use crate::session::SessionEvent;

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(target_arch = "wasm32")]
pub use web::WebXrPlatform;

/// Input delivered to the frame driver
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Session(SessionEvent),
    Resize { width: u32, height: u32 },
    /// Viewport pixels, origin top-left
    PointerClick { x: f32, y: f32 },
    ControllerTrigger(ControllerTrigger),
}

/// Events waiting for the next frame boundary
pub type EventQueue = Arc<Mutex<VecDeque<PlatformEvent>>>;

pub fn event_queue() -> EventQueue {
    Arc::new(Mutex::new(VecDeque::new()))
}

/// Push onto a queue from any callback
pub fn post(queue: &EventQueue, event: PlatformEvent) {
    queue.lock().push_back(event);
}

/// A registered host or runtime listener; hand it back to detach
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    pub id: u64,
    pub name: &'static str,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("immersive sessions are not available on this platform")]
    Unavailable,
    #[error("session request failed: {0}")]
    Request(String),
}

/// A runtime session that is requested now and granted later
///
/// Ending a request that has not been granted yet cancels it: the session it eventually
/// resolves to is handed back by [`PendingSession::resolve`] so the caller can end it.
#[derive(Debug)]
pub struct PendingSession<S> {
    session: Option<S>,
    pending: bool,
    cancelled: bool,
    presenting: bool,
}

impl<S> Default for PendingSession<S> {
    fn default() -> Self {
        Self {
            session: None,
            pending: false,
            cancelled: false,
            presenting: false,
        }
    }
}

impl<S> PendingSession<S> {
    pub fn begin(&mut self) {
        self.pending = true;
        self.cancelled = false;
    }

    /// Keep a granted session, or return it when the request was cancelled meanwhile
    pub fn resolve(&mut self, session: S) -> Result<(), S> {
        self.pending = false;
        if self.cancelled {
            return Err(session);
        }
        self.session = Some(session);
        self.presenting = true;
        Ok(())
    }

    /// The request was refused; returns whether the requester still wants to hear about it
    pub fn fail(&mut self) -> bool {
        self.pending = false;
        !self.cancelled
    }

    /// The runtime stopped presenting on its own
    pub fn ended(&mut self) {
        self.presenting = false;
    }

    /// Cancel a pending request and take the live session, if any, to end it
    pub fn cancel(&mut self) -> Option<S> {
        self.cancelled = self.pending;
        self.presenting = false;
        self.session.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_presenting(&self) -> bool {
        self.presenting
    }

    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }
}

/// The immersive runtime
pub trait ImmersivePlatform {
    /// Start the one-time capability query; the answer arrives as
    /// [`SessionEvent::CapabilityResolved`]
    fn query_capability(&mut self, queue: &EventQueue);

    /// Ask for a session; the answer arrives as `SessionStarted` or `SessionError`
    fn request_session(&mut self, queue: &EventQueue) -> Result<(), PlatformError>;

    fn end_session(&mut self);

    /// Whether the runtime still presents to the headset
    fn is_presenting(&self) -> bool;

    fn head_pose(&self) -> Option<Pose>;

    /// Register the runtime's session listeners
    fn attach(&mut self, queue: &EventQueue) -> Vec<ListenerHandle>;

    fn detach(&mut self, handle: &ListenerHandle);
}

/// A platform without an immersive runtime
#[derive(Debug, Default)]
pub struct DesktopPlatform {
    next_listener: u64,
    attached: Vec<ListenerHandle>,
}

impl DesktopPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImmersivePlatform for DesktopPlatform {
    fn query_capability(&mut self, queue: &EventQueue) {
        post(queue, PlatformEvent::Session(SessionEvent::CapabilityResolved(Ok(false))));
    }

    fn request_session(&mut self, _queue: &EventQueue) -> Result<(), PlatformError> {
        Err(PlatformError::Unavailable)
    }

    fn end_session(&mut self) {}

    fn is_presenting(&self) -> bool {
        false
    }

    fn head_pose(&self) -> Option<Pose> {
        None
    }

    fn attach(&mut self, _queue: &EventQueue) -> Vec<ListenerHandle> {
        self.next_listener += 1;
        let handle = ListenerHandle {
            id: self.next_listener,
            name: "resize",
        };
        self.attached.push(handle.clone());
        vec![handle]
    }

    fn detach(&mut self, handle: &ListenerHandle) {
        self.attached.retain(|h| h != handle);
    }
}

#[derive(Debug, Default)]
struct Script {
    capability: Option<Result<bool, String>>,
    queue: Option<EventQueue>,
    requests: usize,
    ends: usize,
    discarded: usize,
    session: PendingSession<()>,
    head_pose: Option<Pose>,
    listeners: Vec<ListenerHandle>,
    next_listener: u64,
    refuse: Option<String>,
}

/// Immersive runtime driven by hand, for tests and headless runs
///
/// Clones share their state, so a test keeps one clone and hands another to the driver.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPlatform {
    script: Rc<RefCell<Script>>,
}

impl ScriptedPlatform {
    /// A runtime whose capability query answers `supported`
    pub fn new(supported: bool) -> Self {
        Self::answering(Ok(supported))
    }

    /// A runtime whose capability query answers with `answer`
    pub fn answering(answer: Result<bool, String>) -> Self {
        let platform = Self::default();
        platform.script.borrow_mut().capability = Some(answer);
        platform
    }

    /// A runtime whose capability query never answers
    pub fn silent() -> Self {
        Self::default()
    }

    /// Make the next session request fail synchronously
    pub fn refuse_requests(&self, reason: &str) {
        self.script.borrow_mut().refuse = Some(reason.to_string());
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(queue) = self.script.borrow().queue.as_ref() {
            post(queue, PlatformEvent::Session(event));
        }
    }

    /// The runtime grants the pending request
    ///
    /// A grant that arrives after the request was ended is discarded without notification.
    pub fn start_session(&self) {
        let granted = {
            let mut script = self.script.borrow_mut();
            let granted = script.session.resolve(()).is_ok();
            if !granted {
                script.discarded += 1;
            }
            granted
        };
        if granted {
            self.emit(SessionEvent::SessionStarted);
        }
    }

    /// The user left the session from the headset; presentation stops at the next frame
    pub fn end_from_device(&self) {
        self.emit(SessionEvent::SessionEnded);
    }

    /// Stop presenting without further notification
    pub fn stop_presenting(&self) {
        self.script.borrow_mut().session.ended();
    }

    pub fn fail(&self, reason: &str) {
        let wanted = {
            let mut script = self.script.borrow_mut();
            script.session.ended();
            script.session.fail()
        };
        if wanted {
            self.emit(SessionEvent::SessionError(reason.to_string()));
        }
    }

    pub fn set_head_pose(&self, pose: Option<Pose>) {
        self.script.borrow_mut().head_pose = pose;
    }

    pub fn requests(&self) -> usize {
        self.script.borrow().requests
    }

    pub fn ends(&self) -> usize {
        self.script.borrow().ends
    }

    /// Sessions granted after their request was ended, and ended straight away
    pub fn discarded_sessions(&self) -> usize {
        self.script.borrow().discarded
    }

    pub fn attached_listeners(&self) -> usize {
        self.script.borrow().listeners.len()
    }
}

impl ImmersivePlatform for ScriptedPlatform {
    fn query_capability(&mut self, queue: &EventQueue) {
        let mut script = self.script.borrow_mut();
        script.queue = Some(queue.clone());
        if let Some(answer) = script.capability.clone() {
            post(queue, PlatformEvent::Session(SessionEvent::CapabilityResolved(answer)));
        }
    }

    fn request_session(&mut self, queue: &EventQueue) -> Result<(), PlatformError> {
        let mut script = self.script.borrow_mut();
        script.queue = Some(queue.clone());
        script.requests += 1;
        match script.refuse.take() {
            Some(reason) => Err(PlatformError::Request(reason)),
            None => {
                script.session.begin();
                Ok(())
            }
        }
    }

    fn end_session(&mut self) {
        let mut script = self.script.borrow_mut();
        script.ends += 1;
        script.session.cancel();
    }

    fn is_presenting(&self) -> bool {
        self.script.borrow().session.is_presenting()
    }

    fn head_pose(&self) -> Option<Pose> {
        self.script.borrow().head_pose
    }

    fn attach(&mut self, queue: &EventQueue) -> Vec<ListenerHandle> {
        let mut script = self.script.borrow_mut();
        script.queue = Some(queue.clone());
        let handles: Vec<ListenerHandle> = ["sessionstart", "sessionend", "resize"]
            .into_iter()
            .map(|name| {
                script.next_listener += 1;
                ListenerHandle {
                    id: script.next_listener,
                    name,
                }
            })
            .collect();
        script.listeners.extend(handles.iter().cloned());
        handles
    }

    fn detach(&mut self, handle: &ListenerHandle) {
        self.script.borrow_mut().listeners.retain(|h| h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_reports_no_immersive_support() {
        let queue = event_queue();
        let mut platform = DesktopPlatform::new();
        platform.query_capability(&queue);
        assert_eq!(
            queue.lock().pop_front(),
            Some(PlatformEvent::Session(SessionEvent::CapabilityResolved(Ok(false))))
        );
        assert_eq!(platform.request_session(&queue), Err(PlatformError::Unavailable));
        assert!(!platform.is_presenting());
    }

    #[test]
    fn granted_sessions_are_kept_until_cancelled() {
        let mut slot = PendingSession::default();
        slot.begin();
        assert!(slot.is_pending());
        assert_eq!(slot.resolve("session"), Ok(()));
        assert!(slot.is_presenting());
        assert_eq!(slot.session(), Some(&"session"));

        assert_eq!(slot.cancel(), Some("session"));
        assert!(!slot.is_presenting());
        assert_eq!(slot.cancel(), None);
    }

    #[test]
    fn a_grant_after_cancellation_is_handed_back() {
        let mut slot = PendingSession::default();
        slot.begin();
        assert_eq!(slot.cancel(), None);
        assert_eq!(slot.resolve("late"), Err("late"));
        assert!(!slot.is_presenting());
        assert!(slot.session().is_none());

        // a new request starts clean
        slot.begin();
        assert_eq!(slot.resolve("next"), Ok(()));
        assert!(slot.is_presenting());
    }

    #[test]
    fn refusals_after_cancellation_go_unreported() {
        let mut slot = PendingSession::<()>::default();
        slot.begin();
        assert!(slot.fail());
        slot.begin();
        slot.cancel();
        assert!(!slot.fail());
    }

    #[test]
    fn scripted_clones_share_state() {
        let queue = event_queue();
        let handle = ScriptedPlatform::new(true);
        let mut platform: Box<dyn ImmersivePlatform> = Box::new(handle.clone());

        let listeners = platform.attach(&queue);
        assert_eq!(handle.attached_listeners(), 3);
        platform.request_session(&queue).unwrap();
        handle.start_session();
        assert!(platform.is_presenting());
        assert_eq!(
            queue.lock().pop_back(),
            Some(PlatformEvent::Session(SessionEvent::SessionStarted))
        );

        for listener in &listeners {
            platform.detach(listener);
        }
        assert_eq!(handle.attached_listeners(), 0);
        assert_eq!(handle.requests(), 1);
    }
}
