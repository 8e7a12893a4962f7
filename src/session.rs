//! Immersive session lifecycle
//!
//! The controller is a plain state machine: it never touches the renderer or the platform itself.
//! Every transition returns the [`SessionEffect`]s the caller must apply before the next frame.

use std::fmt;

/// Where the stage is in the immersive lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Inactive,
    /// A session was requested and the platform has not answered yet
    Requesting,
    Immersive,
    /// The platform ended the session but may still be presenting
    ExitingImmersive,
}

impl SessionState {
    pub fn is_immersive(self) -> bool {
        self == SessionState::Immersive
    }

    /// The overlay is shown in every state except a running immersive session
    pub fn overlay_visible(self) -> bool {
        !self.is_immersive()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Inactive => "inactive",
            SessionState::Requesting => "requesting",
            SessionState::Immersive => "immersive",
            SessionState::ExitingImmersive => "exiting-immersive",
        };
        f.write_str(name)
    }
}

/// Whether the platform can run an immersive session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    /// The one-time query has not answered yet
    #[default]
    Unknown,
    Supported,
    Unsupported,
}

/// Shown once when the platform turns out to have no immersive runtime
pub const UNSUPPORTED_NOTICE: &str = "WebXR VR not supported in your browser or environment";

impl Capability {
    /// Whether the host should offer a request-immersive affordance
    pub fn offers_immersive(self) -> bool {
        self == Capability::Supported
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Unknown => "unknown",
            Capability::Supported => "supported",
            Capability::Unsupported => "unsupported",
        }
    }
}

/// Notifications from the immersive platform
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Answer to the capability query; a failed query arrives as `Err`
    CapabilityResolved(Result<bool, String>),
    SessionStarted,
    SessionEnded,
    SessionError(String),
}

/// Side effect the caller applies within the same event-processing step
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    OverlayVisible(bool),
    MirrorsActive(bool),
    /// Message for the user
    Notice(String),
}

/// Why a request did not start a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Unsupported,
    /// The capability query has not answered yet
    CapabilityPending,
    /// A session is already requested, running or ending
    Busy,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Unsupported => f.write_str("VR NOT AVAILABLE"),
            RejectReason::CapabilityPending => f.write_str("still checking for VR support"),
            RejectReason::Busy => f.write_str("a VR session is already in progress"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// State moved to Requesting; the platform should be asked for a session
    Requested,
    Rejected(RejectReason),
}

/// Owns [`SessionState`] and [`Capability`]
#[derive(Debug, Default)]
pub struct SessionController {
    state: SessionState,
    capability: Capability,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn request_immersive(&mut self) -> RequestOutcome {
        let rejected = match (self.state, self.capability) {
            (SessionState::Inactive, Capability::Supported) => None,
            (SessionState::Inactive, Capability::Unsupported) => Some(RejectReason::Unsupported),
            (SessionState::Inactive, Capability::Unknown) => Some(RejectReason::CapabilityPending),
            _ => Some(RejectReason::Busy),
        };
        match rejected {
            Some(reason) => {
                log::info!("Immersive request rejected: {}", reason);
                RequestOutcome::Rejected(reason)
            }
            None => {
                self.transition(SessionState::Requesting);
                RequestOutcome::Requested
            }
        }
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionEffect> {
        match (self.state, event) {
            (_, SessionEvent::CapabilityResolved(result)) => {
                if self.capability != Capability::Unknown {
                    log::debug!("Ignoring repeated capability answer");
                    return Vec::new();
                }
                self.capability = match result {
                    Ok(true) => Capability::Supported,
                    Ok(false) => Capability::Unsupported,
                    Err(err) => {
                        log::warn!("Immersive support check failed: {}", err);
                        Capability::Unsupported
                    }
                };
                log::info!("Immersive capability: {:?}", self.capability);
                match self.capability {
                    Capability::Unsupported => vec![SessionEffect::Notice(UNSUPPORTED_NOTICE.into())],
                    _ => Vec::new(),
                }
            }
            (SessionState::Requesting, SessionEvent::SessionStarted) => {
                self.transition(SessionState::Immersive);
                vec![
                    SessionEffect::OverlayVisible(false),
                    SessionEffect::MirrorsActive(true),
                ]
            }
            (SessionState::Requesting, SessionEvent::SessionError(err)) => {
                self.transition(SessionState::Inactive);
                vec![SessionEffect::Notice(format!("Could not start VR: {}", err))]
            }
            (SessionState::Immersive, SessionEvent::SessionEnded) => {
                self.transition(SessionState::ExitingImmersive);
                vec![
                    SessionEffect::OverlayVisible(true),
                    SessionEffect::MirrorsActive(false),
                ]
            }
            (SessionState::Immersive, SessionEvent::SessionError(err)) => {
                self.transition(SessionState::Inactive);
                vec![
                    SessionEffect::OverlayVisible(true),
                    SessionEffect::MirrorsActive(false),
                    SessionEffect::Notice(format!("VR session lost: {}", err)),
                ]
            }
            (state, event) => {
                log::debug!("Ignoring {:?} while {}", event, state);
                Vec::new()
            }
        }
    }

    /// Finish leaving immersive mode once the platform stopped presenting
    ///
    /// Returns whether the state changed.
    pub fn complete_exit(&mut self) -> bool {
        if self.state != SessionState::ExitingImmersive {
            return false;
        }
        self.transition(SessionState::Inactive);
        true
    }

    fn transition(&mut self, next: SessionState) {
        log::info!("Session {} -> {}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn supported() -> SessionController {
        let mut session = SessionController::new();
        session.handle(SessionEvent::CapabilityResolved(Ok(true)));
        session
    }

    #[rstest]
    #[case(Ok(false), Capability::Unsupported)]
    #[case(Err("no navigator.xr".to_string()), Capability::Unsupported)]
    #[case(Ok(true), Capability::Supported)]
    fn capability_answers(#[case] answer: Result<bool, String>, #[case] expected: Capability) {
        let mut session = SessionController::new();
        let effects = session.handle(SessionEvent::CapabilityResolved(answer));
        assert_eq!(session.capability(), expected);
        assert_eq!(session.capability().offers_immersive(), expected == Capability::Supported);
        let noticed = effects == vec![SessionEffect::Notice(UNSUPPORTED_NOTICE.into())];
        assert_eq!(noticed, expected == Capability::Unsupported);
        assert!(noticed || effects.is_empty());
    }

    #[test]
    fn capability_names_for_the_host() {
        assert_eq!(Capability::Unknown.as_str(), "unknown");
        assert_eq!(Capability::Supported.as_str(), "supported");
        assert_eq!(Capability::Unsupported.as_str(), "unsupported");
        assert!(!Capability::Unknown.offers_immersive());
    }

    #[test]
    fn only_the_first_capability_answer_counts() {
        let mut session = supported();
        session.handle(SessionEvent::CapabilityResolved(Ok(false)));
        assert_eq!(session.capability(), Capability::Supported);
    }

    #[test]
    fn unsupported_requests_are_rejected() {
        let mut session = SessionController::new();
        assert_eq!(
            session.request_immersive(),
            RequestOutcome::Rejected(RejectReason::CapabilityPending)
        );
        session.handle(SessionEvent::CapabilityResolved(Ok(false)));
        assert_eq!(
            session.request_immersive(),
            RequestOutcome::Rejected(RejectReason::Unsupported)
        );
        assert_eq!(session.state(), SessionState::Inactive);
    }

    #[test]
    fn full_lifecycle() {
        let mut session = supported();
        assert_eq!(session.request_immersive(), RequestOutcome::Requested);
        assert_eq!(
            session.request_immersive(),
            RequestOutcome::Rejected(RejectReason::Busy)
        );

        let effects = session.handle(SessionEvent::SessionStarted);
        assert_eq!(
            effects,
            vec![
                SessionEffect::OverlayVisible(false),
                SessionEffect::MirrorsActive(true)
            ]
        );
        assert!(!session.state().overlay_visible());

        let effects = session.handle(SessionEvent::SessionEnded);
        assert!(effects.contains(&SessionEffect::OverlayVisible(true)));
        assert_eq!(session.state(), SessionState::ExitingImmersive);
        assert!(session.state().overlay_visible());

        assert!(session.complete_exit());
        assert!(!session.complete_exit());
        assert_eq!(session.state(), SessionState::Inactive);
    }

    #[test]
    fn errors_recover_to_inactive() {
        let mut session = supported();
        session.request_immersive();
        let effects = session.handle(SessionEvent::SessionError("denied".into()));
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], SessionEffect::Notice(_)));
        assert_eq!(session.state(), SessionState::Inactive);

        session.request_immersive();
        session.handle(SessionEvent::SessionStarted);
        let effects = session.handle(SessionEvent::SessionError("tracking lost".into()));
        assert!(effects.contains(&SessionEffect::MirrorsActive(false)));
        assert!(effects.contains(&SessionEffect::OverlayVisible(true)));
        assert_eq!(session.state(), SessionState::Inactive);
    }

    #[test]
    fn stray_events_are_ignored() {
        let mut session = supported();
        assert!(session.handle(SessionEvent::SessionStarted).is_empty());
        assert!(session.handle(SessionEvent::SessionEnded).is_empty());
        assert_eq!(session.state(), SessionState::Inactive);
    }
}
