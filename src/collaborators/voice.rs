//! The voice assistant launcher: open/close state, room credentials and the panel it drives

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;

use super::credentials::{random_room_name, CredentialService, TokenRequest, DEFAULT_PARTICIPANT};
use crate::mirror::AssistantPanelWidget;

/// Shown when no token could be obtained
pub const CONNECT_FAILED: &str = "Failed to connect to voice assistant";

const BUTTON_MARGIN: u32 = 24;
const BUTTON_SIZE: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantStatus {
    Closed,
    Connected { room: String },
    Failed { message: String, detail: String },
}

/// Screen rectangle of the launcher button, in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonAnchor {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

pub struct VoiceAssistant {
    service: Box<dyn CredentialService>,
    participant: String,
    panel: Option<Rc<RefCell<AssistantPanelWidget>>>,
    open: bool,
    room: Option<String>,
    token: Option<String>,
    status: AssistantStatus,
}

impl VoiceAssistant {
    pub fn new(service: Box<dyn CredentialService>) -> Self {
        Self {
            service,
            participant: DEFAULT_PARTICIPANT.to_string(),
            panel: None,
            open: false,
            room: None,
            token: None,
            status: AssistantStatus::Closed,
        }
    }

    pub fn with_participant(mut self, participant: &str) -> Self {
        self.participant = participant.to_string();
        self
    }

    /// Keep the mirrored panel in step with the open state
    pub fn with_panel(mut self, panel: Rc<RefCell<AssistantPanelWidget>>) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn status(&self) -> &AssistantStatus {
        &self.status
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Bottom-right launcher button for a viewport
    pub fn anchor(&self, viewport: (u32, u32)) -> ButtonAnchor {
        let inset = BUTTON_MARGIN + BUTTON_SIZE;
        ButtonAnchor {
            x: viewport.0.saturating_sub(inset),
            y: viewport.1.saturating_sub(inset),
            size: BUTTON_SIZE,
        }
    }

    /// Open or close the assistant; opening fetches credentials for a fresh room
    pub fn toggle(&mut self, rng: &mut impl Rng) -> bool {
        if self.open {
            self.open = false;
            self.token = None;
            self.status = AssistantStatus::Closed;
            log::info!("Voice assistant closed");
        } else {
            self.open = true;
            self.connect(rng);
        }
        if let Some(panel) = self.panel.as_ref() {
            match panel.try_borrow_mut() {
                Ok(mut panel) => panel.set_open(self.open),
                Err(_) => log::warn!("Assistant panel is busy; it will show the old state"),
            }
        }
        self.open
    }

    /// Retry with a new room after a failure
    pub fn retry(&mut self, rng: &mut impl Rng) {
        if self.open {
            self.connect(rng);
        }
    }

    fn connect(&mut self, rng: &mut impl Rng) {
        let room = random_room_name(rng);
        let request = TokenRequest::new(&room, &self.participant);
        match self.service.issue(&request) {
            Ok(response) => {
                log::info!("Voice assistant connected to {}", room);
                self.token = Some(response.token);
                self.status = AssistantStatus::Connected { room: room.clone() };
            }
            Err(err) => {
                log::error!("Error generating token: {}", err);
                self.token = None;
                self.status = AssistantStatus::Failed {
                    message: CONNECT_FAILED.to_string(),
                    detail: err.to_string(),
                };
            }
        }
        self.room = Some(room);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::credentials::{CredentialError, TokenResponse};
    use crate::mirror::Widget;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct FixedService(Result<TokenResponse, CredentialError>);

    impl CredentialService for FixedService {
        fn issue(&self, request: &TokenRequest) -> Result<TokenResponse, CredentialError> {
            request.validate()?;
            self.0.clone()
        }
    }

    #[test]
    fn opening_fetches_a_token_and_updates_the_panel() {
        let panel = Rc::new(RefCell::new(AssistantPanelWidget::new()));
        let mut assistant = VoiceAssistant::new(Box::new(FixedService(Ok(TokenResponse {
            token: "jwt".into(),
        }))))
        .with_panel(panel.clone());
        let mut rng = StdRng::seed_from_u64(1);

        let revision = panel.borrow().revision();
        assert!(assistant.toggle(&mut rng));
        assert_eq!(assistant.token(), Some("jwt"));
        assert!(matches!(assistant.status(), AssistantStatus::Connected { room } if room.starts_with("room-")));
        assert!(panel.borrow().is_open());
        assert!(panel.borrow().revision() > revision);

        assert!(!assistant.toggle(&mut rng));
        assert_eq!(assistant.status(), &AssistantStatus::Closed);
        assert!(!panel.borrow().is_open());
    }

    #[test]
    fn failures_show_the_connect_message() {
        let mut assistant = VoiceAssistant::new(Box::new(FixedService(Err(CredentialError::Status {
            status: 500,
            body: "boom".into(),
        }))));
        assistant.toggle(&mut StdRng::seed_from_u64(2));
        let AssistantStatus::Failed { message, detail } = assistant.status() else {
            panic!("expected a failure");
        };
        assert_eq!(message, CONNECT_FAILED);
        assert!(detail.contains("500"));
        assert!(assistant.is_open());
    }

    #[test]
    fn empty_participants_never_reach_the_service() {
        let mut assistant =
            VoiceAssistant::new(Box::new(FixedService(Ok(TokenResponse { token: "x".into() }))))
                .with_participant("");
        assistant.toggle(&mut StdRng::seed_from_u64(3));
        assert!(matches!(assistant.status(), AssistantStatus::Failed { detail, .. } if detail.contains("Missing")));
    }

    #[test]
    fn anchor_sits_bottom_right() {
        let assistant = VoiceAssistant::new(Box::new(FixedService(Err(CredentialError::MissingField))));
        assert_eq!(
            assistant.anchor((1280, 720)),
            ButtonAnchor {
                x: 1192,
                y: 632,
                size: 64
            }
        );
    }
}
