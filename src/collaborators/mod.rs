//! Services the stage talks to but does not render: voice-agent credentials and ambient audio

pub mod audio;
pub mod credentials;
pub mod voice;

pub use audio::{AmbientAudio, AmbientSound, AudioError, SilentAudio};
#[cfg(target_arch = "wasm32")]
pub use audio::HtmlAmbientAudio;
#[cfg(not(target_arch = "wasm32"))]
pub use credentials::HttpCredentialService;
pub use credentials::{
    random_room_name, CredentialError, CredentialService, NoCredentials, TokenRequest,
    TokenResponse,
};
pub use voice::{AssistantStatus, ButtonAnchor, VoiceAssistant};
