//! Access tokens for the voice agent's room

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ROOM_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ROOM_SUFFIX_LEN: usize = 7;

/// Participant name used when the host gives none
pub const DEFAULT_PARTICIPANT: &str = "user";

/// Body of a token request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub room_name: String,
    pub participant_name: String,
}

impl TokenRequest {
    pub fn new(room_name: &str, participant_name: &str) -> Self {
        Self {
            room_name: room_name.to_string(),
            participant_name: participant_name.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.room_name.is_empty() || self.participant_name.is_empty() {
            return Err(CredentialError::MissingField);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Missing roomName or participantName")]
    MissingField,
    #[error("Token error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("Token request failed: {0}")]
    Transport(String),
    #[error("Malformed token response: {0}")]
    Malformed(String),
}

/// Issues access tokens
pub trait CredentialService {
    fn issue(&self, request: &TokenRequest) -> Result<TokenResponse, CredentialError>;
}

/// `room-` followed by seven random base-36 characters
pub fn random_room_name(rng: &mut impl Rng) -> String {
    let suffix: String = (0..ROOM_SUFFIX_LEN)
        .map(|_| ROOM_ALPHABET[rng.gen_range(0..ROOM_ALPHABET.len())] as char)
        .collect();
    format!("room-{}", suffix)
}

/// Parse a service response body
pub fn parse_response(body: &str) -> Result<TokenResponse, CredentialError> {
    serde_json::from_str(body).map_err(|e| CredentialError::Malformed(e.to_string()))
}

/// Used when no token endpoint is configured; every request fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialService for NoCredentials {
    fn issue(&self, request: &TokenRequest) -> Result<TokenResponse, CredentialError> {
        request.validate()?;
        Err(CredentialError::Transport("no token endpoint configured".into()))
    }
}

/// POSTs JSON token requests to an HTTP endpoint
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct HttpCredentialService {
    endpoint: String,
    agent: ureq::Agent,
}

#[cfg(not(target_arch = "wasm32"))]
impl HttpCredentialService {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(std::time::Duration::from_secs(10))
                .build(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl CredentialService for HttpCredentialService {
    fn issue(&self, request: &TokenRequest) -> Result<TokenResponse, CredentialError> {
        request.validate()?;
        let body = serde_json::to_string(request).map_err(|e| CredentialError::Malformed(e.to_string()))?;
        log::debug!("Requesting token for room {}", request.room_name);

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_string(&body);
        match response {
            Ok(response) => {
                let text = response
                    .into_string()
                    .map_err(|e| CredentialError::Transport(e.to_string()))?;
                parse_response(&text)
            }
            Err(ureq::Error::Status(status, response)) => Err(CredentialError::Status {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(err) => Err(CredentialError::Transport(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[test]
    fn requests_use_camel_case_fields() {
        let json = serde_json::to_value(TokenRequest::new("room-abc1234", "user")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"roomName": "room-abc1234", "participantName": "user"})
        );
    }

    #[rstest]
    #[case("", "user")]
    #[case("room-1", "")]
    fn empty_fields_are_rejected(#[case] room: &str, #[case] participant: &str) {
        let err = TokenRequest::new(room, participant).validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing roomName or participantName");
    }

    #[test]
    fn room_names_are_base36() {
        let name = random_room_name(&mut StdRng::seed_from_u64(9));
        let suffix = name.strip_prefix("room-").unwrap();
        assert_eq!(suffix.len(), 7);
        assert!(suffix.bytes().all(|b| ROOM_ALPHABET.contains(&b)));
    }

    #[test]
    fn responses_need_a_token() {
        assert_eq!(
            parse_response(r#"{"token":"abc","debug":{}}"#).unwrap().token,
            "abc"
        );
        assert!(matches!(
            parse_response(r#"{"error":"nope"}"#),
            Err(CredentialError::Malformed(_))
        ));
    }
}
