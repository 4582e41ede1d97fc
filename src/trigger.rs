//! Validation of scheduler push deliveries.
//!
//! A push subscription POSTs an envelope of the form
//! `{"message": {"data": "<base64>"}, "subscription": "..."}`; a run is only
//! started when the decoded payload is the `scrape` command.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

pub const SCRAPE_COMMAND: &str = "scrape";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriggerError {
    #[error("No Pub/Sub message received")]
    Empty,
    #[error("Invalid Pub/Sub message format: {0}")]
    InvalidFormat(String),
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub data: String,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl PushEnvelope {
    pub fn parse(body: &str) -> Result<Self, TriggerError> {
        if body.trim().is_empty() {
            return Err(TriggerError::Empty);
        }
        serde_json::from_str(body).map_err(|e| TriggerError::InvalidFormat(e.to_string()))
    }

    /// The decoded, trimmed payload.
    pub fn command(&self) -> Result<String, TriggerError> {
        let bytes = STANDARD
            .decode(self.message.data.trim())
            .map_err(|e| TriggerError::InvalidFormat(format!("data is not base64: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| TriggerError::InvalidFormat(format!("data is not UTF-8: {}", e)))?;
        Ok(text.trim().to_string())
    }
}

/// Accepts a raw push body only when it carries the scrape command.
pub fn validate_push(body: &str) -> Result<PushEnvelope, TriggerError> {
    let envelope = PushEnvelope::parse(body)?;
    let command = envelope.command()?;
    if command != SCRAPE_COMMAND {
        return Err(TriggerError::UnknownCommand(command));
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(data: &str) -> String {
        json!({
            "message": { "data": data, "messageId": "42" },
            "subscription": "projects/p/subscriptions/scrape"
        })
        .to_string()
    }

    #[test]
    fn test_accepts_scrape_command() {
        let envelope = validate_push(&body(&STANDARD.encode("scrape\n"))).unwrap();
        assert_eq!(envelope.message.message_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_rejects_other_commands() {
        assert_eq!(
            validate_push(&body(&STANDARD.encode("purge"))).unwrap_err(),
            TriggerError::UnknownCommand("purge".to_string())
        );
    }

    #[test]
    fn test_rejects_malformed_envelopes() {
        assert_eq!(validate_push("  ").unwrap_err(), TriggerError::Empty);
        assert!(matches!(
            validate_push(r#"{"data": "c2NyYXBl"}"#),
            Err(TriggerError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_push(&body("not base64!")),
            Err(TriggerError::InvalidFormat(_))
        ));
    }
}
