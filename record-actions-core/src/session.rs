//! Flash messages and security token checks

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::request::Payload;

/// Kind of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Success
    Good,
    /// Failure
    Bad,
}

impl MessageKind {
    /// Lowercase name, as rendered by the admin templates
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Good => "good",
            MessageKind::Bad => "bad",
        }
    }
}

/// How the message body is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCast {
    /// Rendered as HTML
    #[default]
    Html,
    /// Escaped text
    Text,
}

/// Message shown on the next page load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    /// Message text
    pub message: String,
    /// Good or bad
    pub kind: MessageKind,
    /// Rendering mode
    #[serde(default)]
    pub cast: MessageCast,
}

impl FlashMessage {
    /// HTML flash message
    pub fn new(message: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            message: message.into(),
            kind,
            cast: MessageCast::Html,
        }
    }
}

/// Session storage for flash messages, keyed by form name
pub trait Session {
    /// Store a message for the next render of `form`
    fn set_flash(&mut self, form: &str, message: FlashMessage);

    /// Take the pending message of `form`
    fn take_flash(&mut self, form: &str) -> Option<FlashMessage>;
}

/// In-memory session
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    flashes: HashMap<String, FlashMessage>,
}

impl MemorySession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Peek at the pending message of `form`
    pub fn flash(&self, form: &str) -> Option<&FlashMessage> {
        self.flashes.get(form)
    }
}

impl Session for MemorySession {
    fn set_flash(&mut self, form: &str, message: FlashMessage) {
        self.flashes.insert(form.to_string(), message);
    }

    fn take_flash(&mut self, form: &str) -> Option<FlashMessage> {
        self.flashes.remove(form)
    }
}

/// Validates the CSRF-style token submitted with a form
pub trait TokenValidator: Send + Sync {
    /// Whether the submitted data carries a valid token
    fn validate(&self, payload: &Payload) -> bool;
}

/// Token compared against a fixed expected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityToken {
    field: String,
    expected: String,
}

impl SecurityToken {
    /// Expect `expected` in the form field `field`
    pub fn new(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// The field the token is read from
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl TokenValidator for SecurityToken {
    fn validate(&self, payload: &Payload) -> bool {
        matches!(payload.get(&self.field), Some(Value::String(token)) if *token == self.expected)
    }
}

impl<F> TokenValidator for F
where
    F: Fn(&Payload) -> bool + Send + Sync,
{
    fn validate(&self, payload: &Payload) -> bool {
        self(payload)
    }
}
