//! Error types for dispatch rejections and action failures

use http::StatusCode;
use thiserror::Error;

/// Reasons a dispatch is rejected before any handler runs
///
/// A rejection is an authorization boundary: the action is never invoked
/// and the record is never touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The action is not declared by the record or has no handler
    #[error("Action not available")]
    ActionNotFound {
        /// The requested action name
        action: String,
    },
    /// The form security token did not validate
    #[error("Invalid security token")]
    InvalidSecurityToken,
    /// The request did not name an action
    #[error("No action was requested")]
    MissingActionName,
}

impl DispatchError {
    /// HTTP status used when presenting the rejection
    pub fn status(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

/// Error raised by an action handler
///
/// The `Display` output is the message shown to the user.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Plain failure message
    #[error("{0}")]
    Message(String),
    /// Validation of the submitted data failed
    #[error("{0}")]
    Validation(String),
    /// Any other error raised while running the action
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ActionError {
    /// Shorthand for [`ActionError::Message`]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Shorthand for [`ActionError::Validation`]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Errors raised while loading a [`DispatcherConfig`](crate::DispatcherConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON for the schema
    #[error("invalid dispatcher config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The message template lacks a required placeholder
    #[error("message template must contain {placeholder}: {template:?}")]
    Template {
        /// The template as given
        template: String,
        /// The missing placeholder
        placeholder: &'static str,
    },
}
