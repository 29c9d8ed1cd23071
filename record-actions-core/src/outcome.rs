//! Normalized results of one dispatch

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;

use crate::error::ActionError;

/// Value returned by an action handler
///
/// Mirrors the loose `bool | string | void` convention of record actions:
/// `false` signals failure, a non-empty message is the success message,
/// anything else is a success with the generated default message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReturn {
    /// Nothing explicit was returned
    Done,
    /// Explicit boolean; `false` is a failure
    Flag(bool),
    /// Success message
    Message(String),
    /// Response returned verbatim
    Response(RawResponse),
}

impl From<()> for ActionReturn {
    fn from(_: ()) -> Self {
        ActionReturn::Done
    }
}

impl From<bool> for ActionReturn {
    fn from(flag: bool) -> Self {
        ActionReturn::Flag(flag)
    }
}

impl From<String> for ActionReturn {
    fn from(message: String) -> Self {
        ActionReturn::Message(message)
    }
}

impl From<&str> for ActionReturn {
    fn from(message: &str) -> Self {
        ActionReturn::Message(message.to_string())
    }
}

impl From<Option<String>> for ActionReturn {
    fn from(message: Option<String>) -> Self {
        message.map_or(ActionReturn::Done, ActionReturn::Message)
    }
}

impl From<RawResponse> for ActionReturn {
    fn from(response: RawResponse) -> Self {
        ActionReturn::Response(response)
    }
}

/// Result type of action handlers
pub type ActionResult = Result<ActionReturn, ActionError>;

/// Why an invoked action failed; only affects logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The handler returned `false`
    ReturnedFalse,
    /// The handler returned an error
    Error,
    /// The handler panicked
    Panicked,
}

/// Normalized outcome of an invoked action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action ran and succeeded
    Success {
        /// Message shown to the user
        message: String,
    },
    /// The action ran and failed
    Failure {
        /// Message shown to the user
        message: String,
        /// Internal failure classification
        reason: FailureReason,
    },
    /// The action produced its own response
    RawResponse(RawResponse),
}

impl DispatchOutcome {
    /// Interpret a handler result
    ///
    /// `default_message` is used whenever the handler produced no explicit
    /// message, for failures as well as successes.
    pub fn interpret(result: ActionResult, default_message: impl FnOnce() -> String) -> Self {
        match result {
            Ok(ActionReturn::Flag(false)) => DispatchOutcome::Failure {
                message: default_message(),
                reason: FailureReason::ReturnedFalse,
            },
            Ok(ActionReturn::Message(message)) if !message.is_empty() => {
                DispatchOutcome::Success { message }
            }
            Ok(ActionReturn::Response(response)) => DispatchOutcome::RawResponse(response),
            Ok(_) => DispatchOutcome::Success {
                message: default_message(),
            },
            Err(err) => {
                let message = err.to_string();
                DispatchOutcome::Failure {
                    message: if message.is_empty() {
                        default_message()
                    } else {
                        message
                    },
                    reason: FailureReason::Error,
                }
            }
        }
    }

    /// Failure produced by a panicking handler
    pub fn panicked(message: String) -> Self {
        DispatchOutcome::Failure {
            message,
            reason: FailureReason::Panicked,
        }
    }

    /// The user-facing message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Success { message } | DispatchOutcome::Failure { message, .. } => {
                Some(message)
            }
            DispatchOutcome::RawResponse(_) => None,
        }
    }

    /// Whether this outcome is a success
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success { .. })
    }

    /// Whether this outcome is a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, DispatchOutcome::Failure { .. })
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchOutcome::Success { .. } => "success",
            DispatchOutcome::Failure { .. } => "failure",
            DispatchOutcome::RawResponse(_) => "raw_response",
        }
    }
}

/// Template for the message used when an action gives none
///
/// Placeholders: `{action}` is replaced by the action title, `{name}` by
/// the record's singular name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate(String);

impl Default for MessageTemplate {
    fn default() -> Self {
        Self("Action {action} was done on {name}".to_string())
    }
}

impl MessageTemplate {
    /// Create a template from a string
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The raw template
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the template for an action title and record name
    ///
    /// Substituted text is never scanned again, so a title containing
    /// `{name}` stays as written.
    pub fn render(&self, action: &str, name: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + action.len() + name.len());
        let mut rest = self.0.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{action}") {
                out.push_str(action);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{name}") {
                out.push_str(name);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

/// A response produced directly by an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: String,
}

impl RawResponse {
    /// Plain response with a body
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Pretty-printed JSON response with `Content-Type: application/json`
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string_pretty(value)?;
        let mut response = Self::new(StatusCode::OK, body);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(response)
    }

    /// JSON response with a string body passed through untouched
    pub fn json_str(body: impl Into<String>) -> Self {
        let mut response = Self::new(StatusCode::OK, body);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }

    /// Convert into an `http` response
    pub fn into_response(self) -> http::Response<String> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
