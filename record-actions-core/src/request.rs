//! Inbound request snapshot and request-scoped context

use serde_json::{Map, Value};

use crate::error::DispatchError;
use crate::record::RecordId;

/// Submitted form data or query variables
pub type Payload = Map<String, Value>;

/// Request header marking asynchronous requests
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";

/// Entry point an action request arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Form button posting `action_doCustomAction[name]`
    CustomAction,
    /// Plain link carrying the action in a query variable
    CustomLink,
    /// Built-in save followed by a return to the list
    SaveAndClose,
}

impl Route {
    /// URL segment of the route
    pub fn segment(&self) -> &'static str {
        match self {
            Route::CustomAction => "doCustomAction",
            Route::CustomLink => "doCustomLink",
            Route::SaveAndClose => "doSaveAndClose",
        }
    }

    /// Parse a URL segment
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "doCustomAction" => Some(Route::CustomAction),
            "doCustomLink" => Some(Route::CustomLink),
            "doSaveAndClose" => Some(Route::SaveAndClose),
            _ => None,
        }
    }
}

/// One inbound action request
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    /// Requested action name
    pub action_name: String,
    /// Submitted data
    pub payload: Payload,
    /// Whether the caller expects a partial response
    pub is_async: bool,
    /// Entry point of the request
    pub route: Route,
}

impl DispatchRequest {
    /// Request for a named action
    pub fn new(action_name: impl Into<String>, payload: Payload, is_async: bool) -> Self {
        Self {
            action_name: action_name.into(),
            payload,
            is_async,
            route: Route::CustomAction,
        }
    }

    /// Read the action from a submitted form
    ///
    /// The button posts an object under `field` whose first key is the
    /// action name, e.g. `{"action_doCustomAction": {"doUnlock": "Unlock"}}`.
    pub fn from_form(field: &str, payload: Payload, is_async: bool) -> Result<Self, DispatchError> {
        let action_name = payload
            .get(field)
            .and_then(Value::as_object)
            .and_then(|actions| actions.keys().next())
            .filter(|name| !name.is_empty())
            .cloned()
            .ok_or(DispatchError::MissingActionName)?;

        Ok(Self {
            action_name,
            payload,
            is_async,
            route: Route::CustomAction,
        })
    }

    /// Read the action from the query string of a custom link
    ///
    /// Every query variable lands in the payload as a string.
    pub fn from_query(var: &str, query: &str, is_async: bool) -> Result<Self, DispatchError> {
        let payload = parse_query(query);
        let action_name = payload
            .get(var)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or(DispatchError::MissingActionName)?;

        Ok(Self {
            action_name,
            payload,
            is_async,
            route: Route::CustomLink,
        })
    }

    /// Built-in save-and-close request
    pub fn save_and_close(payload: Payload, is_async: bool) -> Self {
        Self {
            action_name: Route::SaveAndClose.segment().to_string(),
            payload,
            is_async,
            route: Route::SaveAndClose,
        }
    }
}

/// Decode an `application/x-www-form-urlencoded` query string
///
/// A repeated variable keeps its last value.
pub fn parse_query(query: &str) -> Payload {
    let query = query.strip_prefix('?').unwrap_or(query);
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, "Unreadable query string");
            Payload::new()
        }
    }
}

/// The governing list a record is edited from
pub trait GridContext {
    /// Edit URL of a record; `None` links to the creation form
    fn item_link(&self, id: Option<RecordId>) -> String;

    /// Whether the record still matches the list's filter
    fn contains(&self, id: RecordId) -> bool;

    /// URL of the list view
    fn back_link(&self) -> String;
}

/// The form an action was submitted from
///
/// The security token travels in the submitted payload and is read by the
/// dispatcher's [`TokenValidator`](crate::session::TokenValidator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormContext {
    /// Form name, used to key flash messages
    pub name: String,
}

impl FormContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Request-scoped context handed to handlers and to response negotiation
pub struct RequestContext<'a> {
    /// URL of the current request, action segment included
    pub url: String,
    /// Whether the request expects a partial response; ORed with
    /// [`DispatchRequest::is_async`]
    pub is_ajax: bool,
    /// Content region requested through the content-region marker, echoed
    /// back on list redirects
    pub pjax: Option<String>,
    /// The governing list
    pub grid: &'a dyn GridContext,
}

impl std::fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("url", &self.url)
            .field("is_ajax", &self.is_ajax)
            .field("pjax", &self.pjax)
            .finish_non_exhaustive()
    }
}

impl<'a> RequestContext<'a> {
    /// Context for a full-page request
    pub fn new(url: impl Into<String>, grid: &'a dyn GridContext) -> Self {
        Self {
            url: url.into(),
            is_ajax: false,
            pjax: None,
            grid,
        }
    }

    /// Mark the request as asynchronous
    pub fn ajax(mut self, is_ajax: bool) -> Self {
        self.is_ajax = is_ajax;
        self
    }

    /// Build the context from an incoming `http` request
    pub fn from_http<B>(request: &http::Request<B>, grid: &'a dyn GridContext) -> Self {
        let headers = request.headers();
        let is_ajax = headers
            .get(REQUESTED_WITH_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
        let pjax = headers
            .get("X-Pjax")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let url = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        Self {
            url,
            is_ajax,
            pjax,
            grid,
        }
    }
}
