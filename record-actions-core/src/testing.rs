//! Test utilities for record actions
//!
//! - [`FixedGrid`]: a [`GridContext`] over a fixed set of visible ids
//! - [`TestHarness`]: a record, a session and a grid wired to a dispatcher
//! - [`ResponseAssertions`]: read status messages and redirects back out
//! - Assertion macros for outcomes and redirects
//!
//! # Example
//!
//! ```ignore
//! use record_actions::testing::{ResponseAssertions, TestHarness};
//!
//! let mut harness = TestHarness::new(member, [1, 2]);
//! let response = harness.submit(&mut dispatcher, "doUnlock", true);
//! assert_eq!(response.status_message().as_deref(), Some("Updated"));
//! ```

use std::collections::BTreeSet;

use http::header::LOCATION;

use crate::dispatcher::ActionDispatcher;
use crate::middleware::DispatchMiddleware;
use crate::record::{Record, RecordId};
use crate::request::{
    DispatchRequest, FormContext, GridContext, Payload, RequestContext, Route,
};
use crate::session::{FlashMessage, MemorySession};

/// Grid listing a fixed set of record ids under `base`
///
/// Edit links read `{base}/item/{id}/edit`, the new-record link
/// `{base}/item/new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedGrid {
    /// List URL
    pub base: String,
    /// Ids currently visible in the list
    pub ids: BTreeSet<RecordId>,
}

impl FixedGrid {
    /// Create a grid listing `ids`
    pub fn new(base: impl Into<String>, ids: impl IntoIterator<Item = RecordId>) -> Self {
        Self {
            base: base.into(),
            ids: ids.into_iter().collect(),
        }
    }

    /// URL of a route on one record, e.g. `{base}/item/3/doCustomAction`
    pub fn item_url(&self, id: Option<RecordId>, segment: &str) -> String {
        match id {
            Some(id) => format!("{}/item/{id}/{segment}", self.base),
            None => format!("{}/item/new/{segment}", self.base),
        }
    }
}

impl GridContext for FixedGrid {
    fn item_link(&self, id: Option<RecordId>) -> String {
        match id {
            Some(id) => format!("{}/item/{id}/edit", self.base),
            None => format!("{}/item/new", self.base),
        }
    }

    fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    fn back_link(&self) -> String {
        self.base.clone()
    }
}

/// Record, grid and session for driving a dispatcher in tests
#[derive(Debug)]
pub struct TestHarness<R> {
    /// The record under test
    pub record: R,
    /// The list the record is edited from
    pub grid: FixedGrid,
    /// Session receiving flash messages
    pub session: MemorySession,
    /// The edit form
    pub form: FormContext,
}

impl<R: Record> TestHarness<R> {
    /// Harness editing `record` from a list showing `ids`
    pub fn new(record: R, ids: impl IntoIterator<Item = RecordId>) -> Self {
        Self {
            record,
            grid: FixedGrid::new("admin/records", ids),
            session: MemorySession::new(),
            form: FormContext::new("ItemEditForm"),
        }
    }

    /// Submit a named action from the edit form with an empty payload
    pub fn submit<M: DispatchMiddleware>(
        &mut self,
        dispatcher: &mut ActionDispatcher<R, M>,
        action: &str,
        is_async: bool,
    ) -> http::Response<String> {
        self.submit_with(
            dispatcher,
            DispatchRequest::new(action, Payload::new(), is_async),
        )
    }

    /// Submit any request from the edit form
    pub fn submit_with<M: DispatchMiddleware>(
        &mut self,
        dispatcher: &mut ActionDispatcher<R, M>,
        request: DispatchRequest,
    ) -> http::Response<String> {
        let url = self.grid.item_url(self.record.id(), request.route.segment());
        let ctx = RequestContext::new(url, &self.grid).ajax(request.is_async);
        dispatcher.handle(
            &mut self.record,
            request,
            Some(&self.form),
            &ctx,
            &mut self.session,
        )
    }

    /// Follow a custom link (no form)
    pub fn follow<M: DispatchMiddleware>(
        &mut self,
        dispatcher: &mut ActionDispatcher<R, M>,
        action: &str,
    ) -> http::Response<String> {
        let mut request = DispatchRequest::new(action, Payload::new(), false);
        request.route = Route::CustomLink;
        let url = self.grid.item_url(self.record.id(), request.route.segment());
        let ctx = RequestContext::new(url, &self.grid);
        dispatcher.handle(&mut self.record, request, None, &ctx, &mut self.session)
    }

    /// Flash message left for the edit form, if any
    pub fn flash(&self) -> Option<&FlashMessage> {
        self.session.flash(&self.form.name)
    }
}

/// Read dispatcher responses back in tests
pub trait ResponseAssertions {
    /// A header as a string
    fn header_str(&self, name: &str) -> Option<&str>;

    /// The `Location` header
    fn location(&self) -> Option<&str>;

    /// The decoded status message carried in `header`
    fn message_in(&self, header: &str) -> Option<String> {
        let raw = self.header_str(header)?;
        urlencoding::decode(raw).ok().map(|s| s.into_owned())
    }

    /// Whether `header` asks the client to reload
    fn reload_in(&self, header: &str) -> bool {
        self.header_str(header) == Some("true")
    }

    /// The decoded status message under the default `X-Status` header
    ///
    /// Use [`message_in`](Self::message_in) with
    /// [`DispatcherConfig::status_header`](crate::config::DispatcherConfig::status_header)
    /// when the header is renamed.
    fn status_message(&self) -> Option<String> {
        self.message_in("X-Status")
    }

    /// Whether the default `X-Reload` header asks the client to reload
    fn wants_reload(&self) -> bool {
        self.reload_in("X-Reload")
    }
}

impl ResponseAssertions for http::Response<String> {
    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn location(&self) -> Option<&str> {
        self.headers().get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// Assert that an outcome matches a pattern
///
/// # Example
///
/// ```ignore
/// assert_outcome!(dispatched.outcome, DispatchOutcome::Failure { reason: FailureReason::Panicked, .. });
/// ```
#[macro_export]
macro_rules! assert_outcome {
    ($outcome:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            matches!(&$outcome, $pattern $(if $guard)?),
            "Expected outcome matching `{}`, but got: {:?}",
            stringify!($pattern),
            $outcome
        );
    };
}

/// Assert that a response is a redirect to `location`
#[macro_export]
macro_rules! assert_redirect {
    ($response:expr, $location:expr) => {{
        let response = &$response;
        assert_eq!(
            response.status().as_u16(),
            302,
            "Expected a redirect, got {}",
            response.status()
        );
        assert_eq!(
            $crate::testing::ResponseAssertions::location(response),
            Some($location),
            "Redirect target mismatch"
        );
    }};
}
