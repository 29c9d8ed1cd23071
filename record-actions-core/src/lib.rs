//! Core traits and types for record-actions
//!
//! This crate lets an admin edit form expose custom actions on the record
//! being edited, dispatch them by name, and answer with the right response
//! for partial (async) or full-page requests.
//!
//! # Core Concepts
//!
//! - **Record**: The edited object; declares its actions and owns its identity
//! - **ActionRegistry**: Explicit name to handler map, populated once per type
//! - **ActionPipeline**: Ordered transformations of the declared action list
//! - **ActionDispatcher**: Resolves, invokes and presents one action
//! - **DispatchMiddleware**: Hooks around every dispatch (logging, audit)
//!
//! # Basic Example
//!
//! ```ignore
//! use record_actions_core::prelude::*;
//!
//! struct Member { id: Option<RecordId>, locked: bool }
//!
//! impl Record for Member {
//!     fn id(&self) -> Option<RecordId> { self.id }
//!     fn singular_name(&self) -> Cow<'_, str> { "Member".into() }
//!     fn cms_actions(&self) -> ActionList {
//!         ActionList::new().push(ActionDescriptor::new("doUnlock", "Unlock").refresh())
//!     }
//!     fn save(&mut self, _payload: &Payload) -> Result<(), ActionError> { Ok(()) }
//! }
//!
//! let registry = ActionRegistry::new().with("doUnlock", |m: &mut Member, _: &Invocation<'_>| {
//!     m.locked = false;
//!     Ok("Updated".into())
//! });
//! let mut dispatcher = ActionDispatcher::new(registry);
//!
//! let request = DispatchRequest::new("doUnlock", Payload::new(), true);
//! let response = dispatcher.handle(&mut member, request, Some(&form), &ctx, &mut session);
//! assert_eq!(response.headers()["X-Status"], "Updated");
//! ```
//!
//! # Return Convention
//!
//! A handler's return value decides the outcome:
//!
//! - `false` fails with the default message
//! - `true`, `()` or an empty message succeed with the default message
//! - a non-empty string succeeds with that message
//! - a [`RawResponse`] is passed through untouched
//! - an `Err` fails with the error's text

pub mod action;
pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod outcome;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod request;
pub mod session;
pub mod testing;

// Core trait exports
pub use action::{ActionDescriptor, ActionFlags, ActionList, ActionSet};
pub use record::{Record, RecordId, RegisterActions};
pub use registry::{ActionRegistry, Handler, Invocation};

// Dispatch exports
pub use dispatcher::{ActionDispatcher, Dispatched};
pub use outcome::{
    ActionResult, ActionReturn, DispatchOutcome, FailureReason, MessageTemplate, RawResponse,
};
pub use pipeline::{ActionPipeline, ActionTransform};

// Request and session exports
pub use request::{
    parse_query, DispatchRequest, FormContext, GridContext, Payload,
    RequestContext, Route,
};
pub use session::{
    FlashMessage, MemorySession, MessageCast, MessageKind, SecurityToken, Session, TokenValidator,
};

// Middleware exports
pub use audit::{AuditConfig, AuditEntry, AuditFilter, AuditKind, AuditLog, AuditMiddleware};
pub use middleware::{
    ActionCall, ComposedMiddleware, DispatchMiddleware, LoggingMiddleware, NoopMiddleware,
};

pub use config::DispatcherConfig;
pub use error::{ActionError, ConfigError, DispatchError};

// Testing exports
pub use testing::{FixedGrid, ResponseAssertions, TestHarness};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{ActionDescriptor, ActionFlags, ActionList, ActionSet};
    pub use crate::config::DispatcherConfig;
    pub use crate::dispatcher::{ActionDispatcher, Dispatched};
    pub use crate::error::{ActionError, DispatchError};
    pub use crate::middleware::{
        ComposedMiddleware, DispatchMiddleware, LoggingMiddleware, NoopMiddleware,
    };
    pub use crate::outcome::{ActionResult, ActionReturn, DispatchOutcome, RawResponse};
    pub use crate::pipeline::ActionPipeline;
    pub use crate::record::{Record, RecordId, RegisterActions};
    pub use crate::registry::{ActionRegistry, Invocation};
    pub use crate::request::{
        DispatchRequest, FormContext, GridContext, Payload, RequestContext, Route,
    };
    pub use crate::session::{FlashMessage, MemorySession, MessageKind, Session};

    pub use std::borrow::Cow;
}
