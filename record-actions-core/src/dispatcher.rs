//! Action dispatch and response negotiation
//!
//! One dispatch runs `Received → Resolved | Rejected`, then
//! `Resolved → Invoked → Succeeded | Failed`, and always ends in exactly
//! one HTTP response:
//!
//! - async requests get the message in a status header and no redirect
//! - full-page requests get a flash message and a redirect
//! - requests without a form get the message as the body
//!
//! # Example
//!
//! ```ignore
//! let mut dispatcher = ActionDispatcher::new(Member::registry())
//!     .with_middleware(LoggingMiddleware::new());
//!
//! let request = dispatcher.form_request(payload, ctx.is_ajax)?;
//! let response = dispatcher.handle(&mut member, request, Some(&form), &ctx, &mut session);
//! ```

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use http::header::LOCATION;
use http::{HeaderName, HeaderValue, StatusCode};

use crate::action::{ActionDescriptor, ActionList};
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::middleware::{ActionCall, DispatchMiddleware, NoopMiddleware};
use crate::outcome::{ActionResult, DispatchOutcome, MessageTemplate};
use crate::pipeline::ActionPipeline;
use crate::record::{Record, RecordId};
use crate::registry::{ActionRegistry, Handler, Invocation};
use crate::request::{DispatchRequest, FormContext, Payload, RequestContext, Route};
use crate::session::{FlashMessage, MessageKind, Session, TokenValidator};

/// Result of one invoked action, ready to be presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// The resolved action
    pub action: ActionDescriptor,
    /// Normalized outcome
    pub outcome: DispatchOutcome,
    /// Whether the record had no identity before the action ran
    pub was_new: bool,
    /// Record identity after the action ran
    pub record_id: Option<RecordId>,
    /// Whether the caller expects a partial response
    pub is_async: bool,
    /// Entry point of the request
    pub route: Route,
}

/// Resolves named actions against a record, runs them and negotiates the
/// response
///
/// # Type Parameters
/// * `R` - The record type actions run against
/// * `M` - Middleware observing every dispatch
pub struct ActionDispatcher<R: Record, M: DispatchMiddleware = NoopMiddleware> {
    registry: ActionRegistry<R>,
    pipeline: ActionPipeline<R>,
    config: DispatcherConfig,
    template: MessageTemplate,
    token: Option<Box<dyn TokenValidator>>,
    middleware: M,
}

impl<R: Record, M: DispatchMiddleware> std::fmt::Debug for ActionDispatcher<R, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("registry", &self.registry)
            .field("pipeline", &self.pipeline)
            .field("config", &self.config)
            .field("token", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: Record> ActionDispatcher<R> {
    /// Dispatcher with the standard pipeline, default config and no
    /// middleware
    pub fn new(registry: ActionRegistry<R>) -> Self {
        let config = DispatcherConfig::default();
        Self {
            registry,
            pipeline: ActionPipeline::standard(),
            template: config.message_template(),
            config,
            token: None,
            middleware: NoopMiddleware,
        }
    }
}

impl<R: Record, M: DispatchMiddleware> ActionDispatcher<R, M> {
    /// Replace the middleware
    pub fn with_middleware<N: DispatchMiddleware>(self, middleware: N) -> ActionDispatcher<R, N> {
        ActionDispatcher {
            registry: self.registry,
            pipeline: self.pipeline,
            config: self.config,
            template: self.template,
            token: self.token,
            middleware,
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.template = config.message_template();
        self.config = config;
        self
    }

    /// Replace the action-list pipeline
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: ActionPipeline<R>) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Check a security token on every form submission
    #[must_use]
    pub fn with_token_validator<V: TokenValidator + 'static>(mut self, validator: V) -> Self {
        self.token = Some(Box::new(validator));
        self
    }

    /// The handler registry
    pub fn registry(&self) -> &ActionRegistry<R> {
        &self.registry
    }

    /// The configuration
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// The middleware
    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    /// Mutable middleware
    pub fn middleware_mut(&mut self) -> &mut M {
        &mut self.middleware
    }

    /// Read a custom action request from submitted form data
    pub fn form_request(
        &self,
        payload: Payload,
        is_async: bool,
    ) -> Result<DispatchRequest, DispatchError> {
        DispatchRequest::from_form(&self.config.action_field, payload, is_async)
    }

    /// Read a custom link request from a query string
    pub fn link_request(&self, query: &str, is_async: bool) -> Result<DispatchRequest, DispatchError> {
        DispatchRequest::from_query(&self.config.link_var, query, is_async)
    }

    /// The record's declared actions after the pipeline ran
    pub fn declared_actions(&self, record: &R) -> ActionList {
        self.pipeline.apply(record.cms_actions(), record)
    }

    /// Form action bar: `base` merged with the declared actions
    pub fn item_form_actions(&self, base: ActionList, record: &R) -> ActionList {
        self.pipeline.item_form_actions(base, record)
    }

    /// Resolve an action name against the record's declared actions
    ///
    /// Matches by name or alias. A declared action without a registered
    /// handler is as unavailable as an undeclared one.
    pub fn resolve_action(&self, record: &R, name: &str) -> Result<ActionDescriptor, DispatchError> {
        let not_found = || DispatchError::ActionNotFound {
            action: name.to_string(),
        };
        let declared = self.declared_actions(record);
        let descriptor = declared.find(name).ok_or_else(not_found)?;
        if handler_for(&self.registry, descriptor).is_none() {
            tracing::warn!(action = %name, "Declared action has no registered handler");
            return Err(not_found());
        }
        Ok(descriptor.clone())
    }

    fn check_token(&self, request: &DispatchRequest, form: Option<&FormContext>) -> Result<(), DispatchError> {
        match (&self.token, form) {
            (Some(validator), Some(_)) if !validator.validate(&request.payload) => {
                Err(DispatchError::InvalidSecurityToken)
            }
            _ => Ok(()),
        }
    }

    /// Resolve and invoke an action
    ///
    /// Rejections (bad token, unknown action) return before any handler
    /// runs. Once invoked, errors and panics of the handler are contained
    /// in a [`DispatchOutcome::Failure`].
    pub fn dispatch(
        &mut self,
        record: &mut R,
        request: &DispatchRequest,
        form: Option<&FormContext>,
        ctx: &RequestContext<'_>,
    ) -> Result<Dispatched, DispatchError> {
        let record_name = record.singular_name().into_owned();
        let was_new = record.is_new();
        let call = ActionCall {
            action: &request.action_name,
            record: &record_name,
            record_id: record.id(),
            route: request.route,
        };

        let descriptor = match self
            .check_token(request, form)
            .and_then(|()| self.resolve_action(record, &request.action_name))
        {
            Ok(descriptor) => descriptor,
            Err(err) => {
                self.middleware.rejected(&call, &err);
                return Err(err);
            }
        };

        let Some(handler) = handler_for(&self.registry, &descriptor) else {
            let err = DispatchError::ActionNotFound {
                action: request.action_name.clone(),
            };
            self.middleware.rejected(&call, &err);
            return Err(err);
        };

        self.middleware.before(&call);

        let invocation = Invocation {
            payload: &request.payload,
            form,
            request: ctx,
        };
        let outcome = match invoke(handler, record, &invocation, self.config.catch_panics) {
            Ok(result) => DispatchOutcome::interpret(result, || {
                self.template.render(&descriptor.title, &record_name)
            }),
            Err(message) => DispatchOutcome::panicked(message),
        };

        self.middleware.after(&call, &outcome);

        Ok(Dispatched {
            action: descriptor,
            outcome,
            was_new,
            record_id: record.id(),
            is_async: wants_partial(request, ctx),
            route: request.route,
        })
    }

    /// Turn a dispatched outcome into an HTTP response
    pub fn present(
        &self,
        dispatched: Dispatched,
        form: Option<&FormContext>,
        ctx: &RequestContext<'_>,
        session: &mut dyn Session,
    ) -> http::Response<String> {
        let (message, good) = match dispatched.outcome {
            DispatchOutcome::RawResponse(raw) => return raw.into_response(),
            DispatchOutcome::Success { message } => (message, true),
            DispatchOutcome::Failure { message, .. } => (message, false),
        };

        let Some(form) = form else {
            let status = if good {
                StatusCode::OK
            } else {
                StatusCode::FORBIDDEN
            };
            return plain(status, message);
        };

        if dispatched.is_async {
            let status = if good {
                StatusCode::OK
            } else {
                StatusCode::FORBIDDEN
            };
            let mut response = plain(status, String::new());
            self.insert_status(&mut response, &message);
            if dispatched.action.requires_refresh() {
                insert_header(&mut response, &self.config.reload_header, "true");
            }
            return response;
        }

        let kind = if good {
            MessageKind::Good
        } else {
            MessageKind::Bad
        };
        session.set_flash(&form.name, FlashMessage::new(message, kind));
        self.redirect_after_save(dispatched.was_new, dispatched.record_id, ctx)
    }

    /// Run the whole request: token check, routing, dispatch and
    /// presentation
    ///
    /// Every path ends in a response; rejections become `403`.
    pub fn handle(
        &mut self,
        record: &mut R,
        request: DispatchRequest,
        form: Option<&FormContext>,
        ctx: &RequestContext<'_>,
        session: &mut dyn Session,
    ) -> http::Response<String> {
        let result = match request.route {
            Route::SaveAndClose => self.save_and_close(record, &request, form, ctx),
            Route::CustomAction | Route::CustomLink => self.dispatch(record, &request, form, ctx),
        };
        match result {
            Ok(Dispatched {
                route: Route::SaveAndClose,
                outcome: DispatchOutcome::Success { message },
                is_async,
                ..
            }) => self.close_to_list(&message, is_async, form, ctx, session),
            Ok(dispatched) => self.present(dispatched, form, ctx, session),
            Err(err) => self.reject(&err, wants_partial(&request, ctx)),
        }
    }

    /// Save the record through [`Record::save`]
    ///
    /// Not part of the declared actions: the button is added by the
    /// pipeline and the route is always available to records supporting it.
    pub fn save_and_close(
        &mut self,
        record: &mut R,
        request: &DispatchRequest,
        form: Option<&FormContext>,
        ctx: &RequestContext<'_>,
    ) -> Result<Dispatched, DispatchError> {
        let record_name = record.singular_name().into_owned();
        let call = ActionCall {
            action: Route::SaveAndClose.segment(),
            record: &record_name,
            record_id: record.id(),
            route: Route::SaveAndClose,
        };

        let checked = self.check_token(request, form).and_then(|()| {
            if record.supports_save_and_close() {
                Ok(())
            } else {
                Err(DispatchError::ActionNotFound {
                    action: Route::SaveAndClose.segment().to_string(),
                })
            }
        });
        if let Err(err) = checked {
            self.middleware.rejected(&call, &err);
            return Err(err);
        }

        let title = if record.is_new() {
            "Create and Close"
        } else {
            "Save and Close"
        };
        let descriptor = ActionDescriptor::new(Route::SaveAndClose.segment(), title);
        let was_new = record.is_new();
        tracing::trace!(url = %ctx.url, "Saving before returning to list");

        self.middleware.before(&call);
        let outcome = match record.save(&request.payload) {
            Ok(()) => DispatchOutcome::Success {
                message: self.template.render(title, &record_name),
            },
            Err(err) => DispatchOutcome::interpret(Err(err), || {
                self.template.render(title, &record_name)
            }),
        };
        self.middleware.after(&call, &outcome);

        Ok(Dispatched {
            action: descriptor,
            outcome,
            was_new,
            record_id: record.id(),
            is_async: wants_partial(request, ctx),
            route: Route::SaveAndClose,
        })
    }

    fn close_to_list(
        &self,
        message: &str,
        is_async: bool,
        form: Option<&FormContext>,
        ctx: &RequestContext<'_>,
        session: &mut dyn Session,
    ) -> http::Response<String> {
        if is_async {
            let mut response = redirect(&ctx.grid.back_link());
            self.insert_status(&mut response, message);
            self.insert_pjax(&mut response, ctx);
            return response;
        }
        if let Some(form) = form {
            session.set_flash(&form.name, FlashMessage::new(message, MessageKind::Good));
        }
        let mut response = redirect(&ctx.grid.back_link());
        self.insert_pjax(&mut response, ctx);
        response
    }

    fn redirect_after_save(
        &self,
        was_new: bool,
        record_id: Option<RecordId>,
        ctx: &RequestContext<'_>,
    ) -> http::Response<String> {
        if was_new {
            return redirect(&ctx.grid.item_link(record_id));
        }
        if let Some(id) = record_id.filter(|&id| ctx.grid.contains(id)) {
            return redirect(&ctx.grid.item_link(Some(id)));
        }
        // Filtered out of the list: back to the list itself
        let mut response = redirect(&ctx.grid.back_link());
        self.insert_pjax(&mut response, ctx);
        response
    }

    fn reject(&self, err: &DispatchError, is_async: bool) -> http::Response<String> {
        let message = err.to_string();
        let mut response = plain(err.status(), message.clone());
        if is_async {
            self.insert_status(&mut response, &message);
        }
        response
    }

    fn insert_status(&self, response: &mut http::Response<String>, message: &str) {
        let encoded = urlencoding::encode(message);
        insert_header(response, &self.config.status_header, &encoded);
    }

    /// Region the client asked for, else the configured one
    fn insert_pjax(&self, response: &mut http::Response<String>, ctx: &RequestContext<'_>) {
        let region = ctx.pjax.as_deref().unwrap_or(&self.config.pjax_region);
        insert_header(response, &self.config.pjax_header, region);
    }
}

/// An async request flag or an XHR context both ask for a partial response
fn wants_partial(request: &DispatchRequest, ctx: &RequestContext<'_>) -> bool {
    request.is_async || ctx.is_ajax
}

fn handler_for<'r, R: 'static>(
    registry: &'r ActionRegistry<R>,
    descriptor: &ActionDescriptor,
) -> Option<&'r Handler<R>> {
    descriptor
        .alias
        .as_deref()
        .and_then(|alias| registry.get(alias))
        .or_else(|| registry.get(&descriptor.name))
}

fn invoke<R>(
    handler: &Handler<R>,
    record: &mut R,
    invocation: &Invocation<'_>,
    catch_panics: bool,
) -> Result<ActionResult, String> {
    if !catch_panics {
        return Ok(handler(record, invocation));
    }
    catch_unwind(AssertUnwindSafe(|| handler(record, invocation))).map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Action panicked".to_string()
    }
}

fn plain(status: StatusCode, body: String) -> http::Response<String> {
    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    response
}

fn redirect(location: &str) -> http::Response<String> {
    let mut response = plain(StatusCode::FOUND, String::new());
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(_) => {
            tracing::warn!(location = %location, "Redirect target is not a valid header value");
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        }
    }
    response
}

fn insert_header(response: &mut http::Response<String>, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        response.headers_mut().insert(name, value);
    } else {
        tracing::warn!(header = %name, "Skipping invalid response header");
    }
}
