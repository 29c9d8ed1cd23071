//! Hooks around every dispatch

use crate::error::DispatchError;
use crate::outcome::DispatchOutcome;
use crate::record::RecordId;
use crate::request::Route;

/// Description of one action call, handed to middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionCall<'a> {
    /// Requested action name
    pub action: &'a str,
    /// Singular name of the record type
    pub record: &'a str,
    /// Record identity before the action ran
    pub record_id: Option<RecordId>,
    /// Entry point of the request
    pub route: Route,
}

/// Middleware trait for observing dispatches
///
/// Implement this trait to add logging, auditing or metrics around the
/// dispatcher.
pub trait DispatchMiddleware {
    /// Called before the handler is invoked
    fn before(&mut self, call: &ActionCall<'_>);

    /// Called with the outcome once the handler returned
    fn after(&mut self, call: &ActionCall<'_>, outcome: &DispatchOutcome);

    /// Called when a request is rejected before invocation
    fn rejected(&mut self, _call: &ActionCall<'_>, _error: &DispatchError) {}
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl DispatchMiddleware for NoopMiddleware {
    fn before(&mut self, _call: &ActionCall<'_>) {}
    fn after(&mut self, _call: &ActionCall<'_>, _outcome: &DispatchOutcome) {}
}

/// Middleware that logs dispatches through `tracing`
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    /// Whether to log before invocation
    pub log_before: bool,
    /// Whether to log outcomes
    pub log_after: bool,
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingMiddleware {
    /// Log outcomes and rejections only
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Log before invocation as well
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl DispatchMiddleware for LoggingMiddleware {
    fn before(&mut self, call: &ActionCall<'_>) {
        if self.log_before {
            tracing::debug!(
                action = %call.action,
                record = %call.record,
                record_id = ?call.record_id,
                route = call.route.segment(),
                "Dispatching action"
            );
        }
    }

    fn after(&mut self, call: &ActionCall<'_>, outcome: &DispatchOutcome) {
        if !self.log_after {
            return;
        }
        match outcome {
            DispatchOutcome::Failure { message, reason } => tracing::warn!(
                action = %call.action,
                record = %call.record,
                record_id = ?call.record_id,
                reason = ?reason,
                message = %message,
                "Action failed"
            ),
            _ => tracing::debug!(
                action = %call.action,
                record = %call.record,
                record_id = ?call.record_id,
                outcome = outcome.kind(),
                "Action processed"
            ),
        }
    }

    fn rejected(&mut self, call: &ActionCall<'_>, error: &DispatchError) {
        tracing::info!(
            action = %call.action,
            record = %call.record,
            record_id = ?call.record_id,
            error = %error,
            "Action rejected"
        );
    }
}

/// Compose multiple middleware into a single middleware
pub struct ComposedMiddleware {
    middlewares: Vec<Box<dyn DispatchMiddleware + Send>>,
}

impl std::fmt::Debug for ComposedMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl Default for ComposedMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposedMiddleware {
    /// Create an empty composition
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the composition
    pub fn add<M: DispatchMiddleware + Send + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Builder form of [`add`](Self::add)
    #[must_use]
    pub fn with<M: DispatchMiddleware + Send + 'static>(mut self, middleware: M) -> Self {
        self.add(middleware);
        self
    }
}

impl DispatchMiddleware for ComposedMiddleware {
    fn before(&mut self, call: &ActionCall<'_>) {
        for middleware in &mut self.middlewares {
            middleware.before(call);
        }
    }

    fn after(&mut self, call: &ActionCall<'_>, outcome: &DispatchOutcome) {
        // Reverse order for proper nesting
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(call, outcome);
        }
    }

    fn rejected(&mut self, call: &ActionCall<'_>, error: &DispatchError) {
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.rejected(call, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        label: &'static str,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl DispatchMiddleware for Recorder {
        fn before(&mut self, call: &ActionCall<'_>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:before:{}", self.label, call.action));
        }

        fn after(&mut self, call: &ActionCall<'_>, outcome: &DispatchOutcome) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:after:{}:{}", self.label, call.action, outcome.kind()));
        }

        fn rejected(&mut self, call: &ActionCall<'_>, _error: &DispatchError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:rejected:{}", self.label, call.action));
        }
    }

    fn call() -> ActionCall<'static> {
        ActionCall {
            action: "doUnlock",
            record: "Member",
            record_id: Some(7),
            route: Route::CustomAction,
        }
    }

    #[test]
    fn test_composed_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut composed = ComposedMiddleware::new()
            .with(Recorder {
                label: "a",
                events: events.clone(),
            })
            .with(Recorder {
                label: "b",
                events: events.clone(),
            });

        let outcome = DispatchOutcome::Success {
            message: "ok".into(),
        };
        composed.before(&call());
        composed.after(&call(), &outcome);
        composed.rejected(&call(), &DispatchError::InvalidSecurityToken);

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "a:before:doUnlock",
                "b:before:doUnlock",
                "b:after:doUnlock:success",
                "a:after:doUnlock:success",
                "b:rejected:doUnlock",
                "a:rejected:doUnlock",
            ]
        );
    }

    #[test]
    fn test_logging_middleware_settings() {
        let quiet = LoggingMiddleware::new();
        assert!(!quiet.log_before);
        assert!(quiet.log_after);

        let mut verbose = LoggingMiddleware::verbose();
        assert!(verbose.log_before);
        verbose.before(&call());
        verbose.after(
            &call(),
            &DispatchOutcome::panicked("handler panicked".into()),
        );
    }
}
