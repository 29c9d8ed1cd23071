//! Explicit registry mapping action names to typed handlers

use std::collections::HashMap;

use crate::action::ActionSet;
use crate::outcome::ActionResult;
use crate::request::{FormContext, Payload, RequestContext};

/// Arguments handed to an action handler
pub struct Invocation<'a> {
    /// Submitted data
    pub payload: &'a Payload,
    /// The form the action was submitted from, if any
    pub form: Option<&'a FormContext>,
    /// Request-scoped context
    pub request: &'a RequestContext<'a>,
}

/// A boxed action handler
pub type Handler<R> = Box<dyn Fn(&mut R, &Invocation<'_>) -> ActionResult + Send + Sync>;

/// Name to handler map for one record type
///
/// Populated once per record type; lookups never fall back to reflection,
/// so an unregistered name is simply not dispatchable.
pub struct ActionRegistry<R> {
    handlers: HashMap<String, Handler<R>>,
}

impl<R: 'static> std::fmt::Debug for ActionRegistry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

impl<R: 'static> Default for ActionRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static> ActionRegistry<R> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any previous one under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&mut R, &Invocation<'_>) -> ActionResult + Send + Sync + 'static,
    {
        let name = name.into();
        if self.handlers.insert(name.clone(), Box::new(handler)).is_some() {
            tracing::debug!(action = %name, "Replaced action handler");
        }
        self
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut R, &Invocation<'_>) -> ActionResult + Send + Sync + 'static,
    {
        self.register(name, handler);
        self
    }

    /// Register one handler for every action of a typed set
    ///
    /// Each action is registered under its handler name (the alias when
    /// present) and the handler receives the typed action back.
    pub fn register_set<A, F>(&mut self, handler: F) -> &mut Self
    where
        A: ActionSet,
        F: Fn(A, &mut R, &Invocation<'_>) -> ActionResult + Clone + Send + Sync + 'static,
    {
        for &action in A::all() {
            let handler = handler.clone();
            let name = action.alias().unwrap_or(action.name());
            self.register(name, move |record: &mut R, inv: &Invocation<'_>| {
                handler(action, record, inv)
            });
        }
        self
    }

    /// Handler registered under `name`
    pub fn get(&self, name: &str) -> Option<&Handler<R>> {
        self.handlers.get(name)
    }

    /// Whether a handler is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionFlags;
    use crate::outcome::ActionReturn;
    use crate::request::GridContext;
    use crate::RecordId;

    #[derive(Default)]
    struct Counter {
        hits: u32,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum CounterAction {
        Bump,
        Reset,
    }

    impl ActionSet for CounterAction {
        fn name(&self) -> &'static str {
            match self {
                CounterAction::Bump => "doBump",
                CounterAction::Reset => "doReset",
            }
        }
        fn title(&self) -> &'static str {
            match self {
                CounterAction::Bump => "Bump",
                CounterAction::Reset => "Reset",
            }
        }
        fn flags(&self) -> ActionFlags {
            ActionFlags::empty()
        }
        fn alias(&self) -> Option<&'static str> {
            match self {
                CounterAction::Reset => Some("reset"),
                CounterAction::Bump => None,
            }
        }
        fn all() -> &'static [Self] {
            &[CounterAction::Bump, CounterAction::Reset]
        }
    }

    struct NoGrid;

    impl GridContext for NoGrid {
        fn item_link(&self, _id: Option<RecordId>) -> String {
            String::new()
        }
        fn contains(&self, _id: RecordId) -> bool {
            false
        }
        fn back_link(&self) -> String {
            String::new()
        }
    }

    fn invoke(registry: &ActionRegistry<Counter>, name: &str, counter: &mut Counter) -> ActionResult {
        let payload = Payload::new();
        let grid = NoGrid;
        let request = RequestContext::new("admin/counters", &grid);
        let inv = Invocation {
            payload: &payload,
            form: None,
            request: &request,
        };
        (registry.get(name).unwrap())(counter, &inv)
    }

    #[test]
    fn test_register_and_invoke() {
        let registry = ActionRegistry::new().with("doBump", |c: &mut Counter, _: &Invocation<'_>| {
            c.hits += 1;
            Ok(ActionReturn::Done)
        });
        let mut counter = Counter::default();

        assert!(registry.contains("doBump"));
        assert!(!registry.contains("doReset"));
        invoke(&registry, "doBump", &mut counter).unwrap();
        assert_eq!(counter.hits, 1);
    }

    #[test]
    fn test_register_set_uses_handler_names() {
        let mut registry = ActionRegistry::new();
        registry.register_set(|action: CounterAction, c: &mut Counter, _: &Invocation<'_>| {
            match action {
                CounterAction::Bump => c.hits += 1,
                CounterAction::Reset => c.hits = 0,
            }
            Ok(ActionReturn::Message(action.title().to_string()))
        });

        assert_eq!(registry.names(), vec!["doBump", "reset"]);

        let mut counter = Counter { hits: 4 };
        let result = invoke(&registry, "reset", &mut counter).unwrap();
        assert_eq!(result, ActionReturn::Message("Reset".into()));
        assert_eq!(counter.hits, 0);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ActionRegistry::<Counter>::new();
        registry.register("doBump", |_, _| Ok(false.into()));
        registry.register("doBump", |_, _| Ok(true.into()));
        assert_eq!(registry.len(), 1);

        let mut counter = Counter::default();
        assert_eq!(invoke(&registry, "doBump", &mut counter).unwrap(), ActionReturn::Flag(true));
    }
}
