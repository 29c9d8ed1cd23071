//! The record an action targets

use std::borrow::Cow;

use crate::action::ActionList;
use crate::error::ActionError;
use crate::registry::ActionRegistry;
use crate::request::Payload;

/// Identity of a persisted record
pub type RecordId = u64;

/// A record that exposes actions
///
/// The record owns its identity and its declared action list; persistence
/// stays with the host, reached through [`Record::save`].
pub trait Record: Send + 'static {
    /// Identity; `None` while the record has never been written
    fn id(&self) -> Option<RecordId>;

    /// Display name of the record type, e.g. `Member`
    fn singular_name(&self) -> Cow<'_, str>;

    /// Actions the record declares for its current state
    fn cms_actions(&self) -> ActionList;

    /// Write submitted data to the record
    fn save(&mut self, payload: &Payload) -> Result<(), ActionError>;

    /// Whether the save-and-close button applies to this record
    fn supports_save_and_close(&self) -> bool {
        true
    }

    /// Whether the record has never been written
    fn is_new(&self) -> bool {
        self.id().is_none()
    }
}

/// Registration of a record type's action handlers
///
/// # Example
///
/// ```ignore
/// impl RegisterActions for Member {
///     fn register(registry: &mut ActionRegistry<Self>) {
///         registry.register_set(|action: MemberAction, member, _inv| match action {
///             MemberAction::Unlock => member.unlock(),
///         });
///     }
/// }
///
/// let dispatcher = ActionDispatcher::new(Member::registry());
/// ```
pub trait RegisterActions: Record + Sized {
    /// Add this type's handlers to `registry`
    fn register(registry: &mut ActionRegistry<Self>);

    /// A fresh registry holding this type's handlers
    fn registry() -> ActionRegistry<Self> {
        let mut registry = ActionRegistry::new();
        Self::register(&mut registry);
        registry
    }
}
