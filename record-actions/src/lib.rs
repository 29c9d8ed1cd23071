//! record-actions: Named actions on admin records
//!
//! Records declare the actions they expose, handlers are registered once
//! per record type, and the dispatcher turns one submitted action into
//! exactly one HTTP response: a status header for async requests, a flash
//! message and redirect for full-page ones.
//!
//! # Example
//! ```ignore
//! use record_actions::prelude::*;
//!
//! #[derive(ActionSet, Clone, Copy, Debug, PartialEq, Eq)]
//! enum MemberAction {
//!     #[action(refresh)]
//!     Unlock,
//!     ResetPassword,
//! }
//!
//! impl RegisterActions for Member {
//!     fn register(registry: &mut ActionRegistry<Self>) {
//!         registry.register_set(|action: MemberAction, member: &mut Member, _: &Invocation<'_>| {
//!             match action {
//!                 MemberAction::Unlock => member.unlock(),
//!                 MemberAction::ResetPassword => member.reset_password(),
//!             }
//!         });
//!     }
//! }
//! ```

// Re-export everything from core
pub use record_actions_core::*;

// Re-export derive macros
pub use record_actions_macros::ActionSet;

/// Prelude for convenient imports
pub mod prelude {
    pub use record_actions_core::prelude::*;

    // Derive macros
    pub use record_actions_macros::ActionSet;
}
