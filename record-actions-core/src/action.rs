//! Action descriptors and typed action sets

use bitflags::bitflags;
use std::fmt::Debug;

bitflags! {
    /// Presentation hints carried by an [`ActionDescriptor`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActionFlags: u8 {
        /// The client reloads its content region after an async dispatch
        const REFRESH = 1 << 0;
        /// Rendered as the primary button of the action bar
        const PRIMARY = 1 << 1;
        /// Pinned to the end of the action bar (delete, cancel)
        const TRAILING = 1 << 2;
    }
}

/// An action a record exposes, looked up by name
///
/// Descriptors are produced by the record on demand and are never
/// persisted. A descriptor may carry an alias: the name the handler is
/// registered under when it differs from the button name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionDescriptor {
    /// Button name, e.g. `doUnlock`
    pub name: String,
    /// Human readable title, e.g. `Unlock`
    pub title: String,
    /// Alternative name the action answers to
    pub alias: Option<String>,
    /// Presentation hints
    pub flags: ActionFlags,
}

impl ActionDescriptor {
    /// Create a descriptor with no alias and no flags
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            alias: None,
            flags: ActionFlags::empty(),
        }
    }

    /// Set the alias the action also answers to
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add presentation flags
    pub fn with_flags(mut self, flags: ActionFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Mark the action as requiring a client refresh
    pub fn refresh(self) -> Self {
        self.with_flags(ActionFlags::REFRESH)
    }

    /// Whether the client should reload its content region afterwards
    #[inline]
    pub fn requires_refresh(&self) -> bool {
        self.flags.contains(ActionFlags::REFRESH)
    }

    /// Whether the action is pinned to the end of the action bar
    #[inline]
    pub fn is_trailing(&self) -> bool {
        self.flags.contains(ActionFlags::TRAILING)
    }

    /// Exact match against the name or the alias
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.alias.as_deref() == Some(name)
    }

    /// The name handlers are registered under: the alias when present
    pub fn handler_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered, immutable list of action descriptors
///
/// Every edit consumes the list and returns a new one, so a list handed
/// to a transformation stage is never mutated behind anyone's back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionList {
    items: Vec<ActionDescriptor>,
}

impl ActionList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action
    #[must_use]
    pub fn push(mut self, action: ActionDescriptor) -> Self {
        self.items.push(action);
        self
    }

    /// Append every action of `other`, keeping its order
    #[must_use]
    pub fn extend(mut self, other: ActionList) -> Self {
        self.items.extend(other.items);
        self
    }

    /// Drop every action matching `name`
    #[must_use]
    pub fn remove(mut self, name: &str) -> Self {
        self.items.retain(|a| !a.matches(name));
        self
    }

    /// Move the first action matching `name` to the end
    #[must_use]
    pub fn move_to_end(mut self, name: &str) -> Self {
        if let Some(pos) = self.items.iter().position(|a| a.matches(name)) {
            let action = self.items.remove(pos);
            self.items.push(action);
        }
        self
    }

    /// Move every [`ActionFlags::TRAILING`] action to the end, keeping
    /// relative order within both groups
    #[must_use]
    pub fn move_trailing_to_end(self) -> Self {
        let (trailing, leading): (Vec<_>, Vec<_>) =
            self.items.into_iter().partition(|a| a.is_trailing());
        let mut items = leading;
        items.extend(trailing);
        Self { items }
    }

    /// First action matching `name` by name or alias
    pub fn find(&self, name: &str) -> Option<&ActionDescriptor> {
        self.items.iter().find(|a| a.matches(name))
    }

    /// Whether any action matches `name`
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Iterate actions in order
    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.items.iter()
    }

    /// Button names in order
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|a| a.name.as_str()).collect()
    }

    /// Number of actions
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ActionDescriptor> for ActionList {
    fn from_iter<T: IntoIterator<Item = ActionDescriptor>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ActionList {
    type Item = ActionDescriptor;
    type IntoIter = std::vec::IntoIter<ActionDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// A typed set of actions a record type exposes
///
/// Use `#[derive(ActionSet)]` from `record-actions-macros` to implement
/// this trait for a unit enum.
///
/// # Example
///
/// ```
/// use record_actions_core::{ActionFlags, ActionSet};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// enum MemberAction {
///     Unlock,
/// }
///
/// impl ActionSet for MemberAction {
///     fn name(&self) -> &'static str {
///         "doUnlock"
///     }
///     fn title(&self) -> &'static str {
///         "Unlock"
///     }
///     fn flags(&self) -> ActionFlags {
///         ActionFlags::REFRESH
///     }
///     fn all() -> &'static [Self] {
///         &[MemberAction::Unlock]
///     }
/// }
///
/// assert_eq!(MemberAction::from_name("doUnlock"), Some(MemberAction::Unlock));
/// assert!(MemberAction::Unlock.descriptor().requires_refresh());
/// ```
pub trait ActionSet: Copy + Eq + Debug + Send + Sync + 'static {
    /// Button name of this action
    fn name(&self) -> &'static str;

    /// Human readable title
    fn title(&self) -> &'static str;

    /// Presentation hints
    fn flags(&self) -> ActionFlags {
        ActionFlags::empty()
    }

    /// Alternative name the action answers to
    fn alias(&self) -> Option<&'static str> {
        None
    }

    /// Every action of the set, in declaration order
    fn all() -> &'static [Self];

    /// Look an action up by name or alias
    fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|a| a.name() == name || a.alias() == Some(name))
    }

    /// Build the descriptor for this action
    fn descriptor(&self) -> ActionDescriptor {
        ActionDescriptor {
            name: self.name().to_string(),
            title: self.title().to_string(),
            alias: self.alias().map(str::to_string),
            flags: self.flags(),
        }
    }

    /// Descriptors of every action of the set
    fn list() -> ActionList {
        Self::all().iter().map(|a| a.descriptor()).collect()
    }
}
