//! Ordered transformations of a record's action list
//!
//! Instead of letting collaborators push into a shared mutable list, each
//! stage receives the list by value and returns the next one:
//!
//! ```ignore
//! let pipeline = ActionPipeline::standard()
//!     .stage("hide_archive", |list, member: &Member| {
//!         if member.is_archived() { list.remove("doArchive") } else { list }
//!     });
//! let declared = pipeline.apply(member.cms_actions(), &member);
//! ```

use crate::action::{ActionDescriptor, ActionFlags, ActionList};
use crate::record::Record;
use crate::request::Route;

/// A single transformation stage
pub type ActionTransform<R> = Box<dyn Fn(ActionList, &R) -> ActionList + Send + Sync>;

/// Ordered list of action-list transformations
pub struct ActionPipeline<R> {
    stages: Vec<(&'static str, ActionTransform<R>)>,
}

impl<R> std::fmt::Debug for ActionPipeline<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionPipeline")
            .field("stages", &self.labels())
            .finish()
    }
}

impl<R: Record> Default for ActionPipeline<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> ActionPipeline<R> {
    /// Pipeline with no stages; `apply` returns its input
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Save-and-close button followed by trailing actions last
    pub fn standard() -> Self {
        Self::new()
            .stage("save_and_close", save_and_close_stage)
            .stage("trailing", trailing_stage)
    }

    /// Append a stage
    #[must_use]
    pub fn stage<F>(mut self, label: &'static str, transform: F) -> Self
    where
        F: Fn(ActionList, &R) -> ActionList + Send + Sync + 'static,
    {
        self.stages.push((label, Box::new(transform)));
        self
    }

    /// Run every stage in order
    pub fn apply(&self, list: ActionList, record: &R) -> ActionList {
        self.stages
            .iter()
            .fold(list, |list, (_, transform)| transform(list, record))
    }

    /// Merge a form's base actions with the record's declared actions
    ///
    /// Declared actions follow the base ones, then trailing actions
    /// (delete, cancel) are moved last.
    pub fn item_form_actions(&self, base: ActionList, record: &R) -> ActionList {
        base.extend(self.apply(record.cms_actions(), record))
            .move_trailing_to_end()
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether there are no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<R> ActionPipeline<R> {
    /// Stage labels in order
    pub fn labels(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(label, _)| *label).collect()
    }
}

/// Append the save-and-close button
///
/// The title reads "Create and Close" until the record has an identity.
pub fn save_and_close_stage<R: Record>(list: ActionList, record: &R) -> ActionList {
    if !record.supports_save_and_close() {
        return list;
    }
    let title = if record.is_new() {
        "Create and Close"
    } else {
        "Save and Close"
    };
    list.push(
        ActionDescriptor::new(Route::SaveAndClose.segment(), title)
            .with_flags(ActionFlags::PRIMARY),
    )
}

/// Move [`ActionFlags::TRAILING`] actions to the end
pub fn trailing_stage<R: Record>(list: ActionList, _record: &R) -> ActionList {
    list.move_trailing_to_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use crate::request::Payload;
    use crate::RecordId;
    use std::borrow::Cow;

    struct Page {
        id: Option<RecordId>,
        closable: bool,
    }

    impl Record for Page {
        fn id(&self) -> Option<RecordId> {
            self.id
        }
        fn singular_name(&self) -> Cow<'_, str> {
            Cow::Borrowed("Page")
        }
        fn cms_actions(&self) -> ActionList {
            ActionList::new()
                .push(ActionDescriptor::new("doArchive", "Archive").with_flags(ActionFlags::TRAILING))
                .push(ActionDescriptor::new("doPublish", "Publish"))
        }
        fn save(&mut self, _payload: &Payload) -> Result<(), ActionError> {
            Ok(())
        }
        fn supports_save_and_close(&self) -> bool {
            self.closable
        }
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let page = Page { id: Some(1), closable: true };
        let pipeline = ActionPipeline::<Page>::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.apply(page.cms_actions(), &page), page.cms_actions());
    }

    #[test]
    fn test_standard_pipeline_titles() {
        let pipeline = ActionPipeline::standard();
        assert_eq!(pipeline.labels(), vec!["save_and_close", "trailing"]);

        let existing = Page { id: Some(3), closable: true };
        let list = pipeline.apply(existing.cms_actions(), &existing);
        assert_eq!(list.names(), vec!["doPublish", "doSaveAndClose", "doArchive"]);
        assert_eq!(list.find("doSaveAndClose").unwrap().title, "Save and Close");

        let new = Page { id: None, closable: true };
        let list = pipeline.apply(new.cms_actions(), &new);
        assert_eq!(list.find("doSaveAndClose").unwrap().title, "Create and Close");
    }

    #[test]
    fn test_save_and_close_opt_out() {
        let page = Page { id: Some(1), closable: false };
        let list = ActionPipeline::standard().apply(page.cms_actions(), &page);
        assert!(!list.contains("doSaveAndClose"));
    }

    #[test]
    fn test_custom_stage_order() {
        let page = Page { id: Some(1), closable: false };
        let pipeline = ActionPipeline::new()
            .stage("drop_publish", |list: ActionList, _: &Page| list.remove("doPublish"))
            .stage("add_preview", |list: ActionList, _: &Page| {
                list.push(ActionDescriptor::new("doPreview", "Preview"))
            });
        let list = pipeline.apply(page.cms_actions(), &page);
        assert_eq!(list.names(), vec!["doArchive", "doPreview"]);
    }

    #[test]
    fn test_item_form_actions_merge() {
        let page = Page { id: Some(1), closable: true };
        let base = ActionList::new()
            .push(ActionDescriptor::new("doDelete", "Delete").with_flags(ActionFlags::TRAILING))
            .push(ActionDescriptor::new("doSave", "Save"));
        let list = ActionPipeline::standard().item_form_actions(base, &page);
        assert_eq!(
            list.names(),
            vec!["doSave", "doPublish", "doSaveAndClose", "doDelete", "doArchive"]
        );
    }
}
