//! In-memory member record and its actions

use record_actions::prelude::*;
use serde::Serialize;

#[derive(ActionSet, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberAction {
    /// Clear failed-login lockout
    #[action(refresh)]
    Unlock,
    /// Email a password reset link
    #[action(title = "Send password reset")]
    ResetPassword,
    /// Download the member as JSON
    Export,
    /// Move the member out of the active list
    #[action(name = "doCustomAction[archive]", alias = "doArchive", trailing)]
    Archive,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Member {
    pub id: Option<RecordId>,
    pub email: String,
    pub locked: bool,
    pub archived: bool,
}

impl Member {
    pub fn new(id: Option<RecordId>, email: impl Into<String>, locked: bool) -> Self {
        Self {
            id,
            email: email.into(),
            locked,
            archived: false,
        }
    }
}

impl Record for Member {
    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn singular_name(&self) -> Cow<'_, str> {
        Cow::Borrowed("Member")
    }

    fn cms_actions(&self) -> ActionList {
        // Nothing to act on before the first save
        if self.is_new() {
            return ActionList::new();
        }
        MemberAction::all()
            .iter()
            .filter(|action| match action {
                MemberAction::Unlock => self.locked,
                MemberAction::Archive => !self.archived,
                _ => true,
            })
            .map(|action| action.descriptor())
            .collect()
    }

    fn save(&mut self, payload: &Payload) -> Result<(), ActionError> {
        if let Some(email) = payload.get("Email").and_then(|v| v.as_str()) {
            if !email.contains('@') {
                return Err(ActionError::validation(format!("{email} is not an email address")));
            }
            self.email = email.to_string();
        }
        if self.id.is_none() {
            self.id = Some(1);
        }
        Ok(())
    }
}

impl RegisterActions for Member {
    fn register(registry: &mut ActionRegistry<Self>) {
        registry.register_set(
            |action: MemberAction, member: &mut Member, inv: &Invocation<'_>| match action {
                MemberAction::Unlock => {
                    member.locked = false;
                    Ok("Member unlocked".into())
                }
                MemberAction::ResetPassword => {
                    if member.email.is_empty() {
                        return Err(ActionError::msg("Member has no email address"));
                    }
                    tracing::info!(email = %member.email, "Sending password reset");
                    Ok(format!("Reset link sent to {}", member.email).into())
                }
                MemberAction::Export => {
                    let raw =
                        RawResponse::json(&*member).map_err(|e| ActionError::Other(Box::new(e)))?;
                    Ok(raw.into())
                }
                MemberAction::Archive => {
                    member.archived = true;
                    tracing::debug!(url = %inv.request.url, "Archived member");
                    Ok(true.into())
                }
            },
        );
    }
}
