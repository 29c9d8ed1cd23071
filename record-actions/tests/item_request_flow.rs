//! End-to-end tests of the item request flow: declared actions, dispatch
//! and response negotiation through the public API

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use record_actions::prelude::*;
use record_actions::testing::{FixedGrid, ResponseAssertions, TestHarness};
use record_actions::{
    assert_outcome, assert_redirect, AuditConfig, AuditFilter, AuditKind, AuditMiddleware,
    FailureReason, SecurityToken,
};
use serde_json::json;

#[derive(ActionSet, Clone, Copy, Debug, PartialEq, Eq)]
enum MemberAction {
    #[action(refresh)]
    Unlock,
    #[action(title = "Send password reset")]
    ResetPassword,
    Suspend,
    #[action(trailing)]
    Purge,
}

#[derive(Debug, Default)]
struct Member {
    id: Option<RecordId>,
    email: String,
    locked: bool,
    suspended: bool,
    purged: bool,
}

impl Member {
    fn existing(id: RecordId) -> Self {
        Self {
            id: Some(id),
            email: "ada@example.com".into(),
            locked: true,
            ..Default::default()
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
        let mut list = ActionList::new();
        if self.locked {
            list = list.push(MemberAction::Unlock.descriptor());
        }
        list.push(MemberAction::ResetPassword.descriptor())
            .push(MemberAction::Suspend.descriptor())
            .push(MemberAction::Purge.descriptor())
    }

    fn save(&mut self, payload: &Payload) -> Result<(), ActionError> {
        let email = payload
            .get("Email")
            .and_then(|v| v.as_str())
            .filter(|e| e.contains('@'))
            .ok_or_else(|| ActionError::validation("A valid email is required"))?;
        self.email = email.to_string();
        if self.id.is_none() {
            self.id = Some(500);
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
                MemberAction::ResetPassword => Ok(inv
                    .payload
                    .get("Notify")
                    .and_then(|v| v.as_str())
                    .map(|to| format!("Reset link sent to {to}"))
                    .into()),
                MemberAction::Suspend => {
                    member.suspended = true;
                    Ok(ActionReturn::Done)
                }
                MemberAction::Purge => {
                    if member.suspended {
                        member.purged = true;
                        Ok(true.into())
                    } else {
                        Ok(false.into())
                    }
                }
            },
        );
    }
}

fn dispatcher() -> ActionDispatcher<Member> {
    ActionDispatcher::new(Member::registry())
}

#[test]
fn test_async_unlock_reports_status_and_reload() {
    let mut dispatcher = dispatcher();
    let mut harness = TestHarness::new(Member::existing(3), [3]);

    let response = harness.submit(&mut dispatcher, "doUnlock", true);

    assert_eq!(response.status(), http::StatusCode::OK);
    assert_eq!(response.status_message().as_deref(), Some("Member unlocked"));
    assert_eq!(response.header_str("X-Status"), Some("Member%20unlocked"));
    assert!(response.wants_reload());
    assert!(response.location().is_none());
    assert!(!harness.record.locked);
}

#[test]
fn test_action_no_longer_declared_is_rejected() {
    let mut dispatcher = dispatcher();
    let mut harness = TestHarness::new(Member::existing(3), [3]);

    harness.submit(&mut dispatcher, "doUnlock", true);
    // Unlocked members no longer declare the unlock action
    let response = harness.submit(&mut dispatcher, "doUnlock", true);

    assert_eq!(response.status(), http::StatusCode::FORBIDDEN);
    assert_eq!(response.status_message().as_deref(), Some("Action not available"));
}

#[test]
fn test_default_messages() {
    let mut dispatcher = dispatcher();
    let mut harness = TestHarness::new(Member::existing(3), [3]);

    let response = harness.submit(&mut dispatcher, "doResetPassword", true);
    assert_eq!(
        response.status_message().as_deref(),
        Some("Action Send password reset was done on Member")
    );

    let response = harness.submit(&mut dispatcher, "doPurge", true);
    assert_eq!(response.status(), http::StatusCode::FORBIDDEN);
    assert_eq!(
        response.status_message().as_deref(),
        Some("Action Purge was done on Member")
    );
    assert!(!harness.record.purged);
}

#[test]
fn test_handler_reads_payload() {
    let mut dispatcher = dispatcher();
    let mut harness = TestHarness::new(Member::existing(3), [3]);

    let payload = json!({
        "action_doCustomAction": {"doResetPassword": "Send password reset"},
        "Notify": "ada@example.com",
    });
    let request = dispatcher
        .form_request(payload.as_object().cloned().unwrap(), true)
        .unwrap();
    let response = harness.submit_with(&mut dispatcher, request);

    assert_eq!(
        response.status_message().as_deref(),
        Some("Reset link sent to ada@example.com")
    );
}

#[test]
fn test_sync_flow_flashes_and_redirects() {
    let mut dispatcher = dispatcher();
    let mut harness = TestHarness::new(Member::existing(3), [3]);

    let response = harness.submit(&mut dispatcher, "doSuspend", false);
    assert_redirect!(response, "admin/records/item/3/edit");

    let flash = harness.flash().unwrap();
    assert_eq!(flash.kind, MessageKind::Good);
    assert_eq!(flash.message, "Action Suspend was done on Member");
}

#[test]
fn test_sync_record_filtered_out_of_list() {
    let mut dispatcher = dispatcher();
    let mut harness = TestHarness::new(Member::existing(3), [1, 2]);

    let response = harness.submit(&mut dispatcher, "doSuspend", false);
    assert_redirect!(response, "admin/records");
    assert_eq!(response.header_str("X-Pjax"), Some("Content"));
    assert_eq!(harness.flash().unwrap().message, "Action Suspend was done on Member");
}

#[test]
fn test_save_and_close_creates_and_returns_to_list() {
    let mut dispatcher = dispatcher();
    let mut harness = TestHarness::new(Member::default(), []);

    let payload = json!({"Email": "grace@example.com"});
    let response = harness.submit_with(
        &mut dispatcher,
        DispatchRequest::save_and_close(payload.as_object().cloned().unwrap(), false),
    );

    assert_redirect!(response, "admin/records");
    assert_eq!(response.header_str("X-Pjax"), Some("Content"));
    assert_eq!(harness.record.id, Some(500));
    assert_eq!(harness.record.email, "grace@example.com");
}

#[test]
fn test_save_and_close_validation_failure() {
    let mut dispatcher = dispatcher();
    let mut harness = TestHarness::new(Member::existing(3), [3]);

    let payload = json!({"Email": "not-an-email"});
    let response = harness.submit_with(
        &mut dispatcher,
        DispatchRequest::save_and_close(payload.as_object().cloned().unwrap(), true),
    );

    assert_eq!(response.status(), http::StatusCode::FORBIDDEN);
    assert_eq!(
        response.status_message().as_deref(),
        Some("A valid email is required")
    );
    assert_eq!(harness.record.email, "ada@example.com");
}

#[test]
fn test_form_actions_include_save_and_close_before_trailing() {
    let dispatcher = dispatcher();
    let base = ActionList::new().push(ActionDescriptor::new("doSave", "Save"));

    let existing = dispatcher.item_form_actions(base.clone(), &Member::existing(3));
    assert_eq!(
        existing.names(),
        vec!["doSave", "doUnlock", "doResetPassword", "doSuspend", "doSaveAndClose", "doPurge"]
    );

    let new = dispatcher.item_form_actions(base, &Member::default());
    assert_eq!(new.find("doSaveAndClose").unwrap().title, "Create and Close");
}

#[test]
fn test_security_token_rejects_before_invocation() {
    let mut dispatcher = dispatcher().with_token_validator(SecurityToken::new("SecurityID", "abc"));
    let mut harness = TestHarness::new(Member::existing(3), [3]);

    let response = harness.submit(&mut dispatcher, "doUnlock", true);
    assert_eq!(response.status(), http::StatusCode::FORBIDDEN);
    assert_eq!(response.status_message().as_deref(), Some("Invalid security token"));
    assert!(harness.record.locked);

    let payload = json!({
        "action_doCustomAction": {"doUnlock": "Unlock"},
        "SecurityID": "abc",
    });
    let request = dispatcher
        .form_request(payload.as_object().cloned().unwrap(), true)
        .unwrap();
    let response = harness.submit_with(&mut dispatcher, request);
    assert_eq!(response.status(), http::StatusCode::OK);
    assert!(!harness.record.locked);
}

#[test]
fn test_token_validator_closure() {
    let checks = Arc::new(AtomicU32::new(0));
    let counter = checks.clone();
    let mut dispatcher = dispatcher().with_token_validator(move |_: &Payload| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    });
    let mut harness = TestHarness::new(Member::existing(3), [3]);

    harness.submit(&mut dispatcher, "doSuspend", true);
    // Custom links carry no form and skip the check
    harness.follow(&mut dispatcher, "doSuspend");

    assert_eq!(checks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_audit_trail() {
    let audit = AuditMiddleware::new(AuditConfig::new(10, AuditFilter::new(None, Some("doSave*"))));
    let mut dispatcher = dispatcher().with_middleware(audit);
    let mut harness = TestHarness::new(Member::existing(3), [3]);

    harness.submit(&mut dispatcher, "doSuspend", true);
    harness.submit(&mut dispatcher, "doNuke", true);
    harness.submit_with(
        &mut dispatcher,
        DispatchRequest::save_and_close(json!({"Email": "x@y.z"}).as_object().cloned().unwrap(), true),
    );

    let kinds: Vec<_> = dispatcher.middleware().log().entries().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![AuditKind::Success, AuditKind::Rejected]);
    assert_eq!(dispatcher.middleware().log().for_record(3).count(), 2);
}

#[test]
fn test_dispatch_without_presentation() {
    let mut dispatcher = dispatcher();
    let mut member = Member::existing(3);
    let grid = FixedGrid::new("admin/members", [3]);
    let ctx = RequestContext::new("admin/members/item/3/doCustomAction", &grid);

    let dispatched = dispatcher
        .dispatch(&mut member, &DispatchRequest::new("doPurge", Payload::new(), false), None, &ctx)
        .unwrap();
    assert_outcome!(
        dispatched.outcome,
        DispatchOutcome::Failure { reason: FailureReason::ReturnedFalse, .. }
    );
    assert!(!dispatched.was_new);
    assert_eq!(dispatched.record_id, Some(3));
}

#[test]
fn test_xhr_request_gets_header_response() {
    let grid = FixedGrid::new("admin/members", [3]);
    let request = http::Request::builder()
        .uri("/admin/members/item/3/doCustomAction?stage=Live")
        .header("X-Requested-With", "XMLHttpRequest")
        .body(())
        .unwrap();

    let ctx = RequestContext::from_http(&request, &grid);
    assert!(ctx.is_ajax);
    assert_eq!(ctx.url, "/admin/members/item/3/doCustomAction?stage=Live");

    let mut dispatcher = dispatcher();
    let payload = json!({"action_doCustomAction": {"doSuspend": "Suspend"}})
        .as_object()
        .cloned()
        .unwrap();
    let action = dispatcher.form_request(payload, false).unwrap();

    let mut member = Member::existing(3);
    let mut session = MemorySession::new();
    let form = FormContext::new("ItemEditForm");
    let response = dispatcher.handle(&mut member, action, Some(&form), &ctx, &mut session);

    assert_eq!(response.status(), http::StatusCode::OK);
    assert!(response.location().is_none());
    assert_eq!(
        response.status_message().as_deref(),
        Some("Action Suspend was done on Member")
    );
    assert!(session.flash(&form.name).is_none());
    assert!(member.suspended);
}

#[test]
fn test_requested_region_used_on_return_to_list() {
    let grid = FixedGrid::new("admin/members", [1, 2]);
    let request = http::Request::builder()
        .uri("/admin/members/item/3/doCustomAction")
        .header("X-Pjax", "CurrentForm")
        .body(())
        .unwrap();
    let ctx = RequestContext::from_http(&request, &grid);
    assert!(!ctx.is_ajax);

    let mut dispatcher = dispatcher();
    let mut member = Member::existing(3);
    let mut session = MemorySession::new();
    let form = FormContext::new("ItemEditForm");
    let response = dispatcher.handle(
        &mut member,
        DispatchRequest::new("doSuspend", Payload::new(), false),
        Some(&form),
        &ctx,
        &mut session,
    );
    assert_redirect!(response, "admin/members");
    assert_eq!(response.header_str("X-Pjax"), Some("CurrentForm"));
    assert!(session.flash(&form.name).is_some());
}
