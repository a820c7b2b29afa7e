mod common;

use common::FakeApi;
use empdesk_core::auth::{self, LoginForm, PasswordChangeForm, RegisterField, RegisterForm};
use empdesk_core::listing::{EmployeeList, FetchOutcome};
use empdesk_core::record::RecordEditor;
use empdesk_core::schema::{FieldUpdate, FormDraft};
use empdesk_core::session::{MemorySessionStore, SessionStore};
use empdesk_core::{ClientError, FieldType};
use serde_json::json;

fn draft_with(name: &str, labels: &[(&str, FieldType)]) -> FormDraft {
    let mut draft = FormDraft::new();
    draft.name = name.into();
    for (label, field_type) in labels {
        let key = draft.add_field();
        draft.update_field(key, FieldUpdate::Label((*label).into()));
        draft.update_field(key, FieldUpdate::FieldType(*field_type));
    }
    draft
}

#[test]
fn saved_form_reloads_with_same_fields() {
    let api = FakeApi::new();
    let draft = draft_with("Staff", &[("X", FieldType::Text)]);

    let saved = draft.save(&api).unwrap();
    assert_eq!(api.calls(), ["POST forms/"]);

    let reloaded = FormDraft::edit(&saved);
    let payload = reloaded.payload().unwrap();
    assert_eq!(payload.fields.len(), 1);
    assert_eq!(payload.fields[0].label, "X");
    assert_eq!(payload.fields[0].field_type, FieldType::Text);
    assert_eq!(payload.fields[0].order, 1);
}

#[test]
fn editing_a_form_replaces_it_in_row_order() {
    let api = FakeApi::new();
    let saved = draft_with(
        "Staff",
        &[("Name", FieldType::Text), ("Email", FieldType::Email), ("Start", FieldType::Date)],
    )
    .save(&api)
    .unwrap();

    let mut draft = FormDraft::edit(&saved);
    draft.reorder(2, 0);
    let extra = draft.add_field();
    draft.update_field(extra, FieldUpdate::Label("  Notes ".into()));
    draft.save(&api).unwrap();

    assert_eq!(api.calls().last().unwrap(), &format!("PUT forms/{}/", saved.id));
    let stored = &api.forms()[0];
    let rows: Vec<_> = stored
        .fields
        .iter()
        .map(|f| (f.label.as_str(), f.order))
        .collect();
    assert_eq!(rows, [("Start", 1), ("Name", 2), ("Email", 3), ("Notes", 4)]);
}

#[test]
fn invalid_draft_makes_no_request() {
    let api = FakeApi::new();
    let draft = draft_with("   ", &[("X", FieldType::Text)]);

    assert!(matches!(draft.save(&api), Err(ClientError::Validation(_))));
    assert!(api.calls().is_empty());
}

#[test]
fn server_rejection_surfaces_field_message() {
    let api = FakeApi::new();
    api.fail_next(400, json!({"fields": [{"label": ["This field may not be blank."]}]}));
    let draft = draft_with("Staff", &[("", FieldType::Text)]);

    let err = draft.save(&api).unwrap_err();
    // Nested serializer errors carry no flat message
    assert_eq!(empdesk_core::schema::save_error_message(&err), "Failed to save form");
}

#[test]
fn record_create_requires_every_field() {
    let api = FakeApi::new();
    let form = draft_with("Staff", &[("Name", FieldType::Text), ("Email", FieldType::Email)])
        .save(&api)
        .unwrap();

    let mut editor = RecordEditor::open(&form, None);
    editor.set_value("Email", "x");

    let err = editor.submit(&api).unwrap_err();
    assert_eq!(err.to_string(), "Please fill: Name");
    assert_eq!(api.calls().len(), 1);

    editor.set_value("Name", "Ann");
    let created = editor.submit(&api).unwrap();
    assert_eq!(created.form, form.id);
    assert_eq!(created.data["Name"], "Ann");
}

#[test]
fn record_update_keeps_original_keys() {
    let api = FakeApi::new();
    api.seed_employees(4, 1);
    let record = api.employees()[0].clone();

    let mut editor = RecordEditor::for_record(&record);
    editor.set_value("Name", "");
    let updated = editor.submit(&api).unwrap();

    assert_eq!(api.calls(), [format!("PUT employees/{}/", record.id)]);
    assert_eq!(updated.data["Name"], "");
    assert_eq!(updated.form, 4);
}

#[test]
fn record_server_error_uses_precedence() {
    let api = FakeApi::new();
    api.seed_employees(4, 1);
    let editor = RecordEditor::for_record(&api.employees()[0]);

    api.fail_next(400, json!({"form": ["Invalid pk \"4\" - object does not exist."]}));
    let err = editor.submit(&api).unwrap_err();
    assert_eq!(
        editor.error_message(&err),
        "Invalid pk \"4\" - object does not exist."
    );

    api.fail_next(500, json!(null));
    let err = editor.submit(&api).unwrap_err();
    assert_eq!(editor.error_message(&err), "Failed to update employee");
}

#[test]
fn list_pages_through_results() {
    let api = FakeApi::new();
    api.seed_employees(1, 25);

    let mut list = EmployeeList::new();
    assert_eq!(list.fetch(&api), FetchOutcome::Applied);
    assert_eq!(list.total_pages(), 3);
    assert_eq!(list.records().len(), 10);

    while list.next_page() {
        list.fetch(&api);
    }
    assert_eq!(list.page(), 3);
    assert_eq!(list.records().len(), 5);

    list.set_search("Person 2");
    list.fetch(&api);
    assert_eq!(list.page(), 1);
    assert_eq!(list.total_pages(), 1);
    assert_eq!(
        api.calls().last().unwrap(),
        "GET employees/?page=1&search=Person 2"
    );
}

#[test]
fn delete_refetches_and_failure_leaves_list_alone() {
    let api = FakeApi::new();
    api.seed_employees(1, 3);

    let mut list = EmployeeList::new();
    list.fetch(&api);
    let first = list.records()[0].id;

    let confirmation = list.request_delete(first);
    list.delete(&api, confirmation).unwrap();
    assert_eq!(list.records().len(), 2);
    assert_eq!(
        api.calls()[1..],
        [format!("DELETE employees/{first}/"), "GET employees/?page=1&search=".to_string()]
    );

    let second = list.records()[0].id;
    api.fail_next(403, json!({"detail": "You do not have permission to perform this action."}));
    let confirmation = list.request_delete(second);
    assert!(list.delete(&api, confirmation).is_err());
    assert_eq!(list.records().len(), 2);
    assert_eq!(
        list.error(),
        Some("You do not have permission to perform this action.")
    );
}

#[test]
fn deleting_the_last_row_of_the_last_page_moves_back() {
    let api = FakeApi::new();
    api.seed_employees(1, 11);

    let mut list = EmployeeList::new();
    list.fetch(&api);
    list.next_page();
    list.fetch(&api);
    assert_eq!(list.records().len(), 1);

    let last = list.records()[0].id;
    list.delete(&api, list.request_delete(last)).unwrap();
    assert_eq!(list.page(), 1);
    assert_eq!(list.total_pages(), 1);
    assert_eq!(list.records().len(), 10);
}

#[test]
fn login_stores_tokens_and_logout_clears_them() {
    let api = FakeApi::new();
    let store = MemorySessionStore::new();

    let form = LoginForm {
        username: "ann".into(),
        password: "secret".into(),
    };
    let session = auth::login(&api, &store, &form).unwrap();
    assert_eq!(session.access_token, "access-ann");
    assert_eq!(store.get(), Some(session));

    auth::logout(&store).unwrap();
    assert!(!store.is_authenticated());
}

#[test]
fn failed_login_shows_server_message_and_keeps_session_empty() {
    let api = FakeApi::new();
    let store = MemorySessionStore::new();
    api.fail_next(401, json!({"error": "Invalid Credentials"}));

    let form = LoginForm {
        username: "ann".into(),
        password: "wrong".into(),
    };
    let err = auth::login(&api, &store, &form).unwrap_err();
    assert!(matches!(err, ClientError::Auth { .. }));
    assert_eq!(auth::login_error_message(&err), "Invalid Credentials");
    assert!(store.get().is_none());
}

#[test]
fn register_merges_server_errors() {
    let api = FakeApi::new();
    let form = RegisterForm {
        username: "ann".into(),
        email: "ann@example.com".into(),
        password: "longenough".into(),
        confirm_password: "longenough".into(),
    };
    assert!(auth::register(&api, &form).is_ok());

    api.fail_next(400, json!({"username": ["A user with that username already exists."]}));
    let errors = auth::register(&api, &form).unwrap_err();
    assert_eq!(
        errors.get(&RegisterField::Username).map(String::as_str),
        Some("A user with that username already exists.")
    );

    let invalid = RegisterForm::default();
    let calls_before = api.calls().len();
    assert!(auth::register(&api, &invalid).is_err());
    assert_eq!(api.calls().len(), calls_before);
}

#[test]
fn change_password_validates_before_sending() {
    let api = FakeApi::new();
    let form = PasswordChangeForm {
        old_password: "old".into(),
        new_password: String::new(),
    };
    assert!(auth::change_password(&api, &form).is_err());
    assert!(api.calls().is_empty());

    let form = PasswordChangeForm {
        new_password: "newpassword".into(),
        ..form
    };
    auth::change_password(&api, &form).unwrap();
    assert_eq!(api.calls(), ["POST auth/change-password/"]);
}
