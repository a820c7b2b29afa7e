//! Keyboard event handling.

use crate::app::{edit_record_value, App, AppState, InputMode, MenuItem, Screen};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Handle a key event. Returns true if the app should quit.
pub fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    // Ctrl+C quits from anywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return true;
    }

    match app.screen {
        Screen::Login => handle_login_key(app, key),
        Screen::Register => handle_register_key(app, key),
        Screen::ChangePassword => handle_password_key(app, key),
        Screen::Dashboard => handle_dashboard_key(app, key),
        Screen::Profile => handle_profile_key(app, key),
        Screen::Forms => handle_forms_key(app, key),
        Screen::FormEditor => handle_form_editor_key(app, key),
        Screen::NewEmployee => handle_new_employee_key(app, key),
        Screen::Employees => match app.employees.mode {
            InputMode::Normal => handle_employees_key(app, key),
            InputMode::Search => handle_search_key(app, key),
            InputMode::ConfirmDelete => handle_confirm_key(app, key),
            InputMode::EditRecord => handle_record_edit_key(app, key),
        },
    }

    matches!(app.state, AppState::Quit)
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.code == KeyCode::Char(c) && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// A printable character without Ctrl/Alt.
fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent) {
    if is_ctrl(&key, 'r') {
        app.open_register();
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_login(),
        KeyCode::Tab | KeyCode::Down => app.login.inputs.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.login.inputs.focus_prev(),
        KeyCode::Backspace => app.login_input(None),
        KeyCode::Esc => app.quit(),
        _ => {
            if let Some(c) = typed_char(&key) {
                app.login_input(Some(c));
            }
        }
    }
}

fn handle_register_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_register(),
        KeyCode::Tab | KeyCode::Down => app.register.inputs.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.register.inputs.focus_prev(),
        KeyCode::Backspace => app.register_input(None),
        KeyCode::Esc => app.open_login(),
        _ => {
            if let Some(c) = typed_char(&key) {
                app.register_input(Some(c));
            }
        }
    }
}

fn handle_password_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_password(),
        KeyCode::Tab | KeyCode::Down => app.password.inputs.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.password.inputs.focus_prev(),
        KeyCode::Backspace => app.password_input(None),
        KeyCode::Esc => app.open_dashboard(),
        _ => {
            if let Some(c) = typed_char(&key) {
                app.password_input(Some(c));
            }
        }
    }
}

fn handle_dashboard_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => {
            if app.menu_selected + 1 < MenuItem::ALL.len() {
                app.menu_selected += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.menu_selected = app.menu_selected.saturating_sub(1);
        }
        KeyCode::Enter => {
            if let Some(item) = MenuItem::ALL.get(app.menu_selected) {
                app.open_menu_item(*item);
            }
        }
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            if let Some(item) = MenuItem::ALL.get(index) {
                app.menu_selected = index;
                app.open_menu_item(*item);
            }
        }
        _ => {}
    }
}

fn handle_profile_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.open_profile(),
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc | KeyCode::Char('b') => app.open_dashboard(),
        _ => {}
    }
}

fn handle_forms_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc | KeyCode::Char('b') => app.open_dashboard(),
        KeyCode::Char('j') | KeyCode::Down => {
            if app.forms.selected + 1 < app.forms.forms.len() {
                app.forms.selected += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.forms.selected = app.forms.selected.saturating_sub(1);
        }
        KeyCode::Char('n') => app.open_form_editor(None),
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(form) = app.forms.forms.get(app.forms.selected).cloned() {
                app.open_form_editor(Some(&form));
            }
        }
        KeyCode::Char('r') => app.refresh_forms(),
        _ => {}
    }
}

fn handle_form_editor_key(app: &mut App, key: KeyEvent) {
    let editor = &mut app.form_editor;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if is_ctrl(&key, 's') {
        app.save_form();
        return;
    }
    if is_ctrl(&key, 'n') {
        editor.add_field();
        return;
    }
    if is_ctrl(&key, 'd') {
        editor.remove_field();
        return;
    }
    if is_ctrl(&key, 'k') || (ctrl && key.code == KeyCode::Up) {
        editor.move_field(true);
        return;
    }
    if is_ctrl(&key, 'j') || (ctrl && key.code == KeyCode::Down) {
        editor.move_field(false);
        return;
    }

    match key.code {
        KeyCode::Enter => app.save_form(),
        KeyCode::Esc => app.open_forms(),
        KeyCode::Tab | KeyCode::Down => editor.focus_next(),
        KeyCode::BackTab | KeyCode::Up => editor.focus_prev(),
        KeyCode::Right => editor.cycle_type(true),
        KeyCode::Left => editor.cycle_type(false),
        KeyCode::Backspace => editor.pop_char(),
        _ => {
            if let Some(c) = typed_char(&key) {
                editor.push_char(c);
            }
        }
    }
}

fn handle_new_employee_key(app: &mut App, key: KeyEvent) {
    let screen = &mut app.new_employee;

    // Picking a form
    let Some(editor) = screen.editor.as_mut() else {
        match key.code {
            KeyCode::Esc => app.open_dashboard(),
            KeyCode::Enter => app.pick_form(),
            KeyCode::Down => {
                let count = screen.visible_forms(&app.forms.forms).len();
                if screen.selected + 1 < count {
                    screen.selected += 1;
                }
            }
            KeyCode::Up => screen.selected = screen.selected.saturating_sub(1),
            KeyCode::Backspace => {
                screen.filter.pop();
                screen.selected = 0;
            }
            _ => {
                if let Some(c) = typed_char(&key) {
                    screen.filter.push(c);
                    screen.selected = 0;
                }
            }
        }
        return;
    };

    // Filling in the record
    let count = editor.entries().len();
    if is_ctrl(&key, 's') {
        app.submit_new_employee();
        return;
    }
    match key.code {
        KeyCode::Enter => app.submit_new_employee(),
        KeyCode::Esc => {
            screen.editor = None;
            screen.error = None;
        }
        KeyCode::Tab | KeyCode::Down => {
            if count > 0 {
                screen.focus = (screen.focus + 1) % count;
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if count > 0 {
                screen.focus = (screen.focus + count - 1) % count;
            }
        }
        KeyCode::Backspace => {
            edit_record_value(editor, screen.focus, |value| {
                value.pop();
            });
            screen.error = None;
        }
        _ => {
            if let Some(c) = typed_char(&key) {
                edit_record_value(editor, screen.focus, |value| value.push(c));
                screen.error = None;
                screen.message = None;
            }
        }
    }
}

fn handle_employees_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc | KeyCode::Char('b') => app.open_dashboard(),
        KeyCode::Char('j') | KeyCode::Down => {
            if app.employees.selected + 1 < app.employees.list.records().len() {
                app.employees.selected += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.employees.selected = app.employees.selected.saturating_sub(1);
        }
        KeyCode::Char('h') | KeyCode::Left => app.prev_employee_page(),
        KeyCode::Char('l') | KeyCode::Right => app.next_employee_page(),
        KeyCode::Char('/') => {
            app.employees.search_input = app.employees.list.search().to_string();
            app.employees.mode = InputMode::Search;
        }
        KeyCode::Char('c') => app.clear_employee_search(),
        KeyCode::Char('r') => app.fetch_employees(),
        KeyCode::Char('e') | KeyCode::Enter => app.edit_selected_employee(),
        KeyCode::Char('d') => app.request_delete(),
        _ => {}
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => app.employees.mode = InputMode::Normal,
        KeyCode::Backspace => {
            app.employees.search_input.pop();
            app.search_employees();
        }
        _ => {
            if let Some(c) = typed_char(&key) {
                app.employees.search_input.push(c);
                app.search_employees();
            }
        }
    }
}

fn handle_confirm_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
}

fn handle_record_edit_key(app: &mut App, key: KeyEvent) {
    if is_ctrl(&key, 's') {
        app.submit_employee_edit();
        return;
    }

    let screen = &mut app.employees;
    let Some(editor) = screen.editor.as_mut() else {
        screen.mode = InputMode::Normal;
        return;
    };
    let count = editor.entries().len();

    match key.code {
        KeyCode::Enter => app.submit_employee_edit(),
        KeyCode::Esc => app.close_employee_editor(),
        KeyCode::Tab | KeyCode::Down => {
            if count > 0 {
                screen.editor_focus = (screen.editor_focus + 1) % count;
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if count > 0 {
                screen.editor_focus = (screen.editor_focus + count - 1) % count;
            }
        }
        KeyCode::Backspace => {
            edit_record_value(editor, screen.editor_focus, |value| {
                value.pop();
            });
            screen.editor_error = None;
        }
        _ => {
            if let Some(c) = typed_char(&key) {
                edit_record_value(editor, screen.editor_focus, |value| value.push(c));
                screen.editor_error = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EditorFocus, EMPLOYEE_UPDATED};
    use crate::worker::Outcome;
    use empdesk_core::auth::RegisterField;
    use empdesk_core::models::{
        Credentials, EmployeePayload, EmployeeQuery, FormPayload, PasswordChange, Registration,
        TokenPair,
    };
    use empdesk_core::{
        Api, ClientError, Employee, EmployeeId, FieldType, Form, FormId, MemorySessionStore, Page,
        Profile, Result, Session, SessionStore,
    };
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    /// Answers every call with canned data.
    struct CannedApi {
        employees: Vec<Employee>,
    }

    impl CannedApi {
        fn new(count: u64) -> Self {
            let employees = (1..=count)
                .map(|id| Employee {
                    id,
                    form: 1,
                    data: [("Name".to_string(), format!("Person {id}"))].into_iter().collect(),
                    created_at: None,
                })
                .collect();
            Self { employees }
        }
    }

    impl Api for CannedApi {
        fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
            Ok(TokenPair {
                access: format!("access-{}", credentials.username),
                refresh: "refresh".into(),
            })
        }

        fn register(&self, _registration: &Registration) -> Result<()> {
            Ok(())
        }

        fn change_password(&self, _change: &PasswordChange) -> Result<()> {
            Ok(())
        }

        fn profile(&self) -> Result<Profile> {
            Err(ClientError::Validation("offline".into()))
        }

        fn list_forms(&self) -> Result<Vec<Form>> {
            Ok(Vec::new())
        }

        fn create_form(&self, payload: &FormPayload) -> Result<Form> {
            Ok(Form {
                id: 1,
                name: payload.name.clone(),
                fields: payload.fields.clone(),
            })
        }

        fn update_form(&self, id: FormId, payload: &FormPayload) -> Result<Form> {
            Ok(Form {
                id,
                name: payload.name.clone(),
                fields: payload.fields.clone(),
            })
        }

        fn list_employees(&self, query: &EmployeeQuery) -> Result<Page<Employee>> {
            let start = (query.page as usize - 1) * 10;
            Ok(Page {
                items: self.employees.iter().skip(start).take(10).cloned().collect(),
                total_pages: (self.employees.len() as u32).div_ceil(10).max(1),
            })
        }

        fn create_employee(&self, payload: &EmployeePayload) -> Result<Employee> {
            Ok(Employee {
                id: 100,
                form: payload.form,
                data: payload.data.clone(),
                created_at: None,
            })
        }

        fn update_employee(&self, id: EmployeeId, payload: &EmployeePayload) -> Result<Employee> {
            Ok(Employee {
                id,
                form: payload.form,
                data: payload.data.clone(),
                created_at: None,
            })
        }

        fn delete_employee(&self, _id: EmployeeId) -> Result<()> {
            Ok(())
        }
    }

    fn app_with(api: CannedApi, session: MemorySessionStore) -> App {
        App::new(Arc::new(api), Arc::new(session), Duration::from_millis(20))
    }

    fn signed_in() -> MemorySessionStore {
        MemorySessionStore::with_session(Session {
            access_token: "token".into(),
            refresh_token: "refresh".into(),
        })
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App, c: char) {
        handle_key(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Apply the next finished job.
    fn settle(app: &mut App) {
        let outcome = app
            .worker()
            .recv_timeout(Duration::from_secs(5))
            .expect("job finished");
        app.apply(outcome);
    }

    #[test]
    fn starts_on_login_without_a_session() {
        let app = app_with(CannedApi::new(0), MemorySessionStore::new());
        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.state, AppState::SignedOut);

        let app = app_with(CannedApi::new(0), signed_in());
        assert_eq!(app.screen, Screen::Dashboard);
    }

    #[test]
    fn login_requires_both_fields_and_typing_clears_error() {
        let mut app = app_with(CannedApi::new(0), MemorySessionStore::new());
        type_text(&mut app, "ann");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.login.error.as_deref(), Some("Please fill in both fields"));
        assert!(!app.busy);

        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "x");
        assert_eq!(app.login.error, None);
        assert_eq!(app.login.inputs.value(1), "x");
    }

    #[test]
    fn login_opens_the_dashboard_and_logout_returns() {
        let mut app = app_with(CannedApi::new(0), MemorySessionStore::new());
        type_text(&mut app, "ann");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "secret");
        press(&mut app, KeyCode::Enter);
        assert!(app.busy);

        // Ignored while the first submit is in flight
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert!(!app.busy);
        assert_eq!(app.screen, Screen::Dashboard);
        assert_eq!(app.state, AppState::SignedIn);
        assert!(app.worker().session().is_authenticated());

        press(&mut app, KeyCode::Char('6'));
        assert_eq!(app.screen, Screen::Login);
        assert!(!app.worker().session().is_authenticated());
    }

    #[test]
    fn register_shows_every_error_and_editing_clears_one() {
        let mut app = app_with(CannedApi::new(0), MemorySessionStore::new());
        ctrl(&mut app, 'r');
        assert_eq!(app.screen, Screen::Register);

        press(&mut app, KeyCode::Enter);
        assert!(app.register.errors.contains_key(&RegisterField::Username));
        assert!(app.register.errors.contains_key(&RegisterField::Email));
        assert!(app.register.errors.contains_key(&RegisterField::Password));

        type_text(&mut app, "ann");
        assert!(!app.register.errors.contains_key(&RegisterField::Username));
        assert!(app.register.errors.contains_key(&RegisterField::Email));
    }

    #[test]
    fn form_editor_keys_reorder_and_retype_fields() {
        let mut app = app_with(CannedApi::new(0), signed_in());
        app.open_form_editor(None);
        type_text(&mut app, "Staff");

        ctrl(&mut app, 'n');
        type_text(&mut app, "Name");
        ctrl(&mut app, 'n');
        type_text(&mut app, "Email");
        press(&mut app, KeyCode::Right);
        ctrl(&mut app, 'k');

        let draft = &app.form_editor.draft;
        assert_eq!(draft.name, "Staff");
        let labels: Vec<_> = draft.fields().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, ["Email", "Name"]);
        assert_eq!(draft.fields()[0].field_type, FieldType::Number);
        assert_eq!(app.form_editor.focus, EditorFocus::Field(0));

        ctrl(&mut app, 'd');
        assert_eq!(app.form_editor.draft.fields().len(), 1);
    }

    #[test]
    fn empty_form_is_rejected_without_a_request() {
        let mut app = app_with(CannedApi::new(0), signed_in());
        app.open_form_editor(None);
        ctrl(&mut app, 's');

        assert_eq!(app.form_editor.error.as_deref(), Some("Form name is required"));
        assert!(!app.busy);
    }

    #[test]
    fn pagination_stays_in_range() {
        let mut app = app_with(CannedApi::new(15), signed_in());
        app.open_employees();
        settle(&mut app);
        assert_eq!(app.employees.list.total_pages(), 2);

        press(&mut app, KeyCode::Left);
        assert_eq!(app.employees.list.page(), 1);

        press(&mut app, KeyCode::Right);
        settle(&mut app);
        assert_eq!(app.employees.list.page(), 2);
        assert_eq!(app.employees.list.records().len(), 5);

        press(&mut app, KeyCode::Right);
        assert_eq!(app.employees.list.page(), 2);
    }

    #[test]
    fn searching_resets_to_the_first_page() {
        let mut app = app_with(CannedApi::new(25), signed_in());
        app.open_employees();
        settle(&mut app);
        press(&mut app, KeyCode::Right);
        settle(&mut app);
        press(&mut app, KeyCode::Right);
        settle(&mut app);
        assert_eq!(app.employees.list.page(), 3);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "bob");
        assert_eq!(app.employees.list.page(), 1);
        assert_eq!(app.employees.list.search(), "bob");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.employees.mode, InputMode::Normal);
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut app = app_with(CannedApi::new(3), signed_in());
        app.open_employees();
        settle(&mut app);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.employees.mode, InputMode::ConfirmDelete);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.employees.mode, InputMode::Normal);
        assert!(app.employees.pending_delete.is_none());
        assert!(!app.busy);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.busy);
        settle(&mut app);
        assert!(!app.busy);
        // Deleting triggers a reload of the current page
        assert!(app.employees.loading);
    }

    #[test]
    fn record_edit_overlay_submits_and_closes() {
        let mut app = app_with(CannedApi::new(2), signed_in());
        app.open_employees();
        settle(&mut app);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.employees.mode, InputMode::EditRecord);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "X");
        let editor = app.employees.editor.as_ref().unwrap();
        assert_eq!(editor.value("Name"), Some("Person X"));

        press(&mut app, KeyCode::Enter);
        match app.worker().recv_timeout(Duration::from_secs(5)) {
            Some(outcome @ Outcome::RecordSaved { .. }) => app.apply(outcome),
            _ => panic!("expected a saved record"),
        }
        assert_eq!(app.employees.mode, InputMode::Normal);
        assert_eq!(app.employees.message.as_deref(), Some(EMPLOYEE_UPDATED));
    }

    #[test]
    fn late_form_save_leaves_a_newer_draft_alone() {
        let mut app = app_with(CannedApi::new(0), signed_in());
        app.open_form_editor(None);
        type_text(&mut app, "Staff");
        ctrl(&mut app, 'n');
        type_text(&mut app, "Name");
        ctrl(&mut app, 's');
        assert!(app.busy);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Forms);
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Other");

        // The save and the form list reload
        settle(&mut app);
        settle(&mut app);

        assert!(!app.busy);
        assert_eq!(app.screen, Screen::FormEditor);
        assert_eq!(app.form_editor.draft.name, "Other");
        assert!(app.form_editor.draft.is_new());
        assert_eq!(app.form_editor.message, None);
        assert_eq!(app.form_editor.return_at, None);
    }

    #[test]
    fn late_record_update_leaves_a_reopened_editor_alone() {
        let mut app = app_with(CannedApi::new(2), signed_in());
        app.open_employees();
        settle(&mut app);

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert!(app.busy);
        app.close_employee_editor();
        app.edit_selected_employee();

        match app.worker().recv_timeout(Duration::from_secs(5)) {
            Some(outcome @ Outcome::RecordSaved { .. }) => app.apply(outcome),
            _ => panic!("expected a saved record"),
        }
        assert!(!app.busy);
        assert_eq!(app.employees.mode, InputMode::EditRecord);
        assert!(app.employees.editor.is_some());
        assert_eq!(app.employees.message, None);
    }

    #[test]
    fn password_change_redirects_after_delay() {
        let mut app = app_with(CannedApi::new(0), signed_in());
        app.open_change_password();
        type_text(&mut app, "old");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "newpassword");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(app.password.message.as_deref(), Some("Password changed successfully!"));
        assert_eq!(app.screen, Screen::ChangePassword);

        app.tick(Instant::now() + Duration::from_millis(50));
        assert_eq!(app.screen, Screen::Dashboard);
    }
}
