//! Application state management.

use crate::worker::{Job, Outcome, Worker};
use empdesk_core::auth::{self, FieldErrors, LoginForm, PasswordChangeForm, RegisterField, RegisterForm};
use empdesk_core::listing::{self, EmployeeList, FetchOutcome};
use empdesk_core::schema::{self, FieldRef, FieldUpdate, FormDraft};
use empdesk_core::{
    Api, DeleteConfirmation, EditorMode, Employee, Form, Profile, RecordEditor, Result,
    SessionStore,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const FORM_CREATED: &str = "Form created successfully!";
pub const FORM_UPDATED: &str = "Form updated successfully!";
pub const EMPLOYEE_CREATED: &str = "Employee created successfully!";
pub const EMPLOYEE_UPDATED: &str = "Employee updated successfully!";
pub const EMPLOYEE_DELETED: &str = "Employee deleted";
const PROFILE_FAILED: &str = "Failed to load profile";
const FORMS_FAILED: &str = "Failed to load forms";

/// Application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// No access token; only login and registration are reachable.
    SignedOut,
    SignedIn,
    /// Application should quit.
    Quit,
}

/// The screen being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Dashboard,
    Profile,
    ChangePassword,
    Forms,
    FormEditor,
    NewEmployee,
    Employees,
}

/// Input mode of the employee list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal navigation mode.
    #[default]
    Normal,
    /// Typing a search term.
    Search,
    /// Waiting for a yes/no on a delete.
    ConfirmDelete,
    /// Record editor overlay is open.
    EditRecord,
}

/// Dashboard entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    FormBuilder,
    NewEmployee,
    Employees,
    Profile,
    ChangePassword,
    Logout,
}

impl MenuItem {
    pub const ALL: [MenuItem; 6] = [
        MenuItem::FormBuilder,
        MenuItem::NewEmployee,
        MenuItem::Employees,
        MenuItem::Profile,
        MenuItem::ChangePassword,
        MenuItem::Logout,
    ];

    pub fn title(self) -> &'static str {
        match self {
            MenuItem::FormBuilder => "Form builder",
            MenuItem::NewEmployee => "New employee",
            MenuItem::Employees => "Employee records",
            MenuItem::Profile => "My profile",
            MenuItem::ChangePassword => "Change password",
            MenuItem::Logout => "Logout",
        }
    }
}

/// A single-line text input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInput {
    pub label: String,
    pub value: String,
    /// Rendered as asterisks.
    pub secret: bool,
}

impl TextInput {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn secret(label: impl Into<String>) -> Self {
        Self {
            secret: true,
            ..Self::new(label)
        }
    }

    /// Text to draw for the current value.
    pub fn display(&self) -> String {
        if self.secret {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// Inputs stacked on one screen, one of them focused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputGroup {
    pub inputs: Vec<TextInput>,
    pub focus: usize,
}

impl InputGroup {
    pub fn new(inputs: Vec<TextInput>) -> Self {
        Self { inputs, focus: 0 }
    }

    pub fn value(&self, index: usize) -> &str {
        self.inputs.get(index).map_or("", |i| i.value.as_str())
    }

    pub fn focus_next(&mut self) {
        if !self.inputs.is_empty() {
            self.focus = (self.focus + 1) % self.inputs.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.inputs.is_empty() {
            self.focus = (self.focus + self.inputs.len() - 1) % self.inputs.len();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(input) = self.inputs.get_mut(self.focus) {
            input.value.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(input) = self.inputs.get_mut(self.focus) {
            input.value.pop();
        }
    }

    pub fn clear(&mut self) {
        for input in &mut self.inputs {
            input.value.clear();
        }
        self.focus = 0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginScreen {
    pub inputs: InputGroup,
    pub error: Option<String>,
    /// Shown after a successful registration.
    pub notice: Option<String>,
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self {
            inputs: InputGroup::new(vec![TextInput::new("Username"), TextInput::secret("Password")]),
            error: None,
            notice: None,
        }
    }
}

impl LoginScreen {
    pub fn form(&self) -> LoginForm {
        LoginForm {
            username: self.inputs.value(0).to_string(),
            password: self.inputs.value(1).to_string(),
        }
    }
}

/// Registration inputs, in display order.
pub const REGISTER_FIELDS: [RegisterField; 4] = [
    RegisterField::Username,
    RegisterField::Email,
    RegisterField::Password,
    RegisterField::ConfirmPassword,
];

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterScreen {
    pub inputs: InputGroup,
    pub errors: FieldErrors,
}

impl Default for RegisterScreen {
    fn default() -> Self {
        Self {
            inputs: InputGroup::new(vec![
                TextInput::new("Username"),
                TextInput::new("Email"),
                TextInput::secret("Password"),
                TextInput::secret("Confirm password"),
            ]),
            errors: FieldErrors::new(),
        }
    }
}

impl RegisterScreen {
    pub fn form(&self) -> RegisterForm {
        RegisterForm {
            username: self.inputs.value(0).to_string(),
            email: self.inputs.value(1).to_string(),
            password: self.inputs.value(2).to_string(),
            confirm_password: self.inputs.value(3).to_string(),
        }
    }

    /// Drop the error of the focused input.
    fn clear_focused_error(&mut self) {
        if let Some(field) = REGISTER_FIELDS.get(self.inputs.focus) {
            self.errors.remove(field);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PasswordScreen {
    pub inputs: InputGroup,
    pub error: Option<String>,
    pub message: Option<String>,
    /// When to go back to the dashboard after a successful change.
    pub redirect_at: Option<Instant>,
}

impl Default for PasswordScreen {
    fn default() -> Self {
        Self {
            inputs: InputGroup::new(vec![
                TextInput::secret("Old password"),
                TextInput::secret("New password"),
            ]),
            error: None,
            message: None,
            redirect_at: None,
        }
    }
}

impl PasswordScreen {
    pub fn form(&self) -> PasswordChangeForm {
        PasswordChangeForm {
            old_password: self.inputs.value(0).to_string(),
            new_password: self.inputs.value(1).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileScreen {
    pub profile: Option<Profile>,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormsScreen {
    pub forms: Vec<Form>,
    pub selected: usize,
    pub error: Option<String>,
    pub loading: bool,
}

/// Focused part of the form editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFocus {
    Name,
    /// Row index in the draft.
    Field(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormEditorScreen {
    pub draft: FormDraft,
    pub focus: EditorFocus,
    pub error: Option<String>,
    pub message: Option<String>,
    /// When to go back to the form list after a save.
    pub return_at: Option<Instant>,
    /// Identifies this editor to save results.
    pub seq: u64,
}

impl Default for FormEditorScreen {
    fn default() -> Self {
        Self::new(FormDraft::new())
    }
}

impl FormEditorScreen {
    pub fn new(draft: FormDraft) -> Self {
        Self {
            draft,
            focus: EditorFocus::Name,
            error: None,
            message: None,
            return_at: None,
            seq: 0,
        }
    }

    fn focused_key(&self) -> Option<FieldRef> {
        match self.focus {
            EditorFocus::Name => None,
            EditorFocus::Field(index) => self.draft.fields().get(index).map(|f| f.key),
        }
    }

    pub fn focus_next(&mut self) {
        let count = self.draft.fields().len();
        self.focus = match self.focus {
            EditorFocus::Name if count > 0 => EditorFocus::Field(0),
            EditorFocus::Field(index) if index + 1 < count => EditorFocus::Field(index + 1),
            _ => EditorFocus::Name,
        };
    }

    pub fn focus_prev(&mut self) {
        let count = self.draft.fields().len();
        self.focus = match self.focus {
            EditorFocus::Name if count > 0 => EditorFocus::Field(count - 1),
            EditorFocus::Field(index) if index > 0 => EditorFocus::Field(index - 1),
            _ => EditorFocus::Name,
        };
    }

    pub fn push_char(&mut self, c: char) {
        self.edit_text(|text| text.push(c));
    }

    pub fn pop_char(&mut self) {
        self.edit_text(|text| {
            text.pop();
        });
    }

    fn edit_text(&mut self, edit: impl FnOnce(&mut String)) {
        self.error = None;
        match self.focused_key() {
            None => edit(&mut self.draft.name),
            Some(key) => {
                let Some(field) = self.draft.fields().iter().find(|f| f.key == key) else {
                    return;
                };
                let mut label = field.label.clone();
                edit(&mut label);
                self.draft.update_field(key, FieldUpdate::Label(label));
            }
        }
    }

    pub fn add_field(&mut self) {
        let key = self.draft.add_field();
        if let Some(index) = self.draft.position(key) {
            self.focus = EditorFocus::Field(index);
        }
    }

    pub fn remove_field(&mut self) {
        let Some(key) = self.focused_key() else {
            return;
        };
        self.draft.remove_field(key);

        let count = self.draft.fields().len();
        if let EditorFocus::Field(index) = self.focus {
            self.focus = if count == 0 {
                EditorFocus::Name
            } else {
                EditorFocus::Field(index.min(count - 1))
            };
        }
    }

    /// Step the focused field's type forwards or backwards.
    pub fn cycle_type(&mut self, forward: bool) {
        let Some(key) = self.focused_key() else {
            return;
        };
        let Some(field) = self.draft.fields().iter().find(|f| f.key == key) else {
            return;
        };
        let field_type = if forward {
            field.field_type.next()
        } else {
            field.field_type.prev()
        };
        self.draft.update_field(key, FieldUpdate::FieldType(field_type));
    }

    /// Move the focused row one place up or down, keeping it focused.
    pub fn move_field(&mut self, up: bool) {
        let EditorFocus::Field(index) = self.focus else {
            return;
        };
        let target = if up {
            match index.checked_sub(1) {
                Some(target) => target,
                None => return,
            }
        } else {
            index + 1
        };
        if self.draft.reorder(index, target) {
            self.focus = EditorFocus::Field(target);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEmployeeScreen {
    /// Fuzzy filter over form names.
    pub filter: String,
    pub selected: usize,
    /// Set once a form has been picked.
    pub editor: Option<RecordEditor>,
    pub editor_seq: u64,
    pub focus: usize,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl NewEmployeeScreen {
    /// Forms matching the filter, best match first.
    pub fn visible_forms<'a>(&self, forms: &'a [Form]) -> Vec<&'a Form> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let filter = self.filter.trim();
        if filter.is_empty() {
            return forms.iter().collect();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, &Form)> = forms
            .iter()
            .filter_map(|form| matcher.fuzzy_match(&form.name, filter).map(|score| (score, form)))
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, form)| form).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeesScreen {
    pub list: EmployeeList,
    pub selected: usize,
    pub mode: InputMode,
    /// Search term as typed.
    pub search_input: String,
    pub editor: Option<RecordEditor>,
    pub editor_seq: u64,
    pub editor_focus: usize,
    pub editor_error: Option<String>,
    pub pending_delete: Option<DeleteConfirmation>,
    pub loading: bool,
    pub message: Option<String>,
}

/// Apply `edit` to the value under `focus` in a record editor.
pub fn edit_record_value(editor: &mut RecordEditor, focus: usize, edit: impl FnOnce(&mut String)) {
    let Some((key, value)) = editor.entries().get(focus) else {
        return;
    };
    let key = key.clone();
    let mut value = value.clone();
    edit(&mut value);
    editor.set_value(&key, value);
}

/// Main application model.
pub struct App {
    /// Current application state.
    pub state: AppState,
    pub screen: Screen,
    /// A submit is in flight; further submits are ignored.
    pub busy: bool,
    /// Selected dashboard entry.
    pub menu_selected: usize,
    /// Delay before a success message moves on.
    pub redirect_delay: Duration,

    pub login: LoginScreen,
    pub register: RegisterScreen,
    pub password: PasswordScreen,
    pub profile: ProfileScreen,
    pub forms: FormsScreen,
    pub form_editor: FormEditorScreen,
    pub new_employee: NewEmployeeScreen,
    pub employees: EmployeesScreen,

    /// Last identity handed to an opened editor.
    editor_seq: u64,
    worker: Worker,
}

impl App {
    /// Create a new application instance.
    ///
    /// Opens the dashboard when a session is already stored.
    pub fn new(api: Arc<dyn Api>, session: Arc<dyn SessionStore>, redirect_delay: Duration) -> Self {
        let signed_in = session.is_authenticated();
        Self {
            state: if signed_in {
                AppState::SignedIn
            } else {
                AppState::SignedOut
            },
            screen: if signed_in {
                Screen::Dashboard
            } else {
                Screen::Login
            },
            busy: false,
            menu_selected: 0,
            redirect_delay,
            login: LoginScreen::default(),
            register: RegisterScreen::default(),
            password: PasswordScreen::default(),
            profile: ProfileScreen::default(),
            forms: FormsScreen::default(),
            form_editor: FormEditorScreen::default(),
            new_employee: NewEmployeeScreen::default(),
            employees: EmployeesScreen::default(),
            editor_seq: 0,
            worker: Worker::new(api, session),
        }
    }

    pub fn quit(&mut self) {
        self.state = AppState::Quit;
    }

    #[cfg(test)]
    pub fn worker(&self) -> &Worker {
        &self.worker
    }

    fn next_editor_seq(&mut self) -> u64 {
        self.editor_seq += 1;
        self.editor_seq
    }

    // Navigation

    pub fn open_login(&mut self) {
        self.screen = Screen::Login;
    }

    pub fn open_register(&mut self) {
        self.register = RegisterScreen::default();
        self.screen = Screen::Register;
    }

    pub fn open_dashboard(&mut self) {
        self.screen = Screen::Dashboard;
    }

    pub fn open_menu_item(&mut self, item: MenuItem) {
        match item {
            MenuItem::FormBuilder => self.open_forms(),
            MenuItem::NewEmployee => self.open_new_employee(),
            MenuItem::Employees => self.open_employees(),
            MenuItem::Profile => self.open_profile(),
            MenuItem::ChangePassword => self.open_change_password(),
            MenuItem::Logout => self.logout(),
        }
    }

    pub fn open_profile(&mut self) {
        self.screen = Screen::Profile;
        self.profile.error = None;
        self.profile.loading = true;
        self.worker.spawn(Job::Profile);
    }

    pub fn open_change_password(&mut self) {
        self.password = PasswordScreen::default();
        self.screen = Screen::ChangePassword;
    }

    pub fn open_forms(&mut self) {
        // The builder is closed; late save results no longer belong to it
        self.form_editor.seq = 0;
        self.screen = Screen::Forms;
        self.refresh_forms();
    }

    pub fn refresh_forms(&mut self) {
        self.forms.error = None;
        self.forms.loading = true;
        self.worker.spawn(Job::ListForms);
    }

    /// Open the builder for a new form, or for a copy of `form`.
    pub fn open_form_editor(&mut self, form: Option<&Form>) {
        let draft = match form {
            Some(form) => FormDraft::edit(form),
            None => FormDraft::new(),
        };
        self.form_editor = FormEditorScreen::new(draft);
        self.form_editor.seq = self.next_editor_seq();
        self.screen = Screen::FormEditor;
    }

    pub fn open_new_employee(&mut self) {
        self.new_employee = NewEmployeeScreen::default();
        self.screen = Screen::NewEmployee;
        self.refresh_forms();
    }

    pub fn open_employees(&mut self) {
        self.screen = Screen::Employees;
        self.employees.mode = InputMode::Normal;
        self.employees.message = None;
        self.fetch_employees();
    }

    /// Forget the session and go back to the login screen.
    pub fn logout(&mut self) {
        if let Err(e) = auth::logout(self.worker.session()) {
            tracing::warn!("Failed to clear session: {:#}", e);
        }

        self.state = AppState::SignedOut;
        self.busy = false;
        self.menu_selected = 0;
        self.login = LoginScreen::default();
        self.password = PasswordScreen::default();
        self.profile = ProfileScreen::default();
        self.forms = FormsScreen::default();
        self.form_editor = FormEditorScreen::default();
        self.new_employee = NewEmployeeScreen::default();
        self.employees = EmployeesScreen::default();
        self.screen = Screen::Login;
    }

    // Text input

    pub fn login_input(&mut self, c: Option<char>) {
        match c {
            Some(c) => self.login.inputs.push_char(c),
            None => self.login.inputs.pop_char(),
        }
        self.login.error = None;
    }

    pub fn register_input(&mut self, c: Option<char>) {
        match c {
            Some(c) => self.register.inputs.push_char(c),
            None => self.register.inputs.pop_char(),
        }
        self.register.clear_focused_error();
    }

    pub fn password_input(&mut self, c: Option<char>) {
        match c {
            Some(c) => self.password.inputs.push_char(c),
            None => self.password.inputs.pop_char(),
        }
        self.password.error = None;
    }

    // Submissions

    pub fn submit_login(&mut self) {
        if self.busy {
            return;
        }
        let form = self.login.form();
        if let Err(e) = form.validate() {
            self.login.error = Some(auth::login_error_message(&e));
            return;
        }

        self.login.error = None;
        self.login.notice = None;
        self.busy = true;
        self.worker.spawn(Job::Login(form));
    }

    pub fn submit_register(&mut self) {
        if self.busy {
            return;
        }
        let form = self.register.form();
        let errors = form.validate();
        if !errors.is_empty() {
            self.register.errors = errors;
            return;
        }

        self.register.errors.clear();
        self.busy = true;
        self.worker.spawn(Job::Register(form));
    }

    pub fn submit_password(&mut self) {
        if self.busy || self.password.redirect_at.is_some() {
            return;
        }
        let form = self.password.form();
        if let Err(e) = form.validate() {
            self.password.error = Some(auth::change_password_error_message(&e));
            return;
        }

        self.password.error = None;
        self.password.message = None;
        self.busy = true;
        self.worker.spawn(Job::ChangePassword(form));
    }

    pub fn save_form(&mut self) {
        if self.busy || self.form_editor.return_at.is_some() {
            return;
        }
        if let Err(e) = self.form_editor.draft.payload() {
            self.form_editor.error = Some(schema::save_error_message(&e));
            return;
        }

        self.form_editor.error = None;
        self.busy = true;
        self.worker.spawn(Job::SaveForm {
            seq: self.form_editor.seq,
            draft: self.form_editor.draft.clone(),
        });
    }

    /// Start a blank record for the highlighted form.
    pub fn pick_form(&mut self) {
        let picked = self
            .new_employee
            .visible_forms(&self.forms.forms)
            .get(self.new_employee.selected)
            .map(|form| RecordEditor::for_form(form));

        if let Some(editor) = picked {
            self.new_employee.editor = Some(editor);
            self.new_employee.editor_seq = self.next_editor_seq();
            self.new_employee.focus = 0;
            self.new_employee.error = None;
            self.new_employee.message = None;
        }
    }

    pub fn submit_new_employee(&mut self) {
        if self.busy {
            return;
        }
        let Some(editor) = &self.new_employee.editor else {
            return;
        };
        if let Err(e) = editor.check() {
            self.new_employee.error = Some(editor.error_message(&e));
            return;
        }

        let editor = editor.clone();
        self.new_employee.error = None;
        self.new_employee.message = None;
        self.busy = true;
        self.worker.spawn(Job::SubmitRecord {
            seq: self.new_employee.editor_seq,
            editor,
        });
    }

    // Employee list

    /// Fetch the current page; responses to older fetches are dropped.
    pub fn fetch_employees(&mut self) {
        let ticket = self.employees.list.begin_fetch();
        self.employees.loading = true;
        self.worker.spawn(Job::FetchEmployees(ticket));
    }

    /// Apply a new search term and go back to page 1.
    pub fn search_employees(&mut self) {
        let term = self.employees.search_input.clone();
        self.employees.list.set_search(term);
        self.employees.selected = 0;
        self.fetch_employees();
    }

    pub fn clear_employee_search(&mut self) {
        self.employees.search_input.clear();
        self.employees.list.clear_search();
        self.employees.selected = 0;
        self.fetch_employees();
    }

    pub fn prev_employee_page(&mut self) {
        if self.employees.list.prev_page() {
            self.employees.selected = 0;
            self.fetch_employees();
        }
    }

    pub fn next_employee_page(&mut self) {
        if self.employees.list.next_page() {
            self.employees.selected = 0;
            self.fetch_employees();
        }
    }

    pub fn edit_selected_employee(&mut self) {
        let Some(record) = self.employees.list.records().get(self.employees.selected) else {
            return;
        };
        self.employees.editor = Some(RecordEditor::for_record(record));
        self.employees.editor_seq = self.next_editor_seq();
        self.employees.editor_focus = 0;
        self.employees.editor_error = None;
        self.employees.mode = InputMode::EditRecord;
    }

    pub fn close_employee_editor(&mut self) {
        self.employees.editor = None;
        self.employees.editor_seq = 0;
        self.employees.editor_error = None;
        self.employees.mode = InputMode::Normal;
    }

    pub fn submit_employee_edit(&mut self) {
        if self.busy {
            return;
        }
        let Some(editor) = self.employees.editor.clone() else {
            return;
        };
        self.employees.editor_error = None;
        self.busy = true;
        self.worker.spawn(Job::SubmitRecord {
            seq: self.employees.editor_seq,
            editor,
        });
    }

    /// First step of a delete: ask the user.
    pub fn request_delete(&mut self) {
        let Some(record) = self.employees.list.records().get(self.employees.selected) else {
            return;
        };
        self.employees.pending_delete = Some(self.employees.list.request_delete(record.id));
        self.employees.mode = InputMode::ConfirmDelete;
    }

    pub fn confirm_delete(&mut self) {
        if self.busy {
            return;
        }
        self.employees.mode = InputMode::Normal;
        if let Some(confirmation) = self.employees.pending_delete.take() {
            self.busy = true;
            self.worker.spawn(Job::DeleteEmployee(confirmation));
        }
    }

    pub fn cancel_delete(&mut self) {
        self.employees.pending_delete = None;
        self.employees.mode = InputMode::Normal;
    }

    // Background results

    /// Apply every finished job.
    pub fn poll_worker(&mut self) {
        while let Some(outcome) = self.worker.try_recv() {
            self.apply(outcome);
        }
    }

    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::LoggedIn(result) => {
                self.busy = false;
                match result {
                    Ok(_) => {
                        self.login = LoginScreen::default();
                        self.state = AppState::SignedIn;
                        self.menu_selected = 0;
                        self.open_dashboard();
                    }
                    Err(e) => {
                        tracing::warn!("Login failed: {}", e);
                        self.login.error = Some(auth::login_error_message(&e));
                    }
                }
            }
            Outcome::Registered(result) => {
                self.busy = false;
                match result {
                    Ok(()) => {
                        self.register = RegisterScreen::default();
                        self.login.notice = Some(auth::REGISTERED.to_string());
                        self.open_login();
                    }
                    Err(errors) => self.register.errors = errors,
                }
            }
            Outcome::PasswordChanged(result) => {
                self.busy = false;
                match result {
                    Ok(()) => {
                        self.password.inputs.clear();
                        self.password.message = Some(auth::PASSWORD_CHANGED.to_string());
                        self.password.redirect_at = Some(Instant::now() + self.redirect_delay);
                    }
                    Err(e) => {
                        tracing::warn!("Password change failed: {}", e);
                        self.password.error = Some(auth::change_password_error_message(&e));
                    }
                }
            }
            Outcome::Profile(result) => {
                self.profile.loading = false;
                match result {
                    Ok(profile) => {
                        self.profile.profile = Some(profile);
                        self.profile.error = None;
                    }
                    Err(e) => {
                        tracing::warn!("Loading profile failed: {}", e);
                        self.profile.error = Some(PROFILE_FAILED.to_string());
                    }
                }
            }
            Outcome::Forms(result) => {
                self.forms.loading = false;
                match result {
                    Ok(forms) => {
                        self.forms.forms = forms;
                        self.forms.error = None;
                        self.forms.selected =
                            self.forms.selected.min(self.forms.forms.len().saturating_sub(1));
                    }
                    Err(e) => {
                        tracing::warn!("Loading forms failed: {}", e);
                        self.forms.error = Some(e.user_message(&[], FORMS_FAILED));
                    }
                }
            }
            Outcome::FormSaved {
                seq,
                was_new,
                result,
            } => {
                self.busy = false;
                if seq != self.form_editor.seq {
                    tracing::debug!("Form editor {} closed before its save finished", seq);
                    if result.is_ok() && self.screen == Screen::Forms {
                        self.refresh_forms();
                    }
                    return;
                }
                match result {
                    Ok(form) => {
                        tracing::info!("Saved form {} ({})", form.id, form.name);
                        let message = if was_new { FORM_CREATED } else { FORM_UPDATED };
                        self.form_editor.draft = FormDraft::edit(&form);
                        self.form_editor.message = Some(message.to_string());
                        self.form_editor.return_at = Some(Instant::now() + self.redirect_delay);
                    }
                    Err(e) => {
                        tracing::warn!("Saving form failed: {}", e);
                        self.form_editor.error = Some(schema::save_error_message(&e));
                    }
                }
            }
            Outcome::RecordSaved {
                seq,
                editor,
                result,
            } => {
                self.busy = false;
                self.apply_record_saved(seq, editor, result);
            }
            Outcome::Employees { seq, result } => {
                let outcome = self.employees.list.apply(seq, result);
                match outcome {
                    FetchOutcome::Stale => {}
                    FetchOutcome::Clamped => self.fetch_employees(),
                    FetchOutcome::Applied | FetchOutcome::Failed => {
                        self.employees.loading = false;
                        let count = self.employees.list.records().len();
                        self.employees.selected =
                            self.employees.selected.min(count.saturating_sub(1));
                    }
                }
            }
            Outcome::Deleted { id, result } => {
                self.busy = false;
                match result {
                    Ok(()) => {
                        tracing::info!("Deleted employee {}", id);
                        self.employees.message = Some(EMPLOYEE_DELETED.to_string());
                        self.fetch_employees();
                    }
                    Err(e) => {
                        tracing::warn!("Deleting employee {} failed: {}", id, e);
                        self.employees.list.set_error(listing::delete_error_message(&e));
                    }
                }
            }
        }
    }

    fn apply_record_saved(&mut self, seq: u64, editor: RecordEditor, result: Result<Employee>) {
        let current = if editor.is_new() {
            self.new_employee.editor_seq
        } else {
            self.employees.editor_seq
        };
        if seq != current {
            tracing::debug!("Record editor {} closed before its submit finished", seq);
            if result.is_ok() && self.screen == Screen::Employees {
                self.fetch_employees();
            }
            return;
        }

        match (editor.mode(), result) {
            (EditorMode::Create { form }, Ok(_)) => {
                self.new_employee.editor = Some(RecordEditor::for_form(form));
                self.new_employee.focus = 0;
                self.new_employee.message = Some(EMPLOYEE_CREATED.to_string());
            }
            (EditorMode::Create { .. }, Err(e)) => {
                tracing::warn!("Creating employee failed: {}", e);
                self.new_employee.error = Some(editor.error_message(&e));
            }
            (EditorMode::Update { .. }, Ok(_)) => {
                self.close_employee_editor();
                self.employees.message = Some(EMPLOYEE_UPDATED.to_string());
                self.fetch_employees();
            }
            (EditorMode::Update { .. }, Err(e)) => {
                tracing::warn!("Updating employee failed: {}", e);
                self.employees.editor_error = Some(editor.error_message(&e));
            }
        }
    }

    /// Fire any redirect whose delay has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.password.redirect_at.is_some_and(|at| now >= at) {
            self.password.redirect_at = None;
            if self.screen == Screen::ChangePassword {
                self.open_dashboard();
            }
        }

        if self.form_editor.return_at.is_some_and(|at| now >= at) {
            self.form_editor.return_at = None;
            if self.screen == Screen::FormEditor {
                self.open_forms();
            }
        }
    }
}
