//! Background request worker.
//!
//! Each job runs the blocking API call on its own thread and reports back
//! through a channel that the main loop drains between frames.

use empdesk_core::auth::{self, FieldErrors, LoginForm, PasswordChangeForm, RegisterForm};
use empdesk_core::{
    Api, DeleteConfirmation, Employee, EmployeeId, FetchTicket, Form, FormDraft, Page, Profile,
    RecordEditor, Result, Session, SessionStore,
};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Work the UI can hand off.
pub enum Job {
    Login(LoginForm),
    Register(RegisterForm),
    ChangePassword(PasswordChangeForm),
    Profile,
    ListForms,
    /// `seq` identifies the editor the draft came from.
    SaveForm { seq: u64, draft: FormDraft },
    SubmitRecord { seq: u64, editor: RecordEditor },
    FetchEmployees(FetchTicket),
    DeleteEmployee(DeleteConfirmation),
}

impl Job {
    /// Short name for logs. Jobs carry passwords, so they are never logged whole.
    pub fn name(&self) -> &'static str {
        match self {
            Job::Login(_) => "login",
            Job::Register(_) => "register",
            Job::ChangePassword(_) => "change-password",
            Job::Profile => "profile",
            Job::ListForms => "list-forms",
            Job::SaveForm { .. } => "save-form",
            Job::SubmitRecord { .. } => "submit-record",
            Job::FetchEmployees(_) => "fetch-employees",
            Job::DeleteEmployee(_) => "delete-employee",
        }
    }
}

/// A finished job.
pub enum Outcome {
    LoggedIn(Result<Session>),
    Registered(std::result::Result<(), FieldErrors>),
    PasswordChanged(Result<()>),
    Profile(Result<Profile>),
    Forms(Result<Vec<Form>>),
    FormSaved {
        seq: u64,
        was_new: bool,
        result: Result<Form>,
    },
    RecordSaved {
        seq: u64,
        editor: RecordEditor,
        result: Result<Employee>,
    },
    Employees {
        seq: u64,
        result: Result<Page<Employee>>,
    },
    Deleted {
        id: EmployeeId,
        result: Result<()>,
    },
}

pub struct Worker {
    api: Arc<dyn Api>,
    session: Arc<dyn SessionStore>,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
}

impl Worker {
    pub fn new(api: Arc<dyn Api>, session: Arc<dyn SessionStore>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            session,
            tx,
            rx,
        }
    }

    pub fn session(&self) -> &dyn SessionStore {
        self.session.as_ref()
    }

    /// Run `job` on a background thread.
    pub fn spawn(&self, job: Job) {
        let api = self.api.clone();
        let session = self.session.clone();
        let tx = self.tx.clone();

        tracing::debug!("Spawning job: {}", job.name());
        std::thread::spawn(move || {
            let outcome = run(job, api.as_ref(), session.as_ref());
            // The receiver only goes away when the app is shutting down
            let _ = tx.send(outcome);
        });
    }

    /// Next finished job, if any.
    pub fn try_recv(&self) -> Option<Outcome> {
        self.rx.try_recv().ok()
    }

    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Outcome> {
        self.rx.recv_timeout(timeout).ok()
    }
}

fn run(job: Job, api: &dyn Api, session: &dyn SessionStore) -> Outcome {
    match job {
        Job::Login(form) => Outcome::LoggedIn(auth::login(api, session, &form)),
        Job::Register(form) => Outcome::Registered(auth::register(api, &form)),
        Job::ChangePassword(form) => Outcome::PasswordChanged(auth::change_password(api, &form)),
        Job::Profile => Outcome::Profile(api.profile()),
        Job::ListForms => Outcome::Forms(api.list_forms()),
        Job::SaveForm { seq, draft } => Outcome::FormSaved {
            seq,
            was_new: draft.is_new(),
            result: draft.save(api),
        },
        Job::SubmitRecord { seq, editor } => {
            let result = editor.submit(api);
            Outcome::RecordSaved {
                seq,
                editor,
                result,
            }
        }
        Job::FetchEmployees(ticket) => Outcome::Employees {
            seq: ticket.seq,
            result: api.list_employees(&ticket.query),
        },
        Job::DeleteEmployee(confirmation) => Outcome::Deleted {
            id: confirmation.id(),
            result: api.delete_employee(confirmation.id()),
        },
    }
}
