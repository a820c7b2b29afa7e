//! Core models, REST client and editing state for empdesk.
//!
//! This crate holds everything the front end needs that is not drawing:
//! the API client and its session, the form builder draft, the record
//! editor and the employee list state.

pub mod api;
pub mod auth;
pub mod error;
pub mod listing;
pub mod models;
pub mod page;
pub mod record;
pub mod schema;
pub mod session;

pub use api::{Api, ApiClient};
pub use error::{ClientError, ErrorBody, Result};
pub use listing::{DeleteConfirmation, EmployeeList, FetchOutcome, FetchTicket};
pub use models::{
    Employee, EmployeeId, EmployeePayload, EmployeeQuery, Field, FieldId, FieldType, Form, FormId,
    FormPayload, Profile, RecordData,
};
pub use page::Page;
pub use record::{EditorMode, RecordEditor};
pub use schema::{DraftField, FieldRef, FieldUpdate, FormDraft};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
