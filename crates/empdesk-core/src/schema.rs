//! Form schema drafts.
//!
//! A [`FormDraft`] owns the in-progress edit of a form: name, field rows in
//! display order, and the local references used to address rows regardless
//! of whether they were already persisted. Nothing reaches the server until
//! [`FormDraft::save`].

use std::fmt;

use crate::api::Api;
use crate::error::{ClientError, Result};
use crate::models::{Field, FieldId, FieldType, Form, FormId, FormPayload};

/// Stable handle of a draft row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRef {
    /// A field that already exists on the server.
    Persisted(FieldId),
    /// A field added in this draft.
    Local(u64),
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Persisted(id) => write!(f, "field-{id}"),
            FieldRef::Local(n) => write!(f, "new-{n}"),
        }
    }
}

/// One row of the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftField {
    pub key: FieldRef,
    pub label: String,
    pub field_type: FieldType,
}

impl DraftField {
    /// Server id, for rows that were loaded from a saved form.
    pub fn id(&self) -> Option<FieldId> {
        match self.key {
            FieldRef::Persisted(id) => Some(id),
            FieldRef::Local(_) => None,
        }
    }
}

/// Attribute change applied by [`FormDraft::update_field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Label(String),
    FieldType(FieldType),
}

/// Unsaved edit state of a form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormDraft {
    id: Option<FormId>,
    pub name: String,
    fields: Vec<DraftField>,
    next_local: u64,
}

impl FormDraft {
    /// An empty draft for a form that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A draft copying `form`, rows ordered by their stored `order`.
    pub fn edit(form: &Form) -> Self {
        let mut draft = Self {
            id: Some(form.id),
            name: form.name.clone(),
            fields: Vec::with_capacity(form.fields.len()),
            next_local: 0,
        };

        for field in form.ordered_fields() {
            let key = match field.id {
                Some(id) => FieldRef::Persisted(id),
                None => draft.local_ref(),
            };
            draft.fields.push(DraftField {
                key,
                label: field.label.clone(),
                field_type: field.field_type,
            });
        }

        draft
    }

    fn local_ref(&mut self) -> FieldRef {
        self.next_local += 1;
        FieldRef::Local(self.next_local)
    }

    /// Id of the form being edited, `None` for a new form.
    pub fn id(&self) -> Option<FormId> {
        self.id
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Rows in display order.
    pub fn fields(&self) -> &[DraftField] {
        &self.fields
    }

    /// Position of a row.
    pub fn position(&self, key: FieldRef) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    /// Append an empty text field and return its handle.
    pub fn add_field(&mut self) -> FieldRef {
        let key = self.local_ref();
        self.fields.push(DraftField {
            key,
            label: String::new(),
            field_type: FieldType::Text,
        });
        key
    }

    /// Change one attribute of a row. Returns false if the row is unknown.
    pub fn update_field(&mut self, key: FieldRef, update: FieldUpdate) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| f.key == key) else {
            return false;
        };
        match update {
            FieldUpdate::Label(label) => field.label = label,
            FieldUpdate::FieldType(field_type) => field.field_type = field_type,
        }
        true
    }

    /// Delete a row. Returns false if the row is unknown.
    pub fn remove_field(&mut self, key: FieldRef) -> bool {
        match self.position(key) {
            Some(index) => {
                self.fields.remove(index);
                true
            }
            None => false,
        }
    }

    /// Move the row at `from` to `to`, keeping every other row's relative
    /// order. Out-of-range indices leave the draft untouched.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.fields.len();
        if from >= len || to >= len {
            return false;
        }
        if from < to {
            self.fields[from..=to].rotate_left(1);
        } else if to < from {
            self.fields[to..=from].rotate_right(1);
        }
        true
    }

    /// Drop `active` where `over` currently is.
    pub fn move_field(&mut self, active: FieldRef, over: FieldRef) -> bool {
        match (self.position(active), self.position(over)) {
            (Some(from), Some(to)) => self.reorder(from, to),
            _ => false,
        }
    }

    /// Check the draft and build the request body.
    ///
    /// Orders are assigned 1..N following the current row order and labels
    /// are trimmed.
    pub fn payload(&self) -> Result<FormPayload> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("Form name is required".into()));
        }
        if self.fields.is_empty() {
            return Err(ClientError::Validation("Add at least one field".into()));
        }

        let fields = self
            .fields
            .iter()
            .zip(1..)
            .map(|(field, order)| Field {
                id: field.id(),
                label: field.label.trim().to_string(),
                field_type: field.field_type,
                order,
            })
            .collect();

        Ok(FormPayload {
            name: name.to_string(),
            fields,
        })
    }

    /// Create or fully replace the form on the server.
    pub fn save(&self, api: &dyn Api) -> Result<Form> {
        let payload = self.payload()?;
        let form = match self.id {
            Some(id) => {
                tracing::info!("Updating form {} ({} fields)", id, payload.fields.len());
                api.update_form(id, &payload)?
            }
            None => {
                tracing::info!("Creating form {:?} ({} fields)", payload.name, payload.fields.len());
                api.create_form(&payload)?
            }
        };
        Ok(form)
    }
}

/// Message shown when saving a draft fails.
pub fn save_error_message(err: &ClientError) -> String {
    err.user_message(&["name", "fields"], "Failed to save form")
}
