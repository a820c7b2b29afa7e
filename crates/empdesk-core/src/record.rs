//! Employee record editing.

use crate::api::Api;
use crate::error::{ClientError, Result};
use crate::models::{Employee, EmployeeId, EmployeePayload, FieldType, Form, FormId, RecordData};

/// What the editor will do on submit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorMode {
    /// A new record against a known form; every field is required.
    Create { form: Form },
    /// An existing record; its keys are edited verbatim.
    Update { record_id: EmployeeId, form_id: FormId },
}

/// Editable key/value state of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEditor {
    mode: EditorMode,
    entries: Vec<(String, String)>,
}

impl RecordEditor {
    /// Edit `existing` if given, otherwise start a blank record for `form`.
    pub fn open(form: &Form, existing: Option<&Employee>) -> Self {
        match existing {
            Some(record) => Self::for_record(record),
            None => Self::for_form(form),
        }
    }

    /// One empty value per field label, in the form's field order.
    pub fn for_form(form: &Form) -> Self {
        let mut entries: Vec<(String, String)> = Vec::with_capacity(form.fields.len());
        for field in form.ordered_fields() {
            if !entries.iter().any(|(key, _)| *key == field.label) {
                entries.push((field.label.clone(), String::new()));
            }
        }

        Self {
            mode: EditorMode::Create { form: form.clone() },
            entries,
        }
    }

    /// The record's stored values, whatever the form looks like today.
    pub fn for_record(record: &Employee) -> Self {
        Self {
            mode: EditorMode::Update {
                record_id: record.id,
                form_id: record.form,
            },
            entries: record
                .data
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn is_new(&self) -> bool {
        matches!(self.mode, EditorMode::Create { .. })
    }

    pub fn form_id(&self) -> FormId {
        match &self.mode {
            EditorMode::Create { form } => form.id,
            EditorMode::Update { form_id, .. } => *form_id,
        }
    }

    /// Keys and values in display order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set one value; unknown keys are appended.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Input type for a key. Keys without form context are plain text.
    pub fn field_type(&self, key: &str) -> FieldType {
        match &self.mode {
            EditorMode::Create { form } => form
                .fields
                .iter()
                .find(|f| f.label == key)
                .map(|f| f.field_type)
                .unwrap_or_default(),
            EditorMode::Update { .. } => FieldType::Text,
        }
    }

    /// Labels of required fields whose trimmed value is empty.
    ///
    /// Only records created against a form are checked.
    pub fn validate(&self) -> Vec<String> {
        let EditorMode::Create { form } = &self.mode else {
            return Vec::new();
        };

        let mut missing: Vec<String> = Vec::new();
        for field in form.ordered_fields() {
            let blank = self.value(&field.label).map_or(true, |v| v.trim().is_empty());
            if blank && !missing.contains(&field.label) {
                missing.push(field.label.clone());
            }
        }
        missing
    }

    /// The request body for the current values.
    pub fn payload(&self) -> EmployeePayload {
        EmployeePayload {
            form: self.form_id(),
            data: self
                .entries
                .iter()
                .cloned()
                .collect::<RecordData>(),
        }
    }

    /// [`validate`](Self::validate) as an error naming the missing fields.
    pub fn check(&self) -> Result<()> {
        let missing = self.validate();
        if missing.is_empty() {
            return Ok(());
        }
        Err(ClientError::Validation(format!(
            "Please fill: {}",
            missing.join(", ")
        )))
    }

    /// Validate, then create or update the record.
    pub fn submit(&self, api: &dyn Api) -> Result<Employee> {
        self.check()?;

        let payload = self.payload();
        match self.mode {
            EditorMode::Create { .. } => {
                tracing::info!("Creating employee record for form {}", payload.form);
                api.create_employee(&payload)
            }
            EditorMode::Update { record_id, .. } => {
                tracing::info!("Updating employee record {}", record_id);
                api.update_employee(record_id, &payload)
            }
        }
    }

    /// Message shown when [`submit`](Self::submit) fails.
    pub fn error_message(&self, err: &ClientError) -> String {
        let fallback = if self.is_new() {
            "Failed to create employee"
        } else {
            "Failed to update employee"
        };
        err.user_message(&["form", "data"], fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;

    fn form(labels: &[&str]) -> Form {
        Form {
            id: 9,
            name: "Staff".into(),
            fields: labels
                .iter()
                .zip(1..)
                .map(|(label, order)| Field {
                    id: Some(order as u64),
                    label: (*label).into(),
                    field_type: FieldType::Text,
                    order,
                })
                .collect(),
        }
    }

    #[test]
    fn new_record_has_one_empty_entry_per_field() {
        let editor = RecordEditor::for_form(&form(&["Name", "Email"]));
        assert_eq!(
            editor.entries(),
            [("Name".to_string(), String::new()), ("Email".to_string(), String::new())]
        );
        assert!(editor.is_new());
        assert_eq!(editor.form_id(), 9);
    }

    #[test]
    fn validate_reports_blank_required_fields() {
        let mut editor = RecordEditor::for_form(&form(&["Name", "Email"]));
        editor.set_value("Email", "x");
        editor.set_value("Name", "   ");
        assert_eq!(editor.validate(), ["Name"]);
    }

    #[test]
    fn existing_record_is_edited_verbatim() {
        let record = Employee {
            id: 5,
            form: 9,
            data: [("Old".to_string(), "".to_string())].into_iter().collect(),
            created_at: None,
        };

        let editor = RecordEditor::open(&form(&["Name"]), Some(&record));
        assert!(!editor.is_new());
        assert_eq!(editor.entries(), [("Old".to_string(), String::new())]);
        assert!(editor.validate().is_empty());
        assert_eq!(editor.payload().form, 9);
    }

    #[test]
    fn payload_keeps_the_form_field_order() {
        let mut editor = RecordEditor::for_form(&form(&["Surname", "Name", "Email"]));
        editor.set_value("Name", "Ada");
        let keys: Vec<_> = editor.payload().data.into_keys().collect();
        assert_eq!(keys, ["Surname", "Name", "Email"]);
    }

    #[test]
    fn set_value_appends_unknown_keys() {
        let mut editor = RecordEditor::for_form(&form(&["Name"]));
        editor.set_value("Extra", "1");
        assert_eq!(editor.value("Extra"), Some("1"));
        assert_eq!(editor.entries().len(), 2);
    }

    #[test]
    fn duplicate_labels_collapse_to_one_key() {
        let editor = RecordEditor::for_form(&form(&["Name", "Name"]));
        assert_eq!(editor.entries().len(), 1);
        assert_eq!(editor.validate(), ["Name"]);
    }

    #[test]
    fn field_type_comes_from_the_form() {
        let mut f = form(&["Secret"]);
        f.fields[0].field_type = FieldType::Password;
        let editor = RecordEditor::for_form(&f);
        assert!(editor.field_type("Secret").is_secret());
        assert_eq!(editor.field_type("Unknown"), FieldType::Text);
    }
}
