//! Shared data types for the application.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Server-assigned form identifier.
pub type FormId = u64;
/// Server-assigned field identifier.
pub type FieldId = u64;
/// Server-assigned employee record identifier.
pub type EmployeeId = u64;

/// Values of an employee record, keyed by field label, in stored order.
pub type RecordData = IndexMap<String, String>;

/// Input type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Email,
    Password,
    Textarea,
}

impl FieldType {
    /// Every field type, in the order the builder offers them.
    pub const ALL: [FieldType; 6] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Date,
        FieldType::Email,
        FieldType::Password,
        FieldType::Textarea,
    ];

    /// Wire name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Textarea => "textarea",
        }
    }

    /// Human readable name.
    pub fn title(self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::Number => "Number",
            FieldType::Date => "Date",
            FieldType::Email => "Email",
            FieldType::Password => "Password",
            FieldType::Textarea => "Textarea",
        }
    }

    /// The type after this one, wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// The type before this one, wrapping around.
    pub fn prev(self) -> Self {
        let index = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Whether values of this type should be masked on screen.
    pub fn is_secret(self) -> bool {
        self == FieldType::Password
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field definition as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FieldId>,
    pub label: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub order: i64,
}

/// A dynamic form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Form {
    /// Fields sorted by their stored `order`, ties kept in server order.
    pub fn ordered_fields(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }
}

/// Body of a form create or full-replace request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormPayload {
    pub name: String,
    pub fields: Vec<Field>,
}

/// An employee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub form: FormId,
    #[serde(default, deserialize_with = "deserialize_record_data")]
    pub data: RecordData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of an employee create or update request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeePayload {
    pub form: FormId,
    pub data: RecordData,
}

/// Query parameters of the employee list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeQuery {
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Password change request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

/// Token pair returned by a successful login.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Records are stored as free-form JSON; scalars that are not strings are
/// kept as their text rendering so the editor can work on plain strings.
fn deserialize_record_data<'de, D>(deserializer: D) -> Result<RecordData, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(RecordData::new());
    };

    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_type_uses_lowercase_wire_names() {
        let field: Field =
            serde_json::from_value(json!({"id": 4, "label": "Bio", "field_type": "textarea", "order": 2}))
                .unwrap();
        assert_eq!(field.field_type, FieldType::Textarea);
        assert_eq!(
            serde_json::to_value(FieldType::Email).unwrap(),
            json!("email")
        );
    }

    #[test]
    fn new_fields_serialize_without_id() {
        let field = Field {
            id: None,
            label: "Name".into(),
            field_type: FieldType::Text,
            order: 1,
        };
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({"label": "Name", "field_type": "text", "order": 1})
        );
    }

    #[test]
    fn field_type_cycles_through_all_variants() {
        let mut t = FieldType::Text;
        for _ in 0..FieldType::ALL.len() {
            t = t.next();
        }
        assert_eq!(t, FieldType::Text);
        assert_eq!(FieldType::Text.prev(), FieldType::Textarea);
    }

    #[test]
    fn record_data_tolerates_non_string_values() {
        let employee: Employee = serde_json::from_value(json!({
            "id": 1,
            "form": 2,
            "data": {"Name": "Ada", "Age": 36, "Active": true, "Note": null},
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(employee.data["Name"], "Ada");
        assert_eq!(employee.data["Age"], "36");
        assert_eq!(employee.data["Active"], "true");
        assert_eq!(employee.data["Note"], "");
        assert!(employee.created_at.is_some());
    }

    #[test]
    fn record_data_keeps_stored_key_order() {
        let employee: Employee = serde_json::from_str(
            r#"{"id": 1, "form": 2, "data": {"Surname": "Lovelace", "Name": "Ada", "Age": 36}}"#,
        )
        .unwrap();

        let keys: Vec<_> = employee.data.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Surname", "Name", "Age"]);

        let payload = EmployeePayload {
            form: employee.form,
            data: employee.data,
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"form":2,"data":{"Surname":"Lovelace","Name":"Ada","Age":"36"}}"#
        );
    }

    #[test]
    fn ordered_fields_sorts_by_order() {
        let form = Form {
            id: 1,
            name: "Staff".into(),
            fields: vec![
                Field { id: Some(1), label: "B".into(), field_type: FieldType::Text, order: 2 },
                Field { id: Some(2), label: "A".into(), field_type: FieldType::Text, order: 1 },
            ],
        };
        let labels: Vec<_> = form.ordered_fields().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, ["A", "B"]);
    }
}
