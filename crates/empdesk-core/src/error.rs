//! Client error taxonomy and server message extraction.

use serde_json::Value;
use thiserror::Error;

/// Result alias used by every client operation.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Errors surfaced to the screens.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A client-side precondition failed; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The server rejected the token (HTTP 401).
    #[error("not authenticated (HTTP 401)")]
    Auth { body: ErrorBody },

    /// Any other non-2xx response.
    #[error("server responded with HTTP {status}")]
    Server { status: u16, body: ErrorBody },

    /// The request could not complete.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx response whose body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    /// The session could not be persisted.
    #[error("session storage failed: {0:#}")]
    Session(anyhow::Error),
}

impl ClientError {
    /// Decoded error body of a failed response, if any.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ClientError::Auth { body } | ClientError::Server { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Message to show the user.
    ///
    /// Validation errors are shown as-is. Server errors use the first of
    /// `fields` that carries a message, then the general message, then
    /// `fallback`. Transport failures show `fallback`.
    pub fn user_message(&self, fields: &[&str], fallback: &str) -> String {
        if let ClientError::Validation(message) = self {
            return message.clone();
        }

        self.body()
            .and_then(|body| body.first_of(fields).or_else(|| body.general()))
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Decoded body of a failed response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorBody(Value);

impl ErrorBody {
    /// Decode a raw body; anything that is not JSON is kept as text.
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => Self(value),
            Err(_) => {
                let text = String::from_utf8_lossy(bytes).trim().to_string();
                if text.is_empty() {
                    Self(Value::Null)
                } else {
                    Self(Value::String(text))
                }
            }
        }
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Whether the body is a JSON object (a field-keyed error map).
    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    /// Message for one key: a string, or the first string of a list.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = self.0.as_object()?.get(name)?;
        let text = match value {
            Value::String(s) => s.as_str(),
            Value::Array(items) => items.first()?.as_str()?,
            _ => return None,
        };
        (!text.is_empty()).then(|| text.to_string())
    }

    /// First of `names` that carries a message.
    pub fn first_of(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.field(name))
    }

    /// Non-field message: `detail`, then `non_field_errors`, then `error`.
    pub fn general(&self) -> Option<String> {
        self.first_of(&["detail", "non_field_errors", "error"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server(body: Value) -> ClientError {
        ClientError::Server {
            status: 400,
            body: ErrorBody::from_value(body),
        }
    }

    #[test]
    fn field_message_wins_over_general() {
        let err = server(json!({"data": ["This field is required."], "detail": "Bad"}));
        assert_eq!(
            err.user_message(&["form", "data"], "fallback"),
            "This field is required."
        );
    }

    #[test]
    fn general_message_precedence() {
        let err = server(json!({"non_field_errors": ["Nope"], "error": "Other"}));
        assert_eq!(err.user_message(&[], "fallback"), "Nope");

        let err = server(json!({"error": "Invalid Credentials"}));
        assert_eq!(err.user_message(&[], "fallback"), "Invalid Credentials");
    }

    #[test]
    fn falls_back_when_body_has_no_message() {
        let err = ClientError::Server {
            status: 500,
            body: ErrorBody::parse(b"<html>Server Error</html>"),
        };
        assert_eq!(err.user_message(&["data"], "Failed"), "Failed");

        let err = ClientError::Auth {
            body: ErrorBody::parse(b""),
        };
        assert_eq!(err.user_message(&[], "Failed"), "Failed");
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = ClientError::Validation("Please fill: Name".into());
        assert_eq!(err.user_message(&[], "Failed"), "Please fill: Name");
    }

    #[test]
    fn empty_strings_do_not_count_as_messages() {
        let body = ErrorBody::from_value(json!({"detail": "", "error": "x"}));
        assert_eq!(body.general().as_deref(), Some("x"));
    }
}
