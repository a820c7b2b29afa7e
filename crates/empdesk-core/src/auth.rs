//! Login, registration and password change.
//!
//! Each form validates on the client first; nothing is sent while a check
//! fails. Server failures are turned into the messages the screens show.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::api::Api;
use crate::error::{ClientError, Result};
use crate::models::{Credentials, PasswordChange, Registration};
use crate::session::{Session, SessionStore};

pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
pub const PASSWORD_CHANGE_FAILED: &str = "Failed to change password";
pub const PASSWORD_CHANGED: &str = "Password changed successfully!";
pub const REGISTERED: &str = "Registration successful! Please log in.";

const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid")
});

/// Login screen input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ClientError::Validation("Please fill in both fields".into()));
        }
        Ok(Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

/// Log in and store the returned token pair.
pub fn login(api: &dyn Api, store: &dyn SessionStore, form: &LoginForm) -> Result<Session> {
    let credentials = form.validate()?;
    let session = Session::from(api.login(&credentials)?);
    store.set(session.clone()).map_err(ClientError::Session)?;
    tracing::info!("Logged in as {}", credentials.username);
    Ok(session)
}

pub fn login_error_message(err: &ClientError) -> String {
    err.user_message(&[], LOGIN_FAILED)
}

/// Forget the stored tokens.
pub fn logout(session: &dyn SessionStore) -> anyhow::Result<()> {
    session.clear()?;
    tracing::info!("Logged out");
    Ok(())
}

/// Fields of the registration form that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegisterField {
    Username,
    Email,
    Password,
    ConfirmPassword,
    /// Errors not tied to one input.
    General,
}

/// Per-field error messages.
pub type FieldErrors = BTreeMap<RegisterField, String>;

/// Registration screen input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Run every check and report all failing fields together.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.username.trim().is_empty() {
            errors.insert(RegisterField::Username, "Username is required".into());
        }

        if self.email.trim().is_empty() {
            errors.insert(RegisterField::Email, "Email is required".into());
        } else if !EMAIL_SHAPE.is_match(&self.email) {
            errors.insert(RegisterField::Email, "Invalid email format".into());
        }

        if self.password.is_empty() {
            errors.insert(RegisterField::Password, "Password is required".into());
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                RegisterField::Password,
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }

        if self.password != self.confirm_password {
            errors.insert(RegisterField::ConfirmPassword, "Passwords do not match".into());
        }

        errors
    }

    pub fn registration(&self) -> Registration {
        Registration {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

/// Validate and create the account.
pub fn register(api: &dyn Api, form: &RegisterForm) -> std::result::Result<(), FieldErrors> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(errors);
    }

    api.register(&form.registration())
        .map_err(|e| register_field_errors(&e))?;
    tracing::info!("Registered {}", form.username);
    Ok(())
}

/// Merge a failed registration response into per-field messages.
pub fn register_field_errors(err: &ClientError) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let Some(body) = err.body().filter(|b| b.is_object()) else {
        tracing::warn!("Registration failed: {}", err);
        errors.insert(RegisterField::General, REGISTRATION_FAILED.into());
        return errors;
    };

    let merged = [
        (RegisterField::Username, body.field("username")),
        (RegisterField::Email, body.field("email")),
        (
            RegisterField::Password,
            body.first_of(&["password", "detail", "non_field_errors"]),
        ),
        (RegisterField::General, body.field("detail")),
    ];
    for (field, message) in merged {
        if let Some(message) = message {
            errors.insert(field, message);
        }
    }

    if errors.is_empty() {
        errors.insert(RegisterField::General, REGISTRATION_FAILED.into());
    }
    errors
}

/// Change password screen input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswordChangeForm {
    pub old_password: String,
    pub new_password: String,
}

impl PasswordChangeForm {
    pub fn validate(&self) -> Result<PasswordChange> {
        if self.old_password.is_empty() || self.new_password.is_empty() {
            return Err(ClientError::Validation("Please fill in both fields".into()));
        }
        Ok(PasswordChange {
            old_password: self.old_password.clone(),
            new_password: self.new_password.clone(),
        })
    }
}

pub fn change_password(api: &dyn Api, form: &PasswordChangeForm) -> Result<()> {
    let change = form.validate()?;
    api.change_password(&change)?;
    tracing::info!("Password changed");
    Ok(())
}

pub fn change_password_error_message(err: &ClientError) -> String {
    err.user_message(&["old_password", "new_password"], PASSWORD_CHANGE_FAILED)
}
