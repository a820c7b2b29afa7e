//! REST client for the employee-management service.

use reqwest::blocking::Client;
use reqwest::{Method, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::error::{ClientError, ErrorBody, Result};
use crate::models::{
    Credentials, Employee, EmployeeId, EmployeePayload, EmployeeQuery, Form, FormId, FormPayload,
    PasswordChange, Profile, Registration, TokenPair,
};
use crate::page::{self, Page, DEFAULT_PAGE_SIZE};
use crate::session::SessionStore;

/// Operations offered by the remote service.
///
/// Calls are blocking; front ends run them off their interaction thread.
pub trait Api: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<TokenPair>;
    fn register(&self, registration: &Registration) -> Result<()>;
    fn change_password(&self, change: &PasswordChange) -> Result<()>;
    fn profile(&self) -> Result<Profile>;

    fn list_forms(&self) -> Result<Vec<Form>>;
    fn create_form(&self, payload: &FormPayload) -> Result<Form>;
    fn update_form(&self, id: FormId, payload: &FormPayload) -> Result<Form>;

    fn list_employees(&self, query: &EmployeeQuery) -> Result<Page<Employee>>;
    fn create_employee(&self, payload: &EmployeePayload) -> Result<Employee>;
    fn update_employee(&self, id: EmployeeId, payload: &EmployeePayload) -> Result<Employee>;
    fn delete_employee(&self, id: EmployeeId) -> Result<()>;
}

/// HTTP implementation of [`Api`].
///
/// Every call except login and registration carries the stored access token
/// as a bearer token.
pub struct ApiClient {
    base_url: Url,
    http: Client,
    session: Arc<dyn SessionStore>,
    page_size: u32,
}

struct Request<'a, T> {
    method: Method,
    rel_url: &'a str,
    query: Option<&'a EmployeeQuery>,
    payload: Option<&'a T>,
    authenticated: bool,
}

impl<'a> Request<'a, ()> {
    fn without_payload(method: Method, rel_url: &'a str) -> Self {
        Self {
            method,
            rel_url,
            query: None,
            payload: None,
            authenticated: true,
        }
    }
}

impl<'a, T> Request<'a, T> {
    fn with_payload(method: Method, rel_url: &'a str, payload: &'a T) -> Self {
        Self {
            method,
            rel_url,
            query: None,
            payload: Some(payload),
            authenticated: true,
        }
    }

    fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

impl ApiClient {
    /// Create a client for the service rooted at `base_url`.
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join drops the last segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            http: Client::builder().build()?,
            session,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Page size used to derive page counts from a bare record count.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of a path relative to the base address.
    pub fn endpoint(&self, rel_url: &str) -> Result<Url> {
        Ok(self.base_url.join(rel_url.trim_start_matches('/'))?)
    }

    fn execute<T, R>(&self, request: Request<'_, T>) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let Request {
            method,
            rel_url,
            query,
            payload,
            authenticated,
        } = request;

        let url = self.endpoint(rel_url)?;
        tracing::debug!("{} {}", method, url);

        let mut builder = self.http.request(method.clone(), url);
        if authenticated {
            match self.session.get() {
                Some(session) => builder = builder.bearer_auth(&session.access_token),
                None => tracing::debug!("No session for {} {}, sending without token", method, rel_url),
            }
        }
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(payload) = payload {
            builder = builder.json(payload);
        }

        let response = builder.send()?;
        let status = response.status();
        let bytes = response.bytes()?;

        if !status.is_success() {
            tracing::warn!("{} {} failed with {}", method, rel_url, status);
            let body = ErrorBody::parse(&bytes);
            return Err(if status == StatusCode::UNAUTHORIZED {
                ClientError::Auth { body }
            } else {
                ClientError::Server {
                    status: status.as_u16(),
                    body,
                }
            });
        }

        // 204 No Content and friends decode as JSON null
        let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl Api for ApiClient {
    fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        self.execute(Request::with_payload(Method::POST, "auth/login/", credentials).anonymous())
    }

    fn register(&self, registration: &Registration) -> Result<()> {
        let _: IgnoredAny = self.execute(
            Request::with_payload(Method::POST, "auth/register/", registration).anonymous(),
        )?;
        Ok(())
    }

    fn change_password(&self, change: &PasswordChange) -> Result<()> {
        let _: IgnoredAny =
            self.execute(Request::with_payload(Method::POST, "auth/change-password/", change))?;
        Ok(())
    }

    fn profile(&self) -> Result<Profile> {
        self.execute(Request::without_payload(Method::GET, "auth/profile/"))
    }

    fn list_forms(&self) -> Result<Vec<Form>> {
        // Same tolerance as the employee list: envelope or bare array
        let value: Value = self.execute(Request::without_payload(Method::GET, "forms/"))?;
        Ok(page::normalize(value, self.page_size)?.items)
    }

    fn create_form(&self, payload: &FormPayload) -> Result<Form> {
        self.execute(Request::with_payload(Method::POST, "forms/", payload))
    }

    fn update_form(&self, id: FormId, payload: &FormPayload) -> Result<Form> {
        self.execute(Request::with_payload(Method::PUT, &format!("forms/{id}/"), payload))
    }

    fn list_employees(&self, query: &EmployeeQuery) -> Result<Page<Employee>> {
        let request = Request {
            query: Some(query),
            ..Request::without_payload(Method::GET, "employees/")
        };
        let value: Value = self.execute(request)?;
        Ok(page::normalize(value, self.page_size)?)
    }

    fn create_employee(&self, payload: &EmployeePayload) -> Result<Employee> {
        self.execute(Request::with_payload(Method::POST, "employees/", payload))
    }

    fn update_employee(&self, id: EmployeeId, payload: &EmployeePayload) -> Result<Employee> {
        self.execute(Request::with_payload(Method::PUT, &format!("employees/{id}/"), payload))
    }

    fn delete_employee(&self, id: EmployeeId) -> Result<()> {
        let _: IgnoredAny =
            self.execute(Request::without_payload(Method::DELETE, &format!("employees/{id}/")))?;
        Ok(())
    }
}
