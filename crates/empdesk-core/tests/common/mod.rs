//! In-memory stand-in for the REST service.

#![allow(dead_code)]

use empdesk_core::api::Api;
use empdesk_core::error::{ClientError, ErrorBody, Result};
use empdesk_core::models::{
    Credentials, Employee, EmployeeId, EmployeePayload, EmployeeQuery, Field, Form, FormId,
    FormPayload, PasswordChange, Profile, Registration, TokenPair,
};
use empdesk_core::page::{self, Page};
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    forms: Vec<Form>,
    employees: Vec<Employee>,
    calls: Vec<String>,
    next_id: u64,
    failure: Option<(u16, Value)>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<State>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `status` and `body`.
    pub fn fail_next(&self, status: u16, body: Value) {
        self.state.lock().unwrap().failure = Some((status, body));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn forms(&self) -> Vec<Form> {
        self.state.lock().unwrap().forms.clone()
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.state.lock().unwrap().employees.clone()
    }

    pub fn seed_employees(&self, form: FormId, count: usize) {
        for n in 0..count {
            let payload = EmployeePayload {
                form,
                data: [("Name".to_string(), format!("Person {n}"))].into_iter().collect(),
            };
            self.create_employee(&payload).unwrap();
        }
        self.state.lock().unwrap().calls.clear();
    }

    fn begin(&self, call: impl Into<String>) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.into());
        if let Some((status, body)) = state.failure.take() {
            let body = ErrorBody::from_value(body);
            return Err(if status == 401 {
                ClientError::Auth { body }
            } else {
                ClientError::Server { status, body }
            });
        }
        Ok(state)
    }

    fn next_id(state: &mut State) -> u64 {
        state.next_id += 1;
        state.next_id
    }

    fn store_fields(state: &mut State, payload: &FormPayload) -> Vec<Field> {
        payload
            .fields
            .iter()
            .map(|f| Field {
                id: Some(Self::next_id(state)),
                ..f.clone()
            })
            .collect()
    }
}

impl Api for FakeApi {
    fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        let _state = self.begin(format!("POST auth/login/ {}", credentials.username))?;
        Ok(TokenPair {
            access: format!("access-{}", credentials.username),
            refresh: format!("refresh-{}", credentials.username),
        })
    }

    fn register(&self, registration: &Registration) -> Result<()> {
        let _state = self.begin(format!("POST auth/register/ {}", registration.username))?;
        Ok(())
    }

    fn change_password(&self, _change: &PasswordChange) -> Result<()> {
        let _state = self.begin("POST auth/change-password/")?;
        Ok(())
    }

    fn profile(&self) -> Result<Profile> {
        let _state = self.begin("GET auth/profile/")?;
        Ok(Profile {
            id: Some(1),
            username: "ann".into(),
            email: "ann@example.com".into(),
        })
    }

    fn list_forms(&self) -> Result<Vec<Form>> {
        let state = self.begin("GET forms/")?;
        Ok(state.forms.clone())
    }

    fn create_form(&self, payload: &FormPayload) -> Result<Form> {
        let mut state = self.begin("POST forms/")?;
        let id = Self::next_id(&mut state);
        let form = Form {
            id,
            name: payload.name.clone(),
            fields: Self::store_fields(&mut state, payload),
        };
        state.forms.push(form.clone());
        Ok(form)
    }

    fn update_form(&self, id: FormId, payload: &FormPayload) -> Result<Form> {
        let mut state = self.begin(format!("PUT forms/{id}/"))?;
        // Full replace: old field rows are dropped and recreated
        let fields = Self::store_fields(&mut state, payload);
        let form = state
            .forms
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ClientError::Server {
                status: 404,
                body: ErrorBody::from_value(json!({"detail": "Not found."})),
            })?;
        form.name = payload.name.clone();
        form.fields = fields;
        Ok(form.clone())
    }

    fn list_employees(&self, query: &EmployeeQuery) -> Result<Page<Employee>> {
        let state = self.begin(format!(
            "GET employees/?page={}&search={}",
            query.page,
            query.search.as_deref().unwrap_or("")
        ))?;

        let matching: Vec<&Employee> = state
            .employees
            .iter()
            .filter(|e| match &query.search {
                Some(term) => e.data.values().any(|v| v.contains(term.as_str())),
                None => true,
            })
            .collect();

        let start = (query.page.saturating_sub(1) as usize) * 10;
        let results: Vec<&Employee> = matching.iter().skip(start).take(10).copied().collect();
        let envelope = json!({ "count": matching.len(), "results": results });
        Ok(page::normalize(envelope, 10)?)
    }

    fn create_employee(&self, payload: &EmployeePayload) -> Result<Employee> {
        let mut state = self.begin("POST employees/")?;
        let employee = Employee {
            id: Self::next_id(&mut state),
            form: payload.form,
            data: payload.data.clone(),
            created_at: None,
        };
        state.employees.push(employee.clone());
        Ok(employee)
    }

    fn update_employee(&self, id: EmployeeId, payload: &EmployeePayload) -> Result<Employee> {
        let mut state = self.begin(format!("PUT employees/{id}/"))?;
        let employee = state
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ClientError::Server {
                status: 404,
                body: ErrorBody::from_value(json!({"detail": "Not found."})),
            })?;
        employee.form = payload.form;
        employee.data = payload.data.clone();
        Ok(employee.clone())
    }

    fn delete_employee(&self, id: EmployeeId) -> Result<()> {
        let mut state = self.begin(format!("DELETE employees/{id}/"))?;
        state.employees.retain(|e| e.id != id);
        Ok(())
    }
}
