//! Paged, searchable employee list.
//!
//! Fetches are split into [`EmployeeList::begin_fetch`] and
//! [`EmployeeList::apply`] so a front end can run the request elsewhere.
//! Every fetch takes a sequence number; only the response to the most recent
//! fetch is applied.

use crate::api::Api;
use crate::error::{ClientError, Result};
use crate::models::{Employee, EmployeeId, EmployeeQuery};
use crate::page::Page;

/// Message shown when a page cannot be loaded.
pub const LOAD_FAILED: &str = "Failed to load employees";
/// Message shown when a delete fails.
pub const DELETE_FAILED: &str = "Failed to delete employee";

/// A fetch that has been issued but not applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: EmployeeQuery,
}

/// Result of applying a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch was issued meanwhile; the response was dropped.
    Stale,
    /// The page no longer exists; the current page was moved back into range
    /// and should be fetched again.
    Clamped,
    Failed,
}

/// Proof that the user confirmed a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfirmation {
    id: EmployeeId,
}

impl DeleteConfirmation {
    pub fn id(&self) -> EmployeeId {
        self.id
    }
}

/// State of the employee list screen.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeList {
    page: u32,
    total_pages: u32,
    search: String,
    records: Vec<Employee>,
    issued: u64,
    error: Option<String>,
}

impl Default for EmployeeList {
    fn default() -> Self {
        Self::new()
    }
}

impl EmployeeList {
    pub fn new() -> Self {
        Self {
            page: 1,
            total_pages: 1,
            search: String::new(),
            records: Vec::new(),
            issued: 0,
            error: None,
        }
    }

    /// Current 1-based page.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn records(&self) -> &[Employee] {
        &self.records
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Change the search term. A new search always starts at page 1.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn clear_search(&mut self) {
        self.set_search(String::new());
    }

    pub fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Go back one page. Returns false when already on the first page.
    pub fn prev_page(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Go forward one page. Returns false when already on the last page.
    pub fn next_page(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.page += 1;
        true
    }

    /// Query for the current page and search term.
    pub fn query(&self) -> EmployeeQuery {
        let search = self.search.trim();
        EmployeeQuery {
            page: self.page,
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }

    /// Issue a new fetch, superseding any fetch still in flight.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            seq: self.issued,
            query: self.query(),
        }
    }

    /// Apply the response to fetch `seq`.
    ///
    /// Failures keep the records already shown.
    pub fn apply(&mut self, seq: u64, result: Result<Page<Employee>>) -> FetchOutcome {
        if seq != self.issued {
            tracing::debug!("Dropping stale employee page (seq {}, latest {})", seq, self.issued);
            return FetchOutcome::Stale;
        }

        match result {
            Ok(page) => {
                self.error = None;
                self.records = page.items;
                self.total_pages = page.total_pages.max(1);
                if self.page > self.total_pages {
                    self.page = self.total_pages;
                    return FetchOutcome::Clamped;
                }
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("Loading employees failed: {}", e);
                self.error = Some(e.user_message(&[], LOAD_FAILED));
                FetchOutcome::Failed
            }
        }
    }

    /// Fetch the current page synchronously.
    pub fn fetch(&mut self, api: &dyn Api) -> FetchOutcome {
        let ticket = self.begin_fetch();
        let outcome = self.apply(ticket.seq, api.list_employees(&ticket.query));
        if outcome != FetchOutcome::Clamped {
            return outcome;
        }

        let ticket = self.begin_fetch();
        self.apply(ticket.seq, api.list_employees(&ticket.query))
    }

    /// First step of a delete: the caller must obtain the user's
    /// confirmation before passing this to [`delete`](Self::delete).
    pub fn request_delete(&self, id: EmployeeId) -> DeleteConfirmation {
        DeleteConfirmation { id }
    }

    /// Delete a confirmed record and reload the current page.
    ///
    /// On failure the list is left as it was.
    pub fn delete(&mut self, api: &dyn Api, confirmation: DeleteConfirmation) -> Result<()> {
        tracing::info!("Deleting employee {}", confirmation.id);
        if let Err(e) = api.delete_employee(confirmation.id) {
            self.error = Some(delete_error_message(&e));
            return Err(e);
        }
        self.fetch(api);
        Ok(())
    }
}

pub fn delete_error_message(err: &ClientError) -> String {
    err.user_message(&[], DELETE_FAILED)
}
