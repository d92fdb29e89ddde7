//! In-memory data behind the mock server.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{Record, Resource};

/// Default number of records per page served by the mock.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Accounts, records and request counters served by
/// [`MockServer`](super::MockServer). Fields are public so tests can seed
/// or inspect them directly.
#[derive(Debug)]
pub struct MockState {
    /// Accepted credentials, email to password.
    pub accounts: HashMap<String, String>,

    /// Tokens handed out by `/login`.
    pub issued_tokens: HashSet<String>,

    /// Ticket collections, in server order.
    pub collections: HashMap<Resource, Vec<Record>>,

    /// Extended ticket details indexed by ID.
    pub tickets: HashMap<u64, Record>,

    /// Catalogs indexed by name.
    pub catalogs: HashMap<String, Vec<Record>>,

    /// Catalogs that exist but the account may not read.
    pub forbidden_catalogs: HashSet<String>,

    /// Records per page.
    pub page_size: usize,

    /// Signal the end of a collection with `204 No Content` instead of `[]`.
    pub end_with_no_content: bool,

    /// Number of `/login` calls received.
    pub login_attempts: u32,

    /// `page_start` values received per collection, in order.
    pub page_requests: HashMap<Resource, Vec<u64>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            issued_tokens: HashSet::new(),
            collections: HashMap::new(),
            tickets: HashMap::new(),
            catalogs: HashMap::new(),
            forbidden_catalogs: HashSet::new(),
            page_size: DEFAULT_PAGE_SIZE,
            end_with_no_content: false,
            login_attempts: 0,
            page_requests: HashMap::new(),
        }
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap for sharing with the axum handlers.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Accept a login.
    pub fn with_account(mut self, email: &str, password: &str) -> Self {
        self.accounts
            .insert(email.to_string(), password.to_string());
        self
    }

    /// Append records to a collection.
    pub fn with_records(mut self, resource: Resource, records: Vec<Record>) -> Self {
        self.collections.entry(resource).or_default().extend(records);
        self
    }

    /// Add extended details for a ticket.
    pub fn with_ticket(mut self, ticket: Record) -> Self {
        if let Some(id) = ticket.id() {
            self.tickets.insert(id, ticket);
        }
        self
    }

    /// Add a catalog.
    pub fn with_catalog(mut self, name: &str, entries: Vec<Record>) -> Self {
        self.catalogs.insert(name.to_string(), entries);
        self
    }

    /// Mark a catalog as not readable by the account.
    pub fn with_forbidden_catalog(mut self, name: &str) -> Self {
        self.forbidden_catalogs.insert(name.to_string());
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// End collections with `204 No Content`.
    pub fn with_no_content_end(mut self) -> Self {
        self.end_with_no_content = true;
        self
    }

    /// Check credentials and issue a token.
    pub fn login(&mut self, email: &str, password: &str) -> Option<String> {
        self.login_attempts += 1;
        if self.accounts.get(email).map(String::as_str) != Some(password) {
            return None;
        }
        let token = format!("mock-token-{}", self.login_attempts);
        self.issued_tokens.insert(token.clone());
        Some(token)
    }

    /// Whether a bearer token was issued by this server.
    pub fn is_authorized(&self, token: &str) -> bool {
        self.issued_tokens.contains(token)
    }

    /// Records of a collection inside an optional window.
    ///
    /// Window bounds and `created_at` share the `YYYY-MM-DDTHH:MM:SS` format,
    /// so they compare as strings. Records without `created_at` always match.
    pub fn list(&self, resource: Resource, since: Option<&str>, until: Option<&str>) -> Vec<&Record> {
        self.collections
            .get(&resource)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| {
                        let created = r.get("created_at").and_then(|v| v.as_str());
                        match created {
                            Some(created) => {
                                since.map_or(true, |s| created >= s)
                                    && until.map_or(true, |u| created <= u)
                            }
                            None => true,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record a page request.
    pub fn record_page_request(&mut self, resource: Resource, page_start: u64) {
        self.page_requests
            .entry(resource)
            .or_default()
            .push(page_start);
    }

    /// `page_start` values received for a collection.
    pub fn page_starts(&self, resource: Resource) -> &[u64] {
        self.page_requests
            .get(&resource)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
