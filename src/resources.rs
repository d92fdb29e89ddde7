//! Resource accessors on [`QiClient`].
//!
//! Ticket collections are paged with [`Pager`]; tickets and catalogs are
//! single requests.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::client::QiClient;
use crate::error::{QiError, Result};
use crate::pagination::Pager;
use crate::query::TicketQuery;
use crate::record::Record;

/// Paginated ticket collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Digital risk protection (brand protection) tickets.
    Drp,
    /// Intelligence tickets.
    Intelligence,
    /// Service request tickets.
    ServiceRequests,
    /// Vulnerability alerts.
    VulnerabilityAlerts,
}

impl Resource {
    /// All collections, in a stable order.
    pub const ALL: [Resource; 4] = [
        Resource::Drp,
        Resource::Intelligence,
        Resource::ServiceRequests,
        Resource::VulnerabilityAlerts,
    ];

    /// Path below the API base URL.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Drp => "drp",
            Self::Intelligence => "intelligence",
            Self::ServiceRequests => "service-requests",
            Self::VulnerabilityAlerts => "vulnerability-alerts",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Resource {
    type Err = QiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.path() == s)
            .ok_or_else(|| QiError::Validation(format!("unknown resource `{s}`")))
    }
}

/// Reference catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Catalog {
    /// Sector taxonomy; entries link to their parent through `id_parent`.
    Sectors,
    /// Vulnerability catalog.
    Vulnerabilities,
    /// Any other catalog, by name.
    Named(String),
}

impl Catalog {
    /// Catalog name as used in the URL.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sectors => "sectors",
            Self::Vulnerabilities => "vulnerabilities",
            Self::Named(name) => name,
        }
    }

    fn path(&self) -> String {
        format!("catalogs/{}", urlencoding::encode(self.name()))
    }
}

impl From<&str> for Catalog {
    fn from(name: &str) -> Self {
        match name {
            "sectors" => Self::Sectors,
            "vulnerabilities" => Self::Vulnerabilities,
            other => Self::Named(other.to_string()),
        }
    }
}

impl From<String> for Catalog {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl QiClient {
    /// Query any ticket collection.
    ///
    /// The query is validated immediately; records are fetched lazily as the
    /// returned pager is consumed.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Validation`] for conflicting or malformed window
    /// filters.
    pub fn query(&self, resource: Resource, query: &TicketQuery) -> Result<Pager> {
        Pager::new(self, resource.path(), query)
    }

    /// Query brand protection tickets.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use qintel::{QiClient, TicketQuery};
    ///
    /// # async fn example(client: QiClient) -> qintel::Result<()> {
    /// let mut tickets = client.drp(&TicketQuery::since("30d"))?;
    /// while let Some(ticket) = tickets.next_record().await? {
    ///     println!("{:?} {:?}", ticket.id(), ticket.subject());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// See [`query`](Self::query).
    pub fn drp(&self, query: &TicketQuery) -> Result<Pager> {
        self.query(Resource::Drp, query)
    }

    /// Query intelligence tickets.
    ///
    /// # Errors
    ///
    /// See [`query`](Self::query).
    pub fn intelligence(&self, query: &TicketQuery) -> Result<Pager> {
        self.query(Resource::Intelligence, query)
    }

    /// Query service request tickets.
    ///
    /// # Errors
    ///
    /// See [`query`](Self::query).
    pub fn service_requests(&self, query: &TicketQuery) -> Result<Pager> {
        self.query(Resource::ServiceRequests, query)
    }

    /// Query vulnerability alerts.
    ///
    /// # Errors
    ///
    /// See [`query`](Self::query).
    pub fn vulnerability_alerts(&self, query: &TicketQuery) -> Result<Pager> {
        self.query(Resource::VulnerabilityAlerts, query)
    }

    /// Get extended ticket details given a ticket id.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Query`] carrying the server's body if the ticket
    /// cannot be fetched.
    pub async fn ticket(&self, id: u64) -> Result<Record> {
        debug!("Fetching ticket ({})", id);
        self.get_json(&format!("ticket/{id}")).await
    }

    /// Fetch a whole catalog.
    ///
    /// Server-side failures are reported as [`QiError::Validation`], since
    /// they mean the catalog name is unknown or not available to the account.
    ///
    /// # Errors
    ///
    /// [`QiError::Validation`] for empty names and unavailable catalogs,
    /// transport and parse errors as usual.
    pub async fn catalog(&self, catalog: impl Into<Catalog>) -> Result<Vec<Record>> {
        let catalog = catalog.into();
        if catalog.name().trim().is_empty() {
            return Err(QiError::Validation("catalog name must not be empty".to_string()));
        }

        debug!("Fetching catalog ({})", catalog);

        match self.get_json(&catalog.path()).await {
            Err(QiError::Query { status, body, .. }) => Err(QiError::Validation(format!(
                "catalog `{catalog}` is not available (HTTP {status}): {body}"
            ))),
            other => other,
        }
    }
}
