//! QuoIntelligence API client library.
//!
//! A Rust library for pulling tickets from the QuoIntelligence
//! threat-intelligence REST API: brand protection (DRP), intelligence and
//! service request tickets, vulnerability alerts, single ticket details and
//! reference catalogs.
//!
//! # Quick Start
//!
//! ```no_run
//! use futures::TryStreamExt;
//! use qintel::{QiClient, TicketQuery};
//!
//! #[tokio::main]
//! async fn main() -> qintel::Result<()> {
//!     // Log in with QI_API_EMAIL / QI_API_PASSWORD
//!     let client = QiClient::from_env().await?;
//!
//!     // DRP tickets from the last 30 days, one record at a time
//!     let mut tickets = client.drp(&TicketQuery::since("30d"))?;
//!     while let Some(ticket) = tickets.next_record().await? {
//!         println!("{:?} {:?}", ticket.id(), ticket.subject());
//!     }
//!
//!     // Intelligence tickets in an explicit range, as a stream
//!     let range = TicketQuery::between("2020-10-01", "2021-04-07");
//!     let intel: Vec<_> = client.intelligence(&range)?.into_stream().try_collect().await?;
//!     println!("Counted {} intelligence tickets", intel.len());
//!
//!     // Extended details and catalogs
//!     let details = client.ticket(1234).await?;
//!     let sectors = client.catalog("sectors").await?;
//!     println!("{} fields, {} sectors", details.len(), sectors.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Pagination
//!
//! Collections are paged with a `page_start` offset that advances by the
//! number of records returned. A [`Pager`] stops on an empty page or a
//! `204 No Content` answer. It has no page cap unless one is configured
//! with [`ClientConfig::with_max_pages`].
//!
//! # Time windows
//!
//! A [`TicketQuery`] carries either a relative `since` (`15m`, `1h`, `40d`,
//! resolved against the current UTC time when the query is issued) or an
//! explicit `date_range`, never both.
//!
//! # Configuration
//!
//! [`ClientConfig::from_env`] reads:
//!
//! - `QI_API_EMAIL` (required) - Account email address
//! - `QI_API_PASSWORD` (required) - Account password
//! - `QI_API_URL` (optional) - Base URL (defaults to `https://api.quointelligence.eu/v0.1`)
//! - `QI_API_CLIENT_CERT` (optional) - PEM file with a client certificate and key

pub mod cli;
mod client;
mod config;
mod error;
#[cfg(feature = "test-server")]
pub mod mock_server;
mod output;
mod pagination;
mod query;
mod record;
mod resources;
mod retry;
mod window;

// Re-export core types
pub use client::QiClient;
pub use config::{
    ClientConfig, DEFAULT_API_URL, ENV_CLIENT_CERT, ENV_EMAIL, ENV_PASSWORD, ENV_URL,
};
pub use error::{QiError, Result};
pub use pagination::{Page, Pager, PAGE_START_PARAM};
pub use query::TicketQuery;
pub use record::Record;
pub use resources::{Catalog, Resource};
pub use retry::{RetryPolicy, RETRY_STATUSES};
pub use window::{format_utc, parse_datetime_utc, parse_since, TimeWindow, WindowParams};

// Re-export output formatting
pub use output::{render_tree, render_value, PrettyPrint};
