//! Stateful stand-in for the QuoIntelligence API, for end-to-end tests.
//!
//! Only built with the `test-server` feature. It issues real tokens, pages
//! collections by `page_start`, filters on `since`/`until` and records the
//! offsets it was asked for, so tests can assert on the request sequence.
//!
//! ```ignore
//! use qintel::mock_server::{MockServer, DEFAULT_EMAIL, DEFAULT_PASSWORD};
//! use qintel::{ClientConfig, QiClient, TicketQuery};
//!
//! let server = MockServer::start().await;
//! let config = ClientConfig::new(DEFAULT_EMAIL, DEFAULT_PASSWORD).with_base_url(server.url());
//! let client = QiClient::connect(config).await?;
//! let tickets = client.drp(&TicketQuery::default())?.collect_all().await?;
//! assert_eq!(tickets.len(), 103);
//! server.shutdown().await;
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures, DEFAULT_EMAIL, DEFAULT_PASSWORD};
pub use server::MockServer;
pub use state::{MockState, DEFAULT_PAGE_SIZE};
