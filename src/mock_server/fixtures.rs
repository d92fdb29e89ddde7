//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::json;

use super::state::MockState;
use crate::{Record, Resource};

/// Email accepted by the default scenario.
pub const DEFAULT_EMAIL: &str = "analyst@example.com";
/// Password accepted by the default scenario.
pub const DEFAULT_PASSWORD: &str = "correct-horse-battery-staple";

/// Collection of fixture factories for test data.
pub struct Fixtures;

/// Default test scenario with a set of related entities.
pub struct DefaultScenario {
    pub accounts: Vec<(String, String)>,
    pub collections: Vec<(Resource, Vec<Record>)>,
    pub tickets: Vec<Record>,
    pub catalogs: Vec<(String, Vec<Record>)>,
    pub forbidden_catalogs: Vec<String>,
}

impl Fixtures {
    // =========================================================================
    // Ticket Fixtures
    // =========================================================================

    /// First `created_at` used by generated collections.
    pub fn epoch() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 4, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    /// Create a minimal ticket with id, subject and creation time.
    pub fn ticket(id: u64, subject: &str, created_at: NaiveDateTime) -> Record {
        record(json!({
            "id": id,
            "subject": subject,
            "created_at": created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }))
    }

    /// Create `count` tickets starting at `first_id`, one hour apart from
    /// [`epoch`](Self::epoch).
    pub fn tickets(first_id: u64, count: usize, prefix: &str) -> Vec<Record> {
        (0..count)
            .map(|i| {
                let id = first_id + i as u64;
                let created_at = Self::epoch() + Duration::hours(i as i64);
                Self::ticket(id, &format!("{prefix} #{id}"), created_at)
            })
            .collect()
    }

    /// Create the extended view of a ticket.
    pub fn ticket_details(summary: &Record) -> Record {
        let mut fields = summary.clone().into_inner();
        fields.insert("status".to_string(), json!("open"));
        fields.insert("severity".to_string(), json!("high"));
        fields.insert(
            "description".to_string(),
            json!("Lookalike domain serving a credential harvesting page."),
        );
        fields.insert("tags".to_string(), json!(["phishing", "brand"]));
        Record::new(fields)
    }

    /// Create a vulnerability alert.
    pub fn vulnerability_alert(id: u64, cve: &str, created_at: NaiveDateTime) -> Record {
        record(json!({
            "id": id,
            "subject": format!("{cve} actively exploited"),
            "cve": cve,
            "created_at": created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }))
    }

    // =========================================================================
    // Catalog Fixtures
    // =========================================================================

    /// Create a catalog entry with a parent link.
    pub fn sector(id: u64, id_parent: u64, name: &str) -> Record {
        record(json!({ "id": id, "id_parent": id_parent, "name": name }))
    }

    /// Sector taxonomy with two levels.
    pub fn sectors() -> Vec<Record> {
        vec![
            Self::sector(1, 0, "Financial Services"),
            Self::sector(2, 1, "Banking"),
            Self::sector(3, 1, "Insurance"),
            Self::sector(4, 0, "Energy"),
            Self::sector(5, 4, "Oil & Gas"),
            Self::sector(6, 2, "Retail Banking"),
        ]
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    /// Create a default scenario with typical test data:
    /// one account, 103 DRP tickets (three pages of 50), five intelligence
    /// tickets, no service requests, two vulnerability alerts, details for
    /// the first DRP tickets, the sector catalog and a forbidden
    /// vulnerability catalog.
    pub fn default_scenario() -> DefaultScenario {
        let drp = Self::tickets(1000, 103, "Brand abuse");
        let intelligence = Self::tickets(2000, 5, "Intelligence report");
        let alerts = vec![
            Self::vulnerability_alert(3000, "CVE-2021-26855", Self::epoch()),
            Self::vulnerability_alert(3001, "CVE-2021-21972", Self::epoch() + Duration::days(1)),
        ];

        let tickets = drp.iter().take(5).map(Self::ticket_details).collect();

        DefaultScenario {
            accounts: vec![(DEFAULT_EMAIL.to_string(), DEFAULT_PASSWORD.to_string())],
            collections: vec![
                (Resource::Drp, drp),
                (Resource::Intelligence, intelligence),
                (Resource::ServiceRequests, vec![]),
                (Resource::VulnerabilityAlerts, alerts),
            ],
            tickets,
            catalogs: vec![("sectors".to_string(), Self::sectors())],
            forbidden_catalogs: vec!["vulnerabilities".to_string()],
        }
    }
}

impl From<DefaultScenario> for MockState {
    fn from(scenario: DefaultScenario) -> Self {
        let state = scenario
            .accounts
            .iter()
            .fold(MockState::new(), |s, (email, password)| s.with_account(email, password));
        let state = scenario
            .collections
            .into_iter()
            .fold(state, |s, (resource, records)| s.with_records(resource, records));
        let state = scenario.tickets.into_iter().fold(state, MockState::with_ticket);
        let state = scenario
            .catalogs
            .into_iter()
            .fold(state, |s, (name, entries)| s.with_catalog(&name, entries));
        scenario
            .forbidden_catalogs
            .iter()
            .fold(state, |s, name| s.with_forbidden_catalog(name))
    }
}

fn record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(fields) => Record::new(fields),
        _ => Record::default(),
    }
}
