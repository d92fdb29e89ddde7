//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the qintel binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::{QiError, Result};
use crate::query::TicketQuery;
use crate::resources::Resource;

/// QuoIntelligence API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "qintel", about = "QuoIntelligence API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Log requests to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Account email (defaults to QI_API_EMAIL).
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Account password (defaults to QI_API_PASSWORD).
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// API base URL (defaults to QI_API_URL, then the production endpoint).
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// PEM client certificate (defaults to QI_API_CLIENT_CERT).
    #[arg(long, global = true)]
    pub cert: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query brand protection (DRP) tickets.
    Drp(WindowArgs),

    /// Query intelligence tickets.
    Intelligence(WindowArgs),

    /// Query service request tickets.
    ServiceRequests(WindowArgs),

    /// Query vulnerability alerts.
    #[command(alias = "vulnerability-alerts")]
    VulnAlerts(WindowArgs),

    /// Get extended details for a single ticket.
    Ticket {
        /// The ticket id.
        id: u64,
    },

    /// Fetch a reference catalog (e.g. sectors, vulnerabilities).
    Catalog {
        /// Catalog name.
        name: String,

        /// Render entries as a tree using their `id_parent` links.
        #[arg(long)]
        tree: bool,
    },
}

impl Command {
    /// Ticket collection and window arguments, for the collection commands.
    pub fn collection(&self) -> Option<(Resource, &WindowArgs)> {
        match self {
            Self::Drp(args) => Some((Resource::Drp, args)),
            Self::Intelligence(args) => Some((Resource::Intelligence, args)),
            Self::ServiceRequests(args) => Some((Resource::ServiceRequests, args)),
            Self::VulnAlerts(args) => Some((Resource::VulnerabilityAlerts, args)),
            Self::Ticket { .. } | Self::Catalog { .. } => None,
        }
    }
}

/// Time window and filter arguments shared by collection commands.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Relative window, e.g. 15m, 1h, 30d.
    #[arg(long)]
    pub since: Option<String>,

    /// Start of an explicit range (date or date-time).
    #[arg(long, requires = "until")]
    pub from: Option<String>,

    /// End of an explicit range (date or date-time).
    #[arg(long, requires = "from")]
    pub until: Option<String>,

    /// Extra query parameter as key=value (repeatable).
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Stop after this many records.
    #[arg(long)]
    pub limit: Option<usize>,
}

impl WindowArgs {
    /// Build the ticket query these arguments describe.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Validation`] for `--param` values without `=`.
    pub fn to_query(&self) -> Result<TicketQuery> {
        let mut query = TicketQuery {
            since: self.since.clone(),
            ..TicketQuery::default()
        };
        if let (Some(from), Some(until)) = (&self.from, &self.until) {
            query = query.with_date_range(from.clone(), until.clone());
        }
        for param in &self.params {
            let (key, value) = param
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| {
                    QiError::Validation(format!("--param expects KEY=VALUE, got `{param}`"))
                })?;
            query = query.param(key, value);
        }
        Ok(query)
    }
}
