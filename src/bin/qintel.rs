//! QuoIntelligence API CLI binary.
//!
//! A command-line interface for pulling tickets from the QuoIntelligence API.

use std::process::ExitCode;

use clap::Parser;
use qintel::cli::{Cli, Command, WindowArgs};
use qintel::{render_tree, ClientConfig, PrettyPrint, QiClient, QiError, Record, Resource};
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = match connect(&cli).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            if matches!(e, QiError::Config(_)) {
                eprintln!("Hint: Set QI_API_EMAIL and QI_API_PASSWORD environment variables");
            }
            return ExitCode::FAILURE;
        }
    };

    match run(&client, &cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "qintel=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect(cli: &Cli) -> qintel::Result<QiClient> {
    let mut config = ClientConfig::from_env_with(cli.email.clone(), cli.password.clone())?;
    if let Some(url) = &cli.url {
        config = config.with_base_url(url.clone());
    }
    if let Some(cert) = &cli.cert {
        config = config.with_client_cert(cert.clone());
    }
    QiClient::connect(config).await
}

async fn run(client: &QiClient, cli: &Cli) -> qintel::Result<()> {
    if let Some((resource, args)) = cli.command.collection() {
        return handle_collection(client, resource, args, cli.json).await;
    }

    match &cli.command {
        Command::Ticket { id } => {
            let ticket = client.ticket(*id).await?;
            output_single(&ticket, cli.json)
        }
        Command::Catalog { name, tree } => {
            let entries = client.catalog(name.as_str()).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if *tree {
                print!("{}", render_tree(&entries));
            } else {
                output_rows(&entries);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn handle_collection(
    client: &QiClient,
    resource: Resource,
    args: &WindowArgs,
    json: bool,
) -> qintel::Result<()> {
    let query = args.to_query()?;
    let mut pager = client.query(resource, &query)?;
    let limit = args.limit.unwrap_or(usize::MAX);

    let mut records = Vec::new();
    while records.len() < limit {
        match pager.next_record().await? {
            Some(record) => records.push(record),
            None => break,
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        output_rows(&records);
        println!("\n{} {} ({} requests)", records.len(), resource, pager.requests());
    }
    Ok(())
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> qintel::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_rows(records: &[Record]) {
    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    println!("{}", Table::new(rows));
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct RecordRow {
    id: String,
    subject: String,
}

impl From<&Record> for RecordRow {
    fn from(r: &Record) -> Self {
        Self {
            id: r.id().map(|id| id.to_string()).unwrap_or_default(),
            subject: r.subject().unwrap_or_default().to_string(),
        }
    }
}
