//! `FluxConn` CLI - Command-line surface for the `FluxConn` connection registry
//!
//! Exposes the host commands over the registry: listing (refresh), adding,
//! editing, deleting (with confirmation), switching, and testing connections.
//! Add/edit/test run through the same message-driven edit workflow the panel
//! surface uses.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use fluxconn_core::{
    ActiveConnection, ConnectionRecord, ConnectionRegistry, ConnectionStore, ConnectionTester,
    EditForm, EditMessage, EditSession, EditSurface, MessageCommand, MessageOutcome, RecordVersion,
    TestError, TestResult, TreeNotifier, TreeSync,
};
use uuid::Uuid;

/// `FluxConn` command-line interface for managing data-source connections
#[derive(Parser)]
#[command(name = "fluxconn-cli")]
#[command(author, version, about = "FluxConn command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List all connections
    #[command(about = "List all connections in the registry")]
    List,

    /// Add a new connection
    #[command(about = "Add a new connection and make it active")]
    Add {
        /// Name for the new connection
        #[arg(short, long)]
        name: String,

        /// Endpoint address (host and port); falls back to the configured
        /// default endpoint when this is the first connection
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Authentication token
        #[arg(short, long, default_value = "")]
        token: String,

        /// Organization identifier
        #[arg(short, long, default_value = "")]
        org: String,

        /// Mark the connection as the legacy record shape
        #[arg(long)]
        legacy: bool,
    },

    /// Edit an existing connection
    #[command(about = "Edit a connection; saving switches the selection to it")]
    Edit {
        /// Connection name or UUID
        target: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New endpoint address
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// New authentication token
        #[arg(short, long)]
        token: Option<String>,

        /// New organization identifier
        #[arg(short, long)]
        org: Option<String>,
    },

    /// Delete a connection
    #[command(about = "Delete a connection")]
    Delete {
        /// Connection name or UUID
        target: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Switch the active connection
    #[command(about = "Make a connection the active one")]
    Switch {
        /// Connection name or UUID
        target: String,
    },

    /// Test connection connectivity
    #[command(about = "Test connectivity to a connection's endpoint")]
    Test {
        /// Connection name or UUID
        target: String,

        /// Connection timeout in seconds
        #[arg(short = 'T', long, default_value = "10")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = match cli.config {
        Some(dir) => ConnectionStore::with_config_dir(dir),
        None => ConnectionStore::new()?,
    };
    let settings = store.load_settings()?;
    init_tracing(&settings.log_filter);

    let notifier = TreeNotifier::new();
    let tree = TreeSync::new(notifier.clone());
    let mut registry = ConnectionRegistry::new(store, ActiveConnection::new(), notifier);

    match cli.command {
        Commands::List => cmd_list(&tree, &mut registry),
        Commands::Add {
            name,
            host,
            token,
            org,
            legacy,
        } => cmd_add(&mut registry, &settings.default_endpoint, name, host, token, org, legacy).await,
        Commands::Edit {
            target,
            name,
            host,
            token,
            org,
        } => cmd_edit(&mut registry, &target, name, host, token, org).await,
        Commands::Delete { target, yes } => cmd_delete(&mut registry, &target, yes),
        Commands::Switch { target } => cmd_switch(&mut registry, &target),
        Commands::Test { target, timeout } => cmd_test(&mut registry, &target, timeout).await,
    }
}

fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Edit surface for a terminal session; the form is driven by flags instead
/// of a panel, so opening and closing only leave a trace.
struct HeadlessSurface;

impl EditSurface for HeadlessSurface {
    fn open(&mut self, form: &EditForm) {
        tracing::debug!(name = %form.name, "edit form opened");
    }

    fn close(&mut self) {
        tracing::debug!("edit form closed");
    }
}

/// Reachability probe standing in for the query-engine client
struct TcpTester {
    timeout: Duration,
}

#[async_trait]
impl ConnectionTester for TcpTester {
    async fn test(&self, record: &ConnectionRecord) -> TestResult<()> {
        let endpoint = endpoint_addr(&record.host_and_port);
        match tokio::time::timeout(self.timeout, tokio::net::TcpStream::connect(&endpoint)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(TestError::Failed(format!("{endpoint}: {e}"))),
            Err(_) => Err(TestError::Failed(format!("{endpoint}: connection timed out"))),
        }
    }
}

/// Normalizes an endpoint string to a `host:port` address
///
/// Strips an `http(s)://` scheme and any path, and appends the default
/// query-engine port when none is given.
fn endpoint_addr(host_and_port: &str) -> String {
    let stripped = host_and_port
        .strip_prefix("https://")
        .or_else(|| host_and_port.strip_prefix("http://"))
        .unwrap_or(host_and_port);
    let stripped = stripped.split('/').next().unwrap_or(stripped);
    if stripped.contains(':') {
        stripped.to_string()
    } else {
        format!("{stripped}:8086")
    }
}

/// Resolves a connection by UUID or unique display name
fn resolve(
    registry: &mut ConnectionRegistry,
    target: &str,
) -> Result<ConnectionRecord, Box<dyn std::error::Error>> {
    if let Ok(id) = Uuid::parse_str(target) {
        if let Some(record) = registry.get(id)? {
            return Ok(record);
        }
        return Err(format!("No connection with ID {id}").into());
    }

    let mut matches: Vec<ConnectionRecord> = registry
        .list()?
        .into_iter()
        .filter(|r| r.name == target)
        .collect();
    match matches.len() {
        0 => Err(format!("No connection named '{target}'").into()),
        1 => Ok(matches.remove(0)),
        n => Err(format!("{n} connections named '{target}'; use the UUID instead").into()),
    }
}

fn cmd_list(
    tree: &TreeSync,
    registry: &mut ConnectionRegistry,
) -> Result<(), Box<dyn std::error::Error>> {
    let nodes = tree.nodes(registry)?;
    if nodes.is_empty() {
        println!("No connections configured.");
        return Ok(());
    }

    println!(
        "{:<1} {:<20} {:<28} {:<12} {:<4} ID",
        "", "NAME", "HOST", "ORG", "VER"
    );
    for node in nodes {
        let record = node.record();
        let version = match record.version {
            RecordVersion::V1 => "v1",
            RecordVersion::V2 => "v2",
        };
        println!(
            "{:<1} {:<20} {:<28} {:<12} {:<4} {}",
            if node.is_active() { "*" } else { "" },
            node.label(),
            record.host_and_port,
            record.org,
            version,
            node.id()
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_add(
    registry: &mut ConnectionRegistry,
    default_endpoint: &Option<String>,
    name: String,
    host: Option<String>,
    token: String,
    org: String,
    legacy: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = match host {
        Some(host) => host,
        None if registry.is_empty()? => default_endpoint
            .clone()
            .ok_or("No --host given and no default endpoint configured")?,
        None => return Err("--host is required".into()),
    };

    if registry.name_in_use(&name, None)? {
        eprintln!("Warning: a connection named '{name}' already exists");
    }

    let mut session =
        EditSession::begin_new(HeadlessSurface, registry, default_endpoint.as_deref())?;
    let message = EditMessage {
        command: MessageCommand::Save,
        conn_id: String::new(),
        conn_version: i64::from(legacy),
        conn_name: name,
        conn_host: host,
        conn_token: token,
        conn_org: org,
    };

    let tester = TcpTester {
        timeout: Duration::from_secs(10),
    };
    match session.handle_message(registry, &tester, message).await? {
        MessageOutcome::Saved(record) => {
            println!("Added connection '{}' ({})", record.name, record.id);
            println!("'{}' is now the active connection", record.name);
            Ok(())
        }
        outcome => Err(format!("Unexpected outcome: {outcome:?}").into()),
    }
}

async fn cmd_edit(
    registry: &mut ConnectionRegistry,
    target: &str,
    name: Option<String>,
    host: Option<String>,
    token: Option<String>,
    org: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let current = resolve(registry, target)?;

    let new_name = name.unwrap_or_else(|| current.name.clone());
    if new_name != current.name && registry.name_in_use(&new_name, Some(current.id))? {
        eprintln!("Warning: a connection named '{new_name}' already exists");
    }

    let message = EditMessage {
        command: MessageCommand::Save,
        conn_id: current.id.to_string(),
        conn_version: i64::from(current.version == RecordVersion::V1),
        conn_name: new_name,
        conn_host: host.unwrap_or_else(|| current.host_and_port.clone()),
        conn_token: token.unwrap_or_else(|| current.token.clone()),
        conn_org: org.unwrap_or_else(|| current.org.clone()),
    };

    let mut session = EditSession::begin_edit(HeadlessSurface, &current);
    let tester = TcpTester {
        timeout: Duration::from_secs(10),
    };
    match session.handle_message(registry, &tester, message).await? {
        MessageOutcome::Saved(record) => {
            println!("Updated connection '{}' ({})", record.name, record.id);
            println!("'{}' is now the active connection", record.name);
            Ok(())
        }
        outcome => Err(format!("Unexpected outcome: {outcome:?}").into()),
    }
}

fn cmd_delete(
    registry: &mut ConnectionRegistry,
    target: &str,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = resolve(registry, target)?;

    if !yes && !confirm(&format!("Delete connection '{}'?", record.name))? {
        println!("Aborted.");
        return Ok(());
    }

    registry.delete(record.id)?;
    println!("Deleted connection '{}'", record.name);
    Ok(())
}

fn cmd_switch(
    registry: &mut ConnectionRegistry,
    target: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = resolve(registry, target)?;
    registry.switch_active(record.id)?;
    println!("'{}' is now the active connection", record.name);
    Ok(())
}

async fn cmd_test(
    registry: &mut ConnectionRegistry,
    target: &str,
    timeout: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = resolve(registry, target)?;

    let mut session = EditSession::begin_edit(HeadlessSurface, &record);
    let message = EditMessage {
        command: MessageCommand::Test,
        conn_id: record.id.to_string(),
        conn_version: i64::from(record.version == RecordVersion::V1),
        conn_name: record.name.clone(),
        conn_host: record.host_and_port.clone(),
        conn_token: record.token.clone(),
        conn_org: record.org.clone(),
    };

    let tester = TcpTester {
        timeout: Duration::from_secs(timeout),
    };
    match session.handle_message(registry, &tester, message).await? {
        MessageOutcome::TestPassed => {
            println!("Success");
            Ok(())
        }
        MessageOutcome::TestFailed(reason) => Err(reason.into()),
        outcome => Err(format!("Unexpected outcome: {outcome:?}").into()),
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt} [y/N]: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
