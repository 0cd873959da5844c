//! rri-client - Command-line client for RRI
//!
//! Runs a batch file of queries or starts an interactive shell.

mod commands;
mod repl;

use clap::Parser;
use colored::Colorize;
use commands::OutputFormat;
use rri_client::{Client, ConnectionConfig, CredentialSource, Credentials, StaticCredentials};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rri-client")]
#[command(about = "Client application for RRI")]
#[command(version)]
struct Cli {
    /// Address and port like host:51131 of the RRI host
    #[arg(env = "RRI_ADDRESS")]
    address: String,

    /// Input file containing RRI queries separated by a '=-=' line
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Print all sent and received messages (passwords are masked)
    #[arg(short, long)]
    verbose: bool,

    /// RRI user to use for login
    #[arg(short, long, env = "RRI_USER")]
    user: Option<String>,

    /// RRI password to use for login
    #[arg(short = 'p', long = "pass", env = "RRI_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print responses as JSON
    #[arg(long)]
    json: bool,

    /// Connect timeout in seconds
    #[arg(long, default_value = "10")]
    connect_timeout: u64,

    /// Request timeout in seconds (0 disables it)
    #[arg(long, default_value = "60")]
    request_timeout: u64,
}

impl Cli {
    fn credentials(&self) -> StaticCredentials {
        StaticCredentials::new(Credentials {
            address: self.address.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
        })
    }

    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let credentials = cli.credentials().load_credentials()?;
    let login = credentials.login()?;

    let request_timeout = match cli.request_timeout {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let config = ConnectionConfig::new(credentials.address.clone())
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout))
        .with_request_timeout(request_timeout);

    let connected = if cli.verbose {
        Client::connect_with_observer(config, Arc::new(commands::print_traffic)).await
    } else {
        Client::connect(config).await
    };
    let client = connected.map_err(|e| {
        eprintln!("{}: {}", "Connection failed".red(), e);
        e
    })?;

    let result = run(&client, &cli, login).await;

    client.close().await?;

    if let Err(e) = result {
        if !commands::is_reported(e.as_ref()) {
            eprintln!("{}: {}", "FATAL".red(), e);
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    client: &Client,
    cli: &Cli,
    login: Option<(&str, &str)>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some((user, password)) = login {
        client.login(user, password).await?;
    }

    match &cli.file {
        Some(path) => commands::run_file(client, path, cli.output_format()).await,
        None => repl::run(client, cli.output_format()).await,
    }
}
