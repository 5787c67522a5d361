//! tarmac - Main entry point.
//!
//! A thin operator tool over the persistence layer: list tables, describe a
//! table, or run a parameterized statement. Output is JSON on stdout.

use tarmac::config::{Command, Config};
use tarmac::models::{ConnectionConfig, Value};
use tarmac::{ConnectionManager, SchemaInspector};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays pure JSON
    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(
    config: &Config,
    conn: &ConnectionManager,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let output = match &config.command {
        Command::Tables => serde_json::to_value(SchemaInspector::list_tables(conn, None).await?)?,
        Command::Describe { table } => {
            serde_json::to_value(SchemaInspector::describe_table(conn, table).await?)?
        }
        Command::Query { sql, params } => {
            let params: Vec<Value> = params.iter().map(|p| Value::parse_loose(p)).collect();
            serde_json::to_value(conn.query(sql, &params).await?)?
        }
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    // Initialize logging
    init_tracing(&config);

    let conn_config = ConnectionConfig::from_url(&config.database)?;
    info!(
        target_db = %conn_config.masked_connection_string(),
        "Starting tarmac v{}",
        env!("CARGO_PKG_VERSION")
    );

    let conn = ConnectionManager::connect(conn_config).await.map_err(|e| {
        if let Some(suggestion) = e.suggestion() {
            eprintln!("Hint: {}", suggestion);
        }
        e
    })?;

    let result = run(&config, &conn).await;
    conn.close().await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e)
        }
    }
}
