use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agentdesk_storage::{create_db_agent_store, create_db_message_store, Database};
use agentdesk_worker::cli::{Cli, Commands};
use agentdesk_worker::{build_driver_registry, run_agent, RunReport};

#[tokio::main]
async fn main() -> Result<()> {
    // Loaded before parsing so that .env values feed the `env` arguments
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentdesk_worker=info,agentdesk_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded .env from {:?}", path);
    }

    let cli = Cli::parse();
    let drivers = build_driver_registry();

    match cli.command {
        Commands::Providers => {
            let mut providers: Vec<_> = drivers
                .registered_providers()
                .into_iter()
                .map(|p| p.to_string())
                .collect();
            providers.sort();
            if cli.output == "json" {
                println!("{}", serde_json::to_string_pretty(&providers)?);
            } else {
                for provider in providers {
                    println!("{}", provider);
                }
            }
        }
        Commands::Run(args) => {
            tracing::info!(agent_id = %args.agent_id, "agentdesk-worker starting...");

            let db = Database::connect(&args.database_url, args.max_connections)
                .await
                .context("Failed to connect to database")?;
            db.migrate()
                .await
                .context("Failed to run session message migrations")?;
            let memory = Arc::new(create_db_message_store(db.clone()));
            let store = Arc::new(create_db_agent_store(db));

            let output = run_agent(&args, store, memory, Arc::new(drivers)).await?;
            let report = RunReport::new(&args, output);

            if cli.output == "json" {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                if !args.stream {
                    println!("{}", report.text);
                }
                for call in &report.tool_calls {
                    eprintln!("tool call requested: {} {}", call.name, call.arguments);
                }
            }
        }
    }

    Ok(())
}
