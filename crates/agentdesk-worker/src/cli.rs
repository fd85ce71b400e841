// Command-line arguments
//
// Every flag that carries configuration can also be set through the
// environment (including a .env file loaded before parsing).

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "agentdesk-worker")]
#[command(about = "AgentDesk worker - run persisted agents from the command line")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json"])]
    pub output: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one request against an agent
    Run(RunArgs),

    /// List providers with a registered LLM driver
    Providers,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Maximum database connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value = "5")]
    pub max_connections: u32,

    /// Agent to run
    #[arg(long)]
    pub agent_id: Uuid,

    /// User input
    #[arg(long, short)]
    pub input: String,

    /// Session whose history is loaded and extended
    #[arg(long)]
    pub session_id: Option<String>,

    /// Print text deltas as they arrive
    #[arg(long)]
    pub stream: bool,

    /// JSON schema the answer must follow
    #[arg(long)]
    pub output_schema: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let agent_id = Uuid::now_v7();
        let cli = Cli::try_parse_from([
            "agentdesk-worker",
            "--output",
            "json",
            "run",
            "--database-url",
            "postgres://localhost/agentdesk",
            "--agent-id",
            &agent_id.to_string(),
            "--input",
            "Hello",
            "--session-id",
            "s-1",
            "--stream",
        ])
        .unwrap();

        assert_eq!(cli.output, "json");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.agent_id, agent_id);
                assert_eq!(args.input, "Hello");
                assert_eq!(args.session_id.as_deref(), Some("s-1"));
                assert!(args.stream);
                assert!(args.output_schema.is_none());
                assert_eq!(args.max_connections, 5);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_invalid_agent_id() {
        let result = Cli::try_parse_from([
            "agentdesk-worker",
            "run",
            "--database-url",
            "postgres://localhost/agentdesk",
            "--agent-id",
            "not-a-uuid",
            "--input",
            "Hello",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_output_format() {
        let result = Cli::try_parse_from(["agentdesk-worker", "--output", "yaml", "providers"]);
        assert!(result.is_err());
    }
}
