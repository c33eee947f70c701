use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use fsgate::observability::init_tracing;
use fsgate::{Config, Gateway};

#[derive(Parser)]
#[command(
    name = "fsgate",
    version,
    about = "Policy-mediated filesystem tools for AI agents"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true, env = "FSGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tools as JSON-RPC over stdin/stdout.
    Serve,

    /// Print the tool descriptors as served to agents.
    Tools,

    /// Scan raw tool descriptions for directive content.
    AuditDescriptions,

    /// Read a file through the policy.
    Read {
        /// File path.
        path: String,
    },

    /// List a directory through the policy.
    List {
        /// Directory path.
        directory: String,
    },

    /// Classify a path without opening it.
    Check {
        /// File path.
        path: String,
    },

    /// Print a health report.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.logging.level, config.logging.format)
        .context("failed to initialize logging")?;

    let gateway = Gateway::from_config(config).context("failed to start gateway")?;

    match cli.command {
        Commands::Serve => {
            let server = gateway.stdio_server();
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            server
                .run(stdin, tokio::io::stdout())
                .await
                .context("stdio server failed")?;
        }
        Commands::Tools => {
            let descriptors = gateway.registry().descriptors();
            println!("{}", serde_json::to_string_pretty(&descriptors)?);
        }
        Commands::AuditDescriptions => {
            let reports = gateway.registry().audit_descriptions();
            let mut flagged = 0;
            for report in &reports {
                println!("{:<20} {}", report.tool, report.result.summary());
                for field in &report.flagged_fields {
                    println!("    in {field}");
                }
                for finding in &report.result.findings {
                    println!(
                        "    [{}] {}: {:?}",
                        finding.severity, finding.category, finding.matched_text
                    );
                }
                if !report.result.is_clean() {
                    flagged += 1;
                }
            }
            if flagged > 0 {
                anyhow::bail!("{flagged} tool description(s) contain directive content");
            }
        }
        Commands::Read { path } => {
            let ctx = gateway.default_context();
            println!("{}", gateway.executor().read_file(&path, &ctx).await);
        }
        Commands::List { directory } => {
            let ctx = gateway.default_context();
            println!("{}", gateway.executor().list_files(&directory, &ctx).await);
        }
        Commands::Check { path } => {
            let ctx = gateway.default_context();
            println!("{}", gateway.executor().check_file_safety(&path, &ctx));
        }
        Commands::Health => {
            println!("{}", serde_json::to_string(&gateway.health())?);
        }
    }

    Ok(())
}
