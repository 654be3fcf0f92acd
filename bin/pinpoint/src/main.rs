mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pinpoint")]
#[command(about = "Point at page elements and hand annotated selections to an agent", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the browser tools over stdio (JSON-RPC / MCP)
    Serve,

    /// Open a page, wait for one annotated selection and print it
    Inspect {
        /// Page to open
        url: String,

        /// Seconds to wait for the operator
        #[arg(short, long, default_value_t = 300)]
        timeout: u64,
    },

    /// Inspect the tools exposed by `serve`
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },

    /// List device sizes available to resize_viewport
    Devices,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Check the environment (browser, config, profile directory)
    Doctor,
}

#[derive(Subcommand)]
enum ToolsCommands {
    /// List all tools
    List,
    /// Show the parameters of one tool
    Info {
        /// Tool name
        tool_name: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the tool protocol; logs go to stderr.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    match cli.command {
        Commands::Serve => {
            commands::serve::run().await?;
        }
        Commands::Inspect { url, timeout } => {
            commands::inspect::run(&url, timeout).await?;
        }
        Commands::Tools { command } => match command {
            ToolsCommands::List => {
                commands::tools_cmd::list().await?;
            }
            ToolsCommands::Info { tool_name } => {
                commands::tools_cmd::info(&tool_name).await?;
            }
        },
        Commands::Devices => {
            commands::devices::run().await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                commands::config_cmd::show().await?;
            }
            ConfigCommands::Init { force } => {
                commands::config_cmd::init(force).await?;
            }
            ConfigCommands::Path => {
                commands::config_cmd::path().await?;
            }
        },
        Commands::Doctor => {
            commands::doctor::run().await?;
        }
    }

    Ok(())
}
