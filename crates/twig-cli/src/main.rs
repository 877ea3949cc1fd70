//! twig - Minimal todo manager with subtasks
//!
//! Todos live in two JSON files under the data directory.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod report;

#[derive(Parser)]
#[command(name = "twig")]
#[command(about = "Minimal todo manager with subtasks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to <config_dir>/twig/config.toml)
    #[arg(long, global = true, env = "TWIG_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the todo data
    #[arg(long, global = true, env = "TWIG_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a todo
    Add {
        /// Task text
        task: String,

        /// Due date (free text, e.g. 2024-01-31)
        #[arg(short, long)]
        due: Option<String>,

        /// Parent todo ID (creates a subtask)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Change a todo's text
    Edit {
        /// Todo ID
        id: String,

        /// New task text
        task: String,
    },

    /// Delete a todo and its subtasks
    #[command(alias = "delete")]
    Rm {
        /// Todo ID
        id: String,
    },

    /// Toggle a todo between pending and completed
    #[command(alias = "toggle")]
    Done {
        /// Todo ID
        id: String,
    },

    /// Expand or collapse a todo's subtasks
    Expand {
        /// Todo ID
        id: String,
    },

    /// Show todo details
    Show {
        /// Todo ID
        id: String,
    },

    /// List todos
    #[command(alias = "ls")]
    List {
        /// Filter by status (all, pending, completed)
        #[arg(short, long)]
        status: Option<String>,

        /// Case-insensitive search over task text and due date
        #[arg(short = 'q', long)]
        search: Option<String>,
    },

    /// Move a todo to a position in the display order
    Move {
        /// Todo ID
        id: String,

        /// 1-based target position
        position: usize,
    },

    /// Replace the manual order with the given IDs
    Order {
        /// Todo IDs, first to last
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Remove all todos
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show completion statistics
    Stats,

    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
    /// Reset to default configuration
    Reset,
    /// Get a specific config value
    Get {
        /// Config key (e.g., "id_prefix", "display.colors")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = commands::Context::new(cli.config, cli.data_dir, cli.json)?;

    match cli.command {
        Commands::Add { task, due, parent } => commands::add(&ctx, &task, due, parent),
        Commands::Edit { id, task } => commands::edit(&ctx, &id, &task),
        Commands::Rm { id } => commands::rm(&ctx, &id),
        Commands::Done { id } => commands::done(&ctx, &id),
        Commands::Expand { id } => commands::expand(&ctx, &id),
        Commands::Show { id } => commands::show(&ctx, &id),
        Commands::List { status, search } => commands::list(&ctx, status, search),
        Commands::Move { id, position } => commands::move_todo(&ctx, &id, position),
        Commands::Order { ids } => commands::order(&ctx, ids),
        Commands::Clear { yes } => commands::clear(&ctx, yes),
        Commands::Stats => commands::stats(&ctx),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(&ctx),
            Some(ConfigCommands::Path) => commands::config_path(&ctx),
            Some(ConfigCommands::Reset) => commands::config_reset(&ctx),
            Some(ConfigCommands::Get { key }) => commands::config_get(&ctx, &key),
            Some(ConfigCommands::Set { key, value }) => commands::config_set(&ctx, &key, &value),
        },
    }
}
