use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptshelf::cli::commands;
use promptshelf::cli::commands::run::RunAction;
use promptshelf::cli::util::{collect_vars, parse_var};

#[derive(Parser)]
#[command(name = "promptshelf")]
#[command(
    version,
    about = "Prompt library with guided, resumable prompt chains"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize promptshelf in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
    },

    /// Import chains from a YAML or JSON document
    Import {
        #[arg(help = "Chain document (.yaml, .yml, .json)")]
        file: PathBuf,
    },

    /// List chains in the catalog
    List {
        #[arg(long, short, help = "Filter by title or description")]
        search: Option<String>,
        #[arg(long, short, help = "Include unpublished chains")]
        all: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Show a chain and its steps
    Show {
        slug: String,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Work through a chain step by step
    Run {
        slug: String,
        #[command(subcommand)]
        action: Option<RunCommand>,
        #[arg(long = "var", global = true, value_parser = parse_var, help = "Variable value as NAME=VALUE")]
        vars: Vec<(String, String)>,
        #[arg(
            short = 'f',
            long,
            global = true,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Run the current step's prompt against the inference endpoint
    Exec {
        slug: String,
        #[arg(long = "var", value_parser = parse_var, help = "Variable value as NAME=VALUE")]
        vars: Vec<(String, String)>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Unlock a premium chain with wallet credits
    Purchase { slug: String },

    /// Show or top up the credit wallet
    Wallet {
        #[command(subcommand)]
        action: Option<WalletAction>,
    },

    /// Delete a chain (author or admin only)
    Delete { slug: String },

    /// Show project status
    Status {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Clean up promptshelf data
    Clean {
        #[arg(long, help = "Remove all promptshelf data")]
        all: bool,
        #[arg(long, help = "Only clear stored chain progress")]
        progress: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum RunCommand {
    /// Show the current step (default)
    Status,
    /// Mark the current step done and advance
    Complete,
    /// Go back one step
    Prev,
    /// Go to step N (1-based)
    Jump { step: usize },
    /// Clear progress and start over
    Reset,
}

impl From<RunCommand> for RunAction {
    fn from(cmd: RunCommand) -> Self {
        match cmd {
            RunCommand::Status => RunAction::Status,
            RunCommand::Complete => RunAction::Complete,
            RunCommand::Prev => RunAction::Previous,
            RunCommand::Jump { step } => RunAction::Jump(step),
            RunCommand::Reset => RunAction::Reset,
        }
    }
}

#[derive(Subcommand)]
enum WalletAction {
    /// Show balance and purchases (default)
    Balance {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Add credits
    Credit { amount: i64 },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json, toml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Edit configuration file with $EDITOR
    Edit {
        #[arg(long, short, help = "Edit global config")]
        global: bool,
    },
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mpromptshelf encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { force } => {
            commands::init::run(force)?;
        }
        Commands::Import { file } => {
            commands::import::run(&file)?;
        }
        Commands::List {
            search,
            all,
            format,
        } => {
            commands::chains::list(search, all, &format)?;
        }
        Commands::Show { slug, format } => {
            commands::chains::show(&slug, &format)?;
        }
        Commands::Run {
            slug,
            action,
            vars,
            format,
        } => {
            let action = action.map(RunAction::from).unwrap_or(RunAction::Status);
            commands::run::run(&slug, action, &collect_vars(vars), &format)?;
        }
        Commands::Exec { slug, vars, format } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::exec::run(&slug, &collect_vars(vars), &format))?;
        }
        Commands::Purchase { slug } => {
            commands::wallet::purchase(&slug)?;
        }
        Commands::Wallet { action } => match action {
            None => commands::wallet::balance("text")?,
            Some(WalletAction::Balance { format }) => commands::wallet::balance(&format)?,
            Some(WalletAction::Credit { amount }) => commands::wallet::credit(amount)?,
        },
        Commands::Delete { slug } => {
            commands::chains::delete(&slug)?;
        }
        Commands::Status { format } => {
            commands::status::run(&format)?;
        }
        Commands::Clean { all, progress } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::clean::run(all, progress))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Edit { global } => {
                commands::config::edit(global)?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    commands::config::init_global(force)?;
                } else {
                    commands::config::init_project()?;
                }
            }
        },
    }

    Ok(())
}
