use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use colored::Colorize;
use configmanager::{Config, ConfigManager, Context, Path, ProviderInfo, ProviderRegistry};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Main CLI structure for the configmanager application.
///
/// Reads configuration files and secrets through the providers named in
/// the `configManager` section of the configuration.
#[derive(Parser)]
#[command(name = "configmanager")]
#[command(about = "Read configuration files and secrets through pluggable providers", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to config.toml in the user configuration directory)
    #[arg(short, long, global = true, env = "CONFIGMANAGER_CONFIG")]
    config: Option<PathBuf>,
    /// Increase log output (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the configmanager CLI.
#[derive(Subcommand)]
enum Commands {
    /// List the available providers
    Providers,
    #[command(flatten)]
    Manager(ManagerCommand),
}

/// Commands reading through a configuration manager.
#[derive(Subcommand)]
enum ManagerCommand {
    /// Resolve a context to the form used by the file provider
    ResolveContext {
        /// Context to resolve (the default context if omitted)
        context: Option<String>,
    },
    /// Print the content of a configuration file
    GetFile {
        /// Path of the file
        path: String,
        /// Context to read the file from
        #[arg(short = 'C', long)]
        context: Option<String>,
    },
    /// Check whether a configuration file exists
    ContainsFile {
        /// Path of the file
        path: String,
        /// Context to look in
        #[arg(short = 'C', long)]
        context: Option<String>,
    },
    /// List the configuration files in a directory
    ListFiles {
        /// Path of the directory
        path: String,
        /// Context to list
        #[arg(short = 'C', long)]
        context: Option<String>,
        /// Print the result as JSON array
        #[arg(long)]
        json: bool,
    },
    /// Print the value of a secret
    GetSecret {
        /// Path of the secret
        path: String,
    },
    /// Print a configuration setting
    Get {
        /// Dotted key of the setting
        key: String,
    },
}

/// Installs the log subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_manager(config_path: Option<PathBuf>) -> Result<ConfigManager> {
    let config = match config_path {
        Some(path) => Config::try_from(path.as_path())
            .wrap_err_with(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load_default().wrap_err("Failed to load configuration")?,
    };
    ConfigManager::create_with_builtins(config).wrap_err("Failed to create configuration manager")
}

fn print_providers(title: &str, providers: &[ProviderInfo]) {
    println!("{}", title.bold());
    for info in providers {
        println!("  {}", info.display_with_examples());
    }
}

/// Main entry point for the configmanager CLI application.
fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Providers => {
            let registry = ProviderRegistry::with_builtins();
            print_providers("File providers:", &registry.file_providers());
            println!();
            print_providers("Secret providers:", &registry.secret_providers());
            Ok(())
        }
        Commands::Manager(command) => run(command, &load_manager(cli.config)?),
    }
}

/// Executes a command that needs a configuration manager.
fn run(command: ManagerCommand, manager: &ConfigManager) -> Result<()> {
    match command {
        ManagerCommand::ResolveContext { context } => {
            let context = context.map(Context::new);
            let resolved = manager
                .resolve_context(context.as_ref())
                .wrap_err("Failed to resolve context")?;
            println!("{}", resolved);
        }
        ManagerCommand::GetFile { path, context } => {
            let context = context.map(Context::new);
            let mut reader = manager
                .get_file(context.as_ref(), &Path::new(path))
                .wrap_err("Failed to get file")?;
            let mut stdout = io::stdout().lock();
            io::copy(&mut reader, &mut stdout).wrap_err("Failed to read file")?;
            stdout.flush()?;
        }
        ManagerCommand::ContainsFile { path, context } => {
            let context = context.map(Context::new);
            let exists = manager
                .contains_file(context.as_ref(), &Path::new(path))
                .wrap_err("Failed to check file")?;
            println!("{}", exists);
        }
        ManagerCommand::ListFiles {
            path,
            context,
            json,
        } => {
            let context = context.map(Context::new);
            let mut files: Vec<Path> = manager
                .list_files(context.as_ref(), &Path::new(path))
                .wrap_err("Failed to list files")?
                .into_iter()
                .collect();
            files.sort();

            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                for file in files {
                    println!("{}", file);
                }
            }
        }
        ManagerCommand::GetSecret { path } => {
            let secret = manager
                .get_secret(&Path::new(path))
                .wrap_err("Failed to get secret")?;
            println!("{}", secret);
        }
        ManagerCommand::Get { key } => {
            let value = manager.get_string(&key).wrap_err("Failed to get setting")?;
            println!("{}", value);
        }
    }

    Ok(())
}
