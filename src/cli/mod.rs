use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::storage;

pub mod commands;

use self::commands::{ListArgs, NewArgs, ShowArgs, ThemeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "vividblog",
    version,
    about = "Keyboard-first personal blog manager"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over VIVIDBLOG_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over VIVIDBLOG_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Publish a new post
    New(NewArgs),
    /// Print one page of posts
    List(ListArgs),
    /// Print a single post
    Show(ShowArgs),
    /// Print every category in use
    Categories,
    /// Show or toggle the display mode
    Theme(ThemeArgs),
    /// Delete all posts; the next start seeds the examples again
    Reset,
}

enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let command = cli.command.unwrap_or(Commands::Tui);
    let log_file = paths.log_file();
    let target = match command {
        Commands::Tui => LogTarget::File(&log_file),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = Arc::new(loader.load_or_init()?);
    let storage = storage::init(&config.storage)?;

    match command {
        Commands::Tui => {
            let mut app = App::new(config.clone(), storage.clone())?;
            commands::run_tui(&mut app)
        }
        Commands::New(args) => commands::new_post(&storage, args),
        Commands::List(args) => commands::list_posts(&config, &storage, args),
        Commands::Show(args) => commands::show_post(&storage, args),
        Commands::Categories => commands::list_categories(&storage),
        Commands::Theme(args) => commands::theme(&storage, args),
        Commands::Reset => commands::reset(&storage),
    }
}

fn init_tracing(level: &str, target: LogTarget<'_>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| -> Result<()> {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match target {
            LogTarget::Stderr => fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init(),
            LogTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
        }
        Ok(())
    })
    .map(|_| ())
}
