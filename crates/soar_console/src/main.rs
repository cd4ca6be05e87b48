//! SOAR console launcher
//!
//! `soar-console` with no subcommand opens the dashboard. `status` prints a
//! one-shot summary, `config` shows the resolved configuration.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use soar_api::SoarApi;
use soar_console::config::{self, ConfigOverrides};
use soar_logging::LogConfig;

#[derive(Parser, Debug)]
#[command(name = "soar-console", version, about = "Terminal console for the SOAR backend")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Backend base URL
    #[arg(long, global = true, env = "SOAR_URL")]
    url: Option<String>,

    /// Seconds between background refreshes
    #[arg(long, global = true)]
    refresh_secs: Option<u64>,

    /// Never change the backend mode automatically
    #[arg(long, global = true)]
    no_advisor: bool,

    /// Config file (defaults to ~/.soar_console/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive dashboard (default)
    Tui,

    /// Fetch stats, cases and mode once and print a summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    // Parse CLI first to check if we're in TUI mode
    let cli = Cli::parse();
    let tui_mode = matches!(cli.command, None | Some(Commands::Tui));

    if let Err(err) = soar_logging::init_logging(LogConfig {
        app_name: "soar-console",
        verbose: cli.verbose,
        tui_mode,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Error: {:?}", err);
            ExitCode::from(1)
        }
    }
}

fn run_command(cli: Cli) -> Result<()> {
    let overrides = ConfigOverrides {
        base_url: cli.url,
        refresh_interval_secs: cli.refresh_secs,
        disable_advisor: cli.no_advisor,
    };
    let (config, config_path) = config::resolve(cli.config.as_deref(), &overrides)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("soar-console")
        .build()?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => runtime.block_on(soar_console::tui::run(config)),
        Commands::Status { json } => {
            let api = SoarApi::new(config.base_url.clone());
            runtime.block_on(soar_console::status::run(api, json))
        }
        Commands::Config { json } => config::run_config_command(&config, &config_path, json),
    }
}
