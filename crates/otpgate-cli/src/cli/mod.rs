//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use otpgate_core::config::{self, Config};
use otpgate_core::logging;

mod commands;

#[derive(Parser)]
#[command(name = "otpgate")]
#[command(version)]
#[command(about = "Log in with a mobile number and a one-time password")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in (interactive unless --mobile is given)
    Login {
        /// Mobile number for a non-interactive login
        #[arg(long, value_name = "NUMBER")]
        mobile: Option<String>,

        /// OTP code (read from stdin when omitted)
        #[arg(long, value_name = "CODE", requires = "mobile")]
        otp: Option<String>,
    },

    /// Remove the stored session
    Logout,

    /// Show the stored session
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set a single key, e.g. `api.base_url https://...`
    Set {
        /// Dotted key
        #[arg(value_name = "KEY")]
        key: String,
        /// New value
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // config commands must work even when the file is broken
    let command = match cli.command {
        Some(Commands::Config { command }) => return config_command(command),
        other => other,
    };

    let config = Config::load().context("load config")?;
    let _log_guard = match logging::init_file_logging(&config::paths::logs_dir(), &config.log_level)
    {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled: {e:#}");
            None
        }
    };

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(command, &config).await })
}

async fn dispatch(command: Option<Commands>, config: &Config) -> Result<()> {
    match command {
        None | Some(Commands::Login { mobile: None, .. }) => {
            commands::auth::login_interactive(config).await
        }
        Some(Commands::Login {
            mobile: Some(mobile),
            otp,
        }) => commands::auth::login_scripted(config, &mobile, otp).await,
        Some(Commands::Logout) => commands::auth::logout(),
        Some(Commands::Status) => commands::auth::status(config),
        Some(Commands::Config { command }) => config_command(command),
    }
}

fn config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            commands::config::path();
            Ok(())
        }
        ConfigCommands::Init => commands::config::init(),
        ConfigCommands::Set { key, value } => commands::config::set(&key, &value),
    }
}
