//! Countdown Timer CLI
//!
//! A countdown that can be paused and resumed, run in the terminal or
//! controlled through a background daemon.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use countdown::cli::{run_foreground, Cli, Commands, Display, IpcClient, SessionOutcome};
use countdown::daemon::run_daemon;
use countdown::types::CountdownConfig;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration and applies global flag overrides.
fn load_config(cli: &Cli) -> Result<CountdownConfig> {
    let mut config = CountdownConfig::load_or_default(cli.config.as_deref())
        .context("設定ファイルを読み込めません")?;
    if let Some(socket) = &cli.socket {
        config.socket_path = Some(socket.clone());
    }
    Ok(config)
}

/// Creates a client for the configured socket.
fn client(config: &CountdownConfig) -> Result<IpcClient> {
    let socket_path = config
        .resolve_socket_path()
        .context("ソケットパスを決定できません")?;
    Ok(IpcClient::with_socket_path(socket_path))
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let Some(command) = cli.command.clone() else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        generate_completions(shell);
        return Ok(());
    }

    let mut config = load_config(&cli)?;

    match command {
        Commands::Start(args) => {
            let response = client(&config)?.start(&args).await?;
            Display::show_start_success(&response);
        }
        Commands::Toggle => {
            let response = client(&config)?.toggle().await?;
            Display::show_toggle_success(&response);
        }
        Commands::Cancel => {
            let response = client(&config)?.cancel().await?;
            Display::show_cancel_success(&response);
        }
        Commands::Status => {
            let response = client(&config)?.status().await?;
            Display::show_status(&response);
        }
        Commands::Run(args) => {
            if args.no_sound {
                config.sound.enabled = false;
            }
            let duration = args.duration.unwrap_or(config.default_duration_seconds);
            if run_foreground(&config, duration).await? == SessionOutcome::Cancelled {
                std::process::exit(130);
            }
        }
        Commands::Daemon(args) => {
            if args.no_sound {
                config.sound.enabled = false;
            }
            run_daemon(config).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["countdown"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_load_config_socket_override() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("missing.json");
        let cli = Cli::parse_from([
            "countdown",
            "--config",
            config_path.to_str().unwrap(),
            "--socket",
            "/tmp/override.sock",
            "status",
        ]);

        let config = load_config(&cli).unwrap();

        assert_eq!(
            config.socket_path,
            Some(std::path::PathBuf::from("/tmp/override.sock"))
        );
        assert_eq!(config.default_duration_seconds, 60);
    }

    #[test]
    fn test_load_config_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();
        let cli = Cli::parse_from(["countdown", "--config", config_path.to_str().unwrap()]);

        assert!(load_config(&cli).is_err());
    }
}
