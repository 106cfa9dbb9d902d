//! Rapture CLI - AWS credential sessions backed by Vaulted.
//!
//! Commands that change the caller's environment print shell code on stdout
//! and must run through the wrapper function from `rapture shell-init`.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rapture_app::{EnvIdentity, IdentityReporter, Initializer, EXIT_FAILURE, EXIT_SUCCESS};
use rapture_common::{Environment, Error, ProcessEnv};
use rapture_config::{config_dir, config_file, RaptureConfig};
use rapture_session::SessionManager;
use rapture_shell::{wrapped_dialect, Dialect, ShellGenerator, ShellSink, TerminalSink};
use rapture_storage::LocalProvider;
use rapture_vaulted::{VaultProvider, VaultedCli};

/// Name the wrapper function invokes.
const PROGRAM: &str = "rapture";

#[derive(Parser)]
#[command(name = "rapture")]
#[command(about = "Rapture - AWS credential sessions from Vaulted vaults")]
#[command(version)]
struct Cli {
    /// Enable verbose logging (-vv for trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session with credentials from a vault.
    Init {
        /// Vault to load (default: $VAULTED_ENV, then the configured default).
        vault: Option<String>,
    },

    /// Show the active identity.
    Whoami,

    /// List the vaults Vaulted knows about.
    Vaults,

    /// Show the configuration.
    Config {
        /// Show only what the config file contains.
        #[arg(long)]
        raw: bool,
    },

    /// Print the shell function that wraps rapture.
    ShellInit {
        /// Shell to emit the function for: bash, zsh or fish.
        #[arg(default_value = "bash")]
        shell: Dialect,
    },
}

/// Where command output goes for this process.
enum Output {
    /// Wrapped: everything becomes shell code evaluated by the parent.
    Script(ShellGenerator),
    /// Plain terminal.
    Terminal(TerminalSink),
}

impl Output {
    fn for_env(env: &dyn Environment) -> Self {
        match wrapped_dialect(env) {
            Some(dialect) => {
                debug!(%dialect, "Running under the shell wrapper");
                Output::Script(ShellGenerator::new(dialect))
            }
            None => Output::Terminal(TerminalSink::stdio()),
        }
    }

    fn sink(&mut self) -> &mut dyn ShellSink {
        match self {
            Output::Script(generator) => generator,
            Output::Terminal(terminal) => terminal,
        }
    }

    /// Emit the collected script, if any.
    fn finish(self) -> Result<()> {
        if let Output::Script(generator) = self {
            generator
                .write_to(io::stdout().lock())
                .context("Failed to write shell script")?;
        }
        Ok(())
    }
}

// Single-threaded: the process environment is mutated during init.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Stdout is reserved for shell code, so logs go to stderr.
    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the logger")?;

    let mut env = ProcessEnv;
    let dir = config_dir().context("Failed to locate the config directory")?;
    let config_path = config_file(&dir);
    let config = RaptureConfig::load(&config_path, &env);
    debug!(path = %config_path.display(), ?config, "Loaded configuration");

    let mut output = Output::for_env(&env);
    let status = match cli.command {
        Commands::Init { vault } => {
            cmd_init(
                config,
                &dir,
                &config_path,
                vault.as_deref(),
                &mut env,
                output.sink(),
            )
            .await
        }

        Commands::Whoami => EnvIdentity::new(config).report(&env, output.sink()),

        Commands::Vaults => cmd_vaults(output.sink()).await,

        Commands::Config { raw } => cmd_config(&config, &config_path, raw, output.sink()),

        Commands::ShellInit { shell } => {
            output.sink().echo(shell.wrapper(PROGRAM).trim_end());
            EXIT_SUCCESS
        }
    };
    output.finish()?;

    Ok(exit_code(status))
}

fn exit_code(status: i32) -> ExitCode {
    u8::try_from(status).map(ExitCode::from).unwrap_or(ExitCode::FAILURE)
}

/// Load a vault into a fresh session.
async fn cmd_init(
    config: RaptureConfig,
    dir: &Path,
    config_path: &Path,
    vault: Option<&str>,
    env: &mut dyn Environment,
    shell: &mut dyn ShellSink,
) -> i32 {
    let reporter = EnvIdentity::new(config.clone());
    let sessions = SessionManager::new(Arc::new(LocalProvider::new(dir)));
    let mut initializer =
        Initializer::new(config, config_path, Arc::new(VaultedCli::new()), sessions);

    initializer.run(vault, env, shell, &reporter).await
}

/// List vault names, one per line.
async fn cmd_vaults(shell: &mut dyn ShellSink) -> i32 {
    let vaulted = VaultedCli::new();
    if !vaulted.is_available().await {
        shell.err_echo(&format!("ERROR: can't find '{}' in your path", vaulted.name()));
        return EXIT_FAILURE;
    }

    match vaulted.list_vaults().await {
        Ok(names) => {
            for name in names {
                shell.echo(&name);
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            shell.err_echo(&format!("ERROR: Could not load list of vaults: {}", e));
            EXIT_FAILURE
        }
    }
}

/// Print the effective or raw configuration as JSON.
fn cmd_config(
    config: &RaptureConfig,
    config_path: &Path,
    raw: bool,
    shell: &mut dyn ShellSink,
) -> i32 {
    let rendered = if raw {
        RaptureConfig::load_raw(config_path).and_then(|raw| {
            let value = serde_json::json!({
                "path": config_path,
                "exists": raw.exists,
                "config": raw.config,
            });
            Ok(serde_json::to_string_pretty(&value)?)
        })
    } else {
        serde_json::to_string_pretty(config).map_err(Error::from)
    };

    match rendered {
        Ok(json) => {
            shell.echo(&json);
            EXIT_SUCCESS
        }
        Err(e) => {
            shell.err_echo(&format!("ERROR: {}", e));
            EXIT_FAILURE
        }
    }
}
