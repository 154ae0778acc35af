//! CLI for hashing and verifying passwords.
//!
//! ## Usage
//!
//! ```bash
//! # Hash a password (prompts on a terminal, otherwise reads one line of stdin)
//! pwdhash
//!
//! # Verify a password against a stored hash
//! pwdhash '$argon2id$v=19$m=65536,t=3,p=4$...'
//!
//! # Hash with bcrypt, or with heavier Argon2id settings
//! pwdhash --algorithm bcrypt --cost 12
//! pwdhash --paranoid
//!
//! # Generate shell completions
//! source <(COMPLETE=bash pwdhash)
//! ```

use std::io::{self, BufRead, IsTerminal};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use inquire::{InquireError, Password, PasswordDisplayMode};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use pwdhash::{Algorithm, Config, DEFAULT_CONFIG, PARANOID_CONFIG, PwdHashError};

/// Hash a password, or verify one against a stored hash (Argon2id, bcrypt)
#[derive(Debug, Parser)]
#[command(name = "pwdhash", version, about, long_about = None)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Encoded hash to verify the password against; omit to print a new hash
    #[arg(value_name = "HASH")]
    hash: Option<String>,

    /// Hashing algorithm (argon2id or bcrypt)
    #[arg(short, long, env = "PWDHASH_ALGORITHM", value_name = "NAME")]
    algorithm: Option<Algorithm>,

    /// Argon2id memory in KiB
    #[arg(short, long, env = "PWDHASH_MEMORY", value_name = "KIB")]
    memory: Option<u32>,

    /// Argon2id iterations
    #[arg(short, long, env = "PWDHASH_TIME", value_name = "N")]
    time: Option<u32>,

    /// Argon2id parallel lanes
    #[arg(short = 'p', long, env = "PWDHASH_THREADS", value_name = "N")]
    threads: Option<u8>,

    /// bcrypt cost (4-31)
    #[arg(short, long, env = "PWDHASH_COST", value_name = "N")]
    cost: Option<u32>,

    /// Start from the paranoid preset instead of the default one
    #[arg(long, conflicts_with_all = ["memory", "time", "threads", "cost"])]
    paranoid: bool,

    /// Log hashing decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

const AFTER_HELP: &str = "\
SHELL COMPLETIONS:
  Bash (~/.bashrc):
    source <(COMPLETE=bash pwdhash)

  Zsh (~/.zshrc):
    source <(COMPLETE=zsh pwdhash)

  Fish (~/.config/fish/config.fish):
    COMPLETE=fish pwdhash | source

EXAMPLES:
  pwdhash                              # Prompt for a password and hash it
  echo \"secret\" | pwdhash              # Hash a password from stdin
  pwdhash '$argon2id$v=19$...'          # Verify a password against a hash
  pwdhash --algorithm bcrypt --cost 12  # Hash with bcrypt
";

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read password: {0}")]
    Prompt(#[from] InquireError),

    #[error("failed to read password from stdin: {0}")]
    Stdin(#[from] io::Error),

    #[error("no password on stdin")]
    EmptyInput,

    #[error(transparent)]
    Hash(#[from] PwdHashError),
}

fn main() -> ExitCode {
    // Check for shell completion generation before parsing args
    if let Ok(shell_name) = std::env::var("COMPLETE") {
        return generate_completions(&shell_name);
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = build_config(cli);
    tracing::debug!(%config, verify = cli.hash.is_some(), "effective configuration");
    pwdhash::set_config(config);

    let password = read_password()?;

    match cli.hash.as_deref() {
        Some(encoded) => {
            pwdhash::validate(&password, encoded)?;
            println!("Password is valid");
        }
        None => {
            let encoded = pwdhash::hash(&password)?;
            println!("{}", pwdhash::get_config());
            println!("Password hash: {encoded}");
        }
    }

    Ok(())
}

/// Applies command-line overrides on top of the chosen preset.
fn build_config(cli: &Cli) -> Config {
    let mut config = if cli.paranoid {
        PARANOID_CONFIG
    } else {
        DEFAULT_CONFIG
    };

    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(memory) = cli.memory {
        config.memory = memory;
    }
    if let Some(time) = cli.time {
        config.time = time;
    }
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    if let Some(cost) = cli.cost {
        config.cost = cost;
    }

    config
}

/// Prompts on a terminal; otherwise takes the first line of stdin.
fn read_password() -> Result<String, CliError> {
    if io::stdin().is_terminal() {
        return Ok(Password::new("Enter Password:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Hidden)
            .prompt()?);
    }

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(CliError::EmptyInput);
    }

    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    Ok(trimmed.strip_suffix('\r').unwrap_or(trimmed).to_string())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Generate shell completions.
fn generate_completions(shell_name: &str) -> ExitCode {
    let shell = match shell_name.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "powershell" => Shell::PowerShell,
        "elvish" => Shell::Elvish,
        _ => {
            eprintln!(
                "Unknown shell: {shell_name}. Supported: bash, zsh, fish, powershell, elvish"
            );
            return ExitCode::FAILURE;
        }
    };

    clap_complete::generate(shell, &mut Cli::command(), "pwdhash", &mut io::stdout());
    ExitCode::SUCCESS
}
