//! CLI entry and dispatch.

use anyhow::Result;
use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "tusk")]
#[command(version)]
#[command(about = "Companion CLI for the tusk task API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with an email or username
    Login {
        /// Email or username
        #[arg(long)]
        identifier: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log out (clear the stored session)
    Logout,

    /// Register a new account (email is verified with an OTP)
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        #[arg(long = "first-name", default_value = "")]
        first_name: String,

        #[arg(long = "last-name", default_value = "")]
        last_name: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Reset a forgotten password (email is verified with an OTP)
    ResetPassword {
        #[arg(long)]
        email: String,

        /// New password (read from stdin when omitted)
        #[arg(long = "new-password")]
        new_password: Option<String>,
    },

    /// Create tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum TaskCommands {
    /// Create a task from structured fields
    New {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Priority: high, medium or low
        #[arg(long, default_value = "medium")]
        priority: String,

        /// Due date as YYYY-MM-DD (requires --time)
        #[arg(long)]
        date: Option<String>,

        /// Due time as HH:MM (requires --date)
        #[arg(long)]
        time: Option<String>,

        /// Task type/category label
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Create a task from a natural-language prompt
    Prompt {
        /// Free-text description of the task
        prompt: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the config file path
    Path,
    /// Create a config file with the default template
    Init,
}

/// Parses arguments and runs the selected command to completion.
///
/// # Errors
/// Returns an error when the command fails; `main` renders it.
pub fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login {
            identifier,
            password,
        } => commands::auth::login(&identifier, password).await,
        Commands::Logout => commands::auth::logout(),
        Commands::Register {
            email,
            username,
            first_name,
            last_name,
            password,
        } => commands::auth::register(&email, &username, &first_name, &last_name, password).await,
        Commands::ResetPassword {
            email,
            new_password,
        } => commands::auth::reset_password(&email, new_password).await,
        Commands::Task { command } => match command {
            TaskCommands::New {
                title,
                description,
                priority,
                date,
                time,
                kind,
            } => commands::task::new_task(&title, &description, &priority, date, time, kind).await,
            TaskCommands::Prompt { prompt } => commands::task::from_prompt(prompt).await,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
        },
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
