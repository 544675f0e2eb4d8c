//! Mergefeed CLI - command-line interface for the pull request mirror.

mod commands;
mod config;
mod progress;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "mergefeed")]
#[command(version)]
#[command(about = "A read-through cache for merged pull requests")]
#[command(
    long_about = "Mergefeed mirrors the merged pull requests of registered repositories into a \
local database and serves keyset-paginated pages over them. Pages missing \
locally are backfilled from GitHub on demand, and a forward sync catches \
newly merged pull requests from the per-repository watermark."
)]
#[command(after_long_help = r#"EXAMPLES
    Store your identity and GitHub token:
        $ mergefeed login --github-user-id 583231 --username octocat --token ghp_...

    Register a repository for syncing:
        $ mergefeed register --github-repo-id 1296269 --full-name octocat/hello-world

    Read the first page, backfilling from GitHub as needed:
        $ mergefeed page <repository-id> --limit 30

    Catch up on newly merged pull requests with live progress:
        $ mergefeed sync <repository-id> --stream

CONFIGURATION
    Mergefeed reads configuration from:
      1. ~/.config/mergefeed/config.toml (or $XDG_CONFIG_HOME/mergefeed/config.toml)
      2. Environment variables (MERGEFEED_* prefix)
      3. .env file in the current directory

ENVIRONMENT VARIABLES
    MERGEFEED_DATABASE_URL    Database connection string
    MERGEFEED_MEMBER_ID       Default member id for all commands
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Store a member identity and GitHub access token
    Login {
        /// GitHub numeric user id
        #[arg(long)]
        github_user_id: i64,
        /// GitHub login
        #[arg(long)]
        username: String,
        /// Avatar URL
        #[arg(long)]
        avatar_url: Option<String>,
        /// GitHub personal access token
        #[arg(long)]
        token: String,
    },
    /// Register a repository for the member
    Register {
        /// GitHub numeric repository id
        #[arg(long)]
        github_repo_id: i64,
        /// Full name in owner/repo form
        #[arg(long)]
        full_name: String,
        /// Web URL of the repository
        #[arg(long)]
        html_url: Option<String>,
        /// Whether the repository is private
        #[arg(long)]
        private: bool,
        /// Member id (defaults to the configured member)
        #[arg(long)]
        member: Option<Uuid>,
    },
    /// Read one page of merged pull requests
    Page {
        /// Repository id
        repository: Uuid,
        /// Page size
        #[arg(long, default_value_t = 30)]
        limit: usize,
        /// Cursor: merge timestamp of the last item of the previous page (RFC 3339)
        #[arg(long)]
        cursor_merged_at: Option<String>,
        /// Cursor: number of the last item of the previous page
        #[arg(long)]
        cursor_number: Option<i32>,
        /// Emit items as they become visible instead of one final page
        #[arg(long)]
        stream: bool,
        /// Print raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
        /// Member id (defaults to the configured member)
        #[arg(long)]
        member: Option<Uuid>,
    },
    /// Sync newly merged pull requests since the watermark
    Sync {
        /// Repository id
        repository: Uuid,
        /// Emit per-item progress instead of one final report
        #[arg(long)]
        stream: bool,
        /// Print raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
        /// Member id (defaults to the configured member)
        #[arg(long)]
        member: Option<Uuid>,
    },
    /// Refresh a single pull request from GitHub
    Refresh {
        /// Repository id
        repository: Uuid,
        /// Pull request number
        number: i32,
        /// Member id (defaults to the configured member)
        #[arg(long)]
        member: Option<Uuid>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine; any other read error is not worth dying for.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate { action } => {
            let direction = match action {
                MigrateAction::Up => commands::migrate::Direction::Up,
                MigrateAction::Down => commands::migrate::Direction::Down,
                MigrateAction::Status => commands::migrate::Direction::Status,
                MigrateAction::Fresh => commands::migrate::Direction::Fresh,
            };
            commands::migrate::run(direction).await
        }
        Commands::Login {
            github_user_id,
            username,
            avatar_url,
            token,
        } => commands::login::run(github_user_id, &username, avatar_url.as_deref(), &token).await,
        Commands::Register {
            github_repo_id,
            full_name,
            html_url,
            private,
            member,
        } => {
            commands::register::run(member, github_repo_id, &full_name, html_url.as_deref(), private)
                .await
        }
        Commands::Page {
            repository,
            limit,
            cursor_merged_at,
            cursor_number,
            stream,
            json,
            member,
        } => {
            commands::page::run(
                member,
                repository,
                limit,
                cursor_merged_at.as_deref(),
                cursor_number,
                stream,
                json,
            )
            .await
        }
        Commands::Sync {
            repository,
            stream,
            json,
            member,
        } => commands::sync::run(member, repository, stream, json).await,
        Commands::Refresh {
            repository,
            number,
            member,
        } => commands::refresh::run(member, repository, number).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mergefeed", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {e}", console::style("error:").red().bold());
        std::process::exit(1);
    }
}
