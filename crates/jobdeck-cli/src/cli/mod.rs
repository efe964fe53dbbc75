//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use jobdeck_core::api::ApiClient;
use jobdeck_core::api::types::ApplicationStatus;
use jobdeck_core::config::Config;
use jobdeck_core::session::credentials::FileCredentialStore;
use jobdeck_core::session::{SessionController, SessionHandle};

mod commands;

#[derive(Parser)]
#[command(name = "jobdeck")]
#[command(version)]
#[command(about = "Job marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account and log in
    Register {
        /// Display name
        #[arg(long)]
        name: String,
        /// Account email
        #[arg(long)]
        email: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Account role: employer or candidate
        #[arg(long, default_value = "candidate")]
        role: String,
    },

    /// Log out (clears cached credentials)
    Logout,

    /// Show the current session
    Whoami,

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Edit the profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Browse job postings
    Jobs {
        #[command(subcommand)]
        command: JobsCommands,
    },

    /// Manage favorite jobs
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },

    /// Manage submitted applications
    Applications {
        #[command(subcommand)]
        command: ApplicationsCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum JobsCommands {
    /// Lists the job feed
    List {
        /// Page to fetch
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Results per page
        #[arg(long, default_value_t = 20)]
        per_page: u32,
        /// Keep loading pages until the feed is exhausted
        #[arg(long)]
        all: bool,
    },
    /// Searches job postings
    Search {
        /// Search terms
        #[arg(value_name = "QUERY")]
        query: String,
        /// Filter by location
        #[arg(long)]
        location: Option<String>,
        /// Flash jobs only
        #[arg(long)]
        flash: bool,
        /// Results per page
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },
}

#[derive(clap::Subcommand)]
enum FavoritesCommands {
    /// Flips a job in or out of the favorites set
    Toggle {
        /// The job posting id
        #[arg(value_name = "JOB_ID")]
        job_id: i64,
    },
}

#[derive(clap::Subcommand)]
enum ApplicationsCommands {
    /// Changes an application's status
    SetStatus {
        /// The application id
        #[arg(value_name = "APPLICATION_ID")]
        id: i64,
        /// New status: pending, reviewed, interview, accepted, or rejected
        #[arg(value_name = "STATUS")]
        status: ApplicationStatus,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Updates profile fields
    Update {
        /// New display name
        #[arg(long)]
        name: Option<String>,
        /// New headline
        #[arg(long)]
        headline: Option<String>,
        /// New location
        #[arg(long)]
        location: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("JOBDECK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // Config subcommands never need a session or the network.
    let command = match cli.command {
        Commands::Config { command } => {
            return match command {
                ConfigCommands::Path => commands::config::path(),
                ConfigCommands::Init => commands::config::init(),
            };
        }
        command => command,
    };

    let config = Config::load().context("load config")?;
    tracing::debug!(base_url = config.base_url(), "configuration loaded");
    let api = ApiClient::new(&config, SessionHandle::new()).context("build API client")?;
    let controller = SessionController::new(api, FileCredentialStore::at_default_path());

    // Optimistic restore: a cached session authenticates without a network
    // round-trip; commands run against whatever state results.
    controller.restore().await.context("restore session")?;

    match command {
        Commands::Login {
            email,
            password,
        } => commands::auth::login(&controller, &email, password).await,
        Commands::Register {
            name,
            email,
            password,
            role,
        } => commands::auth::register(&controller, &name, &email, password, &role).await,
        Commands::Logout => commands::auth::logout(&controller).await,
        Commands::Whoami => commands::auth::whoami(&controller),
        Commands::Refresh => commands::auth::refresh(&controller).await,

        Commands::Profile { command } => match command {
            ProfileCommands::Update {
                name,
                headline,
                location,
            } => commands::profile::update(&controller, name, headline, location).await,
        },

        Commands::Jobs { command } => match command {
            JobsCommands::List {
                page,
                per_page,
                all,
            } => commands::jobs::list(&controller, page, per_page, all).await,
            JobsCommands::Search {
                query,
                location,
                flash,
                per_page,
            } => commands::jobs::search(&controller, &query, location, flash, per_page).await,
        },

        Commands::Favorites { command } => match command {
            FavoritesCommands::Toggle { job_id } => {
                commands::favorites::toggle(&controller, job_id).await
            }
        },

        Commands::Applications { command } => match command {
            ApplicationsCommands::SetStatus { id, status } => {
                commands::applications::set_status(&controller, id, status).await
            }
        },

        Commands::Config { .. } => Ok(()),
    }
}
