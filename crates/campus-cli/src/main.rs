use anyhow::Result;
use campus_core::user::Role;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "campus")]
#[command(about = "Campus admin client - manage school user accounts", long_about = None)]
struct Cli {
    /// Use this config file instead of ~/.config/campus-admin/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the access token
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored access token
    Logout,
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Show account statistics
    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List all users
    List,
    /// Show the full detail of a user
    Show { id: String },
    /// Create a user
    Create {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student")]
        role: Role,
        #[arg(long)]
        email: Option<String>,
    },
    /// Change a user's username or email
    Update {
        id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a user
    Delete { id: String },
    /// Edit detail fields, e.g. `student_info.major=Physics`
    Patch {
        id: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Record attendance, e.g. `2024-05-01=present`
    Attendance {
        id: String,
        #[arg(required = true)]
        entries: Vec<String>,
    },
}

#[derive(Subcommand)]
enum StatsAction {
    /// Number of accounts per role
    Count,
    /// Growth per role between two dates
    Growth {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = Context::load(cli.config, cli.base_url)?;
    let uses_token = matches!(cli.command, Commands::Users { .. } | Commands::Stats { .. });

    let result = match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&ctx, &username, &password).await
        }
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Users { action } => match action {
            UsersAction::List => commands::users::list(&ctx).await,
            UsersAction::Show { id } => commands::users::show(&ctx, &id).await,
            UsersAction::Create {
                username,
                password,
                role,
                email,
            } => commands::users::create(&ctx, username, password, role, email).await,
            UsersAction::Update {
                id,
                username,
                email,
            } => commands::users::update(&ctx, &id, username, email).await,
            UsersAction::Delete { id } => commands::users::delete(&ctx, &id).await,
            UsersAction::Patch { id, fields } => commands::users::patch(&ctx, &id, &fields).await,
            UsersAction::Attendance { id, entries } => {
                commands::users::attendance(&ctx, &id, &entries).await
            }
        },
        Commands::Stats { action } => match action {
            StatsAction::Count => commands::stats::count(&ctx).await,
            StatsAction::Growth { from, to } => commands::stats::growth(&ctx, from, to).await,
        },
    };

    if uses_token {
        return ctx.finish(result);
    }
    result
}
