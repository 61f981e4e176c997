mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "feedwire-cli")]
#[command(about = "feedwire operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run the fetch stage once.
    Fetch {
        /// Print the articles in the window instead of enqueuing them.
        /// Reads no watermark and records no run.
        #[arg(long)]
        dry_run: bool,
        /// Window length for a dry run, in minutes (defaults to FEEDWIRE_LOOKBACK_MINUTES).
        #[arg(
            long,
            value_parser = clap::value_parser!(i64).range(1..=feedwire_core::MAX_LOOKBACK_MINUTES)
        )]
        lookback_minutes: Option<i64>,
    },
    /// Delete dedup records older than the retention period.
    Sweep,
    /// Show the most recent fetch runs.
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };
    let config = feedwire_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; cancelling");
            on_ctrl_c.cancel();
        }
    });

    match command {
        Commands::Db { command } => {
            let pool = feedwire_db::connect_pool_from_config(&config).await?;
            match command {
                DbCommands::Ping => {
                    feedwire_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = feedwire_db::run_migrations(&pool).await?;
                    println!("migrations applied: {applied}");
                }
            }
        }
        Commands::Fetch {
            dry_run: true,
            lookback_minutes,
        } => commands::run_fetch_preview(&config, lookback_minutes, &cancel).await?,
        Commands::Fetch { dry_run: false, .. } => commands::run_fetch(&config, &cancel).await?,
        Commands::Sweep => commands::run_sweep(&config, &cancel).await?,
        Commands::Runs { limit } => commands::list_runs(&config, limit).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
