use centerboard::cli::{Cli, Command, Format};
use centerboard::config::Settings;
use centerboard::core::leaderboard::{Envelope, Leaderboards};
use centerboard::core::templates;
use centerboard::directory::{client::DocumentStore, memory::InMemoryDirectory, StudentDirectory};
use centerboard::error::BoardResult;
use centerboard::scheduler::{JobProcess, Scheduler};
use centerboard::storage::{DirectoryCache, SystemClock};

use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = Settings::new(&cli)?;

    // Logs go to stderr, stdout carries the leaderboards.
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(settings.get_trace_level())
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let directory: Arc<dyn StudentDirectory> = match &settings.store_fixture {
        Some(path) => Arc::new(InMemoryDirectory::from_json_file(path)?),
        None => {
            info!("Reading students from {}.", settings.store_base_url);
            Arc::new(DocumentStore::new(
                settings.store_base_url.clone(),
                settings.store_timeout(),
                settings.store_api_token.clone(),
            )?)
        }
    };
    let cache = DirectoryCache::new(directory, settings.cache_options(), Arc::new(SystemClock));
    let leaderboards = Leaderboards::new(cache);

    let force = cli.force;
    let output = match cli.command.unwrap_or(Command::Center) {
        Command::Class { class_id } => {
            let result = leaderboards.class_leaderboard(&class_id, force).await;
            render(cli.format, result, templates::class)?
        }
        Command::Grade { grade } => {
            let result = leaderboards.grade_leaderboard(grade, force).await;
            render(cli.format, result, templates::grade)?
        }
        Command::Center => {
            let result = leaderboards.center_leaderboard(force).await;
            render(cli.format, result, templates::center)?
        }
        Command::Student { classes, grade } => {
            let result = leaderboards.all_leaderboards(&classes, grade, force).await;
            render(cli.format, result, templates::all)?
        }
        Command::Watch => {
            watch(leaderboards, &settings.refresh_schedule).await?;
            return Ok(());
        }
    };

    println!("{output}");
    Ok(())
}

fn render<T: Serialize>(
    format: Format,
    result: BoardResult<T>,
    as_text: fn(&T) -> BoardResult<String>,
) -> BoardResult<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(&Envelope::from(result))?),
        Format::Text => match result {
            Ok(leaderboard) => as_text(&leaderboard),
            Err(e) => templates::unavailable("Requested", &e.to_string()),
        },
    }
}

async fn watch(leaderboards: Leaderboards, schedule: &str) -> BoardResult<()> {
    let mut sched = Scheduler::new(leaderboards).await?;

    let jobs = vec![
        JobProcess::WarmCache, // only ran once, at startup.
        JobProcess::RefreshCache(schedule),
    ];
    for job in jobs {
        sched.add_job(job).await?;
    }

    info!("Starting scheduler, refreshing students on '{schedule}'.");
    sched.start().await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for shutdown signal. {e}");
    }
    info!("Shutting down scheduler.");
    sched.shutdown().await
}
