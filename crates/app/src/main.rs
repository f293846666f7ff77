use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use quiz_app::config::{Cli, Command, Config, ImportArgs, prepare_sqlite_file};
use quiz_app::http::{AppState, router};
use quiz_app::telemetry::init_tracing;
use services::{AppServices, Clock, ImportSources};

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn serve(config: &Config, services: AppServices) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(AppState::new(services)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn import(services: &AppServices, args: &ImportArgs) -> anyhow::Result<()> {
    let sources = ImportSources::new(&args.questions)
        .with_supplementary(&args.ai_questions)
        .reclassify(args.reclassify);
    let report = services.import().reload(&sources).await?;

    println!(
        "imported {} questions ({}: {}, skipped {})",
        report.total(),
        report.primary.path.display(),
        report.primary.inserted,
        report.primary.skipped,
    );
    if let Some(ai) = &report.supplementary {
        println!(
            "  {}: {}, skipped {}",
            ai.path.display(),
            ai.inserted,
            ai.skipped
        );
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = Config::from_cli(&cli)?;
    prepare_sqlite_file(&config.db_url)?;
    let services = AppServices::new_sqlite(&config.db_url, Clock::default_clock(), config.session_ttl)
        .await
        .with_context(|| format!("failed to open {}", config.db_url))?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, services).await,
        Command::Import(args) => import(&services, &args).await,
        Command::Seed => {
            let inserted = services.import().seed_samples().await?;
            println!("seeded {inserted} sample questions into {}", config.db_url);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
