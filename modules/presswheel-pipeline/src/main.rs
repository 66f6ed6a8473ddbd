use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use presswheel_common::Config;
use presswheel_pipeline::{
    generator::HttpGenerator, run_audit, supply::JsonFileSupply, AuditMode, Orchestrator,
    PipelineDeps, RunBudget,
};
use presswheel_store::PgStore;

#[derive(Parser)]
#[command(name = "presswheel", about = "Generation admission pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one admission pass: schedule, dedup, generate, gate, commit.
    Run {
        /// Override TARGET_COUNT for this invocation.
        #[arg(long)]
        target: Option<usize>,
    },
    /// Sweep recent published artifacts for semantic duplicates.
    Audit {
        #[arg(long, value_enum, default_value_t = AuditModeArg::NearDuplicate)]
        mode: AuditModeArg,
        /// Unpublish flagged duplicates instead of only reporting them.
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AuditModeArg {
    NearDuplicate,
    TopicOverlap,
}

impl From<AuditModeArg> for AuditMode {
    fn from(arg: AuditModeArg) -> Self {
        match arg {
            AuditModeArg::NearDuplicate => AuditMode::NearDuplicate,
            AuditModeArg::TopicOverlap => AuditMode::TopicOverlap,
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("presswheel=info".parse()?);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let started = Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Command::Run { target } => {
            info!("presswheel run starting...");
            let mut config = Config::run_from_env()?;
            if let Some(target) = target {
                config.tunables.target_count = target;
            }
            config.log_redacted();

            let store = Arc::new(PgStore::connect(&config.database_url).await?);
            store.migrate().await?;

            let deps = PipelineDeps::from_store(
                store,
                Arc::new(JsonFileSupply::new(&config.clusters_path)),
                Arc::new(HttpGenerator::new(
                    &config.generator_url,
                    config.generator_token.clone(),
                )?),
            );
            let budget = RunBudget::started_at(
                started,
                Duration::from_secs(config.run_budget_secs),
                Duration::from_secs(config.per_item_cost_secs),
            );

            let stats = Orchestrator::new(deps, config.tunables.clone())
                .run(&budget)
                .await?;
            info!("presswheel run complete. {stats}");
        }
        Command::Audit { mode, apply } => {
            info!("presswheel audit starting...");
            let config = Config::audit_from_env()?;
            config.log_redacted();

            let store = PgStore::connect(&config.database_url).await?;
            store.migrate().await?;

            let report = run_audit(&store, &config.tunables, mode.into(), apply).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
