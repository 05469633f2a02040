use std::path::PathBuf;
use std::process::Command as ProcessCommand;

use anyhow::{bail, Context, Result};
use bqswap_core::config::Config;
use bqswap_core::locate;
use bqswap_core::pipeline::{self, MigrationOptions, StepStatus};
use bqswap_core::schema;
use bqswap_core::warehouse::Warehouse;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replace a BigQuery table with the freshest local CSV export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full load-and-swap sequence
    Run(RunArgs),
    /// Show the source table's columns, partitioning, and clustering
    Inspect,
    /// Print the CSV file a run would load
    Locate,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Keep attempting the remaining remote steps after one fails
    #[arg(long)]
    keep_going: bool,
    /// TOML column list that replaces the source schema
    #[arg(long)]
    schema_file: Option<PathBuf>,
    /// Run `gcloud auth application-default login` first
    #[arg(long)]
    login: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args).await,
        Command::Inspect => handle_inspect().await,
        Command::Locate => handle_locate(),
    }
}

fn load_config() -> Result<Config> {
    dotenvy::dotenv().ok();
    Config::from_env().context("failed to load configuration from the environment")
}

async fn handle_run(args: RunArgs) -> Result<()> {
    let config = load_config()?;

    if args.login {
        gcloud_login()?;
    }

    let warehouse = Warehouse::connect(&config.project_id, config.service_account_key.as_deref())
        .await
        .context("failed to connect to BigQuery")?;

    let options = MigrationOptions {
        keep_going: args.keep_going,
        schema_override: args.schema_file,
    };

    let report = pipeline::run(&warehouse, &config, &options).await;

    println!(
        "Migration finished in {}s:",
        (report.finished_at - report.started_at).num_seconds()
    );
    for step in &report.steps {
        match &step.status {
            StepStatus::Completed(detail) => {
                println!("  ok      {:<24} {detail}", step.step.label());
            }
            StepStatus::Failed(message) => {
                println!("  FAILED  {:<24} {message}", step.step.label());
            }
            StepStatus::Skipped => {
                println!("  skipped {}", step.step.label());
            }
        }
    }

    if !report.succeeded() {
        bail!("migration completed with failures");
    }
    Ok(())
}

async fn handle_inspect() -> Result<()> {
    let config = load_config()?;

    let warehouse = Warehouse::connect(&config.project_id, config.service_account_key.as_deref())
        .await
        .context("failed to connect to BigQuery")?;

    let mut source = warehouse
        .get_table(&config.dataset_id, &config.source_table_id)
        .await?;
    let columns = schema::columns_from_table(&source)?;

    let mut display = comfy_table::Table::new();
    display.set_header(vec!["column", "type"]);
    for column in &columns {
        display.add_row(vec![
            column.name.clone(),
            schema::field_type_name(&column.field_type).to_string(),
        ]);
    }

    println!("{}", config.qualified(&config.source_table_id));
    println!("{display}");

    match source.time_partitioning.take() {
        Some(partitioning) => println!(
            "time partitioning: {} on {}",
            partitioning.r#type,
            partitioning
                .field
                .unwrap_or_else(|| "_PARTITIONTIME".to_string())
        ),
        None => println!("time partitioning: none"),
    }
    match source.clustering.take().and_then(|clustering| clustering.fields) {
        Some(fields) => println!("clustering: {}", fields.join(", ")),
        None => println!("clustering: none"),
    }

    Ok(())
}

fn handle_locate() -> Result<()> {
    let config = load_config()?;
    match locate::most_recent_csv(&config.downloads_dir) {
        Some(path) => println!("{}", path.display()),
        None => println!("No CSV files found in {}", config.downloads_dir.display()),
    }
    Ok(())
}

fn gcloud_login() -> Result<()> {
    info!("delegating authentication to gcloud");
    let status = ProcessCommand::new("gcloud")
        .args(["auth", "application-default", "login"])
        .status()
        .context("failed to launch gcloud")?;
    if !status.success() {
        bail!("gcloud auth application-default login exited with {status}");
    }
    Ok(())
}
