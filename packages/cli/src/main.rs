use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use common::{BlobId, Statistics, Test, TestFilter, TestIdGenerator};
use store::Stores;
use store::config::AppConfig;
use store::images::sweep;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "packtest")]
#[command(about = "Packaging test records and evidence images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tests, newest first
    List(FilterArgs),
    /// Print one test as JSON
    Show { id: i64 },
    /// Add a test from a JSON file; an id of 0 gets a fresh one
    Add { file: PathBuf },
    /// Delete a test with its cases and failures
    Delete { id: i64 },
    /// Aggregate failure statistics
    Stats(FilterArgs),
    /// Store an image and print its id
    PutImage { file: PathBuf },
    /// Write the image with the given id to a file
    GetImage { id: String, out: PathBuf },
    /// Evict expired local images now
    Sweep,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    sku: Option<String>,
    /// Earliest test date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// Latest test date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,
}

impl From<FilterArgs> for TestFilter {
    fn from(args: FilterArgs) -> Self {
        TestFilter {
            brand: args.brand,
            sku: args.sku,
            from: args.from,
            to: args.to,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load config")?;

    let mut stores = Stores::open(&config).await.context("Failed to open stores")?;
    if !matches!(cli.command, Command::Sweep) {
        stores.start_eviction(&config);
    }

    let result = run(cli.command, &stores, &config).await;
    stores.shutdown().await.context("Failed to close stores")?;
    result
}

async fn run(command: Command, stores: &Stores, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Command::List(filter) => {
            let loaded = stores.records.load().await;
            info!(source = ?loaded.source, count = loaded.database.tests.len(), "Loaded tests");

            let filter = TestFilter::from(filter);
            for test in filter.apply(&loaded.database.tests) {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{} case(s)",
                    test.id,
                    test.date_of_test,
                    test.brand_name,
                    test.product_name,
                    test.product_sku,
                    test.cases.len()
                );
            }
        }
        Command::Show { id } => match stores.records.get_test_by_id(id).await {
            Some(test) => println!("{}", serde_json::to_string_pretty(&test)?),
            None => bail!("Test {id} not found"),
        },
        Command::Add { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut test: Test = serde_json::from_str(&raw).context("Invalid test JSON")?;
            if test.id == 0 {
                test.id = TestIdGenerator::new().next();
            }

            let id = test.id;
            let confirmed = stores
                .records
                .add_test(test)
                .await
                .with_context(|| format!("Test {id} saved locally, not yet synced"))?;
            println!("{}", confirmed.id);
        }
        Command::Delete { id } => {
            stores
                .records
                .delete_test(id)
                .await
                .with_context(|| format!("Test {id} removed locally, not yet synced"))?;
            println!("Deleted {id}");
        }
        Command::Stats(filter) => {
            let database = stores.records.get_database().await;
            let stats = Statistics::compute(&database.tests, &filter.into());
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::PutImage { file } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let id = stores.images.save_image(&data).await.context("Failed to store image")?;
            if !id.is_remote() {
                info!(%id, "Object storage unavailable, image kept locally");
            }
            println!("{id}");
        }
        Command::GetImage { id, out } => {
            let id: BlobId = id.parse()?;
            match stores.images.get_image(Some(&id)).await? {
                Some(data) => {
                    tokio::fs::write(&out, &data)
                        .await
                        .with_context(|| format!("Failed to write {}", out.display()))?;
                    println!("{} bytes written to {}", data.len(), out.display());
                }
                None => bail!("Image {id} not found"),
            }
        }
        Command::Sweep => {
            let removed = sweep(
                stores.images.local(),
                config.eviction.retention(),
                chrono::Utc::now().timestamp_millis(),
            )
            .await;
            println!("Evicted {removed} image(s)");
        }
    }
    Ok(())
}
