use anyhow::Context;
use tracing::info;

use meso_fetcher::logging;
use meso_fetcher::storage::{self, mysql::MySqlDropStore};
use meso_fetcher::{FetcherConfig, MesoFetcher, RunOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing_default();

    let config = FetcherConfig::from_env().context("Invalid fetcher configuration")?;
    info!(
        "Tracing missing meso drops (min items = {}, meso item = {})",
        config.minimum_item_count, config.currency_item_id
    );

    let stats = storage::open_stat_catalog(&config).context("Failed to open stat catalog")?;

    let drops = MySqlDropStore::new(&config.database_url).context("Invalid DATABASE_URL")?;

    let fetcher = MesoFetcher::new(config, Box::new(stats), Box::new(drops));
    let report = fetcher.run().await?;

    match &report.outcome {
        RunOutcome::ScriptWritten(summary) => info!(
            "Generated {} meso drop entries at {}",
            summary.rows,
            summary.path.display()
        ),
        RunOutcome::UpToDate => info!("Nothing to do"),
    }
    if report.unknown_ids > 0 {
        info!("{} droppers were skipped (not in stat catalog)", report.unknown_ids);
    }

    let elapsed_ms = report.elapsed.as_millis();
    info!("Elapsed time: {} ms ({} s)", elapsed_ms, elapsed_ms / 1000);

    Ok(())
}
