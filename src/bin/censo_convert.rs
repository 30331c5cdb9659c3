//! Convert the census CSV extract into a Parquet snapshot
//!
//! Paths come from `CENSO_CSV` and `CENSO_PARQUET`, defaulting to the files
//! the explorer looks for.

use anyhow::Context;
use censo_filter::{DatasetConfig, convert_csv_to_parquet};
use log::info;

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DatasetConfig::from_env();
    info!(
        "Converting {} to {}",
        config.csv_path.display(),
        config.parquet_path.display()
    );

    let rows = convert_csv_to_parquet(&config.csv_path, &config.parquet_path, config.batch_size)
        .with_context(|| format!("Failed to convert {}", config.csv_path.display()))?;

    println!(
        "Wrote {} rows to {}",
        rows,
        config.parquet_path.display()
    );
    Ok(())
}
