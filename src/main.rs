use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use censo_filter::analysis::{competition_table, top_n, value_counts};
use censo_filter::config::env_var;
use censo_filter::diagnostics::{DataQualityReport, sample};
use censo_filter::schema::census;
use censo_filter::utils::logging::console::{
    print_quality_report, print_sample_rows, print_schema_info, print_view_summary,
};
use censo_filter::{
    DatasetCache, DatasetConfig, DatasetLoader, Explorer, ExplorerConfig, KeyDerivation, Selections, Strategy,
};
use log::{error, info};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DatasetConfig::from_env().with_progress(true);
    if std::env::var_os("CENSO_DIAGNOSTICS").is_some() {
        return run_diagnostics(config);
    }
    let cache = DatasetCache::new();

    let dataset = match cache.get_or_load(&config) {
        Ok(dataset) => dataset,
        Err(e) if e.is_data_unavailable() => {
            error!("{e}");
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Failed to load census dataset"),
    };
    info!("Loaded {} records from {:?}", dataset.num_rows(), dataset.source());

    let selections = match env_var::<PathBuf>("CENSO_SELECTIONS") {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read selections from {}", path.display()))?;
            Selections::from_json(&text).context("Invalid selections")?
        }
        None => Selections::new(),
    };

    let strategy = std::env::var("CENSO_STRATEGY")
        .ok()
        .map(|s| s.parse::<Strategy>())
        .transpose()?
        .unwrap_or_default();
    let key_derivation = match std::env::var("CENSO_KEY_DERIVATION").ok().as_deref() {
        Some("dedup") => KeyDerivation::DeduplicatedRows,
        _ => KeyDerivation::FilteredRows,
    };
    info!("Evaluating with the {strategy} strategy");

    let evaluator = strategy.evaluator(&dataset)?;
    let explorer = Explorer::new(
        dataset,
        evaluator,
        ExplorerConfig::census().with_key_derivation(key_derivation),
    )
    .context("Explorer controls do not fit the dataset")?;

    let start = Instant::now();
    let views = explorer.run(&selections)?;
    print_view_summary(&views, start.elapsed());

    if views.institutions.is_empty() {
        println!("No institutions match the current filters");
    } else {
        print_sample_rows(views.institutions.batch(), 5);
    }

    if views.courses.is_empty() {
        println!("No courses match the current filters");
        return Ok(());
    }
    print_sample_rows(views.courses.batch(), 5);

    if views.courses.column(census::SG_UF).is_ok() {
        println!("Courses per state:");
        for (state, count) in value_counts(&views.courses, census::SG_UF)? {
            println!("  {state}: {count}");
        }
    }

    if views.courses.column(census::NO_CINE_AREA_ESPECIFICA).is_ok() {
        println!("Top knowledge areas:");
        for (area, count) in top_n(&views.courses, census::NO_CINE_AREA_ESPECIFICA, 15)? {
            println!("  {area}: {count}");
        }
    }

    println!("Most competitive courses:");
    for row in competition_table(&views.courses)?.iter().take(10) {
        println!(
            "  {} ({}): {:.2} candidates per seat",
            row.course.as_deref().unwrap_or("-"),
            row.institution.as_deref().unwrap_or("-"),
            row.candidates_per_seat
        );
    }

    Ok(())
}

/// Report on the untransformed dataset instead of running the explorer
fn run_diagnostics(config: DatasetConfig) -> anyhow::Result<()> {
    let dataset = match DatasetLoader::new(config).load_raw() {
        Ok(dataset) => dataset,
        Err(e) if e.is_data_unavailable() => {
            error!("{e}");
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Failed to load census dataset"),
    };

    print_schema_info(dataset.batch());
    print_quality_report(&DataQualityReport::from_dataset(&dataset));
    print_sample_rows(&sample(&dataset, 10), 10);
    Ok(())
}
