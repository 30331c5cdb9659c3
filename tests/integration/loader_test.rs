use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use censo_filter::diagnostics::DataQualityReport;
use censo_filter::schema::census;
use censo_filter::{CensoError, DataSource, DatasetCache, DatasetConfig, DatasetLoader, convert_csv_to_parquet};

fn write_census_csv(dir: &Path) -> PathBuf {
    let path = dir.join("dados_reduzidos.csv");
    let mut file = File::create(&path).unwrap();
    writeln!(
        file,
        "CO_IES,NO_IES,SG_UF_IES,TP_REDE,IGC,Ano IGC,TP_GRAU_ACADEMICO,TP_MODALIDADE_ENSINO,NO_CURSO,QT_VG_TOTAL,QT_INSCRITO_TOTAL"
    )
    .unwrap();
    writeln!(file, "1,Universidade A,SC,1,4,2021,1.0,1,Direito,50,200").unwrap();
    writeln!(file, "1,Universidade A,SC,1,4,2021,2,2,Letras,40,").unwrap();
    writeln!(file, "2,Faculdade B,SP,2,SC,2019,3,1,Direito,30,90").unwrap();
    writeln!(file, "3,Instituto C,RS,9,,,7,,Medicina,,").unwrap();
    path
}

#[test]
fn test_csv_fallback_applies_census_transform() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_census_csv(dir.path());
    let config = DatasetConfig::new(dir.path().join("dados_mec.parquet"), &csv);

    let dataset = DatasetLoader::new(config).load().unwrap();
    assert_eq!(dataset.source(), &DataSource::Csv(csv));
    assert_eq!(dataset.num_rows(), 4);

    let ids = dataset.column(census::CO_IES).unwrap();
    let ids = ids.as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(ids.value(2), 2);

    let igc = dataset.column(census::IGC).unwrap();
    let igc = igc.as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(igc.value(0), 4.0);
    assert!(igc.is_null(2), "'SC' in a score column is missing");
    assert!(igc.is_null(3), "empty score is missing");

    let network = dataset.column(census::TP_REDE).unwrap();
    let network = network.as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(network.value(0), "Pública");
    assert_eq!(network.value(2), "Privada");
    assert!(network.is_null(3), "unmapped code is missing");

    let degree = dataset.column(census::TP_GRAU_ACADEMICO).unwrap();
    let degree = degree.as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(degree.value(0), "Bacharelado");
    assert_eq!(degree.value(1), "Licenciatura");
    assert_eq!(degree.value(2), "Tecnológico");
    assert!(degree.is_null(3));

    let modality = dataset.column(census::TP_MODALIDADE_ENSINO).unwrap();
    let modality = modality.as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(modality.value(1), "EAD");
}

#[test]
fn test_snapshot_is_preferred_and_equivalent() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_census_csv(dir.path());
    let parquet = dir.path().join("dados_mec.parquet");
    assert_eq!(convert_csv_to_parquet(&csv, &parquet, 1024).unwrap(), 4);

    let from_parquet = DatasetLoader::new(DatasetConfig::new(&parquet, &csv)).load().unwrap();
    let from_csv = DatasetLoader::new(DatasetConfig::new(dir.path().join("none.parquet"), &csv))
        .load()
        .unwrap();

    assert_eq!(from_parquet.source(), &DataSource::Parquet(parquet));
    for name in [census::CO_IES, census::TP_REDE, census::IGC, census::TP_GRAU_ACADEMICO] {
        assert_eq!(
            from_parquet.column(name).unwrap().as_ref(),
            from_csv.column(name).unwrap().as_ref(),
            "column {name} differs between sources"
        );
    }
}

#[test]
fn test_unreadable_snapshot_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_census_csv(dir.path());
    let parquet = dir.path().join("dados_mec.parquet");
    std::fs::write(&parquet, b"not a parquet file").unwrap();

    let dataset = DatasetLoader::new(DatasetConfig::new(&parquet, &csv)).load().unwrap();
    assert_eq!(dataset.source(), &DataSource::Csv(csv));
}

#[test]
fn test_no_source_halts_with_data_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig::new(dir.path().join("a.parquet"), dir.path().join("b.csv"));
    match DatasetLoader::new(config).load() {
        Err(CensoError::DataUnavailable { tried, .. }) => assert_eq!(tried.len(), 2),
        other => panic!("expected DataUnavailable, got {other:?}"),
    }
}

#[test]
fn test_raw_load_keeps_codes() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_census_csv(dir.path());
    let dataset = DatasetLoader::new(DatasetConfig::new(dir.path().join("x.parquet"), &csv))
        .load_raw()
        .unwrap();
    let network = dataset.column(census::TP_REDE).unwrap();
    let network = network.as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(network.value(0), "1");
}

#[test]
fn test_quality_report_on_loaded_data() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_census_csv(dir.path());
    let dataset = DatasetLoader::new(DatasetConfig::new(dir.path().join("x.parquet"), &csv))
        .load()
        .unwrap();

    let report = DataQualityReport::from_dataset(&dataset);
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.total_columns, 11);
    assert_eq!(report.distinct_count(census::CO_IES), Some(3));
    assert_eq!(report.distinct_count(census::NO_CURSO), Some(3));
    assert_eq!(report.distinct_count(census::NO_MUNICIPIO), None);

    let inscribed = report.missing.iter().find(|m| m.column == census::QT_INSCRITO_TOTAL).unwrap();
    assert_eq!(inscribed.count, 2);
    assert_eq!(inscribed.percent, 50.0);
    assert!(report.missing.windows(2).all(|w| w[0].count >= w[1].count));
}

#[test]
fn test_cache_serves_same_dataset_until_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_census_csv(dir.path());
    let cache = DatasetCache::new();

    let config = DatasetConfig::new(dir.path().join("dados_mec.parquet"), &csv);
    let first = cache.get_or_load(&config).unwrap();
    let second = cache.get_or_load(&config).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let expired = config.clone().with_cache_ttl(Duration::ZERO);
    let third = cache.get_or_load(&expired).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.num_rows(), first.num_rows());
}
