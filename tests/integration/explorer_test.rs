use std::sync::Arc;

use arrow::array::{Array, Int64Array};
use censo_filter::analysis::{competition_table, value_counts};
use censo_filter::schema::census;
use censo_filter::utils::test::{census_dataset, mixed_records, three_records};
use censo_filter::{
    Dataset, Explorer, ExplorerConfig, FieldControl, KeyDerivation, LiteralValue, PredicateEvaluator, Selections,
    Strategy,
};

fn config() -> ExplorerConfig {
    ExplorerConfig {
        institution_controls: vec![
            FieldControl::multi_select(census::SG_UF_IES),
            FieldControl::multi_select(census::NO_IES),
            FieldControl::multi_select(census::TP_REDE),
            FieldControl::minimum(census::IGC, 1.0, 5.0),
        ],
        course_controls: vec![
            FieldControl::multi_select(census::NO_MUNICIPIO),
            FieldControl::multi_select(census::NO_CURSO),
            FieldControl::multi_select(census::TP_MODALIDADE_ENSINO),
            FieldControl::minimum(census::CPC, 1.0, 5.0),
        ],
        key_field: census::CO_IES.to_string(),
        key_derivation: KeyDerivation::FilteredRows,
    }
}

fn explorers(dataset: Dataset) -> Vec<Explorer<Box<dyn PredicateEvaluator + Send + Sync>>> {
    let dataset = Arc::new(dataset);
    [Strategy::InMemory, Strategy::QueryEngine]
        .into_iter()
        .map(|strategy| {
            let evaluator = strategy.evaluator(&dataset).unwrap();
            Explorer::new(Arc::clone(&dataset), evaluator, config()).unwrap()
        })
        .collect()
}

fn keys_of(rows: &[u32], dataset: &Dataset) -> Vec<Option<i64>> {
    let column = dataset.column(census::CO_IES).unwrap();
    let ids = column.as_any().downcast_ref::<Int64Array>().unwrap();
    rows.iter()
        .map(|&r| ids.is_valid(r as usize).then(|| ids.value(r as usize)))
        .collect()
}

#[test]
fn test_network_filter_on_three_records() {
    for explorer in explorers(census_dataset(&three_records()).unwrap()) {
        let selections = Selections::new().with(census::TP_REDE, vec!["Pública"]);
        let views = explorer.run(&selections).unwrap();

        let institutions = views.institution_rows().unwrap();
        assert_eq!(institutions.len(), 1);
        assert_eq!(institutions[0].no_ies.as_deref(), Some("Universidade A"));

        let courses = views.course_rows().unwrap();
        assert_eq!(courses.len(), 2);
        assert!(courses.iter().all(|c| c.co_ies == Some(1)));
        assert_eq!(views.key_set.unwrap().keys(), &[LiteralValue::Int(1)]);
    }
}

#[test]
fn test_unreachable_minimum_empties_both_views() {
    for explorer in explorers(census_dataset(&three_records()).unwrap()) {
        let views = explorer.run(&Selections::new().with(census::IGC, 5.0)).unwrap();
        assert!(views.institutions.is_empty());
        assert!(views.courses.is_empty(), "courses must not fall back to the unfiltered set");
        assert!(views.key_set.unwrap().is_empty());
    }
}

#[test]
fn test_no_institution_filter_passes_courses_through() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let total = dataset.num_rows();
    for explorer in explorers(dataset) {
        let views = explorer.run(&Selections::new()).unwrap();
        assert!(views.key_set.is_none());
        // includes the course whose institution key is missing
        assert_eq!(views.courses.num_rows(), total);
        assert!(views.courses.row_ids().contains(&6));
    }
}

#[test]
fn test_courses_belong_to_filtered_institutions() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let selection_sets = [
        Selections::new().with(census::TP_REDE, vec!["Privada"]),
        Selections::new().with(census::IGC, 4.0),
        Selections::new().with(census::SG_UF_IES, vec!["SC"]).with(census::NO_CURSO, vec!["Direito"]),
        Selections::new().with(census::IGC, 3.0).with(census::CPC, 3.0),
    ];

    let shared = Arc::new(dataset);
    for strategy in [Strategy::InMemory, Strategy::QueryEngine] {
        let evaluator = strategy.evaluator(&shared).unwrap();
        let explorer = Explorer::new(Arc::clone(&shared), evaluator, config()).unwrap();

        for selections in &selection_sets {
            let views = explorer.run(selections).unwrap();
            let institution_keys = keys_of(views.institutions.row_ids(), &shared);
            let course_keys = keys_of(views.courses.row_ids(), &shared);

            for key in &course_keys {
                assert!(key.is_some(), "course with missing key survived an institution filter");
                assert!(institution_keys.contains(key));
            }
        }
    }
}

#[test]
fn test_institutions_are_deduplicated_by_key() {
    for explorer in explorers(census_dataset(&mixed_records()).unwrap()) {
        let views = explorer
            .run(&Selections::new().with(census::TP_REDE, vec!["Pública", "Privada"]))
            .unwrap();
        let rows = views.institution_rows().unwrap();
        let mut keys: Vec<_> = rows.iter().map(|r| r.co_ies).collect();
        let total = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(keys, vec![Some(10), Some(20), Some(30), Some(40), Some(50)]);
    }
}

#[test]
fn test_strategies_produce_identical_views() {
    let dataset = Arc::new(census_dataset(&mixed_records()).unwrap());
    let memory = Explorer::new(
        Arc::clone(&dataset),
        Strategy::InMemory.evaluator(&dataset).unwrap(),
        config(),
    )
    .unwrap();
    let sql = Explorer::new(
        Arc::clone(&dataset),
        Strategy::QueryEngine.evaluator(&dataset).unwrap(),
        config(),
    )
    .unwrap();

    let selections = Selections::new()
        .with(census::SG_UF_IES, vec!["SC", "SP"])
        .with(census::IGC, 3.0)
        .with(census::TP_MODALIDADE_ENSINO, vec!["Presencial"]);

    let a = memory.run(&selections).unwrap();
    let b = sql.run(&selections).unwrap();
    assert_eq!(a.institutions.row_ids(), b.institutions.row_ids());
    assert_eq!(a.courses.row_ids(), b.courses.row_ids());
    assert_eq!(a.course_rows().unwrap(), b.course_rows().unwrap());
}

#[test]
fn test_deduplicated_key_derivation() {
    let dataset = Arc::new(census_dataset(&mixed_records()).unwrap());
    let explorer = Explorer::new(
        Arc::clone(&dataset),
        Strategy::InMemory.evaluator(&dataset).unwrap(),
        config().with_key_derivation(KeyDerivation::DeduplicatedRows),
    )
    .unwrap();

    // institution 20 is first seen in SP; its later SC record does not count
    let views = explorer.run(&Selections::new().with(census::SG_UF_IES, vec!["SC"])).unwrap();
    let keys = views.key_set.unwrap();
    assert!(!keys.keys().contains(&LiteralValue::Int(20)));
}

#[test]
fn test_unknown_selection_is_ignored() {
    for explorer in explorers(census_dataset(&three_records()).unwrap()) {
        let views = explorer.run(&Selections::new().with("NOT_A_CONTROL", vec!["x"])).unwrap();
        assert_eq!(views.courses.num_rows(), 3);
    }
}

#[test]
fn test_analysis_over_course_view() {
    for explorer in explorers(census_dataset(&mixed_records()).unwrap()) {
        let views = explorer.run(&Selections::new()).unwrap();

        let courses = value_counts(&views.courses, census::NO_CURSO).unwrap();
        assert_eq!(courses[0], ("Direito".to_string(), 3));

        // the course with zero seats is left out
        let table = competition_table(&views.courses).unwrap();
        assert_eq!(table.len(), views.courses.num_rows() - 1);
        assert!(table.windows(2).all(|w| w[0].candidates_per_seat >= w[1].candidates_per_seat));
    }
}

#[test]
fn test_options_for_controls() {
    let explorer = explorers(census_dataset(&three_records()).unwrap()).remove(0);
    assert_eq!(
        explorer.options(census::NO_IES).unwrap(),
        vec![LiteralValue::from("Faculdade B"), LiteralValue::from("Universidade A")]
    );
    assert!(explorer.options(census::CO_IES).is_err());
}
