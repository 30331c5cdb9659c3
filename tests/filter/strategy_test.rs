use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use censo_filter::schema::census;
use censo_filter::utils::test::{census_dataset, mixed_records};
use censo_filter::{DataSource, Dataset, FilterCriterion, FilterSpec, LiteralValue, PredicateEvaluator, RecordBatch};

use crate::utils::{assert_strategies_agree, evaluators, selected_rows};

fn random_criterion(rng: &mut StdRng) -> FilterCriterion {
    let pick = |rng: &mut StdRng, pool: &[LiteralValue]| -> Vec<LiteralValue> {
        pool.iter().filter(|_| rng.random_bool(0.5)).cloned().collect()
    };

    match rng.random_range(0..7) {
        0 => FilterCriterion::in_set(
            census::SG_UF_IES,
            pick(rng, &["SC".into(), "SP".into(), "RS".into(), "XX".into()]),
        ),
        1 => FilterCriterion::in_set(census::TP_REDE, pick(rng, &["Pública".into(), "Privada".into()])),
        2 => FilterCriterion::minimum(census::IGC, *[1.0, 2.0, 2.5, 3.0, 4.0, 5.0].choose(rng).unwrap()),
        3 => FilterCriterion::minimum(census::CPC, *[1.0, 3.0, 4.0].choose(rng).unwrap()),
        4 => FilterCriterion::in_set(
            census::CO_IES,
            pick(rng, &["10".into(), LiteralValue::Int(20), "abc".into(), LiteralValue::Float(40.0)]),
        ),
        5 => FilterCriterion::equals(
            census::NO_CURSO,
            *["Direito", "Medicina", "Letras", "Inexistente"].choose(rng).unwrap(),
        ),
        _ => FilterCriterion::equals(census::IGC, *[5.0, 3.0, 0.0].choose(rng).unwrap()),
    }
}

fn random_spec(rng: &mut StdRng) -> FilterSpec {
    let count = rng.random_range(0..4);
    FilterSpec::from_criteria((0..count).map(|_| random_criterion(rng)).collect::<Vec<_>>())
}

#[test]
fn test_empty_spec_returns_full_collection() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    for evaluator in evaluators(&dataset) {
        let view = evaluator.evaluate(&dataset, &FilterSpec::new()).unwrap();
        assert_eq!(view.num_rows(), dataset.num_rows());
        assert_eq!(view.row_ids(), (0..dataset.num_rows() as u32).collect::<Vec<_>>());
    }
}

#[test]
fn test_strategies_agree_on_random_specs() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let spec = random_spec(&mut rng);
        let rows = assert_strategies_agree(&dataset, &spec);
        assert!(rows.windows(2).all(|w| w[0] < w[1]), "rows out of order for {spec}");
    }
}

#[test]
fn test_evaluation_is_idempotent() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for evaluator in evaluators(&dataset) {
        for _ in 0..20 {
            let spec = random_spec(&mut rng);
            let first = selected_rows(evaluator.as_ref(), &dataset, &spec).unwrap();
            let second = selected_rows(evaluator.as_ref(), &dataset, &spec).unwrap();
            assert_eq!(first, second);
        }
    }
}

#[test]
fn test_adding_a_criterion_never_adds_rows() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let mut rng = StdRng::seed_from_u64(1234);
    for evaluator in evaluators(&dataset) {
        for _ in 0..50 {
            let base = random_spec(&mut rng);
            let extended = base.and(random_criterion(&mut rng));
            let base_rows = selected_rows(evaluator.as_ref(), &dataset, &base).unwrap();
            let extended_rows = selected_rows(evaluator.as_ref(), &dataset, &extended).unwrap();
            assert!(
                extended_rows.iter().all(|row| base_rows.contains(row)),
                "{extended} selected rows outside {base}"
            );
        }
    }
}

#[test]
fn test_missing_values_never_meet_a_threshold() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let spec = FilterSpec::new().and(FilterCriterion::minimum(census::IGC, f64::MIN));
    let rows = assert_strategies_agree(&dataset, &spec);
    // record 5 has no IGC
    assert!(!rows.contains(&5));
    assert_eq!(rows.len(), dataset.num_rows() - 1);
}

#[test]
fn test_missing_values_never_match_a_set() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let spec = FilterSpec::new().and(FilterCriterion::in_set(census::TP_REDE, ["Pública", "Privada"]));
    let rows = assert_strategies_agree(&dataset, &spec);
    assert!(!rows.contains(&6));
}

#[test]
fn test_selection_values_are_data_not_query_text() {
    let dataset = census_dataset(&mixed_records()).unwrap();

    let spec = FilterSpec::new().and(FilterCriterion::in_set(
        census::NO_IES,
        ["Faculdade O'Brien \"Norte\"", "x' OR '1'='1", "\"; DROP TABLE records; --"],
    ));
    assert_eq!(assert_strategies_agree(&dataset, &spec), vec![3]);

    // the table survives
    assert_eq!(assert_strategies_agree(&dataset, &FilterSpec::new()).len(), dataset.num_rows());
}

#[test]
fn test_uncoercible_values_match_nothing() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let spec = FilterSpec::new().and(FilterCriterion::in_set(census::CO_IES, ["SC", "", "1.5"]));
    assert!(assert_strategies_agree(&dataset, &spec).is_empty());

    let spec = FilterSpec::new().and(FilterCriterion::in_set(census::CO_IES, ["10", "20.0"]));
    assert_eq!(assert_strategies_agree(&dataset, &spec), vec![0, 1, 2, 7]);
}

#[test]
fn test_unknown_column_is_configuration_error() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let spec = FilterSpec::new().and(FilterCriterion::equals("NOT_A_COLUMN", "x"));
    for evaluator in evaluators(&dataset) {
        let err = evaluator.evaluate(&dataset, &spec).unwrap_err();
        assert!(matches!(err, censo_filter::CensoError::Configuration(_)));
    }
}

#[test]
fn test_large_integer_minimum_agrees() {
    // 2^53 + 3 rounds up to 2^53 + 4 as f64
    let big = (1_i64 << 53) + 3;
    let schema = Arc::new(Schema::new(vec![Field::new(census::CO_IES, DataType::Int64, true)]));
    let batch = RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![Some(big), Some(1), None]))]).unwrap();
    let dataset = Dataset::new(batch, DataSource::Memory).unwrap();

    let spec = FilterSpec::new().and(FilterCriterion::minimum(census::CO_IES, ((1_i64 << 53) + 4) as f64));
    assert_eq!(assert_strategies_agree(&dataset, &spec), vec![0]);
}

#[test]
fn test_columns_differing_only_in_case_agree() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("IGC", DataType::Float64, true),
        Field::new("igc", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(vec![Some(5.0), Some(1.0), None])),
            Arc::new(Float64Array::from(vec![Some(1.0), Some(5.0), Some(3.0)])),
        ],
    )
    .unwrap();
    let dataset = Dataset::new(batch, DataSource::Memory).unwrap();

    let upper = FilterSpec::new().and(FilterCriterion::minimum("IGC", 3.0));
    assert_eq!(assert_strategies_agree(&dataset, &upper), vec![0]);
    let lower = FilterSpec::new().and(FilterCriterion::minimum("igc", 3.0));
    assert_eq!(assert_strategies_agree(&dataset, &lower), vec![1, 2]);
}
