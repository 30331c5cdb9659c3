use censo_filter::schema::census;
use censo_filter::utils::test::{census_dataset, mixed_records};
use censo_filter::{
    CensoError, ExplorerConfig, FieldControl, FilterCriterion, FilterSpecBuilder, LiteralValue, Selections,
};

#[test]
fn test_census_controls_fit_census_schema() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let schema = dataset.schema();
    let controls = vec![
        FieldControl::multi_select(census::SG_UF_IES),
        FieldControl::multi_select(census::TP_REDE),
        FieldControl::minimum(census::IGC, 1.0, 5.0),
    ];
    let builder = FilterSpecBuilder::new(controls, &schema).unwrap();

    let selections = Selections::new()
        .with(census::TP_REDE, vec!["Pública"])
        .with(census::IGC, 4.0);
    let spec = builder.build(&selections);
    assert_eq!(
        spec.criteria(),
        &[
            FilterCriterion::in_set(census::TP_REDE, ["Pública"]),
            FilterCriterion::minimum(census::IGC, 4.0),
        ]
    );
}

#[test]
fn test_minimum_control_on_text_column_fails_at_setup() {
    let dataset = census_dataset(&mixed_records()).unwrap();
    let result = FilterSpecBuilder::new(vec![FieldControl::minimum(census::NO_IES, 1.0, 5.0)], &dataset.schema());
    assert!(matches!(result, Err(CensoError::Configuration(_))));
}

#[test]
fn test_full_census_preset_needs_every_column() {
    // the fixture lacks the knowledge-area and degree columns
    let dataset = census_dataset(&mixed_records()).unwrap();
    let config = ExplorerConfig::census();
    let result = FilterSpecBuilder::new(config.course_controls, &dataset.schema());
    assert!(matches!(result, Err(CensoError::Configuration(_))));
}

#[test]
fn test_options_are_sorted_and_distinct() {
    let dataset = census_dataset(&mixed_records()).unwrap();

    let states = FieldControl::multi_select(census::SG_UF_IES).options(&dataset).unwrap();
    assert_eq!(states, vec![LiteralValue::from("RS"), LiteralValue::from("SC"), LiteralValue::from("SP")]);

    let networks = FieldControl::multi_select(census::TP_REDE).options(&dataset).unwrap();
    assert_eq!(networks, vec![LiteralValue::from("Privada"), LiteralValue::from("Pública")]);

    let scores = FieldControl::minimum(census::IGC, 1.0, 5.0).options(&dataset).unwrap();
    assert_eq!(
        scores,
        vec![
            LiteralValue::Float(2.0),
            LiteralValue::Float(3.0),
            LiteralValue::Float(4.0),
            LiteralValue::Float(5.0)
        ]
    );
}

#[test]
fn test_selections_round_trip_through_json() {
    let selections = Selections::from_json(r#"{"SG_UF_IES": ["SC", "SP"], "IGC": 3}"#).unwrap();
    let text = serde_json::to_string(&selections).unwrap();
    assert_eq!(Selections::from_json(&text).unwrap(), selections);
}
