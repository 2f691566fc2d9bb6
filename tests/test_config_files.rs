// test_config_files.rs
//
// File level behavior of every configuration aggregate.

mod common;

use microsim_config::config_files::{
    CentroidConfiguration, Detectors, FlowRealDataSet, MasterControlPlan, OdMatrices, SectionSpeedLimitsAndCapacities,
    StaticMacroScenarios, TrafficDemands, TrafficManagementStrategy,
};
use microsim_config::models::Scenario;
use microsim_config::samples::{
    sample_centroid_configuration, sample_flow_detectors, sample_flow_real_data_set, sample_od_matrices,
    sample_scenario, sample_section_speed_limits, sample_static_macro_scenarios, sample_traffic_demands,
};
use microsim_config::{ConfigError, ConfigFile, ExportOutcome, Settings};
use std::fmt::Debug;
use std::fs;
use std::path::Path;

fn assert_round_trip<T: ConfigFile + PartialEq + Debug>(record: &T, dir: &Path, name: &str) {
    let path = dir.join(name);
    assert_eq!(record.export_to_file(&path).unwrap(), ExportOutcome::Created);
    let imported = T::import_from_file(&path).unwrap();
    assert_eq!(&imported, record);
}

#[test]
fn centroid_configuration_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.pkl");
    let original = common::ccs_test_obj();

    original.export_to_file(&path).unwrap();
    assert!(path.exists());
    let imported = CentroidConfiguration::import_from_file(&path).unwrap();
    assert_eq!(imported, original);

    fs::remove_file(&path).unwrap();
    assert!(!path.exists());
}

#[test]
fn every_aggregate_survives_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let mut rng = common::rng();

    let configuration = sample_centroid_configuration(&mut rng, 6);
    assert_round_trip(&configuration, dir.path(), "centroid_configuration.pkl");
    let matrices = sample_od_matrices(&mut rng, &configuration, &settings, 12);
    assert_round_trip(&matrices, dir.path(), "od_matrices.pkl");
    assert_round_trip(&sample_traffic_demands(&settings), dir.path(), "traffic_demands.pkl");
    assert_round_trip(&sample_section_speed_limits(&mut rng, 6), dir.path(), "speed_limits.pkl");

    let detectors = sample_flow_detectors(4);
    assert_round_trip(&detectors, dir.path(), "detectors.pkl");
    let real_data = sample_flow_real_data_set(&mut rng, &detectors, &settings);
    assert_round_trip(&real_data, dir.path(), "real_data.pkl");

    assert_round_trip(&common::master_control_plan(), dir.path(), "master_control_plan.pkl");
    assert_round_trip(&common::traffic_strategy(1, 2), dir.path(), "strategy.pkl");
    assert_round_trip(&sample_scenario(&settings), dir.path(), "scenario.pkl");
    assert_round_trip(&sample_static_macro_scenarios(&settings), dir.path(), "static_macro_scenarios.pkl");
}

#[test]
fn scenario_keeps_its_experiment_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.pkl");
    let original = sample_scenario(&Settings::default());
    original.export_to_file(&path).unwrap();

    let imported = Scenario::import_from_file(&path).unwrap();
    let experiment = imported.experiment.as_ref().unwrap();
    assert_eq!(experiment.parameters.micro_sim_step, Some(0.8));
    assert_eq!(experiment.replications.len(), 1);
    assert_eq!(imported.links.begin_date, original.links.begin_date);
    assert_eq!(imported, original);
}

#[test]
fn incomplete_scenario_is_rejected_and_nothing_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.pkl");
    let mut scenario = sample_scenario(&Settings::default());
    scenario.input_data = None;

    match scenario.export_to_file(&path).unwrap_err() {
        ConfigError::MissingAttribute { field, .. } => assert_eq!(field, "input_data"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!path.exists());
}

#[test]
fn out_of_range_experiment_value_is_rejected_and_nothing_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.pkl");
    let mut scenario = sample_scenario(&Settings::default());
    if let Some(experiment) = scenario.experiment.as_mut() {
        experiment.parameters.probability = Some(1.5);
    }

    let err = scenario.export_to_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::WrongType { .. }), "{err:?}");
    assert!(err.to_string().contains("probability"));
    assert!(!path.exists());
}

#[test]
fn static_scenario_without_experiment_is_rejected_and_nothing_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("static.pkl");
    let mut scenarios = sample_static_macro_scenarios(&Settings::default());
    scenarios.scenarios[2].experiment = None;

    match scenarios.export_to_file(&path).unwrap_err() {
        ConfigError::MissingAttribute { owner, field, .. } => {
            assert!(owner.contains("scenarios[2]"));
            assert_eq!(field, "experiment");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!path.exists());
}

#[test]
fn empty_static_scenario_list_is_still_exported() {
    let dir = tempfile::tempdir().unwrap();
    assert_round_trip(&StaticMacroScenarios::default(), dir.path(), "static.pkl");
}

#[test]
fn partial_object_is_rejected_and_nothing_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.pkl");
    let mut configuration = common::ccs_test_obj();
    configuration.centroids[0].centroid_type = None;

    match configuration.export_to_file(&path).unwrap_err() {
        ConfigError::MissingAttribute { field, .. } => assert_eq!(field, "centroid_type"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!path.exists());
}

#[test]
fn invalid_value_is_rejected_and_nothing_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invalid.pkl");
    let mut configuration = common::ccs_test_obj();
    configuration.centroids[0].to_section_internal_ids = Some(vec![12, -3]);

    let err = configuration.export_to_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::WrongType { .. }), "{err:?}");
    assert!(err.to_string().contains("to_section_internal_ids[1]"));
    assert!(!path.exists());
}

#[test]
fn empty_primary_lists_abort_the_export() {
    let dir = tempfile::tempdir().unwrap();

    let err = Detectors::default().export_to_file(dir.path().join("d.pkl")).unwrap_err();
    assert_eq!(err.to_string(), "Detectors has no data. Export aborted.");

    let err = MasterControlPlan::new("empty").export_to_file(dir.path().join("m.pkl")).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyCollection { .. }));

    let err = TrafficManagementStrategy::new("Calming", "calming")
        .export_to_file(dir.path().join("s.pkl"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::EmptyCollection { .. }));

    let err = FlowRealDataSet::default().export_to_file(dir.path().join("f.pkl")).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyCollection { .. }));

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn exporting_over_an_existing_file_replaces_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("speeds.pkl");
    let mut rng = common::rng();
    let first = sample_section_speed_limits(&mut rng, 3);
    let second = sample_section_speed_limits(&mut rng, 5);

    assert_eq!(first.export_to_file(&path).unwrap(), ExportOutcome::Created);
    assert_eq!(second.export_to_file(&path).unwrap(), ExportOutcome::Overwritten);
    let imported = SectionSpeedLimitsAndCapacities::import_from_file(&path).unwrap();
    assert_eq!(imported, second);
    assert_ne!(imported, first);
}

#[test]
fn equality_follows_nested_values() {
    let settings = Settings::default();
    let configuration = sample_centroid_configuration(&mut common::rng(), 4);
    let a = sample_od_matrices(&mut common::rng(), &configuration, &settings, 5);
    let b = sample_od_matrices(&mut common::rng(), &configuration, &settings, 5);
    assert_eq!(a, b);

    let mut changed = b.clone();
    let trips = changed.od_matrices[3].od_trips_count[2].num_trips.unwrap_or(0.0);
    changed.od_matrices[3].od_trips_count[2].num_trips = Some(trips + 1.0);
    assert_ne!(a, changed);

    let mut moved = common::ccs_test_obj();
    moved.centroids[0].latitude = Some(0.5);
    assert_ne!(moved, common::ccs_test_obj());
}

#[test]
fn importing_the_wrong_kind_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demands.pkl");
    sample_traffic_demands(&Settings::default()).export_to_file(&path).unwrap();

    assert!(TrafficDemands::import_from_file(&path).is_ok());
    assert!(matches!(
        OdMatrices::import_from_file(&path),
        Err(ConfigError::WrongKind { .. })
    ));
}

#[test]
fn paths_are_checked_before_anything_else() {
    let dir = tempfile::tempdir().unwrap();
    let configuration = common::ccs_test_obj();

    let err = configuration.export_to_file(dir.path().join("centroids.json")).unwrap_err();
    assert!(matches!(err, ConfigError::WrongExtension { .. }));

    let err = configuration
        .export_to_file(dir.path().join("missing").join("centroids.pkl"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::ParentDirectoryNotFound { .. }));

    let err = CentroidConfiguration::import_from_file(dir.path().join("absent.pkl")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn real_data_set_csv_lists_every_count() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let detectors = sample_flow_detectors(2);
    let mut data_set = sample_flow_real_data_set(&mut common::rng(), &detectors, &settings);

    let csv_path = data_set.export_to_real_data_set_csv(dir.path(), "real.csv").unwrap();
    let content = fs::read_to_string(csv_path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("Detector External Id,15 minutes Count,Time"));
    assert_eq!(lines.count(), 2 * settings.time_intervals().len());
    assert_eq!(data_set.filename.as_deref(), Some("real.csv"));
    assert_eq!(data_set.line_to_skip, Some(1));
}
