// samples.rs
//
// Randomized but valid aggregates, for manual inspection of the file format,
// benchmarks and tests.

use chrono::{Duration, NaiveTime};
use rand::Rng;

use crate::config_files::{
    CentroidConfiguration, Detectors, FlowRealDataSet, OdMatrices, SectionSpeedLimitsAndCapacities,
    StaticMacroScenarios, TrafficDemands,
};
use crate::models::enums::{
    CarFollowingVersion, CentroidType, DynamicSimulationEngineMode, DynamicSimulatorEngine,
    DynamicUserEquilibriumAssignmentModel, ReactionTimeType, VehicleTypeName,
};
use crate::models::{
    CentroidConnection, DataBaseInfo, Detector, FlowRealData, MicroExperiment, ObjectIdentity, OdMatrix, OdTripsCount,
    Replication, Scenario, ScenarioInputData, SectionSpeedLimitAndCapacity, StaticMacroExperiment, StaticMacroScenario,
    TrafficDemand,
};
use crate::settings::Settings;

/// First internal id handed out to sample sections.
pub const FIRST_SECTION_ID: i64 = 1000;

fn interval_end(begin: NaiveTime, minutes: u32) -> NaiveTime {
    let (end, wrapped) = begin.overflowing_add_signed(Duration::minutes(i64::from(minutes)));
    if wrapped == 0 {
        end
    } else {
        NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(begin)
    }
}

pub fn sample_centroid_configuration<R: Rng>(rng: &mut R, centroids: usize) -> CentroidConfiguration {
    let mut configuration = CentroidConfiguration::default();
    for index in 0..centroids {
        let centroid_type = if rng.random_bool(0.7) {
            CentroidType::Internal
        } else {
            CentroidType::External
        };
        let mut connection = CentroidConnection::new(
            format!("centroid_{index}"),
            rng.random_range(4_150_000.0..4_160_000.0),
            rng.random_range(585_000.0..600_000.0),
            centroid_type,
        );
        let section = FIRST_SECTION_ID + index as i64;
        connection.from_section_internal_ids = Some(vec![section]);
        connection.to_section_internal_ids = Some(vec![section]);
        configuration.centroids.push(connection);
    }
    configuration
}

/// One matrix per interval and vehicle type, with trips between random
/// pairs of the configuration's centroids.
pub fn sample_od_matrices<R: Rng>(
    rng: &mut R,
    configuration: &CentroidConfiguration,
    settings: &Settings,
    pairs_per_matrix: usize,
) -> OdMatrices {
    let external_id = configuration
        .external_id
        .clone()
        .unwrap_or_default();
    let mut matrices = OdMatrices::new(external_id);
    let centroid_ids: Vec<&str> = configuration
        .centroids
        .iter()
        .filter_map(|centroid| centroid.identity.external_id())
        .collect();
    for begin in settings.time_intervals() {
        let end = interval_end(begin, settings.timestep_minutes);
        for vehicle_type in VehicleTypeName::ALL {
            let mut matrix = OdMatrix::new(begin, end, vehicle_type);
            if !centroid_ids.is_empty() {
                for _ in 0..pairs_per_matrix {
                    let origin = centroid_ids[rng.random_range(0..centroid_ids.len())];
                    let destination = centroid_ids[rng.random_range(0..centroid_ids.len())];
                    let trips = f64::from(rng.random_range(0..40u32));
                    matrix.od_trips_count.push(OdTripsCount::new(origin, destination, trips));
                }
            }
            matrices.od_matrices.push(matrix);
        }
    }
    matrices
}

pub fn sample_traffic_demands(settings: &Settings) -> TrafficDemands {
    let mut demand = TrafficDemand::new(demand_external_id(settings));
    demand.schedule_all(&settings.time_intervals());
    TrafficDemands {
        traffic_demands: vec![demand],
    }
}

pub fn sample_section_speed_limits<R: Rng>(rng: &mut R, sections: usize) -> SectionSpeedLimitsAndCapacities {
    const SPEEDS: [f64; 5] = [25.0, 35.0, 45.0, 65.0, 105.0];
    SectionSpeedLimitsAndCapacities {
        sections: (0..sections)
            .map(|index| {
                let speed = SPEEDS[rng.random_range(0..SPEEDS.len())];
                let lanes = rng.random_range(1..=4);
                SectionSpeedLimitAndCapacity::new(FIRST_SECTION_ID + index as i64, speed, f64::from(lanes * 900))
            })
            .collect(),
    }
}

pub fn sample_flow_detectors(detectors: usize) -> Detectors {
    Detectors {
        detectors: (0..detectors)
            .map(|index| Detector::flow(format!("pems_detector_{index}"), FIRST_SECTION_ID + index as i64))
            .collect(),
    }
}

/// Counts for every interval of the study on every detector.
pub fn sample_flow_real_data_set<R: Rng>(rng: &mut R, detectors: &Detectors, settings: &Settings) -> FlowRealDataSet {
    let mut data_set = FlowRealDataSet::default();
    for detector in &detectors.detectors {
        let mut data = FlowRealData::new(detector.clone());
        for time in settings.time_intervals() {
            let count = f64::from(rng.random_range(20..300u32));
            data.flow_data.insert(chrono::Timelike::num_seconds_from_midnight(&time), count);
        }
        data_set.flow_data_set.push(data);
    }
    data_set
}

fn demand_external_id(settings: &Settings) -> String {
    format!("{}_demand", settings.epoch)
}

/// A microsimulation scenario running an iterative assignment over the
/// sample demand, with one replication.
pub fn sample_scenario(settings: &Settings) -> Scenario {
    let mut experiment = MicroExperiment::new("Calibration", format!("{}_experiment", settings.epoch));
    let p = &mut experiment.parameters;
    p.dynamic_simulator_engine = Some(DynamicSimulatorEngine::Microsimulation);
    p.engine_mode = Some(DynamicSimulationEngineMode::IterativeAssignment);
    p.cycle_time = Some(i64::from(settings.timestep_minutes) * 60);
    p.intervals = Some(3);
    p.micro_sim_step = Some(0.8);
    p.car_following_version = Some(CarFollowingVersion::Version4_2);
    p.car_following_consider_min_headway = Some(1);
    p.apply_two_lanes = Some(false);
    p.apply_twopas_slope_model = Some(false);
    p.apply_non_lane_based_movement = Some(false);
    p.apply_two_way_overtaking_model = Some(false);
    p.micro_queue_up_speed = Some(1);
    p.micro_queue_leaving_speed = Some(4);
    p.micro_activate_external_behavior_model = Some(false);
    p.reaction_time_type = Some(ReactionTimeType::EqualToSimulationStep);
    p.reaction_at_stop = Some(1.2);
    p.reaction_at_traffic_light = Some(1.6);
    p.stopping_criteria_iterations = Some(50);
    p.stopping_criteria_rgap = Some(0.01);
    p.due_assignment_model = Some(DynamicUserEquilibriumAssignmentModel::Msa);
    p.due_experienced_costs = Some(1);
    experiment.replications.push(Replication::new(7, true));

    let mut scenario = Scenario::new("Fremont", format!("{}_scenario", settings.epoch));
    scenario.links.database_info = Some(DataBaseInfo::sqlite(format!("{}.sqlite", settings.epoch)));
    scenario.links.traffic_demand_external_id = Some(demand_external_id(settings));
    scenario.experiment = Some(experiment);
    let interval = settings.timestep_minutes * 60;
    scenario.input_data = Some(ScenarioInputData {
        detection_interval: Some(interval),
        statistical_interval: Some(interval),
        global_trajectories_statistics: Some(false),
        section_trajectories_statistics: Some(false),
        trajectories_statistics: Some(false),
        trajectory_condition_list: Vec::new(),
    });
    scenario
}

/// One static assignment per interval of the study.
pub fn sample_static_macro_scenarios(settings: &Settings) -> StaticMacroScenarios {
    let scenarios = settings
        .time_intervals()
        .into_iter()
        .map(|begin| {
            let external_id = format!("static_{}", begin.format("%H_%M"));
            let mut scenario = StaticMacroScenario {
                identity: ObjectIdentity::new(external_id.as_str(), external_id.as_str()),
                experiment: Some(StaticMacroExperiment {
                    identity: ObjectIdentity::new("Frank-Wolfe", format!("{external_id}_experiment")),
                    ..StaticMacroExperiment::default()
                }),
                departure_time: Some(begin),
                ..StaticMacroScenario::default()
            };
            scenario.links.database_info = Some(DataBaseInfo::sqlite(format!("{external_id}.sqlite")));
            scenario.links.traffic_demand_external_id = Some(demand_external_id(settings));
            scenario
        })
        .collect();
    StaticMacroScenarios { scenarios }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_files::ConfigFile;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn samples_are_valid_aggregates() {
        let mut rng = StdRng::seed_from_u64(7);
        let settings = Settings::default();
        let configuration = sample_centroid_configuration(&mut rng, 5);
        configuration.validate().unwrap();
        let matrices = sample_od_matrices(&mut rng, &configuration, &settings, 10);
        matrices.validate().unwrap();
        assert_eq!(matrices.od_matrices.len(), 48);
        sample_traffic_demands(&settings).validate().unwrap();
        sample_section_speed_limits(&mut rng, 5).validate().unwrap();
        let detectors = sample_flow_detectors(3);
        detectors.validate().unwrap();
        sample_flow_real_data_set(&mut rng, &detectors, &settings).validate().unwrap();
        sample_scenario(&settings).validate().unwrap();
        let scenarios = sample_static_macro_scenarios(&settings);
        scenarios.validate().unwrap();
        assert_eq!(scenarios.scenarios.len(), settings.time_intervals().len());
    }

    #[test]
    fn last_interval_of_the_day_stays_before_midnight() {
        let begin = NaiveTime::from_hms_opt(23, 45, 0).unwrap();
        assert!(interval_end(begin, 15) > begin);
    }

    #[test]
    fn same_seed_gives_same_samples() {
        let a = sample_centroid_configuration(&mut StdRng::seed_from_u64(1), 4);
        let b = sample_centroid_configuration(&mut StdRng::seed_from_u64(1), 4);
        assert_eq!(a, b);
    }
}
