// experiment.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use super::enums::{
    CarFollowingVersion, DynamicSimulationEngineMode, DynamicSimulatorEngine, DynamicUserEquilibriumAssignmentModel,
    FrankWolfeMethod, ReactionTimeType, StochasticRouteChoiceModel, TwoLaneCarFollowingModel,
};
use super::identity::ObjectIdentity;
use crate::error::{ConfigError, ConfigResult};
use crate::global_variables::STATIC_MACRO_ENGINE;
use crate::validation::checks::{finite, non_negative, non_negative_int, note_missing, CheckedRecord, TypeIssue};
use crate::validation::{required_fields, verify_attributes, ExperimentDiscriminants, HasAttributes};

/// Declares the experiment parameter bag together with the `ExperimentField`
/// names the validator uses to look them up.
macro_rules! experiment_parameters {
    ($( $(#[$meta:meta])* $field:ident: $ty:ty => $variant:ident, )*) => {
        /// Tunable parameters of a dynamic experiment. Which of them are
        /// required depends on the engine, the engine mode and the route
        /// choice model; see `required_fields`.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct ExperimentParameters {
            $( $(#[$meta])* pub $field: Option<$ty>, )*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ExperimentField {
            Name,
            ExternalId,
            Replications,
            $( $variant, )*
        }

        impl ExperimentField {
            pub fn as_str(self) -> &'static str {
                match self {
                    ExperimentField::Name => "name",
                    ExperimentField::ExternalId => "external_id",
                    ExperimentField::Replications => "replications",
                    $( ExperimentField::$variant => stringify!($field), )*
                }
            }
        }

        impl ExperimentParameters {
            fn is_set(&self, field: ExperimentField) -> bool {
                match field {
                    $( ExperimentField::$variant => self.$field.is_some(), )*
                    ExperimentField::Name | ExperimentField::ExternalId | ExperimentField::Replications => false,
                }
            }
        }
    };
}

experiment_parameters! {
    dynamic_simulator_engine: DynamicSimulatorEngine => DynamicSimulatorEngine,
    engine_mode: DynamicSimulationEngineMode => EngineMode,
    /// Seconds between control updates.
    cycle_time: i64 => CycleTime,
    intervals: i64 => Intervals,
    capacity_weight: f64 => CapacityWeight,
    dynamic: bool => Dynamic,
    max_assign_paths: i64 => MaxAssignPaths,

    /// Simulation step in seconds.
    micro_sim_step: f64 => MicroSimStep,
    car_following_version: CarFollowingVersion => CarFollowingVersion,
    car_following_consider_min_headway: i64 => CarFollowingConsiderMinHeadway,
    apply_two_lanes: bool => ApplyTwoLanes,
    apply_twopas_slope_model: bool => ApplyTwopasSlopeModel,
    apply_non_lane_based_movement: bool => ApplyNonLaneBasedMovement,
    apply_two_way_overtaking_model: bool => ApplyTwoWayOvertakingModel,
    micro_queue_up_speed: i64 => MicroQueueUpSpeed,
    micro_queue_leaving_speed: i64 => MicroQueueLeavingSpeed,
    micro_activate_external_behavior_model: bool => MicroActivateExternalBehaviorModel,
    reaction_time_type: ReactionTimeType => ReactionTimeType,
    reaction_at_stop: f64 => ReactionAtStop,
    reaction_at_traffic_light: f64 => ReactionAtTrafficLight,

    max_distance: i64 => MaxDistance,
    two_lane_car_following_model: TwoLaneCarFollowingModel => TwoLaneCarFollowingModel,
    micro_num_of_vehicles: i64 => MicroNumOfVehicles,
    micro_max_speed_diff: i64 => MicroMaxSpeedDiff,
    micro_max_speed_diff_ramp: i64 => MicroMaxSpeedDiffRamp,

    delay_time_threshold: i64 => DelayTimeThreshold,
    speed_difference_min_threshold: i64 => SpeedDifferenceMinThreshold,
    speed_difference_max_threshold: i64 => SpeedDifferenceMaxThreshold,
    rank_threshold: i64 => RankThreshold,
    remaining_travel_time_threshold: f64 => RemainingTravelTimeThreshold,
    number_of_simultaneous_overtaking_allowed: i64 => NumberOfSimultaneousOvertakingAllowed,
    delay_between_simultaneous_overtaking: i64 => DelayBetweenSimultaneousOvertaking,
    sensitivity_factor_reduce_car_following: f64 => SensitivityFactorReduceCarFollowing,
    overtaking_speed_magnification: f64 => OvertakingSpeedMagnification,
    speed_difference_overtaking_threshold: i64 => SpeedDifferenceOvertakingThreshold,

    stopping_criteria_iterations: i64 => StoppingCriteriaIterations,
    /// Relative gap at which the iterative assignment stops.
    stopping_criteria_rgap: f64 => StoppingCriteriaRgap,
    due_assignment_model: DynamicUserEquilibriumAssignmentModel => DueAssignmentModel,
    due_experienced_costs: i64 => DueExperiencedCosts,

    stochastic_route_choice_model: StochasticRouteChoiceModel => StochasticRouteChoiceModel,
    user_defined_cost_weigth: f64 => UserDefinedCostWeigth,
    initial_shortest_paths_trees: i64 => InitialShortestPathsTrees,
    max_routes: i64 => MaxRoutes,

    /// Success probability of the binomial model.
    probability: f64 => Probability,
    alfa: f64 => Alfa,
    beta: f64 => Beta,
    gamma: f64 => Gamma,
    low_variance_factor: f64 => LowVarianceFactor,
    c_logit_past_cost_replication: f64 => CLogitPastCostReplication,

    micro_num_of_threads: i64 => MicroNumOfThreads,
    meso_num_of_threads: i64 => MesoNumOfThreads,
    num_of_paths_threads: i64 => NumOfPathsThreads,
    reaction_time: f64 => ReactionTime,
    user_function: i64 => UserFunction,
    warmup_demand: bool => WarmupDemand,
}

impl fmt::Display for ExperimentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run of an experiment with its own random seed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Replication {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub random_seed: Option<i64>,
    pub results_to_generate: Option<bool>,
}

impl Replication {
    pub fn new(random_seed: i64, results_to_generate: bool) -> Self {
        Self {
            identity: ObjectIdentity::default(),
            random_seed: Some(random_seed),
            results_to_generate: Some(results_to_generate),
        }
    }
}

impl HasAttributes for Replication {
    type Field = &'static str;

    fn has_attribute(&self, field: &'static str) -> bool {
        match field {
            "random_seed" => self.random_seed.is_some(),
            "results_to_generate" => self.results_to_generate.is_some(),
            "name" => self.identity.name.is_some(),
            "external_id" => self.identity.external_id.is_some(),
            _ => false,
        }
    }

    fn attribute_owner(&self) -> String {
        format!("replication {}", self.identity)
    }
}

impl CheckedRecord for Replication {
    const TYPE_NAME: &'static str = "Replication";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "random_seed", &self.random_seed);
        note_missing(&mut missing, "results_to_generate", &self.results_to_generate);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        self.identity.type_issue()
    }
}

/// A dynamic (microsimulation) experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroExperiment {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub parameters: ExperimentParameters,
    pub replications: Vec<Replication>,
}

impl Default for MicroExperiment {
    /// Presets from the routing calibration process.
    fn default() -> Self {
        let parameters = ExperimentParameters {
            capacity_weight: Some(1.0),
            dynamic: Some(true),
            max_assign_paths: Some(1),
            max_routes: Some(5),
            probability: Some(1.0),
            user_defined_cost_weigth: Some(1.0),
            warmup_demand: Some(true),
            ..ExperimentParameters::default()
        };
        Self {
            identity: ObjectIdentity::default(),
            parameters,
            replications: Vec::new(),
        }
    }
}

impl MicroExperiment {
    pub fn new(name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name, external_id),
            ..Self::default()
        }
    }

    pub fn discriminants(&self) -> ExperimentDiscriminants {
        ExperimentDiscriminants {
            engine: self.parameters.dynamic_simulator_engine,
            engine_mode: self.parameters.engine_mode,
            apply_two_lanes: self.parameters.apply_two_lanes.unwrap_or(false),
            apply_two_way_overtaking_model: self.parameters.apply_two_way_overtaking_model.unwrap_or(false),
            route_choice_model: self.parameters.stochastic_route_choice_model,
        }
    }

    /// Check that every attribute the selected engine, engine mode and route
    /// choice model need is set, and that the replications are usable.
    pub fn assert_experiment_well_formatted(&self) -> ConfigResult<()> {
        for group in required_fields(&self.discriminants())? {
            verify_attributes(self, group.fields, group.message)?;
        }
        if self.parameters.dynamic_simulator_engine == Some(DynamicSimulatorEngine::Microsimulation) {
            if self.replications.is_empty() {
                return Err(ConfigError::MissingAttribute {
                    owner: self.attribute_owner(),
                    field: ExperimentField::Replications.to_string(),
                    message: "a microsimulation experiment needs at least one replication".to_string(),
                });
            }
            for replication in &self.replications {
                verify_attributes(replication, &["random_seed", "results_to_generate"], None)?;
            }
        }
        Ok(())
    }
}

impl CheckedRecord for MicroExperiment {
    const TYPE_NAME: &'static str = "MicroExperiment";

    /// Parameters depend on the engine; `assert_experiment_well_formatted`
    /// checks those.
    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "name", &self.identity.name);
        note_missing(&mut missing, "external_id", &self.identity.external_id);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let p = &self.parameters;
        let speed_band = match (p.speed_difference_min_threshold, p.speed_difference_max_threshold) {
            (Some(min), Some(max)) if min > max => Some(TypeIssue::new(
                "speed_difference_min_threshold",
                format!("minimum {min} exceeds maximum {max}"),
            )),
            _ => None,
        };
        let probability = match p.probability {
            Some(v) if !(0.0..=1.0).contains(&v) => {
                Some(TypeIssue::new("probability", format!("{v} is not a probability")))
            }
            _ => None,
        };
        self.identity
            .type_issue()
            .or(speed_band)
            .or(probability)
            .or_else(|| non_negative("capacity_weight", p.capacity_weight))
            .or_else(|| non_negative("micro_sim_step", p.micro_sim_step))
            .or_else(|| non_negative("reaction_at_stop", p.reaction_at_stop))
            .or_else(|| non_negative("reaction_at_traffic_light", p.reaction_at_traffic_light))
            .or_else(|| non_negative("reaction_time", p.reaction_time))
            .or_else(|| non_negative("stopping_criteria_rgap", p.stopping_criteria_rgap))
            .or_else(|| finite("remaining_travel_time_threshold", p.remaining_travel_time_threshold))
            .or_else(|| finite("sensitivity_factor_reduce_car_following", p.sensitivity_factor_reduce_car_following))
            .or_else(|| finite("overtaking_speed_magnification", p.overtaking_speed_magnification))
            .or_else(|| finite("user_defined_cost_weigth", p.user_defined_cost_weigth))
            .or_else(|| finite("alfa", p.alfa))
            .or_else(|| finite("beta", p.beta))
            .or_else(|| finite("gamma", p.gamma))
            .or_else(|| finite("low_variance_factor", p.low_variance_factor))
            .or_else(|| finite("c_logit_past_cost_replication", p.c_logit_past_cost_replication))
            .or_else(|| non_negative_int("max_routes", p.max_routes))
            .or_else(|| non_negative_int("max_assign_paths", p.max_assign_paths))
            .or_else(|| {
                self.replications
                    .iter()
                    .enumerate()
                    .find_map(|(i, r)| r.type_issue().map(|issue| issue.within("replications", i)))
            })
    }
}

impl HasAttributes for MicroExperiment {
    type Field = ExperimentField;

    fn has_attribute(&self, field: ExperimentField) -> bool {
        match field {
            ExperimentField::Name => self.identity.name.is_some(),
            ExperimentField::ExternalId => self.identity.external_id.is_some(),
            ExperimentField::Replications => true,
            other => self.parameters.is_set(other),
        }
    }

    fn attribute_owner(&self) -> String {
        format!("experiment {}", self.identity)
    }
}

impl fmt::Display for MicroExperiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Experiment {} ({:?}, {:?}, {} replications)",
            self.identity,
            self.parameters.dynamic_simulator_engine,
            self.parameters.engine_mode,
            self.replications.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrankWolfeParameters {
    pub max_iterations: Option<i64>,
    pub method: Option<FrankWolfeMethod>,
    pub max_relative_gap: Option<f64>,
}

impl Default for FrankWolfeParameters {
    fn default() -> Self {
        Self {
            max_iterations: Some(100),
            method: Some(FrankWolfeMethod::Conjugate),
            max_relative_gap: Some(0.001),
        }
    }
}

/// Static assignment solved with the Frank-Wolfe algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticMacroExperiment {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub engine: Option<String>,
    pub parameters: FrankWolfeParameters,
}

impl Default for StaticMacroExperiment {
    fn default() -> Self {
        Self {
            identity: ObjectIdentity::default(),
            engine: Some(STATIC_MACRO_ENGINE.to_string()),
            parameters: FrankWolfeParameters::default(),
        }
    }
}

impl CheckedRecord for StaticMacroExperiment {
    const TYPE_NAME: &'static str = "StaticMacroExperiment";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "external_id", &self.identity.external_id);
        note_missing(&mut missing, "engine", &self.engine);
        note_missing(&mut missing, "parameters.max_iterations", &self.parameters.max_iterations);
        note_missing(&mut missing, "parameters.method", &self.parameters.method);
        note_missing(&mut missing, "parameters.max_relative_gap", &self.parameters.max_relative_gap);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        self.identity
            .type_issue()
            .or_else(|| non_negative_int("parameters.max_iterations", self.parameters.max_iterations))
            .or_else(|| non_negative("parameters.max_relative_gap", self.parameters.max_relative_gap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn micro_experiment() -> MicroExperiment {
        let mut experiment = MicroExperiment::new("Calibration", "experiment_1");
        let p = &mut experiment.parameters;
        p.dynamic_simulator_engine = Some(DynamicSimulatorEngine::Microsimulation);
        p.engine_mode = Some(DynamicSimulationEngineMode::IterativeAssignment);
        p.cycle_time = Some(900);
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
        experiment
    }

    #[test]
    fn defaults_follow_calibration_presets() {
        let experiment = MicroExperiment::default();
        assert_eq!(experiment.parameters.max_routes, Some(5));
        assert_eq!(experiment.parameters.capacity_weight, Some(1.0));
        assert_eq!(experiment.parameters.warmup_demand, Some(true));
        assert!(experiment.replications.is_empty());
    }

    #[test]
    fn complete_iterative_experiment_is_well_formatted() {
        micro_experiment().assert_experiment_well_formatted().unwrap();
    }

    #[test]
    fn two_lane_parameters_are_required_only_when_enabled() {
        let mut experiment = micro_experiment();
        experiment.parameters.apply_two_lanes = Some(true);
        match experiment.assert_experiment_well_formatted().unwrap_err() {
            ConfigError::MissingAttribute { field, .. } => assert_eq!(field, "max_distance"),
            other => panic!("unexpected error: {other:?}"),
        }
        experiment.parameters.apply_two_lanes = Some(false);
        assert!(experiment.assert_experiment_well_formatted().is_ok());
    }

    #[test]
    fn every_two_lane_parameter_is_required() {
        let omitted_fields = ["max_distance", "micro_num_of_vehicles", "micro_max_speed_diff", "micro_max_speed_diff_ramp"];
        for omitted in omitted_fields {
            let mut experiment = micro_experiment();
            let p = &mut experiment.parameters;
            p.apply_two_lanes = Some(true);
            p.two_lane_car_following_model = Some(TwoLaneCarFollowingModel::Relative);
            p.max_distance = (omitted != "max_distance").then_some(200);
            p.micro_num_of_vehicles = (omitted != "micro_num_of_vehicles").then_some(4);
            p.micro_max_speed_diff = (omitted != "micro_max_speed_diff").then_some(50);
            p.micro_max_speed_diff_ramp = (omitted != "micro_max_speed_diff_ramp").then_some(70);
            match experiment.assert_experiment_well_formatted().unwrap_err() {
                ConfigError::MissingAttribute { field, .. } => assert_eq!(field, omitted),
                other => panic!("unexpected error without {omitted}: {other:?}"),
            }
        }
    }

    #[test]
    fn complete_two_lane_parameters_are_accepted() {
        let mut experiment = micro_experiment();
        let p = &mut experiment.parameters;
        p.apply_two_lanes = Some(true);
        p.two_lane_car_following_model = Some(TwoLaneCarFollowingModel::Relative);
        p.max_distance = Some(200);
        p.micro_num_of_vehicles = Some(4);
        p.micro_max_speed_diff = Some(50);
        p.micro_max_speed_diff_ramp = Some(70);
        experiment.assert_experiment_well_formatted().unwrap();
    }

    #[test]
    fn microsimulation_needs_a_replication() {
        let mut experiment = micro_experiment();
        experiment.replications.clear();
        assert!(matches!(
            experiment.assert_experiment_well_formatted(),
            Err(ConfigError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn replication_without_seed_is_rejected() {
        let mut experiment = micro_experiment();
        experiment.replications[0].random_seed = None;
        match experiment.assert_experiment_well_formatted().unwrap_err() {
            ConfigError::MissingAttribute { field, .. } => assert_eq!(field, "random_seed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn mesosimulation_is_not_implemented() {
        let mut experiment = micro_experiment();
        experiment.parameters.dynamic_simulator_engine = Some(DynamicSimulatorEngine::Mesosimulation);
        assert!(matches!(
            experiment.assert_experiment_well_formatted(),
            Err(ConfigError::NotImplemented(_))
        ));
    }

    #[test]
    fn binomial_model_error_explains_the_probability() {
        let mut experiment = micro_experiment();
        let p = &mut experiment.parameters;
        p.engine_mode = Some(DynamicSimulationEngineMode::OneShotAssignment);
        p.stochastic_route_choice_model = Some(StochasticRouteChoiceModel::Binomial);
        p.initial_shortest_paths_trees = Some(1);
        p.probability = None;
        let err = experiment.assert_experiment_well_formatted().unwrap_err();
        assert!(format!("{err}").contains("\"success\" probability"));
    }

    #[test]
    fn out_of_range_probability_fails_the_type_check() {
        let mut experiment = micro_experiment();
        experiment.parameters.probability = Some(1.5);
        assert!(!experiment.check_attributes_type());
        assert_eq!(experiment.type_issue().unwrap().field, "probability");
    }

    #[test]
    fn experiment_is_a_checked_record() {
        let mut experiment = micro_experiment();
        assert!(experiment.missing_attributes().is_empty());
        assert!(experiment.check_attributes_type());
        experiment.identity.external_id = None;
        assert_eq!(experiment.missing_attributes(), vec!["external_id"]);
        assert_eq!(MicroExperiment::TYPE_NAME, "MicroExperiment");
    }

    #[test]
    fn field_names_match_parameter_names() {
        assert_eq!(ExperimentField::MicroMaxSpeedDiffRamp.as_str(), "micro_max_speed_diff_ramp");
        assert_eq!(ExperimentField::ExternalId.to_string(), "external_id");
    }

    #[test]
    fn static_macro_experiment_defaults_to_frank_wolfe() {
        let experiment = StaticMacroExperiment::default();
        assert_eq!(experiment.engine.as_deref(), Some("FrankWolfe"));
        assert_eq!(experiment.parameters.max_iterations, Some(100));
        assert_eq!(experiment.parameters.method, Some(FrankWolfeMethod::Conjugate));
    }
}
