// required_fields.rs
//
// Which experiment attributes must be present, as a function of the values
// that select the simulation variant.

use crate::error::{ConfigError, ConfigResult};
use crate::models::enums::{DynamicSimulationEngineMode, DynamicSimulatorEngine, StochasticRouteChoiceModel};
use crate::models::experiment::ExperimentField;
use crate::models::experiment::ExperimentField as F;

/// The experiment attributes that decide which other attributes are needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExperimentDiscriminants {
    pub engine: Option<DynamicSimulatorEngine>,
    pub engine_mode: Option<DynamicSimulationEngineMode>,
    pub apply_two_lanes: bool,
    pub apply_two_way_overtaking_model: bool,
    pub route_choice_model: Option<StochasticRouteChoiceModel>,
}

/// Fields that are checked together, with an optional explanation used when
/// one of them is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldGroup {
    pub fields: &'static [ExperimentField],
    pub message: Option<&'static str>,
}

const fn group(fields: &'static [ExperimentField]) -> FieldGroup {
    FieldGroup { fields, message: None }
}

const ALWAYS: FieldGroup = group(&[
    F::Name,
    F::ExternalId,
    F::DynamicSimulatorEngine,
    F::EngineMode,
    F::CycleTime,
    F::Intervals,
    F::CapacityWeight,
    F::Dynamic,
    F::MaxAssignPaths,
]);

const MICROSIMULATION: FieldGroup = group(&[
    F::MicroSimStep,
    F::CarFollowingVersion,
    F::CarFollowingConsiderMinHeadway,
    F::ApplyTwoLanes,
    F::ApplyTwopasSlopeModel,
    F::ApplyNonLaneBasedMovement,
    F::ApplyTwoWayOvertakingModel,
    F::MicroQueueUpSpeed,
    F::MicroQueueLeavingSpeed,
    F::MicroActivateExternalBehaviorModel,
    F::ReactionTimeType,
    F::ReactionAtStop,
    F::ReactionAtTrafficLight,
    F::Replications,
]);

const TWO_LANES: FieldGroup = group(&[
    F::MaxDistance,
    F::TwoLaneCarFollowingModel,
    F::MicroNumOfVehicles,
    F::MicroMaxSpeedDiff,
    F::MicroMaxSpeedDiffRamp,
]);

const TWO_WAY_OVERTAKING: FieldGroup = group(&[
    F::DelayTimeThreshold,
    F::SpeedDifferenceMinThreshold,
    F::SpeedDifferenceMaxThreshold,
    F::RankThreshold,
    F::RemainingTravelTimeThreshold,
    F::NumberOfSimultaneousOvertakingAllowed,
    F::DelayBetweenSimultaneousOvertaking,
    F::SensitivityFactorReduceCarFollowing,
    F::OvertakingSpeedMagnification,
    F::SpeedDifferenceOvertakingThreshold,
]);

const ITERATIVE: FieldGroup = group(&[
    F::StoppingCriteriaIterations,
    F::StoppingCriteriaRgap,
    F::DueAssignmentModel,
    F::DueExperiencedCosts,
]);

const ONE_SHOT: FieldGroup = group(&[
    F::StochasticRouteChoiceModel,
    F::UserDefinedCostWeigth,
    F::InitialShortestPathsTrees,
    F::MaxRoutes,
]);

const BINOMIAL: FieldGroup = FieldGroup {
    fields: &[F::Probability],
    message: Some("The Binomial model must have a \"success\" probability parameter."),
};

const PROPORTIONAL: FieldGroup = FieldGroup {
    fields: &[F::Alfa],
    message: Some("The Proportional model must have a probability of switching to a lower-cost path."),
};

const LOGIT: FieldGroup = FieldGroup {
    fields: &[F::LowVarianceFactor],
    message: Some("The Logit model must have a parameter that scales the importance of u_k, which are lower-cost paths."),
};

const C_LOGIT: FieldGroup = group(&[F::Beta, F::Gamma, F::LowVarianceFactor, F::CLogitPastCostReplication]);

fn route_choice_group(model: StochasticRouteChoiceModel) -> Option<FieldGroup> {
    match model {
        StochasticRouteChoiceModel::Binomial => Some(BINOMIAL),
        StochasticRouteChoiceModel::Proportional => Some(PROPORTIONAL),
        StochasticRouteChoiceModel::Logit => Some(LOGIT),
        StochasticRouteChoiceModel::CLogit => Some(C_LOGIT),
        StochasticRouteChoiceModel::FixedDistance
        | StochasticRouteChoiceModel::FixedTime
        | StochasticRouteChoiceModel::UserDefined => None,
    }
}

/// Groups of attributes an experiment with these discriminants must carry,
/// in the order they are checked.
///
/// An unset engine or engine mode stops the expansion: the first group
/// already requires both, so checking it reports them as missing. Engines
/// other than microsimulation are not supported yet.
pub fn required_fields(discriminants: &ExperimentDiscriminants) -> ConfigResult<Vec<FieldGroup>> {
    let mut groups = vec![ALWAYS];

    match discriminants.engine {
        None => return Ok(groups),
        Some(DynamicSimulatorEngine::Microsimulation) => {
            groups.push(MICROSIMULATION);
            if discriminants.apply_two_lanes {
                groups.push(TWO_LANES);
            }
            if discriminants.apply_two_way_overtaking_model {
                groups.push(TWO_WAY_OVERTAKING);
            }
        }
        Some(other) => {
            return Err(ConfigError::NotImplemented(format!(
                "{other:?} experiments"
            )))
        }
    }

    match discriminants.engine_mode {
        None => {}
        Some(DynamicSimulationEngineMode::IterativeAssignment) => groups.push(ITERATIVE),
        Some(DynamicSimulationEngineMode::OneShotAssignment) => {
            groups.push(ONE_SHOT);
            if let Some(extra) = discriminants.route_choice_model.and_then(route_choice_group) {
                groups.push(extra);
            }
        }
    }

    Ok(groups)
}
