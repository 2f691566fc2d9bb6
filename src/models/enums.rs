// enums.rs
//
// Closed vocabularies shared by the records. Integer codes match the ones the
// simulator uses for the same concept.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a centroid sits inside the studied area or on its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CentroidType {
    Internal,
    External,
}

impl CentroidType {
    pub fn as_str(self) -> &'static str {
        match self {
            CentroidType::Internal => "Internal",
            CentroidType::External => "External",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Internal" => Some(CentroidType::Internal),
            "External" => Some(CentroidType::External),
            _ => None,
        }
    }
}

/// Demand segments. Residents live in the studied city, travelers cross it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleTypeName {
    Resident,
    Traveler,
}

impl VehicleTypeName {
    pub const ALL: [VehicleTypeName; 2] = [VehicleTypeName::Resident, VehicleTypeName::Traveler];

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleTypeName::Resident => "Resident",
            VehicleTypeName::Traveler => "Traveler",
        }
    }

    /// Internal id of the matching vehicle type in the simulator project.
    pub fn internal_id(self) -> i64 {
        match self {
            VehicleTypeName::Resident => 151_590_241,
            VehicleTypeName::Traveler => 151_590_242,
        }
    }
}

impl fmt::Display for VehicleTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeteringType {
    GreenTime = 0,
    Flow = 1,
    Delay = 2,
    FlowAlinea = 3,
    GreenTimeByLane = 4,
}

impl MeteringType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MeteringType::GreenTime),
            1 => Some(MeteringType::Flow),
            2 => Some(MeteringType::Delay),
            3 => Some(MeteringType::FlowAlinea),
            4 => Some(MeteringType::GreenTimeByLane),
            _ => None,
        }
    }

    /// Flow-regulated meterings carry a maximum vehicle flow.
    pub fn regulates_flow(self) -> bool {
        matches!(self, MeteringType::Flow | MeteringType::FlowAlinea)
    }
}

/// Kinds of change a traffic policy can apply to a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioChangeType {
    LaneClosing = 0,
    SpeedChange = 1,
    ForceTurning = 2,
    DestinationChange = 3,
    Incident = 4,
    DemandModification = 5,
    TurningRestriction = 6,
    ControlPlanChange = 7,
    PeriodicIncident = 8,
    SectionBehaviorParamChange = 9,
    TurningBehaviorParamChange = 10,
    DisableReserved = 11,
    RoadPricing = 12,
    RoadPricingChange = 13,
    MeteringOnRampChange = 14,
    IntersectionPlanChange = 15,
    ForceEnrouteAssignment = 16,
    TurningCooperation = 17,
    ParkAndRideChange = 18,
    None = 19,
}

impl ScenarioChangeType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        let all = [
            Self::LaneClosing,
            Self::SpeedChange,
            Self::ForceTurning,
            Self::DestinationChange,
            Self::Incident,
            Self::DemandModification,
            Self::TurningRestriction,
            Self::ControlPlanChange,
            Self::PeriodicIncident,
            Self::SectionBehaviorParamChange,
            Self::TurningBehaviorParamChange,
            Self::DisableReserved,
            Self::RoadPricing,
            Self::RoadPricingChange,
            Self::MeteringOnRampChange,
            Self::IntersectionPlanChange,
            Self::ForceEnrouteAssignment,
            Self::TurningCooperation,
            Self::ParkAndRideChange,
            Self::None,
        ];
        all.into_iter().find(|change| change.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlJunctionType {
    Unspecified = 0,
    Uncontrolled = 1,
    FixedControl = 2,
    External = 3,
    Actuated = 4,
}

impl ControlJunctionType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        [
            Self::Unspecified,
            Self::Uncontrolled,
            Self::FixedControl,
            Self::External,
            Self::Actuated,
        ]
        .into_iter()
        .find(|kind| kind.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMeteringType {
    Unspecified = 0,
    Uncontrolled = 1,
    FixedControl = 2,
    External = 3,
}

impl ControlMeteringType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        [Self::Unspecified, Self::Uncontrolled, Self::FixedControl, Self::External]
            .into_iter()
            .find(|kind| kind.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlPhaseRecall {
    No = 0,
    Min = 1,
    Max = 2,
    Coord = 3,
}

impl ControlPhaseRecall {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        [Self::No, Self::Min, Self::Max, Self::Coord]
            .into_iter()
            .find(|recall| recall.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlashingType {
    No = 0,
    FlashingGreen = 1,
    FlashingYellow = 2,
    FlashingRed = 3,
}

impl FlashingType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        [Self::No, Self::FlashingGreen, Self::FlashingYellow, Self::FlashingRed]
            .into_iter()
            .find(|flashing| flashing.code() == code)
    }
}

/// Network loading used by a dynamic experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DynamicSimulatorEngine {
    Microsimulation = 0,
    Mesosimulation = 1,
    HybridSimulation = 2,
    DynamicMacrosimulation = 3,
}

impl DynamicSimulatorEngine {
    pub fn code(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DynamicSimulationEngineMode {
    IterativeAssignment = 0,
    OneShotAssignment = 1,
}

impl DynamicSimulationEngineMode {
    pub fn code(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StochasticRouteChoiceModel {
    FixedDistance = 0,
    FixedTime = 1,
    Binomial = 2,
    Proportional = 3,
    Logit = 4,
    CLogit = 5,
    UserDefined = 6,
}

impl StochasticRouteChoiceModel {
    pub fn code(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DynamicUserEquilibriumAssignmentModel {
    Msa = 0,
    WeightedMsa = 1,
    GradientBased = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarFollowingVersion {
    #[serde(rename = "VERSION_4_1")]
    Version4_1 = 0,
    #[serde(rename = "VERSION_4_2")]
    Version4_2 = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionTimeType {
    EqualToSimulationStep = 0,
    PerVehicleType = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TwoLaneCarFollowingModel {
    Absolute = 0,
    Relative = 1,
    AdjacentPaths = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrankWolfeMethod {
    Normal = 0,
    Conjugate = 1,
}

impl FrankWolfeMethod {
    pub fn code(self) -> i64 {
        self as i64
    }
}
