// models/mod.rs

pub mod centroid;
pub mod control;
pub mod enums;
pub mod experiment;
pub mod identity;
pub mod od_demand;
pub mod scenario;
pub mod section;
pub mod section_objects;
pub mod traffic_management;

pub use centroid::CentroidConnection;
pub use control::{
    ActuatedJunctionSettings, ActuatedPhaseSettings, ControlDetector, ControlJunction, ControlMetering, ControlPhase,
    ControlPhaseSignal, ControlPlan, MasterControlPlanItem,
};
pub use experiment::{ExperimentField, ExperimentParameters, FrankWolfeParameters, MicroExperiment, Replication, StaticMacroExperiment};
pub use identity::ObjectIdentity;
pub use od_demand::{od_matrix_external_id, OdMatrix, OdTripsCount, ScheduleDemandItem, TrafficDemand};
pub use scenario::{
    DataBaseInfo, MacroScenarioOutputData, PathAssignment, Scenario, ScenarioInputData, ScenarioLinks,
    StaticMacroScenario, TrajectoryCondition,
};
pub use section::SectionSpeedLimitAndCapacity;
pub use section_objects::{
    detector_external_id, metering_external_id, Detector, DetectorCapabilities, DetectorKind, FlowRealData, Metering,
    SectionObject,
};
pub use traffic_management::{TrafficPolicy, TurningClosingChange};
