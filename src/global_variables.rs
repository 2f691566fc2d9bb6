// Configuration files
pub const CONFIG_FILE_EXTENSION: &str = "pkl";
pub const FORMAT_VERSION: u32 = 1;

// Real data set CSV
pub const CSV_SEPARATOR: u8 = b',';
pub const REAL_DATA_SET_CSV_HEADER: [&str; 3] = ["Detector External Id", "15 minutes Count", "Time"];
pub const REAL_DATA_SET_LINES_TO_SKIP: u32 = 1;

// Default external ids
pub const CENTROID_CONFIG_EXTERNAL_ID: &str = "centroid_configuration";
pub const MASTER_CONTROL_PLAN_EXTERNAL_ID: &str = "master_control_plan";
pub const REAL_DATA_SET_EXTERNAL_ID: &str = "real_dataset";
pub const TRAFFIC_STRATEGY_EXTERNAL_ID: &str = "Current Fremont Traffic Calming Strategy";

// Scenario defaults
pub const DATABASE_DRIVER_NAME: &str = "QSQLITE";
pub const SCENARIO_YEAR: i32 = 2019;
pub const SCENARIO_MONTH: u32 = 1;
pub const SCENARIO_DAY: u32 = 1;
pub const STATIC_MACRO_ENGINE: &str = "FrankWolfe";
pub const DEFAULT_DEMAND_FACTOR: &str = "100";
/// Share of trajectories recorded between two external centroids.
pub const EXTERNAL_TRAJECTORY_PERCENTAGE: f64 = 5.0;

// Layers
pub const NETWORK_LAYER_NAME: &str = "Network";
pub const OSM_LAYER_NAME: &str = "OpenStreetMap";

// Catalog object type names
pub const TYPE_CENTROID: &str = "GKCentroid";
pub const TYPE_CENTROID_CONFIGURATION: &str = "GKCentroidConfiguration";
pub const TYPE_OD_MATRIX: &str = "GKODMatrix";
pub const TYPE_SECTION: &str = "GKSection";
pub const TYPE_DETECTOR: &str = "GKDetector";
pub const TYPE_METERING: &str = "GKMetering";
pub const TYPE_CONTROL_PLAN: &str = "GKControlPlan";
pub const TYPE_MASTER_CONTROL_PLAN: &str = "GKMasterControlPlan";
pub const TYPE_TURNING_CLOSING_CHANGE: &str = "GKTurningClosingChange";
pub const TYPE_POLICY: &str = "GKPolicy";
pub const TYPE_STRATEGY: &str = "GKStrategy";
pub const TYPE_LAYER: &str = "GKLayer";
pub const TYPE_NODE: &str = "GKNode";
pub const TYPE_REAL_DATA_SET: &str = "GKRealDataSet";
pub const TYPE_TRAFFIC_DEMAND: &str = "GKTrafficDemand";
pub const TYPE_SCENARIO: &str = "GKScenario";
pub const TYPE_EXPERIMENT: &str = "GKExperiment";
pub const TYPE_REPLICATION: &str = "GKReplication";
pub const TYPE_MACRO_SCENARIO: &str = "MacroScenario";
pub const TYPE_MACRO_EXPERIMENT: &str = "MacroExperiment";

/// Types a project clean-up removes. The network itself (sections, nodes,
/// layers) is kept.
pub const PROJECT_OBJECT_TYPES: [&str; 19] = [
    TYPE_SCENARIO,
    TYPE_MACRO_SCENARIO,
    TYPE_EXPERIMENT,
    TYPE_MACRO_EXPERIMENT,
    TYPE_REPLICATION,
    TYPE_TRAFFIC_DEMAND,
    TYPE_REAL_DATA_SET,
    TYPE_MASTER_CONTROL_PLAN,
    TYPE_CONTROL_PLAN,
    TYPE_STRATEGY,
    TYPE_POLICY,
    TYPE_TURNING_CLOSING_CHANGE,
    TYPE_OD_MATRIX,
    TYPE_CENTROID_CONFIGURATION,
    TYPE_CENTROID,
    TYPE_DETECTOR,
    TYPE_METERING,
    "GKPathAssignment",
    "GKGenericScenario",
];

// Flow detector geometry
pub const FLOW_DETECTOR_LENGTH: f64 = 4.5;
pub const DETECTOR_EXTERNAL_ID_PREFIX: &str = "act_det_";
pub const METERING_EXTERNAL_ID_PREFIX: &str = "meter_on_";
