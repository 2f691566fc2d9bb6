// catalog.rs
//
// The part of the simulator the configuration layer talks to: a catalog of
// typed objects with names, external ids and attribute values.

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};

/// Internal id assigned by the simulator.
pub type ObjectId = i64;

// Attribute names shared by the importers and the exporters.
pub const ATT_ACTIVATE_PATH_STATISTICS: &str = "activate_path_statistics";
pub const ATT_AUTOMATIC: &str = "automatic";
pub const ATT_AUTOMATICALLY_CREATED: &str = "automatically_created";
pub const ATT_BARRIERS: &str = "barriers";
pub const ATT_BASE_DATE: &str = "base_date";
pub const ATT_BEGIN: &str = "begin";
pub const ATT_CALL_DELAY: &str = "call_delay";
pub const ATT_CAPACITY: &str = "capacity";
pub const ATT_CENTROID_CONFIGURATION: &str = "centroid_configuration";
pub const ATT_CENTROID_TYPE: &str = "centroid_type";
pub const ATT_CENTROIDS: &str = "centroids";
pub const ATT_CHANGE_TYPE: &str = "change_type";
pub const ATT_CHANGES: &str = "changes";
pub const ATT_CONTROL_METERING_TYPE: &str = "control_metering_type";
pub const ATT_CONTROL_PLAN: &str = "control_plan";
pub const ATT_CONVERGENCE_STATISTICS: &str = "convergence_statistics";
pub const ATT_CYCLE: &str = "cycle";
pub const ATT_DATABASE_NAME: &str = "database_name";
pub const ATT_DATE: &str = "date";
pub const ATT_DEMAND: &str = "demand";
pub const ATT_DEPARTURE_TIME: &str = "departure_time";
pub const ATT_DESTINATION: &str = "destination";
pub const ATT_DETECTION_INTERVAL: &str = "detection_interval";
pub const ATT_DETECTOR: &str = "detector";
pub const ATT_DETECTORS: &str = "detectors";
pub const ATT_DRIVER_NAME: &str = "driver_name";
pub const ATT_DURATION: &str = "duration";
pub const ATT_ENGINE: &str = "engine";
pub const ATT_EXPERIMENTS: &str = "experiments";
pub const ATT_FACTOR: &str = "factor";
pub const ATT_FILENAME: &str = "filename";
pub const ATT_FLASHING_TYPE: &str = "flashing_type";
pub const ATT_FORCE_OFF: &str = "force_off";
pub const ATT_FROM_LANE: &str = "from_lane";
pub const ATT_FROM_SECTION: &str = "from_section";
pub const ATT_FROM_SECTIONS: &str = "from_sections";
pub const ATT_FROM_TIME: &str = "from_time";
pub const ATT_GAP_REDUCTION: &str = "gap_reduction";
pub const ATT_GENERATE_SKIM: &str = "generate_skim";
pub const ATT_GLOBAL_TRAJECTORIES_STATISTICS: &str = "global_trajectories_statistics";
pub const ATT_GROUP_STATISTICS: &str = "group_statistics";
pub const ATT_HOLD: &str = "hold";
pub const ATT_ID_RING: &str = "id_ring";
pub const ATT_INTERPHASE: &str = "interphase";
pub const ATT_IS_DEFAULT: &str = "is_default";
pub const ATT_JUNCTION_TYPE: &str = "junction_type";
pub const ATT_JUNCTIONS: &str = "junctions";
pub const ATT_LATITUDE: &str = "latitude";
pub const ATT_LAYER: &str = "layer";
pub const ATT_LENGTH: &str = "length";
pub const ATT_LINES_TO_SKIP: &str = "lines_to_skip";
pub const ATT_LOCKING: &str = "locking";
pub const ATT_LONGITUDE: &str = "longitude";
pub const ATT_MASTER_CONTROL_PLAN: &str = "master_control_plan";
pub const ATT_MATCHES_OFFSET_WITH_END_OF_PHASE: &str = "matches_offset_with_end_of_phase";
pub const ATT_MAX_DURATION: &str = "max_duration";
pub const ATT_MAX_ITERATIONS: &str = "max_iterations";
pub const ATT_MAX_RELATIVE_GAP: &str = "max_relative_gap";
pub const ATT_MAXIMUM_INITIAL: &str = "maximum_initial";
pub const ATT_METERING: &str = "metering";
pub const ATT_METERING_TYPE: &str = "metering_type";
pub const ATT_METERINGS: &str = "meterings";
pub const ATT_METHOD: &str = "method";
pub const ATT_MIN_DURATION: &str = "min_duration";
pub const ATT_MINIMUM_GAP: &str = "minimum_gap";
pub const ATT_NAME: &str = "name";
pub const ATT_NODE: &str = "node";
pub const ATT_NUM_LANES: &str = "num_lanes";
pub const ATT_NUM_PHASES: &str = "num_phases";
pub const ATT_OD_MATRIX: &str = "od_matrix";
pub const ATT_OFFSET: &str = "offset";
pub const ATT_ORIGIN: &str = "origin";
pub const ATT_PASSAGE_TIME: &str = "passage_time";
pub const ATT_PATH_ASSIGNMENT_FILE: &str = "path_assignment_file";
pub const ATT_PERCENTAGE: &str = "percentage";
pub const ATT_PERMISSIVE_PERIOD_FROM: &str = "permissive_period_from";
pub const ATT_PERMISSIVE_PERIOD_TO: &str = "permissive_period_to";
pub const ATT_PHASE_ACTIVATION: &str = "phase_activation";
pub const ATT_PHASE_EXTENSION: &str = "phase_extension";
pub const ATT_PHASES: &str = "phases";
pub const ATT_POLICIES: &str = "policies";
pub const ATT_POSITION: &str = "position";
pub const ATT_POSITION_FROM_END: &str = "position_from_end";
pub const ATT_RANDOM_SEED: &str = "random_seed";
pub const ATT_REAL_DATA_SET: &str = "real_data_set";
pub const ATT_RECALL: &str = "recall";
pub const ATT_RECORD_SIMULATION: &str = "record_simulation";
pub const ATT_REPLICATIONS: &str = "replications";
pub const ATT_REST_IN_RED: &str = "rest_in_red";
pub const ATT_SCHEDULE: &str = "schedule";
pub const ATT_SECONDS_ACTUATION: &str = "seconds_actuation";
pub const ATT_SECTION: &str = "section";
pub const ATT_SECTION_TRAJECTORIES_STATISTICS: &str = "section_trajectories_statistics";
pub const ATT_SEPARATOR: &str = "separator";
pub const ATT_SIGNAL: &str = "signal";
pub const ATT_SIGNALS: &str = "signals";
pub const ATT_SINGLE_ENTRY: &str = "single_entry";
pub const ATT_SPEED: &str = "speed";
pub const ATT_STATISTICAL_INTERVAL: &str = "statistical_interval";
pub const ATT_STORE_STATISTICS: &str = "store_statistics";
pub const ATT_STRATEGIES: &str = "strategies";
pub const ATT_TIME_BEFORE_REDUCE: &str = "time_before_reduce";
pub const ATT_TIME_TO_REDUCE: &str = "time_to_reduce";
pub const ATT_TO_LANE: &str = "to_lane";
pub const ATT_TO_SECTION: &str = "to_section";
pub const ATT_TO_SECTIONS: &str = "to_sections";
pub const ATT_TRAJECTORIES_STATISTICS: &str = "trajectories_statistics";
pub const ATT_TRAJECTORY_CONDITIONS: &str = "trajectory_conditions";
pub const ATT_TRIPS: &str = "trips";
pub const ATT_USE_PROJECT_DB: &str = "use_project_db";
pub const ATT_VEHICLE_FLOW: &str = "vehicle_flow";
pub const ATT_VEHICLE_TYPE: &str = "vehicle_type";
pub const ATT_YELLOW_BOX: &str = "yellow_box";
pub const ATT_YELLOW_TIME: &str = "yellow_time";
pub const ATT_ZONE: &str = "zone";

/// Detector capabilities stored as booleans, named like the record fields.
pub const DETECTION_FLAGS: [&str; 7] = [
    "detect_count",
    "detect_density",
    "detect_equipped_vehicles",
    "detect_headway",
    "detect_occupancy",
    "detect_presence",
    "detect_speed",
];
pub const ATT_EXTENDED_LENGTH: &str = "extended_length";
pub const ATT_NUMBER_OF_LANES: &str = "number_of_lanes";
pub const ATT_DETECTOR_OFFSET: &str = "detector_offset";

/// One row of a `Records` attribute.
pub type Record = BTreeMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Reference(ObjectId),
    References(Vec<ObjectId>),
    /// (origin, destination, trips) between two centroid objects.
    Trips(Vec<(ObjectId, ObjectId, f64)>),
    Ints(Vec<i64>),
    /// Nested rows, e.g. the items of a schedule.
    Records(Vec<BTreeMap<String, AttributeValue>>),
}

impl AttributeValue {
    fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Int(_) => "int",
            AttributeValue::Float(_) => "float",
            AttributeValue::Text(_) => "text",
            AttributeValue::Reference(_) => "reference",
            AttributeValue::References(_) => "reference list",
            AttributeValue::Trips(_) => "trip list",
            AttributeValue::Ints(_) => "int list",
            AttributeValue::Records(_) => "record list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(value) => Some(*value),
            AttributeValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            AttributeValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_references(&self) -> Option<&[ObjectId]> {
        match self {
            AttributeValue::References(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn as_trips(&self) -> Option<&[(ObjectId, ObjectId, f64)]> {
        match self {
            AttributeValue::Trips(trips) => Some(trips),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            AttributeValue::Ints(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[BTreeMap<String, AttributeValue>]> {
        match self {
            AttributeValue::Records(rows) => Some(rows),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<Vec<ObjectId>> for AttributeValue {
    fn from(ids: Vec<ObjectId>) -> Self {
        AttributeValue::References(ids)
    }
}

/// Typed reads from an attribute map, failing with the owner in the message.
pub struct AttributeReader<'a> {
    owner: String,
    attributes: &'a BTreeMap<String, AttributeValue>,
}

impl<'a> AttributeReader<'a> {
    pub fn new(owner: impl Into<String>, attributes: &'a BTreeMap<String, AttributeValue>) -> Self {
        Self {
            owner: owner.into(),
            attributes,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn optional(&self, name: &str) -> Option<&'a AttributeValue> {
        self.attributes.get(name)
    }

    fn typed<T>(&self, name: &str, read: impl FnOnce(&'a AttributeValue) -> Option<T>) -> ConfigResult<T> {
        let value = self
            .attributes
            .get(name)
            .ok_or_else(|| ConfigError::missing(self.owner.clone(), name))?;
        let kind = value.kind();
        read(value).ok_or_else(|| ConfigError::wrong_type(self.owner.clone(), None, name, format!("unexpected {kind}")))
    }

    pub fn bool(&self, name: &str) -> ConfigResult<bool> {
        self.typed(name, AttributeValue::as_bool)
    }

    pub fn int(&self, name: &str) -> ConfigResult<i64> {
        self.typed(name, AttributeValue::as_int)
    }

    pub fn float(&self, name: &str) -> ConfigResult<f64> {
        self.typed(name, AttributeValue::as_float)
    }

    pub fn text(&self, name: &str) -> ConfigResult<&'a str> {
        self.typed(name, AttributeValue::as_text)
    }

    pub fn reference(&self, name: &str) -> ConfigResult<ObjectId> {
        self.typed(name, AttributeValue::as_reference)
    }

    pub fn references(&self, name: &str) -> ConfigResult<&'a [ObjectId]> {
        self.typed(name, AttributeValue::as_references)
    }

    pub fn trips(&self, name: &str) -> ConfigResult<&'a [(ObjectId, ObjectId, f64)]> {
        self.typed(name, AttributeValue::as_trips)
    }

    pub fn ints(&self, name: &str) -> ConfigResult<&'a [i64]> {
        self.typed(name, AttributeValue::as_ints)
    }

    pub fn records(&self, name: &str) -> ConfigResult<&'a [BTreeMap<String, AttributeValue>]> {
        self.typed(name, AttributeValue::as_records)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogObject {
    pub id: ObjectId,
    pub type_name: String,
    pub name: Option<String>,
    pub external_id: Option<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl CatalogObject {
    pub fn reader(&self) -> AttributeReader<'_> {
        AttributeReader::new(format!("{} {}", self.type_name, self.id), &self.attributes)
    }
}

/// Operations the configuration layer needs from a simulator model.
pub trait SimulatorCatalog {
    fn find_by_external_id(&self, external_id: &str) -> Vec<&CatalogObject>;

    fn find_by_internal_id(&self, id: ObjectId) -> Option<&CatalogObject>;

    fn objects_of_type(&self, type_name: &str) -> Vec<&CatalogObject>;

    fn create_object(&mut self, type_name: &str, name: Option<&str>, external_id: Option<&str>) -> ObjectId;

    fn set_attribute(&mut self, id: ObjectId, attribute: &str, value: AttributeValue) -> ConfigResult<()>;

    fn attribute(&self, id: ObjectId, attribute: &str) -> Option<&AttributeValue> {
        self.find_by_internal_id(id)
            .and_then(|object| object.attributes.get(attribute))
    }

    fn delete_object(&mut self, id: ObjectId) -> ConfigResult<()>;

    /// Commit pending commands. Deletions are only final after this.
    fn flush_commands(&mut self);

    /// Surface an error in the simulator's own log.
    fn report_error(&mut self, source: &str, message: &str);
}
