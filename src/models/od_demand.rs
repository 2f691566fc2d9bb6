// od_demand.rs

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::enums::VehicleTypeName;
use super::identity::ObjectIdentity;
use crate::global_variables::DEFAULT_DEMAND_FACTOR;
use crate::validation::checks::{
    finite, first_nested_issue, non_blank, note_missing, note_missing_nested, CheckedRecord, TypeIssue,
};

/// External id of the OD matrix holding the demand of `vehicle_type` that
/// starts at `time`, e.g. `Resident_14_15`.
pub fn od_matrix_external_id(time: NaiveTime, vehicle_type: VehicleTypeName) -> String {
    format!("{}_{}", vehicle_type.as_str(), time.format("%H_%M"))
}

/// Trips between two centroids during one matrix window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OdTripsCount {
    pub origin_centroid_external_id: Option<String>,
    pub destination_centroid_external_id: Option<String>,
    pub num_trips: Option<f64>,
}

impl OdTripsCount {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, num_trips: f64) -> Self {
        Self {
            origin_centroid_external_id: Some(origin.into()),
            destination_centroid_external_id: Some(destination.into()),
            num_trips: Some(num_trips),
        }
    }
}

impl CheckedRecord for OdTripsCount {
    const TYPE_NAME: &'static str = "OdTripsCount";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "origin_centroid_external_id", &self.origin_centroid_external_id);
        note_missing(&mut missing, "destination_centroid_external_id", &self.destination_centroid_external_id);
        note_missing(&mut missing, "num_trips", &self.num_trips);
        missing
    }

    // Trip counts are non-negative by convention only, so just finiteness is
    // enforced here.
    fn type_issue(&self) -> Option<TypeIssue> {
        non_blank("origin_centroid_external_id", self.origin_centroid_external_id.as_ref())
            .or_else(|| non_blank("destination_centroid_external_id", self.destination_centroid_external_id.as_ref()))
            .or_else(|| finite("num_trips", self.num_trips))
    }
}

/// One OD matrix per (time window, vehicle type) pair. The window is
/// `[begin_time_interval, end_time_interval)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OdMatrix {
    pub begin_time_interval: Option<NaiveTime>,
    pub end_time_interval: Option<NaiveTime>,
    pub vehicle_type: Option<VehicleTypeName>,
    pub od_trips_count: Vec<OdTripsCount>,
}

impl OdMatrix {
    pub fn new(begin: NaiveTime, end: NaiveTime, vehicle_type: VehicleTypeName) -> Self {
        Self {
            begin_time_interval: Some(begin),
            end_time_interval: Some(end),
            vehicle_type: Some(vehicle_type),
            od_trips_count: Vec::new(),
        }
    }

    /// External id this matrix gets inside the simulator.
    pub fn external_id(&self) -> Option<String> {
        match (self.begin_time_interval, self.vehicle_type) {
            (Some(begin), Some(vehicle_type)) => Some(od_matrix_external_id(begin, vehicle_type)),
            _ => None,
        }
    }

    pub fn total_trips(&self) -> f64 {
        self.od_trips_count.iter().filter_map(|count| count.num_trips).sum()
    }
}

impl CheckedRecord for OdMatrix {
    const TYPE_NAME: &'static str = "OdMatrix";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "begin_time_interval", &self.begin_time_interval);
        note_missing(&mut missing, "end_time_interval", &self.end_time_interval);
        note_missing(&mut missing, "vehicle_type", &self.vehicle_type);
        note_missing_nested(&mut missing, "od_trips_count", &self.od_trips_count);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let window = match (self.begin_time_interval, self.end_time_interval) {
            (Some(begin), Some(end)) if begin >= end => Some(TypeIssue::new(
                "end_time_interval",
                format!("window {begin}..{end} is empty"),
            )),
            _ => None,
        };
        window.or_else(|| first_nested_issue("od_trips_count", &self.od_trips_count))
    }
}

impl fmt::Display for OdMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OD matrix {} ({} pairs, {} trips)",
            self.external_id().unwrap_or_else(|| "<incomplete>".to_string()),
            self.od_trips_count.len(),
            self.total_trips()
        )
    }
}

/// Reference from a traffic demand to one OD matrix, scaled by a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDemandItem {
    pub demand_external_id: Option<String>,
    /// Percentage of the matrix demand to load, kept as text because the
    /// simulator accepts expressions here.
    pub demand_factor: Option<String>,
}

impl ScheduleDemandItem {
    pub fn new(begin_time: NaiveTime, vehicle_type: VehicleTypeName) -> Self {
        Self {
            demand_external_id: Some(od_matrix_external_id(begin_time, vehicle_type)),
            demand_factor: Some(DEFAULT_DEMAND_FACTOR.to_string()),
        }
    }
}

impl CheckedRecord for ScheduleDemandItem {
    const TYPE_NAME: &'static str = "ScheduleDemandItem";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "demand_external_id", &self.demand_external_id);
        note_missing(&mut missing, "demand_factor", &self.demand_factor);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        non_blank("demand_external_id", self.demand_external_id.as_ref())
            .or_else(|| non_blank("demand_factor", self.demand_factor.as_ref()))
    }
}

/// The demand of one scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficDemand {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub demand_items: Vec<ScheduleDemandItem>,
}

impl TrafficDemand {
    /// The name doubles as the external id.
    pub fn new(external_id: impl Into<String>) -> Self {
        let external_id = external_id.into();
        Self {
            identity: ObjectIdentity::new(external_id.clone(), external_id),
            demand_items: Vec::new(),
        }
    }

    /// One item per vehicle type for each start time.
    pub fn schedule_all(&mut self, start_times: &[NaiveTime]) {
        for time in start_times {
            for vehicle_type in VehicleTypeName::ALL {
                self.demand_items.push(ScheduleDemandItem::new(*time, vehicle_type));
            }
        }
    }
}

impl CheckedRecord for TrafficDemand {
    const TYPE_NAME: &'static str = "TrafficDemand";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "external_id", &self.identity.external_id);
        note_missing_nested(&mut missing, "demand_items", &self.demand_items);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        self.identity
            .type_issue()
            .or_else(|| first_nested_issue("demand_items", &self.demand_items))
    }
}

impl fmt::Display for TrafficDemand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Traffic demand {} ({} items)", self.identity, self.demand_items.len())
    }
}
