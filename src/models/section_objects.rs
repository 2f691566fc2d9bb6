// section_objects.rs
//
// Objects placed on top of a road section: detectors and meterings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::enums::MeteringType;
use super::identity::ObjectIdentity;
use crate::global_variables::{DETECTOR_EXTERNAL_ID_PREFIX, METERING_EXTERNAL_ID_PREFIX};
use crate::validation::checks::{
    finite, non_negative, non_negative_int, note_missing, CheckedRecord, TypeIssue,
};

/// External id given to a detector created from the detector with internal id `id`.
pub fn detector_external_id(id: i64) -> String {
    format!("{DETECTOR_EXTERNAL_ID_PREFIX}{id}")
}

/// External id given to a metering that has none, based on its section.
pub fn metering_external_id(section_internal_id: i64) -> String {
    format!("{METERING_EXTERNAL_ID_PREFIX}{section_internal_id}")
}

/// Placement shared by everything that sits on one section of one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionObject {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub layer_id: Option<i64>,
    pub section_internal_id: Option<i64>,
    /// First lane covered, counted from the rightmost lane.
    pub from_lane: Option<i64>,
    /// Last lane covered, inclusive.
    pub to_lane: Option<i64>,
    pub length: Option<f64>,
    /// Distance from the start of the section.
    pub position: Option<f64>,
}

impl SectionObject {
    pub fn on_section(external_id: impl Into<String>, section_internal_id: i64) -> Self {
        Self {
            identity: ObjectIdentity::with_external_id(external_id),
            section_internal_id: Some(section_internal_id),
            ..Self::default()
        }
    }

    fn note_missing_placement(&self, missing: &mut Vec<String>) {
        note_missing(missing, "external_id", &self.identity.external_id);
        note_missing(missing, "section_internal_id", &self.section_internal_id);
    }

    fn note_missing_geometry(&self, missing: &mut Vec<String>) {
        note_missing(missing, "from_lane", &self.from_lane);
        note_missing(missing, "to_lane", &self.to_lane);
        note_missing(missing, "length", &self.length);
        note_missing(missing, "position", &self.position);
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let lanes = match (self.from_lane, self.to_lane) {
            (Some(from), Some(to)) if from > to => Some(TypeIssue::new(
                "from_lane",
                format!("lane range {from}..={to} is reversed"),
            )),
            _ => None,
        };
        self.identity
            .type_issue()
            .or_else(|| non_negative_int("section_internal_id", self.section_internal_id))
            .or_else(|| non_negative_int("from_lane", self.from_lane))
            .or(lanes)
            .or_else(|| non_negative("length", self.length))
            .or_else(|| non_negative("position", self.position))
    }
}

impl fmt::Display for SectionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)?;
        if let Some(section) = self.section_internal_id {
            write!(f, " on section {section}")?;
        }
        if let (Some(from), Some(to)) = (self.from_lane, self.to_lane) {
            write!(f, " lanes {from}..={to}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Only identity and section are known; geometry is derived from the
    /// section when the detector is created in the simulator.
    Flow,
    /// Fully described detector used by actuated control.
    Measurement,
}

/// What a measurement detector can sense, and where.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorCapabilities {
    pub detect_count: Option<bool>,
    pub detect_density: Option<bool>,
    pub detect_equipped_vehicles: Option<bool>,
    pub detect_headway: Option<bool>,
    pub detect_occupancy: Option<bool>,
    pub detect_presence: Option<bool>,
    pub detect_speed: Option<bool>,
    /// Only used by the SCATS interface.
    pub extended_length: Option<f64>,
    pub number_of_lanes: Option<i64>,
    pub offset: Option<f64>,
    pub position_from_end: Option<f64>,
}

impl DetectorCapabilities {
    /// Capabilities with every detection flag set to `enabled`.
    pub fn all(enabled: bool) -> Self {
        Self {
            detect_count: Some(enabled),
            detect_density: Some(enabled),
            detect_equipped_vehicles: Some(enabled),
            detect_headway: Some(enabled),
            detect_occupancy: Some(enabled),
            detect_presence: Some(enabled),
            detect_speed: Some(enabled),
            extended_length: Some(0.0),
            number_of_lanes: Some(1),
            offset: Some(0.0),
            position_from_end: Some(0.0),
        }
    }

    fn note_missing(&self, missing: &mut Vec<String>) {
        note_missing(missing, "capabilities.detect_count", &self.detect_count);
        note_missing(missing, "capabilities.detect_density", &self.detect_density);
        note_missing(missing, "capabilities.detect_equipped_vehicles", &self.detect_equipped_vehicles);
        note_missing(missing, "capabilities.detect_headway", &self.detect_headway);
        note_missing(missing, "capabilities.detect_occupancy", &self.detect_occupancy);
        note_missing(missing, "capabilities.detect_presence", &self.detect_presence);
        note_missing(missing, "capabilities.detect_speed", &self.detect_speed);
        note_missing(missing, "capabilities.extended_length", &self.extended_length);
        note_missing(missing, "capabilities.number_of_lanes", &self.number_of_lanes);
        note_missing(missing, "capabilities.offset", &self.offset);
        note_missing(missing, "capabilities.position_from_end", &self.position_from_end);
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        non_negative("extended_length", self.extended_length)
            .or_else(|| non_negative_int("number_of_lanes", self.number_of_lanes))
            .or_else(|| finite("offset", self.offset))
            .or_else(|| non_negative("position_from_end", self.position_from_end))
            .map(|issue| issue.within_record("capabilities"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detector {
    pub section: SectionObject,
    pub kind: DetectorKind,
    /// Present exactly when `kind` is `Measurement`.
    pub capabilities: Option<DetectorCapabilities>,
}

impl Detector {
    pub fn flow(external_id: impl Into<String>, section_internal_id: i64) -> Self {
        Self {
            section: SectionObject::on_section(external_id, section_internal_id),
            kind: DetectorKind::Flow,
            capabilities: None,
        }
    }

    pub fn measurement(section: SectionObject, capabilities: DetectorCapabilities) -> Self {
        Self {
            section,
            kind: DetectorKind::Measurement,
            capabilities: Some(capabilities),
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        self.section.identity.external_id()
    }
}

impl CheckedRecord for Detector {
    const TYPE_NAME: &'static str = "Detector";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        self.section.note_missing_placement(&mut missing);
        match self.kind {
            DetectorKind::Flow => {}
            DetectorKind::Measurement => {
                self.section.note_missing_geometry(&mut missing);
                match &self.capabilities {
                    Some(capabilities) => capabilities.note_missing(&mut missing),
                    None => missing.push("capabilities".to_string()),
                }
            }
        }
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let variant = match (self.kind, &self.capabilities) {
            (DetectorKind::Flow, Some(_)) => Some(TypeIssue::new(
                "capabilities",
                "flow detectors take their capabilities from the section",
            )),
            _ => None,
        };
        variant
            .or_else(|| self.section.type_issue())
            .or_else(|| self.capabilities.as_ref().and_then(|c| c.type_issue()))
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Detector ({:?}) {}", self.kind, self.section)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metering {
    pub section: SectionObject,
    pub metering_type: Option<MeteringType>,
    /// Maximum flow in vehicles per hour, only for flow-regulated types.
    pub vehicle_flow: Option<i64>,
}

impl Metering {
    pub fn new(section: SectionObject, metering_type: MeteringType) -> Self {
        Self {
            section,
            metering_type: Some(metering_type),
            vehicle_flow: None,
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        self.section.identity.external_id()
    }
}

impl CheckedRecord for Metering {
    const TYPE_NAME: &'static str = "Metering";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        self.section.note_missing_placement(&mut missing);
        self.section.note_missing_geometry(&mut missing);
        note_missing(&mut missing, "metering_type", &self.metering_type);
        if self.metering_type.is_some_and(MeteringType::regulates_flow) {
            note_missing(&mut missing, "vehicle_flow", &self.vehicle_flow);
        }
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let variant = match (self.metering_type, self.vehicle_flow) {
            (Some(kind), Some(_)) if !kind.regulates_flow() => Some(TypeIssue::new(
                "vehicle_flow",
                format!("{kind:?} meterings do not regulate flow"),
            )),
            _ => None,
        };
        variant
            .or_else(|| self.section.type_issue())
            .or_else(|| non_negative_int("vehicle_flow", self.vehicle_flow))
    }
}

impl fmt::Display for Metering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Metering {}", self.section)?;
        if let Some(kind) = self.metering_type {
            write!(f, " {kind:?}")?;
        }
        if let Some(flow) = self.vehicle_flow {
            write!(f, " max {flow} veh/h")?;
        }
        Ok(())
    }
}

/// Counts measured by one detector, keyed by seconds from midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRealData {
    pub detector: Detector,
    pub flow_data: BTreeMap<u32, f64>,
}

impl FlowRealData {
    pub fn new(detector: Detector) -> Self {
        Self {
            detector,
            flow_data: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, hour: u32, minute: u32, count: f64) {
        self.flow_data.insert(hour * 3600 + minute * 60, count);
    }
}

impl CheckedRecord for FlowRealData {
    const TYPE_NAME: &'static str = "FlowRealData";

    fn missing_attributes(&self) -> Vec<String> {
        // The CSV export only needs the detector's external id.
        let mut missing = Vec::new();
        note_missing(&mut missing, "detector.external_id", &self.detector.section.identity.external_id);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let bad_time = self
            .flow_data
            .keys()
            .find(|seconds| **seconds >= 24 * 3600)
            .map(|seconds| TypeIssue::new("flow_data", format!("time {seconds}s is past midnight")));
        bad_time
            .or_else(|| {
                self.flow_data
                    .iter()
                    .find_map(|(seconds, count)| non_negative(&format!("flow_data[{seconds}]"), Some(*count)))
            })
            .or_else(|| self.detector.section.identity.type_issue().map(|i| i.within_record("detector")))
    }
}
