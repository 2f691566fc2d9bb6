// control.rs
//
// Signal control records. Actuated and fixed-time variants share one flat
// record each; the variant is chosen by the junction type and the actuated
// payload is only present for actuated junctions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::enums::{ControlJunctionType, ControlMeteringType, ControlPhaseRecall, FlashingType};
use super::identity::ObjectIdentity;
use crate::validation::checks::{
    finite, first_nested_issue, non_blank, non_negative, non_negative_int, note_missing, note_missing_nested,
    CheckedRecord, TypeIssue,
};

/// Detector feeding an actuated phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlDetector {
    pub detector_external_id: Option<String>,
    pub locking: Option<bool>,
    pub call_delay: Option<f64>,
    pub phase_activation: Option<bool>,
    pub phase_extension: Option<bool>,
}

impl CheckedRecord for ControlDetector {
    const TYPE_NAME: &'static str = "ControlDetector";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "detector_external_id", &self.detector_external_id);
        note_missing(&mut missing, "locking", &self.locking);
        note_missing(&mut missing, "call_delay", &self.call_delay);
        note_missing(&mut missing, "phase_activation", &self.phase_activation);
        note_missing(&mut missing, "phase_extension", &self.phase_extension);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        non_blank("detector_external_id", self.detector_external_id.as_ref())
            .or_else(|| non_negative("call_delay", self.call_delay))
    }
}

/// How a control plan drives one metering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlMetering {
    pub control_metering_type: Option<ControlMeteringType>,
    pub metering_external_id: Option<String>,
}

impl CheckedRecord for ControlMetering {
    const TYPE_NAME: &'static str = "ControlMetering";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "control_metering_type", &self.control_metering_type);
        note_missing(&mut missing, "metering_external_id", &self.metering_external_id);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        non_blank("metering_external_id", self.metering_external_id.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPhaseSignal {
    /// Signal group number at the node.
    pub signal: Option<i64>,
    pub name: Option<String>,
    pub flashing_type: Option<FlashingType>,
}

impl CheckedRecord for ControlPhaseSignal {
    const TYPE_NAME: &'static str = "ControlPhaseSignal";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "signal", &self.signal);
        note_missing(&mut missing, "name", &self.name);
        note_missing(&mut missing, "flashing_type", &self.flashing_type);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        non_negative_int("signal", self.signal)
    }
}

/// Parameters only actuated phases have.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatedPhaseSettings {
    pub id_ring: Option<i64>,
    pub recall: Option<ControlPhaseRecall>,
    pub is_default: Option<bool>,
    pub min_duration: Option<f64>,
    pub max_duration: Option<f64>,
    pub passage_time: Option<f64>,
    pub permissive_period_from: Option<f64>,
    pub permissive_period_to: Option<f64>,
    pub force_off: Option<f64>,
    pub hold: Option<bool>,
    pub maximum_initial: Option<f64>,
    pub seconds_actuation: Option<f64>,
    pub gap_reduction: Option<bool>,
    pub minimum_gap: Option<f64>,
    pub time_before_reduce: Option<f64>,
    pub time_to_reduce: Option<f64>,
    pub detectors: Vec<ControlDetector>,
}

impl ActuatedPhaseSettings {
    fn note_missing(&self, missing: &mut Vec<String>) {
        note_missing(missing, "actuated.id_ring", &self.id_ring);
        note_missing(missing, "actuated.recall", &self.recall);
        note_missing(missing, "actuated.is_default", &self.is_default);
        note_missing(missing, "actuated.min_duration", &self.min_duration);
        note_missing(missing, "actuated.max_duration", &self.max_duration);
        note_missing(missing, "actuated.passage_time", &self.passage_time);
        note_missing(missing, "actuated.permissive_period_from", &self.permissive_period_from);
        note_missing(missing, "actuated.permissive_period_to", &self.permissive_period_to);
        note_missing(missing, "actuated.force_off", &self.force_off);
        note_missing(missing, "actuated.hold", &self.hold);
        note_missing(missing, "actuated.maximum_initial", &self.maximum_initial);
        note_missing(missing, "actuated.seconds_actuation", &self.seconds_actuation);
        note_missing(missing, "actuated.gap_reduction", &self.gap_reduction);
        note_missing(missing, "actuated.minimum_gap", &self.minimum_gap);
        note_missing(missing, "actuated.time_before_reduce", &self.time_before_reduce);
        note_missing(missing, "actuated.time_to_reduce", &self.time_to_reduce);
        note_missing_nested(missing, "actuated.detectors", &self.detectors);
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let durations = match (self.min_duration, self.max_duration) {
            (Some(min), Some(max)) if min > max => Some(TypeIssue::new(
                "min_duration",
                format!("minimum {min}s exceeds maximum {max}s"),
            )),
            _ => None,
        };
        durations
            .or_else(|| non_negative("min_duration", self.min_duration))
            .or_else(|| non_negative("passage_time", self.passage_time))
            .or_else(|| finite("permissive_period_from", self.permissive_period_from))
            .or_else(|| finite("permissive_period_to", self.permissive_period_to))
            .or_else(|| finite("force_off", self.force_off))
            .or_else(|| non_negative("maximum_initial", self.maximum_initial))
            .or_else(|| non_negative("seconds_actuation", self.seconds_actuation))
            .or_else(|| non_negative("minimum_gap", self.minimum_gap))
            .or_else(|| non_negative("time_before_reduce", self.time_before_reduce))
            .or_else(|| non_negative("time_to_reduce", self.time_to_reduce))
            .or_else(|| first_nested_issue("detectors", &self.detectors))
            .map(|issue| issue.within_record("actuated"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPhase {
    /// Start of the phase, in seconds from the start of the cycle.
    pub from_time: Option<f64>,
    pub duration: Option<f64>,
    pub interphase: Option<bool>,
    pub signals: Vec<ControlPhaseSignal>,
    pub actuated: Option<ActuatedPhaseSettings>,
}

impl ControlPhase {
    pub fn fixed(from_time: f64, duration: f64, interphase: bool) -> Self {
        Self {
            from_time: Some(from_time),
            duration: Some(duration),
            interphase: Some(interphase),
            ..Self::default()
        }
    }

    pub fn is_actuated(&self) -> bool {
        self.actuated.is_some()
    }
}

impl CheckedRecord for ControlPhase {
    const TYPE_NAME: &'static str = "ControlPhase";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "from_time", &self.from_time);
        note_missing(&mut missing, "duration", &self.duration);
        note_missing(&mut missing, "interphase", &self.interphase);
        note_missing_nested(&mut missing, "signals", &self.signals);
        if let Some(actuated) = &self.actuated {
            actuated.note_missing(&mut missing);
        }
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        non_negative("from_time", self.from_time)
            .or_else(|| non_negative("duration", self.duration))
            .or_else(|| first_nested_issue("signals", &self.signals))
            .or_else(|| self.actuated.as_ref().and_then(ActuatedPhaseSettings::type_issue))
    }
}

/// Parameters only actuated junctions have.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatedJunctionSettings {
    pub barriers: Option<Vec<i64>>,
    pub num_phases: Option<i64>,
    pub rest_in_red: Option<bool>,
    pub matches_offset_with_end_of_phase: Option<bool>,
    pub yellow_time: Option<f64>,
    pub single_entry: Option<bool>,
}

impl ActuatedJunctionSettings {
    fn note_missing(&self, missing: &mut Vec<String>) {
        note_missing(missing, "actuated.barriers", &self.barriers);
        note_missing(missing, "actuated.num_phases", &self.num_phases);
        note_missing(missing, "actuated.rest_in_red", &self.rest_in_red);
        note_missing(
            missing,
            "actuated.matches_offset_with_end_of_phase",
            &self.matches_offset_with_end_of_phase,
        );
        note_missing(missing, "actuated.yellow_time", &self.yellow_time);
        note_missing(missing, "actuated.single_entry", &self.single_entry);
    }
}

/// A signalized intersection and its phase sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlJunction {
    pub node_id: Option<String>,
    pub junction_type: Option<ControlJunctionType>,
    /// Cycle length in seconds.
    pub cycle: Option<f64>,
    pub offset: Option<f64>,
    pub phases: Vec<ControlPhase>,
    pub actuated: Option<ActuatedJunctionSettings>,
}

impl ControlJunction {
    pub fn is_actuated(&self) -> bool {
        self.junction_type == Some(ControlJunctionType::Actuated)
    }

    /// Detectors referenced by the actuated phases, in phase order.
    pub fn detector_external_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.phases
            .iter()
            .filter_map(|phase| phase.actuated.as_ref())
            .flat_map(|actuated| actuated.detectors.iter())
            .filter_map(|detector| detector.detector_external_id.as_deref())
    }
}

impl CheckedRecord for ControlJunction {
    const TYPE_NAME: &'static str = "ControlJunction";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "node_id", &self.node_id);
        note_missing(&mut missing, "junction_type", &self.junction_type);
        note_missing(&mut missing, "cycle", &self.cycle);
        note_missing(&mut missing, "offset", &self.offset);
        if self.is_actuated() {
            match &self.actuated {
                Some(actuated) => actuated.note_missing(&mut missing),
                None => missing.push("actuated".to_string()),
            }
            for (index, phase) in self.phases.iter().enumerate() {
                if !phase.is_actuated() {
                    missing.push(format!("phases[{index}].actuated"));
                }
            }
        }
        note_missing_nested(&mut missing, "phases", &self.phases);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        // Fixed-time junctions must not carry actuated payloads.
        let variant = if self.junction_type.is_some() && !self.is_actuated() {
            if self.actuated.is_some() {
                Some(TypeIssue::new("actuated", "only actuated junctions have actuated settings"))
            } else {
                self.phases.iter().position(ControlPhase::is_actuated).map(|index| {
                    TypeIssue::new(format!("phases[{index}].actuated"), "phase of a fixed-time junction is actuated")
                })
            }
        } else {
            None
        };
        variant
            .or_else(|| non_blank("node_id", self.node_id.as_ref()))
            .or_else(|| non_negative("cycle", self.cycle))
            .or_else(|| finite("offset", self.offset))
            .or_else(|| {
                self.actuated.as_ref().and_then(|actuated| {
                    non_negative_int("actuated.num_phases", actuated.num_phases)
                        .or_else(|| non_negative("actuated.yellow_time", actuated.yellow_time))
                })
            })
            .or_else(|| first_nested_issue("phases", &self.phases))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPlan {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub control_junctions: Vec<ControlJunction>,
    pub control_meterings: Vec<ControlMetering>,
    pub offset: Option<i64>,
}

impl ControlPlan {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::with_external_id(external_id),
            offset: Some(0),
            ..Self::default()
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        self.identity.external_id()
    }

    pub fn detector_external_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.control_junctions
            .iter()
            .flat_map(|junction| junction.detector_external_ids())
    }

    pub fn metering_external_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.control_meterings
            .iter()
            .filter_map(|metering| metering.metering_external_id.as_deref())
    }
}

impl CheckedRecord for ControlPlan {
    const TYPE_NAME: &'static str = "ControlPlan";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "external_id", &self.identity.external_id);
        note_missing(&mut missing, "offset", &self.offset);
        note_missing_nested(&mut missing, "control_junctions", &self.control_junctions);
        note_missing_nested(&mut missing, "control_meterings", &self.control_meterings);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        self.identity
            .type_issue()
            .or_else(|| first_nested_issue("control_junctions", &self.control_junctions))
            .or_else(|| first_nested_issue("control_meterings", &self.control_meterings))
    }
}

impl fmt::Display for ControlPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Control plan {} ({} junctions, {} meterings)",
            self.identity,
            self.control_junctions.len(),
            self.control_meterings.len()
        )
    }
}

/// One entry of the master schedule: which plan runs when, in which zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterControlPlanItem {
    pub control_plan_external_id: Option<String>,
    /// Start in seconds from midnight.
    pub from_time: Option<i64>,
    /// Duration in seconds.
    pub duration: Option<i64>,
    pub zone: Option<i64>,
}

impl MasterControlPlanItem {
    pub fn new(control_plan_external_id: impl Into<String>, from_time: i64, duration: i64, zone: i64) -> Self {
        Self {
            control_plan_external_id: Some(control_plan_external_id.into()),
            from_time: Some(from_time),
            duration: Some(duration),
            zone: Some(zone),
        }
    }
}

impl CheckedRecord for MasterControlPlanItem {
    const TYPE_NAME: &'static str = "MasterControlPlanItem";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "control_plan_external_id", &self.control_plan_external_id);
        note_missing(&mut missing, "from_time", &self.from_time);
        note_missing(&mut missing, "duration", &self.duration);
        note_missing(&mut missing, "zone", &self.zone);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        non_blank("control_plan_external_id", self.control_plan_external_id.as_ref())
            .or_else(|| non_negative_int("from_time", self.from_time))
            .or_else(|| non_negative_int("duration", self.duration))
            .or_else(|| non_negative_int("zone", self.zone))
    }
}
