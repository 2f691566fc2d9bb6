// traffic_management.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use super::enums::ScenarioChangeType;
use super::identity::ObjectIdentity;
use crate::error::ConfigResult;
use crate::validation::checks::{
    first_nested_issue, non_negative_int, note_missing, note_missing_nested, CheckedRecord, TypeIssue,
};

/// Forbids the turn from one section into another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurningClosingChange {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub from_section_internal_id: Option<i64>,
    pub to_section_internal_id: Option<i64>,
    pub scenario_change_type: Option<ScenarioChangeType>,
}

impl TurningClosingChange {
    pub fn new(external_id: impl Into<String>, from_section_internal_id: i64, to_section_internal_id: i64) -> Self {
        Self {
            identity: ObjectIdentity::with_external_id(external_id),
            from_section_internal_id: Some(from_section_internal_id),
            to_section_internal_id: Some(to_section_internal_id),
            scenario_change_type: Some(ScenarioChangeType::TurningRestriction),
        }
    }
}

impl CheckedRecord for TurningClosingChange {
    const TYPE_NAME: &'static str = "TurningClosingChange";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "name", &self.identity.name);
        note_missing(&mut missing, "external_id", &self.identity.external_id);
        note_missing(&mut missing, "from_section_internal_id", &self.from_section_internal_id);
        note_missing(&mut missing, "to_section_internal_id", &self.to_section_internal_id);
        note_missing(&mut missing, "scenario_change_type", &self.scenario_change_type);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let unsupported = match self.scenario_change_type {
            Some(ScenarioChangeType::TurningRestriction) | None => None,
            Some(other) => Some(TypeIssue::new(
                "scenario_change_type",
                format!("{other:?} changes are not supported, only turning restrictions"),
            )),
        };
        unsupported
            .or_else(|| self.identity.type_issue())
            .or_else(|| non_negative_int("from_section_internal_id", self.from_section_internal_id))
            .or_else(|| non_negative_int("to_section_internal_id", self.to_section_internal_id))
    }
}

impl fmt::Display for TurningClosingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Turn closing {}: {:?} -> {:?}",
            self.identity, self.from_section_internal_id, self.to_section_internal_id
        )
    }
}

/// A named group of scenario changes applied together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficPolicy {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub scenario_changes: Vec<TurningClosingChange>,
}

impl TrafficPolicy {
    pub fn new(name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name, external_id),
            scenario_changes: Vec::new(),
        }
    }

    /// Default missing names and external ids of the policy and its changes.
    pub fn resolve_identities(&mut self) -> ConfigResult<()> {
        self.identity.resolve_name_and_external_id("traffic policy")?;
        for change in &mut self.scenario_changes {
            change.identity.resolve_name_and_external_id("scenario change")?;
        }
        Ok(())
    }
}

impl CheckedRecord for TrafficPolicy {
    const TYPE_NAME: &'static str = "TrafficPolicy";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "name", &self.identity.name);
        note_missing(&mut missing, "external_id", &self.identity.external_id);
        note_missing_nested(&mut missing, "scenario_changes", &self.scenario_changes);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        self.identity
            .type_issue()
            .or_else(|| first_nested_issue("scenario_changes", &self.scenario_changes))
    }
}

impl fmt::Display for TrafficPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Policy {} ({} changes)", self.identity, self.scenario_changes.len())
    }
}
