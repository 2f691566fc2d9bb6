// section.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::checks::{non_negative, non_negative_int, note_missing, CheckedRecord, TypeIssue};

/// Speed limit and capacity of one road section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionSpeedLimitAndCapacity {
    pub section_internal_id: Option<i64>,
    pub speed_limit_in_km_per_hour: Option<f64>,
    pub capacity_in_vehicles_per_hour: Option<f64>,
}

impl SectionSpeedLimitAndCapacity {
    pub fn new(section_internal_id: i64, speed_limit_in_km_per_hour: f64, capacity_in_vehicles_per_hour: f64) -> Self {
        Self {
            section_internal_id: Some(section_internal_id),
            speed_limit_in_km_per_hour: Some(speed_limit_in_km_per_hour),
            capacity_in_vehicles_per_hour: Some(capacity_in_vehicles_per_hour),
        }
    }
}

impl CheckedRecord for SectionSpeedLimitAndCapacity {
    const TYPE_NAME: &'static str = "SectionSpeedLimitAndCapacity";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "section_internal_id", &self.section_internal_id);
        note_missing(&mut missing, "speed_limit_in_km_per_hour", &self.speed_limit_in_km_per_hour);
        note_missing(&mut missing, "capacity_in_vehicles_per_hour", &self.capacity_in_vehicles_per_hour);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        non_negative_int("section_internal_id", self.section_internal_id)
            .or_else(|| non_negative("speed_limit_in_km_per_hour", self.speed_limit_in_km_per_hour))
            .or_else(|| non_negative("capacity_in_vehicles_per_hour", self.capacity_in_vehicles_per_hour))
    }
}

impl fmt::Display for SectionSpeedLimitAndCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Section {:?}: {:?} km/h, {:?} veh/h",
            self.section_internal_id, self.speed_limit_in_km_per_hour, self.capacity_in_vehicles_per_hour
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_capacity_is_rejected() {
        let record = SectionSpeedLimitAndCapacity::new(10, 50.0, -1.0);
        assert!(!record.check_attributes_type());
    }

    #[test]
    fn partial_record_passes_type_check_but_reports_missing() {
        let record = SectionSpeedLimitAndCapacity {
            section_internal_id: Some(3),
            ..Default::default()
        };
        assert!(record.check_attributes_type());
        assert_eq!(record.missing_attributes().len(), 2);
    }
}
