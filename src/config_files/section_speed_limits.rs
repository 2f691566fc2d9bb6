// section_speed_limits.rs

use std::fmt;

use super::ConfigFile;
use crate::error::ConfigResult;
use crate::models::SectionSpeedLimitAndCapacity;
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::validate_list;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionSpeedLimitsAndCapacities {
    pub sections: Vec<SectionSpeedLimitAndCapacity>,
}

impl SectionSpeedLimitsAndCapacities {
    pub fn section(&self, section_internal_id: i64) -> Option<&SectionSpeedLimitAndCapacity> {
        self.sections
            .iter()
            .find(|section| section.section_internal_id == Some(section_internal_id))
    }
}

impl ConfigFile for SectionSpeedLimitsAndCapacities {
    const KIND: &'static str = "section_speed_limits_and_capacities";

    fn validate(&self) -> ConfigResult<()> {
        validate_list("section speed limits and capacities", "sections", &self.sections)
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer.field("sections", &self.sections)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            sections: reader.list("sections")?,
        })
    }
}

impl fmt::Display for SectionSpeedLimitsAndCapacities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Speed limits and capacities of {} sections", self.sections.len())?;
        for section in &self.sections {
            writeln!(f, "  {section}")?;
        }
        Ok(())
    }
}
