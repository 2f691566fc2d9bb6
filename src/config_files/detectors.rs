// detectors.rs

use std::fmt;

use super::{check_unique_external_ids, no_data, ConfigFile};
use crate::error::{ConfigError, ConfigResult};
use crate::models::{Detector, DetectorKind};
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::{require_text, validate_list};

const OWNER: &str = "detectors";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detectors {
    pub detectors: Vec<Detector>,
}

impl Detectors {
    /// Add a detector, refusing a second detector with the same external id.
    pub fn add_detector(&mut self, detector: Detector) -> ConfigResult<()> {
        let external_id = require_text(&detector.section.identity.external_id, OWNER, "external_id")?;
        if self.detector(external_id).is_some() {
            return Err(ConfigError::DuplicateExternalId {
                owner: OWNER.to_string(),
                external_id: external_id.to_string(),
            });
        }
        self.detectors.push(detector);
        Ok(())
    }

    pub fn detector(&self, external_id: &str) -> Option<&Detector> {
        self.detectors.iter().find(|d| d.external_id() == Some(external_id))
    }

    pub fn flow_detectors(&self) -> impl Iterator<Item = &Detector> + '_ {
        self.detectors.iter().filter(|d| d.kind == DetectorKind::Flow)
    }
}

impl ConfigFile for Detectors {
    const KIND: &'static str = "detectors";

    fn validate(&self) -> ConfigResult<()> {
        validate_list(OWNER, "detectors", &self.detectors)?;
        check_unique_external_ids(&self.detectors, OWNER, Detector::external_id)
    }

    fn check_not_empty(&self) -> ConfigResult<()> {
        if self.detectors.is_empty() {
            return Err(no_data("Detectors"));
        }
        Ok(())
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer.field("detectors", &self.detectors)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            detectors: reader.list("detectors")?,
        })
    }
}

impl fmt::Display for Detectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} detectors", self.detectors.len())?;
        for detector in &self.detectors {
            writeln!(f, "  {detector}")?;
        }
        Ok(())
    }
}
