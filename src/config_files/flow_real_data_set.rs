// flow_real_data_set.rs

use log::info;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::{no_data, ConfigFile};
use crate::error::ConfigResult;
use crate::global_variables::{CSV_SEPARATOR, REAL_DATA_SET_CSV_HEADER, REAL_DATA_SET_EXTERNAL_ID, REAL_DATA_SET_LINES_TO_SKIP};
use crate::models::FlowRealData;
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::{require_text, validate_list};

const OWNER: &str = "flow real data set";

/// Measured flows of several detectors, used by the simulator to compare
/// simulated and real counts.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRealDataSet {
    pub external_id: Option<String>,
    pub flow_data_set: Vec<FlowRealData>,
    /// CSV file the simulator reads the counts from.
    pub filename: Option<String>,
    /// Header lines the simulator skips in that file.
    pub line_to_skip: Option<u32>,
}

impl Default for FlowRealDataSet {
    fn default() -> Self {
        Self::new(REAL_DATA_SET_EXTERNAL_ID)
    }
}

impl FlowRealDataSet {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            flow_data_set: Vec::new(),
            filename: None,
            line_to_skip: None,
        }
    }

    /// Write the counts as `Detector External Id,15 minutes Count,Time`
    /// rows, time in seconds from midnight, and remember the file so the
    /// simulator can find it.
    pub fn export_to_real_data_set_csv(&mut self, directory: &Path, filename: &str) -> ConfigResult<PathBuf> {
        validate_list(OWNER, "flow_data_set", &self.flow_data_set)?;
        let path = directory.join(filename);
        let file = File::create(&path)?;
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(CSV_SEPARATOR)
            .has_headers(false)
            .from_writer(file);
        wtr.write_record(REAL_DATA_SET_CSV_HEADER)?;
        for data in &self.flow_data_set {
            let external_id = require_text(&data.detector.section.identity.external_id, OWNER, "detector.external_id")?;
            for (seconds, count) in &data.flow_data {
                wtr.serialize((external_id, count, seconds))?;
            }
        }
        wtr.flush()?;
        self.filename = Some(filename.to_string());
        self.line_to_skip = Some(REAL_DATA_SET_LINES_TO_SKIP);
        info!("Wrote real data set CSV {}", path.display());
        Ok(path)
    }
}

impl ConfigFile for FlowRealDataSet {
    const KIND: &'static str = "flow_real_data_set";

    fn validate(&self) -> ConfigResult<()> {
        require_text(&self.external_id, OWNER, "external_id")?;
        validate_list(OWNER, "flow_data_set", &self.flow_data_set)
    }

    fn check_not_empty(&self) -> ConfigResult<()> {
        if self.flow_data_set.is_empty() {
            return Err(no_data("FlowRealDataSet"));
        }
        Ok(())
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer
            .field("flow_data_set", &self.flow_data_set)?
            .field("external_id", &self.external_id)?
            .field("filename", &self.filename)?
            .field("line_to_skip", &self.line_to_skip)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            flow_data_set: reader.list("flow_data_set")?,
            external_id: reader.field("external_id")?,
            filename: reader.field("filename")?,
            line_to_skip: reader.field("line_to_skip")?,
        })
    }
}

impl fmt::Display for FlowRealDataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Real data set {} ({} detectors",
            self.external_id.as_deref().unwrap_or("<no external id>"),
            self.flow_data_set.len()
        )?;
        if let Some(filename) = &self.filename {
            write!(f, ", file {filename}")?;
        }
        write!(f, ")")
    }
}
