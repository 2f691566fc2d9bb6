// centroid_configuration.rs

use std::fmt;

use super::ConfigFile;
use crate::error::ConfigResult;
use crate::global_variables::CENTROID_CONFIG_EXTERNAL_ID;
use crate::models::CentroidConnection;
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::{require_text, validate_list};

const OWNER: &str = "centroid configuration";

/// The centroids of the study area. Its external id is what OD matrices
/// refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidConfiguration {
    pub external_id: Option<String>,
    pub centroids: Vec<CentroidConnection>,
}

impl Default for CentroidConfiguration {
    fn default() -> Self {
        Self::new(CENTROID_CONFIG_EXTERNAL_ID)
    }
}

impl CentroidConfiguration {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            centroids: Vec::new(),
        }
    }

    pub fn centroid(&self, external_id: &str) -> Option<&CentroidConnection> {
        self.centroids
            .iter()
            .find(|centroid| centroid.identity.external_id() == Some(external_id))
    }
}

impl ConfigFile for CentroidConfiguration {
    const KIND: &'static str = "centroid_configuration";

    fn validate(&self) -> ConfigResult<()> {
        require_text(&self.external_id, OWNER, "external_id")?;
        validate_list(OWNER, "centroids", &self.centroids)
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer
            .field("external_id", &self.external_id)?
            .field("centroids", &self.centroids)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            external_id: reader.field("external_id")?,
            centroids: reader.list("centroids")?,
        })
    }
}

impl fmt::Display for CentroidConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Centroid configuration {} ({} centroids)",
            self.external_id.as_deref().unwrap_or("<no external id>"),
            self.centroids.len()
        )?;
        for centroid in &self.centroids {
            writeln!(f, "  {centroid}")?;
        }
        Ok(())
    }
}
