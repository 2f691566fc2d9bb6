// od_matrices.rs

use std::fmt;

use super::ConfigFile;
use crate::error::ConfigResult;
use crate::models::OdMatrix;
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::{require_text, validate_list};

const OWNER: &str = "OD matrices";

/// All OD matrices built on one centroid configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OdMatrices {
    pub centroid_configuration_external_id: Option<String>,
    pub od_matrices: Vec<OdMatrix>,
}

impl OdMatrices {
    pub fn new(centroid_configuration_external_id: impl Into<String>) -> Self {
        Self {
            centroid_configuration_external_id: Some(centroid_configuration_external_id.into()),
            od_matrices: Vec::new(),
        }
    }

    pub fn matrix(&self, external_id: &str) -> Option<&OdMatrix> {
        self.od_matrices
            .iter()
            .find(|matrix| matrix.external_id().as_deref() == Some(external_id))
    }

    pub fn total_trips(&self) -> f64 {
        self.od_matrices.iter().map(OdMatrix::total_trips).sum()
    }
}

impl ConfigFile for OdMatrices {
    const KIND: &'static str = "od_matrices";

    fn validate(&self) -> ConfigResult<()> {
        require_text(
            &self.centroid_configuration_external_id,
            OWNER,
            "centroid_configuration_external_id",
        )?;
        validate_list(OWNER, "od_matrices", &self.od_matrices)
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer
            .field("centroid_configuration_external_id", &self.centroid_configuration_external_id)?
            .field("od_matrices", &self.od_matrices)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            centroid_configuration_external_id: reader.field("centroid_configuration_external_id")?,
            od_matrices: reader.list("od_matrices")?,
        })
    }
}

impl fmt::Display for OdMatrices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "OD matrices on {} ({} matrices, {} trips)",
            self.centroid_configuration_external_id.as_deref().unwrap_or("<none>"),
            self.od_matrices.len(),
            self.total_trips()
        )?;
        for matrix in &self.od_matrices {
            writeln!(f, "  {matrix}")?;
        }
        Ok(())
    }
}
