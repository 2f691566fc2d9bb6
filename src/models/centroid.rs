// centroid.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use super::enums::CentroidType;
use super::identity::ObjectIdentity;
use crate::validation::checks::{finite, note_missing, CheckedRecord, TypeIssue};

/// A demand zone anchor and the sections it is attached to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CentroidConnection {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    /// Latitude in EPSG:32610.
    pub latitude: Option<f64>,
    /// Longitude in EPSG:32610.
    pub longitude: Option<f64>,
    pub centroid_type: Option<CentroidType>,
    /// Sections whose traffic flows into the centroid.
    pub from_section_internal_ids: Option<Vec<i64>>,
    /// Sections fed by the centroid.
    pub to_section_internal_ids: Option<Vec<i64>>,
}

impl CentroidConnection {
    pub fn new(external_id: impl Into<String>, latitude: f64, longitude: f64, centroid_type: CentroidType) -> Self {
        Self {
            identity: ObjectIdentity::with_external_id(external_id),
            latitude: Some(latitude),
            longitude: Some(longitude),
            centroid_type: Some(centroid_type),
            from_section_internal_ids: Some(Vec::new()),
            to_section_internal_ids: Some(Vec::new()),
        }
    }
}

impl CheckedRecord for CentroidConnection {
    const TYPE_NAME: &'static str = "CentroidConnection";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "external_id", &self.identity.external_id);
        note_missing(&mut missing, "latitude", &self.latitude);
        note_missing(&mut missing, "longitude", &self.longitude);
        note_missing(&mut missing, "centroid_type", &self.centroid_type);
        note_missing(&mut missing, "from_section_internal_ids", &self.from_section_internal_ids);
        note_missing(&mut missing, "to_section_internal_ids", &self.to_section_internal_ids);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let negative_section = |field: &str, ids: &Option<Vec<i64>>| {
            ids.as_ref()
                .and_then(|ids| ids.iter().position(|id| *id < 0))
                .map(|index| TypeIssue::new(format!("{field}[{index}]"), "section ids are never negative"))
        };
        self.identity
            .type_issue()
            .or_else(|| finite("latitude", self.latitude))
            .or_else(|| finite("longitude", self.longitude))
            .or_else(|| negative_section("from_section_internal_ids", &self.from_section_internal_ids))
            .or_else(|| negative_section("to_section_internal_ids", &self.to_section_internal_ids))
    }
}

impl fmt::Display for CentroidConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Centroid {}", self.identity)?;
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            write!(f, " at ({lat}, {lon})")?;
        }
        if let Some(kind) = self.centroid_type {
            write!(f, " {}", kind.as_str())?;
        }
        Ok(())
    }
}
