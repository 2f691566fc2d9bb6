// config_files/mod.rs
//
// Aggregates that are persisted as configuration files. Each one is checked
// completely before anything is written, and again after it is read back.

pub mod centroid_configuration;
pub mod detectors;
pub mod flow_real_data_set;
pub mod master_control_plan;
pub mod od_matrices;
pub mod scenario;
pub mod section_speed_limits;
pub mod static_macro_scenarios;
pub mod traffic_demands;
pub mod traffic_management_strategy;

pub use centroid_configuration::CentroidConfiguration;
pub use detectors::Detectors;
pub use flow_real_data_set::FlowRealDataSet;
pub use master_control_plan::MasterControlPlan;
pub use od_matrices::OdMatrices;
pub use section_speed_limits::SectionSpeedLimitsAndCapacities;
pub use static_macro_scenarios::StaticMacroScenarios;
pub use traffic_demands::TrafficDemands;
pub use traffic_management_strategy::TrafficManagementStrategy;

use log::{info, warn};
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::global_variables::CONFIG_FILE_EXTENSION;
use crate::serializer::{verify_filepath, RecordReader, RecordWriter};

/// What `export_to_file` did to the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Created,
    Overwritten,
}

pub trait ConfigFile: Sized {
    /// Record kind written into the envelope and checked on import.
    const KIND: &'static str;

    /// Presence and type checks of every field, nested lists included.
    fn validate(&self) -> ConfigResult<()>;

    /// Aggregates whose primary list must not be empty override this.
    fn check_not_empty(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()>;

    fn read_record(reader: &RecordReader) -> ConfigResult<Self>;

    /// Validate and encode the aggregate without touching the filesystem.
    fn encode(&self) -> ConfigResult<Vec<u8>> {
        self.validate()?;
        self.check_not_empty()?;
        let mut writer = RecordWriter::new(Self::KIND);
        self.write_record(&mut writer)?;
        writer.into_bytes()
    }

    fn decode(bytes: &[u8]) -> ConfigResult<Self> {
        let reader = RecordReader::from_bytes(bytes, Self::KIND)?;
        let record = Self::read_record(&reader)?;
        record.validate()?;
        Ok(record)
    }

    /// Write the aggregate to `path`. Nothing is written unless the path and
    /// the whole aggregate are valid; an existing file is replaced.
    fn export_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<ExportOutcome> {
        let path = path.as_ref();
        verify_filepath(path, CONFIG_FILE_EXTENSION)?;
        let bytes = self.encode()?;
        let outcome = if path.exists() {
            warn!("File already exists at {}. Overwriting file.", path.display());
            ExportOutcome::Overwritten
        } else {
            ExportOutcome::Created
        };
        fs::write(path, bytes)?;
        info!("Exported {} to {}", Self::KIND, path.display());
        Ok(outcome)
    }

    fn import_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        verify_filepath(path, CONFIG_FILE_EXTENSION)?;
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let record = Self::decode(&bytes)?;
        info!("Imported {} from {}", Self::KIND, path.display());
        Ok(record)
    }
}

/// Error raised when an aggregate whose primary list is empty is exported.
pub(crate) fn no_data(kind: &str) -> ConfigError {
    ConfigError::EmptyCollection {
        kind: kind.to_string(),
        message: format!("{kind} has no data. Export aborted."),
    }
}

/// Find the single element of `items` with the given external id.
pub(crate) fn resolve_unique<'a, T>(
    items: &'a [T],
    external_id: &str,
    owner: &str,
    target: &str,
    id_of: fn(&T) -> Option<&str>,
) -> ConfigResult<&'a T> {
    let mut matches = items.iter().filter(|item| id_of(*item) == Some(external_id));
    match (matches.next(), matches.next()) {
        (Some(found), None) => Ok(found),
        _ => Err(ConfigError::UnresolvedReference {
            owner: owner.to_string(),
            target: target.to_string(),
            external_id: external_id.to_string(),
        }),
    }
}

/// Fail on the first external id used twice in `items`.
pub(crate) fn check_unique_external_ids<T>(items: &[T], owner: &str, id_of: fn(&T) -> Option<&str>) -> ConfigResult<()> {
    let mut seen = std::collections::HashSet::new();
    for external_id in items.iter().filter_map(id_of) {
        if !seen.insert(external_id) {
            return Err(ConfigError::DuplicateExternalId {
                owner: owner.to_string(),
                external_id: external_id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_message_names_the_kind() {
        let err = no_data("Detectors");
        assert_eq!(format!("{err}"), "Detectors has no data. Export aborted.");
        assert!(matches!(err, ConfigError::EmptyCollection { .. }));
    }

    fn id_of(item: &(String, u32)) -> Option<&str> {
        Some(item.0.as_str())
    }

    #[test]
    fn resolve_unique_rejects_missing_and_duplicate_ids() {
        let items = vec![("a".to_string(), 1), ("b".to_string(), 2), ("b".to_string(), 3)];
        assert_eq!(resolve_unique(&items, "a", "plan", "thing", id_of).unwrap().1, 1);
        assert!(resolve_unique(&items, "b", "plan", "thing", id_of).is_err());
        assert!(resolve_unique(&items, "c", "plan", "thing", id_of).is_err());
    }

    #[test]
    fn duplicate_external_ids_are_reported() {
        let items = vec![("a".to_string(), 1), ("a".to_string(), 2)];
        assert!(matches!(
            check_unique_external_ids(&items, "plan", id_of),
            Err(ConfigError::DuplicateExternalId { .. })
        ));
    }
}
