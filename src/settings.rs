// settings.rs
//
// Study settings: where the data lives, which hours are simulated and the
// per-detector lane placements that cannot be derived from the network.

use chrono::NaiveTime;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::models::enums::VehicleTypeName;
use crate::models::od_matrix_external_id;

/// Lanes covered by one flow detector when the default (every lane of the
/// section) is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneOverride {
    pub detector_external_id: String,
    pub from_lane: i64,
    /// `None` means the last lane of the section.
    pub to_lane: Option<i64>,
}

impl LaneOverride {
    /// Lane range for a section with `num_lanes` lanes.
    pub fn lanes(&self, num_lanes: i64) -> (i64, i64) {
        (self.from_lane, self.to_lane.unwrap_or(num_lanes - 1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_folder: PathBuf,
    /// Name of the simulation epoch, used as a sub-folder of `data_folder`.
    pub epoch: String,
    pub year: i32,
    pub start_hour: u32,
    /// Exclusive.
    pub end_hour: u32,
    pub timestep_minutes: u32,
    pub lane_overrides: Vec<LaneOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::from("fremont-public-data"),
            epoch: "fremont_example".to_string(),
            year: 2019,
            start_hour: 14,
            end_hour: 20,
            timestep_minutes: 15,
            lane_overrides: vec![
                LaneOverride {
                    detector_external_id: "pems_detector_418422".to_string(),
                    from_lane: 0,
                    to_lane: Some(0),
                },
                LaneOverride {
                    detector_external_id: "pems_detector_402793".to_string(),
                    from_lane: 1,
                    to_lane: None,
                },
            ],
        }
    }
}

impl Settings {
    /// Defaults, or the TOML file at `path`, then environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut settings = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                let text = fs::read_to_string(path)?;
                info!("Loading settings from {}", path.display());
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Missing keys keep their default value.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `MICROSIM_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(folder) = lookup("MICROSIM_DATA_FOLDER") {
            self.data_folder = PathBuf::from(folder);
        }
        if let Some(epoch) = lookup("MICROSIM_EPOCH") {
            self.epoch = epoch;
        }
        if let Some(year) = lookup("MICROSIM_YEAR") {
            self.year = parse_setting("year", &year)?;
        }
        if let Some(hour) = lookup("MICROSIM_START_HOUR") {
            self.start_hour = parse_setting("start_hour", &hour)?;
        }
        if let Some(hour) = lookup("MICROSIM_END_HOUR") {
            self.end_hour = parse_setting("end_hour", &hour)?;
        }
        if let Some(step) = lookup("MICROSIM_TIMESTEP_MINUTES") {
            self.timestep_minutes = parse_setting("timestep_minutes", &step)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.epoch.trim().is_empty() {
            return Err(invalid("epoch", "must not be empty"));
        }
        if self.end_hour > 24 {
            return Err(invalid("end_hour", format!("{} is past midnight", self.end_hour)));
        }
        if self.start_hour >= self.end_hour {
            return Err(invalid(
                "start_hour",
                format!("{} is not before end_hour {}", self.start_hour, self.end_hour),
            ));
        }
        if self.timestep_minutes == 0 || 60 % self.timestep_minutes != 0 {
            return Err(invalid(
                "timestep_minutes",
                format!("{} does not divide an hour", self.timestep_minutes),
            ));
        }
        for lane in &self.lane_overrides {
            if lane.from_lane < 0 || lane.to_lane.is_some_and(|to| to < lane.from_lane) {
                return Err(invalid(
                    "lane_overrides",
                    format!("bad lane range for {}", lane.detector_external_id),
                ));
            }
        }
        Ok(())
    }

    /// Start of every interval of the study, in order.
    pub fn time_intervals(&self) -> Vec<NaiveTime> {
        let step = self.timestep_minutes.max(1) as usize;
        (self.start_hour * 60..self.end_hour * 60)
            .step_by(step)
            .filter_map(|minute| NaiveTime::from_hms_opt(minute / 60, minute % 60, 0))
            .collect()
    }

    pub fn od_matrix_external_ids(&self, vehicle_type: VehicleTypeName) -> Vec<String> {
        self.time_intervals()
            .into_iter()
            .map(|time| od_matrix_external_id(time, vehicle_type))
            .collect()
    }

    /// Path of `filename` inside the epoch folder.
    pub fn data_path(&self, filename: &str) -> PathBuf {
        self.data_folder.join(&self.epoch).join(filename)
    }

    pub fn lane_override(&self, detector_external_id: &str) -> Option<&LaneOverride> {
        self.lane_overrides
            .iter()
            .find(|lane| lane.detector_external_id == detector_external_id)
    }
}

fn parse_setting<T: std::str::FromStr>(field: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(field, format!("cannot parse `{value}`")))
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidSetting {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn defaults_cover_the_fremont_afternoon() {
        let settings = Settings::default();
        settings.validate().unwrap();
        let intervals = settings.time_intervals();
        assert_eq!(intervals.len(), 24);
        assert_eq!(intervals[0], NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(intervals[23], NaiveTime::from_hms_opt(19, 45, 0).unwrap());
    }

    #[test]
    fn matrix_ids_follow_the_intervals() {
        let ids = Settings::default().od_matrix_external_ids(VehicleTypeName::Traveler);
        assert_eq!(ids[0], "Traveler_14_00");
        assert_eq!(ids[1], "Traveler_14_15");
    }

    #[test]
    fn lane_overrides_resolve_open_ranges() {
        let settings = Settings::default();
        assert_eq!(settings.lane_override("pems_detector_418422").unwrap().lanes(3), (0, 0));
        assert_eq!(settings.lane_override("pems_detector_402793").unwrap().lanes(3), (1, 2));
        assert!(settings.lane_override("pems_detector_1").is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings = Settings::from_toml_str("epoch = \"sunday\"\nend_hour = 24\n").unwrap();
        assert_eq!(settings.epoch, "sunday");
        assert_eq!(settings.start_hour, 14);
        settings.validate().unwrap();
        assert_eq!(settings.time_intervals().last(), NaiveTime::from_hms_opt(23, 45, 0).as_ref());
    }

    #[test]
    fn overrides_are_parsed_and_validated() {
        let env: HashMap<&str, &str> = HashMap::from([("MICROSIM_START_HOUR", "6"), ("MICROSIM_TIMESTEP_MINUTES", "7")]);
        let mut settings = Settings::default();
        settings.apply_overrides(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.start_hour, 6);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidSetting { field, .. }) if field == "timestep_minutes"
        ));
    }

    #[test]
    fn unparsable_override_is_an_invalid_setting() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(|key| (key == "MICROSIM_YEAR").then(|| "twenty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }

    #[test]
    fn settings_file_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "data_folder = \"/data\"\nstart_hour = 15\n").unwrap();
        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.data_path("od.pkl"), PathBuf::from("/data/fremont_example/od.pkl"));
        assert!(matches!(
            Settings::load(Some(&dir.path().join("missing.toml"))),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
