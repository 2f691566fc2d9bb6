// scenario.rs

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::experiment::{MicroExperiment, StaticMacroExperiment};
use super::identity::ObjectIdentity;
use crate::global_variables::{
    DATABASE_DRIVER_NAME, MASTER_CONTROL_PLAN_EXTERNAL_ID, REAL_DATA_SET_EXTERNAL_ID, SCENARIO_DAY, SCENARIO_MONTH,
    SCENARIO_YEAR, TRAFFIC_STRATEGY_EXTERNAL_ID,
};
use crate::validation::checks::{
    first_nested_issue, non_blank, non_negative, note_missing, note_missing_nested, CheckedRecord, TypeIssue,
};

/// Date every scenario starts on unless told otherwise.
pub fn default_scenario_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(SCENARIO_YEAR, SCENARIO_MONTH, SCENARIO_DAY)
}

/// Where a scenario stores its outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBaseInfo {
    pub use_project_db: Option<bool>,
    pub automatic: Option<bool>,
    pub database_driver_name: Option<String>,
    pub automatically_created: Option<bool>,
    pub database_path: Option<String>,
}

impl DataBaseInfo {
    pub fn sqlite(database_path: impl Into<String>) -> Self {
        Self {
            database_path: Some(database_path.into()),
            ..Self::default()
        }
    }
}

impl Default for DataBaseInfo {
    fn default() -> Self {
        Self {
            use_project_db: Some(false),
            automatic: Some(false),
            database_driver_name: Some(DATABASE_DRIVER_NAME.to_string()),
            automatically_created: Some(true),
            database_path: None,
        }
    }
}

impl CheckedRecord for DataBaseInfo {
    const TYPE_NAME: &'static str = "DataBaseInfo";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "use_project_db", &self.use_project_db);
        note_missing(&mut missing, "automatic", &self.automatic);
        note_missing(&mut missing, "automatically_created", &self.automatically_created);
        note_missing(&mut missing, "database_driver_name", &self.database_driver_name);
        note_missing(&mut missing, "database_path", &self.database_path);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        non_blank("database_driver_name", self.database_driver_name.as_ref())
            .or_else(|| non_blank("database_path", self.database_path.as_ref()))
    }
}

/// Share of the trips between two centroids whose trajectories are recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryCondition {
    pub origin_centroid_external_id: Option<String>,
    pub destination_centroid_external_id: Option<String>,
    pub percentage: Option<f64>,
}

impl CheckedRecord for TrajectoryCondition {
    const TYPE_NAME: &'static str = "TrajectoryCondition";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "origin_centroid_external_id", &self.origin_centroid_external_id);
        note_missing(&mut missing, "destination_centroid_external_id", &self.destination_centroid_external_id);
        note_missing(&mut missing, "percentage", &self.percentage);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let range = match self.percentage {
            Some(p) if p.is_finite() && !(0.0..=100.0).contains(&p) => {
                Some(TypeIssue::new("percentage", format!("{p} is outside 0..=100")))
            }
            _ => None,
        };
        non_negative("percentage", self.percentage)
            .or(range)
            .or_else(|| non_blank("origin_centroid_external_id", self.origin_centroid_external_id.as_ref()))
            .or_else(|| non_blank("destination_centroid_external_id", self.destination_centroid_external_id.as_ref()))
    }
}

/// Statistics a scenario gathers while it runs. Intervals are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInputData {
    pub detection_interval: Option<u32>,
    pub statistical_interval: Option<u32>,
    pub global_trajectories_statistics: Option<bool>,
    pub section_trajectories_statistics: Option<bool>,
    pub trajectories_statistics: Option<bool>,
    pub trajectory_condition_list: Vec<TrajectoryCondition>,
}

impl CheckedRecord for ScenarioInputData {
    const TYPE_NAME: &'static str = "ScenarioInputData";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "detection_interval", &self.detection_interval);
        note_missing(&mut missing, "statistical_interval", &self.statistical_interval);
        note_missing(&mut missing, "global_trajectories_statistics", &self.global_trajectories_statistics);
        note_missing(&mut missing, "section_trajectories_statistics", &self.section_trajectories_statistics);
        note_missing(&mut missing, "trajectories_statistics", &self.trajectories_statistics);
        note_missing_nested(&mut missing, "trajectory_condition_list", &self.trajectory_condition_list);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let zero = |field: &str, value: Option<u32>| match value {
            Some(0) => Some(TypeIssue::new(field, "interval must be longer than zero seconds")),
            _ => None,
        };
        zero("detection_interval", self.detection_interval)
            .or_else(|| zero("statistical_interval", self.statistical_interval))
            .or_else(|| first_nested_issue("trajectory_condition_list", &self.trajectory_condition_list))
    }
}

/// Attributes every scenario kind shares: what it links to in the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioLinks {
    pub begin_date: Option<NaiveDate>,
    pub database_info: Option<DataBaseInfo>,
    pub master_control_plan_external_id: Option<String>,
    pub real_dataset_external_id: Option<String>,
    pub traffic_demand_external_id: Option<String>,
    pub traffic_strategy_external_ids: Option<Vec<String>>,
}

impl Default for ScenarioLinks {
    fn default() -> Self {
        Self {
            begin_date: default_scenario_date(),
            database_info: None,
            master_control_plan_external_id: Some(MASTER_CONTROL_PLAN_EXTERNAL_ID.to_string()),
            real_dataset_external_id: Some(REAL_DATA_SET_EXTERNAL_ID.to_string()),
            traffic_demand_external_id: None,
            traffic_strategy_external_ids: Some(vec![TRAFFIC_STRATEGY_EXTERNAL_ID.to_string()]),
        }
    }
}

impl CheckedRecord for ScenarioLinks {
    const TYPE_NAME: &'static str = "ScenarioLinks";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "begin_date", &self.begin_date);
        note_missing(&mut missing, "database_info", &self.database_info);
        if let Some(info) = &self.database_info {
            missing.extend(info.missing_attributes().into_iter().map(|f| format!("database_info.{f}")));
        }
        note_missing(&mut missing, "master_control_plan_external_id", &self.master_control_plan_external_id);
        note_missing(&mut missing, "real_dataset_external_id", &self.real_dataset_external_id);
        note_missing(&mut missing, "traffic_demand_external_id", &self.traffic_demand_external_id);
        note_missing(&mut missing, "traffic_strategy_external_ids", &self.traffic_strategy_external_ids);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        let blank_strategy = self.traffic_strategy_external_ids.as_ref().and_then(|ids| {
            ids.iter()
                .position(|id| id.trim().is_empty())
                .map(|i| TypeIssue::new(format!("traffic_strategy_external_ids[{i}]"), "must not be empty"))
        });
        self.database_info
            .as_ref()
            .and_then(|info| info.type_issue().map(|i| i.within_record("database_info")))
            .or_else(|| non_blank("master_control_plan_external_id", self.master_control_plan_external_id.as_ref()))
            .or_else(|| non_blank("real_dataset_external_id", self.real_dataset_external_id.as_ref()))
            .or_else(|| non_blank("traffic_demand_external_id", self.traffic_demand_external_id.as_ref()))
            .or(blank_strategy)
    }
}

/// A dynamic scenario with its microsimulation experiment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub links: ScenarioLinks,
    pub experiment: Option<MicroExperiment>,
    pub input_data: Option<ScenarioInputData>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name, external_id),
            ..Self::default()
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scenario {}", self.identity)?;
        if let Some(date) = self.links.begin_date {
            write!(f, " starting {date}")?;
        }
        if let Some(experiment) = &self.experiment {
            write!(f, " with {experiment}")?;
        }
        Ok(())
    }
}

/// Where a static scenario reads its path assignment from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathAssignment {
    pub disaggregate_super_node: Option<bool>,
    pub filename: Option<String>,
    pub folder_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroScenarioOutputData {
    pub store_statistics: Option<bool>,
    pub generate_skim: Option<bool>,
    pub group_statistics: Option<bool>,
    pub convergence_statistics: Option<bool>,
    pub activate_path_statistics: Option<bool>,
}

impl Default for MacroScenarioOutputData {
    fn default() -> Self {
        Self {
            store_statistics: Some(true),
            generate_skim: Some(false),
            group_statistics: Some(false),
            convergence_statistics: Some(false),
            activate_path_statistics: Some(false),
        }
    }
}

/// A static assignment scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMacroScenario {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub links: ScenarioLinks,
    pub experiment: Option<StaticMacroExperiment>,
    pub departure_time: Option<NaiveTime>,
    pub input_path_assignment: Option<PathAssignment>,
    pub output_data: MacroScenarioOutputData,
}

impl CheckedRecord for StaticMacroScenario {
    const TYPE_NAME: &'static str = "StaticMacroScenario";

    fn missing_attributes(&self) -> Vec<String> {
        let mut missing = Vec::new();
        note_missing(&mut missing, "name", &self.identity.name);
        note_missing(&mut missing, "external_id", &self.identity.external_id);
        missing.extend(self.links.missing_attributes());
        note_missing(&mut missing, "experiment", &self.experiment);
        if let Some(experiment) = &self.experiment {
            missing.extend(experiment.missing_attributes().into_iter().map(|f| format!("experiment.{f}")));
        }
        note_missing(&mut missing, "departure_time", &self.departure_time);
        if let Some(assignment) = &self.input_path_assignment {
            note_missing(&mut missing, "input_path_assignment.filename", &assignment.filename);
            note_missing(&mut missing, "input_path_assignment.folder_path", &assignment.folder_path);
        }
        let output = &self.output_data;
        note_missing(&mut missing, "output_data.store_statistics", &output.store_statistics);
        note_missing(&mut missing, "output_data.generate_skim", &output.generate_skim);
        note_missing(&mut missing, "output_data.group_statistics", &output.group_statistics);
        note_missing(&mut missing, "output_data.convergence_statistics", &output.convergence_statistics);
        note_missing(&mut missing, "output_data.activate_path_statistics", &output.activate_path_statistics);
        missing
    }

    fn type_issue(&self) -> Option<TypeIssue> {
        self.identity
            .type_issue()
            .or_else(|| self.links.type_issue())
            .or_else(|| {
                self.experiment
                    .as_ref()
                    .and_then(|e| e.type_issue().map(|i| i.within_record("experiment")))
            })
            .or_else(|| {
                self.input_path_assignment
                    .as_ref()
                    .and_then(|a| non_blank("input_path_assignment.filename", a.filename.as_ref()))
            })
    }
}

impl fmt::Display for StaticMacroScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Static scenario {}", self.identity)?;
        if let Some(time) = self.departure_time {
            write!(f, " departing {time}")?;
        }
        Ok(())
    }
}
