// static_macro_scenarios.rs

use std::fmt;

use super::{check_unique_external_ids, ConfigFile};
use crate::error::ConfigResult;
use crate::models::StaticMacroScenario;
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::validate_list;

const OWNER: &str = "static macro scenarios";

fn scenario_external_id(scenario: &StaticMacroScenario) -> Option<&str> {
    scenario.identity.external_id()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticMacroScenarios {
    pub scenarios: Vec<StaticMacroScenario>,
}

impl ConfigFile for StaticMacroScenarios {
    const KIND: &'static str = "static_macro_scenarios";

    fn validate(&self) -> ConfigResult<()> {
        validate_list(OWNER, "scenarios", &self.scenarios)?;
        check_unique_external_ids(&self.scenarios, OWNER, scenario_external_id)
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer.field("scenarios", &self.scenarios)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            scenarios: reader.list("scenarios")?,
        })
    }
}

impl fmt::Display for StaticMacroScenarios {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} static scenarios", self.scenarios.len())?;
        for scenario in &self.scenarios {
            writeln!(f, "  {scenario}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::models::{DataBaseInfo, ObjectIdentity, StaticMacroExperiment};
    use chrono::NaiveTime;

    fn static_scenario(external_id: &str) -> StaticMacroScenario {
        let mut scenario = StaticMacroScenario {
            identity: ObjectIdentity::new(external_id, external_id),
            experiment: Some(StaticMacroExperiment {
                identity: ObjectIdentity::new("Frank-Wolfe", "fw_experiment"),
                ..StaticMacroExperiment::default()
            }),
            departure_time: NaiveTime::from_hms_opt(14, 0, 0),
            ..StaticMacroScenario::default()
        };
        scenario.links.database_info = Some(DataBaseInfo::sqlite("static.sqlite"));
        scenario.links.traffic_demand_external_id = Some("fremont_demand".to_string());
        scenario
    }

    #[test]
    fn complete_static_scenarios_validate() {
        let scenarios = StaticMacroScenarios {
            scenarios: vec![static_scenario("static_14"), static_scenario("static_15")],
        };
        scenarios.validate().unwrap();
    }

    #[test]
    fn missing_departure_time_reports_the_index() {
        let mut second = static_scenario("static_15");
        second.departure_time = None;
        let scenarios = StaticMacroScenarios {
            scenarios: vec![static_scenario("static_14"), second],
        };
        match scenarios.validate().unwrap_err() {
            ConfigError::MissingAttribute { owner, field, .. } => {
                assert!(owner.contains("scenarios[1]"));
                assert_eq!(field, "departure_time");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_scenarios_are_rejected() {
        let scenarios = StaticMacroScenarios {
            scenarios: vec![static_scenario("static_14"), static_scenario("static_14")],
        };
        assert!(matches!(
            scenarios.validate(),
            Err(ConfigError::DuplicateExternalId { .. })
        ));
    }
}
