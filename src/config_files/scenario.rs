// scenario.rs
//
// A dynamic scenario is stored on its own, so the scenario record itself is
// the configuration file.

use super::ConfigFile;
use crate::error::{ConfigError, ConfigResult};
use crate::models::{ObjectIdentity, Scenario};
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::{check_record, require, require_text, CheckedRecord};

const OWNER: &str = "scenario";

impl ConfigFile for Scenario {
    const KIND: &'static str = "scenario";

    fn validate(&self) -> ConfigResult<()> {
        require_text(&self.identity.name, OWNER, "name")?;
        require_text(&self.identity.external_id, OWNER, "external_id")?;
        check_record(OWNER, "links", &self.links)?;

        let experiment = require(&self.experiment, OWNER, "experiment")?;
        experiment.assert_experiment_well_formatted()?;
        if let Some(issue) = experiment.type_issue() {
            return Err(ConfigError::wrong_type(
                OWNER,
                None,
                format!("experiment.{}", issue.field),
                issue.reason,
            ));
        }

        let input_data = require(&self.input_data, OWNER, "input_data")?;
        check_record(OWNER, "input_data", input_data)
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer
            .field("name", &self.identity.name)?
            .field("external_id", &self.identity.external_id)?
            .field("internal_id", &self.identity.internal_id)?
            .field("links", &self.links)?
            .field("experiment", &self.experiment)?
            .field("input_data", &self.input_data)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            identity: ObjectIdentity {
                name: reader.field("name")?,
                external_id: reader.field("external_id")?,
                internal_id: reader.field("internal_id")?,
            },
            links: reader.field("links")?,
            experiment: reader.field("experiment")?,
            input_data: reader.field("input_data")?,
        })
    }
}
