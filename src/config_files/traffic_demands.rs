// traffic_demands.rs

use std::fmt;

use super::{check_unique_external_ids, ConfigFile};
use crate::error::ConfigResult;
use crate::models::TrafficDemand;
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::validate_list;

const OWNER: &str = "traffic demands";

fn demand_external_id(demand: &TrafficDemand) -> Option<&str> {
    demand.identity.external_id()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficDemands {
    pub traffic_demands: Vec<TrafficDemand>,
}

impl TrafficDemands {
    pub fn demand(&self, external_id: &str) -> Option<&TrafficDemand> {
        self.traffic_demands
            .iter()
            .find(|demand| demand.identity.external_id() == Some(external_id))
    }
}

impl ConfigFile for TrafficDemands {
    const KIND: &'static str = "traffic_demands";

    fn validate(&self) -> ConfigResult<()> {
        validate_list(OWNER, "traffic_demands", &self.traffic_demands)?;
        check_unique_external_ids(&self.traffic_demands, OWNER, demand_external_id)
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer.field("traffic_demands", &self.traffic_demands)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            traffic_demands: reader.list("traffic_demands")?,
        })
    }
}

impl fmt::Display for TrafficDemands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} traffic demands", self.traffic_demands.len())?;
        for demand in &self.traffic_demands {
            writeln!(f, "  {demand}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use chrono::NaiveTime;

    #[test]
    fn scheduled_demand_validates() {
        let mut demand = TrafficDemand::new("fremont_demand");
        let starts = [
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(14, 15, 0).unwrap(),
        ];
        demand.schedule_all(&starts);
        let demands = TrafficDemands {
            traffic_demands: vec![demand],
        };
        demands.validate().unwrap();
        let items = &demands.demand("fremont_demand").unwrap().demand_items;
        assert_eq!(items.len(), 4);
        assert_eq!(items[1].demand_external_id.as_deref(), Some("Traveler_14_00"));
    }

    #[test]
    fn item_without_factor_reports_its_path() {
        let mut demand = TrafficDemand::new("fremont_demand");
        demand.schedule_all(&[NaiveTime::from_hms_opt(14, 0, 0).unwrap()]);
        demand.demand_items[1].demand_factor = None;
        let demands = TrafficDemands {
            traffic_demands: vec![demand],
        };
        match demands.validate().unwrap_err() {
            ConfigError::MissingAttribute { field, .. } => assert_eq!(field, "demand_items[1].demand_factor"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
