// traffic_management_strategy.rs

use std::fmt;

use super::{check_unique_external_ids, no_data, ConfigFile};
use crate::error::{ConfigError, ConfigResult};
use crate::global_variables::TRAFFIC_STRATEGY_EXTERNAL_ID;
use crate::models::{ObjectIdentity, TrafficPolicy};
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::{require_text, validate_list};

const OWNER: &str = "traffic management strategy";

fn policy_external_id(policy: &TrafficPolicy) -> Option<&str> {
    policy.identity.external_id()
}

/// Policies that are applied together to calm traffic in the study area.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficManagementStrategy {
    pub identity: ObjectIdentity,
    pub policies: Vec<TrafficPolicy>,
}

impl Default for TrafficManagementStrategy {
    fn default() -> Self {
        Self {
            identity: ObjectIdentity::with_external_id(TRAFFIC_STRATEGY_EXTERNAL_ID),
            policies: Vec::new(),
        }
    }
}

impl TrafficManagementStrategy {
    pub fn new(name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name, external_id),
            policies: Vec::new(),
        }
    }

    /// Add a policy. Two policies may not share an external id.
    pub fn add_policy(&mut self, policy: TrafficPolicy) -> ConfigResult<()> {
        if let Some(external_id) = policy.identity.external_id() {
            if self.policies.iter().any(|p| p.identity.external_id() == Some(external_id)) {
                return Err(ConfigError::DuplicateExternalId {
                    owner: OWNER.to_string(),
                    external_id: external_id.to_string(),
                });
            }
        }
        self.policies.push(policy);
        Ok(())
    }

    /// Default missing names from external ids and the other way round, for
    /// the strategy, its policies and their changes.
    pub fn resolve_identities(&mut self) -> ConfigResult<()> {
        self.identity.resolve_name_and_external_id("traffic management strategy")?;
        for policy in &mut self.policies {
            policy.resolve_identities()?;
        }
        Ok(())
    }
}

impl ConfigFile for TrafficManagementStrategy {
    const KIND: &'static str = "traffic_management_strategy";

    fn validate(&self) -> ConfigResult<()> {
        require_text(&self.identity.name, OWNER, "name")?;
        require_text(&self.identity.external_id, OWNER, "external_id")?;
        validate_list(OWNER, "policies", &self.policies)?;
        check_unique_external_ids(&self.policies, OWNER, policy_external_id)
    }

    fn check_not_empty(&self) -> ConfigResult<()> {
        if self.policies.is_empty() {
            return Err(no_data("TrafficManagementStrategy"));
        }
        Ok(())
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer
            .field("policies", &self.policies)?
            .field("name", &self.identity.name)?
            .field("external_id", &self.identity.external_id)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            identity: ObjectIdentity {
                name: reader.field("name")?,
                external_id: reader.field("external_id")?,
                internal_id: None,
            },
            policies: reader.list("policies")?,
        })
    }
}

impl fmt::Display for TrafficManagementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strategy {} ({} policies)", self.identity, self.policies.len())?;
        for policy in &self.policies {
            writeln!(f, "  {policy}")?;
            for change in &policy.scenario_changes {
                writeln!(f, "    {change}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TurningClosingChange;

    fn strategy() -> TrafficManagementStrategy {
        let mut policy = TrafficPolicy::new("Closures", "closures");
        policy
            .scenario_changes
            .push(TurningClosingChange::new("closing_1", 10, 11));
        let mut strategy = TrafficManagementStrategy::default();
        strategy.add_policy(policy).unwrap();
        strategy
    }

    #[test]
    fn default_strategy_needs_its_identities_resolved() {
        let mut strategy = strategy();
        assert!(matches!(
            strategy.validate(),
            Err(ConfigError::MissingAttribute { .. })
        ));
        strategy.resolve_identities().unwrap();
        assert_eq!(strategy.identity.name(), Some(TRAFFIC_STRATEGY_EXTERNAL_ID));
        strategy.validate().unwrap();
    }

    #[test]
    fn empty_strategy_cannot_be_encoded() {
        let mut strategy = TrafficManagementStrategy::new("Calming", "calming");
        strategy.resolve_identities().unwrap();
        let err = strategy.encode().unwrap_err();
        assert_eq!(format!("{err}"), "TrafficManagementStrategy has no data. Export aborted.");
    }

    #[test]
    fn duplicate_policy_is_rejected_on_insertion() {
        let mut strategy = strategy();
        assert!(matches!(
            strategy.add_policy(TrafficPolicy::new("Other", "closures")),
            Err(ConfigError::DuplicateExternalId { .. })
        ));
    }
}
