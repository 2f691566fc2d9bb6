// master_control_plan.rs

use std::fmt;

use super::{check_unique_external_ids, no_data, resolve_unique, ConfigFile};
use crate::error::{ConfigError, ConfigResult};
use crate::global_variables::MASTER_CONTROL_PLAN_EXTERNAL_ID;
use crate::models::{ControlPlan, Detector, MasterControlPlanItem, Metering, ObjectIdentity};
use crate::serializer::{RecordReader, RecordWriter};
use crate::validation::{require_text, validate_list};

const OWNER: &str = "master control plan";

/// The signal schedule of the study area together with every control plan,
/// detector and metering the schedule needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterControlPlan {
    pub identity: ObjectIdentity,
    pub schedule: Vec<MasterControlPlanItem>,
    pub control_plans: Vec<ControlPlan>,
    pub detectors: Vec<Detector>,
    pub meterings: Vec<Metering>,
}

impl Default for MasterControlPlan {
    fn default() -> Self {
        Self::new(MASTER_CONTROL_PLAN_EXTERNAL_ID)
    }
}

impl MasterControlPlan {
    /// The name doubles as the external id.
    pub fn new(external_id: impl Into<String>) -> Self {
        let external_id = external_id.into();
        Self {
            identity: ObjectIdentity::new(external_id.clone(), external_id),
            schedule: Vec::new(),
            control_plans: Vec::new(),
            detectors: Vec::new(),
            meterings: Vec::new(),
        }
    }

    /// Build a master control plan from its schedule. Every scheduled plan
    /// is taken from `plans`, and the detectors and meterings those plans
    /// drive are taken from `detectors` and `meterings`.
    pub fn from_schedule(
        schedule: Vec<MasterControlPlanItem>,
        plans: &[ControlPlan],
        detectors: &[Detector],
        meterings: &[Metering],
    ) -> ConfigResult<Self> {
        let mut master = Self::default();
        for item in &schedule {
            let plan_id = require_text(&item.control_plan_external_id, OWNER, "control_plan_external_id")?;
            if master.control_plan(plan_id).is_none() {
                let plan = resolve_unique(plans, plan_id, OWNER, "control plan", ControlPlan::external_id)?;
                master.add_control_plan(plan.clone())?;
            }
        }

        let detector_ids: Vec<String> = master
            .control_plans
            .iter()
            .flat_map(|plan| plan.detector_external_ids())
            .map(str::to_string)
            .collect();
        for detector_id in &detector_ids {
            let detector = resolve_unique(detectors, detector_id, OWNER, "detector", Detector::external_id)?;
            master.add_detector(detector.clone())?;
        }

        let metering_ids: Vec<String> = master
            .control_plans
            .iter()
            .flat_map(|plan| plan.metering_external_ids())
            .map(str::to_string)
            .collect();
        for metering_id in &metering_ids {
            let metering = resolve_unique(meterings, metering_id, OWNER, "metering", Metering::external_id)?;
            master.add_metering(metering.clone())?;
        }

        master.schedule = schedule;
        Ok(master)
    }

    pub fn control_plan(&self, external_id: &str) -> Option<&ControlPlan> {
        self.control_plans
            .iter()
            .find(|plan| plan.external_id() == Some(external_id))
    }

    /// Add a control plan. Two plans may not share an external id.
    pub fn add_control_plan(&mut self, plan: ControlPlan) -> ConfigResult<()> {
        let external_id = require_text(&plan.identity.external_id, OWNER, "control_plans.external_id")?;
        if self.control_plan(external_id).is_some() {
            return Err(ConfigError::DuplicateExternalId {
                owner: OWNER.to_string(),
                external_id: external_id.to_string(),
            });
        }
        self.control_plans.push(plan);
        Ok(())
    }

    /// Add a detector unless the same detector is already there. Returns
    /// whether it was added.
    pub fn add_detector(&mut self, detector: Detector) -> ConfigResult<bool> {
        let external_id = require_text(&detector.section.identity.external_id, OWNER, "detectors.external_id")?;
        match self.detectors.iter().find(|d| d.external_id() == Some(external_id)) {
            Some(existing) if *existing == detector => Ok(false),
            Some(_) => Err(ConfigError::DuplicateExternalId {
                owner: OWNER.to_string(),
                external_id: external_id.to_string(),
            }),
            None => {
                self.detectors.push(detector);
                Ok(true)
            }
        }
    }

    /// Add a metering unless the same metering is already there. Returns
    /// whether it was added.
    pub fn add_metering(&mut self, metering: Metering) -> ConfigResult<bool> {
        let external_id = require_text(&metering.section.identity.external_id, OWNER, "meterings.external_id")?;
        match self.meterings.iter().find(|m| m.external_id() == Some(external_id)) {
            Some(existing) if *existing == metering => Ok(false),
            Some(_) => Err(ConfigError::DuplicateExternalId {
                owner: OWNER.to_string(),
                external_id: external_id.to_string(),
            }),
            None => {
                self.meterings.push(metering);
                Ok(true)
            }
        }
    }

    /// Each schedule item with the plan it runs.
    pub fn scheduled_plans(&self) -> ConfigResult<Vec<(&MasterControlPlanItem, &ControlPlan)>> {
        self.schedule
            .iter()
            .map(|item| {
                let plan_id = require_text(&item.control_plan_external_id, OWNER, "control_plan_external_id")?;
                let plan = resolve_unique(&self.control_plans, plan_id, OWNER, "control plan", ControlPlan::external_id)?;
                Ok((item, plan))
            })
            .collect()
    }
}

impl ConfigFile for MasterControlPlan {
    const KIND: &'static str = "master_control_plan";

    fn validate(&self) -> ConfigResult<()> {
        require_text(&self.identity.name, OWNER, "name")?;
        require_text(&self.identity.external_id, OWNER, "external_id")?;
        validate_list(OWNER, "schedule", &self.schedule)?;
        validate_list(OWNER, "control_plans", &self.control_plans)?;
        validate_list(OWNER, "detectors", &self.detectors)?;
        validate_list(OWNER, "meterings", &self.meterings)?;
        check_unique_external_ids(&self.control_plans, OWNER, ControlPlan::external_id)?;
        check_unique_external_ids(&self.detectors, OWNER, Detector::external_id)?;
        check_unique_external_ids(&self.meterings, OWNER, Metering::external_id)?;
        self.scheduled_plans().map(|_| ())
    }

    fn check_not_empty(&self) -> ConfigResult<()> {
        if self.schedule.is_empty() {
            return Err(no_data("MasterControlPlan"));
        }
        Ok(())
    }

    fn write_record(&self, writer: &mut RecordWriter) -> ConfigResult<()> {
        writer
            .field("schedule", &self.schedule)?
            .field("control_plans", &self.control_plans)?
            .field("meterings", &self.meterings)?
            .field("detectors", &self.detectors)?
            .field("external_id", &self.identity.external_id)?
            .field("name", &self.identity.name)?;
        Ok(())
    }

    fn read_record(reader: &RecordReader) -> ConfigResult<Self> {
        Ok(Self {
            identity: ObjectIdentity {
                name: reader.field("name")?,
                external_id: reader.field("external_id")?,
                internal_id: None,
            },
            schedule: reader.list("schedule")?,
            control_plans: reader.list("control_plans")?,
            detectors: reader.list("detectors")?,
            meterings: reader.list("meterings")?,
        })
    }
}

impl fmt::Display for MasterControlPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Master control plan {} ({} schedule items, {} plans, {} detectors, {} meterings)",
            self.identity,
            self.schedule.len(),
            self.control_plans.len(),
            self.detectors.len(),
            self.meterings.len()
        )?;
        for plan in &self.control_plans {
            writeln!(f, "  {plan}")?;
        }
        Ok(())
    }
}
