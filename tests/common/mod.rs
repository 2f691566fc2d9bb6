// common/mod.rs
//
// Fixtures shared by the integration tests.

#![allow(dead_code)]

use microsim_config::adapter::catalog::{ATT_LAYER, ATT_LENGTH, ATT_NUM_LANES};
use microsim_config::adapter::{AttributeValue, InMemoryCatalog, ObjectId, SimulatorCatalog};
use microsim_config::config_files::{CentroidConfiguration, MasterControlPlan, TrafficManagementStrategy};
use microsim_config::global_variables::{NETWORK_LAYER_NAME, TYPE_LAYER, TYPE_SECTION};
use microsim_config::models::enums::CentroidType;
use microsim_config::models::{CentroidConnection, ControlPlan, MasterControlPlanItem, TrafficPolicy, TurningClosingChange};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const SEED: u64 = 20190101;

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

pub fn ccs_test_obj() -> CentroidConfiguration {
    let mut configuration = CentroidConfiguration::new("ccs_test_obj");
    configuration
        .centroids
        .push(CentroidConnection::new("cc_test_obj0", 0.0, 0.0, CentroidType::Internal));
    configuration
}

pub fn master_control_plan() -> MasterControlPlan {
    let schedule = vec![
        MasterControlPlanItem::new("peak_plan", 14 * 3600, 3 * 3600, 0),
        MasterControlPlanItem::new("off_peak_plan", 17 * 3600, 3 * 3600, 0),
    ];
    let plans = [ControlPlan::new("peak_plan"), ControlPlan::new("off_peak_plan")];
    MasterControlPlan::from_schedule(schedule, &plans, &[], &[]).unwrap()
}

pub fn traffic_strategy(from_section: i64, to_section: i64) -> TrafficManagementStrategy {
    let mut policy = TrafficPolicy::new("Closures", "closures");
    policy.scenario_changes.push(TurningClosingChange::new("no_left_on_mission", from_section, to_section));
    let mut strategy = TrafficManagementStrategy::default();
    strategy.add_policy(policy).unwrap();
    strategy.resolve_identities().unwrap();
    strategy
}

/// A catalog with one network layer and `sections` sections of 120 m and
/// three lanes each.
pub fn network(sections: usize) -> (InMemoryCatalog, ObjectId, Vec<ObjectId>) {
    let mut catalog = InMemoryCatalog::new();
    let layer = catalog.create_object(TYPE_LAYER, Some(NETWORK_LAYER_NAME), None);
    let ids = (0..sections)
        .map(|index| {
            let name = format!("section_{index}");
            let id = catalog.create_object(TYPE_SECTION, Some(name.as_str()), None);
            catalog.set_attribute(id, ATT_LAYER, AttributeValue::Reference(layer)).unwrap();
            catalog.set_attribute(id, ATT_LENGTH, 120.0.into()).unwrap();
            catalog.set_attribute(id, ATT_NUM_LANES, 3i64.into()).unwrap();
            id
        })
        .collect();
    (catalog, layer, ids)
}
