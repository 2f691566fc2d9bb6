// fixtures.rs
//
// Catalog contents shared by the import and export tests.

use super::catalog::*;
use super::memory::InMemoryCatalog;
use crate::config_files::MasterControlPlan;
use crate::global_variables::*;
use crate::models::enums::{ControlJunctionType, ControlMeteringType, ControlPhaseRecall, FlashingType, MeteringType};
use crate::models::{
    ActuatedJunctionSettings, ActuatedPhaseSettings, ControlDetector, ControlJunction, ControlMetering, ControlPhase,
    ControlPhaseSignal, ControlPlan, Detector, DetectorCapabilities, MasterControlPlanItem, Metering, ObjectIdentity,
    SectionObject,
};

/// A layer with one three-lane, 120 m section on it.
pub fn network() -> (InMemoryCatalog, ObjectId, ObjectId) {
    let mut catalog = InMemoryCatalog::new();
    let layer = catalog.create_object(TYPE_LAYER, Some(NETWORK_LAYER_NAME), None);
    let section = catalog.create_object(TYPE_SECTION, Some("Mission Blvd"), None);
    catalog.set_attribute(section, ATT_LAYER, AttributeValue::Reference(layer)).unwrap();
    catalog.set_attribute(section, ATT_LENGTH, 120.0.into()).unwrap();
    catalog.set_attribute(section, ATT_NUM_LANES, 3i64.into()).unwrap();
    (catalog, layer, section)
}

/// Complete placement, named after its external id like the catalog names it.
pub fn placement(external_id: &str, layer: ObjectId, section: ObjectId) -> SectionObject {
    let mut placement = SectionObject::on_section(external_id, section);
    placement.identity.name = Some(external_id.to_string());
    placement.layer_id = Some(layer);
    placement.from_lane = Some(0);
    placement.to_lane = Some(1);
    placement.length = Some(4.5);
    placement.position = Some(80.0);
    placement
}

pub fn signal(number: i64) -> ControlPhaseSignal {
    ControlPhaseSignal {
        signal: Some(number),
        name: Some(format!("S{number}")),
        flashing_type: Some(FlashingType::No),
    }
}

/// Two 45 s phases; only the first one shows a green signal.
pub fn fixed_junction(node: ObjectId) -> ControlJunction {
    let mut green = ControlPhase::fixed(0.0, 45.0, false);
    green.signals.push(signal(3));
    ControlJunction {
        node_id: Some(node.to_string()),
        junction_type: Some(ControlJunctionType::FixedControl),
        cycle: Some(90.0),
        offset: Some(0.0),
        phases: vec![green, ControlPhase::fixed(45.0, 45.0, false)],
        actuated: None,
    }
}

pub fn actuated_phase(from_time: f64, signal_number: i64, detector: &str) -> ControlPhase {
    let mut phase = ControlPhase::fixed(from_time, 40.0, false);
    phase.signals.push(signal(signal_number));
    phase.actuated = Some(ActuatedPhaseSettings {
        id_ring: Some(1),
        recall: Some(ControlPhaseRecall::Min),
        is_default: Some(signal_number == 1),
        min_duration: Some(5.0),
        max_duration: Some(40.0),
        passage_time: Some(2.0),
        permissive_period_from: Some(0.0),
        permissive_period_to: Some(10.0),
        force_off: Some(35.0),
        hold: Some(false),
        maximum_initial: Some(10.0),
        seconds_actuation: Some(2.0),
        gap_reduction: Some(true),
        minimum_gap: Some(1.0),
        time_before_reduce: Some(5.0),
        time_to_reduce: Some(10.0),
        detectors: vec![ControlDetector {
            detector_external_id: Some(detector.to_string()),
            locking: Some(false),
            call_delay: Some(1.5),
            phase_activation: Some(true),
            phase_extension: Some(true),
        }],
    });
    phase
}

pub fn actuated_junction(node: ObjectId, detectors: [&str; 2]) -> ControlJunction {
    ControlJunction {
        node_id: Some(node.to_string()),
        junction_type: Some(ControlJunctionType::Actuated),
        cycle: Some(80.0),
        offset: Some(10.0),
        phases: vec![actuated_phase(0.0, 1, detectors[0]), actuated_phase(40.0, 2, detectors[1])],
        actuated: Some(ActuatedJunctionSettings {
            barriers: Some(vec![1, 2]),
            num_phases: Some(2),
            rest_in_red: Some(false),
            matches_offset_with_end_of_phase: Some(true),
            yellow_time: Some(3.0),
            single_entry: Some(false),
        }),
    }
}

/// A weekday schedule running a fixed plan then an actuated plan, with the
/// detectors and the metering those plans drive.
pub fn master_control_plan(catalog: &mut InMemoryCatalog, layer: ObjectId, section: ObjectId) -> MasterControlPlan {
    let fixed_node = catalog.create_object(TYPE_NODE, Some("Mission & Durham"), None);
    let actuated_node = catalog.create_object(TYPE_NODE, Some("Mission & Washington"), None);

    let mut am = ControlPlan::new("am_peak");
    am.identity.name = Some("AM peak".to_string());
    am.control_junctions.push(fixed_junction(fixed_node));
    am.control_meterings.push(ControlMetering {
        control_metering_type: Some(ControlMeteringType::FixedControl),
        metering_external_id: Some("meter_on_1".to_string()),
    });
    let mut pm = ControlPlan::new("pm_peak");
    pm.identity.name = Some("PM peak".to_string());
    pm.control_junctions
        .push(actuated_junction(actuated_node, ["act_det_1", "act_det_2"]));

    let detectors = ["act_det_1", "act_det_2"]
        .map(|id| Detector::measurement(placement(id, layer, section), DetectorCapabilities::all(true)));
    let metering = Metering::new(placement("meter_on_1", layer, section), MeteringType::GreenTime);
    let mut master = MasterControlPlan::from_schedule(
        vec![
            MasterControlPlanItem::new("am_peak", 0, 3600, 1),
            MasterControlPlanItem::new("pm_peak", 3600, 3600, 1),
        ],
        &[am, pm],
        &detectors,
        &[metering],
    )
    .unwrap();
    master.identity = ObjectIdentity::new("Weekday", "mcp_weekday");
    master
}
