// importers.rs
//
// Creating simulator objects from configuration aggregates. Every aggregate
// is validated before the first object is created.

use chrono::Timelike;
use log::{info, warn};
use std::collections::{BTreeSet, HashMap};

use super::catalog::*;
use super::lookup::{get_object_per_external_id, get_object_per_internal_id};
use crate::config_files::{
    CentroidConfiguration, ConfigFile, Detectors, MasterControlPlan, OdMatrices, SectionSpeedLimitsAndCapacities,
    TrafficManagementStrategy,
};
use crate::error::{ConfigError, ConfigResult};
use crate::global_variables::*;
use crate::models::enums::{ControlJunctionType, ControlMeteringType, ControlPhaseRecall, FlashingType};
use crate::models::{
    ActuatedPhaseSettings, ControlDetector, ControlJunction, ControlPhase, ControlPhaseSignal, ControlPlan, Detector,
    DetectorCapabilities, DetectorKind, Metering, SectionObject, TurningClosingChange,
};
use crate::settings::Settings;

const SOURCE: &str = "import";

pub(super) fn set_optional<C, T>(catalog: &mut C, id: ObjectId, attribute: &str, value: Option<T>) -> ConfigResult<()>
where
    C: SimulatorCatalog + ?Sized,
    T: Into<AttributeValue>,
{
    match value {
        Some(value) => catalog.set_attribute(id, attribute, value.into()),
        None => Ok(()),
    }
}

pub(super) fn refuse_existing<C>(catalog: &mut C, external_id: &str) -> ConfigResult<()>
where
    C: SimulatorCatalog + ?Sized,
{
    if catalog.find_by_external_id(external_id).is_empty() {
        return Ok(());
    }
    catalog.report_error(SOURCE, &format!("{external_id} already exists."));
    Err(ConfigError::DuplicateExternalId {
        owner: "simulator catalog".to_string(),
        external_id: external_id.to_string(),
    })
}

/// Create the centroids and their configuration. Connections to sections
/// missing from the catalog are dropped with a single warning.
pub fn import_centroid_configuration<C>(catalog: &mut C, configuration: &CentroidConfiguration) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    configuration.validate()?;
    let external_id = configuration.external_id.as_deref().unwrap_or(CENTROID_CONFIG_EXTERNAL_ID);
    refuse_existing(catalog, external_id)?;
    let configuration_id = catalog.create_object(TYPE_CENTROID_CONFIGURATION, Some(external_id), Some(external_id));

    let mut missing_sections = BTreeSet::new();
    let mut centroid_ids = Vec::with_capacity(configuration.centroids.len());
    for connection in &configuration.centroids {
        let centroid_external_id = connection.identity.external_id();
        let name = connection.identity.name().or(centroid_external_id);
        let id = catalog.create_object(TYPE_CENTROID, name, centroid_external_id);
        set_optional(catalog, id, ATT_LATITUDE, connection.latitude)?;
        set_optional(catalog, id, ATT_LONGITUDE, connection.longitude)?;
        set_optional(catalog, id, ATT_CENTROID_TYPE, connection.centroid_type.map(|kind| kind.as_str()))?;

        for (attribute, sections) in [
            (ATT_FROM_SECTIONS, &connection.from_section_internal_ids),
            (ATT_TO_SECTIONS, &connection.to_section_internal_ids),
        ] {
            let mut connected = Vec::new();
            for section in sections.iter().flatten() {
                let exists = catalog
                    .find_by_internal_id(*section)
                    .is_some_and(|object| object.type_name == TYPE_SECTION);
                if exists {
                    connected.push(*section);
                } else {
                    missing_sections.insert(*section);
                }
            }
            catalog.set_attribute(id, attribute, connected.into())?;
        }
        centroid_ids.push(id);
    }
    if !missing_sections.is_empty() {
        warn!("Sections {missing_sections:?} not found, their centroid connections were skipped");
        catalog.report_error(SOURCE, &format!("WARNING: sections {missing_sections:?} not found."));
    }
    catalog.set_attribute(configuration_id, ATT_CENTROIDS, centroid_ids.into())?;
    info!(
        "Imported centroid configuration {external_id} with {} centroids",
        configuration.centroids.len()
    );
    Ok(configuration_id)
}

/// Create one OD matrix object per matrix. A matrix whose external id is
/// already in the catalog aborts the import.
pub fn import_od_matrices<C>(catalog: &mut C, matrices: &OdMatrices) -> ConfigResult<Vec<ObjectId>>
where
    C: SimulatorCatalog + ?Sized,
{
    matrices.validate()?;
    let configuration_external_id = matrices
        .centroid_configuration_external_id
        .as_deref()
        .ok_or_else(|| ConfigError::missing("od matrices", "centroid_configuration_external_id"))?;
    let configuration_id =
        get_object_per_external_id(catalog, configuration_external_id, TYPE_CENTROID_CONFIGURATION)?;

    let mut centroids: HashMap<String, ObjectId> = HashMap::new();
    let mut created = Vec::with_capacity(matrices.od_matrices.len());
    for matrix in &matrices.od_matrices {
        let (Some(external_id), Some(begin), Some(end), Some(vehicle_type)) = (
            matrix.external_id(),
            matrix.begin_time_interval,
            matrix.end_time_interval,
            matrix.vehicle_type,
        ) else {
            return Err(ConfigError::missing("od matrix", "begin_time_interval"));
        };
        refuse_existing(catalog, &external_id)?;

        let mut trips = Vec::with_capacity(matrix.od_trips_count.len());
        for count in &matrix.od_trips_count {
            let origin = resolve_centroid(catalog, &mut centroids, count.origin_centroid_external_id.as_deref())?;
            let destination =
                resolve_centroid(catalog, &mut centroids, count.destination_centroid_external_id.as_deref())?;
            trips.push((origin, destination, count.num_trips.unwrap_or_default()));
        }

        let id = catalog.create_object(TYPE_OD_MATRIX, Some(external_id.as_str()), Some(external_id.as_str()));
        catalog.set_attribute(id, ATT_CENTROID_CONFIGURATION, AttributeValue::Reference(configuration_id))?;
        catalog.set_attribute(id, ATT_VEHICLE_TYPE, vehicle_type.as_str().into())?;
        catalog.set_attribute(id, ATT_BEGIN, i64::from(begin.num_seconds_from_midnight()).into())?;
        catalog.set_attribute(id, ATT_DURATION, (end - begin).num_seconds().into())?;
        catalog.set_attribute(id, ATT_TRIPS, AttributeValue::Trips(trips))?;
        created.push(id);
    }
    info!("Imported {} OD matrices", created.len());
    Ok(created)
}

fn resolve_centroid<C>(
    catalog: &mut C,
    known: &mut HashMap<String, ObjectId>,
    external_id: Option<&str>,
) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let external_id = external_id.ok_or_else(|| ConfigError::missing("od trips count", "centroid external id"))?;
    if let Some(id) = known.get(external_id) {
        return Ok(*id);
    }
    let id = get_object_per_external_id(catalog, external_id, TYPE_CENTROID)?;
    known.insert(external_id.to_string(), id);
    Ok(id)
}

/// Set speed limits and capacities. Sections missing from the catalog are
/// skipped. Returns how many sections were updated.
pub fn update_speed_and_capacity<C>(catalog: &mut C, sections: &SectionSpeedLimitsAndCapacities) -> ConfigResult<usize>
where
    C: SimulatorCatalog + ?Sized,
{
    sections.validate()?;
    let mut updated = 0;
    for section in &sections.sections {
        let Some(id) = section.section_internal_id else { continue };
        let exists = catalog
            .find_by_internal_id(id)
            .is_some_and(|object| object.type_name == TYPE_SECTION);
        if !exists {
            warn!("Section {id} not found, speed limit and capacity skipped");
            continue;
        }
        set_optional(catalog, id, ATT_SPEED, section.speed_limit_in_km_per_hour)?;
        set_optional(catalog, id, ATT_CAPACITY, section.capacity_in_vehicles_per_hour)?;
        updated += 1;
    }
    info!("Updated {updated} of {} sections", sections.sections.len());
    Ok(updated)
}

/// Section and layer a new object will sit on. A layer given on the record
/// must be the section's own layer. Nothing is created here, so a failed
/// placement leaves the catalog untouched.
fn resolve_placement<C>(catalog: &mut C, placement: &SectionObject) -> ConfigResult<(ObjectId, Option<ObjectId>)>
where
    C: SimulatorCatalog + ?Sized,
{
    let owner = format!("section object {}", placement.identity);
    let section_id = placement
        .section_internal_id
        .ok_or_else(|| ConfigError::missing(owner.clone(), "section_internal_id"))?;
    let section_id = get_object_per_internal_id(catalog, section_id, &[TYPE_SECTION])?;
    let section_layer = catalog
        .attribute(section_id, ATT_LAYER)
        .and_then(AttributeValue::as_reference);
    if let Some(layer) = placement.layer_id {
        get_object_per_internal_id(catalog, layer, &[TYPE_LAYER])?;
        if section_layer != Some(layer) {
            catalog.report_error(SOURCE, "The section's layer is not the section object's layer.");
            return Err(ConfigError::wrong_type(
                owner,
                None,
                "layer_id",
                format!("layer {layer} is not the layer of section {section_id}"),
            ));
        }
    }
    Ok((section_id, section_layer))
}

fn place_section_object<C>(catalog: &mut C, id: ObjectId, placement: &SectionObject, section: (ObjectId, Option<ObjectId>)) -> ConfigResult<()>
where
    C: SimulatorCatalog + ?Sized,
{
    let (section_id, layer) = section;
    catalog.set_attribute(id, ATT_SECTION, AttributeValue::Reference(section_id))?;
    if let Some(layer) = layer {
        catalog.set_attribute(id, ATT_LAYER, AttributeValue::Reference(layer))?;
    }
    set_optional(catalog, id, ATT_LENGTH, placement.length)?;
    set_optional(catalog, id, ATT_POSITION, placement.position)?;
    set_optional(catalog, id, ATT_FROM_LANE, placement.from_lane)?;
    set_optional(catalog, id, ATT_TO_LANE, placement.to_lane)
}

fn set_capabilities<C>(catalog: &mut C, id: ObjectId, capabilities: &DetectorCapabilities) -> ConfigResult<()>
where
    C: SimulatorCatalog + ?Sized,
{
    let flags = [
        capabilities.detect_count,
        capabilities.detect_density,
        capabilities.detect_equipped_vehicles,
        capabilities.detect_headway,
        capabilities.detect_occupancy,
        capabilities.detect_presence,
        capabilities.detect_speed,
    ];
    for (attribute, flag) in DETECTION_FLAGS.iter().zip(flags) {
        set_optional(catalog, id, attribute, flag)?;
    }
    set_optional(catalog, id, ATT_EXTENDED_LENGTH, capabilities.extended_length)?;
    set_optional(catalog, id, ATT_NUMBER_OF_LANES, capabilities.number_of_lanes)?;
    set_optional(catalog, id, ATT_DETECTOR_OFFSET, capabilities.offset)?;
    set_optional(catalog, id, ATT_POSITION_FROM_END, capabilities.position_from_end)
}

fn create_detector<C>(catalog: &mut C, detector: &Detector, settings: &Settings) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let placement = &detector.section;
    let external_id = detector.external_id();
    let section = resolve_placement(catalog, placement)?;

    let (geometry, capabilities) = match (detector.kind, &detector.capabilities) {
        (DetectorKind::Flow, _) => {
            let section_id = section.0;
            let (section_length, num_lanes) = {
                let section = catalog
                    .find_by_internal_id(section_id)
                    .ok_or_else(|| ConfigError::missing(format!("{TYPE_SECTION} {section_id}"), ATT_LENGTH))?;
                let reader = section.reader();
                (reader.float(ATT_LENGTH)?, reader.int(ATT_NUM_LANES)?)
            };
            // Flow detectors span the whole section unless configured otherwise.
            let (from_lane, to_lane) = external_id
                .and_then(|external_id| settings.lane_override(external_id))
                .map(|lanes| lanes.lanes(num_lanes))
                .unwrap_or((0, num_lanes - 1));
            let position = section_length / 2.0;
            let geometry = SectionObject {
                length: Some(FLOW_DETECTOR_LENGTH),
                position: Some(position),
                from_lane: Some(from_lane),
                to_lane: Some(to_lane),
                ..placement.clone()
            };
            let capabilities = DetectorCapabilities {
                detect_count: Some(true),
                number_of_lanes: Some(to_lane - from_lane + 1),
                position_from_end: Some((section_length - position - FLOW_DETECTOR_LENGTH).max(0.0)),
                ..DetectorCapabilities::all(false)
            };
            (geometry, capabilities)
        }
        (DetectorKind::Measurement, Some(capabilities)) => (placement.clone(), capabilities.clone()),
        (DetectorKind::Measurement, None) => {
            return Err(ConfigError::missing(format!("detector {}", placement.identity), "capabilities"));
        }
    };

    let id = catalog.create_object(TYPE_DETECTOR, placement.identity.name().or(external_id), external_id);
    place_section_object(catalog, id, &geometry, section)?;
    set_capabilities(catalog, id, &capabilities)?;
    Ok(id)
}

/// Create every detector of the aggregate on its section.
pub fn import_detectors<C>(catalog: &mut C, detectors: &Detectors, settings: &Settings) -> ConfigResult<Vec<ObjectId>>
where
    C: SimulatorCatalog + ?Sized,
{
    detectors.validate()?;
    let created = detectors
        .detectors
        .iter()
        .map(|detector| create_detector(catalog, detector, settings))
        .collect::<ConfigResult<Vec<_>>>()?;
    info!("Imported {} detectors", created.len());
    Ok(created)
}

fn create_metering<C>(catalog: &mut C, metering: &Metering) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let placement = &metering.section;
    let external_id = metering.external_id();
    let section = resolve_placement(catalog, placement)?;
    let id = catalog.create_object(TYPE_METERING, placement.identity.name().or(external_id), external_id);
    place_section_object(catalog, id, placement, section)?;
    if let Some(kind) = metering.metering_type {
        catalog.set_attribute(id, ATT_METERING_TYPE, kind.code().into())?;
        if kind.regulates_flow() {
            set_optional(catalog, id, ATT_VEHICLE_FLOW, metering.vehicle_flow)?;
        }
    }
    Ok(id)
}

pub(super) fn insert_optional<T: Into<AttributeValue>>(record: &mut Record, attribute: &str, value: Option<T>) {
    if let Some(value) = value {
        record.insert(attribute.to_string(), value.into());
    }
}

fn signal_record(signal: &ControlPhaseSignal) -> Record {
    let mut record = Record::new();
    insert_optional(&mut record, ATT_SIGNAL, signal.signal);
    insert_optional(&mut record, ATT_NAME, signal.name.as_deref());
    insert_optional(&mut record, ATT_FLASHING_TYPE, signal.flashing_type.map(FlashingType::code));
    record
}

fn control_detector_record<C>(catalog: &mut C, detector: &ControlDetector) -> ConfigResult<Record>
where
    C: SimulatorCatalog + ?Sized,
{
    let external_id = detector
        .detector_external_id
        .as_deref()
        .ok_or_else(|| ConfigError::missing("control detector", "detector_external_id"))?;
    let detector_id = get_object_per_external_id(catalog, external_id, TYPE_DETECTOR)?;
    let mut record = Record::new();
    record.insert(ATT_DETECTOR.to_string(), AttributeValue::Reference(detector_id));
    insert_optional(&mut record, ATT_LOCKING, detector.locking);
    insert_optional(&mut record, ATT_CALL_DELAY, detector.call_delay);
    insert_optional(&mut record, ATT_PHASE_ACTIVATION, detector.phase_activation);
    insert_optional(&mut record, ATT_PHASE_EXTENSION, detector.phase_extension);
    Ok(record)
}

fn actuated_phase_fields<C>(catalog: &mut C, record: &mut Record, actuated: &ActuatedPhaseSettings) -> ConfigResult<()>
where
    C: SimulatorCatalog + ?Sized,
{
    insert_optional(record, ATT_ID_RING, actuated.id_ring);
    insert_optional(record, ATT_RECALL, actuated.recall.map(ControlPhaseRecall::code));
    insert_optional(record, ATT_IS_DEFAULT, actuated.is_default);
    insert_optional(record, ATT_MIN_DURATION, actuated.min_duration);
    insert_optional(record, ATT_MAX_DURATION, actuated.max_duration);
    insert_optional(record, ATT_PASSAGE_TIME, actuated.passage_time);
    insert_optional(record, ATT_PERMISSIVE_PERIOD_FROM, actuated.permissive_period_from);
    insert_optional(record, ATT_PERMISSIVE_PERIOD_TO, actuated.permissive_period_to);
    insert_optional(record, ATT_FORCE_OFF, actuated.force_off);
    insert_optional(record, ATT_HOLD, actuated.hold);
    insert_optional(record, ATT_MAXIMUM_INITIAL, actuated.maximum_initial);
    insert_optional(record, ATT_SECONDS_ACTUATION, actuated.seconds_actuation);
    insert_optional(record, ATT_GAP_REDUCTION, actuated.gap_reduction);
    insert_optional(record, ATT_MINIMUM_GAP, actuated.minimum_gap);
    insert_optional(record, ATT_TIME_BEFORE_REDUCE, actuated.time_before_reduce);
    insert_optional(record, ATT_TIME_TO_REDUCE, actuated.time_to_reduce);
    let detectors = actuated
        .detectors
        .iter()
        .map(|detector| control_detector_record(catalog, detector))
        .collect::<ConfigResult<Vec<_>>>()?;
    record.insert(ATT_DETECTORS.to_string(), AttributeValue::Records(detectors));
    Ok(())
}

/// Timing and signal groups of one phase. Actuated junctions also store the
/// actuation parameters and the detectors calling the phase.
fn phase_record<C>(catalog: &mut C, phase: &ControlPhase, actuated_junction: bool) -> ConfigResult<Record>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut record = Record::new();
    insert_optional(&mut record, ATT_FROM_TIME, phase.from_time);
    insert_optional(&mut record, ATT_DURATION, phase.duration);
    insert_optional(&mut record, ATT_INTERPHASE, phase.interphase);
    record.insert(
        ATT_SIGNALS.to_string(),
        AttributeValue::Records(phase.signals.iter().map(signal_record).collect()),
    );
    if actuated_junction {
        let actuated = phase
            .actuated
            .as_ref()
            .ok_or_else(|| ConfigError::missing("control phase", "actuated"))?;
        actuated_phase_fields(catalog, &mut record, actuated)?;
    }
    Ok(record)
}

fn junction_record<C>(catalog: &mut C, plan: &str, junction: &ControlJunction) -> ConfigResult<Record>
where
    C: SimulatorCatalog + ?Sized,
{
    let node_id = junction.node_id.as_deref().unwrap_or_default();
    let node = node_id.trim().parse::<ObjectId>().map_err(|_| {
        ConfigError::wrong_type(
            format!("control plan {plan}"),
            None,
            "node_id",
            format!("`{node_id}` is not an internal id"),
        )
    })?;
    let node = get_object_per_internal_id(catalog, node, &[TYPE_NODE])?;

    let actuated = junction.is_actuated();
    let mut phases = Vec::with_capacity(junction.phases.len());
    for phase in &junction.phases {
        phases.push(phase_record(catalog, phase, actuated)?);
    }
    // Vehicles may not enter a congested intersection.
    catalog.set_attribute(node, ATT_YELLOW_BOX, true.into())?;

    let mut record = Record::new();
    record.insert(ATT_NODE.to_string(), AttributeValue::Reference(node));
    insert_optional(&mut record, ATT_JUNCTION_TYPE, junction.junction_type.map(ControlJunctionType::code));
    insert_optional(&mut record, ATT_CYCLE, junction.cycle);
    insert_optional(&mut record, ATT_OFFSET, junction.offset);
    record.insert(ATT_PHASES.to_string(), AttributeValue::Records(phases));
    if let (true, Some(settings)) = (actuated, &junction.actuated) {
        if let Some(barriers) = &settings.barriers {
            record.insert(ATT_BARRIERS.to_string(), AttributeValue::Ints(barriers.clone()));
        }
        insert_optional(&mut record, ATT_NUM_PHASES, settings.num_phases);
        insert_optional(&mut record, ATT_REST_IN_RED, settings.rest_in_red);
        insert_optional(
            &mut record,
            ATT_MATCHES_OFFSET_WITH_END_OF_PHASE,
            settings.matches_offset_with_end_of_phase,
        );
        insert_optional(&mut record, ATT_YELLOW_TIME, settings.yellow_time);
        insert_optional(&mut record, ATT_SINGLE_ENTRY, settings.single_entry);
    }
    Ok(record)
}

fn create_control_plan<C>(catalog: &mut C, plan: &ControlPlan) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let external_id = plan.external_id().unwrap_or_default();
    let mut junctions = Vec::with_capacity(plan.control_junctions.len());
    for junction in &plan.control_junctions {
        junctions.push(junction_record(catalog, external_id, junction)?);
    }
    let mut meterings = Vec::with_capacity(plan.control_meterings.len());
    for control in &plan.control_meterings {
        let metering_external_id = control.metering_external_id.as_deref().unwrap_or_default();
        let metering = get_object_per_external_id(catalog, metering_external_id, TYPE_METERING)?;
        let mut record = Record::new();
        record.insert(ATT_METERING.to_string(), AttributeValue::Reference(metering));
        insert_optional(&mut record, ATT_CONTROL_METERING_TYPE, control.control_metering_type.map(ControlMeteringType::code));
        meterings.push(record);
    }

    let name = plan.identity.name().unwrap_or(external_id);
    let id = catalog.create_object(TYPE_CONTROL_PLAN, Some(name), Some(external_id));
    set_optional(catalog, id, ATT_OFFSET, plan.offset)?;
    catalog.set_attribute(id, ATT_JUNCTIONS, AttributeValue::Records(junctions))?;
    catalog.set_attribute(id, ATT_METERINGS, AttributeValue::Records(meterings))?;
    Ok(id)
}

/// Create meterings, detectors and control plans, then the master control
/// plan whose schedule refers to the plans by external id.
pub fn import_master_control_plan<C>(
    catalog: &mut C,
    master: &MasterControlPlan,
    settings: &Settings,
) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    master.validate()?;
    for metering in &master.meterings {
        create_metering(catalog, metering)?;
    }
    for detector in &master.detectors {
        create_detector(catalog, detector, settings)?;
    }
    for plan in &master.control_plans {
        create_control_plan(catalog, plan)?;
    }

    let mut schedule = Vec::with_capacity(master.schedule.len());
    for item in &master.schedule {
        let plan_external_id = item.control_plan_external_id.as_deref().unwrap_or_default();
        let plan = get_object_per_external_id(catalog, plan_external_id, TYPE_CONTROL_PLAN)?;
        let mut record = Record::new();
        record.insert(ATT_CONTROL_PLAN.to_string(), AttributeValue::Reference(plan));
        insert_optional(&mut record, ATT_FROM_TIME, item.from_time);
        insert_optional(&mut record, ATT_DURATION, item.duration);
        insert_optional(&mut record, ATT_ZONE, item.zone);
        schedule.push(record);
    }

    let id = catalog.create_object(
        TYPE_MASTER_CONTROL_PLAN,
        master.identity.name(),
        master.identity.external_id(),
    );
    catalog.set_attribute(id, ATT_SCHEDULE, AttributeValue::Records(schedule))?;
    info!(
        "Imported master control plan {} ({} plans, {} detectors, {} meterings)",
        master.identity,
        master.control_plans.len(),
        master.detectors.len(),
        master.meterings.len()
    );
    Ok(id)
}

fn create_turning_closing_change<C>(catalog: &mut C, change: &TurningClosingChange) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut sections = [0; 2];
    for (slot, section) in sections
        .iter_mut()
        .zip([change.from_section_internal_id, change.to_section_internal_id])
    {
        let section = section.ok_or_else(|| ConfigError::missing("turning closing change", "section"))?;
        *slot = get_object_per_internal_id(catalog, section, &[TYPE_SECTION])?;
    }
    let id = catalog.create_object(
        TYPE_TURNING_CLOSING_CHANGE,
        change.identity.name(),
        change.identity.external_id(),
    );
    catalog.set_attribute(id, ATT_FROM_SECTION, AttributeValue::Reference(sections[0]))?;
    catalog.set_attribute(id, ATT_TO_SECTION, AttributeValue::Reference(sections[1]))?;
    if let Some(kind) = change.scenario_change_type {
        catalog.set_attribute(id, ATT_CHANGE_TYPE, kind.code().into())?;
    }
    Ok(id)
}

/// Create the strategy, its policies and their turning restrictions. Missing
/// names and external ids are defaulted from each other first.
pub fn import_traffic_strategy<C>(catalog: &mut C, strategy: &TrafficManagementStrategy) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut strategy = strategy.clone();
    strategy.resolve_identities()?;
    strategy.validate()?;

    let mut policies = Vec::with_capacity(strategy.policies.len());
    for policy in &strategy.policies {
        let mut changes = Vec::with_capacity(policy.scenario_changes.len());
        for change in &policy.scenario_changes {
            changes.push(create_turning_closing_change(catalog, change)?);
        }
        let id = catalog.create_object(TYPE_POLICY, policy.identity.name(), policy.identity.external_id());
        catalog.set_attribute(id, ATT_CHANGES, changes.into())?;
        policies.push(id);
    }
    let id = catalog.create_object(TYPE_STRATEGY, strategy.identity.name(), strategy.identity.external_id());
    catalog.set_attribute(id, ATT_POLICIES, policies.into())?;
    info!("Imported strategy {} with {} policies", strategy.identity, strategy.policies.len());
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::fixtures::{self, network};
    use crate::error::ReferenceFailure;
    use crate::models::enums::{CentroidType, ControlJunctionType, ControlMeteringType, MeteringType, VehicleTypeName};
    use crate::models::{
        CentroidConnection, ControlMetering, MasterControlPlanItem, OdMatrix, OdTripsCount,
        SectionSpeedLimitAndCapacity, TrafficPolicy,
    };
    use chrono::NaiveTime;

    #[test]
    fn flow_detectors_take_their_geometry_from_the_section() {
        let (mut catalog, layer, section) = network();
        let mut detectors = Detectors::default();
        detectors.add_detector(Detector::flow("pems_1", section)).unwrap();
        detectors.add_detector(Detector::flow("pems_detector_402793", section)).unwrap();
        let ids = import_detectors(&mut catalog, &detectors, &Settings::default()).unwrap();

        let plain = catalog.find_by_internal_id(ids[0]).unwrap().reader();
        assert_eq!(plain.float(ATT_LENGTH).unwrap(), FLOW_DETECTOR_LENGTH);
        assert_eq!(plain.float(ATT_POSITION).unwrap(), 60.0);
        assert_eq!(plain.int(ATT_FROM_LANE).unwrap(), 0);
        assert_eq!(plain.int(ATT_TO_LANE).unwrap(), 2);
        assert_eq!(plain.reference(ATT_LAYER).unwrap(), layer);

        let overridden = catalog.find_by_internal_id(ids[1]).unwrap().reader();
        assert_eq!(overridden.int(ATT_FROM_LANE).unwrap(), 1);
        assert_eq!(overridden.int(ATT_TO_LANE).unwrap(), 2);
    }

    #[test]
    fn detector_on_unknown_section_is_an_external_reference_error() {
        let (mut catalog, _, section) = network();
        let mut detectors = Detectors::default();
        detectors.add_detector(Detector::flow("pems_1", section + 100)).unwrap();
        let err = import_detectors(&mut catalog, &detectors, &Settings::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ExternalReference { failure: ReferenceFailure::NotFound, .. }
        ));
        assert_eq!(catalog.reported_errors().len(), 1);
        assert!(catalog.objects_of_type(TYPE_DETECTOR).is_empty());
    }

    #[test]
    fn layer_mismatch_is_refused() {
        let (mut catalog, _, section) = network();
        let other_layer = catalog.create_object(TYPE_LAYER, Some(OSM_LAYER_NAME), None);
        let mut detector = Detector::flow("pems_1", section);
        detector.section.layer_id = Some(other_layer);
        let detectors = Detectors { detectors: vec![detector] };
        assert!(matches!(
            import_detectors(&mut catalog, &detectors, &Settings::default()),
            Err(ConfigError::WrongType { .. })
        ));
        assert!(catalog.objects_of_type(TYPE_DETECTOR).is_empty());
    }

    #[test]
    fn misplaced_metering_leaves_no_object_behind() {
        let (mut catalog, layer, section) = network();
        let master = fixtures::master_control_plan(&mut catalog, layer, section);
        let mut metering = master.meterings[0].clone();
        metering.section.section_internal_id = Some(section + 100);
        assert!(create_metering(&mut catalog, &metering).is_err());
        assert!(catalog.objects_of_type(TYPE_METERING).is_empty());
    }

    #[test]
    fn speed_update_skips_unknown_sections() {
        let (mut catalog, _, section) = network();
        let sections = SectionSpeedLimitsAndCapacities {
            sections: vec![
                SectionSpeedLimitAndCapacity::new(section, 50.0, 1800.0),
                SectionSpeedLimitAndCapacity::new(section + 100, 30.0, 900.0),
            ],
        };
        assert_eq!(update_speed_and_capacity(&mut catalog, &sections).unwrap(), 1);
        assert_eq!(catalog.attribute(section, ATT_SPEED), Some(&AttributeValue::Float(50.0)));
    }

    #[test]
    fn centroids_and_matrices_are_linked() {
        let (mut catalog, _, section) = network();
        let mut configuration = CentroidConfiguration::default();
        let mut inside = CentroidConnection::new("c1", 1.0, 2.0, CentroidType::Internal);
        inside.to_section_internal_ids = Some(vec![section, 999]);
        configuration.centroids.push(inside);
        configuration
            .centroids
            .push(CentroidConnection::new("c2", 3.0, 4.0, CentroidType::External));
        import_centroid_configuration(&mut catalog, &configuration).unwrap();
        assert_eq!(catalog.reported_errors().len(), 1);

        let begin = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(14, 15, 0).unwrap();
        let mut matrix = OdMatrix::new(begin, end, VehicleTypeName::Resident);
        matrix.od_trips_count.push(OdTripsCount::new("c1", "c2", 12.0));
        let mut matrices = OdMatrices::new(CENTROID_CONFIG_EXTERNAL_ID);
        matrices.od_matrices.push(matrix);
        let ids = import_od_matrices(&mut catalog, &matrices).unwrap();

        let reader = catalog.find_by_internal_id(ids[0]).unwrap().reader();
        assert_eq!(reader.int(ATT_BEGIN).unwrap(), 14 * 3600);
        assert_eq!(reader.int(ATT_DURATION).unwrap(), 900);
        assert_eq!(reader.trips(ATT_TRIPS).unwrap().len(), 1);
        assert_eq!(catalog.find_by_external_id("Resident_14_00").len(), 1);

        // Importing the same matrix twice is refused.
        assert!(matches!(
            import_od_matrices(&mut catalog, &matrices),
            Err(ConfigError::DuplicateExternalId { .. })
        ));
    }

    #[test]
    fn master_control_plan_resolves_its_schedule() {
        let (mut catalog, _, section) = network();
        let node = catalog.create_object(TYPE_NODE, Some("Mission & Durham"), None);

        let mut placement = SectionObject::on_section("meter_on_1", section);
        placement.from_lane = Some(0);
        placement.to_lane = Some(0);
        placement.length = Some(2.0);
        placement.position = Some(100.0);
        let metering = Metering::new(placement, MeteringType::GreenTime);

        let mut plan = ControlPlan::new("am_peak");
        plan.control_junctions.push(ControlJunction {
            node_id: Some(node.to_string()),
            junction_type: Some(ControlJunctionType::FixedControl),
            cycle: Some(90.0),
            offset: Some(0.0),
            phases: Vec::new(),
            actuated: None,
        });
        plan.control_meterings.push(ControlMetering {
            control_metering_type: Some(ControlMeteringType::FixedControl),
            metering_external_id: Some("meter_on_1".to_string()),
        });
        let master = MasterControlPlan::from_schedule(
            vec![MasterControlPlanItem::new("am_peak", 0, 3600, 1)],
            &[plan],
            &[],
            &[metering],
        )
        .unwrap();

        let id = import_master_control_plan(&mut catalog, &master, &Settings::default()).unwrap();
        let schedule = catalog.find_by_internal_id(id).unwrap().reader();
        let items = schedule.records(ATT_SCHEDULE).unwrap();
        assert_eq!(items.len(), 1);
        let plan_id = AttributeReader::new("item", &items[0]).reference(ATT_CONTROL_PLAN).unwrap();
        assert_eq!(catalog.find_by_internal_id(plan_id).unwrap().external_id.as_deref(), Some("am_peak"));
        assert_eq!(catalog.attribute(node, ATT_YELLOW_BOX), Some(&AttributeValue::Bool(true)));
    }

    #[test]
    fn fixed_phases_keep_their_timing_and_signals() {
        let (mut catalog, _, _) = network();
        let node = catalog.create_object(TYPE_NODE, None, None);
        let record = junction_record(&mut catalog, "am_peak", &fixtures::fixed_junction(node)).unwrap();
        let junction = AttributeReader::new("junction", &record);
        assert_eq!(junction.int(ATT_JUNCTION_TYPE).unwrap(), ControlJunctionType::FixedControl.code());
        assert!(junction.optional(ATT_BARRIERS).is_none());

        let phases = junction.records(ATT_PHASES).unwrap();
        assert_eq!(phases.len(), 2);
        let green = AttributeReader::new("phase 0", &phases[0]);
        assert_eq!(green.float(ATT_FROM_TIME).unwrap(), 0.0);
        assert_eq!(green.float(ATT_DURATION).unwrap(), 45.0);
        assert!(!green.bool(ATT_INTERPHASE).unwrap());
        assert!(green.optional(ATT_DETECTORS).is_none());
        let signals = green.records(ATT_SIGNALS).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(AttributeReader::new("signal", &signals[0]).int(ATT_SIGNAL).unwrap(), 3);

        let second = AttributeReader::new("phase 1", &phases[1]);
        assert_eq!(second.float(ATT_FROM_TIME).unwrap(), 45.0);
        assert_eq!(second.float(ATT_DURATION).unwrap(), 45.0);
        assert!(second.records(ATT_SIGNALS).unwrap().is_empty());
    }

    #[test]
    fn actuated_phases_resolve_their_control_detectors() {
        let (mut catalog, layer, section) = network();
        let master = fixtures::master_control_plan(&mut catalog, layer, section);
        import_master_control_plan(&mut catalog, &master, &Settings::default()).unwrap();

        let plan = catalog.find_by_external_id("pm_peak")[0].reader();
        let junctions = plan.records(ATT_JUNCTIONS).unwrap();
        let junction = AttributeReader::new("junction", &junctions[0]);
        assert_eq!(junction.ints(ATT_BARRIERS).unwrap(), &[1, 2]);
        assert_eq!(junction.int(ATT_NUM_PHASES).unwrap(), 2);
        assert!(junction.bool(ATT_MATCHES_OFFSET_WITH_END_OF_PHASE).unwrap());
        assert_eq!(junction.float(ATT_YELLOW_TIME).unwrap(), 3.0);

        let phases = junction.records(ATT_PHASES).unwrap();
        assert_eq!(phases.len(), 2);
        let first = AttributeReader::new("phase 0", &phases[0]);
        assert_eq!(first.int(ATT_RECALL).unwrap(), ControlPhaseRecall::Min.code());
        assert_eq!(first.float(ATT_MAX_DURATION).unwrap(), 40.0);
        assert!(first.bool(ATT_IS_DEFAULT).unwrap());
        let detectors = first.records(ATT_DETECTORS).unwrap();
        let control = AttributeReader::new("control detector", &detectors[0]);
        let detector = catalog.find_by_internal_id(control.reference(ATT_DETECTOR).unwrap()).unwrap();
        assert_eq!(detector.external_id.as_deref(), Some("act_det_1"));
        assert_eq!(control.float(ATT_CALL_DELAY).unwrap(), 1.5);
        assert!(control.bool(ATT_PHASE_EXTENSION).unwrap());
    }

    #[test]
    fn actuated_phase_with_unknown_detector_is_refused() {
        let (mut catalog, _, _) = network();
        let node = catalog.create_object(TYPE_NODE, None, None);
        let junction = fixtures::actuated_junction(node, ["act_det_1", "act_det_2"]);
        assert!(matches!(
            junction_record(&mut catalog, "pm_peak", &junction),
            Err(ConfigError::ExternalReference { failure: ReferenceFailure::NotFound, .. })
        ));
    }

    #[test]
    fn strategy_import_defaults_missing_names() {
        let (mut catalog, _, section) = network();
        let other = catalog.create_object(TYPE_SECTION, Some("Durham Rd"), None);
        let mut policy = TrafficPolicy::new("Closures", "closures");
        policy
            .scenario_changes
            .push(TurningClosingChange::new("closing_1", section, other));
        let mut strategy = TrafficManagementStrategy::default();
        strategy.add_policy(policy).unwrap();

        let id = import_traffic_strategy(&mut catalog, &strategy).unwrap();
        let object = catalog.find_by_internal_id(id).unwrap();
        assert_eq!(object.name.as_deref(), Some(TRAFFIC_STRATEGY_EXTERNAL_ID));
        assert_eq!(catalog.objects_of_type(TYPE_TURNING_CLOSING_CHANGE).len(), 1);
        let change = catalog.find_by_external_id("closing_1")[0];
        assert_eq!(change.name.as_deref(), Some("closing_1"));
    }
}
