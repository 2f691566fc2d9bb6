// exporters.rs
//
// Reading configuration aggregates back out of the simulator catalog.

use log::{debug, info, warn};
use std::collections::BTreeSet;

use super::catalog::*;
use super::lookup::get_object_per_external_id;
use crate::config_files::{
    CentroidConfiguration, Detectors, MasterControlPlan, SectionSpeedLimitsAndCapacities, TrafficManagementStrategy,
};
use crate::error::{ConfigError, ConfigResult, ReferenceFailure};
use crate::global_variables::*;
use crate::models::enums::{
    CentroidType, ControlJunctionType, ControlMeteringType, ControlPhaseRecall, FlashingType, MeteringType,
    ScenarioChangeType,
};
use crate::models::{
    detector_external_id, metering_external_id, ActuatedJunctionSettings, ActuatedPhaseSettings, CentroidConnection,
    ControlDetector, ControlJunction, ControlMetering, ControlPhase, ControlPhaseSignal, ControlPlan, Detector,
    DetectorCapabilities, MasterControlPlanItem, Metering, ObjectIdentity, SectionObject, SectionSpeedLimitAndCapacity,
    TrafficPolicy, TurningClosingChange,
};

const SOURCE: &str = "export";

fn identity_of(object: &CatalogObject) -> ObjectIdentity {
    ObjectIdentity {
        name: object.name.clone(),
        external_id: object.external_id.clone(),
        internal_id: Some(object.id),
    }
}

fn object<'a, C>(catalog: &'a C, id: ObjectId) -> ConfigResult<&'a CatalogObject>
where
    C: SimulatorCatalog + ?Sized,
{
    catalog.find_by_internal_id(id).ok_or_else(|| ConfigError::ExternalReference {
        id: id.to_string(),
        failure: ReferenceFailure::NotFound,
    })
}

/// Report `result`'s error to the simulator before handing it back.
fn reported<C, T>(catalog: &mut C, result: ConfigResult<T>) -> ConfigResult<T>
where
    C: SimulatorCatalog + ?Sized,
{
    if let Err(err) = &result {
        catalog.report_error(SOURCE, &err.to_string());
    }
    result
}

pub fn export_centroid_configuration<C>(catalog: &mut C, external_id: &str) -> ConfigResult<CentroidConfiguration>
where
    C: SimulatorCatalog + ?Sized,
{
    let id = get_object_per_external_id(catalog, external_id, TYPE_CENTROID_CONFIGURATION)?;
    let configuration = read_centroid_configuration(&*catalog, id, external_id);
    let configuration = reported(catalog, configuration)?;
    info!(
        "Exported centroid configuration {external_id} with {} centroids",
        configuration.centroids.len()
    );
    Ok(configuration)
}

fn read_centroid_configuration<C>(catalog: &C, id: ObjectId, external_id: &str) -> ConfigResult<CentroidConfiguration>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut configuration = CentroidConfiguration::new(external_id);
    let centroid_ids = object(catalog, id)?
        .reader()
        .optional(ATT_CENTROIDS)
        .and_then(AttributeValue::as_references)
        .unwrap_or_default();
    for centroid_id in centroid_ids {
        let centroid = object(catalog, *centroid_id)?;
        let reader = centroid.reader();
        let kind = reader.text(ATT_CENTROID_TYPE)?;
        let centroid_type = CentroidType::parse(kind).ok_or_else(|| {
            ConfigError::wrong_type(reader.owner(), None, ATT_CENTROID_TYPE, format!("unknown centroid type `{kind}`"))
        })?;
        let sections = |attribute: &str| {
            reader
                .optional(attribute)
                .and_then(AttributeValue::as_references)
                .map(<[ObjectId]>::to_vec)
                .unwrap_or_default()
        };
        configuration.centroids.push(CentroidConnection {
            identity: identity_of(centroid),
            latitude: Some(reader.float(ATT_LATITUDE)?),
            longitude: Some(reader.float(ATT_LONGITUDE)?),
            centroid_type: Some(centroid_type),
            from_section_internal_ids: Some(sections(ATT_FROM_SECTIONS)),
            to_section_internal_ids: Some(sections(ATT_TO_SECTIONS)),
        });
    }
    Ok(configuration)
}

/// Sections without both a speed limit and a capacity are left out.
pub fn export_section_speed_limits_and_capacities<C>(catalog: &C) -> ConfigResult<SectionSpeedLimitsAndCapacities>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut exported = SectionSpeedLimitsAndCapacities::default();
    for section in catalog.objects_of_type(TYPE_SECTION) {
        let reader = section.reader();
        let (Some(speed), Some(capacity)) = (reader.optional(ATT_SPEED), reader.optional(ATT_CAPACITY)) else {
            debug!("Section {} has no speed limit or capacity", section.id);
            continue;
        };
        let (Some(speed), Some(capacity)) = (speed.as_float(), capacity.as_float()) else {
            return Err(ConfigError::wrong_type(reader.owner(), None, ATT_SPEED, "speed and capacity must be numbers"));
        };
        exported
            .sections
            .push(SectionSpeedLimitAndCapacity::new(section.id, speed, capacity));
    }
    info!("Exported speed limits and capacities of {} sections", exported.sections.len());
    Ok(exported)
}

fn read_section_object(object: &CatalogObject, external_id: String) -> ConfigResult<SectionObject> {
    let reader = object.reader();
    Ok(SectionObject {
        identity: ObjectIdentity {
            name: object.name.clone(),
            external_id: Some(external_id),
            internal_id: None,
        },
        layer_id: Some(reader.reference(ATT_LAYER)?),
        section_internal_id: Some(reader.reference(ATT_SECTION)?),
        from_lane: Some(reader.int(ATT_FROM_LANE)?),
        to_lane: Some(reader.int(ATT_TO_LANE)?),
        length: Some(reader.float(ATT_LENGTH)?),
        position: Some(reader.float(ATT_POSITION)?),
    })
}

fn read_capabilities(object: &CatalogObject) -> ConfigResult<DetectorCapabilities> {
    let reader = object.reader();
    let mut flags = [false; 7];
    for (flag, attribute) in flags.iter_mut().zip(DETECTION_FLAGS) {
        *flag = reader.bool(attribute)?;
    }
    let [count, density, equipped, headway, occupancy, presence, speed] = flags;
    Ok(DetectorCapabilities {
        detect_count: Some(count),
        detect_density: Some(density),
        detect_equipped_vehicles: Some(equipped),
        detect_headway: Some(headway),
        detect_occupancy: Some(occupancy),
        detect_presence: Some(presence),
        detect_speed: Some(speed),
        extended_length: Some(reader.float(ATT_EXTENDED_LENGTH)?),
        number_of_lanes: Some(reader.int(ATT_NUMBER_OF_LANES)?),
        offset: Some(reader.float(ATT_DETECTOR_OFFSET)?),
        position_from_end: Some(reader.float(ATT_POSITION_FROM_END)?),
    })
}

/// Every detector of the catalog as a measurement detector. External ids
/// are generated from the internal ids.
pub fn export_detectors<C>(catalog: &mut C) -> ConfigResult<Detectors>
where
    C: SimulatorCatalog + ?Sized,
{
    let detectors = read_detectors(&*catalog);
    let detectors = reported(catalog, detectors)?;
    info!("Exported {} detectors", detectors.detectors.len());
    Ok(detectors)
}

fn read_detectors<C>(catalog: &C) -> ConfigResult<Detectors>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut detectors = Detectors::default();
    for object in catalog.objects_of_type(TYPE_DETECTOR) {
        let section = read_section_object(object, detector_external_id(object.id))?;
        detectors.add_detector(Detector::measurement(section, read_capabilities(object)?))?;
    }
    Ok(detectors)
}

/// Every metering of the catalog. A metering without an external id gets
/// one derived from its section.
pub fn export_meterings<C>(catalog: &mut C) -> ConfigResult<Vec<Metering>>
where
    C: SimulatorCatalog + ?Sized,
{
    let meterings = read_meterings(&*catalog);
    let meterings = reported(catalog, meterings)?;
    info!("Exported {} meterings", meterings.len());
    Ok(meterings)
}

fn read_meterings<C>(catalog: &C) -> ConfigResult<Vec<Metering>>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut meterings: Vec<Metering> = Vec::new();
    for object in catalog.objects_of_type(TYPE_METERING) {
        let metering = read_metering(object)?;
        // Two meterings on one section would end up with the same generated id.
        if meterings.iter().any(|m| m.external_id() == metering.external_id()) {
            warn!("Metering {} duplicates external id {:?}, skipped", object.id, metering.external_id());
            continue;
        }
        meterings.push(metering);
    }
    Ok(meterings)
}

fn read_metering(object: &CatalogObject) -> ConfigResult<Metering> {
    let reader = object.reader();
    let external_id = match &object.external_id {
        Some(external_id) => external_id.clone(),
        None => metering_external_id(reader.reference(ATT_SECTION)?),
    };
    let code = reader.int(ATT_METERING_TYPE)?;
    let metering_type = MeteringType::from_code(code).ok_or_else(|| {
        ConfigError::wrong_type(reader.owner(), None, ATT_METERING_TYPE, format!("unknown metering type {code}"))
    })?;
    let mut metering = Metering::new(read_section_object(object, external_id)?, metering_type);
    if metering_type.regulates_flow() {
        metering.vehicle_flow = Some(reader.int(ATT_VEHICLE_FLOW)?);
    }
    Ok(metering)
}

/// The id of the one object of `type_name`. Zero or several are reported.
fn single_object_of_type<C>(catalog: &mut C, type_name: &str) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let ids: Vec<ObjectId> = catalog
        .objects_of_type(type_name)
        .iter()
        .map(|object| object.id)
        .collect();
    match ids.as_slice() {
        [id] => Ok(*id),
        others => {
            catalog.report_error(
                SOURCE,
                &format!("Expected exactly one {type_name} but found {}.", others.len()),
            );
            let failure = if others.is_empty() {
                ReferenceFailure::NotFound
            } else {
                ReferenceFailure::Ambiguous(others.len())
            };
            Err(ConfigError::ExternalReference {
                id: type_name.to_string(),
                failure,
            })
        }
    }
}

/// The one master control plan of the catalog, with every plan it schedules
/// and the detectors and meterings those plans drive.
pub fn export_master_control_plan<C>(catalog: &mut C) -> ConfigResult<MasterControlPlan>
where
    C: SimulatorCatalog + ?Sized,
{
    let id = single_object_of_type(catalog, TYPE_MASTER_CONTROL_PLAN)?;
    let mut skipped = Vec::new();
    let master = read_master_control_plan(&*catalog, id, &mut skipped);
    for message in &skipped {
        catalog.report_error(SOURCE, message);
    }
    let master = reported(catalog, master)?;
    info!(
        "Exported master control plan {} ({} plans, {} detectors, {} meterings)",
        master.identity,
        master.control_plans.len(),
        master.detectors.len(),
        master.meterings.len()
    );
    Ok(master)
}

fn read_master_control_plan<C>(catalog: &C, id: ObjectId, skipped: &mut Vec<String>) -> ConfigResult<MasterControlPlan>
where
    C: SimulatorCatalog + ?Sized,
{
    let object = object(catalog, id)?;
    let mut master = MasterControlPlan {
        identity: ObjectIdentity {
            internal_id: None,
            ..identity_of(object)
        },
        ..MasterControlPlan::default()
    };
    master.identity.resolve_name_and_external_id("master control plan")?;

    let schedule = object.reader();
    for item in schedule.records(ATT_SCHEDULE)? {
        let reader = AttributeReader::new(format!("{} schedule", schedule.owner()), item);
        let plan = self::object(catalog, reader.reference(ATT_CONTROL_PLAN)?)?;
        let plan_external_id = plan
            .external_id
            .clone()
            .ok_or_else(|| ConfigError::missing(format!("{} {}", plan.type_name, plan.id), "external_id"))?;
        let optional_int = |attribute: &str| reader.optional(attribute).and_then(AttributeValue::as_int);
        master.schedule.push(MasterControlPlanItem {
            control_plan_external_id: Some(plan_external_id.clone()),
            from_time: optional_int(ATT_FROM_TIME),
            duration: optional_int(ATT_DURATION),
            zone: optional_int(ATT_ZONE),
        });
        if master.control_plan(&plan_external_id).is_none() {
            let plan = read_control_plan(catalog, plan, &mut master, skipped)?;
            master.add_control_plan(plan)?;
        }
    }
    Ok(master)
}

fn read_control_plan<C>(
    catalog: &C,
    object: &CatalogObject,
    master: &mut MasterControlPlan,
    skipped: &mut Vec<String>,
) -> ConfigResult<ControlPlan>
where
    C: SimulatorCatalog + ?Sized,
{
    let reader = object.reader();
    let mut plan = ControlPlan {
        identity: ObjectIdentity {
            internal_id: None,
            ..identity_of(object)
        },
        offset: reader.optional(ATT_OFFSET).and_then(AttributeValue::as_int),
        ..ControlPlan::default()
    };

    let mut nodes = BTreeSet::new();
    for record in reader.optional(ATT_JUNCTIONS).and_then(AttributeValue::as_records).unwrap_or_default() {
        let junction = AttributeReader::new(format!("{} junction", reader.owner()), record);
        let node = junction.reference(ATT_NODE)?;
        if !nodes.insert(node) {
            return Err(ConfigError::DuplicateExternalId {
                owner: format!("control plan {}", plan.identity),
                external_id: node.to_string(),
            });
        }
        let code = junction.int(ATT_JUNCTION_TYPE)?;
        let junction_type = ControlJunctionType::from_code(code).ok_or_else(|| {
            ConfigError::wrong_type(junction.owner(), None, ATT_JUNCTION_TYPE, format!("unknown junction type {code}"))
        })?;
        let actuated = match junction_type {
            ControlJunctionType::FixedControl | ControlJunctionType::External => false,
            ControlJunctionType::Actuated => true,
            other => {
                skipped.push(format!(
                    "Junction {node} of control plan {} has type {other:?}, only fixed, external and actuated junctions are exported.",
                    plan.identity
                ));
                continue;
            }
        };

        let mut phases = Vec::new();
        for phase in junction.records(ATT_PHASES)? {
            let phase = AttributeReader::new(format!("{} phase", junction.owner()), phase);
            phases.push(read_phase(catalog, &phase, actuated, master)?);
        }
        let settings = if actuated {
            Some(ActuatedJunctionSettings {
                barriers: junction.optional(ATT_BARRIERS).and_then(AttributeValue::as_ints).map(<[i64]>::to_vec),
                num_phases: Some(
                    junction
                        .optional(ATT_NUM_PHASES)
                        .and_then(AttributeValue::as_int)
                        .unwrap_or(phases.len() as i64),
                ),
                rest_in_red: Some(junction.bool(ATT_REST_IN_RED)?),
                matches_offset_with_end_of_phase: Some(junction.bool(ATT_MATCHES_OFFSET_WITH_END_OF_PHASE)?),
                yellow_time: Some(junction.float(ATT_YELLOW_TIME)?),
                single_entry: Some(junction.bool(ATT_SINGLE_ENTRY)?),
            })
        } else {
            None
        };
        plan.control_junctions.push(ControlJunction {
            node_id: Some(node.to_string()),
            junction_type: Some(junction_type),
            cycle: Some(junction.float(ATT_CYCLE)?),
            offset: Some(junction.float(ATT_OFFSET)?),
            phases,
            actuated: settings,
        });
    }

    for record in reader.optional(ATT_METERINGS).and_then(AttributeValue::as_records).unwrap_or_default() {
        let control = AttributeReader::new(format!("{} metering", reader.owner()), record);
        let metering = read_metering(self::object(catalog, control.reference(ATT_METERING)?)?)?;
        let code = control.int(ATT_CONTROL_METERING_TYPE)?;
        let control_metering_type = ControlMeteringType::from_code(code).ok_or_else(|| {
            ConfigError::wrong_type(
                control.owner(),
                None,
                ATT_CONTROL_METERING_TYPE,
                format!("unknown metering control type {code}"),
            )
        })?;
        plan.control_meterings.push(ControlMetering {
            control_metering_type: Some(control_metering_type),
            metering_external_id: metering.external_id().map(str::to_string),
        });
        master.add_metering(metering)?;
    }
    Ok(plan)
}

fn read_phase<C>(
    catalog: &C,
    phase: &AttributeReader<'_>,
    actuated: bool,
    master: &mut MasterControlPlan,
) -> ConfigResult<ControlPhase>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut signals = Vec::new();
    for signal in phase.records(ATT_SIGNALS)? {
        let signal = AttributeReader::new(format!("{} signal", phase.owner()), signal);
        let code = signal.int(ATT_FLASHING_TYPE)?;
        signals.push(ControlPhaseSignal {
            signal: Some(signal.int(ATT_SIGNAL)?),
            name: Some(signal.text(ATT_NAME)?.to_string()),
            flashing_type: Some(FlashingType::from_code(code).ok_or_else(|| {
                ConfigError::wrong_type(signal.owner(), None, ATT_FLASHING_TYPE, format!("unknown flashing type {code}"))
            })?),
        });
    }
    let mut read = ControlPhase {
        from_time: Some(phase.float(ATT_FROM_TIME)?),
        duration: Some(phase.float(ATT_DURATION)?),
        interphase: Some(phase.bool(ATT_INTERPHASE)?),
        signals,
        actuated: None,
    };
    if actuated {
        read.actuated = Some(read_actuated_phase(catalog, phase, master)?);
    }
    Ok(read)
}

fn read_actuated_phase<C>(
    catalog: &C,
    phase: &AttributeReader<'_>,
    master: &mut MasterControlPlan,
) -> ConfigResult<ActuatedPhaseSettings>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut detectors = Vec::new();
    for record in phase.records(ATT_DETECTORS)? {
        let control = AttributeReader::new(format!("{} detector", phase.owner()), record);
        let object = self::object(catalog, control.reference(ATT_DETECTOR)?)?;
        let external_id = object
            .external_id
            .clone()
            .unwrap_or_else(|| detector_external_id(object.id));
        let section = read_section_object(object, external_id.clone())?;
        master.add_detector(Detector::measurement(section, read_capabilities(object)?))?;
        detectors.push(ControlDetector {
            detector_external_id: Some(external_id),
            locking: Some(control.bool(ATT_LOCKING)?),
            call_delay: Some(control.float(ATT_CALL_DELAY)?),
            phase_activation: Some(control.bool(ATT_PHASE_ACTIVATION)?),
            phase_extension: Some(control.bool(ATT_PHASE_EXTENSION)?),
        });
    }
    let code = phase.int(ATT_RECALL)?;
    let recall = ControlPhaseRecall::from_code(code).ok_or_else(|| {
        ConfigError::wrong_type(phase.owner(), None, ATT_RECALL, format!("unknown recall {code}"))
    })?;
    Ok(ActuatedPhaseSettings {
        id_ring: Some(phase.int(ATT_ID_RING)?),
        recall: Some(recall),
        is_default: Some(phase.bool(ATT_IS_DEFAULT)?),
        min_duration: Some(phase.float(ATT_MIN_DURATION)?),
        max_duration: Some(phase.float(ATT_MAX_DURATION)?),
        passage_time: Some(phase.float(ATT_PASSAGE_TIME)?),
        permissive_period_from: Some(phase.float(ATT_PERMISSIVE_PERIOD_FROM)?),
        permissive_period_to: Some(phase.float(ATT_PERMISSIVE_PERIOD_TO)?),
        force_off: Some(phase.float(ATT_FORCE_OFF)?),
        hold: Some(phase.bool(ATT_HOLD)?),
        maximum_initial: Some(phase.float(ATT_MAXIMUM_INITIAL)?),
        seconds_actuation: Some(phase.float(ATT_SECONDS_ACTUATION)?),
        gap_reduction: Some(phase.bool(ATT_GAP_REDUCTION)?),
        minimum_gap: Some(phase.float(ATT_MINIMUM_GAP)?),
        time_before_reduce: Some(phase.float(ATT_TIME_BEFORE_REDUCE)?),
        time_to_reduce: Some(phase.float(ATT_TIME_TO_REDUCE)?),
        detectors,
    })
}

/// The one strategy of the catalog with its policies and turning closings.
pub fn export_traffic_strategy<C>(catalog: &mut C) -> ConfigResult<TrafficManagementStrategy>
where
    C: SimulatorCatalog + ?Sized,
{
    let id = single_object_of_type(catalog, TYPE_STRATEGY)?;
    let strategy = read_strategy(&*catalog, id);
    let strategy = reported(catalog, strategy)?;
    info!("Exported strategy {} with {} policies", strategy.identity, strategy.policies.len());
    Ok(strategy)
}

fn read_strategy<C>(catalog: &C, id: ObjectId) -> ConfigResult<TrafficManagementStrategy>
where
    C: SimulatorCatalog + ?Sized,
{
    let object = object(catalog, id)?;
    let mut strategy = TrafficManagementStrategy {
        identity: ObjectIdentity {
            internal_id: None,
            ..identity_of(object)
        },
        policies: Vec::new(),
    };
    if strategy.identity.name.is_none() && strategy.identity.external_id.is_none() {
        warn!("Strategy {id} has neither a name nor an external id, using `{TRAFFIC_STRATEGY_EXTERNAL_ID}`");
        strategy.identity.external_id = Some(TRAFFIC_STRATEGY_EXTERNAL_ID.to_string());
    }

    let policy_ids = object
        .reader()
        .optional(ATT_POLICIES)
        .and_then(AttributeValue::as_references)
        .unwrap_or_default();
    for policy_id in policy_ids {
        let policy_object = self::object(catalog, *policy_id)?;
        let mut policy = TrafficPolicy {
            identity: ObjectIdentity {
                internal_id: None,
                ..identity_of(policy_object)
            },
            scenario_changes: Vec::new(),
        };
        let change_ids = policy_object
            .reader()
            .optional(ATT_CHANGES)
            .and_then(AttributeValue::as_references)
            .unwrap_or_default();
        for change_id in change_ids {
            policy.scenario_changes.push(read_turning_closing_change(self::object(catalog, *change_id)?)?);
        }
        strategy.add_policy(policy)?;
    }
    strategy.resolve_identities()?;
    Ok(strategy)
}

fn read_turning_closing_change(object: &CatalogObject) -> ConfigResult<TurningClosingChange> {
    let reader = object.reader();
    let code = reader.int(ATT_CHANGE_TYPE)?;
    let change_type = ScenarioChangeType::from_code(code);
    if object.type_name != TYPE_TURNING_CLOSING_CHANGE || change_type != Some(ScenarioChangeType::TurningRestriction) {
        return Err(ConfigError::wrong_type(
            reader.owner(),
            None,
            "scenario_change_type",
            format!("change type {code} is not a turning restriction"),
        ));
    }
    Ok(TurningClosingChange {
        identity: ObjectIdentity {
            internal_id: None,
            ..identity_of(object)
        },
        from_section_internal_id: Some(reader.reference(ATT_FROM_SECTION)?),
        to_section_internal_id: Some(reader.reference(ATT_TO_SECTION)?),
        scenario_change_type: change_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::fixtures::{self, network};
    use crate::adapter::importers::{
        import_centroid_configuration, import_master_control_plan, import_traffic_strategy, update_speed_and_capacity,
    };
    use crate::adapter::InMemoryCatalog;
    use crate::settings::Settings;
    use crate::config_files::ConfigFile;

    fn catalog_with_section() -> (InMemoryCatalog, ObjectId, ObjectId) {
        let mut catalog = InMemoryCatalog::new();
        let layer = catalog.create_object(TYPE_LAYER, Some(NETWORK_LAYER_NAME), None);
        let section = catalog.create_object(TYPE_SECTION, None, None);
        catalog.set_attribute(section, ATT_LAYER, AttributeValue::Reference(layer)).unwrap();
        (catalog, layer, section)
    }

    fn add_detector(catalog: &mut InMemoryCatalog, section: ObjectId, layer: Option<ObjectId>) -> ObjectId {
        let id = catalog.create_object(TYPE_DETECTOR, Some("loop"), None);
        catalog.set_attribute(id, ATT_SECTION, AttributeValue::Reference(section)).unwrap();
        if let Some(layer) = layer {
            catalog.set_attribute(id, ATT_LAYER, AttributeValue::Reference(layer)).unwrap();
        }
        catalog.set_attribute(id, ATT_FROM_LANE, 0i64.into()).unwrap();
        catalog.set_attribute(id, ATT_TO_LANE, 1i64.into()).unwrap();
        catalog.set_attribute(id, ATT_LENGTH, 2.0.into()).unwrap();
        catalog.set_attribute(id, ATT_POSITION, 30.0.into()).unwrap();
        for flag in DETECTION_FLAGS {
            catalog.set_attribute(id, flag, true.into()).unwrap();
        }
        catalog.set_attribute(id, ATT_EXTENDED_LENGTH, 0.0.into()).unwrap();
        catalog.set_attribute(id, ATT_NUMBER_OF_LANES, 2i64.into()).unwrap();
        catalog.set_attribute(id, ATT_DETECTOR_OFFSET, 0.0.into()).unwrap();
        catalog.set_attribute(id, ATT_POSITION_FROM_END, 10.0.into()).unwrap();
        id
    }

    #[test]
    fn detectors_are_exported_with_generated_ids() {
        let (mut catalog, layer, section) = catalog_with_section();
        let id = add_detector(&mut catalog, section, Some(layer));
        let detectors = export_detectors(&mut catalog).unwrap();
        let detector = detectors.detector(&detector_external_id(id)).unwrap();
        assert_eq!(detector.section.section_internal_id, Some(section));
        assert_eq!(detector.capabilities.as_ref().unwrap().number_of_lanes, Some(2));
        detectors.validate().unwrap();
    }

    #[test]
    fn detector_without_layer_is_reported() {
        let (mut catalog, _, section) = catalog_with_section();
        add_detector(&mut catalog, section, None);
        assert!(matches!(export_detectors(&mut catalog), Err(ConfigError::MissingAttribute { .. })));
        assert_eq!(catalog.reported_errors().len(), 1);
    }

    #[test]
    fn meterings_without_external_id_are_named_after_their_section() {
        let (mut catalog, layer, section) = catalog_with_section();
        let id = catalog.create_object(TYPE_METERING, None, None);
        catalog.set_attribute(id, ATT_SECTION, AttributeValue::Reference(section)).unwrap();
        catalog.set_attribute(id, ATT_LAYER, AttributeValue::Reference(layer)).unwrap();
        catalog.set_attribute(id, ATT_FROM_LANE, 0i64.into()).unwrap();
        catalog.set_attribute(id, ATT_TO_LANE, 0i64.into()).unwrap();
        catalog.set_attribute(id, ATT_LENGTH, 2.0.into()).unwrap();
        catalog.set_attribute(id, ATT_POSITION, 5.0.into()).unwrap();
        catalog.set_attribute(id, ATT_METERING_TYPE, MeteringType::Flow.code().into()).unwrap();
        catalog.set_attribute(id, ATT_VEHICLE_FLOW, 900i64.into()).unwrap();

        let meterings = export_meterings(&mut catalog).unwrap();
        assert_eq!(meterings.len(), 1);
        assert_eq!(meterings[0].external_id(), Some(metering_external_id(section).as_str()));
        assert_eq!(meterings[0].vehicle_flow, Some(900));
    }

    #[test]
    fn centroid_configuration_survives_a_catalog_round_trip() {
        let (mut catalog, _, section) = catalog_with_section();
        let mut configuration = CentroidConfiguration::default();
        let mut connection = CentroidConnection::new("cc_1", 10.0, 20.0, CentroidType::External);
        connection.from_section_internal_ids = Some(vec![section]);
        configuration.centroids.push(connection);
        import_centroid_configuration(&mut catalog, &configuration).unwrap();

        let exported = export_centroid_configuration(&mut catalog, CENTROID_CONFIG_EXTERNAL_ID).unwrap();
        let centroid = exported.centroid("cc_1").unwrap();
        assert_eq!(centroid.from_section_internal_ids, Some(vec![section]));
        assert_eq!(centroid.centroid_type, Some(CentroidType::External));
        assert_eq!(centroid.latitude, Some(10.0));
    }

    #[test]
    fn speed_limits_round_trip_through_the_catalog() {
        let (mut catalog, _, section) = catalog_with_section();
        let sections = SectionSpeedLimitsAndCapacities {
            sections: vec![SectionSpeedLimitAndCapacity::new(section, 65.0, 2000.0)],
        };
        update_speed_and_capacity(&mut catalog, &sections).unwrap();
        assert_eq!(export_section_speed_limits_and_capacities(&catalog).unwrap(), sections);
    }

    #[test]
    fn strategy_export_needs_exactly_one_strategy() {
        let (mut catalog, _, _) = catalog_with_section();
        assert!(matches!(
            export_traffic_strategy(&mut catalog),
            Err(ConfigError::ExternalReference { failure: ReferenceFailure::NotFound, .. })
        ));
        catalog.create_object(TYPE_STRATEGY, Some("a"), None);
        catalog.create_object(TYPE_STRATEGY, Some("b"), None);
        assert!(matches!(
            export_traffic_strategy(&mut catalog),
            Err(ConfigError::ExternalReference { failure: ReferenceFailure::Ambiguous(2), .. })
        ));
    }

    #[test]
    fn imported_strategy_is_exported_unchanged() {
        let (mut catalog, _, section) = catalog_with_section();
        let other = catalog.create_object(TYPE_SECTION, None, None);
        let mut policy = TrafficPolicy::new("Closures", "closures");
        let mut change = TurningClosingChange::new("closing_1", section, other);
        change.identity.name = Some("Closing 1".to_string());
        policy.scenario_changes.push(change);
        let mut strategy = TrafficManagementStrategy::new("Calming", "calming");
        strategy.add_policy(policy).unwrap();

        import_traffic_strategy(&mut catalog, &strategy).unwrap();
        assert_eq!(export_traffic_strategy(&mut catalog).unwrap(), strategy);
    }

    #[test]
    fn imported_master_control_plan_is_exported_unchanged() {
        let (mut catalog, layer, section) = network();
        let master = fixtures::master_control_plan(&mut catalog, layer, section);
        import_master_control_plan(&mut catalog, &master, &Settings::default()).unwrap();

        let exported = export_master_control_plan(&mut catalog).unwrap();
        assert_eq!(exported, master);
        assert!(catalog.reported_errors().is_empty());
    }

    #[test]
    fn master_control_plan_name_defaults_from_its_external_id() {
        let (mut catalog, layer, section) = network();
        let mut master = fixtures::master_control_plan(&mut catalog, layer, section);
        import_master_control_plan(&mut catalog, &master, &Settings::default()).unwrap();
        let id = catalog.objects_of_type(TYPE_MASTER_CONTROL_PLAN)[0].id;
        let object = catalog.find_by_internal_id(id).unwrap().clone();
        catalog.delete_object(id).unwrap();
        catalog.flush_commands();
        let copy = catalog.create_object(TYPE_MASTER_CONTROL_PLAN, None, object.external_id.as_deref());
        for (attribute, value) in object.attributes {
            catalog.set_attribute(copy, &attribute, value).unwrap();
        }

        master.identity.name = master.identity.external_id.clone();
        assert_eq!(export_master_control_plan(&mut catalog).unwrap(), master);
    }

    #[test]
    fn master_control_plan_export_needs_exactly_one_plan() {
        let (mut catalog, _, _) = network();
        assert!(matches!(
            export_master_control_plan(&mut catalog),
            Err(ConfigError::ExternalReference { failure: ReferenceFailure::NotFound, .. })
        ));
        assert_eq!(catalog.reported_errors().len(), 1);
    }

    #[test]
    fn uncontrolled_junctions_are_reported_and_left_out() {
        let (mut catalog, layer, section) = network();
        let mut master = fixtures::master_control_plan(&mut catalog, layer, section);
        let node = catalog.create_object(TYPE_NODE, Some("Mission & Grimmer"), None);
        let mut uncontrolled = fixtures::fixed_junction(node);
        uncontrolled.junction_type = Some(ControlJunctionType::Uncontrolled);
        master.control_plans[0].control_junctions.push(uncontrolled);
        import_master_control_plan(&mut catalog, &master, &Settings::default()).unwrap();

        let exported = export_master_control_plan(&mut catalog).unwrap();
        master.control_plans[0].control_junctions.pop();
        assert_eq!(exported, master);
        assert_eq!(catalog.reported_errors().len(), 1);
    }

    #[test]
    fn node_controlled_twice_by_one_plan_is_refused() {
        let (mut catalog, layer, section) = network();
        let mut master = fixtures::master_control_plan(&mut catalog, layer, section);
        let junction = master.control_plans[0].control_junctions[0].clone();
        master.control_plans[0].control_junctions.push(junction);
        import_master_control_plan(&mut catalog, &master, &Settings::default()).unwrap();

        assert!(matches!(
            export_master_control_plan(&mut catalog),
            Err(ConfigError::DuplicateExternalId { .. })
        ));
        assert_eq!(catalog.reported_errors().len(), 1);
    }
}
