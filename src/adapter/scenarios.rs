// scenarios.rs
//
// Demands, real data sets and the scenarios that run them. A scenario links
// objects that must already be in the catalog: the master control plan, the
// traffic demand, the real data set and the traffic strategies.

use chrono::Timelike;
use log::{info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::catalog::*;
use super::importers::{insert_optional, refuse_existing, set_optional};
use super::lookup::get_object_per_external_id;
use crate::config_files::{ConfigFile, FlowRealDataSet, StaticMacroScenarios, TrafficDemands};
use crate::error::{ConfigError, ConfigResult};
use crate::global_variables::*;
use crate::models::enums::CentroidType;
use crate::models::{
    DataBaseInfo, Detector, FlowRealData, MicroExperiment, ObjectIdentity, Scenario, ScenarioInputData,
    ScenarioLinks, ScheduleDemandItem, StaticMacroExperiment, StaticMacroScenario, TrafficDemand,
};
use crate::validation::required_fields;

const SOURCE: &str = "scenario";

type Attributes = Vec<(&'static str, AttributeValue)>;

fn set_all<C>(catalog: &mut C, id: ObjectId, attributes: Attributes) -> ConfigResult<()>
where
    C: SimulatorCatalog + ?Sized,
{
    for (attribute, value) in attributes {
        catalog.set_attribute(id, attribute, value)?;
    }
    Ok(())
}

/// Create one `GKTrafficDemand` per demand. Each schedule item runs its OD
/// matrix over the matrix's own time window.
pub fn import_traffic_demands<C>(catalog: &mut C, demands: &TrafficDemands) -> ConfigResult<Vec<ObjectId>>
where
    C: SimulatorCatalog + ?Sized,
{
    demands.validate()?;
    let mut created = Vec::with_capacity(demands.traffic_demands.len());
    for demand in &demands.traffic_demands {
        let external_id = demand.identity.external_id().unwrap_or_default();
        refuse_existing(catalog, external_id)?;

        let mut schedule = Vec::with_capacity(demand.demand_items.len());
        for item in &demand.demand_items {
            let matrix_external_id = item.demand_external_id.as_deref().unwrap_or_default();
            let matrix = get_object_per_external_id(catalog, matrix_external_id, TYPE_OD_MATRIX)?;
            let (begin, duration) = {
                let reader = catalog
                    .find_by_internal_id(matrix)
                    .ok_or_else(|| ConfigError::missing(format!("{TYPE_OD_MATRIX} {matrix}"), ATT_BEGIN))?
                    .reader();
                (reader.int(ATT_BEGIN)?, reader.int(ATT_DURATION)?)
            };
            let mut record = Record::new();
            record.insert(ATT_OD_MATRIX.to_string(), AttributeValue::Reference(matrix));
            record.insert(ATT_FROM_TIME.to_string(), begin.into());
            record.insert(ATT_DURATION.to_string(), duration.into());
            insert_optional(&mut record, ATT_FACTOR, item.demand_factor.as_deref());
            schedule.push(record);
        }

        let id = catalog.create_object(
            TYPE_TRAFFIC_DEMAND,
            demand.identity.name().or(Some(external_id)),
            Some(external_id),
        );
        catalog.set_attribute(id, ATT_SCHEDULE, AttributeValue::Records(schedule))?;
        created.push(id);
    }
    info!("Imported {} traffic demands", created.len());
    Ok(created)
}

/// The demand with this external id, its items naming their OD matrices.
pub fn export_traffic_demand<C>(catalog: &mut C, external_id: &str) -> ConfigResult<TrafficDemand>
where
    C: SimulatorCatalog + ?Sized,
{
    let id = get_object_per_external_id(catalog, external_id, TYPE_TRAFFIC_DEMAND)?;
    let demand = read_traffic_demand(&*catalog, id);
    if let Err(err) = &demand {
        catalog.report_error(SOURCE, &err.to_string());
    }
    let demand = demand?;
    info!("Exported traffic demand {} with {} items", demand.identity, demand.demand_items.len());
    Ok(demand)
}

fn read_traffic_demand<C>(catalog: &C, id: ObjectId) -> ConfigResult<TrafficDemand>
where
    C: SimulatorCatalog + ?Sized,
{
    let object = catalog
        .find_by_internal_id(id)
        .ok_or_else(|| ConfigError::missing(format!("{TYPE_TRAFFIC_DEMAND} {id}"), ATT_SCHEDULE))?;
    let reader = object.reader();
    let mut demand = TrafficDemand {
        identity: ObjectIdentity {
            name: object.name.clone(),
            external_id: object.external_id.clone(),
            internal_id: None,
        },
        demand_items: Vec::new(),
    };
    for record in reader.records(ATT_SCHEDULE)? {
        let item = AttributeReader::new(format!("{} schedule", reader.owner()), record);
        let matrix = item.reference(ATT_OD_MATRIX)?;
        let matrix = catalog
            .find_by_internal_id(matrix)
            .ok_or_else(|| ConfigError::missing(item.owner(), ATT_OD_MATRIX))?;
        demand.demand_items.push(ScheduleDemandItem {
            demand_external_id: matrix.external_id.clone(),
            demand_factor: item.optional(ATT_FACTOR).and_then(AttributeValue::as_text).map(str::to_string),
        });
    }
    Ok(demand)
}

/// Create the `GKRealDataSet` reading the counts CSV from `csv_directory`.
/// The CSV must have been written with `export_to_real_data_set_csv`.
pub fn import_flow_real_data_set<C>(catalog: &mut C, data_set: &FlowRealDataSet, csv_directory: &Path) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    const OWNER: &str = "flow real data set";
    data_set.validate()?;
    let external_id = data_set.external_id.as_deref().unwrap_or(REAL_DATA_SET_EXTERNAL_ID);
    let filename = data_set
        .filename
        .as_deref()
        .ok_or_else(|| ConfigError::missing(OWNER, "filename"))?;
    let lines_to_skip = data_set
        .line_to_skip
        .ok_or_else(|| ConfigError::missing(OWNER, "line_to_skip"))?;
    refuse_existing(catalog, external_id)?;

    let mut detectors = Vec::with_capacity(data_set.flow_data_set.len());
    for data in &data_set.flow_data_set {
        let detector = data.detector.external_id().unwrap_or_default();
        detectors.push(get_object_per_external_id(catalog, detector, TYPE_DETECTOR)?);
    }

    let path = csv_directory.join(filename);
    let id = catalog.create_object(TYPE_REAL_DATA_SET, Some(external_id), Some(external_id));
    catalog.set_attribute(id, ATT_FILENAME, AttributeValue::Text(path.display().to_string()))?;
    catalog.set_attribute(id, ATT_LINES_TO_SKIP, i64::from(lines_to_skip).into())?;
    catalog.set_attribute(id, ATT_SEPARATOR, AttributeValue::Text(char::from(CSV_SEPARATOR).to_string()))?;
    catalog.set_attribute(id, ATT_DETECTORS, detectors.into())?;
    info!("Imported real data set {external_id} reading {}", path.display());
    Ok(id)
}

/// Read the counts of a real data set back from its CSV file.
pub fn restore_real_data_set<C>(catalog: &mut C, external_id: &str) -> ConfigResult<FlowRealDataSet>
where
    C: SimulatorCatalog + ?Sized,
{
    let id = get_object_per_external_id(catalog, external_id, TYPE_REAL_DATA_SET)?;
    let (path, lines_to_skip, separator) = {
        let object = catalog
            .find_by_internal_id(id)
            .ok_or_else(|| ConfigError::missing(format!("{TYPE_REAL_DATA_SET} {id}"), ATT_FILENAME))?;
        let reader = object.reader();
        let separator = reader.text(ATT_SEPARATOR)?.bytes().next().unwrap_or(CSV_SEPARATOR);
        (reader.text(ATT_FILENAME)?.to_string(), reader.int(ATT_LINES_TO_SKIP)?, separator)
    };
    let path = Path::new(&path);
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(false)
        .from_path(path)?;
    let mut counts: Vec<(String, BTreeMap<u32, f64>)> = Vec::new();
    let skip = usize::try_from(lines_to_skip).unwrap_or_default();
    for row in rdr.deserialize::<(String, f64, u32)>().skip(skip) {
        let (detector, count, seconds) = row?;
        match counts.iter_mut().find(|(known, _)| *known == detector) {
            Some((_, flow_data)) => {
                flow_data.insert(seconds, count);
            }
            None => counts.push((detector, BTreeMap::from([(seconds, count)]))),
        }
    }

    let mut data_set = FlowRealDataSet::new(external_id);
    for (detector, flow_data) in counts {
        let detector_id = get_object_per_external_id(catalog, &detector, TYPE_DETECTOR)?;
        let section = catalog
            .attribute(detector_id, ATT_SECTION)
            .and_then(AttributeValue::as_reference)
            .ok_or_else(|| ConfigError::missing(format!("{TYPE_DETECTOR} {detector_id}"), ATT_SECTION))?;
        data_set.flow_data_set.push(FlowRealData {
            detector: Detector::flow(detector, section),
            flow_data,
        });
    }
    data_set.filename = path.file_name().map(|name| name.to_string_lossy().into_owned());
    data_set.line_to_skip = u32::try_from(lines_to_skip).ok();
    Ok(data_set)
}

/// Resolve the real data set a scenario uses and restore its counts. A
/// data set that cannot be restored is reported but still returned.
pub fn get_and_restore_real_dataset<C>(catalog: &mut C, external_id: &str) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let id = get_object_per_external_id(catalog, external_id, TYPE_REAL_DATA_SET)?;
    match restore_real_data_set(catalog, external_id) {
        Ok(data_set) => info!(
            "Restored real data set {external_id} ({} detectors)",
            data_set.flow_data_set.len()
        ),
        Err(err) => catalog.report_error(SOURCE, &format!("The real data set {external_id} cannot be restored: {err}")),
    }
    Ok(id)
}

/// Catalog objects a scenario links to.
struct LinkedObjects {
    master_control_plan: ObjectId,
    traffic_demand: ObjectId,
    real_data_set: ObjectId,
    strategies: Vec<ObjectId>,
}

impl LinkedObjects {
    fn resolve<C>(catalog: &mut C, links: &ScenarioLinks) -> ConfigResult<Self>
    where
        C: SimulatorCatalog + ?Sized,
    {
        let required = |field: &'static str, value: &Option<String>| -> ConfigResult<String> {
            value.clone().ok_or_else(|| ConfigError::missing("scenario links", field))
        };
        let master_control_plan = required("master_control_plan_external_id", &links.master_control_plan_external_id)?;
        let traffic_demand = required("traffic_demand_external_id", &links.traffic_demand_external_id)?;
        let real_data_set = required("real_dataset_external_id", &links.real_dataset_external_id)?;

        let master_control_plan = get_object_per_external_id(catalog, &master_control_plan, TYPE_MASTER_CONTROL_PLAN)?;
        let traffic_demand = get_object_per_external_id(catalog, &traffic_demand, TYPE_TRAFFIC_DEMAND)?;
        let real_data_set = get_and_restore_real_dataset(catalog, &real_data_set)?;
        let mut strategies = Vec::new();
        for external_id in links.traffic_strategy_external_ids.iter().flatten() {
            match get_object_per_external_id(catalog, external_id, TYPE_STRATEGY) {
                Ok(id) => strategies.push(id),
                Err(err) => warn!("Strategy {external_id} left out of the scenario: {err}"),
            }
        }
        Ok(Self {
            master_control_plan,
            traffic_demand,
            real_data_set,
            strategies,
        })
    }

    fn attributes(&self, links: &ScenarioLinks) -> Attributes {
        let mut attributes = vec![
            (ATT_MASTER_CONTROL_PLAN, AttributeValue::Reference(self.master_control_plan)),
            (ATT_DEMAND, AttributeValue::Reference(self.traffic_demand)),
            (ATT_REAL_DATA_SET, AttributeValue::Reference(self.real_data_set)),
            (ATT_STRATEGIES, self.strategies.clone().into()),
        ];
        if let Some(date) = links.begin_date {
            attributes.push((ATT_DATE, AttributeValue::Text(date.format("%Y-%m-%d").to_string())));
        }
        attributes
    }

    /// Policies of every linked strategy, activated by the experiment.
    fn policies<C>(&self, catalog: &C) -> Vec<ObjectId>
    where
        C: SimulatorCatalog + ?Sized,
    {
        self.strategies
            .iter()
            .filter_map(|strategy| catalog.attribute(*strategy, ATT_POLICIES))
            .filter_map(AttributeValue::as_references)
            .flatten()
            .copied()
            .collect()
    }
}

/// Output database of a scenario, relative to `output_directory`. An
/// existing SQLite database must be empty.
fn database_attributes<C>(catalog: &mut C, info: Option<&DataBaseInfo>, output_directory: &Path) -> ConfigResult<Attributes>
where
    C: SimulatorCatalog + ?Sized,
{
    let info = info.ok_or_else(|| ConfigError::missing("scenario links", "database_info"))?;
    let database_path = info
        .database_path
        .as_deref()
        .ok_or_else(|| ConfigError::missing("database info", "database_path"))?;
    let driver = info.database_driver_name.as_deref().unwrap_or(DATABASE_DRIVER_NAME);
    let path = output_directory.join(database_path);
    let in_use = fs::metadata(&path).map(|metadata| metadata.len() > 0).unwrap_or(false);
    if driver == DATABASE_DRIVER_NAME && in_use {
        catalog.report_error(SOURCE, "Database is not empty.");
        return Err(ConfigError::DatabaseNotEmpty(path));
    }

    let mut attributes = vec![
        (ATT_DRIVER_NAME, AttributeValue::from(driver)),
        (ATT_DATABASE_NAME, AttributeValue::Text(path.display().to_string())),
    ];
    for (attribute, flag) in [
        (ATT_USE_PROJECT_DB, info.use_project_db),
        (ATT_AUTOMATIC, info.automatic),
        (ATT_AUTOMATICALLY_CREATED, info.automatically_created),
    ] {
        if let Some(flag) = flag {
            attributes.push((attribute, flag.into()));
        }
    }
    Ok(attributes)
}

fn trajectory_record(origin: ObjectId, destination: ObjectId, percentage: f64) -> Record {
    let mut record = Record::new();
    record.insert(ATT_ORIGIN.to_string(), AttributeValue::Reference(origin));
    record.insert(ATT_DESTINATION.to_string(), AttributeValue::Reference(destination));
    record.insert(ATT_PERCENTAGE.to_string(), percentage.into());
    record
}

/// A condition for every ordered pair of centroids. Only trips between two
/// external centroids are sampled.
fn default_trajectory_conditions<C>(catalog: &C) -> Vec<Record>
where
    C: SimulatorCatalog + ?Sized,
{
    let centroids: Vec<(ObjectId, bool)> = catalog
        .objects_of_type(TYPE_CENTROID)
        .iter()
        .map(|centroid| {
            let kind = centroid.reader().optional(ATT_CENTROID_TYPE).and_then(AttributeValue::as_text);
            (centroid.id, kind == Some(CentroidType::External.as_str()))
        })
        .collect();
    let mut conditions = Vec::with_capacity(centroids.len() * centroids.len());
    for (origin, origin_external) in &centroids {
        for (destination, destination_external) in &centroids {
            let percentage = if *origin_external && *destination_external {
                EXTERNAL_TRAJECTORY_PERCENTAGE
            } else {
                0.0
            };
            conditions.push(trajectory_record(*origin, *destination, percentage));
        }
    }
    conditions
}

fn input_data_attributes<C>(catalog: &mut C, data: &ScenarioInputData) -> ConfigResult<Attributes>
where
    C: SimulatorCatalog + ?Sized,
{
    let conditions = if data.trajectory_condition_list.is_empty() {
        default_trajectory_conditions(&*catalog)
    } else {
        let mut conditions = Vec::with_capacity(data.trajectory_condition_list.len());
        for condition in &data.trajectory_condition_list {
            let origin = condition.origin_centroid_external_id.as_deref().unwrap_or_default();
            let destination = condition.destination_centroid_external_id.as_deref().unwrap_or_default();
            let origin = get_object_per_external_id(catalog, origin, TYPE_CENTROID)?;
            let destination = get_object_per_external_id(catalog, destination, TYPE_CENTROID)?;
            conditions.push(trajectory_record(origin, destination, condition.percentage.unwrap_or_default()));
        }
        conditions
    };

    let mut attributes = vec![(ATT_TRAJECTORY_CONDITIONS, AttributeValue::Records(conditions))];
    for (attribute, interval) in [
        (ATT_DETECTION_INTERVAL, data.detection_interval),
        (ATT_STATISTICAL_INTERVAL, data.statistical_interval),
    ] {
        if let Some(seconds) = interval {
            attributes.push((attribute, i64::from(seconds).into()));
        }
    }
    for (attribute, flag) in [
        (ATT_GLOBAL_TRAJECTORIES_STATISTICS, data.global_trajectories_statistics),
        (ATT_SECTION_TRAJECTORIES_STATISTICS, data.section_trajectories_statistics),
        (ATT_TRAJECTORIES_STATISTICS, data.trajectories_statistics),
    ] {
        if let Some(flag) = flag {
            attributes.push((attribute, flag.into()));
        }
    }
    Ok(attributes)
}

fn parameter_value(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::Bool(flag) => Some((*flag).into()),
        Value::Number(number) => number
            .as_i64()
            .map(AttributeValue::Int)
            .or_else(|| number.as_f64().map(AttributeValue::Float)),
        Value::String(text) => Some(text.as_str().into()),
        _ => None,
    }
}

/// Create the experiment with the parameters its engine uses, and one
/// `GKReplication` per replication.
fn create_experiment<C>(catalog: &mut C, experiment: &MicroExperiment, policies: &[ObjectId]) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let groups = required_fields(&experiment.discriminants())?;
    let parameters = serde_json::to_value(&experiment.parameters).map_err(|source| ConfigError::Encode {
        context: format!("experiment {}", experiment.identity),
        source,
    })?;

    let id = catalog.create_object(TYPE_EXPERIMENT, experiment.identity.name(), experiment.identity.external_id());
    if let Some(engine) = experiment.parameters.dynamic_simulator_engine {
        catalog.set_attribute(id, ATT_ENGINE, engine.code().into())?;
    }
    for field in groups.iter().flat_map(|group| group.fields) {
        let name = field.as_str();
        if let Some(value) = parameters.get(name).and_then(parameter_value) {
            catalog.set_attribute(id, name, value)?;
        }
    }

    let mut replications = Vec::with_capacity(experiment.replications.len());
    for replication in &experiment.replications {
        let replication_id = catalog.create_object(
            TYPE_REPLICATION,
            replication.identity.name(),
            replication.identity.external_id(),
        );
        set_optional(catalog, replication_id, ATT_RANDOM_SEED, replication.random_seed)?;
        set_optional(catalog, replication_id, ATT_RECORD_SIMULATION, replication.results_to_generate)?;
        replications.push(replication_id);
    }
    catalog.set_attribute(id, ATT_REPLICATIONS, replications.into())?;
    catalog.set_attribute(id, ATT_POLICIES, policies.to_vec().into())?;
    Ok(id)
}

/// Create a dynamic scenario with its experiment. The output database is
/// placed in `output_directory`.
pub fn import_scenario<C>(catalog: &mut C, scenario: &Scenario, output_directory: &Path) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    scenario.validate()?;
    let external_id = scenario.identity.external_id().unwrap_or_default();
    refuse_existing(catalog, external_id)?;
    let experiment = scenario
        .experiment
        .as_ref()
        .ok_or_else(|| ConfigError::missing("scenario", "experiment"))?;
    let input_data = scenario
        .input_data
        .as_ref()
        .ok_or_else(|| ConfigError::missing("scenario", "input_data"))?;

    let linked = LinkedObjects::resolve(catalog, &scenario.links)?;
    let mut attributes = linked.attributes(&scenario.links);
    attributes.extend(database_attributes(catalog, scenario.links.database_info.as_ref(), output_directory)?);
    attributes.extend(input_data_attributes(catalog, input_data)?);

    let policies = linked.policies(&*catalog);
    let experiment_id = create_experiment(catalog, experiment, &policies)?;
    let id = catalog.create_object(TYPE_SCENARIO, scenario.identity.name(), Some(external_id));
    set_all(catalog, id, attributes)?;
    catalog.set_attribute(id, ATT_EXPERIMENTS, vec![experiment_id].into())?;
    info!("Imported {scenario}");
    Ok(id)
}

fn create_macro_experiment<C>(catalog: &mut C, experiment: &StaticMacroExperiment, policies: &[ObjectId]) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let id = catalog.create_object(
        TYPE_MACRO_EXPERIMENT,
        experiment.identity.name(),
        experiment.identity.external_id(),
    );
    set_optional(catalog, id, ATT_ENGINE, experiment.engine.as_deref())?;
    let parameters = &experiment.parameters;
    set_optional(catalog, id, ATT_MAX_ITERATIONS, parameters.max_iterations)?;
    set_optional(catalog, id, ATT_METHOD, parameters.method.map(|method| method.code()))?;
    set_optional(catalog, id, ATT_MAX_RELATIVE_GAP, parameters.max_relative_gap)?;
    catalog.set_attribute(id, ATT_POLICIES, policies.to_vec().into())?;
    Ok(id)
}

fn create_static_macro_scenario<C>(catalog: &mut C, scenario: &StaticMacroScenario, output_directory: &Path) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let external_id = scenario.identity.external_id().unwrap_or_default();
    refuse_existing(catalog, external_id)?;
    let experiment = scenario
        .experiment
        .as_ref()
        .ok_or_else(|| ConfigError::missing("static macro scenario", "experiment"))?;

    let linked = LinkedObjects::resolve(catalog, &scenario.links)?;
    let mut attributes = linked.attributes(&scenario.links);
    attributes.extend(database_attributes(catalog, scenario.links.database_info.as_ref(), output_directory)?);
    if let Some(time) = scenario.departure_time {
        attributes.push((ATT_DEPARTURE_TIME, i64::from(time.num_seconds_from_midnight()).into()));
    }
    if let Some(assignment) = &scenario.input_path_assignment {
        if let (Some(folder), Some(filename)) = (&assignment.folder_path, &assignment.filename) {
            let file = Path::new(folder).join(filename);
            attributes.push((ATT_PATH_ASSIGNMENT_FILE, AttributeValue::Text(file.display().to_string())));
        }
    }
    let output = &scenario.output_data;
    for (attribute, flag) in [
        (ATT_STORE_STATISTICS, output.store_statistics),
        (ATT_GENERATE_SKIM, output.generate_skim),
        (ATT_GROUP_STATISTICS, output.group_statistics),
        (ATT_CONVERGENCE_STATISTICS, output.convergence_statistics),
        (ATT_ACTIVATE_PATH_STATISTICS, output.activate_path_statistics),
    ] {
        if let Some(flag) = flag {
            attributes.push((attribute, flag.into()));
        }
    }

    let policies = linked.policies(&*catalog);
    let experiment_id = create_macro_experiment(catalog, experiment, &policies)?;
    let id = catalog.create_object(TYPE_MACRO_SCENARIO, scenario.identity.name(), Some(external_id));
    set_all(catalog, id, attributes)?;
    catalog.set_attribute(id, ATT_EXPERIMENTS, vec![experiment_id].into())?;
    Ok(id)
}

/// Create every static scenario with its Frank-Wolfe experiment.
pub fn import_static_macro_scenarios<C>(
    catalog: &mut C,
    scenarios: &StaticMacroScenarios,
    output_directory: &Path,
) -> ConfigResult<Vec<ObjectId>>
where
    C: SimulatorCatalog + ?Sized,
{
    scenarios.validate()?;
    let created = scenarios
        .scenarios
        .iter()
        .map(|scenario| create_static_macro_scenario(catalog, scenario, output_directory))
        .collect::<ConfigResult<Vec<_>>>()?;
    info!("Imported {} static scenarios", created.len());
    Ok(created)
}
