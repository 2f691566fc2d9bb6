// adapter/mod.rs
//
// Moving configuration aggregates in and out of a simulator model. The
// simulator is only seen through the `SimulatorCatalog` trait.

pub mod catalog;
pub mod exporters;
#[cfg(test)]
mod fixtures;
pub mod importers;
pub mod lookup;
pub mod memory;
pub mod project;
pub mod scenarios;

pub use catalog::{AttributeReader, AttributeValue, CatalogObject, ObjectId, SimulatorCatalog};
pub use exporters::{
    export_centroid_configuration, export_detectors, export_master_control_plan, export_meterings,
    export_section_speed_limits_and_capacities, export_traffic_strategy,
};
pub use importers::{
    import_centroid_configuration, import_detectors, import_master_control_plan, import_od_matrices,
    import_traffic_strategy, update_speed_and_capacity,
};
pub use lookup::{get_object_per_external_id, get_object_per_internal_id};
pub use memory::InMemoryCatalog;
pub use project::clean_project;
pub use scenarios::{
    export_traffic_demand, get_and_restore_real_dataset, import_flow_real_data_set, import_scenario,
    import_static_macro_scenarios, import_traffic_demands, restore_real_data_set,
};
