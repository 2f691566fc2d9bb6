// project.rs
//
// Resetting a project before a new set of configuration files is loaded.

use log::{debug, info};

use super::catalog::{ObjectId, SimulatorCatalog};
use crate::error::ConfigResult;
use crate::global_variables::PROJECT_OBJECT_TYPES;

/// Delete every object created from configuration files, then flush the
/// pending deletions. The network itself (layers, sections, nodes) stays.
/// Returns how many objects were deleted.
pub fn clean_project<C>(catalog: &mut C) -> ConfigResult<usize>
where
    C: SimulatorCatalog + ?Sized,
{
    let mut deleted = 0;
    for type_name in PROJECT_OBJECT_TYPES {
        let ids: Vec<ObjectId> = catalog.objects_of_type(type_name).iter().map(|object| object.id).collect();
        if !ids.is_empty() {
            debug!("Deleting {} {type_name} objects", ids.len());
        }
        for id in ids {
            catalog.delete_object(id)?;
            deleted += 1;
        }
    }
    catalog.flush_commands();
    info!("Project cleaned, {deleted} objects deleted");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::catalog::{AttributeValue, ATT_LAYER, ATT_POLICIES};
    use crate::adapter::fixtures;
    use crate::adapter::importers::import_master_control_plan;
    use crate::global_variables::*;
    use crate::settings::Settings;

    #[test]
    fn configuration_objects_go_and_the_network_stays() {
        let (mut catalog, layer, section) = fixtures::network();
        let plan = fixtures::master_control_plan(&mut catalog, layer, section);
        import_master_control_plan(&mut catalog, &plan, &Settings::default()).unwrap();
        let policy = catalog.create_object(TYPE_POLICY, Some("Closures"), Some("closures"));
        let strategy = catalog.create_object(TYPE_STRATEGY, Some("Calming"), Some(TRAFFIC_STRATEGY_EXTERNAL_ID));
        catalog.set_attribute(strategy, ATT_POLICIES, vec![policy].into()).unwrap();
        let project_objects: usize = PROJECT_OBJECT_TYPES
            .iter()
            .map(|type_name| catalog.objects_of_type(type_name).len())
            .sum();
        assert!(project_objects > 2);

        assert_eq!(clean_project(&mut catalog).unwrap(), project_objects);
        for type_name in PROJECT_OBJECT_TYPES {
            assert!(catalog.objects_of_type(type_name).is_empty(), "{type_name}");
        }
        assert!(catalog.find_by_internal_id(layer).is_some());
        assert!(catalog.find_by_internal_id(section).is_some());
        assert_eq!(catalog.objects_of_type(TYPE_NODE).len(), 2);
        assert_eq!(
            catalog.attribute(section, ATT_LAYER),
            Some(&AttributeValue::Reference(layer))
        );
    }

    #[test]
    fn deleted_external_ids_can_be_imported_again() {
        let (mut catalog, layer, section) = fixtures::network();
        let plan = fixtures::master_control_plan(&mut catalog, layer, section);
        import_master_control_plan(&mut catalog, &plan, &Settings::default()).unwrap();
        clean_project(&mut catalog).unwrap();
        assert!(import_master_control_plan(&mut catalog, &plan, &Settings::default()).is_ok());
    }

    #[test]
    fn empty_project_has_nothing_to_delete() {
        let (mut catalog, _, _) = fixtures::network();
        assert_eq!(clean_project(&mut catalog).unwrap(), 0);
        assert_eq!(catalog.len(), 2);
    }
}
