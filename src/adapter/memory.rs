// memory.rs

use log::{debug, error};
use std::collections::{BTreeMap, BTreeSet};

use super::catalog::{AttributeValue, CatalogObject, ObjectId, SimulatorCatalog};
use crate::error::{ConfigError, ConfigResult, ReferenceFailure};

/// Catalog kept in memory. Used for dry runs and tests.
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    objects: BTreeMap<ObjectId, CatalogObject>,
    pending_deletions: BTreeSet<ObjectId>,
    next_id: ObjectId,
    reported_errors: Vec<String>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            pending_deletions: BTreeSet::new(),
            next_id: 1,
            reported_errors: Vec::new(),
        }
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live objects, deleted ones excluded.
    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reported_errors(&self) -> &[String] {
        &self.reported_errors
    }

    fn live(&self) -> impl Iterator<Item = &CatalogObject> + '_ {
        self.objects
            .values()
            .filter(|object| !self.pending_deletions.contains(&object.id))
    }
}

impl SimulatorCatalog for InMemoryCatalog {
    fn find_by_external_id(&self, external_id: &str) -> Vec<&CatalogObject> {
        self.live()
            .filter(|object| object.external_id.as_deref() == Some(external_id))
            .collect()
    }

    fn find_by_internal_id(&self, id: ObjectId) -> Option<&CatalogObject> {
        if self.pending_deletions.contains(&id) {
            return None;
        }
        self.objects.get(&id)
    }

    fn objects_of_type(&self, type_name: &str) -> Vec<&CatalogObject> {
        self.live().filter(|object| object.type_name == type_name).collect()
    }

    fn create_object(&mut self, type_name: &str, name: Option<&str>, external_id: Option<&str>) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        debug!("Creating {type_name} {id}");
        self.objects.insert(
            id,
            CatalogObject {
                id,
                type_name: type_name.to_string(),
                name: name.map(str::to_string),
                external_id: external_id.map(str::to_string),
                attributes: BTreeMap::new(),
            },
        );
        id
    }

    fn set_attribute(&mut self, id: ObjectId, attribute: &str, value: AttributeValue) -> ConfigResult<()> {
        let deleted = self.pending_deletions.contains(&id);
        match self.objects.get_mut(&id) {
            Some(object) if !deleted => {
                object.attributes.insert(attribute.to_string(), value);
                Ok(())
            }
            _ => Err(ConfigError::ExternalReference {
                id: id.to_string(),
                failure: ReferenceFailure::NotFound,
            }),
        }
    }

    fn delete_object(&mut self, id: ObjectId) -> ConfigResult<()> {
        if self.find_by_internal_id(id).is_none() {
            return Err(ConfigError::ExternalReference {
                id: id.to_string(),
                failure: ReferenceFailure::NotFound,
            });
        }
        self.pending_deletions.insert(id);
        Ok(())
    }

    fn flush_commands(&mut self) {
        for id in std::mem::take(&mut self.pending_deletions) {
            self.objects.remove(&id);
        }
    }

    fn report_error(&mut self, source: &str, message: &str) {
        error!("{source}: {message}");
        self.reported_errors.push(format!("{source}: {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_objects_get_increasing_ids() {
        let mut catalog = InMemoryCatalog::new();
        let a = catalog.create_object("GKSection", None, Some("s1"));
        let b = catalog.create_object("GKSection", None, Some("s2"));
        assert!(b > a);
        assert_eq!(catalog.objects_of_type("GKSection").len(), 2);
        assert_eq!(catalog.find_by_external_id("s2")[0].id, b);
    }

    #[test]
    fn deleted_objects_disappear_before_the_flush() {
        let mut catalog = InMemoryCatalog::new();
        let id = catalog.create_object("GKDetector", Some("d"), Some("d"));
        catalog.delete_object(id).unwrap();
        assert!(catalog.find_by_internal_id(id).is_none());
        assert!(catalog.set_attribute(id, "length", 4.5.into()).is_err());
        catalog.flush_commands();
        assert!(catalog.is_empty());
        assert!(catalog.delete_object(id).is_err());
    }

    #[test]
    fn attributes_are_read_back() {
        let mut catalog = InMemoryCatalog::new();
        let id = catalog.create_object("GKSection", None, None);
        catalog.set_attribute(id, "num_lanes", 3i64.into()).unwrap();
        assert_eq!(catalog.attribute(id, "num_lanes"), Some(&AttributeValue::Int(3)));
    }

    #[test]
    fn reported_errors_are_kept() {
        let mut catalog = InMemoryCatalog::new();
        catalog.report_error("lookup", "No objects have external id x.");
        assert_eq!(catalog.reported_errors().len(), 1);
    }
}
