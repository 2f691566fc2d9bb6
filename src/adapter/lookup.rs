// lookup.rs
//
// Resolving references against the catalog. Every failure is reported to the
// simulator before it is returned.

use super::catalog::{ObjectId, SimulatorCatalog};
use crate::error::{ConfigError, ConfigResult, ReferenceFailure};

const SOURCE: &str = "lookup";

/// The single object of type `type_name` with this external id.
pub fn get_object_per_external_id<C>(catalog: &mut C, external_id: &str, type_name: &str) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let failure = {
        let matches = catalog.find_by_external_id(external_id);
        match matches.as_slice() {
            [] => ReferenceFailure::NotFound,
            [object] if object.type_name == type_name => return Ok(object.id),
            [object] => ReferenceFailure::WrongType {
                expected: type_name.to_string(),
                found: object.type_name.clone(),
            },
            many => ReferenceFailure::Ambiguous(many.len()),
        }
    };
    let message = match &failure {
        ReferenceFailure::NotFound => format!("No objects have external id {external_id}."),
        ReferenceFailure::Ambiguous(_) => {
            format!("Multiple objects have the external id {external_id}. This should not happen.")
        }
        ReferenceFailure::WrongType { expected, found } => {
            format!("{external_id} type is not {expected} but {found}.")
        }
    };
    catalog.report_error(SOURCE, &message);
    Err(ConfigError::ExternalReference {
        id: external_id.to_string(),
        failure,
    })
}

/// Check that `id` names a live object of one of `type_names`.
pub fn get_object_per_internal_id<C>(catalog: &mut C, id: ObjectId, type_names: &[&str]) -> ConfigResult<ObjectId>
where
    C: SimulatorCatalog + ?Sized,
{
    let failure = match catalog.find_by_internal_id(id) {
        None => ReferenceFailure::NotFound,
        Some(object) if type_names.contains(&object.type_name.as_str()) => return Ok(id),
        Some(object) => ReferenceFailure::WrongType {
            expected: type_names.join(" or "),
            found: object.type_name.clone(),
        },
    };
    let message = match &failure {
        ReferenceFailure::WrongType { expected, found } => format!("{id} type is not {expected} but {found}."),
        _ => format!("No objects have internal id {id}."),
    };
    catalog.report_error(SOURCE, &message);
    Err(ConfigError::ExternalReference {
        id: id.to_string(),
        failure,
    })
}
