// validation/mod.rs
//
// Presence checks (`verify_attributes`, `required_fields`) and value checks
// (`CheckedRecord::type_issue`) are kept apart: an absent attribute is never a
// type failure.
pub mod attributes;
pub mod checks;
pub mod required_fields;

pub use attributes::{verify_attributes, HasAttributes};
pub use checks::{check_record, require, require_text, validate_list, CheckedRecord, TypeIssue};
pub use required_fields::{required_fields, ExperimentDiscriminants, FieldGroup};
