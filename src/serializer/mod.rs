// serializer/mod.rs

pub mod envelope;
pub mod paths;

pub use envelope::{Envelope, RecordReader, RecordWriter};
pub use paths::verify_filepath;
