pub mod fields;
pub mod validators;

pub use fields::{FieldSpec, DATA_INDEX_LABEL, FIELDS, ROOT};
