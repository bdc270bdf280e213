pub mod sql;
pub mod model;
pub mod json_schema;

pub use sql::{generate_schema, SqlType, TableSchema};
pub use model::{synthesize_model, FieldSpec, ValidationModel};
pub use json_schema::to_json_schema;
