pub mod error;
pub mod config;
pub mod table;
pub mod loader;
pub mod schema;
pub mod validator;
pub mod store;
pub mod llm;
pub mod agent;
pub mod pipeline;
pub mod tracing;

pub use config::Config;
pub use error::{Result, Text2SqlError};
pub use pipeline::TextToSql;
