use crate::error::{Result, Text2SqlError};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL_NAME: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TABLE_NAME: &str = "text_to_sql_temp";
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// everything the pipeline needs to know about its environment,
/// built once at the binary boundary and passed down by reference
#[derive(Debug, Clone)]
pub struct Config {
    pub model_name: String,
    pub api_base: String,
    pub api_key: Option<String>,
    /// `None` gives every pipeline its own throwaway database
    pub database_path: Option<PathBuf>,
    pub table_name: String,
    pub max_retries: usize,
    pub initial_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            database_path: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(Text2SqlError::Config("model name must not be empty".to_string()));
        }

        if self.max_retries == 0 {
            return Err(Text2SqlError::Config(
                "max_retries must allow at least one attempt".to_string(),
            ));
        }

        // the table name is spliced into sql unquoted
        let valid_table = !self.table_name.is_empty()
            && self
                .table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !self.table_name.starts_with(|c: char| c.is_ascii_digit());
        if !valid_table {
            return Err(Text2SqlError::Config(format!(
                "table name '{}' must be a plain sql identifier",
                self.table_name
            )));
        }

        Ok(())
    }
}
