pub mod prompt;
pub mod parser;
pub mod executor;

pub use prompt::{build_sql_prompt, SQL_SYSTEM_PROMPT};
pub use parser::extract_sql_query;
pub use executor::{generate_sql_query, RetryPolicy};
