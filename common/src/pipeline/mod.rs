pub mod orchestrator;
pub mod output;

pub use orchestrator::{TextToSql, EMPTY_RESULT};
pub use output::{output_path_for, save_json_to_file};
