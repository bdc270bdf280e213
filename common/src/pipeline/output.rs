use crate::error::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// `data/family.csv` -> `data/family.json`
pub fn output_path_for(input: &Path) -> PathBuf {
    input.with_extension("json")
}

/// write a json string to disk, refusing anything that does not parse
pub fn save_json_to_file(json_str: &str, path: &Path) -> Result<()> {
    let parsed: Value = serde_json::from_str(json_str)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string(&parsed)?)?;

    tracing::info!(output = %path.display(), "wrote json result");
    Ok(())
}
