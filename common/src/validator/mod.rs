pub mod coerce;

pub use coerce::{coerce_row, coerce_value};

use crate::error::Result;
use crate::schema::model::{synthesize_model, ValidationModel};
use crate::table::CleanTable;
use serde::Serialize;
use serde_json::{Map, Value};

/// a result row coerced into the model: every model field, in model order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedRow(Map<String, Value>);

impl ValidatedRow {
    pub(crate) fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

/// builds a model from a cleaned table and filters raw json rows through it
pub trait DataValidator: Send + Sync {
    fn create_model(&self, table: &CleanTable) -> ValidationModel;

    fn validate(&self, data: &str, model: &ValidationModel) -> Vec<ValidatedRow>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelValidator;

impl DataValidator for ModelValidator {
    fn create_model(&self, table: &CleanTable) -> ValidationModel {
        synthesize_model(table)
    }

    fn validate(&self, data: &str, model: &ValidationModel) -> Vec<ValidatedRow> {
        validate(data, model)
    }
}

/// parse json rows and keep the ones that coerce; never fails
#[tracing::instrument(skip(data, model), fields(data_len = data.len(), fields = model.len()))]
pub fn validate(data: &str, model: &ValidationModel) -> Vec<ValidatedRow> {
    let parsed: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("result rows are not valid json: {}", e);
            return Vec::new();
        }
    };

    let items = match parsed {
        Value::Array(items) => items,
        Value::Object(obj) => vec![Value::Object(obj)],
        other => {
            tracing::warn!("result rows are neither an object nor an array: {}", other);
            return Vec::new();
        }
    };

    let total = items.len();
    let validated: Vec<ValidatedRow> = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match coerce_row(item, model) {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::debug!("dropping row {}: {}", idx, e);
                None
            }
        })
        .collect();

    tracing::info!(
        valid = validated.len(),
        dropped = total - validated.len(),
        "result rows validated"
    );

    validated
}

/// serialize validated rows as a json array string
pub fn rows_to_json(rows: &[ValidatedRow]) -> Result<String> {
    Ok(serde_json::to_string(rows)?)
}
