use crate::table::{CleanTable, ColumnType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// one field of the validation model: every field is optional and defaults to null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: ColumnType,
    pub required: bool,
    pub default: Value,
}

impl FieldSpec {
    pub fn optional(name: impl Into<String>, field_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationModel {
    pub fields: Vec<FieldSpec>,
}

impl ValidationModel {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// one optional field per cleaned column, in column order
pub fn synthesize_model(table: &CleanTable) -> ValidationModel {
    let fields = table
        .columns()
        .iter()
        .map(|c| FieldSpec::optional(c.name.clone(), c.column_type))
        .collect::<Vec<_>>();

    tracing::debug!(fields = fields.len(), "validation model synthesized");
    ValidationModel::new(fields)
}
