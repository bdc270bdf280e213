use crate::error::Result;
use crate::schema::model::ValidationModel;
use crate::table::ColumnType;
use serde_json::{json, Value};

/// render the validation model as a json schema draft 2020-12 document
#[tracing::instrument(skip(model), fields(title = ?title))]
pub fn to_json_schema(model: &ValidationModel, title: Option<&str>) -> Result<Value> {
    tracing::debug!("converting validation model to json schema format");

    let mut result = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
    });

    if let Some(t) = title {
        result["title"] = json!(t);
    }

    let mut props = serde_json::Map::new();
    for field in &model.fields {
        let mut prop = json!({ "type": [json_type(field.field_type), "null"] });
        if field.field_type == ColumnType::Timestamp {
            prop["format"] = json!("date-time");
        }
        prop["default"] = field.default.clone();
        props.insert(field.name.clone(), prop);
    }
    result["properties"] = Value::Object(props);

    // every field is optional, so there is never a required list
    Ok(result)
}

fn json_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer => "integer",
        ColumnType::Float => "number",
        ColumnType::Boolean => "boolean",
        ColumnType::Timestamp | ColumnType::Text => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::FieldSpec;

    #[test]
    fn test_object_schema_with_properties() {
        let model = ValidationModel::new(vec![
            FieldSpec::optional("name", ColumnType::Text),
            FieldSpec::optional("age", ColumnType::Integer),
            FieldSpec::optional("joined", ColumnType::Timestamp),
        ]);

        let result = to_json_schema(&model, Some("family")).unwrap();

        assert_eq!(result["$schema"], "https://json-schema.org/draft/2020-12/schema");
        assert_eq!(result["title"], "family");
        assert_eq!(result["type"], "object");
        assert_eq!(result["properties"]["name"]["type"], json!(["string", "null"]));
        assert_eq!(result["properties"]["age"]["type"], json!(["integer", "null"]));
        assert_eq!(result["properties"]["joined"]["format"], "date-time");
        assert_eq!(result["properties"]["age"]["default"], Value::Null);
        assert!(result.get("required").is_none());
    }

    #[test]
    fn test_empty_model() {
        let result = to_json_schema(&ValidationModel::default(), None).unwrap();
        assert_eq!(result["properties"], json!({}));
        assert!(result.get("title").is_none());
    }
}
