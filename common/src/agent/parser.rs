use crate::error::{Result, Text2SqlError};
use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*\n?(.*?)```").unwrap()
});

static LANGUAGE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^sql\b\s*:?\s*").unwrap()
});

/// pull the bare query out of model output, tolerating fences and a
/// leading `sql` tag even though the prompt asks for neither
pub fn extract_sql_query(output: &str) -> Result<String> {
    let text = output.trim();

    if text.is_empty() {
        return Err(Text2SqlError::QueryExtraction(
            "model returned empty output".to_string()
        ));
    }

    // strip markdown fences if present
    let text = match FENCE_REGEX.captures(text) {
        Some(captures) => captures.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text,
    }
    .trim();

    let query = LANGUAGE_TAG_REGEX.replace(text, "");
    let query = query.trim();

    if query.is_empty() {
        return Err(Text2SqlError::QueryExtraction(
            "model output contained no query".to_string()
        ));
    }

    Ok(query.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain() {
        let result = extract_sql_query("  SELECT name FROM t;\n").unwrap();
        assert_eq!(result, "SELECT name FROM t;");
    }

    #[test]
    fn test_extract_with_fence() {
        let input = "```sql\nSELECT name\nFROM t WHERE age > 30;\n```";
        let result = extract_sql_query(input).unwrap();
        assert_eq!(result, "SELECT name\nFROM t WHERE age > 30;");
    }

    #[test]
    fn test_extract_with_language_tag() {
        let result = extract_sql_query("sql SELECT * FROM t").unwrap();
        assert_eq!(result, "SELECT * FROM t");
    }

    #[test]
    fn test_select_star_from_sqlite_master_untouched() {
        let result = extract_sql_query("SELECT sql FROM sqlite_master").unwrap();
        assert_eq!(result, "SELECT sql FROM sqlite_master");
    }

    #[test]
    fn test_extract_empty_fails() {
        assert!(extract_sql_query("").is_err());
        assert!(extract_sql_query("```\n```").is_err());
    }
}
