use crate::error::{Result, Text2SqlError};
use crate::table::{Cell, CleanTable, ColumnDef, ColumnType, Table, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NON_IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9_]+").unwrap()
});

/// sqlite keywords, lowercase; a bare column named like one breaks the schema string
const SQLITE_KEYWORDS: &[&str] = &[
    "abort", "action", "add", "after", "all", "alter", "always", "analyze", "and", "as", "asc",
    "attach", "autoincrement", "before", "begin", "between", "by", "cascade", "case", "cast",
    "check", "collate", "column", "commit", "conflict", "constraint", "create", "cross",
    "current", "current_date", "current_time", "current_timestamp", "database", "default",
    "deferrable", "deferred", "delete", "desc", "detach", "distinct", "do", "drop", "each",
    "else", "end", "escape", "except", "exclude", "exclusive", "exists", "explain", "fail",
    "filter", "first", "following", "for", "foreign", "from", "full", "generated", "glob",
    "group", "groups", "having", "if", "ignore", "immediate", "in", "index", "indexed",
    "initially", "inner", "insert", "instead", "intersect", "into", "is", "isnull", "join",
    "key", "last", "left", "like", "limit", "match", "materialized", "natural", "no", "not",
    "nothing", "notnull", "null", "nulls", "of", "offset", "on", "or", "order", "others",
    "outer", "over", "partition", "plan", "pragma", "preceding", "primary", "query", "raise",
    "range", "recursive", "references", "regexp", "reindex", "release", "rename", "replace",
    "restrict", "returning", "right", "rollback", "row", "rows", "savepoint", "select", "set",
    "table", "temp", "temporary", "then", "ties", "to", "transaction", "trigger", "unbounded",
    "union", "unique", "update", "using", "vacuum", "values", "view", "virtual", "when",
    "where", "window", "with", "without",
];

/// normalize names, trim strings, infer a type per column and fill nulls by type
#[tracing::instrument(skip(table), fields(columns = table.columns().len(), rows = table.row_count()))]
pub fn clean_table(table: Table) -> Result<CleanTable> {
    let (names, rows) = table.into_parts();

    let names = normalize_column_names(&names);
    tracing::debug!("normalized column names: {:?}", names);

    // work column by column, the probes are whole-column decisions
    let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); names.len()];
    for row in rows {
        for (idx, cell) in row.into_iter().enumerate() {
            columns[idx].push(trim_cell(cell));
        }
    }

    let mut defs = Vec::with_capacity(names.len());
    let mut converted = Vec::with_capacity(names.len());

    for (name, cells) in names.into_iter().zip(columns) {
        let column_type = infer_column_type(&cells);
        tracing::debug!(column = %name, column_type = column_type.as_str(), "inferred column type");

        let cells = convert_column(&name, cells, column_type)?;
        let fill = column_type.null_fill();
        let cells = cells
            .into_iter()
            .map(|cell| if cell.is_null() { fill.clone() } else { cell })
            .collect::<Vec<_>>();

        defs.push(ColumnDef { name, column_type });
        converted.push(cells);
    }

    let row_count = converted.first().map(|c| c.len()).unwrap_or(0);
    let mut rows = vec![Vec::with_capacity(defs.len()); row_count];
    for cells in converted {
        for (row, cell) in rows.iter_mut().zip(cells) {
            row.push(cell);
        }
    }

    tracing::info!(
        columns = defs.len(),
        rows = rows.len(),
        "table cleaned"
    );

    Ok(CleanTable::from_parts(defs, rows))
}

/// collapse non-identifier runs to `_`, trim underscores, lowercase.
/// a leading digit gets a `col_` prefix and a sqlite keyword a trailing `_`,
/// colliding names get a numeric suffix and empty names become `column_<n>`
pub fn normalize_column_names(names: &[String]) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut normalized = Vec::with_capacity(names.len());

    for (idx, raw) in names.iter().enumerate() {
        let base = NON_IDENTIFIER_REGEX
            .replace_all(raw, "_")
            .trim_matches('_')
            .to_lowercase();
        let base = if base.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            bare_identifier(base)
        };

        let mut name = base.clone();
        let mut suffix = 2;
        while taken.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        if name != base {
            tracing::warn!("column name '{}' collides after normalization, renamed to '{}'", raw, name);
        }

        taken.insert(name.clone());
        normalized.push(name);
    }

    normalized
}

fn bare_identifier(name: String) -> String {
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("col_{}", name)
    } else if SQLITE_KEYWORDS.contains(&name.as_str()) {
        format!("{}_", name)
    } else {
        name
    }
}

fn trim_cell(cell: Cell) -> Cell {
    match cell {
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Cell::Null
            } else if trimmed.len() == s.len() {
                Cell::Text(s)
            } else {
                Cell::Text(trimmed.to_string())
            }
        }
        other => other,
    }
}

/// numeric, then timestamp, then boolean, else text. one bad value
/// anywhere disqualifies a type for the whole column
pub fn infer_column_type(cells: &[Cell]) -> ColumnType {
    let values: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();

    if let Some(numeric) = probe_numeric(&values) {
        return numeric;
    }

    if values.iter().all(|c| probe_timestamp(c).is_some()) {
        return ColumnType::Timestamp;
    }

    if values.iter().all(|c| probe_boolean(c).is_some()) {
        return ColumnType::Boolean;
    }

    ColumnType::Text
}

fn probe_numeric(values: &[&Cell]) -> Option<ColumnType> {
    // an all-null column has no evidence either way; it lands on float
    if values.is_empty() {
        return Some(ColumnType::Float);
    }

    let mut integral = true;
    for cell in values {
        match cell {
            Cell::Integer(_) => {}
            Cell::Float(f) => {
                if !f.is_finite() {
                    return None;
                }
                if integral_float(*f).is_none() {
                    integral = false;
                }
            }
            Cell::Text(s) => {
                if s.parse::<i64>().is_ok() {
                    continue;
                }
                match s.parse::<f64>() {
                    Ok(f) if f.is_finite() => integral = false,
                    _ => return None,
                }
            }
            Cell::Boolean(_) | Cell::Timestamp(_) | Cell::Null => return None,
        }
    }

    Some(if integral {
        ColumnType::Integer
    } else {
        ColumnType::Float
    })
}

fn integral_float(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn probe_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Timestamp(ts) => Some(*ts),
        Cell::Text(s) => NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok(),
        _ => None,
    }
}

fn probe_boolean(cell: &Cell) -> Option<bool> {
    match cell {
        Cell::Boolean(b) => Some(*b),
        Cell::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn convert_column(name: &str, cells: Vec<Cell>, column_type: ColumnType) -> Result<Vec<Cell>> {
    cells
        .into_iter()
        .map(|cell| {
            if cell.is_null() {
                return Ok(Cell::Null);
            }

            let converted = match column_type {
                ColumnType::Integer => match &cell {
                    Cell::Integer(v) => Some(Cell::Integer(*v)),
                    Cell::Float(f) => integral_float(*f).map(Cell::Integer),
                    Cell::Text(s) => s.parse::<i64>().ok().map(Cell::Integer),
                    _ => None,
                },
                ColumnType::Float => match &cell {
                    Cell::Integer(v) => Some(Cell::Float(*v as f64)),
                    Cell::Float(f) => Some(Cell::Float(*f)),
                    Cell::Text(s) => s.parse::<f64>().ok().map(Cell::Float),
                    _ => None,
                },
                ColumnType::Timestamp => probe_timestamp(&cell).map(Cell::Timestamp),
                ColumnType::Boolean => probe_boolean(&cell).map(Cell::Boolean),
                ColumnType::Text => Some(Cell::Text(cell.to_string())),
            };

            converted.ok_or_else(|| {
                Text2SqlError::Cleaning(format!(
                    "column '{}': value '{}' does not convert to {}",
                    name,
                    cell,
                    column_type.as_str()
                ))
            })
        })
        .collect()
}
