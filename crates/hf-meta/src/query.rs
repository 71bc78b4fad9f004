//! Query description and the row-level helpers shared by every backend.

use std::cmp::Ordering;

use chrono::{SecondsFormat, Utc};
use hf_types::{RowId, TableName};
use serde_json::Value;

/// One row as the backend sees it: a loosely typed attribute bag.
pub type Row = serde_json::Map<String, Value>;

/// Equality filter on one column (`column = value`).
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    /// `column = value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// `id = <id>`, the filter every update/delete by id uses.
    pub fn id(id: RowId) -> Self {
        Self::eq("id", id.to_string())
    }

    /// Whether `row` satisfies this filter.
    ///
    /// Numbers compare by value, so `250` matches `250.0`.
    pub fn matches(&self, row: &Row) -> bool {
        match (row.get(&self.column), &self.value) {
            (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
            (Some(actual), expected) => actual == expected,
            (None, Value::Null) => true,
            (None, _) => false,
        }
    }
}

/// Ordering clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// A select request: table, projected columns, filters, optional order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: TableName,
    /// `"*"` or a comma-separated column list.
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Query {
    /// `select * from <table>` with no filters and backend order.
    pub fn select_all(table: TableName) -> Self {
        Self {
            table,
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
        }
    }

    /// Add an equality filter.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Set the ordering clause.
    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// Restrict the returned columns.
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Whether `row` passes every filter.
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Filter, order and project an iterator of rows into the result set.
    pub fn apply<'a>(&self, rows: impl Iterator<Item = &'a Row>) -> Vec<Row> {
        let mut selected: Vec<Row> = rows.filter(|r| self.matches(r)).cloned().collect();

        if let Some(order) = &self.order {
            // Stable sort: ties keep backend order.
            selected.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending { ord } else { ord.reverse() }
            });
        }

        if self.columns.trim() != "*" {
            let wanted: Vec<&str> = self.columns.split(',').map(str::trim).collect();
            for row in &mut selected {
                row.retain(|k, _| wanted.contains(&k.as_str()));
            }
        }

        selected
    }
}

/// Total order over JSON values: missing/null < bool < number < string.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Fill in the backend-owned columns of a row about to be inserted.
pub(crate) fn prepare_insert(mut row: Row) -> (RowId, Row) {
    let id = row
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<RowId>().ok())
        .unwrap_or_else(RowId::new_random);
    row.insert("id".to_string(), Value::String(id.to_string()));

    if !matches!(row.get("created_at"), Some(Value::String(_))) {
        row.insert("created_at".to_string(), Value::String(timestamp_now()));
    }

    (id, row)
}

/// Merge `patch` into `row`. The row's identity columns never change.
pub(crate) fn apply_patch(row: &mut Row, patch: &Row) {
    for (key, value) in patch {
        if key == "id" || key == "created_at" {
            continue;
        }
        row.insert(key.clone(), value.clone());
    }
}

/// Current time in the fixed-width RFC 3339 form used for `created_at`,
/// so that lexicographic order matches chronological order.
pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
