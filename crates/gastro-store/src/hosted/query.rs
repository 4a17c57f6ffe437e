//! Table queries in the hosted REST dialect.
//!
//! Filters are rendered as query parameters: `col=eq.value`,
//! `col=in.(a,b)`, `col=is.null`, and so on.

use std::fmt::Display;

/// A query against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    params: Vec<(String, String)>,
}

impl Query {
    /// Starts a query on `table`, selecting every column.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            params: Vec::new(),
        }
    }

    /// Table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Rendered query parameters.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn push(mut self, key: impl Into<String>, value: String) -> Self {
        self.params.push((key.into(), value));
        self
    }

    /// Restricts returned columns.
    pub fn select(self, columns: &str) -> Self {
        self.push("select", columns.to_string())
    }

    /// `column = value`.
    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.push(column, format!("eq.{value}"))
    }

    /// `column <> value`.
    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.push(column, format!("neq.{value}"))
    }

    /// `column >= value`.
    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.push(column, format!("gte.{value}"))
    }

    /// `column <= value`.
    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.push(column, format!("lte.{value}"))
    }

    /// `column IS NULL`.
    pub fn is_null(self, column: &str) -> Self {
        self.push(column, "is.null".to_string())
    }

    /// `column IS NOT NULL`.
    pub fn not_null(self, column: &str) -> Self {
        self.push(column, "not.is.null".to_string())
    }

    /// `column IN (values)`.
    pub fn in_list<T: Display>(self, column: &str, values: &[T]) -> Self {
        let joined = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.push(column, format!("in.({joined})"))
    }

    /// Adds an ordering term; several calls order by several columns.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let term = format!("{column}.{}", if ascending { "asc" } else { "desc" });
        if let Some((_, existing)) = self.params.iter_mut().find(|(k, _)| k == "order") {
            existing.push(',');
            existing.push_str(&term);
            return self;
        }
        self.push("order", term)
    }

    /// Descending order with nulls last.
    pub fn order_desc_nulls_last(mut self, column: &str) -> Self {
        let term = format!("{column}.desc.nullslast");
        if let Some((_, existing)) = self.params.iter_mut().find(|(k, _)| k == "order") {
            existing.push(',');
            existing.push_str(&term);
            return self;
        }
        self.push("order", term)
    }

    /// Caps the number of rows.
    pub fn limit(self, n: usize) -> Self {
        self.push("limit", n.to_string())
    }
}
