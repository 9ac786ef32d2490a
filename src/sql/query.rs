//! Query builder - construct Snowflake SELECT statements with a fluent API.

use std::fmt;

use super::expr::{quote_identifier, Expr, ExprExt};

// =============================================================================
// Select Expression (column with optional alias)
// =============================================================================

/// A SELECT list item: expression with optional alias.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    fn write_sql(&self, out: &mut String) {
        self.expr.write_sql(out);
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            out.push_str(&quote_identifier(alias));
        }
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

// =============================================================================
// Table Reference
// =============================================================================

/// A table reference with optional schema.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self {
            schema: None,
            table: table.into(),
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.into());
        self
    }

    fn write_sql(&self, out: &mut String) {
        if let Some(schema) = &self.schema {
            out.push_str(&quote_identifier(schema));
            out.push('.');
        }
        out.push_str(&quote_identifier(&self.table));
    }
}

// =============================================================================
// ORDER BY
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// An ORDER BY expression.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct OrderByExpr {
    pub expr: Expr,
    pub dir: SortDir,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Desc,
        }
    }

    fn write_sql(&self, out: &mut String) {
        self.expr.write_sql(out);
        match self.dir {
            SortDir::Asc => out.push_str(" ASC"),
            SortDir::Desc => out.push_str(" DESC"),
        }
    }
}

// =============================================================================
// Query Builder
// =============================================================================

/// A SELECT query.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "Query has no effect until converted to SQL with to_sql()"]
pub struct Query {
    pub select: Vec<SelectExpr>,
    pub from: Option<TableRef>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
}

impl Query {
    /// Create a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SELECT list.
    pub fn select(mut self, exprs: Vec<impl Into<SelectExpr>>) -> Self {
        self.select = exprs.into_iter().map(|e| e.into()).collect();
        self
    }

    /// Set the FROM table.
    pub fn from(mut self, table: TableRef) -> Self {
        self.from = Some(table);
        self
    }

    /// Add a WHERE condition (ANDed with existing conditions).
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(match self.where_clause {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Set the GROUP BY clause.
    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    /// Set the ORDER BY clause.
    pub fn order_by(mut self, exprs: Vec<OrderByExpr>) -> Self {
        self.order_by = exprs;
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Generate the SQL string.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();

        out.push_str("SELECT");
        for (i, select_expr) in self.select.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str("\n  ");
            select_expr.write_sql(&mut out);
        }

        if let Some(from) = &self.from {
            out.push_str("\nFROM ");
            from.write_sql(&mut out);
        }

        if let Some(where_clause) = &self.where_clause {
            out.push_str("\nWHERE ");
            where_clause.write_sql(&mut out);
        }

        if !self.group_by.is_empty() {
            out.push_str("\nGROUP BY ");
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                expr.write_sql(&mut out);
            }
        }

        if !self.order_by.is_empty() {
            out.push_str("\nORDER BY ");
            for (i, order_expr) in self.order_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                order_expr.write_sql(&mut out);
            }
        }

        if let Some(limit) = self.limit {
            out.push_str(&format!("\nLIMIT {}", limit));
        }

        out
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::{col, count_star, lit_date, lit_str, sum, ExprExt};
    use chrono::NaiveDate;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_simple_select() {
        let query = Query::new()
            .select(vec![col("WAREHOUSE_NAME"), col("CREDITS_USED")])
            .from(TableRef::new("WAREHOUSE_METERING_HISTORY"));

        let sql = query.to_sql();
        assert!(sql.contains("SELECT"));
        assert!(sql.contains("\"WAREHOUSE_NAME\""));
        assert!(sql.contains("FROM \"WAREHOUSE_METERING_HISTORY\""));
    }

    #[test]
    fn test_schema_qualified_from() {
        let query = Query::new()
            .select(vec![count_star().alias("N")])
            .from(TableRef::new("QUERY_HISTORY").with_schema("ACCOUNT_USAGE"));

        assert!(query
            .to_sql()
            .contains("FROM \"ACCOUNT_USAGE\".\"QUERY_HISTORY\""));
    }

    #[test]
    fn test_filters_are_anded() {
        let query = Query::new()
            .select(vec![col("QUERY_TEXT")])
            .from(TableRef::new("QUERY_HISTORY"))
            .filter(col("START_TIME").between(lit_date(jan(1)), lit_date(jan(31))))
            .filter(col("EXECUTION_STATUS").eq(lit_str("SUCCESS")));

        let sql = query.to_sql();
        assert!(sql.contains("WHERE"));
        assert!(sql.contains("BETWEEN DATE '2024-01-01' AND DATE '2024-01-31'"));
        assert!(sql.contains("AND \"EXECUTION_STATUS\" = 'SUCCESS'"));
    }

    #[test]
    fn test_aggregation() {
        let query = Query::new()
            .select(vec![
                col("WAREHOUSE_NAME").into(),
                sum(col("CREDITS_USED")).cast_float().alias("TOTAL_CREDITS_USED"),
            ])
            .from(TableRef::new("WAREHOUSE_METERING_HISTORY"))
            .group_by(vec![col("WAREHOUSE_NAME")])
            .order_by(vec![OrderByExpr::desc(col("TOTAL_CREDITS_USED"))]);

        let sql = query.to_sql();
        assert!(sql.contains("SUM(\"CREDITS_USED\")::FLOAT AS \"TOTAL_CREDITS_USED\""));
        assert!(sql.contains("GROUP BY \"WAREHOUSE_NAME\""));
        assert!(sql.contains("ORDER BY \"TOTAL_CREDITS_USED\" DESC"));
    }

    #[test]
    fn test_limit() {
        let query = Query::new()
            .select(vec![col("QUERY_ID")])
            .from(TableRef::new("QUERY_HISTORY"))
            .order_by(vec![OrderByExpr::desc(col("EXEC_TIME"))])
            .limit(25);

        let sql = query.to_sql();
        assert!(sql.ends_with("LIMIT 25"));
    }

    #[test]
    fn test_multi_column_group_by() {
        let query = Query::new()
            .select(vec![
                col("USAGE_DATE").into(),
                col("WAREHOUSE_NAME").into(),
                sum(col("CREDITS_USED")).alias("TOTAL"),
            ])
            .from(TableRef::new("WAREHOUSE_METERING_HISTORY"))
            .group_by(vec![col("USAGE_DATE"), col("WAREHOUSE_NAME")]);

        assert!(query
            .to_sql()
            .contains("GROUP BY \"USAGE_DATE\", \"WAREHOUSE_NAME\""));
    }

    #[test]
    fn test_display_matches_to_sql() {
        let query = Query::new()
            .select(vec![col("A")])
            .from(TableRef::new("T"));
        assert_eq!(format!("{}", query), query.to_sql());
    }
}
