//! SQL composition for the panel catalogue.
//!
//! A fluent query builder that renders Snowflake SQL: projection, filter,
//! group-by, aggregation, sort and limit. Panels that need constructs the
//! builder does not model (lateral alias reuse, window frames) fall back to
//! literal SQL text.

pub mod expr;
pub mod query;

pub use expr::{
    avg, col, count_star, date_trunc, func, lit_date, lit_float, lit_int, lit_null, lit_str, star,
    sum, table_col, BinaryOperator, CastType, Expr, ExprExt, Literal,
};
pub use query::{OrderByExpr, Query, SelectExpr, SortDir, TableRef};
