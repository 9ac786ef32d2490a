//! Expression AST - the core of SQL expression building.
//!
//! A strongly-typed AST for the expressions the panel catalogue needs,
//! with exhaustive pattern matching enforced by the compiler. Rendering
//! targets Snowflake: `"`-quoted identifiers, `''`-escaped strings,
//! `expr::TYPE` casts, `DATE 'YYYY-MM-DD'` literals.

use std::fmt::Write as _;

use chrono::NaiveDate;

use super::query::SelectExpr;

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `write_sql()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// Literal values
    Literal(Literal),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Function call: name(args...)
    Function { name: String, args: Vec<Expr> },

    /// Snowflake cast: expr::TYPE
    Cast { expr: Box<Expr>, ty: CastType },

    /// BETWEEN: expr BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },

    /// Wildcard: *
    Star,

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Raw SQL fragment passed through without escaping.
    ///
    /// Never feed user input to this variant; it exists for static
    /// Snowflake syntax the structured variants do not cover.
    Raw(String),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
    Plus,
    Minus,
    Mul,
    Div,
}

impl BinaryOperator {
    fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lte => "<=",
            BinaryOperator::Gte => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        }
    }
}

/// Target types for `::` casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Float,
    Date,
}

impl CastType {
    fn as_str(&self) -> &'static str {
        match self {
            CastType::Float => "FLOAT",
            CastType::Date => "DATE",
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Quote an identifier for Snowflake.
///
/// Uppercase identifiers quoted with `"` resolve identically to unquoted
/// ones, so the ACCOUNT_USAGE column names stay compatible.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal (single quotes, `''` escaping).
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl Literal {
    fn write_sql(&self, out: &mut String) {
        match self {
            Literal::Int(n) => {
                let _ = write!(out, "{}", n);
            }
            Literal::Float(f) => {
                let _ = write!(out, "{}", f);
            }
            Literal::String(s) => out.push_str(&quote_string(s)),
            Literal::Date(d) => {
                let _ = write!(out, "DATE '{}'", d.format("%Y-%m-%d"));
            }
            Literal::Null => out.push_str("NULL"),
        }
    }
}

impl Expr {
    /// Render this expression into `out`.
    pub fn write_sql(&self, out: &mut String) {
        match self {
            Expr::Column { table, column } => {
                if let Some(table) = table {
                    out.push_str(&quote_identifier(table));
                    out.push('.');
                }
                out.push_str(&quote_identifier(column));
            }
            Expr::Literal(lit) => lit.write_sql(out),
            Expr::BinaryOp { left, op, right } => {
                left.write_sql(out);
                let _ = write!(out, " {} ", op.as_str());
                right.write_sql(out);
            }
            Expr::Function { name, args } => {
                out.push_str(name);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    arg.write_sql(out);
                }
                out.push(')');
            }
            Expr::Cast { expr, ty } => {
                expr.write_sql(out);
                out.push_str("::");
                out.push_str(ty.as_str());
            }
            Expr::Between { expr, low, high } => {
                expr.write_sql(out);
                out.push_str(" BETWEEN ");
                low.write_sql(out);
                out.push_str(" AND ");
                high.write_sql(out);
            }
            Expr::Star => out.push('*'),
            Expr::Paren(inner) => {
                out.push('(');
                inner.write_sql(out);
                out.push(')');
            }
            Expr::Raw(sql) => out.push_str(sql),
        }
    }

    /// Render this expression as a standalone SQL fragment.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Column reference: `col("CREDITS_USED")`.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Qualified column reference: `table_col("Q", "START_TIME")`.
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

/// Float literal.
pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

/// String literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Date literal: `DATE 'YYYY-MM-DD'`.
pub fn lit_date(d: NaiveDate) -> Expr {
    Expr::Literal(Literal::Date(d))
}

/// NULL literal.
pub fn lit_null() -> Expr {
    Expr::Literal(Literal::Null)
}

/// Wildcard: `*`.
pub fn star() -> Expr {
    Expr::Star
}

/// `COUNT(*)`.
pub fn count_star() -> Expr {
    Expr::Function {
        name: "COUNT".into(),
        args: vec![Expr::Star],
    }
}

/// `SUM(expr)`.
pub fn sum(expr: Expr) -> Expr {
    Expr::Function {
        name: "SUM".into(),
        args: vec![expr],
    }
}

/// `AVG(expr)`.
pub fn avg(expr: Expr) -> Expr {
    Expr::Function {
        name: "AVG".into(),
        args: vec![expr],
    }
}

/// `DATE_TRUNC('part', expr)`.
pub fn date_trunc(part: &str, expr: Expr) -> Expr {
    Expr::Function {
        name: "DATE_TRUNC".into(),
        args: vec![lit_str(part), expr],
    }
}

/// Arbitrary function call.
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
    }
}

// =============================================================================
// Fluent extension trait
// =============================================================================

/// Fluent combinators on expressions.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn binop(self, op: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op,
            right: Box::new(right),
        }
    }

    fn eq(self, right: Expr) -> Expr {
        self.binop(BinaryOperator::Eq, right)
    }

    fn and(self, right: Expr) -> Expr {
        self.binop(BinaryOperator::And, right)
    }

    fn add(self, right: Expr) -> Expr {
        self.binop(BinaryOperator::Plus, right)
    }

    fn sub(self, right: Expr) -> Expr {
        self.binop(BinaryOperator::Minus, right)
    }

    fn mul(self, right: Expr) -> Expr {
        self.binop(BinaryOperator::Mul, right)
    }

    fn div(self, right: Expr) -> Expr {
        self.binop(BinaryOperator::Div, right)
    }

    fn between(self, low: Expr, high: Expr) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low),
            high: Box::new(high),
        }
    }

    fn cast_float(self) -> Expr {
        Expr::Cast {
            expr: Box::new(self.into_expr()),
            ty: CastType::Float,
        }
    }

    fn cast_date(self) -> Expr {
        Expr::Cast {
            expr: Box::new(self.into_expr()),
            ty: CastType::Date,
        }
    }

    fn paren(self) -> Expr {
        Expr::Paren(Box::new(self.into_expr()))
    }

    /// Attach a SELECT-list alias, producing a [`SelectExpr`].
    fn alias(self, alias: &str) -> SelectExpr {
        SelectExpr::new(self.into_expr()).with_alias(alias)
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
