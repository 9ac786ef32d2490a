//! The panel catalogue.
//!
//! Eleven read-only panels over the ACCOUNT_USAGE telemetry views, each
//! filtered to the shared date range. Queries are either composed with the
//! fluent builder or written as literal SQL where the builder does not
//! reach (lateral alias reuse, window frames).

use crate::chart::{Aggregate, Channel, ChannelType, ChartSpec, TimeUnit};
use crate::sql::{
    avg, col, count_star, date_trunc, lit_date, lit_int, lit_str, sum, ExprExt, OrderByExpr,
    Query, TableRef,
};

use super::date_range::DateRange;
use super::panel::{Display, Panel, PanelQuery, Region};

/// Bytes per terabyte (2^40), the divisor for billable storage.
const BYTES_PER_TB: i64 = 1024 * 1024 * 1024 * 1024;

/// Build the full catalogue for one render pass. Panels execute in this
/// order.
pub fn panels(range: &DateRange) -> Vec<Panel> {
    vec![
        credits_used(range),
        jobs_executed(range),
        billable_storage(range),
        credit_usage_by_warehouse(range),
        credit_usage_overtime(range),
        usage_vs_seven_day_average(range),
        execution_time_by_query_type(range),
        longest_queries(range),
        repeated_query_time(range),
        credits_billed_by_month(range),
        execution_time_by_user(range),
    ]
}

/// Total credits consumed in the range, as a headline metric.
pub fn credits_used(range: &DateRange) -> Panel {
    let sql = format!(
        "SELECT SUM(CREDITS_USED)::FLOAT AS CREDITS \
         FROM METERING_HISTORY \
         WHERE START_TIME BETWEEN '{}' AND '{}'",
        range.start(),
        range.end()
    );

    Panel {
        slug: "credits_used",
        title: "Credits Used",
        region: Region::Top,
        query: PanelQuery::Sql(sql),
        display: Display::Metric { decimals: 2 },
    }
}

/// Count of queries executed in the range.
pub fn jobs_executed(range: &DateRange) -> Panel {
    let query = Query::new()
        .select(vec![count_star().alias("JOB_COUNT")])
        .from(TableRef::new("QUERY_HISTORY"))
        .filter(in_range("START_TIME", range));

    Panel {
        slug: "jobs_executed",
        title: "Total # Jobs Executed",
        region: Region::Top,
        query: PanelQuery::Composed(query),
        display: Display::Metric { decimals: 0 },
    }
}

/// Average billable terabytes (storage + stage + failsafe) over the range.
pub fn billable_storage(range: &DateRange) -> Panel {
    let total_bytes = col("STORAGE_BYTES")
        .add(col("STAGE_BYTES"))
        .add(col("FAILSAFE_BYTES"))
        .paren();

    let query = Query::new()
        .select(vec![avg(total_bytes.div(lit_int(BYTES_PER_TB))).alias("BILLABLE_TB")])
        .from(TableRef::new("STORAGE_USAGE"))
        .filter(in_range("USAGE_DATE", range));

    Panel {
        slug: "billable_storage",
        title: "Current Storage (TB)",
        region: Region::Top,
        query: PanelQuery::Composed(query),
        display: Display::Metric { decimals: 3 },
    }
}

/// Credits per warehouse, descending.
pub fn credit_usage_by_warehouse(range: &DateRange) -> Panel {
    let query = Query::new()
        .select(vec![
            col("WAREHOUSE_NAME").into(),
            sum(col("CREDITS_USED")).cast_float().alias("TOTAL_CREDITS_USED"),
        ])
        .from(TableRef::new("WAREHOUSE_METERING_HISTORY"))
        .filter(in_range("START_TIME", range))
        .group_by(vec![col("WAREHOUSE_NAME")])
        .order_by(vec![OrderByExpr::desc(col("TOTAL_CREDITS_USED"))]);

    let spec = ChartSpec::bar(
        Channel::field("TOTAL_CREDITS_USED").aggregate(Aggregate::Sum),
        Channel::field("WAREHOUSE_NAME").sort("-x"),
    );

    Panel {
        slug: "credit_usage_by_warehouse",
        title: "Credit Usage by Warehouse",
        region: Region::Middle,
        query: PanelQuery::Composed(query),
        display: Display::Chart { spec },
    }
}

/// Daily credits per warehouse across the range.
pub fn credit_usage_overtime(range: &DateRange) -> Panel {
    let query = Query::new()
        .select(vec![
            col("START_TIME").cast_date().alias("USAGE_DATE"),
            col("WAREHOUSE_NAME").into(),
            sum(col("CREDITS_USED")).cast_float().alias("TOTAL_CREDITS_USED"),
        ])
        .from(TableRef::new("WAREHOUSE_METERING_HISTORY"))
        .filter(col("START_TIME").cast_date().between(
            lit_date(range.start()),
            lit_date(range.end()),
        ))
        .group_by(vec![col("USAGE_DATE"), col("WAREHOUSE_NAME")])
        .order_by(vec![OrderByExpr::desc(col("TOTAL_CREDITS_USED"))]);

    let spec = ChartSpec::bar(
        Channel::field("USAGE_DATE")
            .time_unit(TimeUnit::UtcYearMonthDate)
            .channel_type(ChannelType::Temporal),
        Channel::field("TOTAL_CREDITS_USED").aggregate(Aggregate::Sum),
    )
    .color_by("WAREHOUSE_NAME");

    Panel {
        slug: "credit_usage_overtime",
        title: "Credit Usage Overtime",
        region: Region::Bottom,
        query: PanelQuery::Composed(query),
        display: Display::Chart { spec },
    }
}

/// Daily credits per warehouse against a trailing 7-row average.
///
/// The window (current row + 7 preceding) and the lateral reuse of the
/// `CREDITS_USED_7_DAY_AVG` alias are outside the builder, so this stays
/// literal SQL. The trailing average is wrapped in NULLIF so a zero
/// average yields a NULL variance instead of a division error.
pub fn usage_vs_seven_day_average(range: &DateRange) -> Panel {
    let sql = format!(
        "SELECT\n\
         \x20   WAREHOUSE_NAME,\n\
         \x20   DATE(START_TIME) AS DATE,\n\
         \x20   SUM(CREDITS_USED)::FLOAT AS CREDITS_USED,\n\
         \x20   AVG(SUM(CREDITS_USED)) OVER (\n\
         \x20       PARTITION BY WAREHOUSE_NAME\n\
         \x20       ORDER BY DATE ROWS 7 PRECEDING\n\
         \x20   )::FLOAT AS CREDITS_USED_7_DAY_AVG,\n\
         \x20   ((SUM(CREDITS_USED) / NULLIF(CREDITS_USED_7_DAY_AVG, 0)) - 1)::FLOAT \
         AS VARIANCE_TO_7_DAY_AVERAGE\n\
         FROM WAREHOUSE_METERING_HISTORY\n\
         WHERE START_TIME BETWEEN '{}' AND '{}'\n\
         GROUP BY DATE, WAREHOUSE_NAME\n\
         ORDER BY DATE DESC",
        range.start(),
        range.end()
    );

    let spec = ChartSpec::bar(
        Channel::field("DATE")
            .time_unit(TimeUnit::UtcYearMonthDate)
            .channel_type(ChannelType::Temporal),
        Channel::field("VARIANCE_TO_7_DAY_AVERAGE")
            .channel_type(ChannelType::Quantitative)
            .axis_format(".0%"),
    )
    .color_by("WAREHOUSE_NAME");

    Panel {
        slug: "usage_vs_seven_day_average",
        title: "Warehouse Usage Greater than 7 Day Average",
        region: Region::Bottom,
        query: PanelQuery::Sql(sql),
        display: Display::Chart { spec },
    }
}

/// Average execution seconds per (warehouse size, query type).
pub fn execution_time_by_query_type(range: &DateRange) -> Panel {
    let query = Query::new()
        .select(vec![
            col("WAREHOUSE_SIZE").into(),
            col("QUERY_TYPE").into(),
            avg(col("EXECUTION_TIME"))
                .div(lit_int(1000))
                .paren()
                .cast_float()
                .alias("AVERAGE_EXECUTION_TIME"),
        ])
        .from(TableRef::new("QUERY_HISTORY"))
        .filter(in_range("START_TIME", range))
        .group_by(vec![col("WAREHOUSE_SIZE"), col("QUERY_TYPE")])
        .order_by(vec![OrderByExpr::desc(col("AVERAGE_EXECUTION_TIME"))]);

    let spec = ChartSpec::bar(
        Channel::field("AVERAGE_EXECUTION_TIME").aggregate(Aggregate::Sum),
        Channel::field("QUERY_TYPE").sort("-x"),
    );

    Panel {
        slug: "execution_time_by_query_type",
        title: "Execution Time by Query Type (Avg Seconds)",
        region: Region::Middle,
        query: PanelQuery::Composed(query),
        display: Display::Chart { spec },
    }
}

/// The 25 slowest successful queries in the range.
pub fn longest_queries(range: &DateRange) -> Panel {
    let query = Query::new()
        .select(vec![
            col("QUERY_ID").into(),
            col("QUERY_TEXT").into(),
            col("EXECUTION_TIME")
                .div(lit_int(1000))
                .paren()
                .cast_float()
                .alias("EXEC_TIME"),
        ])
        .from(TableRef::new("QUERY_HISTORY"))
        .filter(in_range("START_TIME", range))
        .filter(col("EXECUTION_STATUS").eq(lit_str("SUCCESS")))
        .order_by(vec![OrderByExpr::desc(col("EXEC_TIME"))])
        .limit(25);

    let spec = ChartSpec::bar(
        Channel::field("EXEC_TIME").channel_type(ChannelType::Quantitative),
        Channel::field("QUERY_TEXT").sort("-x"),
    );

    Panel {
        slug: "longest_queries",
        title: "Top 25 Longest Queries",
        region: Region::Bottom,
        query: PanelQuery::Composed(query),
        display: Display::ChartWithListing { spec },
    }
}

/// Total execution minutes per repeated query text, top 25.
pub fn repeated_query_time(range: &DateRange) -> Panel {
    let query = Query::new()
        .select(vec![
            col("QUERY_TEXT").into(),
            sum(col("EXECUTION_TIME"))
                .div(lit_int(60000))
                .paren()
                .cast_float()
                .alias("EXEC_TIME"),
        ])
        .from(TableRef::new("QUERY_HISTORY"))
        .filter(in_range("START_TIME", range))
        .filter(col("EXECUTION_STATUS").eq(lit_str("SUCCESS")))
        .group_by(vec![col("QUERY_TEXT")])
        .order_by(vec![OrderByExpr::desc(col("EXEC_TIME"))])
        .limit(25);

    let spec = ChartSpec::bar(
        Channel::field("EXEC_TIME").channel_type(ChannelType::Quantitative),
        Channel::field("QUERY_TEXT").sort("-x"),
    );

    Panel {
        slug: "repeated_query_time",
        title: "Total Execution Time by Repeated Queries",
        region: Region::Bottom,
        query: PanelQuery::Composed(query),
        display: Display::ChartWithListing { spec },
    }
}

/// Credits billed per truncated month.
pub fn credits_billed_by_month(range: &DateRange) -> Panel {
    let query = Query::new()
        .select(vec![
            date_trunc("MONTH", col("USAGE_DATE")).alias("USAGE_MONTH"),
            sum(col("CREDITS_BILLED")).cast_float().alias("CREDITS_BILLED"),
        ])
        .from(TableRef::new("METERING_DAILY_HISTORY"))
        .filter(in_range("USAGE_DATE", range))
        .group_by(vec![col("USAGE_MONTH")]);

    let spec = ChartSpec::bar(
        Channel::field("USAGE_MONTH")
            .time_unit(TimeUnit::UtcYearMonth)
            .channel_type(ChannelType::Temporal),
        Channel::field("CREDITS_BILLED").aggregate(Aggregate::Sum),
    );

    Panel {
        slug: "credits_billed_by_month",
        title: "Credits Billed by Month",
        region: Region::Bottom,
        query: PanelQuery::Composed(query),
        display: Display::Chart { spec },
    }
}

/// Execution seconds per user across the range.
pub fn execution_time_by_user(range: &DateRange) -> Panel {
    let query = Query::new()
        .select(vec![
            col("USER_NAME").into(),
            sum(col("EXECUTION_TIME"))
                .div(lit_int(1000))
                .paren()
                .cast_float()
                .alias("AVERAGE_EXECUTION_TIME"),
        ])
        .from(TableRef::new("QUERY_HISTORY"))
        .filter(in_range("START_TIME", range))
        .group_by(vec![col("USER_NAME")])
        .order_by(vec![OrderByExpr::desc(col("AVERAGE_EXECUTION_TIME"))]);

    let spec = ChartSpec::bar(
        Channel::field("USER_NAME"),
        Channel::field("AVERAGE_EXECUTION_TIME").channel_type(ChannelType::Quantitative),
    );

    Panel {
        slug: "execution_time_by_user",
        title: "Average Query Execution Time (By User)",
        region: Region::Bottom,
        query: PanelQuery::Composed(query),
        display: Display::Chart { spec },
    }
}

/// `column BETWEEN start AND end` for the shared range.
fn in_range(column: &str, range: &DateRange) -> crate::sql::Expr {
    col(column).between(lit_date(range.start()), lit_date(range.end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new_as_of(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_catalogue_has_eleven_panels() {
        let panels = panels(&range());
        assert_eq!(panels.len(), 11);

        let slugs: Vec<_> = panels.iter().map(|p| p.slug).collect();
        let mut unique = slugs.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 11, "slugs must be unique");
    }

    #[test]
    fn test_every_panel_filters_to_the_range() {
        for panel in panels(&range()) {
            let sql = panel.sql();
            assert!(
                sql.contains("2024-01-01") && sql.contains("2024-01-31"),
                "panel {} must carry both range bounds:\n{}",
                panel.slug,
                sql
            );
            assert!(
                sql.contains("BETWEEN"),
                "panel {} must filter with BETWEEN",
                panel.slug
            );
        }
    }

    #[test]
    fn test_changing_the_range_changes_every_query() {
        let other = DateRange::new_as_of(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
        )
        .unwrap();

        let first: Vec<String> = panels(&range()).iter().map(|p| p.sql()).collect();
        let second: Vec<String> = panels(&other).iter().map(|p| p.sql()).collect();
        for (a, b) in first.iter().zip(&second) {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_credits_used_sums_metering_history() {
        let panel = credits_used(&range());
        let sql = panel.sql();
        assert!(sql.contains("SUM(CREDITS_USED)::FLOAT"));
        assert!(sql.contains("FROM METERING_HISTORY"));
        assert!(matches!(panel.display, Display::Metric { decimals: 2 }));
    }

    #[test]
    fn test_jobs_executed_counts_rows() {
        let panel = jobs_executed(&range());
        assert!(panel.sql().contains("COUNT(*)"));
        assert!(matches!(panel.display, Display::Metric { decimals: 0 }));
    }

    #[test]
    fn test_billable_storage_divides_to_terabytes() {
        let sql = billable_storage(&range()).sql();
        assert!(sql.contains("AVG"));
        assert!(sql.contains("1099511627776"));
        assert!(sql.contains("\"STAGE_BYTES\""));
        assert!(sql.contains("\"FAILSAFE_BYTES\""));
    }

    #[test]
    fn test_by_warehouse_orders_descending() {
        let sql = credit_usage_by_warehouse(&range()).sql();
        assert!(sql.contains("GROUP BY \"WAREHOUSE_NAME\""));
        assert!(sql.contains("ORDER BY \"TOTAL_CREDITS_USED\" DESC"));
    }

    #[test]
    fn test_longest_queries_limits_to_25_success_only() {
        let sql = longest_queries(&range()).sql();
        assert!(sql.contains("\"EXECUTION_STATUS\" = 'SUCCESS'"));
        assert!(sql.contains("ORDER BY \"EXEC_TIME\" DESC"));
        assert!(sql.ends_with("LIMIT 25"));
    }

    #[test]
    fn test_repeated_query_time_divides_to_minutes() {
        let sql = repeated_query_time(&range()).sql();
        assert!(sql.contains("(SUM(\"EXECUTION_TIME\") / 60000)::FLOAT"));
        assert!(sql.ends_with("LIMIT 25"));
    }

    #[test]
    fn test_seven_day_average_guards_division() {
        let sql = usage_vs_seven_day_average(&range()).sql();
        assert!(sql.contains("ROWS 7 PRECEDING"));
        assert!(sql.contains("NULLIF(CREDITS_USED_7_DAY_AVG, 0)"));
        assert!(sql.contains("ORDER BY DATE DESC"));
    }

    #[test]
    fn test_credits_billed_truncates_month() {
        let sql = credits_billed_by_month(&range()).sql();
        assert!(sql.contains("DATE_TRUNC('MONTH', \"USAGE_DATE\")"));
        assert!(sql.contains("FROM \"METERING_DAILY_HISTORY\""));
    }

    #[test]
    fn test_regions_match_layout() {
        let panels = panels(&range());
        let top = panels.iter().filter(|p| p.region == Region::Top).count();
        let middle = panels.iter().filter(|p| p.region == Region::Middle).count();
        assert_eq!(top, 3);
        assert_eq!(middle, 2);
    }
}
