//! Declarative chart specifications.
//!
//! A [`ChartSpec`] maps result columns to visual encodings in the shape the
//! vega-lite renderer accepts: a mark kind plus x/y/color channels with
//! optional aggregation, time binning, sort and axis formatting. Specs are
//! static per panel and never derived from data.

use serde::Serialize;

/// Mark kind. Every panel in the catalogue renders bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bar,
}

/// Channel-level aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
}

/// Time binning applied to a temporal channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeUnit {
    #[serde(rename = "utcyearmonthdate")]
    UtcYearMonthDate,
    #[serde(rename = "utcyearmonth")]
    UtcYearMonth,
}

/// Channel data type, emitted only where the renderer needs the hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Temporal,
    Quantitative,
}

/// Axis options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    /// d3 format string, e.g. `".0%"` for percentages.
    pub format: String,
}

/// One positional encoding channel (x or y).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Channel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    #[serde(rename = "timeUnit", skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<TimeUnit>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<ChannelType>,
    /// Sort directive, e.g. `"-x"` to order categories by descending x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
}

impl Channel {
    pub fn field(name: &str) -> Self {
        Self {
            field: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn aggregate(mut self, agg: Aggregate) -> Self {
        self.aggregate = Some(agg);
        self
    }

    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = Some(unit);
        self
    }

    pub fn channel_type(mut self, ty: ChannelType) -> Self {
        self.channel_type = Some(ty);
        self
    }

    pub fn sort(mut self, directive: &str) -> Self {
        self.sort = Some(directive.into());
        self
    }

    pub fn axis_format(mut self, format: &str) -> Self {
        self.axis = Some(Axis {
            format: format.into(),
        });
        self
    }
}

/// A categorical color split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorChannel {
    pub field: String,
}

/// Field-to-channel bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encoding {
    pub x: Channel,
    pub y: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorChannel>,
}

/// A declarative chart specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub mark: Mark,
    pub encoding: Encoding,
}

impl ChartSpec {
    /// A bar chart with the given x/y channels.
    pub fn bar(x: Channel, y: Channel) -> Self {
        Self {
            mark: Mark::Bar,
            encoding: Encoding { x, y, color: None },
        }
    }

    /// Split bars by a categorical field.
    pub fn color_by(mut self, field: &str) -> Self {
        self.encoding.color = Some(ColorChannel {
            field: field.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_bar_spec_json() {
        let spec = ChartSpec::bar(
            Channel::field("TOTAL_CREDITS_USED").aggregate(Aggregate::Sum),
            Channel::field("WAREHOUSE_NAME").sort("-x"),
        );

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "mark": "bar",
                "encoding": {
                    "x": {"aggregate": "sum", "field": "TOTAL_CREDITS_USED"},
                    "y": {"field": "WAREHOUSE_NAME", "sort": "-x"},
                },
            })
        );
    }

    #[test]
    fn test_temporal_spec_json() {
        let spec = ChartSpec::bar(
            Channel::field("USAGE_DATE")
                .time_unit(TimeUnit::UtcYearMonthDate)
                .channel_type(ChannelType::Temporal),
            Channel::field("TOTAL_CREDITS_USED").aggregate(Aggregate::Sum),
        )
        .color_by("WAREHOUSE_NAME");

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["encoding"]["x"]["timeUnit"], "utcyearmonthdate");
        assert_eq!(json["encoding"]["x"]["type"], "temporal");
        assert_eq!(json["encoding"]["color"]["field"], "WAREHOUSE_NAME");
    }

    #[test]
    fn test_percent_axis() {
        let spec = ChartSpec::bar(
            Channel::field("DATE")
                .time_unit(TimeUnit::UtcYearMonthDate)
                .channel_type(ChannelType::Temporal),
            Channel::field("VARIANCE_TO_7_DAY_AVERAGE")
                .channel_type(ChannelType::Quantitative)
                .axis_format(".0%"),
        );

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["encoding"]["y"]["axis"]["format"], ".0%");
    }
}
