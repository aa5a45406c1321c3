//! Coordinate and viewport engine for a calendar-style day-column chart.
//!
//! Each [`Entry`] is drawn as a vertical bar: its calendar day picks the
//! column, its time of day picks the vertical span inside a shared 24h band.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod axis;
pub mod calendar;
pub mod chart;
pub mod color;
pub mod interaction;
pub mod scale;
pub mod viewport;

pub use axis::{AxisTick, TimeAxisModel};
pub use chart::{Bar, Chart, LegendItem, LoadOutcome, LoadState, LoadTicket, Redraw, RenderFrame};
pub use color::ColorAssigner;
pub use interaction::InteractionController;
pub use scale::TimeScale;
pub use viewport::{tick_frequency, Transform, TranslateExtent, ViewportController, ViewportSize};

/// A CSS color string (`#rrggbb`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of activity an entry represents, picked by ordered rule matching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Calendar,
    Ops,
    Sprint,
    Extra,
    Personal,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Calendar,
        Category::Ops,
        Category::Sprint,
        Category::Extra,
        Category::Personal,
        Category::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Calendar => "calendar",
            Category::Ops => "ops",
            Category::Sprint => "sprint",
            Category::Extra => "extra",
            Category::Personal => "personal",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ChartError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ChartError::UnknownCategory(value.to_string()))
    }
}

/// A normalized, classified time span ready for rendering.
///
/// Built once by ingestion and never mutated afterwards; `start <= end`
/// always holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub name: String,
    pub pretty_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tags: Vec<String>,
    pub path: String,
    pub filename: String,
    pub category: Category,
}

/// Stroke color per category, independent of the fill color mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryStrokes {
    pub calendar: Color,
    pub ops: Color,
    pub sprint: Color,
    pub extra: Color,
    pub personal: Color,
    pub unknown: Color,
}

impl CategoryStrokes {
    pub fn get(&self, category: Category) -> &Color {
        match category {
            Category::Calendar => &self.calendar,
            Category::Ops => &self.ops,
            Category::Sprint => &self.sprint,
            Category::Extra => &self.extra,
            Category::Personal => &self.personal,
            Category::Unknown => &self.unknown,
        }
    }
}

impl Default for CategoryStrokes {
    fn default() -> Self {
        Self {
            calendar: Color::new("#1f78b4"),
            ops: Color::new("#e31a1c"),
            sprint: Color::new("#33a02c"),
            extra: Color::new("#ff7f00"),
            personal: Color::new("#6a3d9a"),
            unknown: Color::new("#7f7f7f"),
        }
    }
}

/// Fill palette: six accent colors, then the Pastel1 and Pastel2 schemes.
pub fn default_fill_palette() -> Vec<Color> {
    [
        "#1395ba", "#c02e1d", "#f16c20", "#ebc844", "#a2b86c", "#0d3c55",
        // Pastel1
        "#fbb4ae", "#b3cde3", "#ccebc5", "#decbe4", "#fed9a6", "#ffffcc", "#e5d8bd", "#fddaec",
        "#f2f2f2",
        // Pastel2
        "#b3e2cd", "#fdcdac", "#cbd5e8", "#f4cae4", "#e6f5c9", "#fff2ae", "#f1e2cc", "#cccccc",
    ]
    .into_iter()
    .map(Color::new)
    .collect()
}

/// Layout constants and palettes; every field can be overridden by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartConfig {
    /// Width of one bar, in unzoomed units.
    pub bar_size: f64,
    /// Gap between two neighbouring day columns.
    pub bar_padding: f64,
    /// Height of the 24h band.
    pub day_height: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Vertical room reserved for the date axis when computing the translate extent.
    pub axis_margin: f64,
    pub fill_palette: Vec<Color>,
    pub category_strokes: CategoryStrokes,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            bar_size: 20.0,
            bar_padding: 5.0,
            day_height: 500.0,
            min_zoom: 0.25,
            max_zoom: 40.0,
            axis_margin: 30.0,
            fill_palette: default_fill_palette(),
            category_strokes: CategoryStrokes::default(),
        }
    }
}

impl ChartConfig {
    /// Width taken by one day column.
    pub fn column_width(&self) -> f64 {
        self.bar_size + self.bar_padding
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        let sizes = [
            ("bar_size", self.bar_size),
            ("day_height", self.day_height),
            ("min_zoom", self.min_zoom),
        ];
        for (field, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(ChartError::InvalidConfig(format!(
                    "{field} must be a positive number, got {value}"
                )));
            }
        }
        if !(self.bar_padding.is_finite() && self.bar_padding >= 0.0) {
            return Err(ChartError::InvalidConfig(format!(
                "bar_padding must not be negative, got {}",
                self.bar_padding
            )));
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            return Err(ChartError::InvalidConfig(format!(
                "max_zoom ({}) must not be below min_zoom ({})",
                self.max_zoom, self.min_zoom
            )));
        }
        if self.fill_palette.is_empty() {
            return Err(ChartError::InvalidConfig(
                "fill_palette needs at least one color".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors raised while loading or configuring a chart.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChartError {
    #[error("input document is malformed: {0}")]
    InvalidDocument(String),
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has the wrong type, expected {expected}")]
    WrongFieldType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("cannot parse `{field}` timestamp {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("record ends ({end}) before it starts ({start})")]
    InvertedSpan {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("unknown category {0:?}")]
    UnknownCategory(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to fetch the input document: {0}")]
    Fetch(String),
}
