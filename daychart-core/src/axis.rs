//! The four coordinate scales and the ticks placed along them.
//!
//! The horizontal scales run over absolute calendar days; the vertical
//! scales run over a single 24h band that every entry's time of day is
//! projected onto. Each axis has a bar scale and a grid scale; the
//! horizontal grid scale is shifted by half a column so gridlines fall
//! between bars.

use std::fmt::Display;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{self, DAY_BAND_START};
use crate::scale::TimeScale;
use crate::viewport::{Transform, ViewportSize};
use crate::{ChartConfig, Entry};

/// Spacing of the weekly gridlines, in days.
pub const WEEK_DAYS: u32 = 7;
/// Spacing of the time-of-day labels, in hours.
pub const HOUR_TICK_STEP: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTick {
    pub at: DateTime<Utc>,
    pub position: f64,
    pub label: String,
}

/// Scales rescaled under the current transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScales {
    pub x: TimeScale,
    pub y: TimeScale,
    pub grid_x: TimeScale,
    pub grid_y: TimeScale,
}

#[derive(Debug, Clone)]
pub struct TimeAxisModel<Tz: TimeZone> {
    tz: Tz,
    /// Day the fallback domain covers when there is nothing to show.
    anchor: DateTime<Utc>,
    x: TimeScale,
    y: TimeScale,
    grid_x: TimeScale,
    grid_y: TimeScale,
    timeline_width: f64,
    week_ticks: Vec<DateTime<Utc>>,
    date_ticks: Vec<DateTime<Utc>>,
    tick_frequency: u32,
}

impl<Tz: TimeZone> TimeAxisModel<Tz>
where
    Tz::Offset: Display,
{
    pub fn new(tz: Tz, anchor: DateTime<Utc>, config: &ChartConfig) -> Self {
        let mut model = Self {
            tz,
            anchor,
            x: TimeScale::default(),
            y: TimeScale::default(),
            grid_x: TimeScale::default(),
            grid_y: TimeScale::default(),
            timeline_width: 0.0,
            week_ticks: Vec::new(),
            date_ticks: Vec::new(),
            tick_frequency: 1,
        };
        model.recompute_domains(&[], ViewportSize::default(), config);
        model
    }

    pub fn time_zone(&self) -> &Tz {
        &self.tz
    }

    /// Day columns spanned by `entries`, from the midnight before the
    /// earliest start to the midnight after the latest end.
    ///
    /// With no entries this is the single day containing the anchor.
    pub fn day_range(&self, entries: &[Entry]) -> (DateTime<Utc>, DateTime<Utc>) {
        let earliest = entries.iter().map(|entry| entry.start).min();
        let latest = entries.iter().map(|entry| entry.end).max();
        match (earliest, latest) {
            (Some(start), Some(end)) => (
                calendar::floor_to_day(&self.tz, start),
                calendar::ceil_to_day(&self.tz, end),
            ),
            _ => {
                let from = calendar::floor_to_day(&self.tz, self.anchor);
                let to = calendar::ceil_to_day(&self.tz, from + Duration::hours(12));
                (from, to)
            }
        }
    }

    /// Rebuilds domains and ranges for `entries` on a viewport of the given size.
    ///
    /// Independent of the zoom state; the date-axis ticks keep the current
    /// tick frequency.
    pub fn recompute_domains(&mut self, entries: &[Entry], viewport: ViewportSize, config: &ChartConfig) {
        let (from, to) = self.day_range(entries);
        let column = config.column_width();
        self.timeline_width = (calendar::day_span(from, to) * column).max(viewport.width);

        let band = (DAY_BAND_START, DAY_BAND_START + Duration::days(1));
        self.x = TimeScale::new((from, to), (0.0, self.timeline_width));
        self.grid_x = TimeScale::new(
            (from, to),
            (-column / 2.0, self.timeline_width - column / 2.0),
        );
        self.y = TimeScale::new(band, (0.0, config.day_height));
        self.grid_y = self.y;

        self.week_ticks = calendar::period_ticks(&self.tz, from, to, WEEK_DAYS);
        self.date_ticks = calendar::period_ticks(&self.tz, from, to, self.tick_frequency);
    }

    /// Regenerates the date-axis ticks for a new label spacing.
    pub fn regenerate_date_ticks(&mut self, tick_frequency: u32) {
        let (from, to) = self.x.domain();
        self.tick_frequency = tick_frequency.max(1);
        self.date_ticks = calendar::period_ticks(&self.tz, from, to, self.tick_frequency);
    }

    pub fn x(&self) -> &TimeScale {
        &self.x
    }

    pub fn y(&self) -> &TimeScale {
        &self.y
    }

    pub fn grid_x(&self) -> &TimeScale {
        &self.grid_x
    }

    pub fn grid_y(&self) -> &TimeScale {
        &self.grid_y
    }

    pub fn timeline_width(&self) -> f64 {
        self.timeline_width
    }

    pub fn tick_frequency(&self) -> u32 {
        self.tick_frequency
    }

    pub fn week_ticks(&self) -> &[DateTime<Utc>] {
        &self.week_ticks
    }

    pub fn date_ticks(&self) -> &[DateTime<Utc>] {
        &self.date_ticks
    }

    /// Every second hour of the band, `00:00` through `24:00`.
    pub fn hour_ticks(&self) -> Vec<(DateTime<Utc>, String)> {
        (0..=24)
            .step_by(HOUR_TICK_STEP as usize)
            .map(|hour| {
                (
                    DAY_BAND_START + Duration::hours(i64::from(hour)),
                    format!("{hour:02}:00"),
                )
            })
            .collect()
    }

    pub fn display_scales(&self, transform: &Transform) -> DisplayScales {
        DisplayScales {
            x: self.x.rescale_x(transform),
            y: self.y.rescale_y(transform),
            grid_x: self.grid_x.rescale_x(transform),
            grid_y: self.grid_y.rescale_y(transform),
        }
    }

    pub fn day_column(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        calendar::floor_to_day(&self.tz, instant)
    }

    pub fn time_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        calendar::time_of_day(&self.tz, instant)
    }

    pub fn date_axis(&self, scales: &DisplayScales) -> Vec<AxisTick> {
        self.date_ticks
            .iter()
            .map(|at| AxisTick {
                at: *at,
                position: scales.x.map(*at),
                label: calendar::day_label(&self.tz, *at),
            })
            .collect()
    }

    pub fn time_axis(&self, scales: &DisplayScales) -> Vec<AxisTick> {
        self.hour_ticks()
            .into_iter()
            .map(|(at, label)| AxisTick {
                at,
                position: scales.y.map(at),
                label,
            })
            .collect()
    }

    pub fn week_gridlines(&self, scales: &DisplayScales) -> Vec<f64> {
        self.week_ticks.iter().map(|at| scales.grid_x.map(*at)).collect()
    }

    pub fn hour_gridlines(&self, scales: &DisplayScales) -> Vec<f64> {
        self.hour_ticks()
            .into_iter()
            .map(|(at, _)| scales.grid_y.map(at))
            .collect()
    }
}
