//! Per-chart state object tying the scales, viewport and interaction
//! state together and turning them into draw instructions.
//!
//! All host events are processed to completion one at a time; each returns
//! a [`Redraw`] naming the narrowest stage that has to be redone.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::axis::{AxisTick, TimeAxisModel};
use crate::color::ColorAssigner;
use crate::interaction::InteractionController;
use crate::viewport::{tick_frequency, Transform, TranslateExtent, ViewportController, ViewportSize};
use crate::{Category, ChartConfig, ChartError, Color, Entry};

const BAR_CORNER_RADIUS: f64 = 3.0;
const BAR_STROKE_WIDTH: f64 = 2.0;

/// Identifies one load request; only the most recent one may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    Loading { generation: u64 },
    Ready { entries: usize },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Applied,
    /// A newer load was started after this one; its result was dropped.
    Superseded,
}

/// Narrowest part of the output invalidated by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Redraw {
    Nothing,
    Opacity,
    Bars,
    Viewport,
    Everything,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Index of the drawn entry in [`Chart::entries`].
    pub entry: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
    pub stroke_width: f64,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub fill_opacity: f64,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendItem {
    pub category: Category,
    pub label: String,
    pub stroke_color: Color,
    pub checked: bool,
}

/// Everything the renderer needs for one full redraw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub transform: Transform,
    pub viewport: ViewportSize,
    pub timeline_width: f64,
    pub tick_frequency: u32,
    pub bars: Vec<Bar>,
    pub date_axis: Vec<AxisTick>,
    pub time_axis: Vec<AxisTick>,
    pub week_gridlines: Vec<f64>,
    pub hour_gridlines: Vec<f64>,
    pub legend: Vec<LegendItem>,
    pub load_state: LoadState,
}

#[derive(Debug, Clone)]
pub struct Chart<Tz: TimeZone> {
    config: ChartConfig,
    entries: Vec<Entry>,
    /// Categories present in `entries`, in first-seen order.
    categories: Vec<Category>,
    colors: ColorAssigner,
    axis: TimeAxisModel<Tz>,
    viewport: ViewportController,
    interaction: InteractionController,
    size: ViewportSize,
    load_state: LoadState,
    generation: u64,
}

impl<Tz: TimeZone> Chart<Tz>
where
    Tz::Offset: Display,
{
    pub fn new(config: ChartConfig, tz: Tz) -> Result<Self, ChartError> {
        Self::with_anchor(config, tz, Utc::now())
    }

    /// Like [`Chart::new`], with `anchor` as the day shown while empty.
    pub fn with_anchor(config: ChartConfig, tz: Tz, anchor: DateTime<Utc>) -> Result<Self, ChartError> {
        config.validate()?;
        Ok(Self {
            colors: ColorAssigner::new(config.fill_palette.clone()),
            axis: TimeAxisModel::new(tz, anchor, &config),
            viewport: ViewportController::new(&config),
            interaction: InteractionController::new(),
            entries: Vec::new(),
            categories: Vec::new(),
            size: ViewportSize::default(),
            load_state: LoadState::Idle,
            generation: 0,
            config,
        })
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn visible_entries(&self) -> Vec<&Entry> {
        self.interaction.visible_entries(&self.entries)
    }

    pub fn axis(&self) -> &TimeAxisModel<Tz> {
        &self.axis
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn transform(&self) -> Transform {
        self.viewport.transform()
    }

    pub fn viewport_size(&self) -> ViewportSize {
        self.size
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// Starts a load and returns the ticket its result must be delivered with.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.load_state = LoadState::Loading {
            generation: self.generation,
        };
        LoadTicket(self.generation)
    }

    /// Replaces the dataset with `entries` unless a newer load has started.
    pub fn complete_load(&mut self, ticket: LoadTicket, entries: Vec<Entry>) -> LoadOutcome {
        if ticket.0 != self.generation {
            log::debug!(
                "dropping load {} superseded by load {}",
                ticket.0,
                self.generation
            );
            return LoadOutcome::Superseded;
        }

        self.categories.clear();
        for entry in &entries {
            if !self.categories.contains(&entry.category) {
                self.categories.push(entry.category);
            }
            self.colors.color_for(&entry.pretty_name);
        }
        self.entries = entries;
        self.interaction.unhover();
        self.load_state = LoadState::Ready {
            entries: self.entries.len(),
        };
        log::info!("loaded {} entries", self.entries.len());

        self.axis
            .recompute_domains(&self.entries, self.size, &self.config);
        self.viewport.reset();
        self.apply_transform(Transform::IDENTITY);
        LoadOutcome::Applied
    }

    /// Records a failed load; the previous dataset stays on screen.
    pub fn fail_load(&mut self, ticket: LoadTicket, error: ChartError) -> LoadOutcome {
        if ticket.0 != self.generation {
            log::debug!("ignoring failure of superseded load {}", ticket.0);
            return LoadOutcome::Superseded;
        }
        log::warn!("load {} failed: {error}", ticket.0);
        self.load_state = LoadState::Failed {
            message: error.to_string(),
        };
        LoadOutcome::Applied
    }

    /// Convenience for hosts that already hold the ingested entries.
    pub fn load_entries(&mut self, entries: Vec<Entry>) {
        let ticket = self.begin_load();
        self.complete_load(ticket, entries);
    }

    pub fn on_resize(&mut self, width: f64, height: f64) -> Redraw {
        self.size = ViewportSize::new(non_negative(width), non_negative(height));
        log::debug!("viewport resized to {}x{}", self.size.width, self.size.height);
        self.axis
            .recompute_domains(&self.entries, self.size, &self.config);
        self.apply_transform(self.viewport.transform());
        Redraw::Everything
    }

    /// Clamps and stores a pan/zoom request. The transform in effect is
    /// available from [`Chart::transform`] afterwards.
    pub fn on_gesture(&mut self, requested: Transform) -> Redraw {
        let previous = self.viewport.transform();
        if self.apply_transform(requested) == previous {
            Redraw::Nothing
        } else {
            Redraw::Viewport
        }
    }

    fn apply_transform(&mut self, requested: Transform) -> Transform {
        let extent = TranslateExtent::for_layout(self.axis.timeline_width(), self.size, &self.config);
        let transform = self.viewport.apply_gesture(requested, self.size, &extent);
        self.axis.regenerate_date_ticks(tick_frequency(transform.k));
        transform
    }

    /// Highlights every bar sharing the pretty name of entry `index`.
    /// Entries that are not drawn (unknown index, hidden category) are ignored.
    pub fn on_hover(&mut self, index: usize) -> Redraw {
        let Some(entry) = self.entries.get(index) else {
            return Redraw::Nothing;
        };
        if !self.interaction.is_visible(entry) {
            return Redraw::Nothing;
        }
        if self.interaction.hover(entry) {
            Redraw::Opacity
        } else {
            Redraw::Nothing
        }
    }

    pub fn on_unhover(&mut self) -> Redraw {
        if self.interaction.unhover() {
            Redraw::Opacity
        } else {
            Redraw::Nothing
        }
    }

    /// Shows or hides `category`; zoom and pan are left untouched.
    pub fn on_legend_click(&mut self, category: Category) -> Redraw {
        let hidden = self.interaction.toggle_category(category);
        log::debug!("category {category} hidden: {hidden}");
        Redraw::Bars
    }

    pub fn bars(&self) -> Vec<Bar> {
        let transform = self.viewport.transform();
        let scales = self.axis.display_scales(&transform);
        let bar_width = transform.k * self.config.bar_size;

        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.interaction.is_visible(entry))
            .map(|(index, entry)| {
                let x = scales.x.map(self.axis.day_column(entry.start)) - bar_width / 2.0;
                let top = scales.y.map(self.axis.time_of_day(entry.start));
                let bottom = scales.y.map(self.axis.time_of_day(entry.end));
                let stroke_color = self.config.category_strokes.get(entry.category).clone();
                let fill_color = self
                    .colors
                    .assigned(&entry.pretty_name)
                    .cloned()
                    .unwrap_or_else(|| stroke_color.clone());

                Bar {
                    entry: index,
                    x,
                    y: top,
                    width: bar_width,
                    height: (bottom - top).max(0.0),
                    corner_radius: BAR_CORNER_RADIUS,
                    stroke_width: BAR_STROKE_WIDTH,
                    fill_color,
                    stroke_color,
                    fill_opacity: self.interaction.fill_opacity(entry),
                    tooltip: format!("{}\n{}", entry.pretty_name, entry.category),
                }
            })
            .collect()
    }

    /// Fill opacity of each visible bar, keyed by entry index.
    pub fn fill_opacities(&self) -> Vec<(usize, f64)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.interaction.is_visible(entry))
            .map(|(index, entry)| (index, self.interaction.fill_opacity(entry)))
            .collect()
    }

    pub fn legend(&self) -> Vec<LegendItem> {
        self.categories
            .iter()
            .map(|category| LegendItem {
                category: *category,
                label: category.to_string(),
                stroke_color: self.config.category_strokes.get(*category).clone(),
                checked: !self.interaction.is_hidden(*category),
            })
            .collect()
    }

    pub fn frame(&self) -> RenderFrame {
        let transform = self.viewport.transform();
        let scales = self.axis.display_scales(&transform);
        RenderFrame {
            transform,
            viewport: self.size,
            timeline_width: self.axis.timeline_width(),
            tick_frequency: self.axis.tick_frequency(),
            bars: self.bars(),
            date_axis: self.axis.date_axis(&scales),
            time_axis: self.axis.time_axis(&scales),
            week_gridlines: self.axis.week_gridlines(&scales),
            hour_gridlines: self.axis.hour_gridlines(&scales),
            legend: self.legend(),
            load_state: self.load_state.clone(),
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
