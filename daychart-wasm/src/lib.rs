//! WASM <-> JavaScript bridge for the day chart engine.
//!
//! The JavaScript host owns fetching, drawing and resize notification; it
//! forwards those events here and draws the returned frames.

use std::fmt::Display;

use chrono::{Local, TimeZone};
use daychart_core::{Category, Chart, ChartConfig, ChartError, Color, LoadOutcome, LoadTicket, Transform};
use daychart_ingest::ingest_document_value;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsChartConfig {
    #[serde(default)]
    bar_size: Option<f64>,
    #[serde(default)]
    bar_padding: Option<f64>,
    #[serde(default)]
    day_height: Option<f64>,
    #[serde(default)]
    min_zoom: Option<f64>,
    #[serde(default)]
    max_zoom: Option<f64>,
    #[serde(default)]
    axis_margin: Option<f64>,
    #[serde(default)]
    fill_palette: Option<Vec<String>>,
    #[serde(default)]
    category_strokes: Option<Vec<(String, String)>>,
}

impl TryFrom<JsChartConfig> for ChartConfig {
    type Error = ChartError;

    fn try_from(cfg: JsChartConfig) -> Result<Self, Self::Error> {
        let mut base = ChartConfig::default();
        if let Some(value) = cfg.bar_size {
            base.bar_size = value;
        }
        if let Some(value) = cfg.bar_padding {
            base.bar_padding = value;
        }
        if let Some(value) = cfg.day_height {
            base.day_height = value;
        }
        if let Some(value) = cfg.min_zoom {
            base.min_zoom = value;
        }
        if let Some(value) = cfg.max_zoom {
            base.max_zoom = value;
        }
        if let Some(value) = cfg.axis_margin {
            base.axis_margin = value;
        }
        if let Some(palette) = cfg.fill_palette {
            base.fill_palette = palette.into_iter().map(Color::new).collect();
        }
        for (category, color) in cfg.category_strokes.unwrap_or_default() {
            let slot = match category.parse::<Category>()? {
                Category::Calendar => &mut base.category_strokes.calendar,
                Category::Ops => &mut base.category_strokes.ops,
                Category::Sprint => &mut base.category_strokes.sprint,
                Category::Extra => &mut base.category_strokes.extra,
                Category::Personal => &mut base.category_strokes.personal,
                Category::Unknown => &mut base.category_strokes.unknown,
            };
            *slot = Color::new(color);
        }
        Ok(base)
    }
}

#[derive(Debug, PartialEq, Serialize)]
struct LoadSummary {
    outcome: LoadOutcome,
    entries: usize,
    rejected: Vec<String>,
    midnight_dropped: usize,
}

impl LoadSummary {
    fn superseded() -> Self {
        Self {
            outcome: LoadOutcome::Superseded,
            entries: 0,
            rejected: Vec::new(),
            midnight_dropped: 0,
        }
    }
}

#[wasm_bindgen]
pub struct DayChart {
    chart: Chart<Local>,
}

#[wasm_bindgen]
impl DayChart {
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<JsValue>) -> Result<DayChart, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let config = match config {
            Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
                let cfg: JsChartConfig = from_value(js_cfg)
                    .map_err(|err| JsValue::from_str(&format!("cannot read config: {err}")))?;
                ChartConfig::try_from(cfg).map_err(to_js_error)?
            }
            _ => ChartConfig::default(),
        };

        let chart = Chart::new(config, Local).map_err(to_js_error)?;
        Ok(DayChart { chart })
    }

    /// Starts a load; pass the returned ticket to `finishLoad` or `failLoad`.
    #[wasm_bindgen(js_name = beginLoad)]
    pub fn begin_load(&mut self) -> f64 {
        self.chart.begin_load().0 as f64
    }

    /// Ingests the fetched timeline document for `ticket`.
    ///
    /// Throws only when the document is unusable and `ticket` is still the
    /// current load; a stale response resolves with outcome `superseded`.
    #[wasm_bindgen(js_name = finishLoad)]
    pub fn finish_load(&mut self, ticket: f64, document: JsValue) -> Result<JsValue, JsValue> {
        let document = from_value::<serde_json::Value>(document)
            .map_err(|err| ChartError::InvalidDocument(err.to_string()));
        let summary = apply_document(&mut self.chart, LoadTicket(ticket as u64), document)
            .map_err(to_js_error)?;
        serialize(&summary)
    }

    /// Reports that fetching the document for `ticket` failed.
    #[wasm_bindgen(js_name = failLoad)]
    pub fn fail_load(&mut self, ticket: f64, message: String) -> Result<JsValue, JsValue> {
        let outcome = self
            .chart
            .fail_load(LoadTicket(ticket as u64), ChartError::Fetch(message));
        serialize(&outcome)
    }

    #[wasm_bindgen(js_name = loadState)]
    pub fn load_state(&self) -> Result<JsValue, JsValue> {
        serialize(self.chart.load_state())
    }

    #[wasm_bindgen(js_name = onResize)]
    pub fn on_resize(&mut self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        serialize(&self.chart.on_resize(width, height))
    }

    /// Applies a pan/zoom gesture; read the clamped result back with `transform`.
    #[wasm_bindgen(js_name = onGesture)]
    pub fn on_gesture(&mut self, k: f64, x: f64, y: f64) -> Result<JsValue, JsValue> {
        serialize(&self.chart.on_gesture(Transform::new(k, x, y)))
    }

    pub fn transform(&self) -> Result<JsValue, JsValue> {
        serialize(&self.chart.transform())
    }

    #[wasm_bindgen(js_name = onHover)]
    pub fn on_hover(&mut self, entry: usize) -> Result<JsValue, JsValue> {
        serialize(&self.chart.on_hover(entry))
    }

    #[wasm_bindgen(js_name = onUnhover)]
    pub fn on_unhover(&mut self) -> Result<JsValue, JsValue> {
        serialize(&self.chart.on_unhover())
    }

    #[wasm_bindgen(js_name = onLegendClick)]
    pub fn on_legend_click(&mut self, category: &str) -> Result<JsValue, JsValue> {
        let category = category.parse::<Category>().map_err(to_js_error)?;
        serialize(&self.chart.on_legend_click(category))
    }

    /// Full draw output: bars, axes, gridlines, legend and load state.
    pub fn frame(&self) -> Result<JsValue, JsValue> {
        serialize(&self.chart.frame())
    }

    /// `[entryIndex, fillOpacity]` pairs for an opacity-only redraw.
    #[wasm_bindgen(js_name = fillOpacities)]
    pub fn fill_opacities(&self) -> Result<JsValue, JsValue> {
        serialize(&self.chart.fill_opacities())
    }
}

/// Ingests `document` into `chart` as the result of load `ticket`.
fn apply_document<Tz>(
    chart: &mut Chart<Tz>,
    ticket: LoadTicket,
    document: Result<serde_json::Value, ChartError>,
) -> Result<LoadSummary, ChartError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let report = document.and_then(|document| ingest_document_value(&document, chart.axis().time_zone()));
    let report = match report {
        Ok(report) => report,
        Err(error) => {
            return match chart.fail_load(ticket, error.clone()) {
                LoadOutcome::Superseded => Ok(LoadSummary::superseded()),
                LoadOutcome::Applied => Err(error),
            };
        }
    };

    let entries = report.entries.len();
    let rejected = report.rejected.iter().map(ToString::to_string).collect();
    let outcome = chart.complete_load(ticket, report.entries);
    Ok(LoadSummary {
        outcome,
        entries,
        rejected,
        midnight_dropped: report.midnight_dropped,
    })
}

fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|err| JsValue::from_str(&format!("cannot serialize result: {err}")))
}

fn to_js_error(err: ChartError) -> JsValue {
    JsValue::from_str(&format!("Day chart error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use daychart_core::LoadState;
    use serde_json::json;

    fn chart() -> Chart<Utc> {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        Chart::with_anchor(ChartConfig::default(), Utc, anchor).unwrap()
    }

    fn document() -> serde_json::Value {
        json!([["2024-01-02", [
            {"name": "standup", "start": "2024-01-02T09:00:00Z", "end": "2024-01-02T09:15:00Z",
             "tags": [], "path": "Meetings", "filename": "work.org"},
            {"name": "broken", "start": "soon", "end": "2024-01-02T09:15:00Z",
             "tags": [], "path": "", "filename": ""}
        ]]])
    }

    #[test]
    fn current_document_is_applied() {
        let mut chart = chart();
        let ticket = chart.begin_load();
        let summary = apply_document(&mut chart, ticket, Ok(document())).unwrap();
        assert_eq!(summary.outcome, LoadOutcome::Applied);
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(chart.load_state(), &LoadState::Ready { entries: 1 });
    }

    #[test]
    fn malformed_current_document_is_an_error() {
        let mut chart = chart();
        let ticket = chart.begin_load();
        let result = apply_document(&mut chart, ticket, Ok(json!({"not": "a list"})));
        assert!(matches!(result, Err(ChartError::InvalidDocument(_))));
        assert!(matches!(chart.load_state(), LoadState::Failed { .. }));
    }

    #[test]
    fn stale_malformed_document_is_reported_as_superseded() {
        let mut chart = chart();
        let stale = chart.begin_load();
        let current = chart.begin_load();

        let undecodable = Err(ChartError::InvalidDocument("not an object".to_string()));
        assert_eq!(
            apply_document(&mut chart, stale, undecodable),
            Ok(LoadSummary::superseded())
        );
        assert_eq!(
            apply_document(&mut chart, stale, Ok(json!("garbage"))),
            Ok(LoadSummary::superseded())
        );
        assert_eq!(chart.load_state(), &LoadState::Loading { generation: current.0 });

        let summary = apply_document(&mut chart, current, Ok(document())).unwrap();
        assert_eq!(summary.outcome, LoadOutcome::Applied);
    }
}
