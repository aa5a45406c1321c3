use std::path::PathBuf;

use anyhow::Context;
use chrono::FixedOffset;
use clap::Parser;
use daychart_core::{Category, Chart, ChartConfig, Transform};
use daychart_ingest::ingest_document_str;

#[derive(Parser, Debug)]
#[command(
    name = "daychart-cli",
    about = "Lay out a timeline JSON document as day columns and print the result."
)]
struct Args {
    /// Path to the timeline JSON document.
    #[arg(short, long)]
    input: PathBuf,

    #[arg(long, default_value_t = 1200.0)]
    width: f64,

    #[arg(long, default_value_t = 800.0)]
    height: f64,

    /// Zoom factor of the requested transform; clamped to the configured range.
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_x: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_y: f64,

    /// Category to hide; may be repeated.
    #[arg(long = "hide")]
    hide: Vec<Category>,

    /// Offset from UTC, in minutes, used for day boundaries.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    utc_offset: i32,

    /// Print the full render frame as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let tz = FixedOffset::east_opt(args.utc_offset * 60)
        .with_context(|| format!("UTC offset of {} minutes is out of range", args.utc_offset))?;

    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read file {:?}", args.input))?;
    let report = ingest_document_str(&data, &tz)
        .with_context(|| format!("Cannot ingest {:?}", args.input))?;
    log::info!(
        "ingested {} entries ({} rejected, {} starting at midnight)",
        report.entries.len(),
        report.rejected.len(),
        report.midnight_dropped
    );

    let mut chart = Chart::new(ChartConfig::default(), tz)?;
    chart.on_resize(args.width, args.height);
    chart.load_entries(report.entries);
    for category in &args.hide {
        if !chart.interaction().is_hidden(*category) {
            chart.on_legend_click(*category);
        }
    }
    chart.on_gesture(Transform::new(args.zoom, args.pan_x, args.pan_y));

    let frame = chart.frame();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&frame)?);
        return Ok(());
    }

    let (first_day, last_day) = chart.axis().day_range(chart.entries());
    let transform = frame.transform;
    println!(
        "Days: {} .. {}\nEntries: {} ({} visible)\nTransform: k={:.3} x={:.1} y={:.1}\nTick frequency: every {} day(s)",
        first_day.with_timezone(&tz).format("%Y-%m-%d"),
        last_day.with_timezone(&tz).format("%Y-%m-%d"),
        chart.entries().len(),
        frame.bars.len(),
        transform.k,
        transform.x,
        transform.y,
        frame.tick_frequency,
    );
    for item in &frame.legend {
        let mark = if item.checked { "x" } else { " " };
        println!("  [{mark}] {} {}", item.label, item.stroke_color);
    }
    for rejection in &report.rejected {
        println!("rejected {rejection}");
    }

    Ok(())
}
