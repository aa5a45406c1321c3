//! Calendar arithmetic in the chart's local time zone.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc, Weekday,
};

/// Start of the shared 24h band every entry's time of day is projected onto.
pub const DAY_BAND_START: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Hours added on top of each whole-day step so that truncating to
/// midnight after the jump still lands on the next day across DST shifts.
const STEP_OVERSHOOT_HOURS: i64 = 5;

/// Instant a wall-clock reading in `tz` stands for.
///
/// Ambiguous readings resolve to the earliest candidate. A reading that a
/// DST gap skips is moved forward by an hour.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
}

/// First instant of `date` in `tz`; see [`resolve_local`] for DST handling.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    resolve_local(tz, naive).unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

pub fn floor_to_day<Tz: TimeZone>(tz: &Tz, instant: DateTime<Utc>) -> DateTime<Utc> {
    local_midnight(tz, instant.with_timezone(tz).date_naive())
}

pub fn ceil_to_day<Tz: TimeZone>(tz: &Tz, instant: DateTime<Utc>) -> DateTime<Utc> {
    let floor = floor_to_day(tz, instant);
    if floor == instant {
        return instant;
    }
    let date = instant.with_timezone(tz).date_naive();
    match date.succ_opt() {
        Some(next) => local_midnight(tz, next),
        None => floor,
    }
}

pub fn weekday<Tz: TimeZone>(tz: &Tz, instant: DateTime<Utc>) -> Weekday {
    instant.with_timezone(tz).weekday()
}

/// True when the local wall clock reads `00:00` (seconds ignored).
pub fn is_local_midnight<Tz: TimeZone>(tz: &Tz, instant: DateTime<Utc>) -> bool {
    let local = instant.with_timezone(tz);
    local.hour() == 0 && local.minute() == 0
}

/// Projects the local wall-clock hour and minute of `instant` onto the
/// shared day band.
pub fn time_of_day<Tz: TimeZone>(tz: &Tz, instant: DateTime<Utc>) -> DateTime<Utc> {
    let local = instant.with_timezone(tz);
    DAY_BAND_START
        + Duration::hours(i64::from(local.hour()))
        + Duration::minutes(i64::from(local.minute()))
}

/// Generates period boundaries covering `[from, to)`.
///
/// Ticks start on the Monday at or before `from`, advance by `step_days`
/// calendar days, and end with one closing tick at or after `to` so the
/// rightmost partial period stays delimited.
pub fn period_ticks<Tz: TimeZone>(
    tz: &Tz,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    step_days: u32,
) -> Vec<DateTime<Utc>> {
    let mut current = floor_to_day(tz, from);
    while weekday(tz, current) != Weekday::Mon {
        current = floor_to_day(tz, current - Duration::hours(12));
    }

    let step = Duration::hours(i64::from(step_days.max(1)) * 24 + STEP_OVERSHOOT_HOURS);
    let mut ticks = Vec::new();
    while current < to {
        ticks.push(current);
        current = floor_to_day(tz, current + step);
    }
    ticks.push(current);
    ticks
}

/// Label used on the date axis, e.g. `Mon 01 Jan`.
pub fn day_label<Tz: TimeZone>(tz: &Tz, instant: DateTime<Utc>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.with_timezone(tz).format("%a %d %b").to_string()
}

/// Number of (fractional) days between two instants.
pub fn day_span(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / Duration::days(1).num_milliseconds() as f64
}
