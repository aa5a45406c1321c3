//! Linear time scales mapping instants to pixel positions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::viewport::Transform;

/// Continuous linear mapping from a time domain onto a pixel range.
///
/// The domain is held in epoch milliseconds so that rescaling under a
/// transform stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl Default for TimeScale {
    fn default() -> Self {
        Self {
            domain: [0.0, 1.0],
            range: [0.0, 1.0],
        }
    }
}

impl TimeScale {
    pub fn new(domain: (DateTime<Utc>, DateTime<Utc>), range: (f64, f64)) -> Self {
        Self {
            domain: [millis(domain.0), millis(domain.1)],
            range: [range.0, range.1],
        }
    }

    pub fn domain(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (from_millis(self.domain[0]), from_millis(self.domain[1]))
    }

    pub fn range(&self) -> (f64, f64) {
        (self.range[0], self.range[1])
    }

    /// Pixel position of `instant`. A collapsed domain maps to the middle of the range.
    pub fn map(&self, instant: DateTime<Utc>) -> f64 {
        self.map_millis(millis(instant))
    }

    fn map_millis(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    pub fn invert(&self, position: f64) -> DateTime<Utc> {
        from_millis(self.invert_millis(position))
    }

    fn invert_millis(&self, position: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return d0;
        }
        d0 + (position - r0) / span * (d1 - d0)
    }

    /// Horizontal display scale under `transform`: same range, domain
    /// narrowed or widened to what the panned/zoomed viewport shows.
    pub fn rescale_x(&self, transform: &Transform) -> Self {
        self.rescaled(|position| transform.invert_x(position))
    }

    /// Vertical counterpart of [`TimeScale::rescale_x`].
    pub fn rescale_y(&self, transform: &Transform) -> Self {
        self.rescaled(|position| transform.invert_y(position))
    }

    fn rescaled(&self, invert: impl Fn(f64) -> f64) -> Self {
        let [r0, r1] = self.range;
        Self {
            domain: [self.invert_millis(invert(r0)), self.invert_millis(invert(r1))],
            range: self.range,
        }
    }
}

fn millis(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64
}

fn from_millis(value: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.round() as i64).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn maps_and_inverts_linearly() {
        let scale = TimeScale::new((day(1), day(11)), (0.0, 250.0));
        assert!(close(scale.map(day(1)), 0.0));
        assert!(close(scale.map(day(5)), 100.0));
        assert!(close(scale.map(day(11)), 250.0));
        assert_eq!(scale.invert(125.0), day(6));
    }

    #[test]
    fn collapsed_domain_does_not_divide_by_zero() {
        let scale = TimeScale::new((day(3), day(3)), (0.0, 80.0));
        assert!(close(scale.map(day(9)), 40.0));

        let flat = TimeScale::new((day(3), day(4)), (10.0, 10.0));
        assert_eq!(flat.invert(500.0), day(3));
    }

    #[test]
    fn identity_rescale_keeps_the_scale() {
        let scale = TimeScale::new((day(1), day(8)), (0.0, 700.0));
        assert_eq!(scale.rescale_x(&Transform::IDENTITY), scale);
        assert_eq!(scale.rescale_y(&Transform::IDENTITY), scale);
    }

    #[test]
    fn rescaled_scale_matches_applying_the_transform() {
        let scale = TimeScale::new((day(1), day(11)), (0.0, 250.0));
        let transform = Transform::new(2.5, -40.0, 12.0);
        let display = scale.rescale_x(&transform);

        assert_eq!(display.range(), scale.range());
        for instant in [day(1), day(4), day(10) + Duration::hours(7)] {
            assert!(close(display.map(instant), transform.apply_x(scale.map(instant))));
        }
    }

    #[test]
    fn axes_rescale_independently() {
        let scale = TimeScale::new((day(1), day(2)), (0.0, 500.0));
        let pan_x_only = Transform::new(1.0, 300.0, 0.0);
        assert_eq!(scale.rescale_y(&pan_x_only), scale);
        assert_ne!(scale.rescale_x(&pan_x_only), scale);
    }
}
