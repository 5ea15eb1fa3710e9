use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Sample – one row of the reduced time series
// ---------------------------------------------------------------------------

/// A single reduced measurement: one timestamp with its channel-averaged flux
/// and uncertainty. Built once per load, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Wall-clock timestamp decoded from the file's epoch variable.
    pub timestamp: DateTime<Utc>,
    /// Channel-averaged integrated flux.
    pub flux: f64,
    /// Channel-averaged flux uncertainty.
    pub uncertainty: f64,
    /// Seconds since the previous sample; 0 for the first row. Negative when
    /// the source timestamps run backwards, passed through unmodified.
    pub time_delta_seconds: f64,
}

// ---------------------------------------------------------------------------
// SampleSeries – the complete loaded series
// ---------------------------------------------------------------------------

/// The full reduced series in source order, plus the fixed energy-channel
/// centers retained for display. Source order is never re-sorted, even when
/// timestamps are non-monotonic.
#[derive(Debug, Clone)]
pub struct SampleSeries {
    pub samples: Vec<Sample>,
    /// Energy-channel center values (eV), independent of the time axis.
    pub energy: Vec<f64>,
}

impl SampleSeries {
    /// Zip row-aligned columns into samples, computing inter-sample deltas.
    /// The first row's delta is 0 (no prior sample).
    pub fn from_columns(
        timestamps: Vec<DateTime<Utc>>,
        flux: Vec<f64>,
        uncertainty: Vec<f64>,
        energy: Vec<f64>,
    ) -> Self {
        let mut samples = Vec::with_capacity(timestamps.len());
        let mut prev: Option<DateTime<Utc>> = None;
        for ((timestamp, flux), uncertainty) in
            timestamps.into_iter().zip(flux).zip(uncertainty)
        {
            let time_delta_seconds = match prev {
                Some(p) => (timestamp - p).num_milliseconds() as f64 / 1000.0,
                None => 0.0,
            };
            prev = Some(timestamp);
            samples.push(Sample {
                timestamp,
                flux,
                uncertainty,
                time_delta_seconds,
            });
        }
        SampleSeries { samples, energy }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Min/max flux over the FULL series. These bound the threshold slider
    /// regardless of the active date range.
    pub fn flux_bounds(&self) -> Option<(f64, f64)> {
        if self.samples.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for s in &self.samples {
            min = min.min(s.flux);
            max = max.max(s.flux);
        }
        Some((min, max))
    }

    /// Arithmetic mean flux over the FULL series — the default threshold.
    /// Deliberately independent of [`flux_bounds`] and of any date filter.
    pub fn mean_flux(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.flux).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// Calendar days of the earliest/latest timestamps present in the series,
    /// used as the default date-range bounds.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.samples.iter().map(|s| s.timestamp).min()?;
        let max = self.samples.iter().map(|s| s.timestamp).max()?;
        Some((min.date_naive(), max.date_naive()))
    }
}

// ---------------------------------------------------------------------------
// DateRange – inclusive calendar-day bounds for the filter stage
// ---------------------------------------------------------------------------

/// Inclusive date-range filter. Both bounds are calendar days; the filter
/// stage coerces them to start-of-day instants before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Default range: the series' own min/max calendar day.
    pub fn from_series(series: &SampleSeries) -> Option<Self> {
        series.date_span().map(|(start, end)| DateRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 27, h, m, s).unwrap()
    }

    fn series(rows: &[(DateTime<Utc>, f64)]) -> SampleSeries {
        SampleSeries::from_columns(
            rows.iter().map(|r| r.0).collect(),
            rows.iter().map(|r| r.1).collect(),
            vec![0.1; rows.len()],
            vec![100.0, 200.0],
        )
    }

    #[test]
    fn first_delta_is_zero_then_elapsed_seconds() {
        let s = series(&[(ts(0, 0, 0), 1.0), (ts(0, 1, 0), 2.0), (ts(0, 1, 30), 3.0)]);
        assert_relative_eq!(s.samples[0].time_delta_seconds, 0.0);
        assert_relative_eq!(s.samples[1].time_delta_seconds, 60.0);
        assert_relative_eq!(s.samples[2].time_delta_seconds, 30.0);
    }

    #[test]
    fn non_monotonic_timestamps_give_negative_deltas() {
        let s = series(&[(ts(1, 0, 0), 1.0), (ts(0, 59, 0), 2.0)]);
        assert_relative_eq!(s.samples[1].time_delta_seconds, -60.0);
        // Source order is preserved, not sorted.
        assert_eq!(s.samples[0].timestamp, ts(1, 0, 0));
    }

    #[test]
    fn full_series_statistics() {
        let s = series(&[(ts(0, 0, 0), 5.0), (ts(0, 1, 0), 15.0), (ts(0, 2, 0), 10.0)]);
        assert_eq!(s.flux_bounds(), Some((5.0, 15.0)));
        assert_relative_eq!(s.mean_flux().unwrap(), 10.0);
    }

    #[test]
    fn empty_series_has_no_statistics() {
        let s = series(&[]);
        assert!(s.is_empty());
        assert!(s.flux_bounds().is_none());
        assert!(s.mean_flux().is_none());
        assert!(DateRange::from_series(&s).is_none());
    }

    #[test]
    fn default_range_spans_min_and_max_day() {
        let a = Utc.with_ymd_and_hms(2025, 5, 27, 23, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 5, 29, 1, 0, 0).unwrap();
        let s = series(&[(a, 1.0), (b, 2.0)]);
        let range = DateRange::from_series(&s).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 5, 27).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 5, 29).unwrap());
    }
}
