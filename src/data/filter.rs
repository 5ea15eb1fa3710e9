use chrono::{DateTime, NaiveTime, Utc};

use super::model::{DateRange, SampleSeries};

// ---------------------------------------------------------------------------
// Date-range filter
// ---------------------------------------------------------------------------

/// Return indices of samples inside the inclusive date range.
///
/// Both bounds are coerced to start-of-day UTC instants before comparing, so
/// a sample later in the end day falls outside the range. With `end < start`
/// the projection is empty, not an error. Linear scan, recomputed on every
/// range change.
pub fn filtered_indices(series: &SampleSeries, range: &DateRange) -> Vec<usize> {
    let start: DateTime<Utc> = range.start.and_time(NaiveTime::MIN).and_utc();
    let end: DateTime<Utc> = range.end.and_time(NaiveTime::MIN).and_utc();

    series
        .samples
        .iter()
        .enumerate()
        .filter(|(_, s)| s.timestamp >= start && s.timestamp <= end)
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Spike detector
// ---------------------------------------------------------------------------

/// Return the subset of `visible` whose flux STRICTLY exceeds the threshold.
/// A sample with `flux == threshold` is never a spike.
///
/// The threshold's bounds and default come from the full unfiltered series
/// ([`SampleSeries::flux_bounds`] / [`SampleSeries::mean_flux`]) while the
/// detector only sees the filtered view, so an empty result is a normal
/// outcome when the active range excludes the motivating events.
pub fn spike_indices(series: &SampleSeries, visible: &[usize], threshold: f64) -> Vec<usize> {
    visible
        .iter()
        .copied()
        .filter(|&i| series.samples[i].flux > threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, day, hour, 0, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn series(rows: &[(DateTime<Utc>, f64)]) -> SampleSeries {
        SampleSeries::from_columns(
            rows.iter().map(|r| r.0).collect(),
            rows.iter().map(|r| r.1).collect(),
            vec![0.1; rows.len()],
            vec![100.0],
        )
    }

    #[test]
    fn range_bounds_are_start_of_day_inclusive() {
        let s = series(&[
            (ts(26, 23), 1.0),
            (ts(27, 0), 2.0),
            (ts(27, 6), 3.0),
            (ts(28, 0), 4.0),
        ]);
        let range = DateRange { start: day(27), end: day(28) };
        // Midnight of the end day is in range; later that day would not be.
        assert_eq!(filtered_indices(&s, &range), vec![1, 2, 3]);
    }

    #[test]
    fn samples_after_midnight_of_the_end_day_are_excluded() {
        let s = series(&[(ts(27, 0), 1.0), (ts(27, 6), 2.0)]);
        let range = DateRange { start: day(27), end: day(27) };
        assert_eq!(filtered_indices(&s, &range), vec![0]);
    }

    #[test]
    fn inverted_range_yields_an_empty_view() {
        let s = series(&[(ts(27, 0), 1.0), (ts(28, 0), 2.0)]);
        let range = DateRange { start: day(28), end: day(27) };
        assert!(filtered_indices(&s, &range).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let s = series(&[(ts(26, 12), 1.0), (ts(27, 3), 2.0), (ts(28, 9), 3.0)]);
        let range = DateRange { start: day(26), end: day(28) };
        let once = filtered_indices(&s, &range);
        let again: Vec<usize> = {
            let narrowed = series(
                &once
                    .iter()
                    .map(|&i| (s.samples[i].timestamp, s.samples[i].flux))
                    .collect::<Vec<_>>(),
            );
            filtered_indices(&narrowed, &range)
        };
        assert_eq!(again.len(), once.len());
    }

    #[test]
    fn spike_detection_uses_strict_inequality() {
        let s = series(&[(ts(27, 0), 5.0), (ts(27, 1), 10.0), (ts(27, 2), 15.0)]);
        let all: Vec<usize> = (0..s.len()).collect();
        // flux == threshold is not a spike
        assert_eq!(spike_indices(&s, &all, 10.0), vec![2]);
    }

    #[test]
    fn threshold_crossing_flags_the_expected_sample() {
        let s = series(&[(ts(27, 0), 5.0), (ts(27, 1), 15.0), (ts(27, 2), 8.0)]);
        let visible = filtered_indices(&s, &DateRange { start: day(27), end: day(28) });
        let spikes = spike_indices(&s, &visible, 10.0);
        assert_eq!(spikes, vec![1]);
        assert_eq!(s.samples[spikes[0]].flux, 15.0);
    }

    #[test]
    fn narrow_range_can_empty_the_spike_set() {
        // Default threshold derives from the full series, spikes included.
        let s = series(&[(ts(26, 1), 100.0), (ts(27, 1), 1.0), (ts(27, 2), 2.0)]);
        let threshold = s.mean_flux().unwrap();
        let visible = filtered_indices(&s, &DateRange { start: day(27), end: day(27) });
        assert_eq!(visible, vec![1, 2]);
        assert!(spike_indices(&s, &visible, threshold).is_empty());
    }

    #[test]
    fn detector_only_sees_the_filtered_view() {
        let s = series(&[(ts(26, 1), 20.0), (ts(27, 1), 30.0)]);
        let visible = vec![1];
        assert_eq!(spike_indices(&s, &visible, 10.0), vec![1]);
    }
}
