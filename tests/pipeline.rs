//! End-to-end pipeline scenarios: CDF bytes in, filtered/flagged rows and a
//! CSV report out.

use approx::assert_relative_eq;
use chrono::{NaiveDate, TimeZone, Utc};

use cme_explorer::data::cdf::{datetime_to_epoch, CdfBuilder, FileFormatError};
use cme_explorer::data::export::spike_csv_bytes;
use cme_explorer::data::filter::{filtered_indices, spike_indices};
use cme_explorer::data::loader::{
    load_and_reduce, DataSource, VAR_ENERGY, VAR_EPOCH, VAR_FLUX, VAR_UNCERTAINTY,
};
use cme_explorer::data::model::DateRange;

fn epoch(day: u32, hour: u32) -> f64 {
    datetime_to_epoch(Utc.with_ymd_and_hms(2025, 5, day, hour, 0, 0).unwrap())
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
}

/// Three scalar samples on one day: 5, 15, 8.
fn scalar_file() -> Vec<u8> {
    CdfBuilder::new()
        .epoch(VAR_EPOCH, &[epoch(27, 1), epoch(27, 2), epoch(27, 3)])
        .series(VAR_FLUX, &[5.0, 15.0, 8.0])
        .series(VAR_UNCERTAINTY, &[0.5, 1.5, 0.8])
        .fixed(VAR_ENERGY, &[110.0, 160.0])
        .build()
}

#[test]
fn threshold_crossing_flags_exactly_the_spike_sample() {
    let series = load_and_reduce(&DataSource::Bytes(scalar_file())).unwrap();
    let range = DateRange::from_series(&series).unwrap();
    let visible = filtered_indices(&series, &range);
    let spikes = spike_indices(&series, &visible, 10.0);

    assert_eq!(spikes.len(), 1);
    let spike = &series.samples[spikes[0]];
    assert_relative_eq!(spike.flux, 15.0);
    assert_eq!(spike.timestamp, Utc.with_ymd_and_hms(2025, 5, 27, 2, 0, 0).unwrap());
}

#[test]
fn channel_resolved_flux_reduces_to_the_channel_mean() {
    let bytes = CdfBuilder::new()
        .epoch(VAR_EPOCH, &[epoch(27, 1), epoch(27, 2)])
        .channels(VAR_FLUX, 2, 2, &[2.0, 4.0, 6.0, 10.0])
        .channels(VAR_UNCERTAINTY, 2, 2, &[0.2, 0.4, 0.6, 1.0])
        .fixed(VAR_ENERGY, &[110.0, 160.0])
        .build();
    let series = load_and_reduce(&DataSource::Bytes(bytes)).unwrap();
    let reduced: Vec<f64> = series.samples.iter().map(|s| s.flux).collect();
    assert_eq!(reduced, vec![3.0, 7.0]);
}

#[test]
fn default_threshold_from_full_series_with_range_excluding_the_events() {
    // Spike-heavy day 26, quiet day 27. The mean (and thus the default
    // threshold) includes day 26 even when the range hides it.
    let bytes = CdfBuilder::new()
        .epoch(VAR_EPOCH, &[epoch(26, 1), epoch(26, 2), epoch(27, 1), epoch(27, 2)])
        .series(VAR_FLUX, &[90.0, 110.0, 1.0, 3.0])
        .series(VAR_UNCERTAINTY, &[9.0, 11.0, 0.1, 0.3])
        .fixed(VAR_ENERGY, &[110.0])
        .build();
    let series = load_and_reduce(&DataSource::Bytes(bytes)).unwrap();

    let threshold = series.mean_flux().unwrap();
    assert_relative_eq!(threshold, 51.0);

    let narrow = DateRange { start: day(27), end: day(27) };
    let visible = filtered_indices(&series, &narrow);
    assert_eq!(visible, vec![2, 3]);
    assert!(spike_indices(&series, &visible, threshold).is_empty());

    // The full default range still flags the day-26 events.
    let full = DateRange::from_series(&series).unwrap();
    let all_visible = filtered_indices(&series, &full);
    assert_eq!(spike_indices(&series, &all_visible, threshold), vec![0, 1]);
}

#[test]
fn missing_variable_fails_before_any_view_is_built() {
    let bytes = CdfBuilder::new()
        .epoch(VAR_EPOCH, &[epoch(27, 1)])
        .series(VAR_FLUX, &[5.0])
        .fixed(VAR_ENERGY, &[110.0])
        .build();
    let err = load_and_reduce(&DataSource::Bytes(bytes)).unwrap_err();
    assert!(matches!(err, FileFormatError::VariableNotFound(ref n) if n == VAR_UNCERTAINTY));
}

#[test]
fn spike_report_contains_the_flagged_rows_only() {
    let series = load_and_reduce(&DataSource::Bytes(scalar_file())).unwrap();
    let range = DateRange::from_series(&series).unwrap();
    let visible = filtered_indices(&series, &range);
    let spikes = spike_indices(&series, &visible, 10.0);

    let csv = String::from_utf8(spike_csv_bytes(&series, &spikes).unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "timestamp,flux,uncertainty,time_delta_seconds");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("15.0"));
    assert!(!csv.contains("5.0,0.5"));
}

#[test]
fn filter_is_idempotent_over_the_same_range() {
    let series = load_and_reduce(&DataSource::Bytes(scalar_file())).unwrap();
    let range = DateRange { start: day(27), end: day(28) };
    let first = filtered_indices(&series, &range);
    let second: Vec<usize> = filtered_indices(&series, &range);
    assert_eq!(first, second);
    assert_eq!(first, vec![0, 1, 2]);
}
