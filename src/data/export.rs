use std::io::Write;

use super::model::SampleSeries;

/// Suggested name for the downloaded spike report.
pub const SPIKE_REPORT_FILENAME: &str = "cme_spike_report.csv";

/// Write the flagged samples as UTF-8 CSV: a header row and one row per
/// spike, no index column. Timestamps serialize as RFC 3339.
pub fn write_spike_csv<W: Write>(
    writer: W,
    series: &SampleSeries,
    spikes: &[usize],
) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for &i in spikes {
        csv_writer.serialize(&series.samples[i])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render the spike report into an owned buffer, for save dialogs that want
/// the whole payload up front.
pub fn spike_csv_bytes(series: &SampleSeries, spikes: &[usize]) -> csv::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_spike_csv(&mut buf, series, spikes)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_series() -> SampleSeries {
        SampleSeries::from_columns(
            vec![
                Utc.with_ymd_and_hms(2025, 5, 27, 6, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 5, 27, 6, 1, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 5, 27, 6, 2, 0).unwrap(),
            ],
            vec![5.0, 15.0, 8.0],
            vec![0.5, 1.5, 0.8],
            vec![100.0],
        )
    }

    #[test]
    fn report_has_header_and_one_row_per_spike() {
        let series = sample_series();
        let bytes = spike_csv_bytes(&series, &[1]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "timestamp,flux,uncertainty,time_delta_seconds");
        assert!(lines[1].starts_with("2025-05-27T06:01:00"));
        assert!(lines[1].ends_with("15.0,1.5,60.0"));
    }

    #[test]
    fn empty_spike_set_produces_an_empty_report() {
        let series = sample_series();
        let bytes = spike_csv_bytes(&series, &[]).unwrap();
        // serde-driven headers are only emitted once a row is written
        assert!(bytes.is_empty());
    }
}
