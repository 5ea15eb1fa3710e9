use cme_explorer::data::filter::{filtered_indices, spike_indices};
use cme_explorer::data::model::{DateRange, SampleSeries};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded series (None until a file is opened).
    pub series: Option<SampleSeries>,

    /// Name of the loaded file, shown in the top bar.
    pub source_name: Option<String>,

    /// Active inclusive date range; defaults to the series' own span.
    pub range: Option<DateRange>,

    /// Active flux threshold; defaults to the full-series mean.
    pub threshold: f64,

    /// Indices of samples inside the date range (recomputed per interaction).
    pub visible_indices: Vec<usize>,

    /// Indices of visible samples whose flux exceeds the threshold.
    pub spike_indices: Vec<usize>,

    /// Display toggles.
    pub show_filtered_table: bool,
    pub show_uncertainty: bool,
    pub show_energy: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            series: None,
            source_name: None,
            range: None,
            threshold: 0.0,
            visible_indices: Vec::new(),
            spike_indices: Vec::new(),
            show_filtered_table: false,
            show_uncertainty: false,
            show_energy: false,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded series; derive the default range and threshold.
    pub fn set_series(&mut self, series: SampleSeries, source_name: String) {
        self.range = DateRange::from_series(&series);
        self.threshold = series.mean_flux().unwrap_or(0.0);
        self.series = Some(series);
        self.source_name = Some(source_name);
        self.status_message = None;
        self.refilter();
    }

    /// Slider bounds: min/max flux of the FULL series, independent of the
    /// active date range.
    pub fn threshold_bounds(&self) -> Option<(f64, f64)> {
        self.series.as_ref().and_then(|s| s.flux_bounds())
    }

    /// Re-run the filter and detector stages. Called after every control
    /// change; both projections are recomputed from scratch, nothing is
    /// cached across interactions.
    pub fn refilter(&mut self) {
        let Some(series) = &self.series else {
            self.visible_indices.clear();
            self.spike_indices.clear();
            return;
        };
        self.visible_indices = match &self.range {
            Some(range) => filtered_indices(series, range),
            None => (0..series.len()).collect(),
        };
        self.spike_indices = spike_indices(series, &self.visible_indices, self.threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeZone, Utc};
    use cme_explorer::data::model::SampleSeries;

    fn loaded_state() -> AppState {
        let series = SampleSeries::from_columns(
            vec![
                Utc.with_ymd_and_hms(2025, 5, 26, 12, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 5, 27, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 5, 28, 0, 0, 0).unwrap(),
            ],
            vec![5.0, 15.0, 10.0],
            vec![0.5, 1.5, 1.0],
            vec![100.0],
        );
        let mut state = AppState::default();
        state.set_series(series, "sample.cdf".to_string());
        state
    }

    #[test]
    fn loading_derives_defaults_from_the_full_series() {
        let state = loaded_state();
        assert_relative_eq!(state.threshold, 10.0);
        assert_eq!(state.threshold_bounds(), Some((5.0, 15.0)));
        let range = state.range.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 5, 26).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 5, 28).unwrap());
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.spike_indices, vec![1]);
    }

    #[test]
    fn narrowing_the_range_recomputes_both_projections() {
        let mut state = loaded_state();
        state.range = Some(DateRange {
            start: NaiveDate::from_ymd_opt(2025, 5, 27).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 5, 28).unwrap(),
        });
        state.refilter();
        assert_eq!(state.visible_indices, vec![1, 2]);
        assert_eq!(state.spike_indices, vec![1]);
        // Threshold bounds still come from the full series.
        assert_eq!(state.threshold_bounds(), Some((5.0, 15.0)));
    }

    #[test]
    fn raising_the_threshold_can_empty_the_spike_set() {
        let mut state = loaded_state();
        state.threshold = 15.0;
        state.refilter();
        // Strict >: the 15.0 sample is on the boundary, not a spike.
        assert!(state.spike_indices.is_empty());
    }
}
