/// Data layer: CDF parsing, reduction, filtering, and export.
///
/// Architecture:
/// ```text
///  .cdf (path or uploaded bytes)
///        │
///        ▼
///   ┌──────────┐
///   │   cdf     │  parse container → named f64 arrays
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  epoch → timestamps, channel mean → SampleSeries
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date range + spike threshold → index projections
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  spike rows → cme_spike_report.csv
///   └──────────┘
/// ```
///
/// The whole pipeline is synchronous and pure; the UI re-runs the filter and
/// detector stages on every interaction and never mutates the series.

pub mod cdf;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
