use std::io::{Cursor, Read, Seek};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ndarray::{ArrayD, Axis, Ix2};

use super::cdf::{epoch_to_datetime, CdfReader, FileFormatError, Result};
use super::model::SampleSeries;

// Fixed variable names of the SWIS-ASPEX L2 product.
pub const VAR_EPOCH: &str = "epoch_for_cdf_mod";
pub const VAR_FLUX: &str = "integrated_flux_mod";
pub const VAR_UNCERTAINTY: &str = "flux_uncer";
pub const VAR_ENERGY: &str = "energy_center_mod";

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

/// Where the CDF bytes come from: a filesystem path or an already-uploaded
/// in-memory buffer.
#[derive(Debug, Clone)]
pub enum DataSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

// ---------------------------------------------------------------------------
// Raw extraction
// ---------------------------------------------------------------------------

/// The four arrays exactly as read from the container, before reduction.
/// Owned only for the duration of one load; discarded after reduction except
/// for `energy`, which the series retains for display.
struct RawMeasurementSet {
    time_raw: ArrayD<f64>,
    flux: ArrayD<f64>,
    uncertainty: ArrayD<f64>,
    energy: ArrayD<f64>,
}

impl RawMeasurementSet {
    /// Leading-dimension invariant: every time-indexed array has N rows, and
    /// the energy axis matches the flux channel count when flux is 2-D.
    fn validate(&self) -> Result<()> {
        if self.time_raw.ndim() != 1 {
            return Err(shape_err(VAR_EPOCH, format!("expected 1-D, got {}-D", self.time_raw.ndim())));
        }
        if self.energy.ndim() != 1 {
            return Err(shape_err(VAR_ENERGY, format!("expected 1-D, got {}-D", self.energy.ndim())));
        }
        let n = self.time_raw.len();
        for (name, arr) in [(VAR_FLUX, &self.flux), (VAR_UNCERTAINTY, &self.uncertainty)] {
            let rows = arr.shape().first().copied().unwrap_or(0);
            if rows != n {
                return Err(shape_err(
                    name,
                    format!("{rows} records do not match the {n}-record time axis"),
                ));
            }
        }
        if self.flux.ndim() == 2 && self.flux.shape()[1] != self.energy.len() {
            return Err(shape_err(
                VAR_FLUX,
                format!(
                    "{} channels do not match the {}-channel energy axis",
                    self.flux.shape()[1],
                    self.energy.len()
                ),
            ));
        }
        Ok(())
    }
}

fn shape_err(name: &str, detail: String) -> FileFormatError {
    FileFormatError::ShapeMismatch {
        name: name.to_string(),
        detail,
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Run the load → reduce → table-build pipeline once.
///
/// Pure with respect to its input: no caching, no retries. Any container or
/// shape problem aborts with a [`FileFormatError`]; the caller decides how to
/// surface it (and may memoize by source identity if reloads get expensive).
pub fn load_and_reduce(source: &DataSource) -> Result<SampleSeries> {
    let series = match source {
        DataSource::Path(path) => {
            let mut cdf = CdfReader::open(path)?;
            extract(&mut cdf)?
        }
        DataSource::Bytes(bytes) => {
            let mut cdf = CdfReader::new(Cursor::new(bytes.as_slice()))?;
            extract(&mut cdf)?
        }
    };
    log::info!(
        "loaded {} samples across {} energy channels",
        series.len(),
        series.energy.len()
    );
    Ok(series)
}

fn extract<R: Read + Seek>(cdf: &mut CdfReader<R>) -> Result<SampleSeries> {
    let raw = RawMeasurementSet {
        time_raw: cdf.varget(VAR_EPOCH)?,
        flux: cdf.varget(VAR_FLUX)?,
        uncertainty: cdf.varget(VAR_UNCERTAINTY)?,
        energy: cdf.varget(VAR_ENERGY)?,
    };
    raw.validate()?;

    let timestamps = decode_epochs(&raw.time_raw)?;
    let flux = reduce_channels(&raw.flux, VAR_FLUX)?;
    let uncertainty = reduce_channels(&raw.uncertainty, VAR_UNCERTAINTY)?;
    let energy: Vec<f64> = raw.energy.iter().copied().collect();

    Ok(SampleSeries::from_columns(timestamps, flux, uncertainty, energy))
}

fn decode_epochs(time_raw: &ArrayD<f64>) -> Result<Vec<DateTime<Utc>>> {
    time_raw
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            epoch_to_datetime(value).ok_or(FileFormatError::InvalidEpoch { index, value })
        })
        .collect()
}

/// Collapse the energy-channel axis with an unweighted arithmetic mean.
/// 1-D inputs pass through unchanged. This is the only numerical transform in
/// the pipeline; per-channel detail is discarded.
fn reduce_channels(arr: &ArrayD<f64>, name: &str) -> Result<Vec<f64>> {
    match arr.ndim() {
        1 => Ok(arr.iter().copied().collect()),
        2 => {
            let matrix = arr
                .view()
                .into_dimensionality::<Ix2>()
                .map_err(|e| shape_err(name, e.to_string()))?;
            let reduced = matrix
                .mean_axis(Axis(1))
                .ok_or_else(|| shape_err(name, "cannot average zero channels".to_string()))?;
            Ok(reduced.to_vec())
        }
        n => Err(shape_err(name, format!("expected 1-D or 2-D, got {n}-D"))),
    }
}
