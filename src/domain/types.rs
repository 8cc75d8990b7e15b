use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::{ModelError, ModelResult};

// ============================================================================
// Climate samples
// ============================================================================

/// One row of a time-ordered climate/flow table.
///
/// Only `temperature` is required. Plant and digester models pick the
/// optional columns they need and fail when those are missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
    /// Ambient air temperature (°C)
    pub temperature: f64,
    /// Daily maximum temperature (°C), forward-filled to this resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_max: Option<f64>,
    /// Potential evapotranspiration (mm per timestep)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub et_o: Option<f64>,
    /// Volumetric water content of the root zone (m³/m³)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vwc: Option<f64>,
    /// Feedstock mass flow entering the digester (kg/h)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_flow: Option<f64>,
}

impl ClimateSample {
    pub fn new(temperature: f64) -> Self {
        Self {
            timestamp: None,
            temperature,
            t_max: None,
            et_o: None,
            vwc: None,
            mass_flow: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_t_max(mut self, t_max: f64) -> Self {
        self.t_max = Some(t_max);
        self
    }

    pub fn with_water(mut self, et_o: f64, vwc: f64) -> Self {
        self.et_o = Some(et_o);
        self.vwc = Some(vwc);
        self
    }

    pub fn with_mass_flow(mut self, mass_flow: f64) -> Self {
        self.mass_flow = Some(mass_flow);
        self
    }
}

/// Extract one optional column from a sample table.
///
/// Fails with [`ModelError::MissingColumn`] if any row lacks it.
pub fn column(
    samples: &[ClimateSample],
    name: &'static str,
    pick: impl Fn(&ClimateSample) -> Option<f64>,
) -> ModelResult<Vec<f64>> {
    samples
        .iter()
        .map(|s| pick(s).ok_or(ModelError::MissingColumn(name)))
        .collect()
}

/// Like [`column`], but `None` when no row carries the column at all.
///
/// A column present on some rows and absent on others is malformed input and
/// fails with [`ModelError::MissingColumn`].
pub fn optional_column(
    samples: &[ClimateSample],
    name: &'static str,
    pick: impl Fn(&ClimateSample) -> Option<f64>,
) -> ModelResult<Option<Vec<f64>>> {
    if samples.iter().all(|s| pick(s).is_none()) {
        return Ok(None);
    }
    column(samples, name, &pick).map(Some)
}

/// Sample timestamps, `None` when the table carries none.
pub fn timestamps(samples: &[ClimateSample]) -> ModelResult<Option<Vec<NaiveDateTime>>> {
    if samples.iter().all(|s| s.timestamp.is_none()) {
        return Ok(None);
    }
    samples
        .iter()
        .map(|s| s.timestamp.ok_or(ModelError::MissingColumn("timestamp")))
        .collect::<ModelResult<Vec<_>>>()
        .map(Some)
}

// ============================================================================
// Sequence arguments
// ============================================================================

/// Argument accepted by the growth-rate functions.
///
/// Values coming from loosely typed tables may arrive as a single number
/// where a series is expected. Such input is rejected rather than broadcast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesArg<'a> {
    Scalar(f64),
    Sequence(&'a [f64]),
}

impl<'a> SeriesArg<'a> {
    /// Borrow the sequence, or fail with [`ModelError::InvalidArgumentType`].
    pub fn as_sequence(&self, argument: &'static str) -> ModelResult<&'a [f64]> {
        match *self {
            SeriesArg::Sequence(values) => Ok(values),
            SeriesArg::Scalar(_) => Err(ModelError::InvalidArgumentType { argument }),
        }
    }
}

impl From<f64> for SeriesArg<'_> {
    fn from(value: f64) -> Self {
        SeriesArg::Scalar(value)
    }
}

impl<'a> From<&'a [f64]> for SeriesArg<'a> {
    fn from(values: &'a [f64]) -> Self {
        SeriesArg::Sequence(values)
    }
}

impl<'a> From<&'a Vec<f64>> for SeriesArg<'a> {
    fn from(values: &'a Vec<f64>) -> Self {
        SeriesArg::Sequence(values.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for SeriesArg<'a> {
    fn from(values: &'a [f64; N]) -> Self {
        SeriesArg::Sequence(values.as_slice())
    }
}
