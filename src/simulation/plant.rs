//! # Plant Growth Rate Multipliers
//!
//! Dimensionless multipliers on a base biomass accumulation rate:
//!
//! - temperature effect (piecewise linear between base and optimum temperature)
//! - heat-stress effect (driven by the daily maximum temperature)
//! - aridity effect (water supply from the root zone versus potential
//!   evapotranspiration, after Woli et al. 2012)
//!
//! The multipliers are returned separately. Combining them is left to the
//! caller assembling the energy system.

use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::error::{ModelError, ModelResult};
use crate::domain::types::SeriesArg;

/// Wh -> MJ
pub const WH_TO_MJ: f64 = 3.6e-3;

/// Daily plant-available water per unit VWC and root zone depth, per hour
const WATER_UPTAKE_PER_HOUR: f64 = 0.096 / 24.0;

/// Shape of the heat-stress multiplier between `t_heat` and `t_ext`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatStressRamp {
    /// `(t_max - t_heat) / (t_ext - t_heat)`
    #[default]
    Rising,
    /// `1 - (t_max - t_heat) / (t_ext - t_heat)`
    Declining,
}

/// Crop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantParameters {
    /// Base temperature for growth (°C)
    pub t_base: f64,
    /// Optimum temperature for growth (°C)
    pub t_opt: f64,
    /// Radiation use efficiency (g biomass / MJ)
    pub rue: f64,
    /// Heat-stress onset temperature (°C)
    pub t_heat: f64,
    /// Extreme temperature, growth stops above (°C)
    pub t_ext: f64,
    /// Water-stress sensitivity (0-1)
    pub s_water: f64,
    /// Root zone depth (mm)
    #[serde(default = "default_root_zone_depth")]
    pub root_zone_depth: f64,
    #[serde(default)]
    pub heat_stress_ramp: HeatStressRamp,
}

fn default_root_zone_depth() -> f64 {
    1000.0
}

impl PlantParameters {
    /// C4 test crop of the Hegelbach agrivoltaics site
    pub fn hegelbach() -> Self {
        Self {
            t_base: 0.0,
            t_opt: 15.0,
            rue: 1.24,
            t_heat: 34.0,
            t_ext: 45.0,
            s_water: 0.4,
            root_zone_depth: default_root_zone_depth(),
            heat_stress_ramp: HeatStressRamp::default(),
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if !(self.t_opt > self.t_base) {
            return Err(ModelError::non_physical(format!(
                "t_opt ({}) must exceed t_base ({})",
                self.t_opt, self.t_base
            )));
        }
        if !(self.t_ext > self.t_heat) {
            return Err(ModelError::non_physical(format!(
                "t_ext ({}) must exceed t_heat ({})",
                self.t_ext, self.t_heat
            )));
        }
        if !(0.0..=1.0).contains(&self.s_water) {
            return Err(ModelError::non_physical(format!(
                "s_water must lie in [0, 1], got {}",
                self.s_water
            )));
        }
        if !(self.rue.is_finite() && self.rue >= 0.0) {
            return Err(ModelError::non_physical("rue must be non-negative"));
        }
        if !(self.root_zone_depth.is_finite() && self.root_zone_depth > 0.0) {
            return Err(ModelError::non_physical("root_zone_depth must be positive"));
        }
        Ok(())
    }
}

/// Growth-rate multipliers for one climate series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthFactors {
    pub temperature: Vec<f64>,
    pub heat_stress: Vec<f64>,
    pub aridity: Vec<f64>,
}

/// Growth model bound to one set of crop parameters
#[derive(Debug, Clone)]
pub struct PlantGrowthModel {
    params: PlantParameters,
}

impl PlantGrowthModel {
    pub fn new(params: PlantParameters) -> ModelResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PlantParameters {
        &self.params
    }

    fn te(&self, t: f64) -> f64 {
        let p = &self.params;
        if t < p.t_base {
            0.0
        } else if t <= p.t_opt {
            (t - p.t_base) / (p.t_opt - p.t_base)
        } else {
            1.0
        }
    }

    fn hi(&self, t_max: f64) -> f64 {
        let p = &self.params;
        if t_max <= p.t_heat {
            1.0
        } else if t_max <= p.t_ext {
            let ramp = (t_max - p.t_heat) / (p.t_ext - p.t_heat);
            match p.heat_stress_ramp {
                HeatStressRamp::Rising => ramp,
                HeatStressRamp::Declining => 1.0 - ramp,
            }
        } else {
            0.0
        }
    }

    fn arid(&self, et_o: f64, vwc: f64) -> f64 {
        let demand = et_o.abs();
        if demand == 0.0 {
            return 1.0;
        }
        let supply = WATER_UPTAKE_PER_HOUR * vwc * self.params.root_zone_depth;
        1.0 - self.params.s_water * (1.0 - demand.min(supply) / demand)
    }

    /// Temperature effect in [0, 1].
    pub fn temperature_effect<'a>(&self, t_air: impl Into<SeriesArg<'a>>) -> ModelResult<Vec<f64>> {
        let t_air = t_air.into().as_sequence("t_air")?;
        Ok(t_air.iter().map(|&t| self.te(t)).collect())
    }

    /// Temperature effect scaled by `rue * 0.0036`, giving biomass per Wh of radiation.
    pub fn rue_temperature_effect<'a>(
        &self,
        t_air: impl Into<SeriesArg<'a>>,
    ) -> ModelResult<Vec<f64>> {
        let scale = self.params.rue * WH_TO_MJ;
        let t_air = t_air.into().as_sequence("t_air")?;
        Ok(t_air.iter().map(|&t| self.te(t) * scale).collect())
    }

    /// Heat-stress effect in [0, 1] from daily maximum temperatures.
    pub fn heat_stress_effect<'a>(&self, t_max: impl Into<SeriesArg<'a>>) -> ModelResult<Vec<f64>> {
        let t_max = t_max.into().as_sequence("t_max")?;
        Ok(t_max.iter().map(|&t| self.hi(t)).collect())
    }

    /// Aridity effect in (0, 1], one value per timestep.
    pub fn aridity_effect<'a, 'b>(
        &self,
        et_o: impl Into<SeriesArg<'a>>,
        vwc: impl Into<SeriesArg<'b>>,
    ) -> ModelResult<Vec<f64>> {
        let et_o = et_o.into().as_sequence("et_o")?;
        let vwc = vwc.into().as_sequence("vwc")?;
        if et_o.len() != vwc.len() {
            return Err(ModelError::SeriesLengthMismatch {
                left: et_o.len(),
                right: vwc.len(),
            });
        }
        Ok(et_o
            .iter()
            .zip_eq(vwc)
            .map(|(&e, &m)| self.arid(e, m))
            .collect())
    }
}

/// Daily maxima of a sub-daily series in fixed groups of `steps_per_day`.
///
/// The series must start at midnight; otherwise each group straddles two
/// calendar days. A trailing partial day forms its own group. Prefer
/// [`calendar_daily_maxima`] when timestamps are known.
pub fn daily_maxima(values: &[f64], steps_per_day: usize) -> ModelResult<Vec<f64>> {
    if steps_per_day == 0 {
        return Err(ModelError::non_physical("steps_per_day must be positive"));
    }
    if values.is_empty() {
        return Err(ModelError::EmptySeries("values"));
    }
    Ok(values
        .chunks(steps_per_day)
        .map(|day| day.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .collect())
}

/// Maximum of each calendar day, repeated on every timestep of that day.
///
/// Consecutive samples sharing a date form one day, so the series may start
/// and end at any time of day.
pub fn calendar_daily_maxima(
    timestamps: &[NaiveDateTime],
    values: &[f64],
) -> ModelResult<Vec<f64>> {
    if timestamps.len() != values.len() {
        return Err(ModelError::SeriesLengthMismatch {
            left: timestamps.len(),
            right: values.len(),
        });
    }
    if values.is_empty() {
        return Err(ModelError::EmptySeries("values"));
    }

    let mut filled = Vec::with_capacity(values.len());
    let days = timestamps
        .iter()
        .zip_eq(values)
        .chunk_by(|&(ts, _)| ts.date());
    for (_, day) in &days {
        let day: Vec<f64> = day.map(|(_, &v)| v).collect();
        let max = day.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        filled.extend(std::iter::repeat(max).take(day.len()));
    }
    Ok(filled)
}

/// Repeat each daily value `steps_per_day` times (forward fill).
pub fn forward_fill_daily(daily: &[f64], steps_per_day: usize) -> ModelResult<Vec<f64>> {
    if steps_per_day == 0 {
        return Err(ModelError::non_physical("steps_per_day must be positive"));
    }
    Ok(daily
        .iter()
        .flat_map(|&v| std::iter::repeat(v).take(steps_per_day))
        .collect())
}
