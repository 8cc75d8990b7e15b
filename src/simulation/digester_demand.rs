//! # Digester Energy Demand
//!
//! Per-timestep heat and electricity demand of an anaerobic digester held at
//! a fixed internal temperature. Each timestep is evaluated independently;
//! no state carries across samples.
//!
//! Heat demand is the sensible heating of the incoming feed to digester
//! temperature plus conductive loss through the digester envelope.
//! Electricity demand is mixer power plus feed pump power.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::digester::DigesterGeometry;
use crate::domain::error::{require_positive, ModelError, ModelResult};

/// J -> kWh
const J_TO_KWH: f64 = 1.0 / 3_600_000.0;
/// Wh -> kWh
const WH_TO_KWH: f64 = 1.0 / 1000.0;

/// Mixer power per m³ of digester content (kW/m³)
pub const MIXING_POWER_KW_PER_M3: f64 = 0.0079;
/// Feed pump energy per kg of feed (kWh/kg)
pub const PUMPING_KWH_PER_KG: f64 = 0.0283;
/// Feed pump energy per kg of feed used by the later model revision (kWh/kg)
pub const PUMPING_KWH_PER_KG_REVISED: f64 = 0.02815;
/// Constant pump power per m³/d of average daily volumetric flow (kW)
pub const PUMPING_KW_PER_M3_DAY: f64 = 1.2;

/// Volume the mixer power is proportional to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixingBasis {
    /// Sludge volume at constant filling level
    FilledVolume,
    /// Whole digester volume
    TotalVolume,
}

/// What the feed pump energy is proportional to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum PumpingBasis {
    /// Instantaneous feed mass flow
    MassFlow { kwh_per_kg: f64 },
    /// Design average daily volumetric flow, pumped at constant power
    DailyVolumetricFlow { kw_per_m3_day: f64 },
}

impl Default for PumpingBasis {
    fn default() -> Self {
        PumpingBasis::MassFlow {
            kwh_per_kg: PUMPING_KWH_PER_KG,
        }
    }
}

/// Operating parameters of the demand model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandConfig {
    /// Internal digester temperature (°C)
    pub t_digester: f64,
    /// Envelope heat transfer coefficient (W/(m² K))
    pub heat_transfer_coefficient: f64,
    /// Feedstock heat capacity (J/(kg K)); dewatered sludge is taken as water
    pub heat_capacity: f64,
    /// Mixer power (kW/m³)
    pub mixing_power_per_m3: f64,
    pub mixing_basis: MixingBasis,
    pub pumping: PumpingBasis,
    /// Report zero instead of a negative heat demand when the ambient is
    /// warmer than the digester
    pub clamp_negative_heat: bool,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            t_digester: 35.0,
            heat_transfer_coefficient: 0.6,
            heat_capacity: 4200.0,
            mixing_power_per_m3: MIXING_POWER_KW_PER_M3,
            mixing_basis: MixingBasis::FilledVolume,
            pumping: PumpingBasis::default(),
            clamp_negative_heat: false,
        }
    }
}

/// Demand for one timestep (kWh per hour)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandSample {
    pub heat_demand: f64,
    pub electricity_demand: f64,
}

/// Heat and electricity demand of a sized digester
#[derive(Debug, Clone)]
pub struct DigesterDemand {
    config: DemandConfig,
    surface_area_total: f64,
    mixing_volume: f64,
    /// Average daily volumetric flow (m³/d) pumped at constant power
    average_volumetric_flow: f64,
}

impl DigesterDemand {
    pub fn new(geometry: &DigesterGeometry, config: DemandConfig) -> ModelResult<Self> {
        require_positive("heat_transfer_coefficient", config.heat_transfer_coefficient)?;
        require_positive("heat_capacity", config.heat_capacity)?;
        if !config.t_digester.is_finite() {
            return Err(ModelError::non_physical("t_digester must be finite"));
        }
        if !(config.mixing_power_per_m3.is_finite() && config.mixing_power_per_m3 >= 0.0) {
            return Err(ModelError::non_physical(
                "mixing_power_per_m3 must be non-negative",
            ));
        }
        let pump_constant = match config.pumping {
            PumpingBasis::MassFlow { kwh_per_kg } => kwh_per_kg,
            PumpingBasis::DailyVolumetricFlow { kw_per_m3_day } => kw_per_m3_day,
        };
        if !(pump_constant.is_finite() && pump_constant >= 0.0) {
            return Err(ModelError::non_physical("pumping constant must be non-negative"));
        }

        let mixing_volume = match config.mixing_basis {
            MixingBasis::FilledVolume => geometry.filled_up_volume,
            MixingBasis::TotalVolume => geometry.volume_total,
        };

        Ok(Self {
            config,
            surface_area_total: geometry.surface_area_total,
            mixing_volume,
            average_volumetric_flow: geometry.volumetric_flow,
        })
    }

    /// Replace the design flow with the average daily volumetric flow (m³/d)
    /// of the operating series. Only the daily volumetric pumping basis uses it.
    pub fn with_average_volumetric_flow(mut self, flow: f64) -> ModelResult<Self> {
        if !(flow.is_finite() && flow >= 0.0) {
            return Err(ModelError::non_physical(format!(
                "average volumetric flow must be non-negative, got {flow}"
            )));
        }
        self.average_volumetric_flow = flow;
        Ok(self)
    }

    pub fn average_volumetric_flow(&self) -> f64 {
        self.average_volumetric_flow
    }

    pub fn config(&self) -> &DemandConfig {
        &self.config
    }

    /// Heat demand (kWh) for one hour at the given ambient temperature and feed flow (kg/h).
    ///
    /// Ambient temperatures above the digester temperature give a negative
    /// demand unless `clamp_negative_heat` is set.
    pub fn heat_demand(&self, t_ambient: f64, mass_flow: f64) -> f64 {
        let delta_t = self.config.t_digester - t_ambient;
        let heating = mass_flow * self.config.heat_capacity * delta_t * J_TO_KWH;
        let heat_loss =
            self.config.heat_transfer_coefficient * self.surface_area_total * delta_t * WH_TO_KWH;
        let demand = heating + heat_loss;
        if demand < 0.0 && self.config.clamp_negative_heat {
            debug!(t_ambient, demand, "ambient above digester temperature, heat demand clamped");
            return 0.0;
        }
        demand
    }

    /// Electricity demand (kWh) for one hour of operation at the given feed flow (kg/h).
    pub fn electricity_demand(&self, mass_flow: f64) -> f64 {
        let mixing = self.config.mixing_power_per_m3 * self.mixing_volume;
        let pumping = match self.config.pumping {
            PumpingBasis::MassFlow { kwh_per_kg } => kwh_per_kg * mass_flow,
            PumpingBasis::DailyVolumetricFlow { kw_per_m3_day } => {
                kw_per_m3_day * self.average_volumetric_flow
            }
        };
        mixing + pumping
    }

    pub fn evaluate(&self, t_ambient: f64, mass_flow: f64) -> ModelResult<DemandSample> {
        if !t_ambient.is_finite() {
            return Err(ModelError::non_physical(format!(
                "ambient temperature must be finite, got {t_ambient}"
            )));
        }
        if !(mass_flow.is_finite() && mass_flow >= 0.0) {
            return Err(ModelError::non_physical(format!(
                "mass flow must be non-negative, got {mass_flow}"
            )));
        }
        Ok(DemandSample {
            heat_demand: self.heat_demand(t_ambient, mass_flow),
            electricity_demand: self.electricity_demand(mass_flow),
        })
    }

    /// Evaluate every timestep of paired temperature and mass flow series.
    pub fn evaluate_series(
        &self,
        temperatures: &[f64],
        mass_flows: &[f64],
    ) -> ModelResult<Vec<DemandSample>> {
        if temperatures.len() != mass_flows.len() {
            return Err(ModelError::SeriesLengthMismatch {
                left: temperatures.len(),
                right: mass_flows.len(),
            });
        }
        temperatures
            .iter()
            .zip_eq(mass_flows)
            .map(|(&t, &m)| self.evaluate(t, m))
            .collect()
    }
}
