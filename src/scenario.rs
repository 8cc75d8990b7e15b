//! # Pre-Design Scenario
//!
//! Runs every model for one scenario and collects the fixed numbers handed to
//! the energy-system optimisation: digester dimensions and conversion factor,
//! per-timestep digester demand appended to the input series, plant growth
//! multipliers and the wetland result.

use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::error::{ModelError, ModelResult};
use crate::domain::types::{optional_column, timestamps, ClimateSample};
use crate::simulation::{
    calendar_daily_maxima, daily_maxima, forward_fill_daily, size_digester, ConstructedWetland,
    DigesterDemand, DigesterDesign, GrowthFactors, PlantGrowthModel, PlantParameters,
    WetlandResult,
};

/// Input row with the derived demand columns appended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedSample {
    #[serde(flatten)]
    pub sample: ClimateSample,
    pub heat_demand_digester: f64,
    pub electricity_demand_digester: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DigesterReport {
    pub design: DigesterDesign,
    /// Dimension table as key/value pairs
    pub dimensions: Vec<(&'static str, f64)>,
    /// Mean feed volumetric flow over the series (m³/d)
    pub average_volumetric_flow: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreDesignReport {
    pub digester: DigesterReport,
    pub series: Vec<ProcessedSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth: Option<GrowthFactors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wetland: Option<WetlandResult>,
}

/// Read a JSON array of climate samples.
pub fn load_samples(path: impl AsRef<Path>) -> anyhow::Result<Vec<ClimateSample>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read time series {}", path.display()))?;
    let samples: Vec<ClimateSample> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse time series {}", path.display()))?;
    info!(rows = samples.len(), path = %path.display(), "time series loaded");
    Ok(samples)
}

/// Evaluate all configured models for one scenario.
///
/// Optional columns are used when every row carries them and skipped when no
/// row does; a column present on only some rows fails the run.
pub fn run_pre_design(config: &Config, samples: &[ClimateSample]) -> ModelResult<PreDesignReport> {
    let digester = &config.digester;
    let mass_flows = optional_column(samples, "mass_flow", |s| s.mass_flow)?;

    let design_mass_flow = match (digester.design_mass_flow, &mass_flows) {
        (Some(flow), _) => flow,
        (None, Some(flows)) => flows.iter().copied().fold(f64::MIN, f64::max),
        (None, None) => return Err(ModelError::EmptySeries("mass_flow")),
    };

    let spec = digester.to_spec(design_mass_flow);
    let design = size_digester(digester.kind, &spec)?;
    info!(
        kind = %digester.kind,
        design_mass_flow,
        diameter = design.geometry.diameter,
        volume_total = design.geometry.volume_total,
        conversion_factor = design.conversion_factor.value(),
        "digester sized"
    );

    let average_volumetric_flow = mass_flows.as_ref().map(|flows| {
        let mean = flows.iter().sum::<f64>() / flows.len() as f64;
        24.0 * mean / (spec.sludge_density * spec.sludge_specific_gravity)
    });

    let series = match (&mass_flows, average_volumetric_flow) {
        (Some(flows), Some(average)) => {
            let demand = DigesterDemand::new(&design.geometry, config.demand.clone())?
                .with_average_volumetric_flow(average)?;
            let temperatures: Vec<f64> = samples.iter().map(|s| s.temperature).collect();
            let hourly = demand.evaluate_series(&temperatures, flows)?;
            samples
                .iter()
                .zip(hourly)
                .map(|(sample, d)| ProcessedSample {
                    sample: sample.clone(),
                    heat_demand_digester: d.heat_demand,
                    electricity_demand_digester: d.electricity_demand,
                })
                .collect()
        }
        _ => {
            debug!("no mass flow column, digester demand series skipped");
            Vec::new()
        }
    };

    let growth = match &config.plant {
        Some(params) if !samples.is_empty() => {
            Some(growth_factors(params.clone(), samples, config.io.steps_per_day)?)
        }
        _ => None,
    };

    let wetland = match &config.wetland {
        Some(section) => {
            let model = ConstructedWetland::new(section.design.clone())?;
            Some(model.compute(section.influent, section.effluent)?)
        }
        None => None,
    };

    let dimensions = design.dimension_table();
    Ok(PreDesignReport {
        digester: DigesterReport {
            design,
            dimensions,
            average_volumetric_flow,
        },
        series,
        growth,
        wetland,
    })
}

fn growth_factors(
    params: PlantParameters,
    samples: &[ClimateSample],
    steps_per_day: usize,
) -> ModelResult<GrowthFactors> {
    let model = PlantGrowthModel::new(params)?;
    let temperatures: Vec<f64> = samples.iter().map(|s| s.temperature).collect();

    let t_max = match optional_column(samples, "t_max", |s| s.t_max)? {
        Some(t_max) => t_max,
        None => match timestamps(samples)? {
            Some(stamps) => calendar_daily_maxima(&stamps, &temperatures)?,
            None => {
                // untimed series are taken to start at midnight
                let daily = daily_maxima(&temperatures, steps_per_day)?;
                let mut filled = forward_fill_daily(&daily, steps_per_day)?;
                filled.truncate(temperatures.len());
                filled
            }
        },
    };

    let et_o = optional_column(samples, "et_o", |s| s.et_o)?;
    let vwc = optional_column(samples, "vwc", |s| s.vwc)?;
    let aridity = match (et_o, vwc) {
        (Some(et_o), Some(vwc)) => model.aridity_effect(&et_o, &vwc)?,
        (Some(_), None) => return Err(ModelError::MissingColumn("vwc")),
        (None, Some(_)) => return Err(ModelError::MissingColumn("et_o")),
        (None, None) => {
            debug!("no et_o/vwc columns, aridity effect skipped");
            Vec::new()
        }
    };

    Ok(GrowthFactors {
        temperature: model.rue_temperature_effect(&temperatures)?,
        heat_stress: model.heat_stress_effect(&t_max)?,
        aridity,
    })
}
