use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::simulation::{
    DemandConfig, DigesterDesignSpec, DigesterKind, PlantParameters, WetlandConfig, YieldModel,
};

/// One pre-design scenario
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub digester: DigesterSection,
    #[serde(default)]
    pub demand: DemandConfig,
    #[serde(default)]
    pub plant: Option<PlantParameters>,
    #[serde(default)]
    #[validate(nested)]
    pub wetland: Option<WetlandSection>,
    #[serde(default)]
    #[validate(nested)]
    pub io: IoConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DigesterSection {
    pub kind: DigesterKind,
    #[validate(range(min = 0.1, max = 365.0))]
    pub retention_time: f64,
    /// Design feed mass flow (kg/h); the series maximum when unset
    #[validate(range(min = 0.0))]
    pub design_mass_flow: Option<f64>,
    #[serde(default = "default_sludge_density")]
    #[validate(range(min = 1.0))]
    pub sludge_density: f64,
    #[serde(default = "default_specific_gravity")]
    #[validate(range(min = 0.1, max = 10.0))]
    pub sludge_specific_gravity: f64,
    #[serde(default = "default_dry_solid")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub dry_solid_concentration: f64,
    #[serde(default = "default_volatile_solid")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub volatile_solid_concentration: f64,
    pub yield_model: YieldModel,
}

fn default_sludge_density() -> f64 {
    997.0
}

fn default_specific_gravity() -> f64 {
    1.02
}

fn default_dry_solid() -> f64 {
    0.2
}

fn default_volatile_solid() -> f64 {
    0.8
}

impl DigesterSection {
    pub fn to_spec(&self, design_mass_flow: f64) -> DigesterDesignSpec {
        DigesterDesignSpec {
            retention_time: self.retention_time,
            design_mass_flow,
            sludge_density: self.sludge_density,
            sludge_specific_gravity: self.sludge_specific_gravity,
            dry_solid_concentration: self.dry_solid_concentration,
            volatile_solid_concentration: self.volatile_solid_concentration,
            yield_model: self.yield_model,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WetlandSection {
    /// Hourly influent discharge (m³/h)
    #[validate(range(min = 0.0))]
    pub influent: f64,
    /// Hourly effluent discharge (m³/h)
    #[validate(range(min = 0.0))]
    pub effluent: f64,
    #[serde(default)]
    #[validate(nested)]
    pub design: WetlandConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct IoConfig {
    /// JSON array of climate samples
    pub timeseries: Option<PathBuf>,
    /// Report destination; stdout when unset
    pub report: Option<PathBuf>,
    /// Timesteps per day of the series, used to derive daily maxima
    #[validate(range(min = 1, max = 1440))]
    pub steps_per_day: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            timeseries: None,
            report: None,
            steps_per_day: 24,
        }
    }
}

impl Config {
    /// Load a scenario file, overlaid with `OWEFE__SECTION__KEY` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("OWEFE__").split("__"));
        let config: Config = figment
            .extract()
            .with_context(|| format!("failed to load scenario from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid scenario in {}", path.display()))?;
        Ok(config)
    }
}
