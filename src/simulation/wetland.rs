//! # Horizontal Subsurface Constructed Wetland
//!
//! Sizes a gravel-bed wetland treating digester effluent and estimates
//! effluent quality with first-order plug-flow kinetics (Reed et al. 1988).
//!
//! If the effluent COD exceeds the discharge limit, further identical
//! treatment stages are appended in series until the limit is met or
//! `max_stages` is reached.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::domain::error::{require_positive, ModelError, ModelResult};

/// Fixed design constants of the wetland
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WetlandConfig {
    /// Bed depth (m), usually 1-1.8 m
    #[validate(range(min = 0.01))]
    pub depth: f64,
    /// Bed porosity, 0.4 for 25 mm gravel
    #[validate(range(min = 0.01, max = 1.0))]
    pub porosity: f64,
    /// Water temperature (°C)
    #[validate(range(min = -10.0, max = 60.0))]
    pub temperature: f64,
    /// Hydraulic retention time (d)
    #[validate(range(min = 0.01))]
    pub hrt: f64,
    /// Influent COD (mg/L)
    #[validate(range(min = 0.0))]
    pub cod_influent: f64,
    /// Influent BOD:COD ratio
    #[validate(range(min = 0.0, max = 1.0))]
    pub bod_cod_ratio_influent: f64,
    /// Effluent COD:BOD ratio
    #[validate(range(min = 1.0))]
    pub cod_bod_ratio_effluent: f64,
    /// Influent nitrate (mg/L)
    #[validate(range(min = 0.0))]
    pub no3_influent: f64,
    /// Allowable effluent COD (mg/L)
    #[validate(range(min = 0.0))]
    pub cod_limit: f64,
    /// Upper bound on treatment stages in series
    #[validate(range(min = 1, max = 10))]
    pub max_stages: u32,
}

impl Default for WetlandConfig {
    fn default() -> Self {
        Self {
            depth: 0.6,
            porosity: 0.4,
            temperature: 35.0,
            hrt: 4.0,
            cod_influent: 1800.0,
            bod_cod_ratio_influent: 0.5,
            cod_bod_ratio_effluent: 2.0,
            no3_influent: 450.0,
            cod_limit: 250.0,
            max_stages: 2,
        }
    }
}

impl WetlandConfig {
    /// BOD first-order rate constant corrected to bed temperature (1/d)
    pub fn k1(&self) -> f64 {
        68.6 * self.porosity.powf(4.172) * 1.06_f64.powf(self.temperature - 20.0)
    }

    fn ensure_finite(&self) -> ModelResult<()> {
        let fields = [
            ("depth", self.depth),
            ("porosity", self.porosity),
            ("temperature", self.temperature),
            ("hrt", self.hrt),
            ("cod_influent", self.cod_influent),
            ("bod_cod_ratio_influent", self.bod_cod_ratio_influent),
            ("cod_bod_ratio_effluent", self.cod_bod_ratio_effluent),
            ("no3_influent", self.no3_influent),
            ("cod_limit", self.cod_limit),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, v)) => Err(ModelError::non_physical(format!(
                "wetland config: {name} must be finite, got {v}"
            ))),
            None => Ok(()),
        }
    }

    fn bod_influent(&self) -> f64 {
        self.cod_influent * self.bod_cod_ratio_influent
    }
}

/// Wetland sizing and effluent quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WetlandResult {
    /// m³/d
    pub avg_discharge: f64,
    /// Area of one stage (m²)
    pub cw_area: f64,
    /// mm/d
    pub net_evaporation: f64,
    /// mg/L
    pub bod_effluent: f64,
    /// mg/L
    pub cod_effluent: f64,
    /// mg/L
    pub no3_effluent: f64,
    /// Treatment stages in series
    pub stages: u32,
    /// Effluent COD within the limit after the last stage
    pub compliant: bool,
}

impl WetlandResult {
    /// Area of all stages together (m²)
    pub fn total_area(&self) -> f64 {
        self.cw_area * f64::from(self.stages)
    }
}

/// One plug-flow bed; attenuates BOD by a fixed factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreatmentStage {
    attenuation: f64,
}

impl TreatmentStage {
    pub fn attenuation(&self) -> f64 {
        self.attenuation
    }

    pub fn apply(&self, bod_in: f64) -> f64 {
        bod_in * self.attenuation
    }
}

/// Constructed wetland for one influent/effluent discharge pair
#[derive(Debug, Clone)]
pub struct ConstructedWetland {
    config: WetlandConfig,
}

impl ConstructedWetland {
    pub fn new(config: WetlandConfig) -> ModelResult<Self> {
        // range checks pass NaN
        config.ensure_finite()?;
        config
            .validate()
            .map_err(|e| ModelError::non_physical(format!("wetland config: {e}")))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WetlandConfig {
        &self.config
    }

    /// Size the wetland and estimate effluent quality.
    ///
    /// `influent` and `effluent` are hourly discharges (m³/h).
    pub fn compute(&self, influent: f64, effluent: f64) -> ModelResult<WetlandResult> {
        let c = &self.config;
        require_positive("influent", influent)?;
        if !(effluent.is_finite() && effluent >= 0.0 && effluent < influent) {
            return Err(ModelError::non_physical(format!(
                "effluent discharge must lie in [0, influent), got {effluent} for influent {influent}"
            )));
        }

        let influent = influent * 24.0;
        let effluent = effluent * 24.0;

        let avg_discharge = (influent - effluent) / 2.0;
        let cw_area = avg_discharge * c.hrt / (c.porosity * c.depth);
        let net_evaporation = (influent - effluent) / (0.001 * cw_area);

        // plug-flow travel time term
        let a1 = 2.0 * c.porosity * cw_area * c.depth;
        let a2 = 2.0 * influent - 0.001 * net_evaporation * cw_area;
        let stage = TreatmentStage {
            attenuation: (-c.k1() * (a1 / a2)).exp(),
        };

        let mut bod_effluent = stage.apply(c.bod_influent());
        let mut cod_effluent = bod_effluent * c.cod_bod_ratio_effluent;
        let mut stages = 1;

        while cod_effluent > c.cod_limit && stages < c.max_stages {
            warn!(
                cod_effluent,
                cod_limit = c.cod_limit,
                stage = stages,
                "effluent COD above limit, adding treatment stage"
            );
            bod_effluent = stage.apply(bod_effluent);
            cod_effluent = bod_effluent * c.cod_bod_ratio_effluent;
            stages += 1;
        }

        let compliant = cod_effluent <= c.cod_limit;
        if compliant {
            info!(cod_effluent, stages, "effluent COD within limit");
        } else {
            warn!(
                cod_effluent,
                cod_limit = c.cod_limit,
                stages,
                "effluent COD still above limit at stage limit"
            );
        }

        let no3_effluent =
            c.no3_influent * (-0.126 * 1.008_f64.powf(c.temperature - 20.0) * c.hrt).exp();

        Ok(WetlandResult {
            avg_discharge,
            cw_area,
            net_evaporation,
            bod_effluent,
            cod_effluent,
            no3_effluent,
            stages,
            compliant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn wetland(config: WetlandConfig) -> ConstructedWetland {
        ConstructedWetland::new(config).unwrap()
    }

    #[test]
    fn test_sizing_reference_values() {
        let result = wetland(WetlandConfig::default()).compute(2.0, 1.0).unwrap();

        // (48 - 24) / 2 m³/d
        assert_relative_eq!(result.avg_discharge, 12.0);
        // 12 * 4 / (0.4 * 0.6)
        assert_relative_eq!(result.cw_area, 200.0, epsilon = 1e-9);
        // 24 / (0.001 * 200)
        assert_relative_eq!(result.net_evaporation, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_first_stage_kinetics() {
        let config = WetlandConfig {
            cod_limit: 10_000.0,
            ..Default::default()
        };
        let k1 = config.k1();
        let result = wetland(config).compute(2.0, 1.0).unwrap();

        // a3 = 2 * 0.4 * 200 * 0.6 / (96 - 24)
        let a3 = 96.0 / 72.0;
        assert_relative_eq!(result.bod_effluent, 900.0 * (-k1 * a3).exp(), max_relative = 1e-12);
        assert_relative_eq!(result.cod_effluent, 2.0 * result.bod_effluent);
        assert_eq!(result.stages, 1);
        assert!(result.compliant);
    }

    #[test]
    fn test_k1_at_reference_temperature() {
        let config = WetlandConfig {
            temperature: 20.0,
            ..Default::default()
        };
        assert_relative_eq!(config.k1(), 68.6 * 0.4_f64.powf(4.172), max_relative = 1e-12);
    }

    #[test]
    fn test_nitrate_decay() {
        let result = wetland(WetlandConfig::default()).compute(2.0, 1.0).unwrap();
        let expected = 450.0 * (-0.126 * 1.008_f64.powf(15.0) * 4.0).exp();
        assert_relative_eq!(result.no3_effluent, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_second_stage_added_when_limit_exceeded() {
        // Short retention leaves COD above the limit after one bed
        let config = WetlandConfig {
            hrt: 0.5,
            cod_limit: 400.0,
            max_stages: 3,
            ..Default::default()
        };
        let single = wetland(WetlandConfig {
            max_stages: 1,
            ..config.clone()
        })
        .compute(2.0, 1.0)
        .unwrap();
        assert!(single.cod_effluent > 400.0);
        assert!(!single.compliant);

        let staged = wetland(config).compute(2.0, 1.0).unwrap();
        assert!(staged.stages > 1);
        assert!(staged.cod_effluent < single.cod_effluent);
        assert_relative_eq!(staged.total_area(), staged.cw_area * f64::from(staged.stages));
    }

    #[test]
    fn test_stage_limit_bounds_iteration() {
        let config = WetlandConfig {
            hrt: 0.1,
            cod_limit: 0.0,
            max_stages: 4,
            ..Default::default()
        };
        let result = wetland(config).compute(2.0, 1.0).unwrap();
        assert_eq!(result.stages, 4);
        assert!(!result.compliant);
    }

    #[test]
    fn test_non_physical_discharge_rejected() {
        let w = wetland(WetlandConfig::default());
        assert!(w.compute(1.0, 1.0).is_err());
        assert!(w.compute(1.0, 2.0).is_err());
        assert!(w.compute(0.0, 0.0).is_err());
        assert!(w.compute(1.0, -0.5).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = WetlandConfig {
            porosity: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            ConstructedWetland::new(config),
            Err(ModelError::NonPhysicalGeometry(_))
        ));
    }

    #[rstest]
    #[case::porosity(WetlandConfig { porosity: f64::NAN, ..Default::default() })]
    #[case::depth(WetlandConfig { depth: f64::NAN, ..Default::default() })]
    #[case::temperature(WetlandConfig { temperature: f64::INFINITY, ..Default::default() })]
    #[case::cod_limit(WetlandConfig { cod_limit: f64::NAN, ..Default::default() })]
    fn test_non_finite_config_rejected(#[case] config: WetlandConfig) {
        assert!(matches!(
            ConstructedWetland::new(config),
            Err(ModelError::NonPhysicalGeometry(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_bod_decreases_with_hrt(hrt in 0.1f64..10.0, extra in 0.1f64..5.0) {
            let base = WetlandConfig { cod_limit: f64::MAX, ..Default::default() };
            let short = wetland(WetlandConfig { hrt, ..base.clone() }).compute(2.0, 0.5).unwrap();
            let long = wetland(WetlandConfig { hrt: hrt + extra, ..base }).compute(2.0, 0.5).unwrap();
            prop_assert!(long.bod_effluent < short.bod_effluent);
        }
    }
}
