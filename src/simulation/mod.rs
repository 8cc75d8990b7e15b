//! # Physical Models
//!
//! Closed-form engineering models used to pre-design integrated
//! water-energy-food installations.
//!
//! ## Components
//!
//! - **Digester**: anaerobic digester geometry and feed-to-biogas conversion factor
//! - **DigesterDemand**: per-timestep heat and electricity demand of a sized digester
//! - **Plant**: temperature, heat-stress and aridity multipliers on biomass growth
//! - **Wetland**: constructed wetland area and effluent quality with staged treatment
//!
//! ## Usage
//!
//! ```rust
//! use owefe_models::simulation::{
//!     size_digester, DemandConfig, DigesterDemand, DigesterDesignSpec, DigesterKind, YieldModel,
//! };
//!
//! let spec = DigesterDesignSpec::new(22.0, 400.0).with_yield_model(YieldModel::BiomethanePotential {
//!     biomethane_potential: 3.0,
//! });
//! let design = size_digester(DigesterKind::Cstr, &spec).unwrap();
//!
//! let demand = DigesterDemand::new(&design.geometry, DemandConfig::default()).unwrap();
//! let hour = demand.evaluate(12.0, 380.0).unwrap();
//! assert!(hour.heat_demand > 0.0);
//! ```

pub mod digester;
pub mod digester_demand;
pub mod plant;
pub mod wetland;

pub use digester::{
    size_digester, ConversionFactor, DigesterDesign, DigesterDesignSpec, DigesterGeometry,
    DigesterKind, DigesterModel, LongRetentionYield, YieldModel,
};
pub use digester_demand::{DemandConfig, DemandSample, DigesterDemand, MixingBasis, PumpingBasis};
pub use plant::{
    calendar_daily_maxima, daily_maxima, forward_fill_daily, GrowthFactors, HeatStressRamp,
    PlantGrowthModel, PlantParameters,
};
pub use wetland::{ConstructedWetland, TreatmentStage, WetlandConfig, WetlandResult};
