//! # Anaerobic Digester Sizing
//!
//! Derives digester geometry and a feedstock-to-biogas conversion factor from
//! a design bundle. Two digester types are supported, each with a fixed
//! architectural aspect ratio:
//!
//! - **Floating drum**: diameter : total height = 1.5 : 1. The total height is
//!   split into a conical top (30 %) and a cylindrical body (70 %); sludge
//!   fills at most 70 % of the cylinder.
//! - **CSTR**: active depth : radius = 2 : 1, a plain cylinder with extra
//!   sidewall for grit, scum and gas space and a shallow conical floor.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use strum::{Display, EnumString};
use tracing::debug;

use crate::domain::error::{require_fraction, require_positive, ModelError, ModelResult};

/// Lower plausibility bound of the conversion factor
pub const CONVERSION_FACTOR_MIN: f64 = 0.3;
/// Upper plausibility bound of the conversion factor
pub const CONVERSION_FACTOR_MAX: f64 = 1.0;

/// Floating drum: diameter / total height
pub const FLOATING_DRUM_DIAMETER_TO_HEIGHT: f64 = 1.5;
/// Floating drum: cylindrical share of the total height
const FLOATING_DRUM_CYLINDER_SHARE: f64 = 0.7;
/// Floating drum: maximum fill level as share of the cylinder height
const FLOATING_DRUM_FILL_SHARE: f64 = 0.7;

/// CSTR: active depth / radius
pub const CSTR_DEPTH_TO_RADIUS: f64 = 2.0;
/// CSTR: sidewall height including grit, scum and gas allowances, per unit active depth
const CSTR_SIDEWALL_FACTOR: f64 = 1.45;
/// CSTR: floor cone height per unit radius (1:5 slope)
const CSTR_FLOOR_SLOPE: f64 = 0.2;

// ============================================================================
// Design inputs
// ============================================================================

/// Digester construction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DigesterKind {
    FloatingDrum,
    Cstr,
}

/// Yield factor replacing the configured one for long retention times
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongRetentionYield {
    /// Retention time above which the override applies (d)
    pub threshold_days: f64,
    /// Yield factor used above the threshold
    pub yield_factor: f64,
}

impl LongRetentionYield {
    /// IRENA table value for retention times above 30 days
    pub const IRENA: Self = Self {
        threshold_days: 30.0,
        yield_factor: 10.59,
    };
}

/// How the feedstock-to-biogas conversion factor is derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum YieldModel {
    /// `volume_total * yield_factor * ds * vs / 1000` (IRENA 2016)
    Empirical {
        yield_factor: f64,
        #[serde(default)]
        long_retention: Option<LongRetentionYield>,
    },
    /// `ds * vs * destruction_rate * specific_gas_production`
    Decomposed {
        volatile_solid_destruction_rate: f64,
        /// m³ biogas per kg destroyed volatile solids
        specific_gas_production: f64,
    },
    /// `ds * vs * biomethane_potential`
    BiomethanePotential { biomethane_potential: f64 },
}

/// Immutable design bundle for one digester scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigesterDesignSpec {
    /// Hydraulic retention time (d)
    pub retention_time: f64,
    /// Design feedstock mass flow (kg/h)
    pub design_mass_flow: f64,
    /// Sludge density (kg/m³)
    pub sludge_density: f64,
    /// Sludge specific gravity (-)
    pub sludge_specific_gravity: f64,
    /// Dry solids share of the wet feedstock (-)
    pub dry_solid_concentration: f64,
    /// Volatile solids share of the dry solids (-)
    pub volatile_solid_concentration: f64,
    pub yield_model: YieldModel,
}

impl DigesterDesignSpec {
    /// Dewatered sewage sludge defaults with the IRENA empirical yield.
    pub fn new(retention_time: f64, design_mass_flow: f64) -> Self {
        Self {
            retention_time,
            design_mass_flow,
            sludge_density: 997.0,
            sludge_specific_gravity: 1.02,
            dry_solid_concentration: 0.2,
            volatile_solid_concentration: 0.8,
            yield_model: YieldModel::Empirical {
                yield_factor: 9.3,
                long_retention: None,
            },
        }
    }

    pub fn with_sludge(mut self, density: f64, specific_gravity: f64) -> Self {
        self.sludge_density = density;
        self.sludge_specific_gravity = specific_gravity;
        self
    }

    pub fn with_solids(mut self, dry_solid: f64, volatile_solid: f64) -> Self {
        self.dry_solid_concentration = dry_solid;
        self.volatile_solid_concentration = volatile_solid;
        self
    }

    pub fn with_yield_model(mut self, yield_model: YieldModel) -> Self {
        self.yield_model = yield_model;
        self
    }

    /// Reject inputs that would produce zero, negative or NaN geometry.
    pub fn validate(&self) -> ModelResult<()> {
        require_positive("retention_time", self.retention_time)?;
        require_positive("design_mass_flow", self.design_mass_flow)?;
        require_positive("sludge_density", self.sludge_density)?;
        require_positive("sludge_specific_gravity", self.sludge_specific_gravity)?;
        require_fraction("dry_solid_concentration", self.dry_solid_concentration)?;
        require_fraction(
            "volatile_solid_concentration",
            self.volatile_solid_concentration,
        )?;
        match self.yield_model {
            YieldModel::Empirical {
                yield_factor,
                long_retention,
            } => {
                require_positive("yield_factor", yield_factor)?;
                if let Some(lr) = long_retention {
                    require_positive("long_retention.yield_factor", lr.yield_factor)?;
                }
            }
            YieldModel::Decomposed {
                volatile_solid_destruction_rate,
                specific_gas_production,
            } => {
                require_fraction(
                    "volatile_solid_destruction_rate",
                    volatile_solid_destruction_rate,
                )?;
                require_positive("specific_gas_production", specific_gas_production)?;
            }
            YieldModel::BiomethanePotential {
                biomethane_potential,
            } => {
                require_positive("biomethane_potential", biomethane_potential)?;
            }
        }
        Ok(())
    }

    /// Volumetric feed flow (m³/d)
    pub fn volumetric_flow(&self) -> f64 {
        self.design_mass_flow * 24.0 / (self.sludge_density * self.sludge_specific_gravity)
    }

    /// Steady-state liquid volume under constant continuous inflow (m³)
    pub fn filled_up_volume(&self) -> f64 {
        self.volumetric_flow() * self.retention_time
    }

    /// Volatile solids share of the wet feedstock
    fn volatile_fraction(&self) -> f64 {
        self.dry_solid_concentration * self.volatile_solid_concentration
    }

    /// Organic loading rate (kg VS / (m³ d))
    fn organic_loading_rate(&self, filled_up_volume: f64) -> f64 {
        self.volatile_fraction() * self.design_mass_flow / filled_up_volume * 24.0
    }
}

// ============================================================================
// Derived values
// ============================================================================

/// Geometry derived from a [`DigesterDesignSpec`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigesterGeometry {
    pub kind: DigesterKind,
    /// m
    pub radius: f64,
    /// m
    pub diameter: f64,
    /// Total structural height (m)
    pub total_height: f64,
    /// Sludge depth: maximum fill level (floating drum) or active depth (CSTR), m
    pub active_depth: f64,
    /// Roof cone (floating drum) or floor cone (CSTR) height, m
    pub cone_height: f64,
    /// Cylindrical body (floating drum) or total sidewall (CSTR) height, m
    pub cylinder_height: f64,
    /// m³
    pub volume_total: f64,
    /// Heat-exchanging envelope (m²)
    pub surface_area_total: f64,
    /// m³
    pub filled_up_volume: f64,
    /// kg VS / (m³ d)
    pub organic_loading_rate: f64,
    /// m³/d
    pub volumetric_flow: f64,
}

/// Feed-to-biogas yield, guaranteed to lie in the plausible range
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ConversionFactor(f64);

impl ConversionFactor {
    pub fn new(value: f64) -> ModelResult<Self> {
        if value.is_finite() && (CONVERSION_FACTOR_MIN..=CONVERSION_FACTOR_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::ConversionFactorOutOfRange {
                value,
                min: CONVERSION_FACTOR_MIN,
                max: CONVERSION_FACTOR_MAX,
            })
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Geometry plus checked conversion factor for one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigesterDesign {
    pub geometry: DigesterGeometry,
    pub conversion_factor: ConversionFactor,
}

impl DigesterDesign {
    /// Key/value dimension table as exported alongside the processed series
    pub fn dimension_table(&self) -> Vec<(&'static str, f64)> {
        let g = &self.geometry;
        vec![
            ("Diameter [m]", g.diameter),
            ("Total Height [m]", g.total_height),
            ("Total Volume of Digester [m³]", g.volume_total),
            ("Filled Up Volume [m³]", g.filled_up_volume),
            ("Total Surface Area [m²]", g.surface_area_total),
            ("Organic Loading Rate [kg VS/(m³ d)]", g.organic_loading_rate),
            ("Design Volumetric Flow [m³/d]", g.volumetric_flow),
            (
                "Feed to Biogas Conversion Factor [m³/kg]",
                self.conversion_factor.value(),
            ),
        ]
    }
}

// ============================================================================
// Model capability
// ============================================================================

/// Sizing capability shared by all digester variants
pub trait DigesterModel {
    fn compute_geometry(&self, spec: &DigesterDesignSpec) -> ModelResult<DigesterGeometry>;

    fn compute_conversion_factor(
        &self,
        spec: &DigesterDesignSpec,
        geometry: &DigesterGeometry,
    ) -> ModelResult<ConversionFactor>;

    /// Geometry and conversion factor in one pass.
    fn design(&self, spec: &DigesterDesignSpec) -> ModelResult<DigesterDesign> {
        let geometry = self.compute_geometry(spec)?;
        let conversion_factor = self.compute_conversion_factor(spec, &geometry)?;
        Ok(DigesterDesign {
            geometry,
            conversion_factor,
        })
    }
}

impl DigesterModel for DigesterKind {
    fn compute_geometry(&self, spec: &DigesterDesignSpec) -> ModelResult<DigesterGeometry> {
        spec.validate()?;
        let geometry = match self {
            DigesterKind::FloatingDrum => floating_drum_geometry(spec),
            DigesterKind::Cstr => cstr_geometry(spec),
        };
        debug!(
            kind = %self,
            diameter = geometry.diameter,
            volume_total = geometry.volume_total,
            surface_area_total = geometry.surface_area_total,
            "digester geometry computed"
        );
        Ok(geometry)
    }

    fn compute_conversion_factor(
        &self,
        spec: &DigesterDesignSpec,
        geometry: &DigesterGeometry,
    ) -> ModelResult<ConversionFactor> {
        let raw = raw_conversion_factor(spec, geometry.volume_total);
        ConversionFactor::new(raw)
    }
}

/// Size a digester of the given kind.
pub fn size_digester(kind: DigesterKind, spec: &DigesterDesignSpec) -> ModelResult<DigesterDesign> {
    kind.design(spec)
}

fn raw_conversion_factor(spec: &DigesterDesignSpec, volume_total: f64) -> f64 {
    let vs_fraction = spec.volatile_fraction();
    match spec.yield_model {
        YieldModel::Empirical {
            yield_factor,
            long_retention,
        } => {
            let yield_factor = match long_retention {
                Some(lr) if spec.retention_time > lr.threshold_days => lr.yield_factor,
                _ => yield_factor,
            };
            // litres per kg VS -> m³
            volume_total * yield_factor * vs_fraction / 1000.0
        }
        YieldModel::Decomposed {
            volatile_solid_destruction_rate,
            specific_gas_production,
        } => vs_fraction * volatile_solid_destruction_rate * specific_gas_production,
        YieldModel::BiomethanePotential {
            biomethane_potential,
        } => vs_fraction * biomethane_potential,
    }
}

fn floating_drum_geometry(spec: &DigesterDesignSpec) -> DigesterGeometry {
    let volumetric_flow = spec.volumetric_flow();
    let filled_up_volume = spec.filled_up_volume();

    // max fill level = fill share * cylinder share * total height
    let fill_to_height = FLOATING_DRUM_FILL_SHARE * FLOATING_DRUM_CYLINDER_SHARE;
    let diameter_to_fill = FLOATING_DRUM_DIAMETER_TO_HEIGHT / fill_to_height;

    let fill_level = (filled_up_volume / (PI * (diameter_to_fill / 2.0).powi(2))).cbrt();
    let cylinder_height = fill_level / FLOATING_DRUM_FILL_SHARE;
    let cone_height =
        (1.0 - FLOATING_DRUM_CYLINDER_SHARE) / FLOATING_DRUM_CYLINDER_SHARE * cylinder_height;
    let total_height = cone_height + cylinder_height;
    let diameter = FLOATING_DRUM_DIAMETER_TO_HEIGHT * total_height;
    let radius = diameter / 2.0;

    let base_area = PI * radius.powi(2);
    let volume_total = base_area * cylinder_height + base_area * cone_height / 3.0;

    let cone_area = PI * radius * (radius + (cone_height.powi(2) + radius.powi(2)).sqrt());
    let wall_area = 2.0 * PI * radius * cylinder_height;
    let surface_area_total = cone_area + wall_area + base_area;

    DigesterGeometry {
        kind: DigesterKind::FloatingDrum,
        radius,
        diameter,
        total_height,
        active_depth: fill_level,
        cone_height,
        cylinder_height,
        volume_total,
        surface_area_total,
        filled_up_volume,
        organic_loading_rate: spec.organic_loading_rate(filled_up_volume),
        volumetric_flow,
    }
}

fn cstr_geometry(spec: &DigesterDesignSpec) -> DigesterGeometry {
    let volumetric_flow = spec.volumetric_flow();
    let filled_up_volume = spec.filled_up_volume();
    let volume_total = filled_up_volume;

    // V = π r² · (2r)
    let radius = (volume_total / (CSTR_DEPTH_TO_RADIUS * PI)).cbrt();
    let diameter = 2.0 * radius;
    let active_depth = CSTR_DEPTH_TO_RADIUS * radius;
    let sidewall_height = CSTR_SIDEWALL_FACTOR * active_depth;
    let cone_height = CSTR_FLOOR_SLOPE * radius;

    let wall_area = 2.0 * PI * radius * sidewall_height;
    let roof_area = PI * radius.powi(2);
    let floor_area = PI * radius * (cone_height.powi(2) + radius.powi(2)).sqrt();

    DigesterGeometry {
        kind: DigesterKind::Cstr,
        radius,
        diameter,
        total_height: sidewall_height + cone_height,
        active_depth,
        cone_height,
        cylinder_height: sidewall_height,
        volume_total,
        surface_area_total: wall_area + roof_area + floor_area,
        filled_up_volume,
        organic_loading_rate: spec.organic_loading_rate(filled_up_volume),
        volumetric_flow,
    }
}
