//! End-to-end runs of the pre-design pipeline over small synthetic series.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use owefe_models::config::{Config, DigesterSection, IoConfig, WetlandSection};
use owefe_models::domain::{ClimateSample, ModelError};
use owefe_models::scenario::{load_samples, run_pre_design};
use owefe_models::simulation::{
    DemandConfig, DigesterKind, PlantParameters, PumpingBasis, WetlandConfig, YieldModel,
};
use rstest::rstest;

fn digester(kind: DigesterKind, design_mass_flow: Option<f64>) -> DigesterSection {
    DigesterSection {
        kind,
        retention_time: 22.0,
        design_mass_flow,
        sludge_density: 997.0,
        sludge_specific_gravity: 1.02,
        dry_solid_concentration: 0.2,
        volatile_solid_concentration: 0.8,
        yield_model: YieldModel::BiomethanePotential {
            biomethane_potential: 3.0,
        },
    }
}

fn scenario(kind: DigesterKind) -> Config {
    Config {
        digester: digester(kind, None),
        demand: DemandConfig::default(),
        plant: Some(PlantParameters::hegelbach()),
        wetland: Some(WetlandSection {
            influent: 2.0,
            effluent: 1.0,
            design: WetlandConfig::default(),
        }),
        io: IoConfig {
            steps_per_day: 2,
            ..Default::default()
        },
    }
}

fn samples() -> Vec<ClimateSample> {
    vec![
        ClimateSample::new(12.0).with_mass_flow(380.0),
        ClimateSample::new(20.0).with_mass_flow(400.0),
        ClimateSample::new(38.0).with_mass_flow(390.0),
        ClimateSample::new(25.0).with_mass_flow(360.0),
    ]
}

#[rstest]
#[case(DigesterKind::FloatingDrum)]
#[case(DigesterKind::Cstr)]
fn test_full_scenario(#[case] kind: DigesterKind) {
    let report = run_pre_design(&scenario(kind), &samples()).unwrap();

    let geometry = &report.digester.design.geometry;
    assert_eq!(geometry.kind, kind);
    // series maximum is the design flow
    assert_relative_eq!(
        geometry.volumetric_flow,
        400.0 * 24.0 / (997.0 * 1.02),
        max_relative = 1e-12
    );
    assert_relative_eq!(report.digester.design.conversion_factor.value(), 0.48);
    assert_eq!(report.digester.dimensions.len(), 8);

    let mean_flow = report.digester.average_volumetric_flow.unwrap();
    assert_relative_eq!(mean_flow, 382.5 * 24.0 / (997.0 * 1.02), max_relative = 1e-12);

    assert_eq!(report.series.len(), 4);
    assert!(report.series[0].heat_demand_digester > report.series[1].heat_demand_digester);
    assert!(report.series.iter().all(|s| s.electricity_demand_digester > 0.0));

    let growth = report.growth.expect("plant parameters configured");
    assert_eq!(growth.temperature.len(), 4);
    // daily maxima 20 and 38 forward-filled over two steps per day
    assert_eq!(growth.heat_stress, vec![1.0, 1.0, 4.0 / 11.0, 4.0 / 11.0]);
    assert!(growth.aridity.is_empty());

    let wetland = report.wetland.expect("wetland configured");
    assert_relative_eq!(wetland.cw_area, 200.0, epsilon = 1e-9);
    assert_eq!(wetland.stages, 1);
    assert!(wetland.compliant);
}

#[test]
fn test_heat_demand_negative_above_digester_temperature() {
    let report = run_pre_design(&scenario(DigesterKind::Cstr), &samples()).unwrap();
    assert!(report.series[2].heat_demand_digester < 0.0);
    assert!(report.series[3].heat_demand_digester > 0.0);
}

#[test]
fn test_heat_demand_clamp_configured() {
    let mut config = scenario(DigesterKind::Cstr);
    config.demand.clamp_negative_heat = true;
    let report = run_pre_design(&config, &samples()).unwrap();
    assert_eq!(report.series[2].heat_demand_digester, 0.0);
}

#[test]
fn test_volumetric_pumping_uses_average_flow() {
    let mut config = scenario(DigesterKind::Cstr);
    config.demand.pumping = PumpingBasis::DailyVolumetricFlow { kw_per_m3_day: 1.2 };
    let samples: Vec<_> = [100.0, 100.0, 100.0, 700.0]
        .into_iter()
        .map(|flow| ClimateSample::new(15.0).with_mass_flow(flow))
        .collect();

    let report = run_pre_design(&config, &samples).unwrap();
    let geometry = &report.digester.design.geometry;
    let average = 250.0 * 24.0 / (997.0 * 1.02);
    assert_relative_eq!(
        report.digester.average_volumetric_flow.unwrap(),
        average,
        max_relative = 1e-12
    );
    // design flow is the series peak, pumping follows the mean
    assert!(geometry.volumetric_flow > 2.0 * average);

    let expected = 0.0079 * geometry.filled_up_volume + 1.2 * average;
    for row in &report.series {
        assert_relative_eq!(row.electricity_demand_digester, expected, max_relative = 1e-12);
    }
}

#[test]
fn test_partial_mass_flow_column_rejected() {
    let mut config = scenario(DigesterKind::Cstr);
    config.digester.design_mass_flow = Some(400.0);
    let samples = vec![
        ClimateSample::new(10.0).with_mass_flow(380.0),
        ClimateSample::new(11.0),
        ClimateSample::new(12.0).with_mass_flow(390.0),
    ];
    assert_eq!(
        run_pre_design(&config, &samples).unwrap_err(),
        ModelError::MissingColumn("mass_flow")
    );

    config.digester.design_mass_flow = None;
    assert_eq!(
        run_pre_design(&config, &samples).unwrap_err(),
        ModelError::MissingColumn("mass_flow")
    );
}

#[rstest]
#[case::t_max(ClimateSample::new(30.0).with_mass_flow(380.0).with_t_max(33.0), "t_max")]
#[case::water(ClimateSample::new(30.0).with_mass_flow(380.0).with_water(0.2, 0.3), "et_o")]
fn test_partial_growth_column_rejected(#[case] odd_row: ClimateSample, #[case] column: &str) {
    let mut samples = samples();
    samples[1] = odd_row;
    match run_pre_design(&scenario(DigesterKind::Cstr), &samples).unwrap_err() {
        ModelError::MissingColumn(name) => assert_eq!(name, column),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_et_o_without_vwc_rejected() {
    let samples: Vec<_> = samples()
        .into_iter()
        .map(|mut s| {
            s.et_o = Some(0.2);
            s
        })
        .collect();
    assert_eq!(
        run_pre_design(&scenario(DigesterKind::Cstr), &samples).unwrap_err(),
        ModelError::MissingColumn("vwc")
    );
}

#[test]
fn test_heat_stress_grouped_by_calendar_day() {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap();
    // evening start: only the first row belongs to day one
    let samples: Vec<_> = [38.0, 30.0, 20.0, 18.0]
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            ClimateSample::new(t)
                .with_timestamp(start + Duration::hours(6 * i as i64))
                .with_mass_flow(380.0)
        })
        .collect();

    let report = run_pre_design(&scenario(DigesterKind::Cstr), &samples).unwrap();
    assert_eq!(
        report.growth.unwrap().heat_stress,
        vec![4.0 / 11.0, 1.0, 1.0, 1.0]
    );
}

#[test]
fn test_aridity_computed_when_water_columns_present() {
    let samples: Vec<_> = samples()
        .into_iter()
        .map(|s| s.with_water(0.2, 0.3))
        .collect();
    let report = run_pre_design(&scenario(DigesterKind::Cstr), &samples).unwrap();
    let aridity = report.growth.unwrap().aridity;
    assert_eq!(aridity.len(), 4);
    assert!(aridity.iter().all(|&a| a > 0.0 && a <= 1.0));
}

#[test]
fn test_explicit_t_max_column_preferred() {
    let samples: Vec<_> = samples()
        .into_iter()
        .map(|s| s.with_t_max(45.0))
        .collect();
    let report = run_pre_design(&scenario(DigesterKind::Cstr), &samples).unwrap();
    assert_eq!(report.growth.unwrap().heat_stress, vec![1.0; 4]);
}

#[test]
fn test_sizing_only_without_series() {
    let mut config = scenario(DigesterKind::FloatingDrum);
    config.digester.design_mass_flow = Some(400.0);
    let report = run_pre_design(&config, &[]).unwrap();

    assert!(report.series.is_empty());
    assert!(report.growth.is_none());
    assert!(report.digester.average_volumetric_flow.is_none());
    assert!(report.wetland.is_some());
}

#[test]
fn test_missing_design_flow_rejected() {
    let config = scenario(DigesterKind::Cstr);
    let samples = vec![ClimateSample::new(10.0), ClimateSample::new(11.0)];
    assert_eq!(
        run_pre_design(&config, &samples).unwrap_err(),
        ModelError::EmptySeries("mass_flow")
    );
}

#[test]
fn test_infeasible_conversion_factor_aborts_run() {
    let mut config = scenario(DigesterKind::Cstr);
    config.digester.yield_model = YieldModel::BiomethanePotential {
        biomethane_potential: 1.0,
    };
    let err = run_pre_design(&config, &samples()).unwrap_err();
    assert!(matches!(err, ModelError::ConversionFactorOutOfRange { .. }));
}

#[test]
fn test_load_samples_and_serialize_report() {
    let path = std::env::temp_dir().join(format!("owefe-series-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"[
            {"timestamp": "2024-06-01T00:00:00", "temperature": 14.0, "mass_flow": 380.0},
            {"timestamp": "2024-06-01T01:00:00", "temperature": 15.5, "mass_flow": 395.0}
        ]"#,
    )
    .unwrap();

    let samples = load_samples(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(samples.len(), 2);
    assert!(samples[0].timestamp.is_some());

    let report = run_pre_design(&scenario(DigesterKind::Cstr), &samples).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let row = &json["series"][1];
    assert_eq!(row["temperature"], 15.5);
    assert!(row["heat_demand_digester"].as_f64().unwrap() > 0.0);
    assert!(row.get("t_max").is_none());
}

#[test]
fn test_load_samples_missing_file() {
    assert!(load_samples("does/not/exist.json").is_err());
}

#[test]
fn test_shipped_scenario_runs() {
    let root = env!("CARGO_MANIFEST_DIR");
    let config = Config::load(format!("{root}/config/scenario.toml")).unwrap();
    assert_eq!(config.digester.kind, DigesterKind::Cstr);

    let samples = load_samples(format!("{root}/data/climate_sample.json")).unwrap();
    let report = run_pre_design(&config, &samples).unwrap();
    assert_eq!(report.series.len(), 48);
    assert_eq!(report.growth.unwrap().aridity.len(), 48);
}

#[test]
fn test_nan_wetland_design_rejected() {
    let mut config = scenario(DigesterKind::Cstr);
    if let Some(wetland) = config.wetland.as_mut() {
        wetland.design.porosity = f64::NAN;
    }
    assert!(matches!(
        run_pre_design(&config, &samples()),
        Err(ModelError::NonPhysicalGeometry(_))
    ));
}
