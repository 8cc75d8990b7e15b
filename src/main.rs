use anyhow::{Context, Result};
use owefe_models::config::Config;
use owefe_models::scenario;
use owefe_models::telemetry::init_tracing;
use tracing::{info, warn};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/scenario.toml".to_string());
    let cfg = Config::load(&path)?;

    let samples = match &cfg.io.timeseries {
        Some(series) => scenario::load_samples(series)?,
        None => {
            warn!("no time series configured, only one-off sizing is evaluated");
            Vec::new()
        }
    };

    let report = scenario::run_pre_design(&cfg, &samples)
        .with_context(|| format!("pre-design of {path} failed"))?;

    if let Some(wetland) = &report.wetland {
        if !wetland.compliant {
            warn!(
                stages = wetland.stages,
                cod_effluent = wetland.cod_effluent,
                "wetland does not meet the COD limit"
            );
        }
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &cfg.io.report {
        Some(out) => {
            std::fs::write(out, json)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            info!(path = %out.display(), "report written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
