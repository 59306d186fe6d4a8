//! Score command - rule and trust report for one commit

use super::{load_engine, load_payload};
use anyhow::{Context, Result};
use commitguard::report::{OutputFormat, ScoreReport};
use console::style;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

pub fn run(
    config_dir: &Path,
    payload_path: &Path,
    snapshot: &Path,
    format: &str,
    with_anomaly: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    let format = OutputFormat::from_str(format)?;
    let payload = load_payload(payload_path)?;
    let engine = load_engine(config_dir, snapshot)?;

    let verdict = engine.evaluate_payload(&payload)?;
    let mut report = ScoreReport::new(&payload, &verdict);

    if with_anomaly {
        match engine
            .train_anomaly_model(payload.username())
            .and_then(|handle| engine.classify(&handle, &payload))
        {
            Ok(classification) => report = report.with_anomaly(classification),
            Err(e) if e.is_insufficient() => warn!("No anomaly signal available: {}", e),
            Err(e) => return Err(e.into()),
        }
    }

    let rendered = report.render(format)?;
    match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let path = dir.join(report.file_name());
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Report written to {}", style("✓").green(), style(path.display()).cyan());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
