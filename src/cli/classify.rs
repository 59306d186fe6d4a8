//! Classify command - anomaly verdict for one commit

use super::{load_engine, load_payload};
use anyhow::Result;
use console::style;
use std::path::Path;

pub fn run(config_dir: &Path, payload_path: &Path, snapshot: &Path) -> Result<()> {
    let payload = load_payload(payload_path)?;
    let engine = load_engine(config_dir, snapshot)?;
    let author = payload.username();

    let result = engine
        .train_anomaly_model(author)
        .and_then(|handle| engine.classify(&handle, &payload));
    match result {
        Ok(classification) => println!("{}", classification),
        Err(e) if e.is_insufficient() => {
            println!("no anomaly signal available");
            eprintln!("{} {}", style("!").yellow(), e);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
