use std::fs;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

use branching::block::SubmitResponse;
use branching::fields::Persisted;
use branching::play::{self, demo, PlayerConfig};
use branching::{BranchingBlock, LearnerState, LogPublisher};

fn main() -> Result<()> {
    // Initialize logging. Control verbosity with RUST_LOG env var:
    //   RUST_LOG=info   cargo run -- scenario.json   # transitions + saves
    //   RUST_LOG=debug  cargo run -- scenario.json   # + normalization and scoring detail
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = PlayerConfig::from_args(&args);

    let submission = match &config.scenario_path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read scenario file {path}"))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse scenario file {path}"))?
        }
        None => serde_json::to_value(demo::airport_security_submission())
            .context("failed to encode demo scenario")?,
    };

    let mut block = BranchingBlock::new(LogPublisher);
    if let SubmitResponse::Error { field_errors, .. } = block.studio_submit(submission) {
        eprintln!("Scenario rejected:");
        for error in &field_errors.nodes_json {
            eprintln!("  - {error}");
        }
        bail!("scenario has {} problems", field_errors.nodes_json.len());
    }

    if let Some(path) = config.state_path.as_deref().filter(|p| Path::new(p).exists()) {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read learner state {path}"))?;
        let record: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse learner state {path}"))?;
        block.learner = LearnerState::load(Some(&record));
        info!("Resumed learner state from {path}");
    }

    let stdin = io::stdin();
    play::run(&mut block, &mut stdin.lock(), &mut io::stdout())?;

    if let Some(path) = &config.state_path {
        let record = block.learner.dump().context("failed to encode learner state")?;
        let text = serde_json::to_string_pretty(&record)?;
        fs::write(path, text).with_context(|| format!("failed to write learner state {path}"))?;
        info!("Saved learner state to {path}");
    }

    Ok(())
}
