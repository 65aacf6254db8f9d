use std::path::Path;

use anyhow::Context;
use tracing::info;

use arena_backfill::{Backfill, PubSubPublisher};

pub async fn run(
    input: &Path,
    config_path: Option<&Path>,
    project: Option<String>,
    topic: Option<String>,
) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    if project.is_some() {
        config.backfill.project = project;
    }
    if let Some(topic) = topic {
        config.backfill.topic = topic;
    }
    config.validate()?;

    let publisher =
        PubSubPublisher::from_config(&config.backfill).context("building the Pub/Sub client")?;
    info!(
        project = ?config.backfill.project,
        topic = %config.backfill.topic,
        batch_size = config.backfill.batch_size,
        "publishing livestream records"
    );

    let report = Backfill::new(&publisher, config.backfill.batch_size)
        .run_file(input)
        .await
        .with_context(|| format!("backfilling from {}", input.display()))?;

    println!(
        "✓ {} published, {} skipped, {} failed",
        report.published(),
        report.skipped,
        report.failed
    );
    Ok(())
}
