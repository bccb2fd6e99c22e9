use std::path::Path;

use anyhow::Context;
use chrono::Utc;

use courier_ledger::LedgerClient;
use courier_olive::{
    Engine, ProcessedArtifact, key_basename, parse_report, processed_results_name,
    raw_results_name, results_key,
};
use courier_store::ObjectStore;
use courier_transcript::fuse;

use crate::batch::BatchSummary;
use crate::config::Config;

/// Runs the engine over every pending ledger row.
///
/// Each file is isolated: a bad download, a crashed engine run or a
/// malformed report is logged and the batch moves on. Only ledger transport
/// failures abort the whole run, since without book-keeping the batch would
/// reprocess everything next time anyway.
pub async fn run<S: ObjectStore + Clone>(config: &Config, store: S) -> anyhow::Result<()> {
    let engine_config = config.engine()?;
    let engine = Engine::new(&engine_config.command, &engine_config.workflow);

    let ledger = LedgerClient::new(store.clone(), config.status_csv_filename.as_str());
    let pending: Vec<String> = ledger
        .load()
        .await?
        .table
        .pending()
        .map(|r| r.filename.clone())
        .collect();

    if pending.is_empty() {
        tracing::info!("no pending files in the ledger");
        return Ok(());
    }
    tracing::info!(files = pending.len(), "processing pending files");

    tokio::fs::create_dir_all(config.results_dir.join("raw")).await?;
    tokio::fs::create_dir_all(config.results_dir.join("processed")).await?;
    let scratch = tempfile::tempdir().context("creating scratch dir for downloads")?;

    let mut summary = BatchSummary::default();
    for key in &pending {
        if let Err(err) = process_file(config, &store, &engine, scratch.path(), key).await {
            tracing::error!(
                file = %key,
                error = %format!("{err:#}"),
                "processing failed, continuing with the rest"
            );
            summary.record_failure();
            continue;
        }

        let now = Utc::now().timestamp();
        match ledger.update(|table| table.mark_processed(key, now)).await {
            Ok(_) => {
                tracing::info!(file = %key, "processed");
                summary.record_success();
            }
            Err(err) if err.is_key_missing() => {
                tracing::error!(
                    file = %key,
                    "ledger row disappeared; results published but not recorded"
                );
                summary.record_failure();
            }
            Err(err) => return Err(err).context("saving status ledger"),
        }
    }

    tracing::info!(
        processed = summary.succeeded,
        failed = summary.failed,
        "process run complete"
    );
    if summary.has_failures() {
        anyhow::bail!("{} of {} files failed", summary.failed, summary.total());
    }
    Ok(())
}

/// Download, run the engine, fuse, persist locally, publish to the store.
/// The raw report is written before parsing so a malformed one is still on
/// disk to look at afterwards.
async fn process_file<S: ObjectStore>(
    config: &Config,
    store: &S,
    engine: &Engine,
    scratch: &Path,
    key: &str,
) -> anyhow::Result<()> {
    let filename = key_basename(key);

    let audio = store
        .get(key)
        .await
        .with_context(|| format!("downloading {key}"))?;
    let local = scratch.join(filename);
    tokio::fs::write(&local, &audio.bytes)
        .await
        .with_context(|| format!("writing {}", local.display()))?;

    let raw = engine.run(&local).await.context("running olive workflow")?;
    let raw_path = config.results_dir.join("raw").join(raw_results_name(filename));
    tokio::fs::write(&raw_path, &raw)
        .await
        .with_context(|| format!("writing {}", raw_path.display()))?;

    let report = parse_report(&raw)?;
    let transcript = fuse(report.utterances, &report.timeline);
    let artifact = ProcessedArtifact::new(report.data_id, transcript);
    let body = artifact.to_json()?;

    let processed_path = config
        .results_dir
        .join("processed")
        .join(processed_results_name(filename));
    tokio::fs::write(&processed_path, &body)
        .await
        .with_context(|| format!("writing {}", processed_path.display()))?;

    store
        .put(&results_key(filename), body)
        .await
        .with_context(|| format!("publishing results for {key}"))?;
    Ok(())
}
