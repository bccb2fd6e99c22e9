use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;

use courier_ledger::{JobRecord, LedgerClient};
use courier_olive::data_key;
use courier_store::ObjectStore;

use crate::batch::BatchSummary;
use crate::config::Config;

const AUDIO_EXTENSIONS: &[&str] = &["flac", "wav", "mp3"];

/// Uploads audio and registers each file as a pending ledger row, skipping
/// anything the ledger already tracks so re-running on the same directory is
/// harmless. Every run ends by writing its filelist for the fetcher, empty
/// when nothing new went up.
pub async fn run<S: ObjectStore + Clone>(
    config: &Config,
    store: S,
    path: &Path,
) -> anyhow::Result<()> {
    let inputs = collect_inputs(path).await?;
    anyhow::ensure!(!inputs.is_empty(), "no audio files at {}", path.display());

    let ledger = LedgerClient::new(store.clone(), config.status_csv_filename.as_str());
    let mut known = ledger.load().await?.table;

    let mut summary = BatchSummary::default();
    let mut uploaded_keys: Vec<String> = Vec::new();

    for input in &inputs {
        let Some(key) = data_key(input) else {
            tracing::error!(path = %input.display(), "file name cannot form an object key");
            summary.record_failure();
            continue;
        };

        if known.contains(&key) {
            tracing::info!(key = %key, "already in the ledger, skipping");
            summary.record_skip();
            continue;
        }

        match upload_one(&store, &ledger, input, &key).await {
            Ok(()) => {
                known.insert(JobRecord::pending(key.as_str()));
                uploaded_keys.push(key);
                summary.record_success();
            }
            Err(err) => {
                tracing::error!(
                    path = %input.display(),
                    error = %format!("{err:#}"),
                    "upload failed, continuing with the rest"
                );
                summary.record_failure();
            }
        }
    }

    write_filelist(&config.results_dir, &uploaded_keys).await?;

    tracing::info!(
        found = inputs.len(),
        uploaded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        "upload run complete"
    );
    if summary.has_failures() {
        anyhow::bail!("{} of {} files failed to upload", summary.failed, summary.total());
    }
    Ok(())
}

async fn upload_one<S: ObjectStore>(
    store: &S,
    ledger: &LedgerClient<S>,
    input: &Path,
    key: &str,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    store
        .put(key, bytes)
        .await
        .with_context(|| format!("uploading {key}"))?;
    ledger
        .update(|table| {
            table.insert(JobRecord::pending(key));
            Ok(())
        })
        .await
        .context("registering upload in the ledger")?;
    tracing::info!(key = %key, "uploaded");
    Ok(())
}

/// A file argument is taken as-is; a directory argument is scanned one level
/// deep for the audio extensions the pipeline accepts.
async fn collect_inputs(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut entries = tokio::fs::read_dir(path).await?;
    let mut inputs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let entry_path = entry.path();
        let ext = entry_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        if ext.as_deref().is_some_and(|e| AUDIO_EXTENSIONS.contains(&e)) {
            inputs.push(entry_path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

async fn write_filelist(results_dir: &Path, keys: &[String]) -> anyhow::Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let run_dir = results_dir.join(&stamp);
    tokio::fs::create_dir_all(&run_dir)
        .await
        .with_context(|| format!("creating {}", run_dir.display()))?;

    let path = run_dir.join(format!("filelist-{stamp}.txt"));
    let mut body = keys.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    tokio::fs::write(&path, body).await?;
    tracing::info!(path = %path.display(), files = keys.len(), "wrote filelist");
    Ok(path)
}
