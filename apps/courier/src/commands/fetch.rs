use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context;

use courier_ledger::{Error as LedgerError, LedgerClient, Poller};
use courier_olive::{key_basename, processed_results_name, results_key};
use courier_store::ObjectStore;

use crate::config::Config;

/// Polls the ledger until every file in the filelist is processed,
/// downloading each result next to the filelist as it becomes ready. With a
/// timeout set, an unfinished wait ends in an error and a non-zero exit.
pub async fn run<S: ObjectStore + Clone>(
    config: &Config,
    store: S,
    filelist: &Path,
    poll_interval: Duration,
    timeout: Option<Duration>,
) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(filelist)
        .await
        .with_context(|| format!("reading filelist {}", filelist.display()))?;
    let wanted: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    anyhow::ensure!(!wanted.is_empty(), "filelist {} is empty", filelist.display());

    let dest_dir = filelist.parent().unwrap_or(Path::new(".")).to_path_buf();
    tracing::info!(
        files = wanted.len(),
        dest = %dest_dir.display(),
        "waiting for results"
    );

    let ledger = LedgerClient::new(store.clone(), config.status_csv_filename.as_str());
    let mut poller = Poller::new(poll_interval);
    if let Some(timeout) = timeout {
        poller = poller.with_deadline(timeout);
    }

    // The futures returned by these closures must not borrow the closures
    // themselves, so both capture copies of plain frame references.
    let fetched = AtomicUsize::new(0);
    let ledger = &ledger;
    let store = &store;
    let dest_dir = &dest_dir;
    let fetched_calls = &fetched;
    poller
        .await_ready(
            &wanted,
            move || async move { Ok::<_, LedgerError>(ledger.load().await?.table) },
            move |key: String| async move {
                let filename = key_basename(&key);
                let results = store.get(&results_key(filename)).await?;
                let path = dest_dir.join(processed_results_name(filename));
                tokio::fs::write(&path, &results.bytes).await?;
                fetched_calls.fetch_add(1, Ordering::SeqCst);
                tracing::info!(key = %key, path = %path.display(), "downloaded results");
                Ok::<(), LedgerError>(())
            },
        )
        .await
        .context("waiting for processing to finish")?;

    tracing::info!(files = fetched.load(Ordering::SeqCst), "fetch run complete");
    Ok(())
}
