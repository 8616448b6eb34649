//! Command implementations.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use fjord_indexing::{BatchSummary, LifecycleEvent, ResponseDocType, Signal};
use fjord_search::FeedbackSearcher;
use fjord_suggest::{DummyProvider, SuggestEngine};
use fjord_types::{Response, Settings};

use crate::app::{response_type, App};

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    db_path_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(db_path) = db_path_override {
        settings.db_path = db_path.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured log level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn load_response(app: &App, id: u64) -> Result<Response> {
    let raw = app
        .storage
        .get_entity(ResponseDocType::NAME, id)?
        .with_context(|| format!("Response {} not found", id))?;
    Ok(Response::from_bytes(&raw)?)
}

/// Store a new response and run live indexing for it.
pub async fn add_response(
    settings: &Settings,
    description: &str,
    url: &str,
    happy: bool,
    product: Option<&str>,
) -> Result<u64> {
    let mut app = App::open(settings)?;

    let id = app.storage.next_entity_id(ResponseDocType::NAME)?;
    let mut response = Response::new(id, happy, description).with_url(url);
    if let Some(product) = product {
        response = response.with_product(product);
    }
    app.storage
        .put_entity(ResponseDocType::NAME, id, &response.to_bytes()?)?;
    info!(entity_id = id, "Stored response");

    app.detector
        .handle(&LifecycleEvent::new(Signal::PostSave, response_type()?, id))?;
    let stats = app.drain().await?;

    println!("Added response {}", id);
    if stats.retries_scheduled > 0 || stats.failed > 0 {
        println!("Indexing did not complete; run `fjord reindex` to catch up");
    }
    Ok(id)
}

/// Unindex and delete a response.
pub async fn delete_response(settings: &Settings, id: u64) -> Result<()> {
    let mut app = App::open(settings)?;
    if app.storage.get_entity(ResponseDocType::NAME, id)?.is_none() {
        bail!("Response {} not found", id);
    }

    app.detector
        .handle(&LifecycleEvent::new(Signal::PreDelete, response_type()?, id))?;
    app.storage.delete_entity(ResponseDocType::NAME, id)?;
    app.drain().await?;

    println!("Deleted response {}", id);
    Ok(())
}

/// Reindex every registered doctype and wait for the chunks to finish.
pub async fn reindex(
    settings: &Settings,
    chunk_size_override: Option<usize>,
) -> Result<BatchSummary> {
    let mut app = App::open(settings)?;
    let chunk_size = chunk_size_override.unwrap_or(settings.reindex.chunk_size);

    let doctypes = app.registry.names();
    let plan = app
        .reindexer
        .start_reindex(&settings.index_name, &doctypes, chunk_size)?;
    println!(
        "Batch {}: {} entities in {} chunks",
        plan.batch_id,
        plan.entities,
        plan.chunks()
    );

    app.drain().await?;

    let summary = app.reindexer.batch_summary(&plan.batch_id)?;
    println!(
        "pending={} in_progress={} success={} failed={}",
        summary.pending, summary.in_progress, summary.success, summary.failed
    );
    if summary.failed > 0 {
        bail!("{} of {} chunks failed", summary.failed, summary.total());
    }
    Ok(summary)
}

/// Print batch records.
pub fn show_status(settings: &Settings, batch_id: Option<&str>) -> Result<()> {
    let app = App::open(settings)?;
    let records = app.reindexer.records(batch_id)?;

    if records.is_empty() {
        println!("No batch records");
        return Ok(());
    }
    for record in &records {
        println!(
            "{}  {:<20} {:<12} {}",
            record.batch_id,
            record.name,
            record.status.to_string(),
            record.message
        );
    }
    let summary = BatchSummary::from_records(&records);
    println!(
        "{} records: pending={} in_progress={} success={} failed={}",
        summary.total(),
        summary.pending,
        summary.in_progress,
        summary.success,
        summary.failed
    );
    Ok(())
}

/// Search the index.
pub fn search(settings: &Settings, query: &str, limit: usize) -> Result<()> {
    let app = App::open(settings)?;
    let searcher = FeedbackSearcher::new(&app.search)?;
    searcher.reload()?;

    let hits = searcher.search(query, limit)?;
    if hits.is_empty() {
        println!("No results");
    }
    for hit in hits {
        let url = hit
            .document
            .fields
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        println!("{:.3}  {}  {}", hit.score, hit.doc_id, url);
    }
    Ok(())
}

/// Print suggestions for a stored response.
pub async fn suggest(settings: &Settings, id: u64) -> Result<()> {
    let app = App::open(settings)?;
    let response = load_response(&app, id)?;

    let mut engine = SuggestEngine::new();
    engine.register(Arc::new(DummyProvider::new()));
    engine.load().await?;

    for link in engine.get_suggestions(&response).await? {
        println!(
            "[{} v{}] {}\n    {}\n    {}",
            link.provider, link.provider_version, link.summary, link.description, link.url
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_settings(dir: &TempDir) -> Settings {
        Settings {
            db_path: dir.path().join("db").to_string_lossy().to_string(),
            search_index_path: dir.path().join("search").to_string_lossy().to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_then_delete() {
        let dir = TempDir::new().unwrap();
        let settings = test_settings(&dir);

        let id = add_response(&settings, "battery drains fast", "", false, None)
            .await
            .unwrap();
        assert_eq!(id, 1);
        let second = add_response(&settings, "love it", "", true, Some("firefox"))
            .await
            .unwrap();
        assert_eq!(second, 2);

        delete_response(&settings, 1).await.unwrap();
        assert!(delete_response(&settings, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_reindex_completes_batch() {
        let dir = TempDir::new().unwrap();
        let settings = test_settings(&dir);
        for text in ["one", "two", "three"] {
            add_response(&settings, text, "", true, None).await.unwrap();
        }

        let summary = reindex(&settings, Some(2)).await.unwrap();
        assert_eq!(summary.success, 2);
        assert!(summary.is_complete());
    }

    #[tokio::test]
    async fn test_suggest_missing_response() {
        let dir = TempDir::new().unwrap();
        let settings = test_settings(&dir);
        assert!(suggest(&settings, 99).await.is_err());
    }
}
