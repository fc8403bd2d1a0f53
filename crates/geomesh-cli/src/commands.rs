//! Command handlers for the CLI.
//!
//! Every command loads the dataset fresh; the index is small enough that
//! there is nothing worth caching between invocations.

use std::path::Path;

use anyhow::Context;
use geomesh_assistant::{AssistantClient, AssistantError, NodeContext};
use geomesh_core::AssistantSettings;
use geomesh_index::{LoadedDataset, NodeResolver, PointIndex, QueryLocation, ResolutionResult};

fn load_index(dataset: &Path) -> anyhow::Result<PointIndex> {
    let loaded = geomesh_index::load_dataset(dataset)
        .with_context(|| format!("failed to load dataset {}", dataset.display()))?;
    if !loaded.skipped.is_empty() {
        tracing::warn!(
            dataset = %dataset.display(),
            skipped = loaded.skipped.len(),
            "skipped invalid rows; run `validate` for details"
        );
    }
    Ok(loaded.into_index()?)
}

fn resolve(dataset: &Path, lat: f64, lon: f64) -> anyhow::Result<ResolutionResult> {
    let query = QueryLocation::new(lat, lon)?;
    let index = load_index(dataset)?;
    Ok(NodeResolver::new().resolve(query, &index)?)
}

fn format_resolution(result: &ResolutionResult) -> String {
    format!(
        "Closest Node: {} ({:.2} km away)",
        result.matched_name,
        result.rounded_distance_km()
    )
}

/// Print the closest node to `(lat, lon)`.
///
/// # Errors
///
/// Returns an error if the coordinates are invalid or the dataset cannot be
/// loaded into a non-empty index.
pub(crate) fn run_nearest(dataset: &Path, lat: f64, lon: f64) -> anyhow::Result<()> {
    let result = resolve(dataset, lat, lon)?;
    println!("{}", format_resolution(&result));
    Ok(())
}

/// Resolve the closest node, then answer `question` with it as context.
///
/// # Errors
///
/// Returns an error if resolution fails, if no API key is configured and
/// `offline` is false, or if the assistant call fails.
pub(crate) async fn run_ask(
    dataset: &Path,
    settings: &AssistantSettings,
    lat: f64,
    lon: f64,
    question: &str,
    offline: bool,
) -> anyhow::Result<()> {
    let result = resolve(dataset, lat, lon)?;
    println!("{}", format_resolution(&result));

    let client = match AssistantClient::from_settings(settings) {
        Ok(client) => Some(client),
        Err(AssistantError::MissingApiKey) if offline => None,
        Err(AssistantError::MissingApiKey) => {
            anyhow::bail!("OPENROUTER_API_KEY is not set; pass --offline or configure a key")
        }
        Err(e) => return Err(e.into()),
    };

    let context = NodeContext::from(&result);
    let answer =
        geomesh_assistant::answer(client.as_ref(), question, Some(&context), offline).await?;

    println!();
    println!("{}", answer.text());
    Ok(())
}

/// List every indexed node in insertion order.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded.
pub(crate) fn run_nodes(dataset: &Path) -> anyhow::Result<()> {
    let index = load_index(dataset)?;
    println!("{:<40}{:>12}{:>12}", "NAME", "LATITUDE", "LONGITUDE");
    for point in index.points() {
        println!(
            "{:<40}{:>12.4}{:>12.4}",
            truncate(&point.name, 38),
            point.latitude,
            point.longitude
        );
    }
    println!("{} node(s)", index.len());
    Ok(())
}

/// Load the dataset and report every skipped row.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a required column is
/// missing, or no row is usable.
pub(crate) fn run_validate(dataset: &Path) -> anyhow::Result<()> {
    let loaded = geomesh_index::load_dataset(dataset)
        .with_context(|| format!("failed to load dataset {}", dataset.display()))?;
    println!("{}", validation_report(&loaded));
    if loaded.points.is_empty() {
        anyhow::bail!("dataset {} has no usable rows", dataset.display());
    }
    Ok(())
}

fn validation_report(loaded: &LoadedDataset) -> String {
    let mut report = format!(
        "{} valid row(s), {} skipped",
        loaded.points.len(),
        loaded.skipped.len()
    );
    for row in &loaded.skipped {
        report.push_str(&format!("\n  line {}: {}", row.line, row.reason));
    }
    report
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars - 3).collect::<String>())
    } else {
        s.to_owned()
    }
}
