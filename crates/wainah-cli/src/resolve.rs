//! Resolution command handlers for the CLI.
//!
//! Called from `main` once config and the resolver are built. Errors are
//! wrapped with `anyhow` context and bubble up to the process exit code.

use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use wainah_core::{NormalizedResult, PolicyOverrides, Resolution};
use wainah_resolver::Resolver;
use wainah_vision::ImagePayload;

/// Read an image file and resolve it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or resolution fails.
pub(crate) async fn run_image(
    resolver: &Resolver,
    path: &Path,
    base64: bool,
    overrides: &PolicyOverrides,
) -> anyhow::Result<Resolution> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), base64, "image loaded");

    let resolution = if base64 {
        let text = String::from_utf8(bytes).context("base64 image file is not UTF-8 text")?;
        resolver.resolve_image_base64(&text, overrides).await?
    } else {
        resolver
            .resolve_image(&ImagePayload::new(bytes), overrides)
            .await?
    };
    Ok(resolution)
}

/// Resolve a typed query.
///
/// # Errors
///
/// Returns an error if the query is blank or no text search route is configured.
pub(crate) async fn run_text(
    resolver: &Resolver,
    query: &str,
    overrides: &PolicyOverrides,
) -> anyhow::Result<Resolution> {
    Ok(resolver.resolve_text(query, overrides).await?)
}

/// Print a resolution to stdout, as pretty JSON or one line per result.
///
/// # Errors
///
/// Returns an error if serialization or the write to stdout fails.
pub(crate) fn print_resolution(resolution: &Resolution, json: bool) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, resolution)?;
        writeln!(out)?;
        return Ok(());
    }
    for line in render_lines(resolution) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Human-readable lines: a header, then one line per ranked result.
pub(crate) fn render_lines(resolution: &Resolution) -> Vec<String> {
    let mut lines = Vec::with_capacity(resolution.results.len() + 1);
    lines.push(format!(
        "{} result(s) for \"{}\" in {} ms",
        resolution.results.len(),
        resolution.query_label,
        resolution.elapsed_ms
    ));
    lines.extend(
        resolution
            .results
            .iter()
            .enumerate()
            .map(|(idx, result)| format_result_line(idx + 1, result)),
    );
    lines
}

/// `"{rank}. {name} | {store} | {price} | {similarity} | {link}"`, with `-`
/// for absent fields. The link is the product page, else the image.
pub(crate) fn format_result_line(rank: usize, result: &NormalizedResult) -> String {
    let dash = "-";
    let store = result.store.as_deref().unwrap_or(dash);
    let price = result.price.as_deref().unwrap_or(dash);
    let link = result
        .product_url
        .as_deref()
        .or(result.image_url.as_deref())
        .unwrap_or(dash);
    format!(
        "{rank}. {} | {store} | {price} | {:.2} | {link}",
        result.name, result.similarity
    )
}
