//! Index and search commands.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use lmdl_client::{LabelResolver, SearchEngine, SolrClient, WikidataClient};
use lmdl_core::LabelKind;
use lmdl_index::IndexingDriver;
use lmdl_query::{SearchPage, SearchRequest, SearchService};

use crate::config::LmdlConfig;

/// Solr client for the configured core.
pub fn build_engine(config: &LmdlConfig) -> Result<Arc<dyn SearchEngine>> {
    let client = SolrClient::new(&config.solr).context("Failed to create Solr client")?;
    Ok(Arc::new(client))
}

/// Label resolver backed by the configured label service.
pub fn build_resolver(config: &LmdlConfig) -> Result<LabelResolver> {
    let client =
        WikidataClient::new(&config.labels).context("Failed to create label service client")?;
    Ok(LabelResolver::new(Arc::new(client)).with_batch_size(config.labels.effective_batch_size()))
}

fn driver(config: &LmdlConfig, engine: Arc<dyn SearchEngine>) -> Result<IndexingDriver> {
    Ok(IndexingDriver::new(engine, config.authority_resolver()?))
}

/// `lmdl index <file> [--labels]`
pub async fn cmd_index(config: &LmdlConfig, file: &Path, labels: bool) -> Result<()> {
    let driver = driver(config, build_engine(config)?)?;
    let docs = IndexingDriver::load_documents(file)
        .await
        .with_context(|| format!("Failed to load {}", file.display()))?;

    let mut outcome = driver.run(&docs).await.context("Indexing failed")?;
    match outcome.status {
        Some(status) => println!("Indexed {} documents (status {status})", outcome.documents),
        None => println!("No documents to index"),
    }

    if !labels {
        let pending = outcome.pending.len(LabelKind::Item) + outcome.pending.len(LabelKind::Property);
        if pending > 0 {
            println!("{pending} identifiers need labels; rerun with --labels to index them");
        }
        return Ok(());
    }

    let resolver = build_resolver(config)?;
    for kind in [LabelKind::Property, LabelKind::Item] {
        let step = driver
            .index_labels(kind, &mut outcome.pending, &resolver)
            .await
            .with_context(|| format!("Indexing {kind} labels failed"))?;
        println!(
            "Indexed {} {kind} label documents for {} identifiers",
            step.documents, step.requested
        );
    }
    Ok(())
}

/// `lmdl similar-terms`
pub async fn cmd_similar_terms(config: &LmdlConfig) -> Result<()> {
    let driver = driver(config, build_engine(config)?)?;
    match driver.index_similar_terms(&config.similar_terms).await? {
        Some(status) => println!(
            "Indexed {} similar-terms groups (status {status})",
            config.similar_terms.len()
        ),
        None => println!("No similar-terms groups configured"),
    }
    Ok(())
}

/// Ask on stdin whether to go on; anything but `y`/`yes` declines.
pub fn confirm(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// `lmdl reset [--yes]`
pub async fn cmd_reset(config: &LmdlConfig, yes: bool) -> Result<()> {
    if !yes {
        let prompt = format!("Delete every document in {}?", config.solr.core_url());
        if !confirm(&prompt, &mut std::io::stdin().lock(), &mut std::io::stdout())? {
            bail!("Reset cancelled");
        }
    }
    let status = driver(config, build_engine(config)?)?.reset().await?;
    println!("Cleared {} (status {status})", config.solr.core_url());
    Ok(())
}

/// `lmdl search ...`
pub async fn cmd_search(config: &LmdlConfig, request: SearchRequest, json: bool) -> Result<()> {
    let service = SearchService::new(
        build_engine(config)?,
        config.authority_resolver()?,
        build_resolver(config)?,
        config.search.clone(),
    );
    let page = service.search(&request).await.context("Search failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print!("{}", render_page(&page));
    }
    Ok(())
}

/// Plain-text rendering of a search page.
pub fn render_page(page: &SearchPage) -> String {
    let mut out = String::new();
    if !page.results.is_empty() || page.count > 0 {
        out.push_str(&format!("{} results\n", page.count));
    }
    for doc in &page.results {
        out.push_str(&format!("\n{}", doc.id));
        if let Some(type_label) = &doc.type_label {
            out.push_str(&format!("  [{type_label}]"));
        }
        out.push('\n');
        for prop in &doc.properties {
            out.push_str(&format!("  {}: {}\n", prop.label, prop.value));
        }
    }

    if !page.related.is_empty() {
        out.push_str("\nRelated terms:\n");
        for (id, label) in &page.related {
            out.push_str(&format!("  {id}  {label}\n"));
        }
    }

    if page.results.is_empty() {
        if !page.fields.is_empty() {
            out.push_str("\nFields:\n");
            for field in &page.fields {
                let label = field.labels.first().map_or("", String::as_str);
                out.push_str(&format!("  {:<10} {label}\n", field.selector));
            }
        }
        if !page.types.is_empty() {
            out.push_str("\nTypes:\n");
            for t in &page.types {
                out.push_str(&format!("  {:<24} {} ({})\n", t.value, t.label, t.count));
            }
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
