use anyhow::{anyhow, Context};
use colored::Colorize;
use ymerge_config::MergerConfig;
use ymerge_merge::Merger;
use ymerge_types::NodeRef;

use crate::cli::Cli;
use crate::documents::{read_documents, render, write_output};

/// Merge every document named on the command line into the first one and
/// write the result.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;

    let mut documents: Vec<(String, NodeRef)> = Vec::new();
    for source in &cli.files {
        for doc in read_documents(source)? {
            documents.push((source.clone(), doc));
        }
    }
    let mut documents = documents.into_iter();
    let (prime_source, prime) = documents
        .next()
        .ok_or_else(|| anyhow!("no documents found in {}", cli.files.join(", ")))?;
    tracing::info!(source = %prime_source, "loaded prime document");

    let mut merger = Merger::new(prime, config).with_merge_at(cli.mergeat.clone());
    for (source, doc) in documents {
        merger
            .merge_with(doc)
            .with_context(|| format!("failed to merge a document from {source}"))?;
    }

    let text = render(merger.data(), cli.format)?;
    write_output(&text, cli.output.as_deref(), cli.overwrite)?;

    if let Some(path) = &cli.output {
        if !cli.quiet {
            eprintln!(
                "{} Merged {} document(s) into {}",
                "✓".green().bold(),
                merger.merged_count() + 1,
                path.display().to_string().bold()
            );
        }
    }
    Ok(())
}

/// The config file (if any) with command-line defaults layered on top.
pub fn build_config(cli: &Cli) -> anyhow::Result<MergerConfig> {
    let mut config = match &cli.config {
        Some(path) => MergerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MergerConfig::default(),
    };

    let defaults = config.defaults_mut();
    if let Some(mode) = cli.anchors {
        defaults.anchors = mode;
    }
    if let Some(mode) = cli.arrays {
        defaults.arrays = mode;
    }
    if let Some(mode) = cli.hashes {
        defaults.hashes = mode;
    }
    if let Some(mode) = cli.aoh {
        defaults.aoh = mode;
    }
    Ok(config)
}
