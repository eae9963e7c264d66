/// Command-line interface: argument parsing and the async [`run`] entrypoint.
///
/// All pipeline logic lives in the library modules; this module only maps flags onto a
/// [`RenderConfig`], prepares the repository and writes the chosen document.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RenderConfig;
use crate::contract::SortMode;
use crate::download::{prepare, RepoSource};
use crate::history::GitHistory;
use crate::load_config::load_config;
use crate::output::{write_cxml, write_html, HtmlRenderer, OutputFormat};
use crate::pipeline::render;

/// CLI for repo-flatten: one document per repository.
#[derive(Parser)]
#[clap(
    name = "repo-flatten",
    version,
    about = "Flatten a repository into a single browsable document, ordered by file history"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a local working tree or a git URL into one document
    Render {
        /// Local directory or git URL
        source: String,

        /// Branch, tag or commit to check out after cloning
        #[clap(long)]
        reference: Option<String>,

        /// Path to a YAML config file
        #[clap(long)]
        config: Option<PathBuf>,

        /// Write the document here instead of stdout
        #[clap(long, short)]
        out: Option<PathBuf>,

        #[clap(long, value_enum)]
        format: Option<OutputFormat>,

        #[clap(long, value_enum)]
        sort: Option<SortMode>,

        /// Size limit for large-data formats (csv, json, ...)
        #[clap(long)]
        max_bytes: Option<u64>,

        /// Only render these paths (repeatable)
        #[clap(long = "path")]
        paths: Vec<PathBuf>,
    },
}

/// Applies command-line flags on top of the loaded config.
pub fn apply_flags(
    config: &mut RenderConfig,
    reference: Option<String>,
    format: Option<OutputFormat>,
    sort: Option<SortMode>,
    max_bytes: Option<u64>,
) {
    if reference.is_some() {
        config.reference = reference;
    }
    if let Some(format) = format {
        config.format = format;
    }
    if let Some(sort) = sort {
        config.sort = sort;
    }
    if let Some(max_bytes) = max_bytes {
        config.max_bytes = max_bytes;
    }
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            source,
            reference,
            config,
            out,
            format,
            sort,
            max_bytes,
            paths,
        } => {
            let mut config = load_config(config.as_deref())?;
            apply_flags(&mut config, reference, format, sort, max_bytes);
            config.trace_loaded();

            let source = RepoSource::from_arg(&source, config.reference.clone());
            let repo = prepare(&source)
                .await
                .with_context(|| format!("Failed to prepare repository {source:?}"))?;

            let explicit = (!paths.is_empty()).then_some(paths.as_slice());
            let history = GitHistory::new();
            let assembly = render(&config, &repo.root, explicit, &history)
                .await
                .context("Render failed")?;

            let document = match config.format {
                OutputFormat::Html => write_html(&source.display_name(), &assembly, &HtmlRenderer)
                    .context("Failed to render HTML document")?,
                OutputFormat::Cxml => write_cxml(&assembly),
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, document)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(command = "render", path = %path.display(), "Document written");
                    let report = serde_json::to_string_pretty(&assembly.summary)
                        .context("Failed to serialise summary")?;
                    eprintln!("{report}");
                }
                None => print!("{document}"),
            }
            Ok(())
        }
    }
}
