//! Document writers for an [`Assembly`].
//!
//! Two views are provided:
//! - an HTML page for people, laid out by a handlebars template, whose file bodies come from a
//!   [`Renderer`];
//! - a CXML text for LLM ingestion, holding the raw text of every text file.

use std::fmt::Write as _;

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

use crate::assemble::{Assembly, EntryContent, OrderedEntry, RenderSummary, SkippedFile};
use crate::contract::Renderer;
use crate::error::RenderError;
use crate::language::LanguageHint;

/// Output document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Cxml,
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Anchor id for a file section.
pub fn anchor_for(path: &str) -> String {
    let slug: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("file-{slug}")
}

/// Escapes text into a `<pre>` block tagged with the language hint. No highlighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render_text(&self, _path: &str, text: &str, hint: LanguageHint) -> String {
        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            hint,
            escape_html(text)
        )
    }

    fn render_binary(&self, _path: &str, byte_size: u64) -> String {
        format!("<p class=\"binary\"><em>Binary file ({byte_size} bytes) not shown.</em></p>")
    }
}

/// Indented listing of the rendered paths, directories first appearing where first reached.
pub fn directory_tree<'a>(paths: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::from(".\n");
    let mut open: Vec<&str> = Vec::new();

    for path in paths {
        let segments: Vec<&str> = path.split('/').collect();
        let Some((leaf, dirs)) = segments.split_last() else {
            continue;
        };

        let shared = open
            .iter()
            .zip(dirs.iter())
            .take_while(|(a, b)| a == b)
            .count();
        open.truncate(shared);

        for dir in &dirs[shared..] {
            let _ = writeln!(out, "{}{}/", "  ".repeat(open.len() + 1), dir);
            open.push(*dir);
        }
        let _ = writeln!(out, "{}{}", "  ".repeat(open.len() + 1), leaf);
    }
    out
}

fn render_entry(entry: &OrderedEntry, renderer: &dyn Renderer) -> String {
    match &entry.content {
        EntryContent::Text { text, language, .. } => {
            renderer.render_text(&entry.path, text, *language)
        }
        EntryContent::Binary => renderer.render_binary(&entry.path, entry.byte_size),
    }
}

const DOCUMENT_TEMPLATE_NAME: &str = "document";

/// Template data for one file section. `body` is markup from the [`Renderer`].
#[derive(Debug, Serialize)]
struct EntryView<'a> {
    path: &'a str,
    anchor: String,
    size_label: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct DocumentView<'a> {
    title: &'a str,
    summary: &'a RenderSummary,
    tree: String,
    entries: Vec<EntryView<'a>>,
    skipped: &'a [SkippedFile],
}

impl<'a> DocumentView<'a> {
    fn new(title: &'a str, assembly: &'a Assembly, renderer: &dyn Renderer) -> Self {
        let entries = assembly
            .entries
            .iter()
            .map(|entry| EntryView {
                path: &entry.path,
                anchor: anchor_for(&entry.path),
                size_label: match entry.line_count() {
                    Some(lines) => format!("{lines} lines"),
                    None => "binary".to_string(),
                },
                body: render_entry(entry, renderer),
            })
            .collect();

        Self {
            title,
            summary: &assembly.summary,
            tree: directory_tree(assembly.entries.iter().map(|e| e.path.as_str())),
            entries,
            skipped: &assembly.skipped,
        }
    }
}

/// HTML page writer: summary, tree, table of contents, file sections, skipped list.
#[derive(Debug)]
pub struct HtmlWriter {
    handlebars: Handlebars<'static>,
}

impl HtmlWriter {
    pub fn new() -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_template_string(
            DOCUMENT_TEMPLATE_NAME,
            include_str!("templates/document.hbs"),
        )?;
        Ok(Self { handlebars })
    }

    pub fn render(
        &self,
        title: &str,
        assembly: &Assembly,
        renderer: &dyn Renderer,
    ) -> Result<String, RenderError> {
        let view = DocumentView::new(title, assembly, renderer);
        Ok(self.handlebars.render(DOCUMENT_TEMPLATE_NAME, &view)?)
    }
}

/// Renders the HTML page with the built-in template.
pub fn write_html(
    title: &str,
    assembly: &Assembly,
    renderer: &dyn Renderer,
) -> Result<String, RenderError> {
    HtmlWriter::new()?.render(title, assembly, renderer)
}

/// Writes the CXML view. Binary entries are left out; indexes count text documents only.
pub fn write_cxml(assembly: &Assembly) -> String {
    let mut out = String::from("<documents>\n");
    let texts = assembly.entries.iter().filter_map(|entry| match &entry.content {
        EntryContent::Text { text, .. } => Some((entry.path.as_str(), text.as_str())),
        EntryContent::Binary => None,
    });

    for (index, (path, text)) in texts.enumerate() {
        let _ = writeln!(out, "<document index=\"{}\">", index + 1);
        let _ = writeln!(out, "<source>{path}</source>");
        let _ = writeln!(out, "<document_content>");
        out.push_str(text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
        let _ = writeln!(out, "</document_content>");
        let _ = writeln!(out, "</document>");
    }
    out.push_str("</documents>\n");
    out
}
