//! Poem extraction
//!
//! Turns the HTML of a single poem page into a [`Record`]. Extraction is pure:
//! it never touches the network or the disk, so a bad page only ever costs
//! that one record.

use crate::config::SiteProfile;
use crate::crawler::compile_selector;
use crate::ConfigError;
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;

/// Separator placed between stanzas and before the trailing metadata line
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// One extracted poem, the unit written to the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub author: String,
    pub title: String,
    pub body: String,
}

impl Record {
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// A required part of the poem page was not found
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("document is missing its {0}")]
    MissingField(&'static str),
}

/// Compiled selectors for the parts of a poem page
#[derive(Debug, Clone)]
pub struct Extractor {
    root: Selector,
    author: Selector,
    title: Selector,
    stanza_container: Selector,
    stanza: Selector,
    metadata: Selector,
}

impl Extractor {
    /// Compiles the poem page selectors of a site profile
    pub fn new(site: &SiteProfile) -> Result<Self, ConfigError> {
        Ok(Self {
            root: compile_selector("document-root", &site.document_root)?,
            author: compile_selector("author", &site.author)?,
            title: compile_selector("title", &site.title)?,
            stanza_container: compile_selector("stanza-container", &site.stanza_container)?,
            stanza: compile_selector("stanza", &site.stanza)?,
            metadata: compile_selector("metadata", &site.metadata)?,
        })
    }

    /// Extracts author, title and body from a poem page
    ///
    /// The body is every stanza paragraph (paragraphs without a class) inside
    /// the stanza container, each with its `<br>` markers turned into line
    /// breaks, joined by blank lines. When the container also holds a
    /// metadata block, usually the year, its text follows after one more
    /// blank line.
    ///
    /// # Errors
    ///
    /// `ExtractionError::MissingField` if the document root, author, title or
    /// stanza container cannot be found.
    pub fn extract(&self, raw: &str) -> Result<Record, ExtractionError> {
        let document = Html::parse_document(raw);

        let root = document
            .select(&self.root)
            .next()
            .ok_or(ExtractionError::MissingField("document root"))?;

        let author = first_text(root, &self.author).ok_or(ExtractionError::MissingField("author"))?;
        let title = first_text(root, &self.title).ok_or(ExtractionError::MissingField("title"))?;

        let container = root
            .select(&self.stanza_container)
            .next()
            .ok_or(ExtractionError::MissingField("stanza container"))?;

        let stanzas: Vec<String> = container
            .select(&self.stanza)
            .filter(|p| is_unclassed(p))
            .map(stanza_text)
            .collect();

        let mut body = stanzas.join(PARAGRAPH_SEPARATOR);

        if let Some(metadata) = container.select(&self.metadata).next() {
            body.push_str(PARAGRAPH_SEPARATOR);
            body.push_str(metadata.text().collect::<String>().trim());
        }

        Ok(Record {
            author,
            title,
            body,
        })
    }
}

/// Trimmed text of the first match under `scope`
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Stanza paragraphs carry no class (or an empty one); styled paragraphs
/// inside the container are decoration
fn is_unclassed(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .attr("class")
        .map_or(true, |class| class.trim().is_empty())
}

/// Text of a stanza with `<br>` turned into `\n` and all other markup dropped
fn stanza_text(paragraph: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in paragraph.descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if e.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}
