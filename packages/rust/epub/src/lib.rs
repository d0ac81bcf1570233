//! EPUB assembly for detected book structures.
//!
//! Renders each chapter into an XHTML sub-document with a shared stylesheet,
//! builds a linear table of contents in detection order, and delegates the
//! container format (OPF, nav, zip layout) to the `epub-builder` crate.

pub mod render;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use epub_builder::{EpubBuilder, EpubContent, EpubVersion, ReferenceType, ZipLibrary};
use tracing::{debug, info, instrument};

use bookbinder_shared::{BookStructure, BookbinderError, Result};

pub use render::{STYLESHEET, display_title, paragraphs, render_chapter};

/// Fixed placeholder used when the extractor found no book title.
pub const UNTITLED_BOOK: &str = "Untitled book";

/// Options for EPUB assembly.
#[derive(Debug, Clone)]
pub struct EpubOptions {
    /// BCP 47 language tag for document metadata and chapter documents.
    pub language: String,
}

impl Default for EpubOptions {
    fn default() -> Self {
        Self {
            language: "es".into(),
        }
    }
}

/// The document title: the detected one, or the fixed placeholder.
pub fn resolve_book_title(structure: &BookStructure) -> &str {
    if structure.title.is_empty() {
        UNTITLED_BOOK
    } else {
        &structure.title
    }
}

/// Package `structure` into an EPUB file at `path`.
#[instrument(skip_all, fields(path = %path.display(), chapters = structure.chapters.len()))]
pub fn write_epub(structure: &BookStructure, path: &Path, options: &EpubOptions) -> Result<()> {
    let mut file = File::create(path)
        .map_err(|e| BookbinderError::write(format!("cannot create {}: {e}", path.display())))?;

    build_epub(structure, options, &mut file)?;

    info!(path = %path.display(), "EPUB written");
    Ok(())
}

/// Build the EPUB container into any writer.
///
/// Reading order is fixed: the navigation page first, then chapters in
/// detection order. Each chapter becomes `chapter_{i+1}.xhtml`, and the TOC
/// carries one entry per chapter linking its display title to that document.
pub fn build_epub(
    structure: &BookStructure,
    options: &EpubOptions,
    writer: &mut impl Write,
) -> Result<()> {
    let zip = ZipLibrary::new().map_err(epub_error)?;
    let mut builder = EpubBuilder::new(zip).map_err(epub_error)?;
    builder.epub_version(EpubVersion::V30);

    builder
        .metadata("title", resolve_book_title(structure))
        .map_err(epub_error)?;
    builder
        .metadata("lang", &options.language)
        .map_err(epub_error)?;
    if !structure.author.is_empty() {
        builder
            .metadata("author", &structure.author)
            .map_err(epub_error)?;
    }

    builder
        .stylesheet(render::STYLESHEET.as_bytes())
        .map_err(epub_error)?;
    builder.inline_toc();

    for (i, chapter) in structure.chapters.iter().enumerate() {
        let title = render::display_title(chapter, i);
        let xhtml = render::render_chapter(&title, &chapter.content, &options.language);

        debug!(index = i + 1, title = %title, "adding chapter document");

        builder
            .add_content(
                EpubContent::new(format!("chapter_{}.xhtml", i + 1), xhtml.as_bytes())
                    .title(title)
                    .reftype(ReferenceType::Text),
            )
            .map_err(epub_error)?;
    }

    builder.generate(writer).map_err(epub_error)
}

fn epub_error(e: impl std::fmt::Display) -> BookbinderError {
    BookbinderError::write(e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
