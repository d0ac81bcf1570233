//! Structure extraction: turns raw text plus an annotation capability into a
//! [`BookStructure`].
//!
//! Detection is substring/regex matching against the model's natural-language
//! output. The response format is a verbal contract, not a structured one: a
//! reworded or localized label silently yields empty/default fields rather
//! than an error. The prompt text and the `Título:`/`Autor:`/`NUEVO
//! CAPÍTULO:` labels are preserved verbatim for compatibility with that
//! contract.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};

use bookbinder_annotator::Annotator;
use bookbinder_shared::{BookStructure, Chapter, Result};

use crate::pipeline::ProgressReporter;

/// Title synthesized when no chapter boundary was ever detected and no
/// content accumulated; its single fragment is the untouched input text.
pub const FALLBACK_CHAPTER_TITLE: &str = "Full book";

/// Line label announcing a chapter boundary in an annotation response.
const CHAPTER_MARKER: &str = "NUEVO CAPÍTULO:";

/// System instruction for the initial analysis pass.
const ANALYSIS_INSTRUCTION: &str = "Analiza este texto y extrae: título del libro, autor (si se \
     menciona), y una estructura de capítulos propuesta. Si no hay capítulos claros, sugiere una \
     división lógica.";

/// System instruction for the per-chunk annotation pass.
const CHUNK_INSTRUCTION: &str = "Eres un asistente especializado en formato de libros.";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Título:[ \t]*(.+)$").expect("valid regex"));

static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Autor:[ \t]*(.+)$").expect("valid regex"));

static MARKER_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"NUEVO CAPÍTULO:[ \t]*(.+)").expect("valid regex"));

static MARKER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"NUEVO CAPÍTULO:[ \t]*.+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Tuning for the extraction passes.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Characters submitted in the initial analysis pass.
    pub analysis_window: usize,
    /// Maximum characters per annotation chunk.
    pub chunk_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            analysis_window: 4_000,
            chunk_size: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract the book structure from `text`.
///
/// 1. Submit the opening excerpt for title/author analysis.
/// 2. Split the full text into sequential chunks and annotate each in order,
///    folding responses into chapters via [`ChapterFold`].
/// 3. Apply the catch-all fallback if nothing accumulated.
///
/// Any annotator failure aborts the whole extraction; no partial structure
/// is salvaged and no call is retried.
#[instrument(skip_all, fields(chars = text.chars().count()))]
pub async fn extract_structure<A: Annotator>(
    annotator: &A,
    text: &str,
    options: &ExtractOptions,
    progress: &dyn ProgressReporter,
) -> Result<BookStructure> {
    progress.phase("Analyzing opening excerpt");
    let excerpt = char_prefix(text, options.analysis_window);
    let analysis = annotator.submit(ANALYSIS_INSTRUCTION, excerpt).await?;

    let title = capture_label(&TITLE_RE, &analysis);
    let author = capture_label(&AUTHOR_RE, &analysis);
    debug!(title = %title, author = %author, "initial analysis parsed");

    let chunks = chunk_text(text, options.chunk_size);
    let total = chunks.len();
    info!(chunks = total, "annotating text fragments");

    let mut fold = ChapterFold::new();
    for (i, chunk) in chunks.iter().enumerate() {
        progress.chunk_annotated(i + 1, total);
        let response = annotator
            .submit(CHUNK_INSTRUCTION, &chunk_prompt(chunk))
            .await?;

        match split_boundary(&response) {
            Some((marker_title, body)) => fold.boundary(marker_title, body),
            None => fold.fragment(response),
        }
    }

    let mut chapters = fold.finish();
    if chapters.is_empty() {
        debug!("no chapter content detected, synthesizing catch-all chapter");
        chapters.push(Chapter {
            title: FALLBACK_CHAPTER_TITLE.into(),
            content: vec![text.to_string()],
        });
    }

    Ok(BookStructure {
        title,
        author,
        chapters,
    })
}

/// User prompt for a single chunk. The marker wording is part of the model
/// contract and must match [`CHAPTER_MARKER`].
fn chunk_prompt(fragment: &str) -> String {
    format!(
        "Este es un fragmento de texto de un libro. Identifica si hay un nuevo capítulo, y \
         estructura el texto en párrafos coherentes. Si detectas el inicio de un nuevo capítulo, \
         indícalo claramente con 'NUEVO CAPÍTULO: [título]'. Fragmento: {fragment}"
    )
}

/// First capture of `re` in `response`, or empty. An absent label is not an
/// error.
fn capture_label(re: &Regex, response: &str) -> String {
    re.captures(response)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default()
}

/// Detect a chapter boundary in a chunk response.
///
/// Returns the extracted title (`None` when the marker is present but no
/// title follows it) and the response with the marker line stripped.
fn split_boundary(response: &str) -> Option<(Option<String>, String)> {
    if !response.contains(CHAPTER_MARKER) {
        return None;
    }

    let title = MARKER_TITLE_RE
        .captures(response)
        .map(|c| c[1].trim().to_string());
    let body = MARKER_LINE_RE.replace_all(response, "").trim().to_string();

    Some((title, body))
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Sequential non-overlapping slices of at most `chunk_size` characters,
/// in original order. Slicing is char-bounded; the final chunk may be
/// shorter. Empty input yields no chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<&str> {
    debug_assert!(chunk_size > 0);

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

/// Char-bounded prefix of at most `max_chars` characters.
fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Chapter fold
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum FoldState {
    /// No chapter in progress.
    Flushed,
    /// A chapter is being accumulated from chunk responses.
    Accumulating(Chapter),
}

/// Stateful fold over chunk responses with a single current-chapter
/// accumulator.
///
/// Transitions: a boundary flushes the accumulator (if non-empty) and opens
/// a new titled chapter; a plain fragment extends the accumulator, opening
/// an untitled one from the `Flushed` state; `finish` applies the final
/// flush. An empty chapter (no title, no content) is never persisted.
#[derive(Debug)]
pub struct ChapterFold {
    state: FoldState,
    chapters: Vec<Chapter>,
}

impl ChapterFold {
    pub fn new() -> Self {
        Self {
            state: FoldState::Flushed,
            chapters: Vec::new(),
        }
    }

    /// Chapters completed so far.
    pub fn completed(&self) -> usize {
        self.chapters.len()
    }

    /// A chapter boundary was detected. `title` of `None` synthesizes
    /// "Chapter {n+1}" from the completed count (after flushing the previous
    /// accumulator).
    pub fn boundary(&mut self, title: Option<String>, first_fragment: String) {
        self.flush();

        let title = title.unwrap_or_else(|| format!("Chapter {}", self.chapters.len() + 1));
        let mut content = Vec::new();
        if !first_fragment.trim().is_empty() {
            content.push(first_fragment);
        }

        self.state = FoldState::Accumulating(Chapter { title, content });
    }

    /// A boundary-free response extends the current chapter. Blank responses
    /// are ignored so an annotation run that yields no text leaves the
    /// accumulator empty.
    pub fn fragment(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }

        match &mut self.state {
            FoldState::Accumulating(chapter) => chapter.content.push(text),
            FoldState::Flushed => {
                self.state = FoldState::Accumulating(Chapter {
                    title: String::new(),
                    content: vec![text],
                });
            }
        }
    }

    /// Flush the final accumulator and return the completed chapters in
    /// detection order.
    pub fn finish(mut self) -> Vec<Chapter> {
        self.flush();
        self.chapters
    }

    fn flush(&mut self) {
        if let FoldState::Accumulating(chapter) = std::mem::replace(&mut self.state, FoldState::Flushed)
        {
            if !chapter.is_empty() {
                self.chapters.push(chapter);
            }
        }
    }
}

impl Default for ChapterFold {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
