//! End-to-end `convert` pipeline: text file → structure extraction → EPUB.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument};

use bookbinder_annotator::Annotator;
use bookbinder_epub::EpubOptions;
use bookbinder_shared::Result;

use crate::extractor::{self, ExtractOptions};
use crate::loader;

/// Configuration for the `convert` pipeline.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Source text file.
    pub input: PathBuf,
    /// Output EPUB path.
    pub output: PathBuf,
    /// Language tag for EPUB metadata and chapter documents.
    pub language: String,
    /// Extraction tuning.
    pub extract: ExtractOptions,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Path the EPUB was written to.
    pub output_path: PathBuf,
    /// Resolved document title (placeholder applied if none detected).
    pub title: String,
    /// Detected author; empty if none.
    pub author: String,
    /// Number of chapters in the output.
    pub chapter_count: usize,
    /// Characters in the source text.
    pub char_count: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the source text is in memory.
    fn text_loaded(&self, char_count: usize);
    /// Called for each text fragment submitted for annotation.
    fn chunk_annotated(&self, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &ConvertResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn text_loaded(&self, _char_count: usize) {}
    fn chunk_annotated(&self, _current: usize, _total: usize) {}
    fn done(&self, _result: &ConvertResult) {}
}

/// Run the full conversion pipeline.
///
/// 1. Load and decode the source text
/// 2. Extract the book structure via the annotator
/// 3. Assemble and write the EPUB
///
/// Strictly sequential: each annotation call blocks the pipeline until it
/// returns, and every error is fatal. The output file is only created after
/// extraction has succeeded, so a failed run leaves nothing behind.
#[instrument(skip_all, fields(input = %config.input.display(), output = %config.output.display()))]
pub async fn convert<A: Annotator>(
    config: &ConvertConfig,
    annotator: &A,
    progress: &dyn ProgressReporter,
) -> Result<ConvertResult> {
    let start = Instant::now();

    progress.phase("Loading text");
    let text = loader::load_text(&config.input)?;
    let char_count = text.chars().count();
    progress.text_loaded(char_count);

    progress.phase("Processing text");
    let structure = extractor::extract_structure(annotator, &text, &config.extract, progress).await?;

    progress.phase("Assembling EPUB");
    let epub_options = EpubOptions {
        language: config.language.clone(),
    };
    bookbinder_epub::write_epub(&structure, &config.output, &epub_options)?;

    let result = ConvertResult {
        output_path: config.output.clone(),
        title: bookbinder_epub::resolve_book_title(&structure).to_string(),
        author: structure.author.clone(),
        chapter_count: structure.chapters.len(),
        char_count,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        title = %result.title,
        chapters = result.chapter_count,
        chars = result.char_count,
        elapsed_ms = result.elapsed.as_millis(),
        "conversion complete"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use bookbinder_shared::BookbinderError;

    struct ScriptedAnnotator {
        responses: Mutex<VecDeque<Result<String>>>,
    }

    impl ScriptedAnnotator {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
            }
        }
    }

    impl Annotator for ScriptedAnnotator {
        async fn submit(&self, _system_instruction: &str, _payload: &str) -> Result<String> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("annotator script exhausted")
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bb-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_config(dir: &std::path::Path) -> ConvertConfig {
        ConvertConfig {
            input: dir.join("book.txt"),
            output: dir.join("book.epub"),
            language: "es".into(),
            extract: ExtractOptions::default(),
        }
    }

    #[tokio::test]
    async fn converts_text_file_to_epub() {
        let dir = temp_dir();
        let config = make_config(&dir);
        std::fs::write(&config.input, "Some source prose for the book.").unwrap();

        let annotator = ScriptedAnnotator::new(vec![
            Ok("Título: La Obra\nAutor: Fulano de Tal".into()),
            Ok("NUEVO CAPÍTULO: Part One\nReflowed prose.".into()),
        ]);

        let result = convert(&config, &annotator, &SilentProgress).await.unwrap();

        assert_eq!(result.title, "La Obra");
        assert_eq!(result.author, "Fulano de Tal");
        assert_eq!(result.chapter_count, 1);
        assert!(result.char_count > 0);
        assert!(std::fs::metadata(&config.output).unwrap().len() > 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn annotation_failure_leaves_no_output_file() {
        let dir = temp_dir();
        let config = make_config(&dir);
        std::fs::write(&config.input, "x".repeat(25_000)).unwrap();

        let annotator = ScriptedAnnotator::new(vec![
            Ok("Título: La Obra".into()),
            Ok("chunk one prose".into()),
            Err(BookbinderError::annotation("HTTP 500: upstream failure")),
            Ok("never reached".into()),
        ]);

        let err = convert(&config, &annotator, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, BookbinderError::Annotation(_)));
        assert!(!config.output.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_input_is_read_error() {
        let dir = temp_dir();
        let config = make_config(&dir); // input never written

        let annotator = ScriptedAnnotator::new(vec![]);
        let err = convert(&config, &annotator, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, BookbinderError::Read { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
