//! Core conversion pipeline for bookbinder.
//!
//! Wires the source loader, the structure extractor, and the EPUB assembler
//! into a single forward pipeline:
//!
//! ```text
//! load_text → extract_structure → write_epub
//! ```

pub mod extractor;
pub mod loader;
pub mod pipeline;

pub use extractor::{ChapterFold, ExtractOptions, chunk_text, extract_structure};
pub use loader::load_text;
pub use pipeline::{ConvertConfig, ConvertResult, ProgressReporter, SilentProgress, convert};
