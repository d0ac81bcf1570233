//! Source text loading.

use std::path::Path;

use tracing::debug;

use bookbinder_shared::{BookbinderError, Result};

/// Read the file at `path` fully into memory, decoded as UTF-8 (the fixed
/// input encoding).
///
/// A missing or unreadable path yields [`BookbinderError::Read`]; bytes that
/// are not valid UTF-8 yield [`BookbinderError::Decode`]. No side effects
/// beyond the read.
pub fn load_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| BookbinderError::read(path, e))?;

    let text = String::from_utf8(bytes)
        .map_err(|e| BookbinderError::decode(path, e.utf8_error().to_string()))?;

    debug!(path = %path.display(), chars = text.chars().count(), "text loaded");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("bb-loader-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn loads_utf8_text() {
        let path = temp_file("book.txt", "Había una vez…".as_bytes());
        let text = load_text(&path).unwrap();
        assert_eq!(text, "Había una vez…");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_text(Path::new("/nonexistent-bb/book.txt")).unwrap_err();
        assert!(matches!(err, BookbinderError::Read { .. }));
    }

    #[test]
    fn invalid_utf8_is_decode_error() {
        // 0xFF is never valid in UTF-8.
        let path = temp_file("latin1.txt", &[0x48, 0x6F, 0x6C, 0x61, 0xFF]);
        let err = load_text(&path).unwrap_err();
        assert!(matches!(err, BookbinderError::Decode { .. }));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
