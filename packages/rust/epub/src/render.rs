//! Chapter XHTML rendering and the shared stylesheet.

use bookbinder_shared::Chapter;

/// Stylesheet applied to every chapter document: serif body, justified
/// text, indented first line per paragraph, centered headings.
pub const STYLESHEET: &str = "\
body {
    font-family: 'Times New Roman', serif;
    margin: 5%;
    text-align: justify;
}
h1 {
    text-align: center;
    margin-bottom: 1em;
}
p {
    text-indent: 1.5em;
    margin-top: 0.5em;
    margin-bottom: 0.5em;
    line-height: 1.5;
}
";

/// Resolve the display title for the chapter at `index` (0-based).
pub fn display_title(chapter: &Chapter, index: usize) -> String {
    if chapter.title.is_empty() {
        format!("Chapter {}", index + 1)
    } else {
        chapter.title.clone()
    }
}

/// Split a chapter's content fragments into display paragraphs.
///
/// Fragments are joined with a double line break and the block is split back
/// on double line breaks, so a paragraph spanning a fragment boundary stays
/// split the way the annotation responses delivered it. Within a paragraph,
/// remaining single line breaks collapse into spaces; blank paragraphs are
/// dropped.
pub fn paragraphs(fragments: &[String]) -> Vec<String> {
    fragments
        .join("\n\n")
        .split("\n\n")
        .filter_map(|paragraph| {
            let collapsed = paragraph.replace('\n', " ");
            let trimmed = collapsed.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Render one chapter as a complete XHTML document.
///
/// Chapter text is inserted as-is. Annotation responses are expected to be
/// plain prose; markup-unsafe characters are not escaped (a known
/// limitation inherited from the annotation contract).
pub fn render_chapter(title: &str, fragments: &[String], language: &str) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>{title}</h1>\n"));
    for paragraph in paragraphs(fragments) {
        body.push_str(&format!("<p>{paragraph}</p>\n"));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE html>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\" xml:lang=\"{language}\" lang=\"{language}\">\n\
         <head>\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" type=\"text/css\" href=\"stylesheet.css\"/>\n\
         </head>\n\
         <body>\n\
         {body}\
         </body>\n\
         </html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn display_title_prefers_chapter_title() {
        let chapter = Chapter {
            title: "Part Two".into(),
            content: vec![],
        };
        assert_eq!(display_title(&chapter, 1), "Part Two");
    }

    #[test]
    fn display_title_synthesizes_from_index() {
        let chapter = Chapter::default();
        assert_eq!(display_title(&chapter, 0), "Chapter 1");
        assert_eq!(display_title(&chapter, 6), "Chapter 7");
    }

    #[test]
    fn paragraphs_split_on_double_breaks() {
        let result = paragraphs(&fragments(&["First paragraph.\n\nSecond paragraph."]));
        assert_eq!(result, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn paragraphs_collapse_single_breaks() {
        let result = paragraphs(&fragments(&["One line\nbroken in\ntwo places."]));
        assert_eq!(result, vec!["One line broken in two places."]);
    }

    #[test]
    fn paragraphs_drop_blanks() {
        let result = paragraphs(&fragments(&["First.\n\n\n\nSecond.", "  \n ", "Third."]));
        assert_eq!(result, vec!["First.", "Second.", "Third."]);
    }

    #[test]
    fn paragraphs_join_fragments_as_separate_blocks() {
        let result = paragraphs(&fragments(&["From chunk one.", "From chunk two."]));
        assert_eq!(result, vec!["From chunk one.", "From chunk two."]);
    }

    #[test]
    fn paragraph_splitting_is_idempotent() {
        let input = fragments(&["Alpha one.\nAlpha two.\n\nBeta.", "Gamma.\n\nDelta."]);
        let first = paragraphs(&input);
        let second = paragraphs(&[first.join("\n\n")]);
        assert_eq!(first, second);
    }

    #[test]
    fn render_chapter_produces_full_document() {
        let xhtml = render_chapter(
            "Chapter 1",
            &fragments(&["Some prose.\n\nMore prose."]),
            "es",
        );
        assert!(xhtml.starts_with("<?xml"));
        assert!(xhtml.contains("<h1>Chapter 1</h1>"));
        assert!(xhtml.contains("<p>Some prose.</p>"));
        assert!(xhtml.contains("<p>More prose.</p>"));
        assert!(xhtml.contains("href=\"stylesheet.css\""));
        assert!(xhtml.contains("xml:lang=\"es\""));
    }

    #[test]
    fn render_chapter_with_no_content_still_has_heading() {
        let xhtml = render_chapter("Empty", &[], "en");
        assert!(xhtml.contains("<h1>Empty</h1>"));
        assert!(!xhtml.contains("<p>"));
    }
}
