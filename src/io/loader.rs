use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    // Self-closing tags (empty paragraphs/runs) carry no text and must not
    // swallow the element that follows them
    static ref PARAGRAPH_RE: Regex =
        Regex::new(r"(?s)<w:p(?:\s[^>]*[^/>]|\s)?>(.*?)</w:p>").unwrap();
    static ref TEXT_RUN_RE: Regex =
        Regex::new(r"(?s)<w:t(?:\s[^>]*[^/>]|\s)?>(.*?)</w:t>").unwrap();
}

/// Failures while loading a document's text.
///
/// `UnsupportedFormat` is a skippable condition: batch ingest moves on to
/// the next file instead of aborting.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file type: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid document archive {path:?}: {source}")]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },
}

/// Load the full text content of a `.txt` or `.docx` file.
pub fn load_text(path: &Path) -> Result<String, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("txt") => std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        }),
        Some("docx") => read_docx(path),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Extract paragraph text out of a Word document.
///
/// A `.docx` file is a zip archive; the body lives in `word/document.xml`
/// as `<w:p>` paragraphs whose visible text sits in `<w:t>` runs. Runs are
/// concatenated per paragraph and paragraphs joined with newlines, which
/// is what the speaker segmenter expects.
fn read_docx(path: &Path) -> Result<String, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| LoadError::Archive {
        path: path.to_path_buf(),
        source,
    })?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|source| LoadError::Archive {
            path: path.to_path_buf(),
            source,
        })?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(extract_paragraphs(&xml))
}

fn extract_paragraphs(xml: &str) -> String {
    let mut paragraphs = Vec::new();
    for paragraph in PARAGRAPH_RE.captures_iter(xml) {
        let text: String = TEXT_RUN_RE
            .captures_iter(&paragraph[1])
            .map(|run| unescape_xml(&run[1]))
            .collect();
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }
    paragraphs.join("\n")
}

pub(crate) fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::FileOptions;
    use zip::ZipWriter;

    use super::*;

    fn write_docx(path: &Path, document_xml: &str) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        writer
            .start_file("word/document.xml", FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_load_txt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stenograma.txt");
        std::fs::write(&path, "PIRMININKAS: Sveiki.").unwrap();

        assert_eq!(load_text(&path).unwrap(), "PIRMININKAS: Sveiki.");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_text(Path::new("stenograma.pdf")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_docx_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stenograma.docx");
        write_docx(
            &path,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:t>PIRMININKAS: Sveiki </w:t></w:r><w:r><w:t>visi.</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t xml:space="preserve">Kitas sakinys &amp; dar.</w:t></w:r></w:p>
</w:body>
</w:document>"#,
        );

        let text = load_text(&path).unwrap();
        assert_eq!(text, "PIRMININKAS: Sveiki visi.\nKitas sakinys & dar.");
    }

    #[test]
    fn test_docx_without_document_xml_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuscias.docx");
        let file = File::create(&path).unwrap();
        let mut writer = ZipWriter::new(file);
        writer
            .start_file("word/other.xml", FileOptions::default())
            .unwrap();
        writer.write_all(b"<w:p/>").unwrap();
        writer.finish().unwrap();

        let err = load_text(&path).unwrap_err();
        assert!(matches!(err, LoadError::Archive { .. }));
    }

    #[test]
    fn test_unescape_xml_entities() {
        assert_eq!(unescape_xml("a &lt;b&gt; &amp;amp;"), "a <b> &amp;");
    }
}
