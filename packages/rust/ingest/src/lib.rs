//! Project document ingestion.
//!
//! A project is a folder of PDF, DOCX/DOC and TXT files. This crate finds
//! them, reads each one fail-soft (a broken file contributes empty text and a
//! warning), and concatenates everything into one corpus with a boundary
//! marker before every file.

mod readers;

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use reqminer_shared::{CONTEXT_FILE_PREFIX, ReqMinerError, Result, SUMMARY_FILE_PREFIX};

// ---------------------------------------------------------------------------
// DocumentKind
// ---------------------------------------------------------------------------

/// Supported source formats, in the order files are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Doc,
    Txt,
}

impl DocumentKind {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Txt => "txt",
        }
    }
}

/// Read one file according to its kind. Legacy `.doc` goes through the DOCX
/// reader and normally fails.
pub fn read_document(path: &Path, kind: DocumentKind) -> Result<String> {
    match kind {
        DocumentKind::Pdf => readers::read_pdf(path),
        DocumentKind::Docx | DocumentKind::Doc => readers::read_docx(path),
        DocumentKind::Txt => readers::read_txt(path),
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One ingested file.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: DocumentKind,
    /// Extracted text; empty when the file could not be read.
    pub text: String,
}

/// Summary of a folder ingestion.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub documents: Vec<Document>,
    /// Files whose reader failed (path, error message).
    pub failures: Vec<(PathBuf, String)>,
}

impl IngestReport {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// True when at least one document yielded non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.documents.iter().any(|d| !d.text.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Folder handling
// ---------------------------------------------------------------------------

/// The folder holding a project's documents: `custom` when given, otherwise
/// `<docs_root>/<project_id>`.
pub fn resolve_project_folder(
    docs_root: &Path,
    project_id: &str,
    custom: Option<&Path>,
) -> PathBuf {
    match custom {
        Some(path) => path.to_path_buf(),
        None => docs_root.join(project_id),
    }
}

/// Files produced by a previous run; never fed back into extraction.
pub fn is_generated_output(file_name: &str) -> bool {
    (file_name.starts_with(CONTEXT_FILE_PREFIX) || file_name.starts_with(SUMMARY_FILE_PREFIX))
        && file_name.to_ascii_lowercase().ends_with(".txt")
}

/// List supported files in `folder` (non-recursive), ordered by kind then name.
pub fn discover_files(folder: &Path) -> Result<Vec<(PathBuf, DocumentKind)>> {
    if !folder.is_dir() {
        return Err(ReqMinerError::io(
            folder,
            std::io::Error::new(std::io::ErrorKind::NotFound, "project folder not found"),
        ));
    }

    let entries = std::fs::read_dir(folder).map_err(|e| ReqMinerError::io(folder, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReqMinerError::io(folder, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(kind) = DocumentKind::from_path(&path) else {
            continue;
        };
        let name = file_name_of(&path);
        if is_generated_output(&name) {
            continue;
        }
        files.push((path, kind));
    }

    files.sort_by(|(a_path, a_kind), (b_path, b_kind)| {
        a_kind.cmp(b_kind).then_with(|| a_path.cmp(b_path))
    });

    Ok(files)
}

/// Read every supported file in `folder`. Unreadable files are kept with
/// empty text and recorded in [`IngestReport::failures`].
#[instrument(skip_all, fields(folder = %folder.display()))]
pub fn load_documents(folder: &Path) -> Result<IngestReport> {
    let files = discover_files(folder)?;
    info!(files = files.len(), "reading project documents");

    let mut report = IngestReport::default();
    for (path, kind) in files {
        let file_name = file_name_of(&path);
        info!(file = %file_name, kind = kind.as_str(), "processing document");

        let text = match read_document(&path, kind) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    file = %file_name,
                    error = %e,
                    "could not read document, continuing with empty text"
                );
                report.failures.push((path.clone(), e.to_string()));
                String::new()
            }
        };

        report.documents.push(Document {
            path,
            file_name,
            kind,
            text,
        });
    }

    Ok(report)
}

/// Marker inserted before each file's text in the corpus.
pub fn file_marker(file_name: &str) -> String {
    format!("\n\n### ARQUIVO: {file_name} ###\n\n")
}

/// Concatenate documents into one corpus, trimmed at both ends.
pub fn build_corpus(documents: &[Document]) -> String {
    let mut corpus = String::new();
    for doc in documents {
        corpus.push_str(&file_marker(&doc.file_name));
        corpus.push_str(&doc.text);
    }
    corpus.trim().to_string()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn project_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reqminer_ingest_{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("create project dir");
        dir
    }

    fn doc(name: &str, text: &str) -> Document {
        Document {
            path: PathBuf::from(name),
            file_name: name.into(),
            kind: DocumentKind::Txt,
            text: text.into(),
        }
    }

    #[test]
    fn kind_from_extension_is_case_insensitive() {
        assert_eq!(DocumentKind::from_path(Path::new("a.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("b.Docx")), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_path(Path::new("c.doc")), Some(DocumentKind::Doc));
        assert_eq!(DocumentKind::from_path(Path::new("d.txt")), Some(DocumentKind::Txt));
        assert_eq!(DocumentKind::from_path(Path::new("e.md")), None);
        assert_eq!(DocumentKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn project_folder_prefers_custom_path() {
        let root = Path::new("/docs");
        assert_eq!(
            resolve_project_folder(root, "ACME", None),
            PathBuf::from("/docs/ACME")
        );
        assert_eq!(
            resolve_project_folder(root, "ACME", Some(Path::new("/elsewhere"))),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn generated_outputs_are_recognised() {
        assert!(is_generated_output("CONTEXTO_ACME.txt"));
        assert!(is_generated_output("RESUMO_IA_ACME.txt"));
        assert!(!is_generated_output("contexto_geral.txt"));
        assert!(!is_generated_output("CONTEXTO_ACME.pdf"));
    }

    #[test]
    fn discover_orders_by_kind_then_name_and_skips_outputs() {
        let dir = project_dir();
        for name in [
            "b.txt",
            "a.txt",
            "manual.pdf",
            "notes.md",
            "CONTEXTO_P1.txt",
            "RESUMO_IA_P1.txt",
            "escopo.docx",
        ] {
            std::fs::write(dir.join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.join("sub.txt")).unwrap();

        let names: Vec<String> = discover_files(&dir)
            .unwrap()
            .iter()
            .map(|(p, _)| file_name_of(p))
            .collect();
        assert_eq!(names, ["manual.pdf", "escopo.docx", "a.txt", "b.txt"]);
    }

    #[test]
    fn missing_folder_is_error() {
        let missing = std::env::temp_dir().join(format!("reqminer_missing_{}", Uuid::now_v7()));
        assert!(matches!(
            discover_files(&missing),
            Err(ReqMinerError::Io { .. })
        ));
    }

    #[test]
    fn unreadable_files_degrade_to_empty_text() {
        let dir = project_dir();
        std::fs::write(dir.join("broken.pdf"), b"not a pdf").unwrap();
        std::fs::write(dir.join("ok.txt"), "O sistema deve gerar boletos.").unwrap();

        let report = load_documents(&dir).unwrap();
        assert_eq!(report.documents.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.documents[0].file_name, "broken.pdf");
        assert!(report.documents[0].text.is_empty());
        assert_eq!(report.documents[1].text, "O sistema deve gerar boletos.");
    }

    #[test]
    fn report_without_text_is_detected() {
        let blank = IngestReport {
            documents: vec![doc("a.txt", ""), doc("b.txt", "  \n\t")],
            failures: Vec::new(),
        };
        assert!(!blank.is_empty());
        assert!(!blank.has_text());

        let some = IngestReport {
            documents: vec![doc("a.txt", ""), doc("b.txt", "requisito")],
            failures: Vec::new(),
        };
        assert!(some.has_text());
    }

    #[test]
    fn empty_folder_yields_empty_report() {
        let dir = project_dir();
        let report = load_documents(&dir).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn corpus_inserts_markers_and_trims() {
        let corpus = build_corpus(&[doc("a.txt", "alpha beta  "), doc("b.txt", "gamma\n")]);
        assert_eq!(
            corpus,
            "### ARQUIVO: a.txt ###\n\nalpha beta  \n\n### ARQUIVO: b.txt ###\n\ngamma"
        );
    }

    #[test]
    fn corpus_of_nothing_is_empty() {
        assert!(build_corpus(&[]).is_empty());
    }
}
