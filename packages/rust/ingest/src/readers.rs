//! Format readers: each turns one file into plain text or a [`ReqMinerError::Document`].

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use tracing::warn;

use reqminer_shared::{ReqMinerError, Result};

/// Read a UTF-8 text file. Invalid sequences are replaced rather than rejected.
pub(crate) fn read_txt(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| ReqMinerError::io(path, e))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(path = %path.display(), "file is not valid UTF-8, decoding lossily");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Extract the text layer of a PDF, one page after another.
pub(crate) fn read_pdf(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| ReqMinerError::io(path, e))?;

    // pdf-extract can panic on malformed cross-reference tables.
    let extracted = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(&bytes)))
        .map_err(|_| ReqMinerError::document(path, "PDF parser panicked"))?;

    extracted.map_err(|e| ReqMinerError::document(path, e.to_string()))
}

/// Concatenate the paragraph text of a DOCX body, one paragraph per line.
/// Tables are not included.
pub(crate) fn read_docx(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| ReqMinerError::io(path, e))?;
    let doc =
        docx_rs::read_docx(&bytes).map_err(|e| ReqMinerError::document(path, e.to_string()))?;

    let mut paragraphs = Vec::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            let mut line = String::new();
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            line.push_str(&t.text);
                        }
                    }
                }
            }
            paragraphs.push(line);
        }
    }

    Ok(paragraphs.join("\n"))
}
