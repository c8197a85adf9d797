//! Run output files.
//!
//! Each successful run writes two flat text files into the project folder:
//! ```text
//! <folder>/
//! ├── CONTEXTO_<id>.txt    header line + consolidated document
//! └── RESUMO_IA_<id>.txt   executive summary only
//! ```

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use reqminer_shared::{CONTEXT_FILE_PREFIX, ReqMinerError, Result, SUMMARY_FILE_PREFIX};

use crate::consolidation::Consolidation;

/// Paths of the files written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub context: PathBuf,
    pub summary: PathBuf,
}

/// First line of every context file.
pub fn context_header(project_id: &str) -> String {
    format!("# BASE DE CONHECIMENTO CONSOLIDADA — PROJETO {project_id}")
}

pub fn context_file_path(folder: &Path, project_id: &str) -> PathBuf {
    folder.join(format!("{CONTEXT_FILE_PREFIX}{project_id}.txt"))
}

pub fn summary_file_path(folder: &Path, project_id: &str) -> PathBuf {
    folder.join(format!("{SUMMARY_FILE_PREFIX}{project_id}.txt"))
}

/// Write both output files, creating `folder` if needed. Existing files are replaced.
#[instrument(skip_all, fields(folder = %folder.display(), project = %project_id))]
pub fn write_outputs(
    folder: &Path,
    project_id: &str,
    consolidation: &Consolidation,
) -> Result<OutputPaths> {
    std::fs::create_dir_all(folder).map_err(|e| ReqMinerError::io(folder, e))?;

    let paths = OutputPaths {
        context: context_file_path(folder, project_id),
        summary: summary_file_path(folder, project_id),
    };

    let context = format!(
        "{}\n\n{}",
        context_header(project_id),
        consolidation.document
    );
    std::fs::write(&paths.context, context).map_err(|e| ReqMinerError::io(&paths.context, e))?;
    std::fs::write(&paths.summary, &consolidation.summary)
        .map_err(|e| ReqMinerError::io(&paths.summary, e))?;

    info!(
        context = %paths.context.display(),
        summary = %paths.summary.display(),
        "output files written"
    );

    Ok(paths)
}
