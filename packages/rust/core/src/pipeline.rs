//! End-to-end run: project folder → corpus → chunks → extraction →
//! consolidation → output files.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use reqminer_inference::InferenceClient;
use reqminer_ingest::{build_corpus, load_documents, resolve_project_folder};
use reqminer_shared::{ChunkConfig, ProfileBook, ProfileSource, ReqMinerError, Result, RunId};

use crate::chunker::TextChunker;
use crate::consolidation::{Consolidation, ConsolidationStage};
use crate::extraction::{ExtractionOutcome, ExtractionStage};
use crate::output::{OutputPaths, write_outputs};

/// Configuration for [`run_project`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Project identifier; names the default folder and the output files.
    pub project_id: String,
    /// Base folder holding one sub-folder per project.
    pub docs_root: PathBuf,
    /// Explicit project folder, overriding `<docs_root>/<project_id>`.
    pub custom_path: Option<PathBuf>,
    /// Model profile to steer extraction.
    pub model_id: Option<String>,
    /// Chunk window sizing.
    pub chunk: ChunkConfig,
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    pub project_id: String,
    pub folder: PathBuf,
    /// Files read (including ones that degraded to empty text).
    pub documents: usize,
    /// Files whose reader failed.
    pub unreadable: usize,
    pub chunks: usize,
    pub profile_source: ProfileSource,
    pub extraction: ExtractionOutcome,
    pub consolidation: Consolidation,
    pub outputs: OutputPaths,
    pub elapsed: Duration,
}

/// How a run ended. Only `Completed` writes output files; the rest are
/// "nothing to do" outcomes, not failures.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Box<RunReport>),
    /// Folder missing or without compatible files.
    NoDocuments { folder: PathBuf },
    /// Documents were found but produced no words.
    NoChunks { folder: PathBuf },
    /// Every chunk was empty, failed, or signalled no relevant information.
    NoExtractions {
        folder: PathBuf,
        extraction: ExtractionOutcome,
    },
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each chunk's extraction call (1-based `current`).
    fn chunk_progress(&self, current: usize, total: usize);
    /// Called when a run completes with output files.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn chunk_progress(&self, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run the full pipeline for one project.
///
/// 1. Read every supported file in the project folder
/// 2. Build the corpus and split it into overlapping chunks
/// 3. Extract per chunk with the resolved model profile
/// 4. Consolidate and summarize
/// 5. Write `CONTEXTO_<id>.txt` and `RESUMO_IA_<id>.txt`
///
/// Errors are returned only for invalid configuration or when the output
/// files cannot be written; everything else degrades or ends early.
#[instrument(skip_all, fields(project = %config.project_id, model = ?config.model_id))]
pub async fn run_project<C: InferenceClient>(
    config: &RunConfig,
    client: &C,
    profiles: &ProfileBook,
    progress: &dyn ProgressReporter,
) -> Result<RunOutcome> {
    let start = Instant::now();
    let run_id = RunId::new();

    validate_project_id(&config.project_id)?;
    let chunker = TextChunker::new(config.chunk)?;

    let folder = resolve_project_folder(
        &config.docs_root,
        &config.project_id,
        config.custom_path.as_deref(),
    );
    info!(%run_id, folder = %folder.display(), "starting run");

    // --- Phase 1: Documents ---
    progress.phase("Reading project documents");
    let ingest = match load_documents(&folder) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "project folder unavailable");
            return Ok(RunOutcome::NoDocuments { folder });
        }
    };

    if ingest.is_empty() {
        warn!(folder = %folder.display(), "no compatible files found");
        return Ok(RunOutcome::NoDocuments { folder });
    }

    // --- Phase 2: Chunking ---
    progress.phase("Splitting text into chunks");
    // File markers alone are not content.
    if !ingest.has_text() {
        warn!(
            documents = ingest.documents.len(),
            unreadable = ingest.failures.len(),
            "documents produced no text"
        );
        return Ok(RunOutcome::NoChunks { folder });
    }
    let corpus = build_corpus(&ingest.documents);
    let chunks = chunker.chunk(&corpus);
    if chunks.is_empty() {
        warn!("corpus produced no chunks");
        return Ok(RunOutcome::NoChunks { folder });
    }
    info!(
        documents = ingest.documents.len(),
        corpus_chars = corpus.chars().count(),
        chunks = chunks.len(),
        "corpus chunked"
    );

    // --- Phase 3: Extraction ---
    progress.phase("Extracting requirements");
    let stage = ExtractionStage::for_model(client, profiles, config.model_id.as_deref());
    let profile_source = stage.profile().source;
    let extraction = stage.run(&chunks, progress).await;

    if extraction.results.is_empty() {
        warn!(
            chunks = chunks.len(),
            failed = extraction.failed.len(),
            "no technical information extracted"
        );
        return Ok(RunOutcome::NoExtractions { folder, extraction });
    }

    // --- Phase 4: Consolidation ---
    let consolidation = ConsolidationStage::new(client)
        .run(&extraction.results, &config.project_id, progress)
        .await;

    // --- Phase 5: Outputs ---
    progress.phase("Writing output files");
    let outputs = write_outputs(&folder, &config.project_id, &consolidation)?;

    let report = RunReport {
        run_id,
        project_id: config.project_id.clone(),
        folder,
        documents: ingest.documents.len(),
        unreadable: ingest.failures.len(),
        chunks: chunks.len(),
        profile_source,
        extraction,
        consolidation,
        outputs,
        elapsed: start.elapsed(),
    };

    info!(
        run_id = %report.run_id,
        retained = report.extraction.results.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "run complete"
    );
    progress.done(&report);

    Ok(RunOutcome::Completed(Box::new(report)))
}

/// Project ids become folder and file names, so they must be a single path segment.
fn validate_project_id(project_id: &str) -> Result<()> {
    if project_id.trim().is_empty() {
        return Err(ReqMinerError::validation("project id must not be empty"));
    }
    if project_id.contains(['/', '\\']) || project_id == "." || project_id == ".." {
        return Err(ReqMinerError::validation(format!(
            "project id '{project_id}' must not contain path separators"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
