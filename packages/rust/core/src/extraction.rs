//! Per-chunk extraction stage.
//!
//! Every chunk is sent, in order, with the same system instruction (persona +
//! profile orientation + rules) and a prompt that is either topic-driven or
//! the generic four-category request. Responses are classified by
//! [`classify_response`]; only [`ResponseClass::Relevant`] ones are kept.

use tracing::{debug, info, instrument, warn};

use reqminer_inference::InferenceClient;
use reqminer_shared::{Chunk, ExtractionResult, ProfileBook, ResolvedProfile};

use crate::pipeline::ProgressReporter;
use crate::prompts::{self, NO_INFO_SENTINEL};

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// What one chunk's response means for consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    /// Useful content, trimmed.
    Relevant(String),
    /// The model answered with the "nothing relevant" sentinel.
    NoInformation,
    /// Blank response.
    Empty,
}

/// True when `response` carries the no-information sentinel anywhere.
///
/// Matches without the trailing period so "…relevante" and "…relevante."
/// both count.
pub fn signals_no_information(response: &str) -> bool {
    let marker = NO_INFO_SENTINEL.trim_end_matches('.');
    response.contains(marker)
}

/// Classify a raw model response.
pub fn classify_response(response: &str) -> ResponseClass {
    if signals_no_information(response) {
        return ResponseClass::NoInformation;
    }
    let trimmed = response.trim();
    if trimmed.is_empty() {
        ResponseClass::Empty
    } else {
        ResponseClass::Relevant(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Retained extractions plus accounting for everything dropped.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// Relevant extractions, in chunk order.
    pub results: Vec<ExtractionResult>,
    /// Chunks answered with the sentinel.
    pub no_information: usize,
    /// Chunks answered with blank text.
    pub empty: usize,
    /// Chunks whose inference call failed (chunk index, error).
    pub failed: Vec<(usize, String)>,
}

impl ExtractionOutcome {
    pub fn chunks_seen(&self) -> usize {
        self.results.len() + self.no_information + self.empty + self.failed.len()
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Extraction over one resolved profile.
pub struct ExtractionStage<'a, C: InferenceClient> {
    client: &'a C,
    profile: ResolvedProfile,
    system_instruction: String,
}

impl<'a, C: InferenceClient> ExtractionStage<'a, C> {
    pub fn new(client: &'a C, profile: ResolvedProfile) -> Self {
        let system_instruction = prompts::extraction_system_instruction(&profile.orientation);
        Self {
            client,
            profile,
            system_instruction,
        }
    }

    /// Resolve `model_id` against `book` (default orientation when absent or unknown).
    pub fn for_model(client: &'a C, book: &ProfileBook, model_id: Option<&str>) -> Self {
        Self::new(client, book.resolve(model_id))
    }

    pub fn profile(&self) -> &ResolvedProfile {
        &self.profile
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// The user prompt sent for `chunk`.
    pub fn prompt_for(&self, chunk: &Chunk) -> String {
        prompts::extraction_prompt(&self.profile.topics, &chunk.text)
    }

    /// Run every chunk sequentially. Failed calls are recorded, never retried.
    #[instrument(skip_all, fields(chunks = chunks.len(), topics = self.profile.topics.len()))]
    pub async fn run(
        &self,
        chunks: &[Chunk],
        progress: &dyn ProgressReporter,
    ) -> ExtractionOutcome {
        let mut outcome = ExtractionOutcome::default();
        let total = chunks.len();

        for chunk in chunks {
            progress.chunk_progress(chunk.index + 1, total);

            let prompt = self.prompt_for(chunk);
            let response = match self
                .client
                .generate(&prompt, Some(&self.system_instruction))
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(chunk = chunk.index, error = %e, "inference failed, skipping chunk");
                    outcome.failed.push((chunk.index, e.to_string()));
                    continue;
                }
            };

            match classify_response(&response) {
                ResponseClass::Relevant(text) => {
                    debug!(chunk = chunk.index, chars = text.len(), "extraction retained");
                    outcome.results.push(ExtractionResult {
                        chunk_index: chunk.index,
                        text,
                    });
                }
                ResponseClass::NoInformation => {
                    debug!(chunk = chunk.index, "no relevant information in chunk");
                    outcome.no_information += 1;
                }
                ResponseClass::Empty => {
                    debug!(chunk = chunk.index, "empty response, skipping chunk");
                    outcome.empty += 1;
                }
            }
        }

        info!(
            retained = outcome.results.len(),
            no_information = outcome.no_information,
            empty = outcome.empty,
            failed = outcome.failed.len(),
            "extraction complete"
        );

        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
