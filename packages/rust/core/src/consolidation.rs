//! Consolidation and executive summary.
//!
//! Two inference calls: the first merges every retained extraction into one
//! document under four fixed headers; the second reads the first
//! [`SUMMARY_CONTEXT_CHARS`](crate::prompts::SUMMARY_CONTEXT_CHARS) characters
//! of that document and fills the summary template. Both outputs are taken
//! verbatim. A failed call yields empty text and the run carries on.

use tracing::{error, info, instrument};

use reqminer_inference::InferenceClient;
use reqminer_shared::ExtractionResult;

use crate::pipeline::ProgressReporter;
use crate::prompts;

/// Output of the consolidation stage.
#[derive(Debug, Clone, Default)]
pub struct Consolidation {
    /// Categorized document, as returned by the model.
    pub document: String,
    /// Executive summary, as returned by the model. Not checked against the template.
    pub summary: String,
    /// Error from the consolidation call, if it failed.
    pub document_error: Option<String>,
    /// Error from the summary call, if it failed.
    pub summary_error: Option<String>,
}

pub struct ConsolidationStage<'a, C: InferenceClient> {
    client: &'a C,
}

impl<'a, C: InferenceClient> ConsolidationStage<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    #[instrument(skip_all, fields(project = %project_id, extractions = extractions.len()))]
    pub async fn run(
        &self,
        extractions: &[ExtractionResult],
        project_id: &str,
        progress: &dyn ProgressReporter,
    ) -> Consolidation {
        let system = prompts::consolidation_system_instruction();
        let mut out = Consolidation::default();

        progress.phase("Consolidating analysis");
        let texts: Vec<&str> = extractions.iter().map(|e| e.text.as_str()).collect();
        let prompt = prompts::consolidation_prompt(&texts);
        match self.client.generate(&prompt, Some(system)).await {
            Ok(text) => out.document = text,
            Err(e) => {
                error!(error = %e, "consolidation call failed, continuing with empty document");
                out.document_error = Some(e.to_string());
            }
        }

        progress.phase("Generating executive summary");
        let prompt = prompts::summary_prompt(&out.document);
        match self.client.generate(&prompt, Some(system)).await {
            Ok(text) => out.summary = text,
            Err(e) => {
                error!(error = %e, "summary call failed, continuing with empty summary");
                out.summary_error = Some(e.to_string());
            }
        }

        info!(
            document_chars = out.document.chars().count(),
            summary_chars = out.summary.chars().count(),
            "consolidation complete"
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use crate::prompts::{CONSOLIDATED_SECTIONS, SUMMARY_CONTEXT_CHARS, SUMMARY_TEMPLATE};
    use crate::testing::ScriptedClient;

    fn extraction(chunk_index: usize, text: &str) -> ExtractionResult {
        ExtractionResult {
            chunk_index,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn two_calls_with_joined_extractions() {
        let client = ScriptedClient::new([
            Ok("## 1. Regras de Negócio\n- RN01"),
            Ok("Resumo ..."),
        ]);
        let stage = ConsolidationStage::new(&client);

        let result = stage
            .run(
                &[extraction(0, "- RN01"), extraction(3, "- RF07")],
                "ACME",
                &SilentProgress,
            )
            .await;

        assert_eq!(result.document, "## 1. Regras de Negócio\n- RN01");
        assert_eq!(result.summary, "Resumo ...");
        assert!(result.document_error.is_none());

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].prompt.contains("- RN01\n- RF07"));
        for section in CONSOLIDATED_SECTIONS {
            assert!(calls[0].prompt.contains(section));
        }
        assert!(calls[0].system.as_deref().unwrap().contains("Engenheiro de Requisitos"));
        assert!(calls[1].prompt.contains(SUMMARY_TEMPLATE));
        assert!(calls[1].prompt.contains("## 1. Regras de Negócio\n- RN01"));
    }

    #[tokio::test]
    async fn summary_sees_only_document_prefix() {
        let document = format!("{}FIM-DO-DOCUMENTO", "x".repeat(SUMMARY_CONTEXT_CHARS));
        let client = ScriptedClient::new([Ok(document.as_str()), Ok("resumo")]);
        let stage = ConsolidationStage::new(&client);

        let result = stage.run(&[extraction(0, "a")], "P", &SilentProgress).await;

        assert_eq!(result.document, document);
        let calls = client.calls();
        assert!(calls[1].prompt.contains(&"x".repeat(SUMMARY_CONTEXT_CHARS)));
        assert!(!calls[1].prompt.contains("FIM-DO-DOCUMENTO"));
    }

    #[tokio::test]
    async fn failed_consolidation_still_asks_for_summary() {
        let client = ScriptedClient::new([Err("timeout"), Ok("resumo sem base")]);
        let stage = ConsolidationStage::new(&client);

        let result = stage.run(&[extraction(0, "a")], "P", &SilentProgress).await;

        assert!(result.document.is_empty());
        assert!(result.document_error.as_deref().unwrap().contains("timeout"));
        assert_eq!(result.summary, "resumo sem base");
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn failed_summary_is_empty() {
        let client = ScriptedClient::new([Ok("doc"), Err("HTTP 500")]);
        let result = ConsolidationStage::new(&client)
            .run(&[extraction(0, "a")], "P", &SilentProgress)
            .await;
        assert_eq!(result.document, "doc");
        assert!(result.summary.is_empty());
        assert!(result.summary_error.is_some());
    }
}
