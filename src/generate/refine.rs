use tracing::info;

use super::progress::ProgressSink;
use super::prompts::{
    SYSTEM_PROMPT, ensure_external_banner, generation_prompt, refinement_prompt,
};
use crate::analysis::AnalysisContext;
use crate::errors::ModelCallError;
use crate::model::{ChatMessage, ModelClient};
use crate::models::{GeneratedDocument, RepositoryReference};
use crate::templates::Template;

/// Inputs for one repository's rounds.
pub struct RefinementRequest<'a> {
    pub reference: &'a RepositoryReference,
    pub repository_url: &'a str,
    pub context: &'a AnalysisContext,
    pub template: &'a Template,
    pub is_external: bool,
    /// Total model calls, clamped to at least 1.
    pub iterations: u32,
}

/// Round 1 generates from the full context; every later round regenerates
/// the whole page from a prefix of the previous one plus the checklist.
pub struct RefinementLoop<'a> {
    client: &'a ModelClient,
    api_key: &'a str,
}

impl<'a> RefinementLoop<'a> {
    pub fn new(client: &'a ModelClient, api_key: &'a str) -> Self {
        Self { client, api_key }
    }

    pub async fn run(
        &self,
        request: &RefinementRequest<'_>,
        sink: &dyn ProgressSink,
    ) -> Result<GeneratedDocument, ModelCallError> {
        let total = request.iterations.max(1);
        let full_name = request.reference.full_name();
        let mut document = String::new();

        for round in 1..=total {
            let prompt = if round == 1 {
                generation_prompt(
                    request.reference,
                    request.repository_url,
                    request.context,
                    request.template,
                    request.is_external,
                )
            } else {
                refinement_prompt(&document, request.is_external, round, total)
            };
            let conversation = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

            sink.info(&format!(
                "[{}] round {}/{}: {}",
                full_name,
                round,
                total,
                if round == 1 { "generating" } else { "refining" }
            ));

            let completion = self.client.complete(self.api_key, &conversation).await?;
            document = if request.is_external {
                ensure_external_banner(&completion.document)
            } else {
                completion.document
            };

            let rate = completion
                .tokens_per_second
                .map(|t| format!(", {:.1} tok/s", t))
                .unwrap_or_default();
            info!(repo = %full_name, round, bytes = document.len(), "round complete");
            sink.info(&format!(
                "[{}] round {}/{} done ({} bytes{})",
                full_name,
                round,
                total,
                document.len(),
                rate
            ));
        }

        Ok(GeneratedDocument::new(document))
    }
}
