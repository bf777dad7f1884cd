//! Retrieval + LLM + extraction, wired together

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::parser::extract_array;
use crate::prompt::{build_context, chat_prompt, ExtractionPromptBuilder, CHAT_SYSTEM_PROMPT};
use crate::sources::sources_for;
use crate::types::{ChatResponse, ExtractResponse};
use projectbrain_domain::traits::{DocumentRetriever, LlmProvider};
use projectbrain_domain::RetrievedDocument;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

/// Answers questions and extracts tables from the document store
///
/// Both collaborators are synchronous; every call runs on the blocking pool
/// under the configured timeout.
pub struct RagPipeline<L, R> {
    llm: Arc<L>,
    retriever: Arc<R>,
    config: PipelineConfig,
}

impl<L, R> RagPipeline<L, R>
where
    L: LlmProvider + Send + Sync + 'static,
    R: DocumentRetriever + Send + Sync + 'static,
    L::Error: std::fmt::Display,
    R::Error: std::fmt::Display,
{
    /// Create a new pipeline
    pub fn new(llm: L, retriever: R, config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::from_shared(Arc::new(llm), Arc::new(retriever), config)
    }

    /// Create a pipeline from collaborators that are shared elsewhere
    pub fn from_shared(
        llm: Arc<L>,
        retriever: Arc<R>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            llm,
            retriever,
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answer a question from the retrieved context
    pub async fn answer(&self, question: &str) -> Result<ChatResponse, PipelineError> {
        let question = self.check_query(question)?;
        let request_id = Uuid::now_v7();
        let started = Instant::now();

        info!(%request_id, query_len = question.len(), "Starting chat");

        let documents = self.retrieve(question, self.config.chat_top_k).await?;
        let context = build_context(&documents);
        let prompt = chat_prompt(&context, question);

        let answer = self
            .call_llm(Some(CHAT_SYSTEM_PROMPT.to_string()), prompt)
            .await?;

        let sources = sources_for(&documents);
        info!(
            %request_id,
            chunks = documents.len(),
            sources = sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat complete"
        );

        Ok(ChatResponse { answer, sources })
    }

    /// Extract schema-shaped records matching `requirement`
    ///
    /// Malformed model output is not an error: it yields an empty `data` list
    /// and a warning.
    pub async fn extract(&self, requirement: &str) -> Result<ExtractResponse, PipelineError> {
        let requirement = self.check_query(requirement)?;
        let request_id = Uuid::now_v7();
        let started = Instant::now();

        info!(%request_id, query_len = requirement.len(), "Starting extraction");

        let documents = self.retrieve(requirement, self.config.extract_top_k).await?;
        let context = build_context(&documents);
        let prompt = ExtractionPromptBuilder::new(requirement, &self.config.schema, &context)
            .with_table_hint(self.config.table_hint.as_deref())
            .build();

        debug!(%request_id, prompt_len = prompt.len(), "Built extraction prompt");

        let raw = self.call_llm(None, prompt).await?;

        debug!(%request_id, response_len = raw.len(), "LLM responded");

        let result = extract_array(&raw, &self.config.schema);
        let response = ExtractResponse::new(result, sources_for(&documents));

        info!(
            %request_id,
            records = response.data.len(),
            warnings = response.warnings.len(),
            sources = response.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction complete"
        );

        Ok(response)
    }

    fn check_query<'q>(&self, query: &'q str) -> Result<&'q str, PipelineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::EmptyQuery);
        }
        let len = query.chars().count();
        if len > self.config.max_query_length {
            return Err(PipelineError::QueryTooLong(len, self.config.max_query_length));
        }
        Ok(query)
    }

    /// Call the retriever on the blocking pool
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>, PipelineError> {
        let retriever = Arc::clone(&self.retriever);
        let query = query.to_string();

        let task = tokio::task::spawn_blocking(move || {
            retriever
                .retrieve(&query, k)
                .map_err(|e| PipelineError::Retrieval(e.to_string()))
        });

        timeout(self.config.retrieval_timeout(), task)
            .await
            .map_err(|_| PipelineError::Timeout("Retrieval"))?
            .map_err(|e| PipelineError::Retrieval(format!("Task join error: {}", e)))?
    }

    /// Call the LLM provider on the blocking pool
    async fn call_llm(&self, system: Option<String>, prompt: String) -> Result<String, PipelineError> {
        let llm = Arc::clone(&self.llm);

        let task = tokio::task::spawn_blocking(move || {
            let result = match system {
                Some(system) => llm.generate_with_system(&system, &prompt),
                None => llm.generate(&prompt),
            };
            result.map_err(|e| PipelineError::Llm(e.to_string()))
        });

        timeout(self.config.llm_timeout(), task)
            .await
            .map_err(|_| PipelineError::Timeout("LLM call"))?
            .map_err(|e| PipelineError::Llm(format!("Task join error: {}", e)))?
    }
}
