use crate::document_processor::DocumentProcessor;
use crate::embedding_service::EmbeddingService;
use crate::models::*;
use crate::openai_service::CompletionBackend;
use crate::query_service::QueryService;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// A chat session grounded in a fixed set of input documents.
///
/// Construction reads, chunks and indexes every file up front; `chat` then
/// retrieves the most relevant chunks for each prompt and asks the backend.
pub struct ChatBot {
    documents: Vec<Document>,
    query_service: QueryService,
    llm_params: LlmParams,
}

impl ChatBot {
    pub async fn pdf_chat(
        input_files: &[PathBuf],
        llm_params: LlmParams,
        backend: Arc<dyn CompletionBackend>,
    ) -> Result<Self> {
        Self::build(DocumentKind::Pdf, input_files, llm_params, backend).await
    }

    pub async fn docx_chat(
        input_files: &[PathBuf],
        llm_params: LlmParams,
        backend: Arc<dyn CompletionBackend>,
    ) -> Result<Self> {
        Self::build(DocumentKind::Docx, input_files, llm_params, backend).await
    }

    async fn build(
        kind: DocumentKind,
        input_files: &[PathBuf],
        llm_params: LlmParams,
        backend: Arc<dyn CompletionBackend>,
    ) -> Result<Self> {
        if input_files.is_empty() {
            bail!("At least one input file is required");
        }

        log::info!("Initializing {} chat over {} file(s)...", kind, input_files.len());

        let mut documents = DocumentProcessor::new().process_files(kind, input_files).await?;
        let embedding_service = Arc::new(EmbeddingService::fit(&mut documents));
        let query_service = QueryService::new(embedding_service, backend)?;

        log::info!("{} chat ready", kind);
        Ok(Self {
            documents,
            query_service,
            llm_params,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn llm_params(&self) -> &LlmParams {
        &self.llm_params
    }

    pub async fn chat(&self, prompt: &str) -> Result<ChatResponse> {
        self.query_service.query(prompt, &self.documents, &self.llm_params).await
    }
}
