use crate::config::AppConfig;
use rag_system::{ChatBot, CompletionBackend, DocumentKind, LlmParams, OpenAiService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("Unsupported file type. Only PDF and DOCX files are supported.")]
    UnsupportedFileType,
    #[error("{0}")]
    Upstream(String),
}

impl AdvisoryError {
    fn upstream(err: anyhow::Error) -> Self {
        AdvisoryError::Upstream(format!("{err:#}"))
    }
}

/// One Generate click: which document, which keyword.
#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    pub document_path: PathBuf,
    pub keyword: String,
}

impl AdvisoryRequest {
    pub fn new(document_path: impl Into<PathBuf>, keyword: impl AsRef<str>) -> Self {
        Self {
            document_path: document_path.into(),
            keyword: keyword.as_ref().trim().to_string(),
        }
    }
}

/// Instruction prompt sent to the document chat. `keyword` is inserted once.
pub fn build_prompt(keyword: &str) -> String {
    format!(
        r#"You are an Expert DOMAIN NAME GENERATOR. Your task is to CREATE domain names that PERFECTLY MATCH the uploaded company profile and the user's preferred keyword.

Here is your DETAILED INSTRUCTION SET:

1. First, IDENTIFY key attributes of the company that will serve as the foundation for your domain name suggestions.
2. ENSURE each domain name you develop is MEMORABLE by choosing SIMPLE and CATCHY names that are easy to spell and recall.
3. Prioritize BREVITY by generating domain names that are SHORT and UNCOMPLICATED, facilitating quick recognition and ease of use.
4. INCORPORATE the user entered keyword "{keyword}" seamlessly into each domain name to enhance search engine optimization (SEO) and relevance.
5. CONDUCT a SEARCH to VERIFY that your suggested domain names do not violate any trademarks, thus ensuring they are legally sound.
6. For every domain name you create, ASSIGN an appropriate DOMAIN EXTENSION such as .com, .net, or .org that aligns with the company's image and purpose.
7. Think about LONG-TERM GROWTH when selecting a domain name, making sure it allows for FUTURE EXPANSION without restrictions.
8. AVOID including hyphens and numbers in your domain names to maintain simplicity unless they are integral to the brand.

For EACH generated DOMAIN NAME with the preferred keyword, IMMEDIATELY SPECIFY a matching DOMAIN EXTENSION and a DESCRIPTION before proceeding to generate the next one.
Display ALL these in an organized TABULAR format."#
    )
}

/// Turns an uploaded document and a keyword into domain name suggestions.
pub struct AdvisoryPipeline {
    backend: Arc<dyn CompletionBackend>,
    llm_params: LlmParams,
}

impl AdvisoryPipeline {
    pub fn new(config: &AppConfig) -> Self {
        let backend = Arc::new(OpenAiService::new(config.api_key.clone(), config.api_base.clone()));
        Self::with_backend(backend, &config.model)
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>, model: &str) -> Self {
        Self {
            backend,
            llm_params: LlmParams::with_model(model),
        }
    }

    /// Ingestion mode for `path`, decided by extension alone.
    pub fn select_mode(path: &Path) -> Result<DocumentKind, AdvisoryError> {
        DocumentKind::from_path(path).ok_or(AdvisoryError::UnsupportedFileType)
    }

    async fn open_chat(&self, path: &Path) -> Result<ChatBot, AdvisoryError> {
        let input_files = [path.to_path_buf()];
        let params = self.llm_params.clone();
        let backend = self.backend.clone();

        let chat = match Self::select_mode(path)? {
            DocumentKind::Pdf => ChatBot::pdf_chat(&input_files, params, backend).await,
            DocumentKind::Docx => ChatBot::docx_chat(&input_files, params, backend).await,
        };
        chat.map_err(AdvisoryError::upstream)
    }

    /// Re-ingests the document and asks the model every time; nothing is cached.
    pub async fn advise(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        let chat = self.open_chat(&request.document_path).await?;
        let prompt = build_prompt(&request.keyword);

        log::info!(
            "Generating domain names for {} (keyword {:?})",
            request.document_path.display(),
            request.keyword
        );

        let response = chat.chat(&prompt).await.map_err(AdvisoryError::upstream)?;
        Ok(response.response)
    }
}
