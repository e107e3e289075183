use crate::embedding_service::EmbeddingService;
use crate::models::*;
use crate::openai_service::CompletionBackend;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

const DEFAULT_TOP_K: usize = 5;
// Leaves room for the instructions and the answer inside an 8k context window.
const CONTEXT_TOKEN_BUDGET: usize = 4000;

const SYSTEM_PROMPT: &str = "You are a helpful assistant. Ground every answer in the provided \
document context. If the context does not cover something the user asks for, say so instead of \
inventing details.";

pub struct QueryService {
    embedding_service: Arc<EmbeddingService>,
    backend: Arc<dyn CompletionBackend>,
    tokenizer: CoreBPE,
    top_k: usize,
}

impl QueryService {
    pub fn new(embedding_service: Arc<EmbeddingService>, backend: Arc<dyn CompletionBackend>) -> Result<Self> {
        let tokenizer = tiktoken_rs::cl100k_base().map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

        Ok(Self {
            embedding_service,
            backend,
            tokenizer,
            top_k: DEFAULT_TOP_K,
        })
    }

    pub async fn query(&self, query: &str, documents: &[Document], params: &LlmParams) -> Result<ChatResponse> {
        let start_time = std::time::Instant::now();

        let query_embedding = self.embedding_service.embed_query(query);
        let relevant_chunks = self.find_relevant_chunks(&query_embedding, documents);

        let context = self.build_context(&relevant_chunks, documents);
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("CONTEXT DOCUMENTS:\n{context}\nREQUEST:\n{query}")),
        ];

        let response = self.backend.complete(messages, params).await?;
        let source_nodes = self.create_source_nodes(&relevant_chunks, documents);

        Ok(ChatResponse {
            response,
            source_nodes,
            processing_time_ms: start_time.elapsed().as_millis(),
        })
    }

    fn find_relevant_chunks<'a>(
        &self,
        query_embedding: &[f32],
        documents: &'a [Document],
    ) -> Vec<(&'a DocumentChunk, f32)> {
        let mut chunk_scores: Vec<(&DocumentChunk, f32)> = documents
            .iter()
            .flat_map(|document| document.chunks.iter())
            .filter_map(|chunk| {
                chunk
                    .embedding
                    .as_ref()
                    .map(|embedding| (chunk, self.embedding_service.calculate_similarity(query_embedding, embedding)))
            })
            .collect();

        // Highest similarity first
        chunk_scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        chunk_scores.truncate(self.top_k);

        log::info!("Found {} relevant chunks", chunk_scores.len());
        chunk_scores
    }

    fn build_context(&self, chunks: &[(&DocumentChunk, f32)], documents: &[Document]) -> String {
        let mut context = String::new();
        let mut used_tokens = 0;

        for (chunk, _) in chunks {
            let Some(doc) = owning_document(chunk, documents) else {
                continue;
            };
            let entry = format!("Document: {}\nContent: {}\n\n", doc.filename, chunk.content);
            let entry_tokens = self.tokenizer.encode_with_special_tokens(&entry).len();

            if used_tokens + entry_tokens > CONTEXT_TOKEN_BUDGET {
                log::info!("Context token budget reached after {} tokens", used_tokens);
                break;
            }
            used_tokens += entry_tokens;
            context.push_str(&entry);
        }

        context
    }

    fn create_source_nodes(&self, chunks: &[(&DocumentChunk, f32)], documents: &[Document]) -> Vec<SourceNode> {
        chunks
            .iter()
            .filter_map(|(chunk, score)| {
                let doc = owning_document(chunk, documents)?;
                let text_excerpt = if chunk.content.chars().count() > 200 {
                    format!("{}...", chunk.content.chars().take(200).collect::<String>())
                } else {
                    chunk.content.clone()
                };

                Some(SourceNode {
                    document: doc.filename.clone(),
                    text_excerpt,
                    score: *score,
                })
            })
            .collect()
    }
}

fn owning_document<'a>(chunk: &DocumentChunk, documents: &'a [Document]) -> Option<&'a Document> {
    documents.iter().find(|d| d.chunks.iter().any(|c| c.id == chunk.id))
}
