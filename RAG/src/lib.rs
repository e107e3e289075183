pub mod chatbot;
pub mod document_processor;
pub mod embedding_service;
pub mod models;
pub mod openai_service;
pub mod query_service;

pub use chatbot::ChatBot;
pub use document_processor::DocumentProcessor;
pub use embedding_service::EmbeddingService;
pub use models::*;
pub use openai_service::{CompletionBackend, OpenAiService, DEFAULT_API_BASE};
pub use query_service::QueryService;
