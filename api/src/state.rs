use crate::advisor::AdvisoryPipeline;
use crate::config::AppConfig;
use crate::upload::UploadedDocument;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Ready(UploadedDocument),
}

impl SessionState {
    pub fn document(&self) -> Option<&UploadedDocument> {
        match self {
            SessionState::Idle => None,
            SessionState::Ready(doc) => Some(doc),
        }
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub pipeline: AdvisoryPipeline,
    pub session: RwLock<SessionState>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig) -> SharedState {
        let pipeline = AdvisoryPipeline::new(&config);
        Self::with_pipeline(config, pipeline)
    }

    pub fn with_pipeline(config: AppConfig, pipeline: AdvisoryPipeline) -> SharedState {
        Arc::new(Self {
            config,
            pipeline,
            session: RwLock::new(SessionState::Idle),
        })
    }

    pub async fn current_document(&self) -> Option<UploadedDocument> {
        self.session.read().await.document().cloned()
    }
}
