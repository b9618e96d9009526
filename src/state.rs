//! Application state shared by all handlers: the quiz engine plus the config it was built from.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::banks::{FileBankStore, QuestionBankStore};
use crate::config::AppConfig;
use crate::engine::QuizEngine;
use crate::error::StoreError;
use crate::store::{DocumentStore, FileStore};

pub struct AppState {
    pub engine: QuizEngine,
    pub config: AppConfig,
}

impl AppState {
    /// Build state from config: open the data directory and register the bank files.
    #[instrument(level = "info", skip_all)]
    pub async fn new(config: AppConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn DocumentStore> = Arc::new(FileStore::open(&config.data_dir).await?);
        let banks: Arc<dyn QuestionBankStore> = Arc::new(FileBankStore::new(config.banks.clone()));

        for bank in &config.banks {
            info!(target: "quizdesk_backend", id = %bank.id, label = %bank.label, path = %bank.path.display(), exists = bank.path.exists(), "Configured question bank");
        }

        Ok(Self::with_stores(config, banks, store))
    }

    /// Build state over explicit stores (tests, embedding).
    pub fn with_stores(
        config: AppConfig,
        banks: Arc<dyn QuestionBankStore>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self { engine: QuizEngine::new(banks, store), config }
    }
}
