//! Read-only question banks.
//!
//! A bank file is a JSON array of raw items (optionally base64-wrapped). Each
//! item becomes a `Question` whose id is its index in the array. Decoded
//! banks are cached; they never change while the server runs.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::{BankCfg, BankEncoding};
use crate::domain::{BankInfo, Question};
use crate::error::StoreError;

pub type Bank = Arc<[Question]>;

/// Source of immutable, ordered question lists.
#[async_trait]
pub trait QuestionBankStore: Send + Sync {
    /// Banks that can currently be loaded.
    async fn list(&self) -> Result<Vec<BankInfo>, StoreError>;

    /// Questions of `bank_id` in bank order, or `None` for an unknown bank.
    async fn load(&self, bank_id: &str) -> Result<Option<Bank>, StoreError>;
}

/// Raw bank item as authored.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    question_no: Option<serde_json::Value>,
    #[serde(default)]
    question_field: Option<String>,
    #[serde(default)]
    question_type: Option<String>,
    #[serde(default)]
    question_text: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    answer: Option<serde_json::Value>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Answer keys are authored either as strings ("B") or bare values.
fn answer_key(value: Option<serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Decode bank bytes into questions with index ids.
pub fn parse_bank(bytes: &[u8], encoding: BankEncoding) -> Result<Vec<Question>, StoreError> {
    let raw: Vec<RawQuestion> = match encoding {
        BankEncoding::Base64 => serde_json::from_slice(&STANDARD.decode(bytes.trim_ascii())?)?,
        BankEncoding::Json => serde_json::from_slice(bytes)?,
    };
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(idx, item)| Question {
            id: idx,
            question_no: item.question_no,
            question_field: item.question_field,
            question_type: item.question_type,
            question_text: item.question_text.unwrap_or_default(),
            options: item.options,
            answer: answer_key(item.answer),
            explanation: item.explanation,
        })
        .collect())
}

/// Banks read from the files listed in the configuration.
pub struct FileBankStore {
    banks: Vec<BankCfg>,
    cache: RwLock<HashMap<String, Bank>>,
}

impl FileBankStore {
    pub fn new(banks: Vec<BankCfg>) -> Self {
        Self { banks, cache: RwLock::new(HashMap::new()) }
    }

    fn cfg(&self, bank_id: &str) -> Option<&BankCfg> {
        self.banks.iter().find(|b| b.id == bank_id)
    }
}

#[async_trait]
impl QuestionBankStore for FileBankStore {
    #[instrument(level = "debug", skip(self))]
    async fn list(&self) -> Result<Vec<BankInfo>, StoreError> {
        let mut out = Vec::with_capacity(self.banks.len());
        for cfg in &self.banks {
            if !cfg.path.exists() {
                warn!(target: "quizdesk_backend", bank = %cfg.id, path = %cfg.path.display(), "Bank file missing; not listed");
                continue;
            }
            if let Some(questions) = self.load(&cfg.id).await? {
                out.push(BankInfo { id: cfg.id.clone(), label: cfg.label.clone(), count: questions.len() });
            }
        }
        Ok(out)
    }

    #[instrument(level = "debug", skip(self))]
    async fn load(&self, bank_id: &str) -> Result<Option<Bank>, StoreError> {
        if let Some(hit) = { self.cache.read().await.get(bank_id).cloned() } {
            return Ok(Some(hit));
        }
        let Some(cfg) = self.cfg(bank_id) else {
            return Ok(None);
        };
        let bytes = match tokio::fs::read(&cfg.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let bank: Bank = parse_bank(&bytes, cfg.encoding)?.into();
        info!(target: "quizdesk_backend", bank = %bank_id, count = bank.len(), "Question bank loaded");
        self.cache.write().await.insert(bank_id.to_string(), bank.clone());
        Ok(Some(bank))
    }
}

/// Banks held in memory, in insertion order.
#[cfg(test)]
#[derive(Default)]
pub struct StaticBankStore {
    banks: Vec<(BankInfo, Bank)>,
}

#[cfg(test)]
impl StaticBankStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bank; question ids are reassigned to their index.
    pub fn with_bank(mut self, id: &str, label: &str, questions: Vec<Question>) -> Self {
        let bank: Bank = questions
            .into_iter()
            .enumerate()
            .map(|(idx, q)| Question { id: idx, ..q })
            .collect();
        let info = BankInfo { id: id.into(), label: label.into(), count: bank.len() };
        self.banks.push((info, bank));
        self
    }
}

#[cfg(test)]
#[async_trait]
impl QuestionBankStore for StaticBankStore {
    async fn list(&self) -> Result<Vec<BankInfo>, StoreError> {
        Ok(self.banks.iter().map(|(info, _)| info.clone()).collect())
    }

    async fn load(&self, bank_id: &str) -> Result<Option<Bank>, StoreError> {
        Ok(self
            .banks
            .iter()
            .find(|(info, _)| info.id == bank_id)
            .map(|(_, bank)| bank.clone()))
    }
}
