//! Loading server configuration (data directory, port, question banks) from TOML.
//!
//! See `AppConfig` and `BankCfg` for the expected schema. Example:
//!
//! ```toml
//! port = 5002
//! data_dir = "data"
//! static_dir = "static"
//!
//! [[banks]]
//! id = "comptia"
//! label = "CompTIA A+"
//! path = "comptia_questions_real.b64"
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub port: u16,
  pub data_dir: PathBuf,
  pub static_dir: PathBuf,
  pub banks: Vec<BankCfg>,
}

/// Question bank file entry.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BankCfg {
  pub id: String,
  pub label: String,
  pub path: PathBuf,
  #[serde(default)] pub encoding: BankEncoding,
}

/// On-disk encoding of a bank file.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BankEncoding {
  /// JSON array wrapped in standard base64.
  #[default]
  Base64,
  /// Plain JSON array.
  Json,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: 5002,
      data_dir: PathBuf::from("data"),
      static_dir: PathBuf::from("static"),
      banks: vec![
        BankCfg {
          id: "comptia".into(),
          label: "CompTIA A+".into(),
          path: PathBuf::from("comptia_questions_real.b64"),
          encoding: BankEncoding::Base64,
        },
        BankCfg {
          id: "quiz".into(),
          label: "Quiz".into(),
          path: PathBuf::from("quiz_questions.b64"),
          encoding: BankEncoding::Base64,
        },
      ],
    }
  }
}

impl AppConfig {
  /// Config file from QUIZ_CONFIG_PATH (or defaults), then PORT / DATA_DIR / STATIC_DIR overrides.
  pub fn from_env() -> Self {
    let mut cfg = load_config_from_env().unwrap_or_default();
    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
      cfg.port = port;
    }
    if let Ok(dir) = std::env::var("DATA_DIR") {
      cfg.data_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("STATIC_DIR") {
      cfg.static_dir = PathBuf::from(dir);
    }
    cfg
  }
}

/// Attempt to load `AppConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "quizdesk_backend", %path, banks = cfg.banks.len(), "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizdesk_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizdesk_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
