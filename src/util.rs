//! Small utility helpers used across modules.

use chrono::{DateTime, Local, Utc};

/// Reduce a raw option string to its answer key.
/// "B. 443" -> "B"; without a "." delimiter the first character is the key.
pub fn parse_answer_key(option_text: &str) -> String {
  let trimmed = option_text.trim();
  match trimmed.split_once('.') {
    Some((key, _)) => key.trim().to_string(),
    None => trimmed.chars().take(1).collect(),
  }
}

/// Local wall-clock label used to build session and history ids.
pub fn now_label() -> String {
  Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

pub fn now_utc() -> DateTime<Utc> {
  Utc::now()
}

/// `<label>_<bank>_<8 hex>`; the random tail keeps ids of deleted sessions from coming back.
pub fn unique_id(bank_id: &str, taken: impl Fn(&str) -> bool) -> String {
  let base = format!("{}_{}", now_label(), bank_id);
  loop {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let candidate = format!("{}_{}", base, &suffix[..8]);
    if !taken(&candidate) {
      return candidate;
    }
  }
}

/// Log-safe truncation for large strings.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}
