//! JSON shapes of the remote vocabulary service and their conversion into
//! domain types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
  ClozeQuestion, DailyCount, EntryId, ExampleSentence, FlashcardDirection, FlashcardOption, FlashcardQuestion,
  ProgressSummary, Provenance, VocabularyEntry,
};

/// `{"error": "..."}` body sent with every failure
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
  pub error: String,
}

// ==================== Requests ====================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
  pub username: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct FlashcardRequest {
  pub entry_id: EntryId,
}

#[derive(Debug, Serialize)]
pub struct ClozeRequest {
  pub entry_id: EntryId,
}

#[derive(Debug, Serialize)]
pub struct SaveRequest<'a> {
  pub english: &'a str,
  pub danish: &'a str,
  pub is_external_input: bool,
}

// ==================== Entries ====================

#[derive(Debug, Deserialize)]
pub struct EntriesResponse {
  #[serde(default)]
  pub entries: Vec<WireEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WireEntry {
  pub id: i64,
  #[serde(default)]
  pub text: Option<String>,
  #[serde(default)]
  pub translation: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default = "default_external")]
  pub is_external_input: bool,
  #[serde(default)]
  pub examples: Vec<WireExample>,
}

fn default_external() -> bool {
  true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WireExample {
  #[serde(default)]
  pub danish: Option<String>,
  #[serde(default)]
  pub english: Option<String>,
}

impl From<WireExample> for ExampleSentence {
  fn from(example: WireExample) -> Self {
    ExampleSentence::new(
      example.danish.as_deref().unwrap_or_default(),
      example.english.as_deref().unwrap_or_default(),
    )
  }
}

/// Timestamps come as naive ISO-8601 in UTC, occasionally with an offset
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
    .ok()
    .map(|naive| naive.and_utc())
}

impl From<WireEntry> for VocabularyEntry {
  fn from(wire: WireEntry) -> Self {
    let mut entry = VocabularyEntry::new(
      EntryId(wire.id),
      wire.text.as_deref().unwrap_or_default(),
      wire.translation.as_deref().unwrap_or_default(),
    )
    .with_examples(into_examples(wire.examples))
    .with_provenance(Provenance::from_external_flag(wire.is_external_input));
    entry.created_at = wire.created_at.as_deref().and_then(parse_timestamp);
    entry
  }
}

#[derive(Debug, Deserialize)]
pub struct ExamplesResponse {
  #[serde(default)]
  pub examples: Vec<WireExample>,
}

impl ExamplesResponse {
  pub fn into_examples(self) -> Vec<ExampleSentence> {
    into_examples(self.examples)
  }
}

/// Indices must line up with the service's list, so only blanks are dropped
fn into_examples(examples: Vec<WireExample>) -> Vec<ExampleSentence> {
  examples
    .into_iter()
    .map(ExampleSentence::from)
    .filter(|e| !e.is_empty())
    .collect()
}

// ==================== Exercises ====================

#[derive(Debug, Deserialize)]
pub struct FlashcardResponse {
  /// Danish side of the entry
  pub prompt: String,
  #[serde(default)]
  pub part_of_speech: Option<String>,
  /// English side of the entry
  #[serde(default)]
  pub target_text: Option<String>,
  #[serde(default)]
  pub options: Vec<WireOption>,
}

#[derive(Debug, Deserialize)]
pub struct WireOption {
  pub id: String,
  pub label: String,
  #[serde(default)]
  pub is_correct: bool,
  #[serde(default)]
  pub metadata: Option<WireOptionMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireOptionMetadata {
  #[serde(default)]
  pub translation: Option<String>,
  #[serde(default)]
  pub note: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl FlashcardResponse {
  /// The service always asks Danish → English. For the other direction the
  /// question is flipped here: the English text becomes the prompt and each
  /// option shows its Danish translation. Options without one are dropped.
  pub fn into_question(self, entry_id: EntryId, direction: FlashcardDirection) -> FlashcardQuestion {
    let mut options: Vec<FlashcardOption> = self
      .options
      .into_iter()
      .map(|o| {
        let metadata = o.metadata.unwrap_or_default();
        FlashcardOption {
          id: o.id,
          label: o.label.trim().to_string(),
          translation: non_empty(metadata.translation),
          note: non_empty(metadata.note),
          is_correct: o.is_correct,
        }
      })
      .collect();
    let mut prompt = self.prompt.trim().to_string();

    if direction == FlashcardDirection::SourceToTarget {
      let english = non_empty(self.target_text)
        .or_else(|| options.iter().find(|o| o.is_correct).map(|o| o.label.clone()))
        .unwrap_or_default();
      options = options
        .into_iter()
        .filter_map(|o| {
          let danish = o.translation?;
          Some(FlashcardOption {
            label: danish,
            translation: Some(o.label).filter(|l| !l.is_empty()),
            ..o
          })
        })
        .collect();
      prompt = english;
    }

    FlashcardQuestion {
      entry_id,
      prompt,
      part_of_speech: non_empty(self.part_of_speech),
      options,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ClozeResponse {
  pub prompt: String,
  pub answer: String,
  #[serde(default)]
  pub hint_en: Option<String>,
}

impl ClozeResponse {
  pub fn into_question(self, entry_id: EntryId) -> ClozeQuestion {
    ClozeQuestion {
      entry_id,
      prompt: self.prompt,
      answer: self.answer,
      hint: non_empty(self.hint_en),
    }
  }
}

// ==================== Progress ====================

#[derive(Debug, Deserialize)]
pub struct ProgressResponse {
  #[serde(default)]
  pub words: Vec<DailyCount>,
  #[serde(default)]
  pub exercises: Vec<DailyCount>,
  #[serde(default)]
  pub total_entries: i64,
  #[serde(default)]
  pub total_exercises: i64,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub window_days: u32,
}

impl From<ProgressResponse> for ProgressSummary {
  fn from(mut wire: ProgressResponse) -> Self {
    // The service lists days newest first
    wire.words.sort_by_key(|d| d.date);
    wire.exercises.sort_by_key(|d| d.date);
    ProgressSummary {
      words: wire.words,
      exercises: wire.exercises,
      total_entries: wire.total_entries,
      total_exercises: wire.total_exercises,
      start_date: wire.start_date,
      end_date: wire.end_date,
      window_days: wire.window_days,
    }
  }
}
