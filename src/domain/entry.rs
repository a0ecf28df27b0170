use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a saved dictionary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl fmt::Display for EntryId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Where an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
  /// Typed in by the user
  #[default]
  External,
  /// Added from a practise interaction (word bar)
  Practise,
}

impl Provenance {
  pub fn is_external(&self) -> bool {
    matches!(self, Self::External)
  }

  pub fn from_external_flag(is_external: bool) -> Self {
    if is_external {
      Self::External
    } else {
      Self::Practise
    }
  }
}

/// An example sentence: Danish text with its English rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExampleSentence {
  pub danish: String,
  pub english: String,
}

impl ExampleSentence {
  pub fn new(danish: &str, english: &str) -> Self {
    Self {
      danish: danish.trim().to_string(),
      english: english.trim().to_string(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.danish.is_empty() && self.english.is_empty()
  }

  /// Same sentence when both sides match after lowercasing and
  /// collapsing whitespace
  pub fn duplicates(&self, other: &ExampleSentence) -> bool {
    collapse(&self.danish) == collapse(&other.danish) && collapse(&self.english) == collapse(&other.english)
  }
}

fn collapse(text: &str) -> String {
  text
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// Drop empty and repeated examples, keeping the first occurrence
pub fn dedup_examples(examples: Vec<ExampleSentence>) -> Vec<ExampleSentence> {
  let mut unique: Vec<ExampleSentence> = Vec::with_capacity(examples.len());
  for example in examples {
    if example.is_empty() || unique.iter().any(|u| u.duplicates(&example)) {
      continue;
    }
    unique.push(example);
  }
  unique
}

/// A saved English/Danish word or phrase pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
  pub id: EntryId,
  /// English side
  pub text: String,
  /// Danish side
  pub translation: String,
  #[serde(default)]
  pub examples: Vec<ExampleSentence>,
  #[serde(default)]
  pub provenance: Provenance,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl VocabularyEntry {
  pub fn new(id: EntryId, text: &str, translation: &str) -> Self {
    Self {
      id,
      text: text.trim().to_string(),
      translation: translation.trim().to_string(),
      examples: Vec::new(),
      provenance: Provenance::External,
      created_at: None,
    }
  }

  /// Examples are kept in the given order; their indices address them
  pub fn with_examples(mut self, examples: Vec<ExampleSentence>) -> Self {
    self.examples = examples;
    self
  }

  /// Append `example` unless already present, then keep the newest `max`
  pub fn append_example(&mut self, example: ExampleSentence, max: usize) {
    let mut examples = std::mem::take(&mut self.examples);
    examples.push(example);
    let mut unique = dedup_examples(examples);
    if unique.len() > max {
      unique.drain(..unique.len() - max);
    }
    self.examples = unique;
  }

  pub fn with_provenance(mut self, provenance: Provenance) -> Self {
    self.provenance = provenance;
    self
  }

  /// Both sides must be non-empty to practise the entry
  pub fn is_usable(&self) -> bool {
    !self.text.trim().is_empty() && !self.translation.trim().is_empty()
  }
}

/// Entries that can be used as practise targets
pub fn usable_entries(entries: &[VocabularyEntry]) -> Vec<&VocabularyEntry> {
  entries.iter().filter(|e| e.is_usable()).collect()
}
