//! Exercise types shared by the practise session and the API layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::EntryId;
use crate::config::{CLOZE_BLANK, MIN_FLASHCARD_OPTIONS};

/// Which side of the entry a flashcard shows as its prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashcardDirection {
  /// Prompt in English, pick the Danish translation
  SourceToTarget,
  /// Prompt in Danish, pick the English meaning
  TargetToSource,
}

/// Practise mode; exactly one is active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseMode {
  Flashcard(FlashcardDirection),
  Cloze,
}

/// Exercise family, used for per-type loading flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseKind {
  Flashcard,
  Cloze,
}

impl ExerciseMode {
  pub const ALL: [ExerciseMode; 3] = [
    ExerciseMode::Flashcard(FlashcardDirection::SourceToTarget),
    ExerciseMode::Flashcard(FlashcardDirection::TargetToSource),
    ExerciseMode::Cloze,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Flashcard(FlashcardDirection::SourceToTarget) => "flashcard-source",
      Self::Flashcard(FlashcardDirection::TargetToSource) => "flashcard-target",
      Self::Cloze => "cloze",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|m| m.as_str() == s.trim())
  }

  pub fn kind(&self) -> ExerciseKind {
    match self {
      Self::Flashcard(_) => ExerciseKind::Flashcard,
      Self::Cloze => ExerciseKind::Cloze,
    }
  }
}

impl Serialize for ExerciseMode {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for ExerciseMode {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Self::from_str(&raw)
      .ok_or_else(|| serde::de::Error::custom(format!("unknown exercise mode: {}", raw)))
  }
}

/// Why a provider payload was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
  #[error("Unable to prepare enough flashcards.")]
  TooFewOptions(usize),
  #[error("The flashcard set must have exactly one correct answer.")]
  CorrectCount(usize),
  #[error("Unable to prepare a sentence.")]
  EmptyPrompt,
  #[error("The exercise is missing its answer.")]
  MissingAnswer,
}

/// One selectable answer on a flashcard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardOption {
  pub id: String,
  pub label: String,
  pub translation: Option<String>,
  pub note: Option<String>,
  pub is_correct: bool,
}

/// Multiple-choice question for one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardQuestion {
  pub entry_id: EntryId,
  pub prompt: String,
  pub part_of_speech: Option<String>,
  pub options: Vec<FlashcardOption>,
}

impl FlashcardQuestion {
  /// Accept the question only with enough options and a single correct one
  pub fn validate(self) -> Result<Self, QuestionError> {
    if self.options.len() < MIN_FLASHCARD_OPTIONS {
      return Err(QuestionError::TooFewOptions(self.options.len()));
    }
    let correct = self.options.iter().filter(|o| o.is_correct).count();
    if correct != 1 {
      return Err(QuestionError::CorrectCount(correct));
    }
    Ok(self)
  }

  pub fn option(&self, option_id: &str) -> Option<&FlashcardOption> {
    self.options.iter().find(|o| o.id == option_id)
  }

  #[cfg(test)]
  pub fn correct_option(&self) -> Option<&FlashcardOption> {
    self.options.iter().find(|o| o.is_correct)
  }
}

/// Fill-in-the-blank question for one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClozeQuestion {
  pub entry_id: EntryId,
  /// Sentence containing the blank marker
  pub prompt: String,
  pub answer: String,
  pub hint: Option<String>,
}

/// Prompt text split around its blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClozeSegments {
  pub before: String,
  pub after: String,
}

impl ClozeQuestion {
  pub fn validate(self) -> Result<Self, QuestionError> {
    if self.prompt.trim().is_empty() {
      return Err(QuestionError::EmptyPrompt);
    }
    if self.answer.trim().is_empty() {
      return Err(QuestionError::MissingAnswer);
    }
    Ok(self)
  }

  #[cfg(test)]
  pub fn blank_count(&self) -> usize {
    self.prompt.matches(CLOZE_BLANK).count()
  }

  /// Split the prompt at its first blank; `None` when there is no blank
  pub fn segments(&self) -> Option<ClozeSegments> {
    let (before, after) = self.prompt.split_once(CLOZE_BLANK)?;
    Some(ClozeSegments {
      before: before.to_string(),
      after: after.to_string(),
    })
  }

  /// The sentence with the expected answer written into the blank
  pub fn filled_sentence(&self) -> String {
    match self.segments() {
      Some(seg) => format!("{}{}{}", seg.before, self.answer.trim(), seg.after),
      None => self.prompt.clone(),
    }
  }
}

/// How a question was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
  Solved,
  GaveUp,
}

/// Completion record sent to the progress logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
  pub mode: ExerciseMode,
  pub resolution: Resolution,
}
