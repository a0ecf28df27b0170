//! Cloze answer evaluation with near-miss detection.
//!
//! Answers are compared after Unicode composition, lowercasing and trimming.
//! An answer that is not exact but within a small edit distance of the
//! expected one is reported as [`ClozeVerdict::Near`]; it is never accepted.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::config::{NEAR_MATCH_MAX_DISTANCE, NEAR_MATCH_MAX_LEN_DIFF, NEAR_MATCH_MIN_LEN};

// ============================================================================
// Result types
// ============================================================================

/// Result of checking a typed cloze answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClozeVerdict {
  /// Exact match after normalization
  Correct,
  /// Close to the answer (typo-sized difference), not accepted
  Near,
  /// Wrong answer
  Incorrect,
  /// Nothing typed
  Empty,
}

impl ClozeVerdict {
  pub fn is_correct(&self) -> bool {
    matches!(self, Self::Correct)
  }

  /// Feedback line shown to the learner
  pub fn feedback(&self) -> &'static str {
    match self {
      Self::Correct => "Correct!",
      Self::Near => "Almost! Check your spelling.",
      Self::Incorrect => "Not quite. Try again.",
      Self::Empty => "Type something first.",
    }
  }
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize an answer for comparison
/// - Composes Unicode (decomposed å/ø become single characters)
/// - Converts to lowercase
/// - Trims surrounding whitespace
pub fn normalize_answer(input: &str) -> String {
  input.trim().nfc().collect::<String>().to_lowercase()
}

// ============================================================================
// Distance
// ============================================================================

/// Levenshtein distance with unit costs, counted in characters
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
  let a_chars: Vec<char> = a.chars().collect();
  let b_chars: Vec<char> = b.chars().collect();

  if a_chars.is_empty() {
    return b_chars.len();
  }
  if b_chars.is_empty() {
    return a_chars.len();
  }

  // Two rows of the DP matrix are enough
  let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
  let mut curr = vec![0usize; b_chars.len() + 1];

  for (i, ac) in a_chars.iter().enumerate() {
    curr[0] = i + 1;
    for (j, bc) in b_chars.iter().enumerate() {
      let cost = if ac == bc { 0 } else { 1 };
      curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
    }
    std::mem::swap(&mut prev, &mut curr);
  }

  prev[b_chars.len()]
}

/// Near match on already-normalized strings: long enough input, similar
/// length, and a small edit distance
pub fn is_near_match(input: &str, expected: &str) -> bool {
  let input_len = input.chars().count();
  let expected_len = expected.chars().count();

  if input_len < NEAR_MATCH_MIN_LEN {
    return false;
  }
  if input_len.abs_diff(expected_len) > NEAR_MATCH_MAX_LEN_DIFF {
    return false;
  }
  levenshtein_distance(input, expected) <= NEAR_MATCH_MAX_DISTANCE
}

// ============================================================================
// Evaluation
// ============================================================================

/// Check a typed answer against the expected cloze answer
pub fn evaluate_cloze(user_input: &str, expected: &str) -> ClozeVerdict {
  let input = normalize_answer(user_input);
  if input.is_empty() {
    return ClozeVerdict::Empty;
  }

  let expected = normalize_answer(expected);
  if input == expected {
    return ClozeVerdict::Correct;
  }

  if is_near_match(&input, &expected) {
    ClozeVerdict::Near
  } else {
    ClozeVerdict::Incorrect
  }
}
