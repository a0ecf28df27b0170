//! Word-bar phrase extraction.
//!
//! Turns an example sentence into short phrases the learner can add to the
//! dictionary with one click. Each content word becomes one phrase, absorbing
//! the common words directly to its left; the practised target phrase itself
//! is never suggested.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

/// Danish words too common to be worth suggesting on their own: pronouns,
/// articles, conjunctions, frequent prepositions and auxiliary verbs.
static COMMON_WORDS: &[&str] = &[
  // pronouns
  "jeg", "mig", "min", "mit", "mine", "du", "dig", "din", "dit", "dine", "han", "ham", "hans",
  "hun", "hende", "hendes", "den", "det", "dens", "dets", "vi", "os", "vores", "i", "jer",
  "jeres", "de", "dem", "deres", "sig", "sin", "sit", "sine", "man", "der", "her", "som",
  // articles
  "en", "et",
  // conjunctions
  "og", "eller", "men", "at", "så", "fordi", "hvis", "når", "da", "end",
  // prepositions
  "af", "på", "til", "fra", "med", "om", "for", "over", "under", "ved", "efter", "hos", "mod",
  "uden",
  // auxiliaries and very common verbs
  "er", "var", "være", "været", "har", "havde", "have", "haft", "bliver", "blev", "blive",
  "kan", "kunne", "vil", "ville", "skal", "skulle", "må", "måtte",
  // particles
  "ikke", "også", "nu", "jo",
];

static COMMON_SET: LazyLock<HashSet<&'static str>> =
  LazyLock::new(|| COMMON_WORDS.iter().copied().collect());

/// Whether a (lowercased) word is on the common-word list
pub fn is_common_word(word: &str) -> bool {
  COMMON_SET.contains(word)
}

/// A maximal run of letters in the source sentence
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
  span: Range<usize>,
  lower: String,
}

/// Split into maximal letter runs; anything else separates tokens
fn tokenize(text: &str) -> Vec<Token> {
  let mut tokens = Vec::new();
  let mut start: Option<usize> = None;

  for (idx, ch) in text.char_indices() {
    match (ch.is_alphabetic(), start) {
      (true, None) => start = Some(idx),
      (false, Some(s)) => {
        tokens.push(make_token(text, s..idx));
        start = None;
      }
      _ => {}
    }
  }
  if let Some(s) = start {
    tokens.push(make_token(text, s..text.len()));
  }

  tokens
}

fn make_token(text: &str, span: Range<usize>) -> Token {
  Token {
    lower: text[span.clone()].to_lowercase(),
    span,
  }
}

/// Flag every token that belongs to an occurrence of the target phrase
fn mark_target(tokens: &[Token], target: &str) -> Vec<bool> {
  let mut marked = vec![false; tokens.len()];
  let target_words: Vec<String> = tokenize(target).into_iter().map(|t| t.lower).collect();
  if target_words.is_empty() || target_words.len() > tokens.len() {
    return marked;
  }

  for start in 0..=tokens.len() - target_words.len() {
    let matches = target_words
      .iter()
      .enumerate()
      .all(|(offset, word)| tokens[start + offset].lower == *word);
    if matches {
      for flag in &mut marked[start..start + target_words.len()] {
        *flag = true;
      }
    }
  }

  marked
}

/// Extract one-click phrase suggestions from `sentence`, skipping
/// `target_phrase` and bare common words. Phrases come back in sentence
/// order; an empty list means there is nothing to suggest.
pub fn extract_phrases(sentence: &str, target_phrase: &str) -> Vec<String> {
  let tokens = tokenize(sentence);
  let mut used = mark_target(&tokens, target_phrase);
  let mut phrases = Vec::new();

  for idx in 0..tokens.len() {
    if used[idx] || is_common_word(&tokens[idx].lower) {
      continue;
    }

    // Walk left over unused common words joined by whitespace only
    let mut first = idx;
    while first > 0 {
      let prev = first - 1;
      if used[prev] || !is_common_word(&tokens[prev].lower) {
        break;
      }
      let gap = &sentence[tokens[prev].span.end..tokens[first].span.start];
      if !gap.chars().all(char::is_whitespace) {
        break;
      }
      first = prev;
    }

    for flag in &mut used[first..=idx] {
      *flag = true;
    }

    let phrase = sentence[tokens[first].span.start..tokens[idx].span.end].trim();
    if !phrase.is_empty() {
      phrases.push(phrase.to_string());
    }
  }

  phrases
}
